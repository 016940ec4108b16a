use serde::{Deserialize, Serialize};

use crate::{
    config::DirectionsConfig,
    entities::{Coordinates, Route},
    error::{invalid_input_error, upstream_error, Error},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Geometry {
    /// `[lng, lat]` pairs
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectionsRoute {
    /// meters
    pub distance: f64,
    /// seconds
    pub duration: f64,
    pub geometry: Geometry,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Response {
    code: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

impl DirectionsRoute {
    pub fn into_route(self, origin: Coordinates, destination: Coordinates) -> Route {
        let path = self
            .geometry
            .coordinates
            .into_iter()
            .map(Coordinates::from_lng_lat)
            .collect();

        Route::new(
            origin,
            destination,
            path,
            self.distance / 1000.0,
            self.duration / 60.0,
        )
    }
}

#[derive(Clone, Debug)]
pub struct Directions {
    client: reqwest::Client,
    config: DirectionsConfig,
}

impl Directions {
    pub fn new(config: DirectionsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Route, Error> {
        if !origin.is_valid() || !destination.is_valid() {
            return Err(invalid_input_error());
        }

        let url = format!(
            "https://{}/directions/v5/mapbox/{}/{},{};{},{}",
            self.config.api_base,
            self.config.profile,
            origin.lng,
            origin.lat,
            destination.lng,
            destination.lat
        );

        let res = self
            .client
            .get(url)
            .query(&[("access_token", self.config.api_key.as_str())])
            .query(&[("geometries", "geojson")])
            .query(&[("overview", "full")])
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if (400..500).contains(&status_code) {
            return Err(invalid_input_error());
        } else if status_code != 200 {
            return Err(upstream_error());
        }

        let data: Response = res.json().await?;

        parse_response(data, origin, destination)
    }
}

fn parse_response(
    data: Response,
    origin: Coordinates,
    destination: Coordinates,
) -> Result<Route, Error> {
    match data.code.as_str() {
        "Ok" => {}
        "NoRoute" | "NoSegment" => return Err(invalid_input_error()),
        _ => return Err(upstream_error()),
    }

    let route = data.routes.into_iter().next().ok_or_else(upstream_error)?;

    Ok(route.into_route(origin, destination))
}
