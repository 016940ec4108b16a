use axum::extract::{Extension, Json, Path, Query};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Bicycle, Coordinates, NearbyBicycle};
use crate::error::Error;
use crate::server::DynAPI;

/// Search radius when the query does not name one, in meters.
const DEFAULT_RADIUS_M: f64 = 1000.0;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    label: String,
    qr_code: String,
}

#[derive(Serialize, Deserialize)]
pub struct NearbyParams {
    lat: f64,
    lng: f64,
    radius: Option<f64>,
}

#[derive(Serialize, Deserialize)]
pub struct UpdateLocationParams {
    coordinates: Coordinates,
}

#[derive(Serialize, Deserialize)]
pub struct MaintenanceParams {
    maintenance: bool,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: User,
    Json(params): Json<CreateParams>,
) -> Result<Json<Bicycle>, Error> {
    let bicycle = api
        .create_bicycle(user, params.label, params.qr_code)
        .await?;

    Ok(bicycle.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<Bicycle>, Error> {
    let bicycle = api.find_bicycle(user, id).await?;

    Ok(bicycle.into())
}

pub async fn find_nearby(
    Extension(api): Extension<DynAPI>,
    user: User,
    Query(params): Query<NearbyParams>,
) -> Result<Json<Vec<NearbyBicycle>>, Error> {
    let coordinates = Coordinates::new(params.lat, params.lng);
    let radius = params.radius.unwrap_or(DEFAULT_RADIUS_M);

    let bicycles = api.find_nearby_bicycles(user, coordinates, radius).await?;

    Ok(bicycles.into())
}

pub async fn update_location(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(params): Json<UpdateLocationParams>,
) -> Result<(), Error> {
    api.update_bicycle_location(user, id, params.coordinates)
        .await
}

pub async fn set_maintenance(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(params): Json<MaintenanceParams>,
) -> Result<Json<Bicycle>, Error> {
    let bicycle = api
        .set_bicycle_maintenance(user, id, params.maintenance)
        .await?;

    Ok(bicycle.into())
}
