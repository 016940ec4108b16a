use async_trait::async_trait;
use rand_distr::{Distribution, Normal};
use sqlx::{Executor, Pool, Postgres, Row};
use tokio::time::Instant;
use uuid::Uuid;

use super::LocationSource;
use crate::entities::Coordinates;
use crate::error::{geolocation_unavailable_error, invalid_input_error, Error};

const METERS_PER_DEGREE: f64 = 111_320.0;

/// Reads the position last pushed by the bicycle's device. Positions past
/// their expiry count as unavailable.
pub struct StoredLocation {
    pool: Pool<Postgres>,
    bicycle_id: Uuid,
}

impl StoredLocation {
    pub fn new(pool: Pool<Postgres>, bicycle_id: Uuid) -> Self {
        Self { pool, bicycle_id }
    }
}

#[async_trait]
impl LocationSource for StoredLocation {
    #[tracing::instrument(skip(self), fields(bicycle_id = %self.bicycle_id))]
    async fn current_location(&self) -> Result<Coordinates, Error> {
        let mut conn = self.pool.acquire().await?;

        let row = conn
            .fetch_optional(
                sqlx::query(
                    "SELECT ST_Y(location) AS lat, ST_X(location) AS lng FROM bicycle_locations WHERE bicycle_id = $1 AND location IS NOT NULL AND expiry > now()",
                )
                .bind(&self.bicycle_id),
            )
            .await?
            .ok_or_else(geolocation_unavailable_error)?;

        Ok(Coordinates {
            lat: row.try_get("lat")?,
            lng: row.try_get("lng")?,
        })
    }
}

/// Walks a path at a steady speed, adding Gaussian noise to every fix.
pub struct SimulatedLocation {
    path: Vec<Coordinates>,
    speed_kmh: f64,
    started: Instant,
    jitter: Normal<f64>,
}

impl SimulatedLocation {
    pub fn new(path: Vec<Coordinates>, speed_kmh: f64, jitter_m: f64) -> Result<Self, Error> {
        let jitter = Normal::new(0.0, jitter_m).map_err(|_| invalid_input_error())?;

        Ok(Self {
            path,
            speed_kmh,
            started: Instant::now(),
            jitter,
        })
    }

    /// Point reached after travelling `travelled_km` along the path.
    pub fn position_at(&self, travelled_km: f64) -> Option<Coordinates> {
        let first = *self.path.first()?;
        let mut remaining = travelled_km.max(0.0);

        for segment in self.path.windows(2) {
            let (from, to) = (segment[0], segment[1]);
            let length = from.haversine_km(&to);

            if remaining <= length {
                if length == 0.0 {
                    return Some(from);
                }

                let t = remaining / length;
                return Some(Coordinates {
                    lat: from.lat + (to.lat - from.lat) * t,
                    lng: from.lng + (to.lng - from.lng) * t,
                });
            }

            remaining -= length;
        }

        Some(*self.path.last().unwrap_or(&first))
    }

    fn jittered(&self, coordinates: Coordinates) -> Coordinates {
        let mut rng = rand::thread_rng();
        let north_m = self.jitter.sample(&mut rng);
        let east_m = self.jitter.sample(&mut rng);

        let lng_scale = (METERS_PER_DEGREE * coordinates.lat.to_radians().cos()).max(1.0);

        Coordinates {
            lat: coordinates.lat + north_m / METERS_PER_DEGREE,
            lng: coordinates.lng + east_m / lng_scale,
        }
    }
}

#[async_trait]
impl LocationSource for SimulatedLocation {
    async fn current_location(&self) -> Result<Coordinates, Error> {
        let hours = self.started.elapsed().as_secs_f64() / 3600.0;
        let position = self
            .position_at(self.speed_kmh * hours)
            .ok_or_else(geolocation_unavailable_error)?;

        Ok(self.jittered(position))
    }
}
