use super::helpers::{fetch_ride_for_update, update_ride};

use async_trait::async_trait;
use sqlx::Pool;
use uuid::Uuid;

use crate::{
    db::Database,
    entities::{Coordinates, Metrics, Route, Tariff},
    error::Error,
    external::directions::Directions,
    tracking::TrackingBackend,
};

/// Backs tracking sessions with the directions service, the tariff and the
/// rides table.
pub struct PgTrackingBackend {
    pool: Pool<Database>,
    directions: Directions,
    tariff: Tariff,
}

impl PgTrackingBackend {
    pub fn new(pool: Pool<Database>, directions: Directions, tariff: Tariff) -> Self {
        Self {
            pool,
            directions,
            tariff,
        }
    }
}

#[async_trait]
impl TrackingBackend for PgTrackingBackend {
    async fn fetch_route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Route, Error> {
        self.directions.find_route(origin, destination).await
    }

    async fn compute_fare(&self, distance_km: f64, elapsed_minutes: f64) -> Result<f64, Error> {
        Ok(self.tariff.price(distance_km, elapsed_minutes))
    }

    #[tracing::instrument(skip(self, metrics))]
    async fn record_metrics(&self, ride_id: Uuid, metrics: Metrics) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        let mut ride = fetch_ride_for_update(&mut tx, &ride_id).await?;

        // the ride may have ended between two ticks
        if !ride.is_started() {
            tracing::info!("ride is no longer started, dropping metrics");
            return Ok(());
        }

        ride.record_metrics(metrics)?;
        update_ride(&mut tx, &ride).await?;
        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, route), fields(route_token = %route.token))]
    async fn record_route(
        &self,
        ride_id: Uuid,
        route: &Route,
        banked_km: f64,
    ) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        let mut ride = fetch_ride_for_update(&mut tx, &ride_id).await?;

        if !ride.is_started() {
            tracing::info!("ride is no longer started, dropping route");
            return Ok(());
        }

        ride.replace_route(route.clone(), banked_km)?;
        update_ride(&mut tx, &ride).await?;
        tx.commit().await?;

        Ok(())
    }
}
