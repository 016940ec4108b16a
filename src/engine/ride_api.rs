use super::helpers::{
    fetch_bicycle_for_update, fetch_ride_for_update, fetch_rider_for_update, update_bicycle,
    update_ride, update_rider,
};
use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, Executor, Row};
use uuid::Uuid;

use crate::{
    api::RideAPI,
    auth::User,
    entities::{Coordinates, DisplayMetrics, Metrics, PaymentMethod, Ride},
    error::{invalid_input_error, invalid_invocation_error, not_found_error, Error},
    tracking::Snapshot,
};

#[async_trait]
impl RideAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_ride(
        &self,
        user: User,
        bicycle_id: Uuid,
        boarding: Coordinates,
        destination: Coordinates,
    ) -> Result<Ride, Error> {
        if !boarding.is_valid() || !destination.is_valid() {
            return Err(invalid_input_error());
        }

        // resolve the route before taking any locks
        let route = self.directions.find_route(boarding, destination).await?;
        let estimated_fare = self.tariff.price(route.distance, route.duration);

        let mut tx = self.pool.begin().await?;

        let mut rider = fetch_rider_for_update(&mut tx, &user.id).await?;
        if rider.is_active() {
            tracing::info!("rider already has an active ride");
            return Err(invalid_invocation_error());
        }

        // the row lock serializes concurrent bookings of the same bicycle
        let mut bicycle = fetch_bicycle_for_update(&mut tx, &bicycle_id).await?;

        let ride = Ride::new(rider.id, bicycle.id, route, estimated_fare);
        bicycle.reserve(ride.id)?;
        rider.activate(ride.id)?;

        tx.execute(
            sqlx::query(
                "INSERT INTO rides (id, rider_id, bicycle_id, status, data) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&ride.id)
            .bind(&ride.rider_id)
            .bind(&ride.bicycle_id)
            .bind(&ride.status.name())
            .bind(Json(&ride)),
        )
        .await?;

        update_bicycle(&mut tx, &bicycle).await?;
        update_rider(&mut tx, &rider).await?;

        tx.commit().await?;

        tracing::info!(ride_id = %ride.id, "ride created");

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, user: User, id: Uuid) -> Result<Ride, Error> {
        let mut conn = self.pool.acquire().await?;

        let Json(ride): Json<Ride> = conn
            .fetch_optional(sqlx::query("SELECT data FROM rides WHERE id = $1").bind(&id))
            .await?
            .ok_or_else(not_found_error)?
            .try_get("data")?;

        self.authorize(user, "read", ride.clone())?;

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn ride_progress(&self, user: User, id: Uuid) -> Result<DisplayMetrics, Error> {
        let ride = self.find_ride(user, id).await?;

        Ok(ride.metrics.display())
    }

    #[tracing::instrument(skip(self, qr_code))]
    async fn start_ride(&self, user: User, id: Uuid, qr_code: String) -> Result<Ride, Error> {
        let mut tx = self.pool.begin().await?;
        let mut ride = fetch_ride_for_update(&mut tx, &id).await?;

        self.authorize(user, "start", ride.clone())?;

        let mut bicycle = fetch_bicycle_for_update(&mut tx, &ride.bicycle_id).await?;
        bicycle.unlock(ride.id, qr_code.trim())?;
        ride.start(Utc::now())?;

        update_bicycle(&mut tx, &bicycle).await?;
        update_ride(&mut tx, &ride).await?;

        tx.commit().await?;

        // the ride is committed either way; tracking can be resumed later
        match self.location_source(&ride) {
            Ok(source) => {
                if let Err(err) = self.tracker.start(&ride, source).await {
                    tracing::warn!("could not start tracking: {}", err);
                }
            }
            Err(err) => tracing::warn!("no location source for ride: {}", err),
        }

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn update_ride_metrics(
        &self,
        user: User,
        id: Uuid,
        metrics: Metrics,
    ) -> Result<Ride, Error> {
        let mut tx = self.pool.begin().await?;
        let mut ride = fetch_ride_for_update(&mut tx, &id).await?;

        self.authorize(user, "update_metrics", ride.clone())?;

        ride.record_metrics(metrics)?;
        update_ride(&mut tx, &ride).await?;

        tx.commit().await?;

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn end_ride(&self, user: User, id: Uuid) -> Result<Ride, Error> {
        let ride = self.find_ride(user.clone(), id).await?;
        self.authorize(user, "end", ride.clone())?;

        if !ride.is_started() {
            return Err(invalid_invocation_error());
        }

        let snapshot = self.tracker.stop(id).await;

        match self.close_ended_ride(&id, snapshot.clone()).await {
            Ok(ride) => Ok(ride),
            Err(err) => {
                self.restore_after_failed_close(&id, snapshot).await;
                Err(err)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_ride(&self, user: User, id: Uuid) -> Result<Ride, Error> {
        let ride = self.find_ride(user.clone(), id).await?;
        self.authorize(user, "cancel", ride.clone())?;

        if !ride.is_started() {
            return self.close_cancelled_ride(&id).await;
        }

        let snapshot = self.tracker.stop(id).await;

        match self.close_cancelled_ride(&id).await {
            Ok(ride) => Ok(ride),
            Err(err) => {
                self.restore_after_failed_close(&id, snapshot).await;
                Err(err)
            }
        }
    }

    #[tracing::instrument(skip(self, transaction_id))]
    async fn pay_ride(
        &self,
        user: User,
        id: Uuid,
        method: PaymentMethod,
        transaction_id: Option<String>,
    ) -> Result<Ride, Error> {
        let mut tx = self.pool.begin().await?;
        let mut ride = fetch_ride_for_update(&mut tx, &id).await?;

        self.authorize(user, "pay", ride.clone())?;

        let mut rider = fetch_rider_for_update(&mut tx, &ride.rider_id).await?;

        // a rejected payment rolls back with the dropped transaction
        let amount = ride.settle(&mut rider, method, transaction_id)?;

        let mut bicycle = fetch_bicycle_for_update(&mut tx, &ride.bicycle_id).await?;
        bicycle.credit(amount);

        update_rider(&mut tx, &rider).await?;
        update_bicycle(&mut tx, &bicycle).await?;
        update_ride(&mut tx, &ride).await?;

        tx.commit().await?;

        tracing::info!(amount, "ride paid");

        Ok(ride)
    }
}

impl Engine {
    async fn close_ended_ride(&self, id: &Uuid, snapshot: Option<Snapshot>) -> Result<Ride, Error> {
        let mut tx = self.pool.begin().await?;
        let mut ride = fetch_ride_for_update(&mut tx, id).await?;

        if let Some(snapshot) = snapshot {
            tracing::info!(reroutes = snapshot.reroutes, "tracking stopped");
            snapshot.apply_to(&mut ride)?;
        }

        let now = Utc::now();
        let elapsed_minutes = ride.elapsed_minutes_at(now);
        let metrics = Metrics {
            elapsed_minutes,
            ..ride.metrics
        };

        let final_fare = self.tariff.price(metrics.distance_covered, elapsed_minutes);
        ride.end(now, metrics, final_fare)?;

        let mut bicycle = fetch_bicycle_for_update(&mut tx, &ride.bicycle_id).await?;
        bicycle.release(ride.id)?;

        update_bicycle(&mut tx, &bicycle).await?;
        update_ride(&mut tx, &ride).await?;

        tx.commit().await?;

        tracing::info!(final_fare, "ride ended");

        Ok(ride)
    }

    async fn close_cancelled_ride(&self, id: &Uuid) -> Result<Ride, Error> {
        let mut tx = self.pool.begin().await?;
        let mut ride = fetch_ride_for_update(&mut tx, id).await?;

        ride.cancel(Utc::now())?;

        let mut bicycle = fetch_bicycle_for_update(&mut tx, &ride.bicycle_id).await?;
        bicycle.release(ride.id)?;

        let mut rider = fetch_rider_for_update(&mut tx, &ride.rider_id).await?;
        if rider.active_ride() == Some(ride.id) {
            rider.deactivate()?;
        }

        update_bicycle(&mut tx, &bicycle).await?;
        update_rider(&mut tx, &rider).await?;
        update_ride(&mut tx, &ride).await?;

        tx.commit().await?;

        Ok(ride)
    }

    /// A close that did not commit leaves the ride started, so its session
    /// is put back from where it was stopped.
    async fn restore_after_failed_close(&self, id: &Uuid, snapshot: Option<Snapshot>) {
        if let Err(err) = self.restore_tracking(id, snapshot).await {
            tracing::error!(ride_id = %id, "ride left untracked: {}", err);
        }
    }
}
