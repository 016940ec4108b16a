use async_trait::async_trait;
use sqlx::{types::Json, Acquire, Executor, Row};
use uuid::Uuid;

use super::helpers::{fetch_rider_for_update, update_rider};
use super::Engine;

use crate::{
    api::RiderAPI,
    auth::User,
    entities::Rider,
    error::{invalid_invocation_error, not_found_error, Error},
};

#[async_trait]
impl RiderAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_rider(&self, user: User) -> Result<Rider, Error> {
        let rider = Rider::new(user.id);

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let result = tx
            .execute(
                sqlx::query(
                    "INSERT INTO riders (id, status, data) VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING",
                )
                .bind(&rider.id)
                .bind(&rider.status.name())
                .bind(Json(&rider)),
            )
            .await?;

        if result.rows_affected() == 0 {
            tracing::info!("rider already exists");
            return Err(invalid_invocation_error());
        }

        tx.commit().await?;

        Ok(rider)
    }

    #[tracing::instrument(skip(self))]
    async fn find_rider(&self, user: User, id: Uuid) -> Result<Rider, Error> {
        let mut conn = self.pool.acquire().await?;

        let Json(rider): Json<Rider> = conn
            .fetch_optional(sqlx::query("SELECT data FROM riders WHERE id = $1").bind(&id))
            .await?
            .ok_or_else(not_found_error)?
            .try_get("data")?;

        self.authorize(user, "read", rider.clone())?;

        Ok(rider)
    }

    #[tracing::instrument(skip(self))]
    async fn top_up_wallet(&self, user: User, id: Uuid, amount: f64) -> Result<Rider, Error> {
        let mut tx = self.pool.begin().await?;
        let mut rider = fetch_rider_for_update(&mut tx, &id).await?;

        self.authorize(user, "top_up", rider.clone())?;

        rider.top_up(amount)?;
        update_rider(&mut tx, &rider).await?;

        tx.commit().await?;

        tracing::info!(balance = rider.wallet_balance, "wallet topped up");

        Ok(rider)
    }
}
