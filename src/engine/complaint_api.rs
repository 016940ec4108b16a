use super::helpers::{fetch_complaint_for_update, update_complaint};
use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, Executor, Row};
use uuid::Uuid;

use crate::{
    api::{ComplaintAPI, RideAPI},
    auth::{Platform, User},
    entities::Complaint,
    error::{invalid_input_error, not_found_error, Error},
};

#[async_trait]
impl ComplaintAPI for Engine {
    #[tracing::instrument(skip(self, message))]
    async fn create_complaint(
        &self,
        user: User,
        ride_id: Option<Uuid>,
        bicycle_id: Option<Uuid>,
        message: String,
    ) -> Result<Complaint, Error> {
        // complaints about a ride are only accepted from someone who can see it
        if let Some(ride_id) = ride_id {
            self.find_ride(user.clone(), ride_id).await?;
        }

        let complaint = Complaint::new(user.id, ride_id, bicycle_id, message)?;

        let mut conn = self.pool.acquire().await?;
        conn.execute(
            sqlx::query(
                "INSERT INTO complaints (id, author_id, status, created_at, data) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&complaint.id)
            .bind(&complaint.author_id)
            .bind(&complaint.status.name())
            .bind(&complaint.created_at)
            .bind(Json(&complaint)),
        )
        .await?;

        Ok(complaint)
    }

    #[tracing::instrument(skip(self))]
    async fn find_complaint(&self, user: User, id: Uuid) -> Result<Complaint, Error> {
        let mut conn = self.pool.acquire().await?;

        let Json(complaint): Json<Complaint> = conn
            .fetch_optional(sqlx::query("SELECT data FROM complaints WHERE id = $1").bind(&id))
            .await?
            .ok_or_else(not_found_error)?
            .try_get("data")?;

        self.authorize(user, "read", complaint.clone())?;

        Ok(complaint)
    }

    #[tracing::instrument(skip(self))]
    async fn list_complaints(&self, user: User, open_only: bool) -> Result<Vec<Complaint>, Error> {
        self.authorize(user, "list_complaints", Platform::default())?;

        let query = if open_only {
            "SELECT data FROM complaints WHERE status = 'open' ORDER BY created_at ASC"
        } else {
            "SELECT data FROM complaints ORDER BY created_at ASC"
        };

        let mut conn = self.pool.acquire().await?;
        let rows = conn.fetch_all(sqlx::query(query)).await?;

        let mut complaints = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            let Json(complaint): Json<Complaint> = row.try_get("data")?;
            complaints.push(complaint);
        }

        Ok(complaints)
    }

    #[tracing::instrument(skip(self, resolution))]
    async fn resolve_complaint(
        &self,
        user: User,
        id: Uuid,
        resolution: String,
    ) -> Result<Complaint, Error> {
        let resolution = resolution.trim().to_string();
        if resolution.is_empty() {
            return Err(invalid_input_error());
        }

        let mut tx = self.pool.begin().await?;
        let mut complaint = fetch_complaint_for_update(&mut tx, &id).await?;

        self.authorize(user, "resolve", complaint.clone())?;

        complaint.resolve(resolution, Utc::now())?;
        update_complaint(&mut tx, &complaint).await?;

        tx.commit().await?;

        Ok(complaint)
    }
}
