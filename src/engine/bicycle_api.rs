use super::helpers::{fetch_bicycle_for_update, update_bicycle};
use super::Engine;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use geo_types::Geometry;
use geozero::wkb;
use sqlx::{types::Json, Acquire, Executor, Row};
use uuid::Uuid;

use crate::{
    api::BicycleAPI,
    auth::{Platform, User},
    entities::{Bicycle, Coordinates, NearbyBicycle},
    error::{invalid_input_error, not_found_error, unexpected_error, Error},
};

/// Upper bound on how far a nearby search reaches, in meters.
const MAX_SEARCH_RADIUS_M: f64 = 5000.0;

#[async_trait]
impl BicycleAPI for Engine {
    #[tracing::instrument(skip(self, qr_code))]
    async fn create_bicycle(
        &self,
        user: User,
        label: String,
        qr_code: String,
    ) -> Result<Bicycle, Error> {
        self.authorize(user.clone(), "create_bicycle", Platform::default())?;

        let label = label.trim().to_string();
        let qr_code = qr_code.trim().to_string();
        if label.is_empty() || qr_code.is_empty() {
            return Err(invalid_input_error());
        }

        let bicycle = Bicycle::new(user.id, label, qr_code);

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let result = tx
            .execute(
                sqlx::query(
                    "INSERT INTO bicycles (id, owner_id, qr_code, status, data) VALUES ($1, $2, $3, $4, $5) ON CONFLICT DO NOTHING",
                )
                .bind(&bicycle.id)
                .bind(&bicycle.owner_id)
                .bind(&bicycle.qr_code)
                .bind(&bicycle.status.name())
                .bind(Json(&bicycle)),
            )
            .await?;

        // qr codes are unique across the fleet
        if result.rows_affected() == 0 {
            tracing::info!("qr code already registered");
            return Err(invalid_input_error());
        }

        tx.commit().await?;

        Ok(bicycle)
    }

    #[tracing::instrument(skip(self))]
    async fn find_bicycle(&self, _user: User, id: Uuid) -> Result<Bicycle, Error> {
        let mut conn = self.pool.acquire().await?;

        let Json(bicycle): Json<Bicycle> = conn
            .fetch_optional(sqlx::query("SELECT data FROM bicycles WHERE id = $1").bind(&id))
            .await?
            .ok_or_else(not_found_error)?
            .try_get("data")?;

        Ok(bicycle)
    }

    #[tracing::instrument(skip(self))]
    async fn find_nearby_bicycles(
        &self,
        _user: User,
        coordinates: Coordinates,
        radius: f64,
    ) -> Result<Vec<NearbyBicycle>, Error> {
        if !coordinates.is_valid() || !radius.is_finite() || radius <= 0.0 {
            return Err(invalid_input_error());
        }

        let origin: Geometry<f64> = coordinates.into();
        let radius = radius.min(MAX_SEARCH_RADIUS_M);

        let query = "
            SELECT
                b.data AS bicycle,
                ST_Distance(l.location::geography, ST_SetSRID($1, 4326)::geography) AS distance
            FROM
                bicycles b
                JOIN bicycle_locations l ON b.id = l.bicycle_id
            WHERE
                b.status = 'available'
                AND l.expiry > now()
                AND ST_DWithin(l.location::geography, ST_SetSRID($1, 4326)::geography, $2)
            ORDER BY
                distance ASC
        ";

        let mut conn = self.pool.acquire().await?;
        let rows = conn
            .fetch_all(sqlx::query(query).bind(wkb::Encode(origin)).bind(radius))
            .await?;

        let mut nearby = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            let Json(bicycle): Json<Bicycle> = row.try_get("bicycle")?;
            let distance: f64 = row.try_get("distance")?;

            nearby.push(NearbyBicycle { bicycle, distance });
        }

        tracing::info!("found {} bicycles nearby", nearby.len());

        Ok(nearby)
    }

    #[tracing::instrument(skip(self))]
    async fn update_bicycle_location(
        &self,
        user: User,
        id: Uuid,
        coordinates: Coordinates,
    ) -> Result<(), Error> {
        if !coordinates.is_valid() {
            return Err(invalid_input_error());
        }

        let bicycle = self.find_bicycle(user.clone(), id).await?;
        self.authorize(user, "update_location", bicycle)?;

        let ttl = Duration::from_std(self.tracker.settings().location_ttl)
            .map_err(|_| unexpected_error())?;
        let location: Geometry<f64> = coordinates.into();

        let mut conn = self.pool.acquire().await?;
        conn.execute(
            sqlx::query(
                "INSERT INTO bicycle_locations (bicycle_id, location, expiry) VALUES ($1, ST_SetSRID($2, 4326), $3)
                ON CONFLICT (bicycle_id) DO UPDATE SET location = EXCLUDED.location, expiry = EXCLUDED.expiry",
            )
            .bind(&id)
            .bind(wkb::Encode(location))
            .bind(Utc::now() + ttl),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn set_bicycle_maintenance(
        &self,
        user: User,
        id: Uuid,
        maintenance: bool,
    ) -> Result<Bicycle, Error> {
        let mut tx = self.pool.begin().await?;
        let mut bicycle = fetch_bicycle_for_update(&mut tx, &id).await?;

        self.authorize(user, "maintain", bicycle.clone())?;

        if maintenance {
            bicycle.start_maintenance()?;
        } else {
            bicycle.end_maintenance()?;
        }

        update_bicycle(&mut tx, &bicycle).await?;
        tx.commit().await?;

        Ok(bicycle)
    }
}
