use sqlx::{types::Json, Executor, Row, Transaction};
use uuid::Uuid;

use crate::{
    db::Database,
    entities::{Bicycle, Complaint, Ride, Rider},
    error::{not_found_error, Error},
};

#[tracing::instrument(skip(tx))]
pub async fn fetch_ride_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Ride, Error> {
    let Json(ride): Json<Ride> = tx
        .fetch_optional(sqlx::query("SELECT data FROM rides WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or_else(not_found_error)?
        .try_get("data")?;

    Ok(ride)
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_bicycle_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Bicycle, Error> {
    let Json(bicycle): Json<Bicycle> = tx
        .fetch_optional(sqlx::query("SELECT data FROM bicycles WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or_else(not_found_error)?
        .try_get("data")?;

    Ok(bicycle)
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_rider_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Rider, Error> {
    let Json(rider): Json<Rider> = tx
        .fetch_optional(sqlx::query("SELECT data FROM riders WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or_else(not_found_error)?
        .try_get("data")?;

    Ok(rider)
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_complaint_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Complaint, Error> {
    let Json(complaint): Json<Complaint> = tx
        .fetch_optional(
            sqlx::query("SELECT data FROM complaints WHERE id = $1 FOR UPDATE").bind(id),
        )
        .await?
        .ok_or_else(not_found_error)?
        .try_get("data")?;

    Ok(complaint)
}

#[tracing::instrument(skip(tx, ride), fields(ride_id = %ride.id))]
pub async fn update_ride(tx: &mut Transaction<'_, Database>, ride: &Ride) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE rides SET status = $2, data = $3 WHERE id = $1")
            .bind(&ride.id)
            .bind(ride.status.name())
            .bind(Json(ride)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx, bicycle), fields(bicycle_id = %bicycle.id))]
pub async fn update_bicycle(
    tx: &mut Transaction<'_, Database>,
    bicycle: &Bicycle,
) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE bicycles SET status = $2, data = $3 WHERE id = $1")
            .bind(&bicycle.id)
            .bind(bicycle.status.name())
            .bind(Json(bicycle)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx, rider), fields(rider_id = %rider.id))]
pub async fn update_rider(tx: &mut Transaction<'_, Database>, rider: &Rider) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE riders SET status = $2, data = $3 WHERE id = $1")
            .bind(&rider.id)
            .bind(rider.status.name())
            .bind(Json(rider)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx, complaint), fields(complaint_id = %complaint.id))]
pub async fn update_complaint(
    tx: &mut Transaction<'_, Database>,
    complaint: &Complaint,
) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE complaints SET status = $2, data = $3 WHERE id = $1")
            .bind(&complaint.id)
            .bind(complaint.status.name())
            .bind(Json(complaint)),
    )
    .await?;

    Ok(())
}
