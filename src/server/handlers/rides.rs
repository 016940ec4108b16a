use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Coordinates, DisplayMetrics, Metrics, PaymentMethod, Ride};
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    bicycle_id: Uuid,
    boarding: Coordinates,
    destination: Coordinates,
}

#[derive(Serialize, Deserialize)]
pub struct StartParams {
    qr_code: String,
}

#[derive(Serialize, Deserialize)]
pub struct PayParams {
    method: PaymentMethod,
    transaction_id: Option<String>,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: User,
    Json(params): Json<CreateParams>,
) -> Result<Json<Ride>, Error> {
    let ride = api
        .create_ride(user, params.bicycle_id, params.boarding, params.destination)
        .await?;

    Ok(ride.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<Ride>, Error> {
    let ride = api.find_ride(user, id).await?;

    Ok(ride.into())
}

pub async fn progress(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<DisplayMetrics>, Error> {
    let progress = api.ride_progress(user, id).await?;

    Ok(progress.into())
}

pub async fn start(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(params): Json<StartParams>,
) -> Result<Json<Ride>, Error> {
    let ride = api.start_ride(user, id, params.qr_code).await?;

    Ok(ride.into())
}

pub async fn update_metrics(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(metrics): Json<Metrics>,
) -> Result<Json<Ride>, Error> {
    let ride = api.update_ride_metrics(user, id, metrics).await?;

    Ok(ride.into())
}

pub async fn end(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<Ride>, Error> {
    let ride = api.end_ride(user, id).await?;

    Ok(ride.into())
}

pub async fn cancel(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<Ride>, Error> {
    let ride = api.cancel_ride(user, id).await?;

    Ok(ride.into())
}

pub async fn pay(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(params): Json<PayParams>,
) -> Result<Json<Ride>, Error> {
    let ride = api
        .pay_ride(user, id, params.method, params.transaction_id)
        .await?;

    Ok(ride.into())
}
