use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::Rider;
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct TopUpParams {
    amount: f64,
}

pub async fn create(Extension(api): Extension<DynAPI>, user: User) -> Result<Json<Rider>, Error> {
    let rider = api.create_rider(user).await?;

    Ok(rider.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<Rider>, Error> {
    let rider = api.find_rider(user, id).await?;

    Ok(rider.into())
}

pub async fn top_up(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(params): Json<TopUpParams>,
) -> Result<Json<Rider>, Error> {
    let rider = api.top_up_wallet(user, id, params.amount).await?;

    Ok(rider.into())
}
