use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::User;
use crate::entities::Fare;
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct EstimateParams {
    distance_km: f64,
    #[serde(default)]
    elapsed_minutes: f64,
}

pub async fn estimate(
    Extension(api): Extension<DynAPI>,
    user: User,
    Json(params): Json<EstimateParams>,
) -> Result<Json<Fare>, Error> {
    let fare = api
        .estimate_fare(user, params.distance_km, params.elapsed_minutes)
        .await?;

    Ok(fare.into())
}
