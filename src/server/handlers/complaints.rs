use axum::extract::{Extension, Json, Path, Query};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::Complaint;
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    ride_id: Option<Uuid>,
    bicycle_id: Option<Uuid>,
    message: String,
}

#[derive(Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    open_only: bool,
}

#[derive(Serialize, Deserialize)]
pub struct ResolveParams {
    resolution: String,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: User,
    Json(params): Json<CreateParams>,
) -> Result<Json<Complaint>, Error> {
    let complaint = api
        .create_complaint(user, params.ride_id, params.bicycle_id, params.message)
        .await?;

    Ok(complaint.into())
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    user: User,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Complaint>>, Error> {
    let complaints = api.list_complaints(user, params.open_only).await?;

    Ok(complaints.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<Complaint>, Error> {
    let complaint = api.find_complaint(user, id).await?;

    Ok(complaint.into())
}

pub async fn resolve(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(params): Json<ResolveParams>,
) -> Result<Json<Complaint>, Error> {
    let complaint = api.resolve_complaint(user, id, params.resolution).await?;

    Ok(complaint.into())
}
