use axum::extract::{Extension, Json};

use crate::auth::User;
use crate::entities::OwnerDashboard;
use crate::error::Error;
use crate::server::DynAPI;

pub async fn owner(
    Extension(api): Extension<DynAPI>,
    user: User,
) -> Result<Json<OwnerDashboard>, Error> {
    let dashboard = api.owner_dashboard(user).await?;

    Ok(dashboard.into())
}
