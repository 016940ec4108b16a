use super::Engine;

use async_trait::async_trait;
use sqlx::{types::Json, Executor, Row};

use crate::{
    api::DashboardAPI,
    auth::{Platform, User},
    entities::{Bicycle, OwnerDashboard},
    error::Error,
};

#[async_trait]
impl DashboardAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn owner_dashboard(&self, user: User) -> Result<OwnerDashboard, Error> {
        self.authorize(user.clone(), "view_dashboard", Platform::default())?;

        let mut conn = self.pool.acquire().await?;
        let rows = conn
            .fetch_all(sqlx::query("SELECT data FROM bicycles WHERE owner_id = $1").bind(&user.id))
            .await?;

        let mut bicycles = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            let Json(bicycle): Json<Bicycle> = row.try_get("data")?;
            bicycles.push(bicycle);
        }

        Ok(OwnerDashboard::from_bicycles(bicycles))
    }
}
