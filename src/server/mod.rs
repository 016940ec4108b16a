mod handlers;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, patch, post},
    Router,
};

use crate::server::handlers::{bicycles, complaints, dashboard, fares, riders, rides, routes};
use crate::{
    api::API,
    error::{unexpected_error, Error},
};

pub type DynAPI = Arc<dyn API + Send + Sync>;

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/riders", post(riders::create))
        .route("/riders/:id", get(riders::find))
        .route("/riders/:id/wallet", patch(riders::top_up))
        .route("/bicycles", post(bicycles::create).get(bicycles::find_nearby))
        .route("/bicycles/:id", get(bicycles::find))
        .route("/bicycles/:id/location", patch(bicycles::update_location))
        .route("/bicycles/:id/maintenance", patch(bicycles::set_maintenance))
        .route("/routes", post(routes::create))
        .route("/routes/:token", get(routes::find))
        .route("/fares", post(fares::estimate))
        .route("/rides", post(rides::create))
        .route("/rides/:id", get(rides::find))
        .route("/rides/:id/progress", get(rides::progress))
        .route("/rides/:id/start", patch(rides::start))
        .route("/rides/:id/metrics", patch(rides::update_metrics))
        .route("/rides/:id/end", patch(rides::end))
        .route("/rides/:id/cancel", patch(rides::cancel))
        .route("/rides/:id/pay", patch(rides::pay))
        .route("/complaints", post(complaints::create).get(complaints::list))
        .route("/complaints/:id", get(complaints::find))
        .route("/complaints/:id/resolve", patch(complaints::resolve))
        .route("/dashboard", get(dashboard::owner))
        .layer(Extension(api))
}

/// Serves the HTTP API on `addr` until `shutdown` resolves.
pub async fn serve<T, F>(api: Arc<T>, addr: SocketAddr, shutdown: F) -> Result<(), Error>
where
    T: API + Sync + Send + 'static,
    F: Future<Output = ()>,
{
    let app = router(api as DynAPI);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| {
            tracing::error!("server error: {:?}", err);
            unexpected_error()
        })
}
