use std::sync::Arc;

use spokes::config::Config;
use spokes::db;
use spokes::engine::Engine;
use spokes::error::Error;
use spokes::server::serve;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let pool = db::connect(&config.database_url, config.database_max_connections).await?;

    let engine = Arc::new(Engine::new(pool, &config)?);

    if let Err(err) = engine.resume_tracking().await {
        tracing::warn!("could not resume tracking: {}", err);
    }

    serve(engine.clone(), config.listen_addr, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("cannot listen for shutdown signal: {:?}", err);
        }
    })
    .await?;

    engine.shutdown().await;

    Ok(())
}
