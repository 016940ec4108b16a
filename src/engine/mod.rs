mod bicycle_api;
mod complaint_api;
mod dashboard_api;
mod fare_api;
mod helpers;
mod ride_api;
mod rider_api;
mod route_api;
mod tracking_backend;

use std::sync::Arc;

use oso::Oso;
use sqlx::{types::Json, Executor, Pool, Row};
use uuid::Uuid;

pub use tracking_backend::PgTrackingBackend;

use crate::{
    api::API,
    auth::authorizor,
    config::Config,
    db::Database,
    entities::{Ride, Tariff, AVERAGE_CYCLING_SPEED_KMH},
    error::{not_found_error, unauthorized_error, Error},
    external::directions::Directions,
    tracking::{LocationSource, SimulatedLocation, Snapshot, StoredLocation, Tracker},
};

/// Jitter of simulated fixes, in meters.
const SIMULATED_JITTER_M: f64 = 5.0;

pub struct Engine {
    pool: Pool<Database>,
    authorizor: Oso,
    tariff: Tariff,
    directions: Directions,
    tracker: Tracker,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(pool: Pool<Database>, config: &Config) -> Result<Self, Error> {
        let directions = Directions::new(config.directions.clone());
        let backend = Arc::new(PgTrackingBackend::new(
            pool.clone(),
            directions.clone(),
            config.tariff,
        ));

        Ok(Self {
            pool,
            authorizor: authorizor::new()?,
            tariff: config.tariff,
            directions,
            tracker: Tracker::new(config.tracking.clone(), backend),
        })
    }

    /// Restarts tracking for rides that were started before the service
    /// went down.
    #[tracing::instrument(skip(self))]
    pub async fn resume_tracking(&self) -> Result<usize, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(sqlx::query("SELECT data FROM rides WHERE status = 'started'"))
            .await?;

        let mut resumed = 0;
        for row in rows.iter() {
            let Json(ride): Json<Ride> = row.try_get("data")?;

            match self.location_source(&ride) {
                Ok(source) => {
                    self.tracker.start(&ride, source).await?;
                    resumed += 1;
                }
                Err(err) => tracing::warn!(ride_id = %ride.id, "cannot resume tracking: {}", err),
            }
        }

        tracing::info!("resumed tracking of {} rides", resumed);

        Ok(resumed)
    }

    /// Puts a ride back under tracking if it is still started, seeded with
    /// the progress of its stopped session.
    #[tracing::instrument(skip(self, snapshot))]
    async fn restore_tracking(&self, id: &Uuid, snapshot: Option<Snapshot>) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        let Json(mut ride): Json<Ride> = conn
            .fetch_optional(sqlx::query("SELECT data FROM rides WHERE id = $1").bind(id))
            .await?
            .ok_or_else(not_found_error)?
            .try_get("data")?;

        // someone else closed it in the meantime
        if !ride.is_started() {
            return Ok(());
        }

        if let Some(snapshot) = snapshot {
            snapshot.apply_to(&mut ride)?;
        }

        let source = self.location_source(&ride)?;
        self.tracker.start(&ride, source).await?;

        tracing::info!("tracking restored");

        Ok(())
    }

    #[tracing::instrument(name = "Engine::shutdown", skip_all)]
    pub async fn shutdown(&self) {
        self.tracker.shutdown().await;
    }

    pub fn authorize<Actor, Action, Resource>(
        &self,
        actor: Actor,
        action: Action,
        resource: Resource,
    ) -> Result<(), Error>
    where
        Actor: oso::ToPolar,
        Action: oso::ToPolar,
        Resource: oso::ToPolar,
    {
        if self.authorizor.is_allowed(actor, action, resource)? {
            return Ok(());
        }

        Err(unauthorized_error())
    }

    fn location_source(&self, ride: &Ride) -> Result<Box<dyn LocationSource>, Error> {
        if self.tracker.settings().simulate {
            let source = SimulatedLocation::new(
                ride.route.path.clone(),
                AVERAGE_CYCLING_SPEED_KMH,
                SIMULATED_JITTER_M,
            )?;

            return Ok(Box::new(source));
        }

        Ok(Box::new(StoredLocation::new(self.pool.clone(), ride.bicycle_id)))
    }
}

impl API for Engine {}
