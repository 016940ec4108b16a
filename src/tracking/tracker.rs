use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::session::{sample_locations, Session};
use super::{LocationSource, Snapshot, TrackingBackend};
use crate::config::TrackingConfig;
use crate::entities::Ride;
use crate::error::{invalid_invocation_error, Error};

const SAMPLE_BUFFER: usize = 32;

struct SessionHandle {
    stop: oneshot::Sender<()>,
    pipeline: JoinHandle<Snapshot>,
    sampler: JoinHandle<()>,
}

/// Owns the tracking sessions of every started ride.
pub struct Tracker {
    settings: TrackingConfig,
    backend: Arc<dyn TrackingBackend>,
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
}

impl Tracker {
    pub fn new(settings: TrackingConfig, backend: Arc<dyn TrackingBackend>) -> Self {
        Self {
            settings,
            backend,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &TrackingConfig {
        &self.settings
    }

    /// Starts sampling and metering `ride`. Starting a ride that is
    /// already tracked is a no-op.
    #[tracing::instrument(skip(self, ride, source), fields(ride_id = %ride.id))]
    pub async fn start(&self, ride: &Ride, source: Box<dyn LocationSource>) -> Result<(), Error> {
        if !ride.is_started() {
            return Err(invalid_invocation_error());
        }

        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&ride.id) {
            tracing::info!("ride is already tracked");
            return Ok(());
        }

        let (samples_tx, samples_rx) = async_channel::bounded(SAMPLE_BUFFER);
        let (stop_tx, stop_rx) = oneshot::channel();

        let session = Session::new(ride, &self.settings, self.backend.clone(), Utc::now());
        let fare_interval = self.settings.fare_interval;

        let sampler = tokio::spawn(sample_locations(
            source,
            samples_tx,
            self.settings.sample_interval,
        ));
        let pipeline = tokio::spawn(session.run(samples_rx, stop_rx, fare_interval));

        sessions.insert(
            ride.id,
            SessionHandle {
                stop: stop_tx,
                pipeline,
                sampler,
            },
        );

        tracing::info!("started tracking");

        Ok(())
    }

    pub async fn is_tracking(&self, ride_id: Uuid) -> bool {
        self.sessions.lock().await.contains_key(&ride_id)
    }

    /// Stops tracking `ride_id` and returns where the session got to, or
    /// `None` when the ride was not tracked.
    #[tracing::instrument(skip(self))]
    pub async fn stop(&self, ride_id: Uuid) -> Option<Snapshot> {
        let handle = self.sessions.lock().await.remove(&ride_id)?;

        finish(handle).await
    }

    /// Stops every session.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self) {
        let handles: Vec<SessionHandle> = self
            .sessions
            .lock()
            .await
            .drain()
            .map(|(_, handle)| handle)
            .collect();

        tracing::info!("stopping {} tracking sessions", handles.len());

        futures::future::join_all(handles.into_iter().map(finish)).await;
    }
}

async fn finish(handle: SessionHandle) -> Option<Snapshot> {
    // the pipeline may already have ended on its own
    let _ = handle.stop.send(());

    let snapshot = match handle.pipeline.await {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            tracing::error!("tracking session failed: {:?}", err);
            None
        }
    };

    handle.sampler.abort();

    snapshot
}
