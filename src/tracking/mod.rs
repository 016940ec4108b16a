//! Live ride tracking.
//!
//! A sampler task pushes location samples onto a channel; a pipeline task
//! matches them against the ride's route, watches for the rider leaving the
//! route and polls the fare on its own interval, persisting snapshots as it
//! goes. [`Tracker`] owns one such pair of tasks per started ride.

mod deviation;
mod fare;
mod matcher;
mod session;
mod sources;
mod tracker;

use async_trait::async_trait;
use tokio::time::Instant;
use uuid::Uuid;

use crate::entities::{Coordinates, Metrics, Route};
use crate::error::Error;

pub use deviation::{OffRouteDetector, Verdict};
pub use fare::FareMeter;
pub use matcher::{deviation_m, match_progress, nearest_vertex, Progress};
pub use session::Snapshot;
pub use sources::{SimulatedLocation, StoredLocation};
pub use tracker::Tracker;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub coordinates: Coordinates,
    pub recorded_at: Instant,
}

/// Where the bicycle currently is.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_location(&self) -> Result<Coordinates, Error>;
}

/// Services a tracking session calls out to.
#[async_trait]
pub trait TrackingBackend: Send + Sync {
    async fn fetch_route(&self, origin: Coordinates, destination: Coordinates)
        -> Result<Route, Error>;

    async fn compute_fare(&self, distance_km: f64, elapsed_minutes: f64) -> Result<f64, Error>;

    async fn record_metrics(&self, ride_id: Uuid, metrics: Metrics) -> Result<(), Error>;

    /// Persists a reroute along with the km banked before it.
    async fn record_route(&self, ride_id: Uuid, route: &Route, banked_km: f64)
        -> Result<(), Error>;
}
