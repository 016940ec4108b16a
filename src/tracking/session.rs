use std::sync::Arc;
use std::time::Duration;

use async_channel::{Receiver, Sender};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::time::{interval, Instant, MissedTickBehavior};
use uuid::Uuid;

use super::{
    deviation_m, match_progress, FareMeter, LocationSource, OffRouteDetector, Sample,
    TrackingBackend, Verdict,
};
use crate::config::TrackingConfig;
use crate::entities::{Coordinates, Metrics, Ride, Route};
use crate::error::Error;

/// State of a session when it was stopped.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub metrics: Metrics,
    pub route: Route,
    pub last_location: Option<Coordinates>,
    pub reroutes: u32,
    /// km covered on routes replaced by a reroute
    pub banked: f64,
}

impl Snapshot {
    /// Carries the session's progress over to a started `ride`, so tracking
    /// can pick up where it was stopped.
    pub fn apply_to(&self, ride: &mut Ride) -> Result<(), Error> {
        ride.replace_route(self.route.clone(), self.banked)?;
        ride.record_metrics(self.metrics)
    }
}

pub(crate) struct Session {
    ride_id: Uuid,
    destination: Coordinates,
    route: Route,
    /// km covered on routes replaced by a reroute
    banked: f64,
    covered_on_route: f64,
    covered: f64,
    left: f64,
    elapsed_base: Duration,
    started: Instant,
    detector: OffRouteDetector,
    fare: FareMeter,
    last_location: Option<Coordinates>,
    reroutes: u32,
    backend: Arc<dyn TrackingBackend>,
}

impl Session {
    pub(crate) fn new(
        ride: &Ride,
        settings: &TrackingConfig,
        backend: Arc<dyn TrackingBackend>,
        now: DateTime<Utc>,
    ) -> Self {
        let elapsed_base = Duration::from_secs_f64(ride.elapsed_minutes_at(now) * 60.0);
        let initial_fare = match ride.metrics.fare {
            fare if fare > 0.0 => Some(fare),
            _ => None,
        };

        Self {
            ride_id: ride.id,
            destination: ride.destination,
            route: ride.route.clone(),
            banked: ride.banked_distance,
            covered_on_route: 0.0,
            covered: ride.metrics.distance_covered,
            left: ride.metrics.distance_left,
            elapsed_base,
            started: Instant::now(),
            detector: OffRouteDetector::new(settings.off_route_threshold_m, settings.reroute_dwell),
            fare: FareMeter::new(initial_fare),
            last_location: None,
            reroutes: 0,
            backend,
        }
    }

    fn elapsed_minutes(&self) -> f64 {
        (self.elapsed_base + self.started.elapsed()).as_secs_f64() / 60.0
    }

    fn metrics(&self) -> Metrics {
        Metrics {
            distance_covered: self.covered,
            distance_left: self.left,
            elapsed_minutes: self.elapsed_minutes(),
            fare: self.fare.current(),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            metrics: self.metrics(),
            route: self.route.clone(),
            last_location: self.last_location,
            reroutes: self.reroutes,
            banked: self.banked,
        }
    }

    async fn observe(&mut self, sample: Sample) {
        self.last_location = Some(sample.coordinates);

        let progress = match_progress(
            &self.route.path,
            &sample.coordinates,
            self.route.distance,
            self.covered_on_route,
        );

        self.covered_on_route = progress.covered;
        self.covered = self.covered.max(self.banked + progress.covered);
        self.left = progress.left;

        let deviation = match deviation_m(&self.route.path, &sample.coordinates) {
            Some(deviation) => deviation,
            None => return,
        };

        if self.detector.observe(deviation, sample.recorded_at) == Verdict::Reroute {
            tracing::info!(deviation, "rider left the route, fetching a new one");
            self.reroute(sample.coordinates).await;
        }
    }

    async fn reroute(&mut self, from: Coordinates) {
        let route = match self.backend.fetch_route(from, self.destination).await {
            Ok(route) => route,
            Err(err) => {
                tracing::warn!("reroute failed, keeping current route: {}", err);
                return;
            }
        };

        self.banked = self.covered;
        self.covered_on_route = 0.0;
        self.left = route.distance;
        self.route = route;
        self.reroutes += 1;

        if let Err(err) = self
            .backend
            .record_route(self.ride_id, &self.route, self.banked)
            .await
        {
            tracing::warn!("failed to persist new route: {}", err);
        }
    }

    async fn refresh_fare(&mut self) {
        let result = self
            .backend
            .compute_fare(self.covered, self.elapsed_minutes())
            .await;
        self.fare.record(result);

        if let Err(err) = self.backend.record_metrics(self.ride_id, self.metrics()).await {
            tracing::warn!("failed to persist ride metrics: {}", err);
        }
    }

    #[tracing::instrument(name = "Session::run", skip_all, fields(ride_id = %self.ride_id))]
    pub(crate) async fn run(
        mut self,
        samples: Receiver<Sample>,
        mut stop: oneshot::Receiver<()>,
        fare_interval: Duration,
    ) -> Snapshot {
        let mut fare_ticks = interval(fare_interval);
        fare_ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut stop => break,
                sample = samples.recv() => match sample {
                    Ok(sample) => self.observe(sample).await,
                    Err(_) => {
                        tracing::warn!("sampler stopped, ending session");
                        break;
                    }
                },
                _ = fare_ticks.tick() => self.refresh_fare().await,
            }
        }

        self.snapshot()
    }
}

/// Pushes a sample every `period`. When a reading fails the last known
/// position is pushed instead; with no position yet the tick is skipped.
pub(crate) async fn sample_locations(
    source: Box<dyn LocationSource>,
    samples: Sender<Sample>,
    period: Duration,
) {
    let mut ticks = interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_known: Option<Coordinates> = None;

    loop {
        ticks.tick().await;

        let coordinates = match source.current_location().await {
            Ok(coordinates) => {
                last_known = Some(coordinates);
                coordinates
            }
            Err(err) => match last_known {
                Some(coordinates) => {
                    tracing::warn!("location unavailable, reusing last known position: {}", err);
                    coordinates
                }
                None => {
                    tracing::warn!("location unavailable and no position known yet: {}", err);
                    continue;
                }
            },
        };

        let sample = Sample {
            coordinates,
            recorded_at: Instant::now(),
        };

        if samples.send(sample).await.is_err() {
            break;
        }
    }
}
