use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use spokes::config::TrackingConfig;
use spokes::entities::{path_length_km, Coordinates, Metrics, Ride, Route, Tariff};
use spokes::error::{geolocation_unavailable_error, upstream_error, Error};
use spokes::tracking::{LocationSource, Tracker, TrackingBackend};

#[derive(Default)]
struct FakeBackend {
    fail_routes: bool,
    route_requests: AtomicUsize,
    recorded_metrics: AtomicUsize,
    recorded_routes: Mutex<Vec<(Route, f64)>>,
}

impl FakeBackend {
    fn failing_routes() -> Self {
        Self {
            fail_routes: true,
            ..Self::default()
        }
    }

    fn recorded_routes(&self) -> Vec<(Route, f64)> {
        self.recorded_routes.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackingBackend for FakeBackend {
    async fn fetch_route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Route, Error> {
        self.route_requests.fetch_add(1, Ordering::SeqCst);

        if self.fail_routes {
            return Err(upstream_error());
        }

        Ok(Route::from_path(origin, destination, vec![origin, destination]))
    }

    async fn compute_fare(&self, distance_km: f64, _elapsed_minutes: f64) -> Result<f64, Error> {
        Ok(Tariff::default().price(distance_km, 0.0))
    }

    async fn record_metrics(&self, _ride_id: Uuid, _metrics: Metrics) -> Result<(), Error> {
        self.recorded_metrics.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn record_route(
        &self,
        _ride_id: Uuid,
        route: &Route,
        banked_km: f64,
    ) -> Result<(), Error> {
        self.recorded_routes
            .lock()
            .unwrap()
            .push((route.clone(), banked_km));
        Ok(())
    }
}

struct FixedLocation(Coordinates);

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_location(&self) -> Result<Coordinates, Error> {
        Ok(self.0)
    }
}

/// Hands out fixes in order and then keeps repeating the last one.
struct ScriptedLocation(Mutex<Vec<Coordinates>>);

impl ScriptedLocation {
    fn new(fixes: Vec<Coordinates>) -> Self {
        Self(Mutex::new(fixes))
    }
}

#[async_trait]
impl LocationSource for ScriptedLocation {
    async fn current_location(&self) -> Result<Coordinates, Error> {
        let mut fixes = self.0.lock().unwrap();

        if fixes.len() > 1 {
            return Ok(fixes.remove(0));
        }

        fixes.first().copied().ok_or_else(geolocation_unavailable_error)
    }
}

/// Gets one fix and then loses the signal.
struct FlakyLocation {
    fix: Coordinates,
    calls: AtomicUsize,
}

#[async_trait]
impl LocationSource for FlakyLocation {
    async fn current_location(&self) -> Result<Coordinates, Error> {
        match self.calls.fetch_add(1, Ordering::SeqCst) {
            0 => Ok(self.fix),
            _ => Err(geolocation_unavailable_error()),
        }
    }
}

fn path() -> Vec<Coordinates> {
    vec![
        Coordinates::from_lng_lat([0.0, 0.0]),
        Coordinates::from_lng_lat([0.0, 0.001]),
        Coordinates::from_lng_lat([0.0, 0.002]),
    ]
}

/// Roughly 1.5 km away from every vertex of `path()`.
fn far_away() -> Coordinates {
    Coordinates::new(0.01, 0.01)
}

fn started_ride() -> Ride {
    let path = path();
    let route = Route::from_path(path[0], path[2], path);
    let mut ride = Ride::new(Uuid::new_v4(), Uuid::new_v4(), route, 10.0);
    ride.start(Utc::now()).unwrap();

    ride
}

fn settings() -> TrackingConfig {
    TrackingConfig {
        sample_interval: Duration::from_secs(1),
        fare_interval: Duration::from_secs(15),
        off_route_threshold_m: 50.0,
        reroute_dwell: Duration::from_secs(10),
        ..TrackingConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn sustained_deviation_reroutes_once() {
    let backend = Arc::new(FakeBackend::default());
    let tracker = Tracker::new(settings(), backend.clone());
    let ride = started_ride();

    tracker
        .start(&ride, Box::new(FixedLocation(far_away())))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(15)).await;

    let snapshot = tracker.stop(ride.id).await.unwrap();

    assert_eq!(snapshot.reroutes, 1);
    assert_eq!(backend.route_requests.load(Ordering::SeqCst), 1);
    assert_eq!(backend.recorded_routes().len(), 1);
    assert_eq!(snapshot.route.origin, far_away());
    assert_eq!(snapshot.route.destination, ride.destination);
    assert!(!tracker.is_tracking(ride.id).await);
}

#[tokio::test(start_paused = true)]
async fn progress_along_route_is_metered() {
    let backend = Arc::new(FakeBackend::default());
    let tracker = Tracker::new(settings(), backend.clone());
    let ride = started_ride();

    let midpoint = path()[1];
    tracker
        .start(&ride, Box::new(FixedLocation(midpoint)))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(20)).await;

    let snapshot = tracker.stop(ride.id).await.unwrap();
    let expected_covered = path_length_km(&path()[..2]);

    assert_eq!(snapshot.reroutes, 0);
    assert_eq!(backend.route_requests.load(Ordering::SeqCst), 0);
    assert!((snapshot.metrics.distance_covered - expected_covered).abs() < 1e-9);
    assert!((snapshot.metrics.distance_covered - 0.111).abs() < 0.001);
    assert!(
        (snapshot.metrics.distance_left - (ride.planned_distance - expected_covered)).abs() < 1e-9
    );
    assert_eq!(
        snapshot.metrics.fare,
        Tariff::default().price(snapshot.metrics.distance_covered, 0.0)
    );
    assert_eq!(snapshot.last_location, Some(midpoint));
    // one fare tick on start and one after fifteen seconds
    assert_eq!(backend.recorded_metrics.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn resumed_session_keeps_distance_banked_before_reroute() {
    let backend = Arc::new(FakeBackend::default());
    let tracker = Tracker::new(settings(), backend.clone());
    let ride = started_ride();
    let end_of_route = path()[2];

    // ride the planned route to its end, then wander off until rerouted
    let source = ScriptedLocation::new(vec![end_of_route, end_of_route, far_away()]);
    tracker.start(&ride, Box::new(source)).await.unwrap();

    tokio::time::sleep(Duration::from_secs(15)).await;

    let before = tracker.stop(ride.id).await.unwrap();
    let planned = path_length_km(&path());

    assert_eq!(before.reroutes, 1);
    assert!((before.metrics.distance_covered - planned).abs() < 1e-9);

    let recorded = backend.recorded_routes();
    assert_eq!(recorded.len(), 1);
    let (detour, banked) = recorded[0].clone();
    assert!((banked - planned).abs() < 1e-9);

    // restart from what was persisted and finish the detour
    let mut persisted = ride.clone();
    persisted.replace_route(detour.clone(), banked).unwrap();
    persisted.record_metrics(before.metrics).unwrap();

    tracker
        .start(&persisted, Box::new(FixedLocation(ride.destination)))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;

    let after = tracker.stop(ride.id).await.unwrap();

    assert_eq!(after.reroutes, 0);
    assert!((after.banked - planned).abs() < 1e-9);
    assert!((after.metrics.distance_covered - (planned + detour.distance)).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn restarting_from_a_snapshot_picks_up_progress() {
    let tracker = Tracker::new(settings(), Arc::new(FakeBackend::default()));
    let ride = started_ride();
    let midpoint = path()[1];

    tracker
        .start(&ride, Box::new(FixedLocation(midpoint)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    let snapshot = tracker.stop(ride.id).await.unwrap();

    let mut restored = ride.clone();
    snapshot.apply_to(&mut restored).unwrap();
    assert_eq!(restored.metrics, snapshot.metrics);

    // a noisy fix back at the start must not undo the distance already covered
    tracker
        .start(&restored, Box::new(FixedLocation(path()[0])))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    let resumed = tracker.stop(ride.id).await.unwrap();

    assert_eq!(
        resumed.metrics.distance_covered,
        snapshot.metrics.distance_covered
    );
    assert_eq!(resumed.last_location, Some(path()[0]));

    let path = path();
    let mut created = Ride::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        Route::from_path(path[0], path[2], path.clone()),
        10.0,
    );
    assert!(snapshot.apply_to(&mut created).is_err());
}

#[tokio::test(start_paused = true)]
async fn lost_signal_reuses_last_known_position() {
    let backend = Arc::new(FakeBackend::default());
    let tracker = Tracker::new(settings(), backend.clone());
    let ride = started_ride();

    let source = FlakyLocation {
        fix: far_away(),
        calls: AtomicUsize::new(0),
    };
    tracker.start(&ride, Box::new(source)).await.unwrap();

    tokio::time::sleep(Duration::from_secs(15)).await;

    let snapshot = tracker.stop(ride.id).await.unwrap();

    // only repeated samples of the one fix can outlast the dwell
    assert_eq!(snapshot.last_location, Some(far_away()));
    assert_eq!(snapshot.reroutes, 1);
    assert_eq!(backend.route_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn without_any_fix_nothing_is_observed() {
    let tracker = Tracker::new(settings(), Arc::new(FakeBackend::default()));
    let ride = started_ride();

    tracker
        .start(&ride, Box::new(ScriptedLocation::new(vec![])))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;

    let snapshot = tracker.stop(ride.id).await.unwrap();

    assert_eq!(snapshot.last_location, None);
    assert_eq!(snapshot.metrics.distance_covered, 0.0);
    assert_eq!(snapshot.route.token, ride.route.token);
}

#[tokio::test(start_paused = true)]
async fn failed_reroute_keeps_route_and_retries_after_dwell() {
    let backend = Arc::new(FakeBackend::failing_routes());
    let tracker = Tracker::new(settings(), backend.clone());
    let ride = started_ride();

    tracker
        .start(&ride, Box::new(FixedLocation(far_away())))
        .await
        .unwrap();

    // attempts at 10 s and, after re-arming, at 21 s
    tokio::time::sleep(Duration::from_secs(25)).await;

    let snapshot = tracker.stop(ride.id).await.unwrap();

    assert_eq!(backend.route_requests.load(Ordering::SeqCst), 2);
    assert_eq!(snapshot.reroutes, 0);
    assert_eq!(snapshot.banked, 0.0);
    assert_eq!(snapshot.route.token, ride.route.token);
    assert_eq!(snapshot.last_location, Some(far_away()));
    assert!(backend.recorded_routes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn only_started_rides_are_tracked() {
    let tracker = Tracker::new(settings(), Arc::new(FakeBackend::default()));

    let path = path();
    let route = Route::from_path(path[0], path[2], path.clone());
    let ride = Ride::new(Uuid::new_v4(), Uuid::new_v4(), route, 10.0);

    let err = tracker
        .start(&ride, Box::new(FixedLocation(path[0])))
        .await
        .unwrap_err();

    assert!(err.is_invalid_invocation_error());
    assert!(tracker.stop(ride.id).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_every_session() {
    let tracker = Tracker::new(settings(), Arc::new(FakeBackend::default()));
    let first = started_ride();
    let second = started_ride();

    for ride in [&first, &second] {
        tracker
            .start(ride, Box::new(FixedLocation(path()[0])))
            .await
            .unwrap();
    }

    // starting twice is a no-op
    tracker
        .start(&first, Box::new(FixedLocation(path()[0])))
        .await
        .unwrap();
    assert!(tracker.is_tracking(first.id).await);
    assert!(tracker.is_tracking(second.id).await);

    tokio::time::sleep(Duration::from_secs(3)).await;
    tracker.shutdown().await;

    assert!(!tracker.is_tracking(first.id).await);
    assert!(!tracker.is_tracking(second.id).await);
}
