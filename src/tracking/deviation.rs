use std::time::Duration;

use tokio::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RouteState {
    OnRoute,
    OffRoutePending { since: Instant },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    OnRoute,
    OffRoute,
    Reroute,
}

/// Debounces off-route samples: a reroute is requested only once the rider
/// has stayed beyond `threshold_m` for at least `dwell`.
#[derive(Clone, Debug)]
pub struct OffRouteDetector {
    threshold_m: f64,
    dwell: Duration,
    state: RouteState,
}

impl OffRouteDetector {
    pub fn new(threshold_m: f64, dwell: Duration) -> Self {
        Self {
            threshold_m,
            dwell,
            state: RouteState::OnRoute,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> RouteState {
        self.state
    }

    pub fn observe(&mut self, deviation_m: f64, at: Instant) -> Verdict {
        if deviation_m <= self.threshold_m {
            self.state = RouteState::OnRoute;
            return Verdict::OnRoute;
        }

        match self.state {
            RouteState::OnRoute => {
                self.state = RouteState::OffRoutePending { since: at };
                if self.dwell.is_zero() {
                    self.state = RouteState::OnRoute;
                    return Verdict::Reroute;
                }
                Verdict::OffRoute
            }
            RouteState::OffRoutePending { since } => {
                if at.saturating_duration_since(since) >= self.dwell {
                    // the replacement route starts where the rider is
                    self.state = RouteState::OnRoute;
                    Verdict::Reroute
                } else {
                    Verdict::OffRoute
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> OffRouteDetector {
        OffRouteDetector::new(50.0, Duration::from_secs(10))
    }

    #[test]
    fn stays_on_route_within_threshold() {
        let mut detector = detector();
        let t0 = Instant::now();

        assert_eq!(detector.observe(0.0, t0), Verdict::OnRoute);
        assert_eq!(detector.observe(50.0, t0 + Duration::from_secs(30)), Verdict::OnRoute);
        assert_eq!(detector.state(), RouteState::OnRoute);
    }

    #[test]
    fn sustained_deviation_fires_once_per_dwell() {
        let mut detector = detector();
        let t0 = Instant::now();

        let verdicts: Vec<Verdict> = (0..=21)
            .map(|s| detector.observe(80.0, t0 + Duration::from_secs(s)))
            .collect();

        let reroutes = verdicts.iter().filter(|v| **v == Verdict::Reroute).count();
        // fires at t=10, re-arms at t=11, and needs another full dwell
        assert_eq!(verdicts[9], Verdict::OffRoute);
        assert_eq!(verdicts[10], Verdict::Reroute);
        assert_eq!(verdicts[20], Verdict::OffRoute);
        assert_eq!(verdicts[21], Verdict::Reroute);
        assert_eq!(reroutes, 2);
    }

    #[test]
    fn short_excursion_is_forgiven() {
        let mut detector = detector();
        let t0 = Instant::now();

        assert_eq!(detector.observe(120.0, t0), Verdict::OffRoute);
        assert_eq!(detector.observe(120.0, t0 + Duration::from_secs(9)), Verdict::OffRoute);
        assert_eq!(detector.observe(10.0, t0 + Duration::from_secs(9)), Verdict::OnRoute);

        // pending timer restarted from scratch
        assert_eq!(detector.observe(120.0, t0 + Duration::from_secs(12)), Verdict::OffRoute);
        assert_eq!(
            detector.state(),
            RouteState::OffRoutePending {
                since: t0 + Duration::from_secs(12)
            }
        );
        assert_eq!(detector.observe(120.0, t0 + Duration::from_secs(21)), Verdict::OffRoute);
        assert_eq!(detector.observe(120.0, t0 + Duration::from_secs(22)), Verdict::Reroute);
    }
}
