use crate::error::Error;

/// Holds the last successfully computed fare. A failed poll keeps the
/// previous value until the next tick succeeds.
#[derive(Clone, Debug, Default)]
pub struct FareMeter {
    last: Option<f64>,
    failures: u64,
}

impl FareMeter {
    pub fn new(initial: Option<f64>) -> Self {
        Self {
            last: initial,
            failures: 0,
        }
    }

    pub fn record(&mut self, result: Result<f64, Error>) -> f64 {
        match result {
            Ok(fare) => self.last = Some(fare),
            Err(err) => {
                self.failures += 1;
                tracing::warn!(failures = self.failures, "fare poll failed, keeping previous fare: {}", err);
            }
        }

        self.current()
    }

    pub fn current(&self) -> f64 {
        self.last.unwrap_or(0.0)
    }

    #[cfg(test)]
    pub(crate) fn failures(&self) -> u64 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::upstream_error;

    #[test]
    fn failed_poll_keeps_previous_fare() {
        let mut meter = FareMeter::new(None);

        assert_eq!(meter.record(Ok(12.5)), 12.5);
        assert_eq!(meter.record(Err(upstream_error())), 12.5);
        assert_eq!(meter.record(Ok(14.0)), 14.0);
        assert_eq!(meter.failures(), 1);
    }

    #[test]
    fn starts_from_initial() {
        assert_eq!(FareMeter::new(Some(9.0)).current(), 9.0);
        assert_eq!(FareMeter::new(None).current(), 0.0);
    }
}
