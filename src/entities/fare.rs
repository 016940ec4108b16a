use serde::{Deserialize, Serialize};

/// Server-side pricing policy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    pub base_fare: f64,
    pub per_km: f64,
    pub per_minute: f64,
    pub minimum_fare: f64,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            base_fare: 10.0,
            per_km: 5.0,
            per_minute: 1.0,
            minimum_fare: 10.0,
        }
    }
}

impl Tariff {
    pub fn price(&self, distance_km: f64, elapsed_minutes: f64) -> f64 {
        let distance_km = distance_km.max(0.0);
        let elapsed_minutes = elapsed_minutes.max(0.0);

        let fare = self.base_fare + self.per_km * distance_km + self.per_minute * elapsed_minutes;

        round_cents(fare.max(self.minimum_fare))
    }

    pub fn quote(&self, distance_km: f64, elapsed_minutes: f64) -> Fare {
        Fare {
            distance_km,
            elapsed_minutes,
            amount: self.price(distance_km, elapsed_minutes),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fare {
    pub distance_km: f64,
    pub elapsed_minutes: f64,
    pub amount: f64,
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_in_distance_and_time() {
        let tariff = Tariff::default();

        assert_eq!(tariff.price(2.0, 10.0), 30.0);
        assert_eq!(tariff.price(0.5, 3.5), 16.0);
    }

    #[test]
    fn never_below_minimum() {
        let tariff = Tariff {
            base_fare: 0.0,
            per_km: 1.0,
            per_minute: 0.0,
            minimum_fare: 25.0,
        };

        assert_eq!(tariff.price(0.0, 0.0), 25.0);
        assert_eq!(tariff.price(-3.0, -1.0), 25.0);
        assert_eq!(tariff.price(30.0, 0.0), 30.0);
    }

    #[test]
    fn rounds_to_cents() {
        let tariff = Tariff::default();
        assert_eq!(tariff.price(0.1234, 0.0), 10.62);
    }

    #[test]
    fn unchanged_inputs_give_unchanged_fare() {
        let tariff = Tariff::default();
        let first = tariff.quote(1.234, 7.5);
        let second = tariff.quote(1.234, 7.5);

        assert_eq!(first, second);
    }
}
