use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Coordinates, Rider, Route};
use crate::error::{invalid_input_error, invalid_invocation_error, Error};

#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
pub struct Ride {
    #[polar(attribute)]
    pub id: Uuid,
    #[polar(attribute)]
    pub rider_id: Uuid,
    #[polar(attribute)]
    pub bicycle_id: Uuid,
    pub boarding: Coordinates,
    pub destination: Coordinates,
    pub route: Route,
    /// km covered on routes that a reroute replaced
    #[serde(default)]
    pub banked_distance: f64,
    /// kilometres, as planned at creation
    pub planned_distance: f64,
    /// minutes, as planned at creation
    pub planned_duration: f64,
    pub metrics: Metrics,
    pub payment: Payment,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Status {
    Created,
    Started {
        started_at: DateTime<Utc>,
    },
    Ended {
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        final_fare: f64,
    },
    Cancelled {
        cancelled_at: DateTime<Utc>,
    },
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Created => "created".into(),
            Self::Started { .. } => "started".into(),
            Self::Ended { .. } => "ended".into(),
            Self::Cancelled { .. } => "cancelled".into(),
        }
    }
}

/// Live figures of a ride. Distances in kilometres.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub distance_covered: f64,
    pub distance_left: f64,
    pub elapsed_minutes: f64,
    pub fare: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    pub distance_covered: String,
    pub distance_left: String,
    pub elapsed: String,
    pub fare: String,
}

impl Metrics {
    pub fn display(&self) -> DisplayMetrics {
        DisplayMetrics {
            distance_covered: format_distance(self.distance_covered),
            distance_left: format_distance(self.distance_left),
            elapsed: format_duration(self.elapsed_minutes),
            fare: format!("{:.2}", self.fare),
        }
    }
}

pub fn format_distance(km: f64) -> String {
    let km = km.max(0.0);

    if km < 1.0 {
        format!("{} m", (km * 1000.0).round() as i64)
    } else {
        format!("{:.2} km", km)
    }
}

pub fn format_duration(minutes: f64) -> String {
    let minutes = minutes.max(0.0).floor() as i64;

    if minutes < 60 {
        format!("{} min", minutes)
    } else {
        format!("{} h {:02} min", minutes / 60, minutes % 60)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Wallet,
    Online,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub amount: f64,
    pub method: Option<PaymentMethod>,
    pub paid: bool,
    pub transaction_id: Option<String>,
}

impl Ride {
    pub fn new(rider_id: Uuid, bicycle_id: Uuid, route: Route, estimated_fare: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            rider_id,
            bicycle_id,
            boarding: route.origin,
            destination: route.destination,
            planned_distance: route.distance,
            planned_duration: route.duration,
            metrics: Metrics {
                distance_left: route.distance,
                ..Metrics::default()
            },
            route,
            banked_distance: 0.0,
            payment: Payment {
                amount: estimated_fare,
                ..Payment::default()
            },
            status: Status::Created,
            created_at: Utc::now(),
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self.status, Status::Started { .. })
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            Status::Started { started_at } | Status::Ended { started_at, .. } => Some(started_at),
            _ => None,
        }
    }

    pub fn final_fare(&self) -> Option<f64> {
        match self.status {
            Status::Ended { final_fare, .. } => Some(final_fare),
            _ => None,
        }
    }

    /// Minutes since the ride started, measured at `now`.
    pub fn elapsed_minutes_at(&self, now: DateTime<Utc>) -> f64 {
        match self.status {
            Status::Started { started_at } => {
                (now - started_at).num_milliseconds().max(0) as f64 / 60_000.0
            }
            Status::Ended {
                started_at,
                ended_at,
                ..
            } => (ended_at - started_at).num_milliseconds().max(0) as f64 / 60_000.0,
            _ => 0.0,
        }
    }

    /// A ride is closed once it was cancelled or its fare was paid.
    pub fn is_closed(&self) -> bool {
        match self.status {
            Status::Cancelled { .. } => true,
            Status::Ended { .. } => self.payment.paid,
            _ => false,
        }
    }

    #[tracing::instrument(skip(self), fields(ride_id = %self.id))]
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        match self.status {
            Status::Created => {
                self.status = Status::Started { started_at: now };
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    pub fn record_metrics(&mut self, metrics: Metrics) -> Result<(), Error> {
        match self.status {
            Status::Started { .. } => {
                self.metrics = metrics;
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    /// Swaps in a reroute. `banked_distance` is what was covered before the
    /// new route starts and never shrinks.
    pub fn replace_route(&mut self, route: Route, banked_distance: f64) -> Result<(), Error> {
        match self.status {
            Status::Started { .. } => {
                self.route = route;
                self.banked_distance = self.banked_distance.max(banked_distance);
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    #[tracing::instrument(skip(self), fields(ride_id = %self.id))]
    pub fn end(
        &mut self,
        now: DateTime<Utc>,
        metrics: Metrics,
        final_fare: f64,
    ) -> Result<(), Error> {
        match self.status {
            Status::Started { started_at } => {
                self.metrics = Metrics {
                    fare: final_fare,
                    ..metrics
                };
                self.payment.amount = final_fare;
                self.status = Status::Ended {
                    started_at,
                    ended_at: now,
                    final_fare,
                };
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    #[tracing::instrument(skip(self), fields(ride_id = %self.id))]
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        match self.status {
            Status::Created | Status::Started { .. } => {
                self.payment.amount = 0.0;
                self.status = Status::Cancelled { cancelled_at: now };
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    /// Charges the final fare and closes the ride.
    ///
    /// Every check runs before anything is mutated, so a rejected payment
    /// leaves both the ride and the rider as they were.
    #[tracing::instrument(skip(self, rider, transaction_id), fields(ride_id = %self.id))]
    pub fn settle(
        &mut self,
        rider: &mut Rider,
        method: PaymentMethod,
        transaction_id: Option<String>,
    ) -> Result<f64, Error> {
        let amount = match self.status {
            Status::Ended { final_fare, .. } if !self.payment.paid => final_fare,
            _ => return Err(invalid_invocation_error()),
        };

        if rider.id != self.rider_id {
            return Err(invalid_input_error());
        }

        let transaction_id = match method {
            PaymentMethod::Wallet => {
                rider.debit(amount)?;
                Uuid::new_v4().to_string()
            }
            PaymentMethod::Online => transaction_id
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(invalid_input_error)?,
        };

        if rider.active_ride() == Some(self.id) {
            rider.deactivate()?;
        }

        self.payment = Payment {
            amount,
            method: Some(method),
            paid: true,
            transaction_id: Some(transaction_id),
        };

        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::insufficient_balance_error;
    use chrono::Duration;

    fn ride() -> (Ride, Rider) {
        let path = vec![
            Coordinates::from_lng_lat([0.0, 0.0]),
            Coordinates::from_lng_lat([0.0, 0.001]),
            Coordinates::from_lng_lat([0.0, 0.002]),
        ];
        let route = Route::from_path(path[0], path[2], path);
        let mut rider = Rider::new(Uuid::new_v4());
        let ride = Ride::new(rider.id, Uuid::new_v4(), route, 12.0);
        rider.activate(ride.id).unwrap();

        (ride, rider)
    }

    #[test]
    fn created_unpaid_with_estimate() {
        let (ride, _) = ride();

        assert_eq!(ride.status, Status::Created);
        assert!(!ride.payment.paid);
        assert_eq!(ride.payment.amount, 12.0);
        assert_eq!(ride.metrics.distance_left, ride.planned_distance);
        assert_eq!(ride.boarding, Coordinates::from_lng_lat([0.0, 0.0]));
    }

    #[test]
    fn reroute_only_while_started() {
        let (mut ride, _) = ride();
        let detour = Route::from_path(ride.boarding, ride.destination, vec![ride.boarding]);

        assert!(ride.replace_route(detour.clone(), 0.1).is_err());

        ride.start(Utc::now()).unwrap();
        ride.replace_route(detour.clone(), 0.2).unwrap();
        assert_eq!(ride.route.token, detour.token);
        assert_eq!(ride.banked_distance, 0.2);

        // a stale write cannot shrink what was already banked
        ride.replace_route(detour, 0.1).unwrap();
        assert_eq!(ride.banked_distance, 0.2);
    }

    #[test]
    fn lifecycle_to_ended() {
        let (mut ride, _) = ride();
        let started_at = Utc::now();

        assert!(ride.record_metrics(Metrics::default()).is_err());
        ride.start(started_at).unwrap();
        assert!(ride.start(started_at).is_err());

        let ended_at = started_at + Duration::minutes(12);
        let metrics = Metrics {
            distance_covered: 0.2,
            distance_left: 0.02,
            elapsed_minutes: 12.0,
            fare: 20.0,
        };
        ride.end(ended_at, metrics, 23.0).unwrap();

        assert_eq!(ride.final_fare(), Some(23.0));
        assert_eq!(ride.payment.amount, 23.0);
        assert_eq!(ride.metrics.fare, 23.0);
        assert_eq!(ride.elapsed_minutes_at(Utc::now()), 12.0);
        assert!(!ride.is_closed());
        assert!(ride.cancel(ended_at).is_err());
    }

    #[test]
    fn cancel_is_free() {
        let (mut ride, _) = ride();
        ride.start(Utc::now()).unwrap();
        ride.cancel(Utc::now()).unwrap();

        assert_eq!(ride.payment.amount, 0.0);
        assert!(ride.is_closed());
        assert!(ride.final_fare().is_none());
    }

    #[test]
    fn wallet_settlement_closes_the_ride() {
        let (mut ride, mut rider) = ride();
        ride.start(Utc::now()).unwrap();
        ride.end(Utc::now(), Metrics::default(), 15.0).unwrap();
        rider.top_up(20.0).unwrap();

        let charged = ride.settle(&mut rider, PaymentMethod::Wallet, None).unwrap();

        assert_eq!(charged, 15.0);
        assert_eq!(rider.wallet_balance, 5.0);
        assert!(!rider.is_active());
        assert!(ride.payment.paid);
        assert_eq!(ride.payment.method, Some(PaymentMethod::Wallet));
        assert!(ride.payment.transaction_id.is_some());
        assert!(ride.is_closed());
        assert!(ride.settle(&mut rider, PaymentMethod::Wallet, None).is_err());
    }

    #[test]
    fn insufficient_balance_leaves_ride_untouched() {
        let (mut ride, mut rider) = ride();
        ride.start(Utc::now()).unwrap();
        ride.end(Utc::now(), Metrics::default(), 15.0).unwrap();
        rider.top_up(10.0).unwrap();
        let before = ride.clone();

        let err = ride
            .settle(&mut rider, PaymentMethod::Wallet, None)
            .unwrap_err();

        assert_eq!(err, insufficient_balance_error());
        assert_eq!(ride.status, before.status);
        assert_eq!(ride.payment, before.payment);
        assert_eq!(rider.wallet_balance, 10.0);
        assert!(rider.is_active());
    }

    #[test]
    fn online_settlement_needs_transaction_id() {
        let (mut ride, mut rider) = ride();
        ride.start(Utc::now()).unwrap();
        ride.end(Utc::now(), Metrics::default(), 15.0).unwrap();

        assert!(ride
            .settle(&mut rider, PaymentMethod::Online, Some("  ".into()))
            .unwrap_err()
            .is_invalid_input_error());

        ride.settle(&mut rider, PaymentMethod::Online, Some("pay_42".into()))
            .unwrap();
        assert_eq!(ride.payment.transaction_id.as_deref(), Some("pay_42"));
    }

    #[test]
    fn display_strings() {
        let metrics = Metrics {
            distance_covered: 0.111,
            distance_left: 1.2549,
            elapsed_minutes: 65.4,
            fare: 16.5,
        };
        let display = metrics.display();

        assert_eq!(display.distance_covered, "111 m");
        assert_eq!(display.distance_left, "1.25 km");
        assert_eq!(display.elapsed, "1 h 05 min");
        assert_eq!(display.fare, "16.50");
        assert_eq!(format_duration(12.9), "12 min");
    }
}
