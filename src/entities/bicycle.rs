use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::round_cents;
use crate::error::{bicycle_unavailable_error, invalid_input_error, invalid_invocation_error, Error};

#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
pub struct Bicycle {
    #[polar(attribute)]
    pub id: Uuid,
    #[polar(attribute)]
    pub owner_id: Uuid,
    pub label: String,
    pub qr_code: String,
    pub locked: bool,
    pub status: Status,
    pub earnings: f64,
    pub completed_rides: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Status {
    Available,
    Reserved { ride_id: Uuid },
    InUse { ride_id: Uuid },
    Maintenance,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Available => "available".into(),
            Self::Reserved { .. } => "reserved".into(),
            Self::InUse { .. } => "in_use".into(),
            Self::Maintenance => "maintenance".into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NearbyBicycle {
    pub bicycle: Bicycle,
    /// meters
    pub distance: f64,
}

impl Bicycle {
    pub fn new(owner_id: Uuid, label: String, qr_code: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            label,
            qr_code,
            locked: true,
            status: Status::Available,
            earnings: 0.0,
            completed_rides: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.status, Status::Available)
    }

    #[tracing::instrument(skip(self), fields(bicycle_id = %self.id))]
    pub fn reserve(&mut self, ride_id: Uuid) -> Result<(), Error> {
        match self.status {
            Status::Available => {
                self.status = Status::Reserved { ride_id };
                Ok(())
            }
            _ => Err(bicycle_unavailable_error()),
        }
    }

    /// Unlocks a bicycle reserved for `ride_id` after its QR code was scanned.
    #[tracing::instrument(skip(self, qr_code), fields(bicycle_id = %self.id))]
    pub fn unlock(&mut self, ride_id: Uuid, qr_code: &str) -> Result<(), Error> {
        match self.status {
            Status::Reserved { ride_id: reserved } if reserved == ride_id => {
                if self.qr_code != qr_code {
                    return Err(invalid_input_error());
                }

                self.status = Status::InUse { ride_id };
                self.locked = false;
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    #[tracing::instrument(skip(self), fields(bicycle_id = %self.id))]
    pub fn release(&mut self, ride_id: Uuid) -> Result<(), Error> {
        match self.status {
            Status::Reserved { ride_id: current } | Status::InUse { ride_id: current }
                if current == ride_id =>
            {
                self.status = Status::Available;
                self.locked = true;
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    pub fn credit(&mut self, amount: f64) {
        self.earnings = round_cents(self.earnings + amount);
        self.completed_rides += 1;
    }

    pub fn start_maintenance(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Available => {
                self.status = Status::Maintenance;
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    pub fn end_maintenance(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Maintenance => {
                self.status = Status::Available;
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bicycle() -> Bicycle {
        Bicycle::new(Uuid::new_v4(), "blue roadster".into(), "QR-1234".into())
    }

    #[test]
    fn second_reservation_conflicts() {
        let mut bicycle = bicycle();

        bicycle.reserve(Uuid::new_v4()).unwrap();
        assert_eq!(
            bicycle.reserve(Uuid::new_v4()).unwrap_err(),
            bicycle_unavailable_error()
        );
    }

    #[test]
    fn unlock_requires_matching_ride_and_code() {
        let mut bicycle = bicycle();
        let ride_id = Uuid::new_v4();
        bicycle.reserve(ride_id).unwrap();

        assert!(bicycle.unlock(Uuid::new_v4(), "QR-1234").unwrap_err().is_invalid_invocation_error());
        assert!(bicycle.unlock(ride_id, "QR-9999").unwrap_err().is_invalid_input_error());
        assert!(bicycle.locked);

        bicycle.unlock(ride_id, "QR-1234").unwrap();
        assert_eq!(bicycle.status, Status::InUse { ride_id });
        assert!(!bicycle.locked);
    }

    #[test]
    fn release_locks_and_frees() {
        let mut bicycle = bicycle();
        let ride_id = Uuid::new_v4();
        bicycle.reserve(ride_id).unwrap();
        bicycle.unlock(ride_id, "QR-1234").unwrap();

        assert!(bicycle.release(Uuid::new_v4()).is_err());

        bicycle.release(ride_id).unwrap();
        assert!(bicycle.is_available());
        assert!(bicycle.locked);
    }

    #[test]
    fn maintenance_blocks_reservation() {
        let mut bicycle = bicycle();
        bicycle.start_maintenance().unwrap();

        assert!(bicycle.reserve(Uuid::new_v4()).is_err());

        bicycle.end_maintenance().unwrap();
        assert!(bicycle.reserve(Uuid::new_v4()).is_ok());
        assert!(bicycle.start_maintenance().is_err());
    }

    #[test]
    fn credit_accumulates() {
        let mut bicycle = bicycle();
        bicycle.credit(12.5);
        bicycle.credit(7.25);

        assert_eq!(bicycle.earnings, 19.75);
        assert_eq!(bicycle.completed_rides, 2);
    }
}
