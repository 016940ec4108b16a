use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::round_cents;
use crate::error::{
    insufficient_balance_error, invalid_input_error, invalid_invocation_error, Error,
};

#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
pub struct Rider {
    #[polar(attribute)]
    pub id: Uuid,
    pub wallet_balance: f64,
    pub status: Status,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Status {
    Inactive,
    Active { ride_id: Uuid },
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Inactive => "inactive".into(),
            Self::Active { .. } => "active".into(),
        }
    }
}

impl Rider {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: user_id,
            wallet_balance: 0.0,
            status: Status::Inactive,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, Status::Active { .. })
    }

    pub fn active_ride(&self) -> Option<Uuid> {
        match self.status {
            Status::Active { ride_id } => Some(ride_id),
            Status::Inactive => None,
        }
    }

    pub fn activate(&mut self, ride_id: Uuid) -> Result<(), Error> {
        match self.status {
            Status::Inactive => {
                self.status = Status::Active { ride_id };
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    pub fn deactivate(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Active { .. } => {
                self.status = Status::Inactive;
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }

    pub fn top_up(&mut self, amount: f64) -> Result<(), Error> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(invalid_input_error());
        }

        self.wallet_balance = round_cents(self.wallet_balance + amount);
        Ok(())
    }

    /// Leaves the balance untouched when it does not cover `amount`.
    pub fn debit(&mut self, amount: f64) -> Result<(), Error> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(invalid_input_error());
        }

        if self.wallet_balance < amount {
            return Err(insufficient_balance_error());
        }

        self.wallet_balance = round_cents(self.wallet_balance - amount);
        Ok(())
    }
}
