use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{invalid_input_error, invalid_invocation_error, Error};

#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
pub struct Complaint {
    #[polar(attribute)]
    pub id: Uuid,
    #[polar(attribute)]
    pub author_id: Uuid,
    pub ride_id: Option<Uuid>,
    pub bicycle_id: Option<Uuid>,
    pub message: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Status {
    Open,
    Resolved {
        resolved_at: DateTime<Utc>,
        resolution: String,
    },
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Open => "open".into(),
            Self::Resolved { .. } => "resolved".into(),
        }
    }
}

impl Complaint {
    pub fn new(
        author_id: Uuid,
        ride_id: Option<Uuid>,
        bicycle_id: Option<Uuid>,
        message: String,
    ) -> Result<Self, Error> {
        let message = message.trim().to_string();
        if message.is_empty() {
            return Err(invalid_input_error());
        }

        Ok(Self {
            id: Uuid::new_v4(),
            author_id,
            ride_id,
            bicycle_id,
            message,
            status: Status::Open,
            created_at: Utc::now(),
        })
    }

    pub fn resolve(&mut self, resolution: String, now: DateTime<Utc>) -> Result<(), Error> {
        match self.status {
            Status::Open => {
                self.status = Status::Resolved {
                    resolved_at: now,
                    resolution,
                };
                Ok(())
            }
            _ => Err(invalid_invocation_error()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_message_is_rejected() {
        let result = Complaint::new(Uuid::new_v4(), None, None, "   ".into());
        assert!(result.unwrap_err().is_invalid_input_error());
    }

    #[test]
    fn resolves_once() {
        let mut complaint =
            Complaint::new(Uuid::new_v4(), None, Some(Uuid::new_v4()), " brakes squeak ".into())
                .unwrap();
        assert_eq!(complaint.message, "brakes squeak");

        complaint.resolve("brakes adjusted".into(), Utc::now()).unwrap();
        assert_eq!(complaint.status.name(), "resolved");
        assert!(complaint.resolve("again".into(), Utc::now()).is_err());
    }
}
