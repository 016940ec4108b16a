use serde::{Deserialize, Serialize};

use crate::entities::{round_cents, Bicycle, BicycleStatus};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OwnerDashboard {
    pub bicycles: Vec<Bicycle>,
    pub total_earnings: f64,
    pub completed_rides: u64,
    pub available: usize,
    pub in_use: usize,
    pub in_maintenance: usize,
}

impl OwnerDashboard {
    pub fn from_bicycles(bicycles: Vec<Bicycle>) -> Self {
        let total_earnings = round_cents(bicycles.iter().map(|b| b.earnings).sum());
        let completed_rides = bicycles.iter().map(|b| b.completed_rides).sum();

        let count = |f: fn(&BicycleStatus) -> bool| bicycles.iter().filter(|b| f(&b.status)).count();
        let available = count(|s| matches!(s, BicycleStatus::Available));
        let in_use = count(|s| matches!(s, BicycleStatus::Reserved { .. } | BicycleStatus::InUse { .. }));
        let in_maintenance = count(|s| matches!(s, BicycleStatus::Maintenance));

        Self {
            bicycles,
            total_earnings,
            completed_rides,
            available,
            in_use,
            in_maintenance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn summarises_fleet() {
        let owner_id = Uuid::new_v4();

        let mut earning = Bicycle::new(owner_id, "a".into(), "QR-A".into());
        earning.credit(10.5);
        earning.credit(4.0);

        let mut busy = Bicycle::new(owner_id, "b".into(), "QR-B".into());
        busy.reserve(Uuid::new_v4()).unwrap();
        busy.credit(1.25);

        let mut broken = Bicycle::new(owner_id, "c".into(), "QR-C".into());
        broken.start_maintenance().unwrap();

        let dashboard = OwnerDashboard::from_bicycles(vec![earning, busy, broken]);

        assert_eq!(dashboard.total_earnings, 15.75);
        assert_eq!(dashboard.completed_rides, 3);
        assert_eq!(dashboard.available, 1);
        assert_eq!(dashboard.in_use, 1);
        assert_eq!(dashboard.in_maintenance, 1);
    }

    #[test]
    fn empty_fleet() {
        let dashboard = OwnerDashboard::from_bicycles(vec![]);
        assert_eq!(dashboard.total_earnings, 0.0);
        assert_eq!(dashboard.completed_rides, 0);
    }
}
