use oso::{Oso, OsoError, PolarClass};

use crate::auth::{Platform, User};
use crate::entities::{Bicycle, Complaint, Ride, Rider};

pub fn new() -> Result<Oso, OsoError> {
    let mut o = Oso::new();

    o.register_class(Platform::get_polar_class())?;
    o.register_class(User::get_polar_class())?;
    o.register_class(Rider::get_polar_class())?;
    o.register_class(Bicycle::get_polar_class())?;
    o.register_class(Ride::get_polar_class())?;
    o.register_class(Complaint::get_polar_class())?;

    o.load_str(include_str!("rules.polar"))?;

    Ok(o)
}

#[cfg(test)]
fn sample_ride(rider_id: uuid::Uuid) -> Ride {
    use crate::entities::{Coordinates, Route};

    let origin = Coordinates { lat: 0.0, lng: 0.0 };
    let destination = Coordinates { lat: 0.001, lng: 0.0 };
    let route = Route::from_path(origin, destination, vec![origin, destination]);

    Ride::new(rider_id, uuid::Uuid::new_v4(), route, 10.0)
}

#[test]
fn platform_role_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let owner = User::new(Uuid::new_v4(), vec!["owner".into()]);
    let system = User::new_system_user();
    let rider = User::new(Uuid::new_v4(), vec![]);

    let result = authorizor.is_allowed(owner.clone(), "create_bicycle", Platform::default());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(owner.clone(), "list_complaints", Platform::default());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(system.clone(), "create_bicycle", Platform::default());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(system.clone(), "list_complaints", Platform::default());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(rider.clone(), "view_dashboard", Platform::default());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn ride_rider_role_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let rider = User::new(Uuid::new_v4(), vec![]);
    let stranger = User::new(Uuid::new_v4(), vec![]);
    let ride = sample_ride(rider.id);

    let result = authorizor.query_rule("has_role", (rider.clone(), "rider", ride.clone()));
    assert!(result.unwrap().next().unwrap().is_ok());

    for action in ["read", "start", "end", "cancel", "pay"] {
        let result = authorizor.is_allowed(rider.clone(), action, ride.clone());
        assert_eq!(result.unwrap(), true, "rider should be allowed to {}", action);

        let result = authorizor.is_allowed(stranger.clone(), action, ride.clone());
        assert_eq!(result.unwrap(), false, "stranger should not be allowed to {}", action);
    }

    let result = authorizor.is_allowed(rider.clone(), "update_metrics", ride.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn ride_system_role_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let system = User::new_system_user();
    let ride = sample_ride(Uuid::new_v4());

    let result = authorizor.query_rule("has_role", (system.clone(), "system", ride.clone()));
    assert!(result.unwrap().next().unwrap().is_ok());

    let result = authorizor.is_allowed(system.clone(), "update_metrics", ride.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(system.clone(), "end", ride.clone());
    assert_eq!(result.unwrap(), true);
}

#[test]
fn bicycle_owner_role_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let owner = User::new(Uuid::new_v4(), vec!["owner".into()]);
    let other_owner = User::new(Uuid::new_v4(), vec!["owner".into()]);
    let bicycle = Bicycle::new(owner.id, "red".into(), "QR-RED".into());

    let result = authorizor.is_allowed(owner.clone(), "update_location", bicycle.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(owner.clone(), "maintain", bicycle.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(other_owner.clone(), "update_location", bicycle.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn rider_self_role_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let user = User::new(Uuid::new_v4(), vec![]);
    let rider = Rider::new(user.id);
    let other = Rider::new(Uuid::new_v4());

    let result = authorizor.is_allowed(user.clone(), "top_up", rider.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(user.clone(), "top_up", other.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn complaint_author_role_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let author = User::new(Uuid::new_v4(), vec![]);
    let system = User::new_system_user();
    let complaint = Complaint::new(author.id, None, None, "flat tyre".into()).unwrap();

    let result = authorizor.is_allowed(author.clone(), "read", complaint.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(author.clone(), "resolve", complaint.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(system.clone(), "resolve", complaint.clone());
    assert_eq!(result.unwrap(), true);
}
