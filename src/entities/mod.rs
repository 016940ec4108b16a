mod bicycle;
mod complaint;
mod coordinates;
mod dashboard;
mod fare;
mod ride;
mod rider;
mod route;

pub use bicycle::{Bicycle, NearbyBicycle, Status as BicycleStatus};
pub use complaint::{Complaint, Status as ComplaintStatus};
pub use coordinates::{path_length_km, Coordinates, EARTH_RADIUS_KM};
pub use dashboard::OwnerDashboard;
pub use fare::{round_cents, Fare, Tariff};
pub use ride::{
    format_distance, format_duration, DisplayMetrics, Metrics, Payment, PaymentMethod, Ride,
    Status as RideStatus,
};
pub use rider::{Rider, Status as RiderStatus};
pub use route::{Route, AVERAGE_CYCLING_SPEED_KMH};
