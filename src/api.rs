use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{
    Bicycle, Complaint, Coordinates, DisplayMetrics, Fare, Metrics, NearbyBicycle,
    OwnerDashboard, PaymentMethod, Ride, Rider, Route,
};
use crate::error::Error;

#[async_trait]
pub trait RiderAPI {
    async fn create_rider(&self, user: User) -> Result<Rider, Error>;

    async fn find_rider(&self, user: User, id: Uuid) -> Result<Rider, Error>;

    async fn top_up_wallet(&self, user: User, id: Uuid, amount: f64) -> Result<Rider, Error>;
}

#[async_trait]
pub trait BicycleAPI {
    async fn create_bicycle(&self, user: User, label: String, qr_code: String)
        -> Result<Bicycle, Error>;

    async fn find_bicycle(&self, user: User, id: Uuid) -> Result<Bicycle, Error>;

    async fn find_nearby_bicycles(
        &self,
        user: User,
        coordinates: Coordinates,
        radius: f64,
    ) -> Result<Vec<NearbyBicycle>, Error>;

    async fn update_bicycle_location(
        &self,
        user: User,
        id: Uuid,
        coordinates: Coordinates,
    ) -> Result<(), Error>;

    async fn set_bicycle_maintenance(
        &self,
        user: User,
        id: Uuid,
        maintenance: bool,
    ) -> Result<Bicycle, Error>;
}

#[async_trait]
pub trait RouteAPI {
    async fn create_route(
        &self,
        user: User,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Route, Error>;

    async fn find_route(&self, user: User, token: Uuid) -> Result<Route, Error>;
}

#[async_trait]
pub trait FareAPI {
    async fn estimate_fare(
        &self,
        user: User,
        distance_km: f64,
        elapsed_minutes: f64,
    ) -> Result<Fare, Error>;
}

#[async_trait]
pub trait RideAPI {
    async fn create_ride(
        &self,
        user: User,
        bicycle_id: Uuid,
        boarding: Coordinates,
        destination: Coordinates,
    ) -> Result<Ride, Error>;

    async fn find_ride(&self, user: User, id: Uuid) -> Result<Ride, Error>;

    async fn ride_progress(&self, user: User, id: Uuid) -> Result<DisplayMetrics, Error>;

    async fn start_ride(&self, user: User, id: Uuid, qr_code: String) -> Result<Ride, Error>;

    async fn update_ride_metrics(&self, user: User, id: Uuid, metrics: Metrics)
        -> Result<Ride, Error>;

    async fn end_ride(&self, user: User, id: Uuid) -> Result<Ride, Error>;

    async fn cancel_ride(&self, user: User, id: Uuid) -> Result<Ride, Error>;

    async fn pay_ride(
        &self,
        user: User,
        id: Uuid,
        method: PaymentMethod,
        transaction_id: Option<String>,
    ) -> Result<Ride, Error>;
}

#[async_trait]
pub trait ComplaintAPI {
    async fn create_complaint(
        &self,
        user: User,
        ride_id: Option<Uuid>,
        bicycle_id: Option<Uuid>,
        message: String,
    ) -> Result<Complaint, Error>;

    async fn find_complaint(&self, user: User, id: Uuid) -> Result<Complaint, Error>;

    async fn list_complaints(&self, user: User, open_only: bool) -> Result<Vec<Complaint>, Error>;

    async fn resolve_complaint(
        &self,
        user: User,
        id: Uuid,
        resolution: String,
    ) -> Result<Complaint, Error>;
}

#[async_trait]
pub trait DashboardAPI {
    async fn owner_dashboard(&self, user: User) -> Result<OwnerDashboard, Error>;
}

pub trait API:
    RiderAPI + BicycleAPI + RouteAPI + FareAPI + RideAPI + ComplaintAPI + DashboardAPI
{
}
