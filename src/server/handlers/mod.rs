pub mod bicycles;
pub mod complaints;
pub mod dashboard;
pub mod fares;
pub mod riders;
pub mod rides;
pub mod routes;
