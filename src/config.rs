use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::entities::Tariff;
use crate::error::{config_error, Error};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub listen_addr: SocketAddr,
    pub directions: DirectionsConfig,
    pub tariff: Tariff,
    pub tracking: TrackingConfig,
}

/// Mapbox-compatible directions service.
#[derive(Debug, Clone)]
pub struct DirectionsConfig {
    pub api_base: String,
    pub api_key: String,
    pub profile: String,
}

/// Timers and thresholds of the live ride tracking loop.
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// How often the current location is sampled.
    pub sample_interval: Duration,
    /// How often the fare is recomputed and a snapshot persisted.
    pub fare_interval: Duration,
    /// Distance from every route vertex beyond which the rider is off route.
    pub off_route_threshold_m: f64,
    /// How long the rider must stay off route before a reroute is fetched.
    pub reroute_dwell: Duration,
    /// Device-pushed locations older than this are treated as unavailable.
    pub location_ttl: Duration,
    /// Walk the planned route instead of reading device positions.
    pub simulate: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(3),
            fare_interval: Duration::from_secs(15),
            off_route_threshold_m: 50.0,
            reroute_dwell: Duration::from_secs(10),
            location_ttl: Duration::from_secs(60),
            simulate: false,
        }
    }
}

impl Config {
    #[tracing::instrument(name = "Config::from_env")]
    pub fn from_env() -> Result<Self, Error> {
        if let Err(err) = dotenv::dotenv() {
            tracing::debug!("no .env file loaded: {:?}", err);
        }

        let tracking_defaults = TrackingConfig::default();
        let tariff_defaults = Tariff::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5)?,
            listen_addr: parse_or("LISTEN_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?,
            directions: DirectionsConfig {
                api_base: env::var("DIRECTIONS_API_BASE").unwrap_or_else(|_| "api.mapbox.com".into()),
                api_key: env::var("DIRECTIONS_API_KEY")?,
                profile: env::var("DIRECTIONS_PROFILE").unwrap_or_else(|_| "cycling".into()),
            },
            tariff: Tariff {
                base_fare: parse_or("TARIFF_BASE_FARE", tariff_defaults.base_fare)?,
                per_km: parse_or("TARIFF_PER_KM", tariff_defaults.per_km)?,
                per_minute: parse_or("TARIFF_PER_MINUTE", tariff_defaults.per_minute)?,
                minimum_fare: parse_or("TARIFF_MINIMUM_FARE", tariff_defaults.minimum_fare)?,
            },
            tracking: TrackingConfig {
                sample_interval: secs_or(
                    "TRACKING_SAMPLE_INTERVAL_SECS",
                    tracking_defaults.sample_interval,
                )?,
                fare_interval: secs_or("TRACKING_FARE_INTERVAL_SECS", tracking_defaults.fare_interval)?,
                off_route_threshold_m: parse_or(
                    "TRACKING_OFF_ROUTE_THRESHOLD_M",
                    tracking_defaults.off_route_threshold_m,
                )?,
                reroute_dwell: secs_or("TRACKING_REROUTE_DWELL_SECS", tracking_defaults.reroute_dwell)?,
                location_ttl: secs_or("LOCATION_TTL_SECS", tracking_defaults.location_ttl)?,
                simulate: parse_or("TRACKING_SIMULATE", tracking_defaults.simulate)?,
            },
        })
    }
}

fn parse_or<T: FromStr>(name: &str, default: T) -> Result<T, Error> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| config_error(name)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err.into()),
    }
}

fn secs_or(name: &str, default: Duration) -> Result<Duration, Error> {
    parse_or(name, default.as_secs()).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_defaults() {
        let config = TrackingConfig::default();

        assert_eq!(config.fare_interval, Duration::from_secs(15));
        assert_eq!(config.reroute_dwell, Duration::from_secs(10));
        assert_eq!(config.off_route_threshold_m, 50.0);
        assert!(!config.simulate);
    }

    #[test]
    fn parse_or_falls_back_when_unset() {
        let value: u32 = parse_or("SPOKES_TEST_SURELY_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn parse_or_rejects_garbage() {
        env::set_var("SPOKES_TEST_GARBAGE_NUMBER", "seven");
        let result: Result<u32, Error> = parse_or("SPOKES_TEST_GARBAGE_NUMBER", 7);
        env::remove_var("SPOKES_TEST_GARBAGE_NUMBER");

        assert_eq!(result.unwrap_err().code, 8);
    }
}
