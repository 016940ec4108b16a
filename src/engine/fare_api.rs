use super::Engine;

use async_trait::async_trait;

use crate::{
    api::FareAPI,
    auth::User,
    entities::Fare,
    error::{invalid_input_error, Error},
};

#[async_trait]
impl FareAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn estimate_fare(
        &self,
        _user: User,
        distance_km: f64,
        elapsed_minutes: f64,
    ) -> Result<Fare, Error> {
        if !distance_km.is_finite() || !elapsed_minutes.is_finite() {
            return Err(invalid_input_error());
        }

        Ok(self.tariff.quote(distance_km, elapsed_minutes))
    }
}
