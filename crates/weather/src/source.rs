//! Weather data sources

use crate::types::{Result, WeatherBundle};
use async_trait::async_trait;

/// Something that can produce weather data for a city
///
/// Implementations own any latency they simulate or incur. A source is free to
/// reject a city name with [`crate::WeatherError::InvalidCity`] but does not
/// have to validate it against a gazetteer.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Produce a fresh reading plus hourly and daily forecasts for `city`
    async fn fetch(&self, city: &str) -> Result<WeatherBundle>;
}
