use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::location::Coordinate;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Address not found")]
    AddressNotFound,
    #[error("Geocoding API error: {0}")]
    ApiError(String),
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    items: Vec<GeocodeItem>,
}

#[derive(Debug, Deserialize)]
struct GeocodeItem {
    position: GeocodePosition,
}

#[derive(Debug, Deserialize)]
struct GeocodePosition {
    lat: f64,
    lng: f64,
}

/// HERE geocoding client. Unlike the forecast path, geocode failures are
/// surfaced to the caller: a job address that cannot be resolved needs
/// operator attention.
pub struct GeocodeClient {
    client: Client,
    config: Config,
}

impl GeocodeClient {
    pub fn new(config: Config) -> Self {
        let client = Client::builder()
            .user_agent("JobsiteWeatherServer/1.0")
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    pub async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let response = self
            .client
            .get(&self.config.here_geocode_url)
            .query(&[("q", address), ("apiKey", &self.config.here_api_key)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeocodeError::ApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let payload: GeocodeResponse = response.json().await?;
        let item = payload
            .items
            .into_iter()
            .next()
            .ok_or(GeocodeError::AddressNotFound)?;

        Ok(Coordinate {
            lat: item.position.lat,
            lng: item.position.lng,
        })
    }
}
