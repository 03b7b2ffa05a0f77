use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

use super::cache::FetchForecast;
use super::types::{ForecastListResponse, WeatherRecord};
use super::within_work_hours;
use crate::config::Config;
use crate::location::Coordinate;

#[derive(Error, Debug)]
pub enum OpenWeatherError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("Rate limited, retry after: {0}s")]
    RateLimited(u64),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Invalid coordinates")]
    InvalidCoordinates,
}

pub struct OpenWeatherClient {
    client: Client,
    config: Config,
    timezone: Tz,
}

impl OpenWeatherClient {
    pub fn new(config: Config) -> Self {
        let client = Client::builder()
            .user_agent("JobsiteWeatherServer/1.0")
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        let timezone = config.timezone();
        Self {
            client,
            config,
            timezone,
        }
    }

    /// Fetch the 5-day/3-hour forecast for a coordinate and normalize it.
    /// Entries outside the local work day are dropped; date filtering is
    /// left to the cache.
    pub async fn fetch_forecast(
        &self,
        coordinate: Coordinate,
    ) -> Result<Vec<WeatherRecord>, OpenWeatherError> {
        if !self.is_valid_coordinates(coordinate.lat, coordinate.lng) {
            return Err(OpenWeatherError::InvalidCoordinates);
        }

        let url = format!(
            "{}{}",
            self.config.openweather_base_url, self.config.openweather_forecast_path
        );

        let response = self
            .make_request_with_retry(&url, &[
                ("lat", &coordinate.lat.to_string()),
                ("lon", &coordinate.lng.to_string()),
                ("units", "imperial"),
                ("appid", &self.config.openweather_api_key),
            ])
            .await?;

        let payload: ForecastListResponse = serde_json::from_value(response)?;
        normalize_forecast(payload, self.timezone)
    }

    async fn make_request_with_retry(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, OpenWeatherError> {
        let mut retry_count = 0;
        let max_retries = 3;
        let mut delay = Duration::from_millis(1000);

        loop {
            let response = self.client.get(url).query(params).send().await?;

            match response.status() {
                reqwest::StatusCode::OK => {
                    let json: Value = response.json().await?;
                    return Ok(json);
                }
                reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    if retry_count >= max_retries {
                        return Err(OpenWeatherError::RateLimited(delay.as_secs()));
                    }

                    tracing::warn!(
                        "Rate limited by OpenWeather API, retrying in {}ms",
                        delay.as_millis()
                    );

                    sleep(delay).await;
                    delay = delay.mul_f32(2.0 + fastrand::f32() * 0.5); // Exponential backoff with jitter
                    retry_count += 1;
                }
                status => {
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(OpenWeatherError::ApiError(format!(
                        "HTTP {}: {}",
                        status, error_text
                    )));
                }
            }
        }
    }

    fn is_valid_coordinates(&self, lat: f64, lng: f64) -> bool {
        (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
    }
}

#[async_trait]
impl FetchForecast for OpenWeatherClient {
    async fn fetch_forecast(
        &self,
        coordinate: Coordinate,
    ) -> Result<Vec<WeatherRecord>, OpenWeatherError> {
        OpenWeatherClient::fetch_forecast(self, coordinate).await
    }
}

/// Map raw forecast entries to `WeatherRecord`s: round to whole degrees
/// and mph, scale `pop` to a percentage, keep only work-hour slots. A
/// missing weather label or an out-of-range timestamp fails the whole
/// payload rather than silently skipping entries.
fn normalize_forecast(
    payload: ForecastListResponse,
    timezone: Tz,
) -> Result<Vec<WeatherRecord>, OpenWeatherError> {
    let mut records = Vec::with_capacity(payload.list.len());

    for entry in payload.list {
        let forecast_time = DateTime::<Utc>::from_timestamp(entry.dt, 0).ok_or_else(|| {
            OpenWeatherError::ApiError(format!("forecast entry has invalid timestamp {}", entry.dt))
        })?;
        let conditions = entry
            .weather
            .first()
            .map(|w| w.main.clone())
            .ok_or_else(|| {
                OpenWeatherError::ApiError("forecast entry missing weather conditions".to_string())
            })?;

        if !within_work_hours(forecast_time.with_timezone(&timezone).hour()) {
            continue;
        }

        records.push(WeatherRecord {
            temperature: entry.main.temp.round() as i32,
            conditions,
            precipitation: (entry.pop * 100.0).round() as i32,
            wind_speed: entry.wind.speed.round() as i32,
            forecast_time,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::types::{
        ForecastEntry, ForecastEntryMain, ForecastEntryWeather, ForecastEntryWind,
    };
    use chrono::TimeZone;

    const PHOENIX: Tz = chrono_tz::America::Phoenix;

    fn entry(dt: i64, temp: f64, label: &str, pop: f64, wind: f64) -> ForecastEntry {
        ForecastEntry {
            dt,
            main: ForecastEntryMain { temp },
            weather: vec![ForecastEntryWeather {
                main: label.to_string(),
            }],
            pop,
            wind: ForecastEntryWind { speed: wind },
        }
    }

    fn phoenix_timestamp(hour: u32) -> i64 {
        PHOENIX
            .with_ymd_and_hms(2025, 6, 10, hour, 0, 0)
            .unwrap()
            .timestamp()
    }

    #[test]
    fn test_units_are_rounded_and_scaled() {
        let payload = ForecastListResponse {
            list: vec![entry(phoenix_timestamp(10), 88.6, "Clouds", 0.42, 11.4)],
        };

        let records = normalize_forecast(payload, PHOENIX).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].temperature, 89);
        assert_eq!(records[0].conditions, "Clouds");
        assert_eq!(records[0].precipitation, 42);
        assert_eq!(records[0].wind_speed, 11);
    }

    #[test]
    fn test_entries_outside_work_hours_are_dropped() {
        let payload = ForecastListResponse {
            list: vec![
                entry(phoenix_timestamp(4), 70.0, "Clear", 0.0, 3.0),
                entry(phoenix_timestamp(7), 72.0, "Clear", 0.0, 3.0),
                entry(phoenix_timestamp(18), 95.0, "Clear", 0.0, 3.0),
                entry(phoenix_timestamp(21), 85.0, "Clear", 0.0, 3.0),
            ],
        };

        let records = normalize_forecast(payload, PHOENIX).unwrap();
        let hours: Vec<u32> = records
            .iter()
            .map(|r| r.forecast_time.with_timezone(&PHOENIX).hour())
            .collect();
        assert_eq!(hours, vec![7, 18]);
    }

    #[test]
    fn test_missing_weather_label_is_a_payload_error() {
        let mut bad = entry(phoenix_timestamp(10), 70.0, "Clear", 0.0, 3.0);
        bad.weather.clear();
        let payload = ForecastListResponse { list: vec![bad] };

        assert!(matches!(
            normalize_forecast(payload, PHOENIX),
            Err(OpenWeatherError::ApiError(_))
        ));
    }
}
