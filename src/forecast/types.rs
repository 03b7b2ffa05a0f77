use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::location::Coordinate;

/// Normalized forecast for one three-hour slot, as returned to callers.
/// Imperial units throughout: Fahrenheit, mph, precipitation probability
/// as a whole percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub temperature: i32,
    pub conditions: String,
    pub precipitation: i32,
    pub wind_speed: i32,
    pub forecast_time: DateTime<Utc>,
}

/// Cache document persisted per (bucket, forecast time). Immutable once
/// written; freshness is computed at read time from `cached_at`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredForecast {
    pub temperature: i32,
    pub conditions: String,
    pub precipitation: i32,
    pub wind_speed: i32,
    pub cached_at: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
    pub forecast_time: DateTime<Utc>,
}

impl StoredForecast {
    pub fn from_record(
        record: &WeatherRecord,
        coordinate: Coordinate,
        cached_at: DateTime<Utc>,
    ) -> Self {
        Self {
            temperature: record.temperature,
            conditions: record.conditions.clone(),
            precipitation: record.precipitation,
            wind_speed: record.wind_speed,
            cached_at,
            lat: coordinate.lat,
            lng: coordinate.lng,
            forecast_time: record.forecast_time,
        }
    }

    pub fn into_record(self) -> WeatherRecord {
        WeatherRecord {
            temperature: self.temperature,
            conditions: self.conditions,
            precipitation: self.precipitation,
            wind_speed: self.wind_speed,
            forecast_time: self.forecast_time,
        }
    }
}

// Raw OpenWeather 5-day/3-hour payload, reduced to the fields we read.

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastListResponse {
    pub list: Vec<ForecastEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: ForecastEntryMain,
    pub weather: Vec<ForecastEntryWeather>,
    #[serde(default)]
    pub pop: f64,
    pub wind: ForecastEntryWind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntryMain {
    pub temp: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntryWeather {
    pub main: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntryWind {
    pub speed: f64,
}
