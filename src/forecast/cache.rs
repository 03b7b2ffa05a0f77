use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

use super::openweather::OpenWeatherError;
use super::types::{StoredForecast, WeatherRecord};
use super::within_work_hours;
use crate::database::ForecastStore;
use crate::location::{Coordinate, COORD_TOLERANCE_DEG};

/// Cached forecasts older than this are invisible to lookups. Stale rows
/// are never deleted, only ignored.
const CACHE_TTL_SECS: i64 = 3 * 60 * 60;

/// Upstream forecast source. Implemented by the OpenWeather client and by
/// scripted providers in tests.
#[async_trait]
pub trait FetchForecast: Send + Sync {
    async fn fetch_forecast(
        &self,
        coordinate: Coordinate,
    ) -> Result<Vec<WeatherRecord>, OpenWeatherError>;
}

/// Lookup-then-fetch-then-persist orchestration over the weather store.
///
/// `get_forecast` is total: store and provider failures are logged and
/// degrade to the neutral default record, because a missing forecast must
/// not block scheduling.
pub struct ForecastCache {
    store: Arc<dyn ForecastStore>,
    provider: Arc<dyn FetchForecast>,
    timezone: Tz,
}

impl ForecastCache {
    pub fn new(store: Arc<dyn ForecastStore>, provider: Arc<dyn FetchForecast>, timezone: Tz) -> Self {
        Self {
            store,
            provider,
            timezone,
        }
    }

    pub async fn get_forecast(
        &self,
        coordinate: Coordinate,
        target_date: Option<NaiveDate>,
    ) -> WeatherRecord {
        let now = Utc::now();

        let cached = match self.store.find_near(coordinate).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Weather cache lookup failed, treating as miss: {}", e);
                Vec::new()
            }
        };

        // First usable row wins; no distance or freshness ranking.
        if let Some(hit) = cached
            .into_iter()
            .find(|record| self.is_usable(record, coordinate, now, target_date))
        {
            tracing::debug!(lat = coordinate.lat, lng = coordinate.lng, "Using cached weather data");
            return hit.into_record();
        }

        tracing::debug!(lat = coordinate.lat, lng = coordinate.lng, "Fetching fresh weather data");
        let fetched = match self.provider.fetch_forecast(coordinate).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Forecast fetch failed, returning default weather: {}", e);
                return fallback_record();
            }
        };

        let Some(selected) = self.select_for_date(&fetched, target_date) else {
            tracing::warn!(
                lat = coordinate.lat,
                lng = coordinate.lng,
                "Provider returned no work-hour forecast entries, returning default weather"
            );
            return fallback_record();
        };

        let rows: Vec<StoredForecast> = fetched
            .iter()
            .map(|record| StoredForecast::from_record(record, coordinate, now))
            .collect();

        // Write-through on a detached task: caller cancellation must not
        // abort writes already issued.
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.put_all(&rows).await {
                tracing::warn!("Failed to persist weather forecasts: {}", e);
            }
        });

        selected
    }

    fn is_usable(
        &self,
        record: &StoredForecast,
        coordinate: Coordinate,
        now: DateTime<Utc>,
        target_date: Option<NaiveDate>,
    ) -> bool {
        let local = record.forecast_time.with_timezone(&self.timezone);

        (record.lng - coordinate.lng).abs() <= COORD_TOLERANCE_DEG
            && (now - record.cached_at).num_seconds() < CACHE_TTL_SECS
            && target_date.map_or(true, |date| local.date_naive() == date)
            && within_work_hours(local.hour())
    }

    fn select_for_date(
        &self,
        records: &[WeatherRecord],
        target_date: Option<NaiveDate>,
    ) -> Option<WeatherRecord> {
        match target_date {
            Some(date) => {
                let target = self.local_midnight(date);
                records
                    .iter()
                    .min_by_key(|record| (record.forecast_time - target).num_seconds().abs())
                    .cloned()
            }
            None => records.first().cloned(),
        }
    }

    fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        self.timezone
            .from_local_datetime(&midnight)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
    }
}

/// Fixed neutral record returned when no forecast data can be obtained.
pub fn fallback_record() -> WeatherRecord {
    WeatherRecord {
        temperature: 70,
        conditions: "Unknown".to_string(),
        precipitation: 0,
        wind_speed: 0,
        forecast_time: Utc::now(),
    }
}
