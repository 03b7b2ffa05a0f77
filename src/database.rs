use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::forecast::types::StoredForecast;
use crate::location::{bucket_index, bucket_key, Coordinate, COORD_TOLERANCE_DEG};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),
}

/// Persistent weather cache contract: a latitude range scan plus point
/// writes keyed by `{bucket}_{forecast timestamp}`. Longitude, TTL, and
/// business-hour filtering happen in memory on the caller's side.
#[async_trait]
pub trait ForecastStore: Send + Sync {
    /// All records whose latitude is within the tolerance box of the
    /// query coordinate. May include records outside the longitude box.
    async fn find_near(&self, coordinate: Coordinate) -> Result<Vec<StoredForecast>, DatabaseError>;

    /// Write every record; rewriting an existing key with equivalent data
    /// is idempotent.
    async fn put_all(&self, records: &[StoredForecast]) -> Result<(), DatabaseError>;
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init_tables(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS weather_cache (
                id TEXT PRIMARY KEY,
                temperature INTEGER NOT NULL,
                conditions TEXT NOT NULL,
                precipitation INTEGER NOT NULL,
                wind_speed INTEGER NOT NULL,
                cached_at TEXT NOT NULL,
                lat REAL NOT NULL,
                lng REAL NOT NULL,
                forecast_time TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // The lookup path range-scans latitude only.
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_weather_cache_lat ON weather_cache(lat)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ForecastStore for Database {
    async fn find_near(&self, coordinate: Coordinate) -> Result<Vec<StoredForecast>, DatabaseError> {
        let results = sqlx::query_as::<_, StoredForecast>(
            r#"
            SELECT temperature, conditions, precipitation, wind_speed,
                   cached_at, lat, lng, forecast_time
            FROM weather_cache
            WHERE lat >= $1 AND lat <= $2
            "#,
        )
        .bind(coordinate.lat - COORD_TOLERANCE_DEG)
        .bind(coordinate.lat + COORD_TOLERANCE_DEG)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    async fn put_all(&self, records: &[StoredForecast]) -> Result<(), DatabaseError> {
        for record in records {
            let id = format!(
                "{}_{}",
                bucket_key(record.lat, record.lng),
                record.forecast_time.timestamp()
            );

            sqlx::query(
                r#"
                INSERT OR REPLACE INTO weather_cache (
                    id, temperature, conditions, precipitation, wind_speed,
                    cached_at, lat, lng, forecast_time
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(&id)
            .bind(record.temperature)
            .bind(&record.conditions)
            .bind(record.precipitation)
            .bind(record.wind_speed)
            .bind(record.cached_at)
            .bind(record.lat)
            .bind(record.lng)
            .bind(record.forecast_time)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }
}

/// In-memory bucket index keyed by rounded coordinate, used by tests and
/// available as an ephemeral store. One bucket is ~1.1 km square, so the
/// tolerance box around any query spans at most the 3x3 neighborhood.
#[derive(Clone, Default)]
pub struct MemoryStore {
    buckets: Arc<RwLock<HashMap<String, Vec<StoredForecast>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_count(&self) -> usize {
        self.buckets.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl ForecastStore for MemoryStore {
    async fn find_near(&self, coordinate: Coordinate) -> Result<Vec<StoredForecast>, DatabaseError> {
        let lat_bucket = bucket_index(coordinate.lat);
        let lng_bucket = bucket_index(coordinate.lng);

        let buckets = self.buckets.read().await;
        let mut results = Vec::new();
        for dlat in -1..=1 {
            for dlng in -1..=1 {
                let key = format!("{}_{}", lat_bucket + dlat, lng_bucket + dlng);
                if let Some(records) = buckets.get(&key) {
                    results.extend(
                        records
                            .iter()
                            .filter(|r| (r.lat - coordinate.lat).abs() <= COORD_TOLERANCE_DEG)
                            .cloned(),
                    );
                }
            }
        }

        Ok(results)
    }

    async fn put_all(&self, records: &[StoredForecast]) -> Result<(), DatabaseError> {
        let mut buckets = self.buckets.write().await;
        for record in records {
            let bucket = buckets
                .entry(bucket_key(record.lat, record.lng))
                .or_default();
            bucket.retain(|existing| existing.forecast_time != record.forecast_time);
            bucket.push(record.clone());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::types::WeatherRecord;
    use chrono::{Duration, Utc};

    fn stored(lat: f64, lng: f64) -> StoredForecast {
        let record = WeatherRecord {
            temperature: 75,
            conditions: "Clear".to_string(),
            precipitation: 5,
            wind_speed: 8,
            forecast_time: Utc::now() + Duration::hours(3),
        };
        StoredForecast::from_record(&record, Coordinate { lat, lng }, Utc::now())
    }

    #[tokio::test]
    async fn test_memory_store_finds_records_within_latitude_tolerance() {
        let store = MemoryStore::new();
        store
            .put_all(&[stored(32.4364, -111.2224), stored(33.0, -111.2224)])
            .await
            .unwrap();

        let results = store
            .find_near(Coordinate {
                lat: 32.4401,
                lng: -111.2224,
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!((results[0].lat - 32.4364).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_memory_store_overwrite_is_idempotent() {
        let store = MemoryStore::new();
        let record = stored(32.4364, -111.2224);
        store.put_all(&[record.clone()]).await.unwrap();
        store.put_all(&[record]).await.unwrap();

        assert_eq!(store.record_count().await, 1);
    }
}
