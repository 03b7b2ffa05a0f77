use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::Config,
    forecast::{cache::ForecastCache, types::WeatherRecord},
    geocoding::{GeocodeClient, GeocodeError},
    location::{validate_coordinates, Coordinate},
    regions::{RegionTag, ServiceAreas},
    suitability::is_suitable_for_installation,
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub forecast: Arc<ForecastCache>,
    pub regions: Arc<ServiceAreas>,
    pub geocoder: Arc<GeocodeClient>,
}

// Request/Response types
#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub lat: f64,
    pub lng: f64,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyQuery {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub weather: WeatherRecord,
    pub suitable_for_installation: bool,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub coordinates: Coordinate,
    pub tag: RegionTag,
}

#[derive(Debug, Serialize)]
pub struct GeocodeAddressResponse {
    pub coordinates: Coordinate,
    pub tag: RegionTag,
}

// Route handlers
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_forecast(
    State(state): State<AppState>,
    Query(params): Query<ForecastQuery>,
) -> Result<Json<ForecastResponse>, StatusCode> {
    if let Err(e) = validate_coordinates(params.lat, params.lng) {
        tracing::debug!("Rejected forecast request: {}", e);
        return Err(StatusCode::BAD_REQUEST);
    }

    let coordinate = Coordinate {
        lat: params.lat,
        lng: params.lng,
    };
    let weather = state.forecast.get_forecast(coordinate, params.date).await;

    Ok(Json(ForecastResponse {
        suitable_for_installation: is_suitable_for_installation(&weather),
        weather,
        generated_at: chrono::Utc::now(),
    }))
}

pub async fn classify_location(
    State(state): State<AppState>,
    Query(params): Query<ClassifyQuery>,
) -> Result<Json<ClassifyResponse>, StatusCode> {
    if let Err(e) = validate_coordinates(params.lat, params.lng) {
        tracing::debug!("Rejected classify request: {}", e);
        return Err(StatusCode::BAD_REQUEST);
    }

    let coordinates = Coordinate {
        lat: params.lat,
        lng: params.lng,
    };

    Ok(Json(ClassifyResponse {
        tag: state.regions.classify(coordinates),
        coordinates,
    }))
}

pub async fn geocode_address(
    State(state): State<AppState>,
    Query(params): Query<GeocodeQuery>,
) -> Result<Json<GeocodeAddressResponse>, StatusCode> {
    match state.geocoder.geocode(&params.q).await {
        Ok(coordinates) => Ok(Json(GeocodeAddressResponse {
            tag: state.regions.classify(coordinates),
            coordinates,
        })),
        Err(GeocodeError::AddressNotFound) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Geocoding failed: {}", e);
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/forecast", get(get_forecast))
        .route("/classify", get(classify_location))
        .route("/geocode", get(geocode_address))
        .with_state(state)
}
