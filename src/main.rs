use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod database;
mod forecast;
mod geocoding;
mod location;
mod regions;
mod routes;
mod suitability;

use config::Config;
use database::Database;
use forecast::cache::ForecastCache;
use forecast::openweather::OpenWeatherClient;
use geocoding::GeocodeClient;
use regions::ServiceAreas;
use routes::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobsite_weather_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize the weather cache database
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:./weather_cache.db".to_string());
    let pool = sqlx::SqlitePool::connect(&database_url).await?;
    let database = Database::new(pool);
    database.init_tables().await?;
    database.health_check().await?;

    // Service-area polygons: bundled data unless a file override is configured
    let regions = Arc::new(match &config.service_area_file {
        Some(path) => ServiceAreas::from_file(path)?,
        None => ServiceAreas::bundled(),
    });

    // External clients are constructed here and injected; nothing is
    // lazily initialized at first use.
    let weather_client = Arc::new(OpenWeatherClient::new(config.clone()));
    let geocoder = Arc::new(GeocodeClient::new(config.clone()));

    let forecast = Arc::new(ForecastCache::new(
        Arc::new(database),
        weather_client,
        config.timezone(),
    ));

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        forecast,
        regions,
        geocoder,
    };

    let app = create_router(state).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!("Server starting on http://0.0.0.0:8080");

    axum::serve(listener, app).await?;

    Ok(())
}
