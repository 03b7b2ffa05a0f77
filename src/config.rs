use serde::{Deserialize, Serialize};
use std::env;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub openweather_api_key: String,
    pub openweather_base_url: String,
    pub openweather_forecast_path: String,
    pub here_api_key: String,
    pub here_geocode_url: String,
    pub app_timezone: String,
    pub service_area_file: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config {
            openweather_api_key: env::var("OPENWEATHER_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENWEATHER_API_KEY not set"))?,
            openweather_base_url: env::var("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org".to_string()),
            openweather_forecast_path: env::var("OPENWEATHER_FORECAST_PATH")
                .unwrap_or_else(|_| "/data/2.5/forecast".to_string()),
            here_api_key: env::var("HERE_API_KEY")
                .map_err(|_| anyhow::anyhow!("HERE_API_KEY not set"))?,
            here_geocode_url: env::var("HERE_GEOCODE_URL")
                .unwrap_or_else(|_| "https://geocode.search.hereapi.com/v1/geocode".to_string()),
            app_timezone: env::var("APP_TIMEZONE")
                .unwrap_or_else(|_| "America/Phoenix".to_string()),
            service_area_file: env::var("SERVICE_AREA_FILE").ok(),
        };

        config
            .app_timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| anyhow::anyhow!("invalid APP_TIMEZONE: {}", config.app_timezone))?;

        Ok(config)
    }

    /// Timezone used for business-hour and calendar-day checks.
    /// `from_env` validates the name, so the fallback only covers a
    /// hand-built `Config`.
    pub fn timezone(&self) -> chrono_tz::Tz {
        self.app_timezone
            .parse()
            .unwrap_or(chrono_tz::America::Phoenix)
    }
}
