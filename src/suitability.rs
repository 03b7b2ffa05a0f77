use crate::forecast::types::WeatherRecord;

// Workability thresholds for outdoor installation crews. Tunable without
// touching the predicate.
pub const MIN_WORKABLE_TEMP_F: i32 = 40;
pub const MAX_WORKABLE_TEMP_F: i32 = 95;
pub const MAX_PRECIPITATION_PCT: i32 = 30;
pub const MAX_WIND_MPH: i32 = 20;

/// Whether conditions allow scheduling an installation. Pure predicate
/// over a single forecast record.
pub fn is_suitable_for_installation(weather: &WeatherRecord) -> bool {
    weather.temperature >= MIN_WORKABLE_TEMP_F
        && weather.temperature <= MAX_WORKABLE_TEMP_F
        && weather.precipitation < MAX_PRECIPITATION_PCT
        && weather.wind_speed < MAX_WIND_MPH
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(temperature: i32, precipitation: i32, wind_speed: i32) -> WeatherRecord {
        WeatherRecord {
            temperature,
            conditions: "Clear".to_string(),
            precipitation,
            wind_speed,
            forecast_time: Utc::now(),
        }
    }

    #[test]
    fn test_mild_conditions_are_suitable() {
        assert!(is_suitable_for_installation(&record(50, 10, 5)));
    }

    #[test]
    fn test_too_hot_is_unsuitable() {
        assert!(!is_suitable_for_installation(&record(96, 10, 5)));
    }

    #[test]
    fn test_rain_threshold_is_exclusive() {
        assert!(!is_suitable_for_installation(&record(70, 30, 5)));
        assert!(is_suitable_for_installation(&record(70, 29, 5)));
    }

    #[test]
    fn test_wind_threshold_is_exclusive() {
        assert!(!is_suitable_for_installation(&record(70, 0, 20)));
        assert!(is_suitable_for_installation(&record(70, 0, 19)));
    }

    #[test]
    fn test_temperature_bounds_are_inclusive() {
        assert!(is_suitable_for_installation(&record(40, 0, 0)));
        assert!(is_suitable_for_installation(&record(95, 0, 0)));
        assert!(!is_suitable_for_installation(&record(39, 0, 0)));
    }
}
