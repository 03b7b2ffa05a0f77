use serde::{Deserialize, Serialize};

/// Half-width of the proximity box used for cache lookups, in degrees.
/// 0.01 degrees is roughly 1.1 km, matching the cache bucket precision.
pub const COORD_TOLERANCE_DEG: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// Validate latitude and longitude coordinates
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("Invalid latitude: {}. Must be between -90 and 90", lat));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(format!(
            "Invalid longitude: {}. Must be between -180 and 180",
            lng
        ));
    }
    Ok(())
}

/// Coordinate rounded to centi-degrees, the spatial cache bucket.
pub fn bucket_index(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Spatial key for a coordinate, e.g. `3244_-11122` for (32.44, -111.22).
pub fn bucket_key(lat: f64, lng: f64) -> String {
    format!("{}_{}", bucket_index(lat), bucket_index(lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(0.0, 0.0).is_ok());
        assert!(validate_coordinates(90.0, 180.0).is_ok());
        assert!(validate_coordinates(-90.0, -180.0).is_ok());
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, 181.0).is_err());
    }

    #[test]
    fn test_bucket_key_groups_nearby_coordinates() {
        assert_eq!(bucket_key(32.4364, -111.2224), bucket_key(32.4401, -111.2178));
        assert_ne!(bucket_key(32.4364, -111.2224), bucket_key(32.4364, -110.9747));
    }

    #[test]
    fn test_bucket_key_is_stable() {
        assert_eq!(bucket_key(32.4364, -111.2224), "3244_-11122");
        assert_eq!(bucket_key(0.0, 0.0), "0_0");
    }
}
