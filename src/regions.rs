use geo::{Contains, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::location::Coordinate;

/// Service-area tag attached to a job location when its address is
/// geocoded. `OutOfTown` is the fallback and is never backed by a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionTag {
    Marana,
    InTown,
    Catalina,
    Vail,
    OroValley,
    OutOfTown,
}

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("failed to read service area file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid service area data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("region {0:?} has fewer than 3 distinct vertices")]
    DegenerateRing(RegionTag),
    #[error("out-of-town is the fallback tag and cannot carry a polygon")]
    ReservedFallbackTag,
}

/// On-disk shape of one service area. Ring vertices are `[lng, lat]`
/// (GeoJSON axis order); the ring is implicitly closed.
#[derive(Debug, Deserialize)]
struct RegionDef {
    tag: RegionTag,
    ring: Vec<[f64; 2]>,
}

struct Region {
    tag: RegionTag,
    boundary: Polygon<f64>,
}

/// Ordered list of service-area polygons. Declaration order is the
/// classification priority: the first polygon containing a point wins,
/// regardless of area or distance to center.
pub struct ServiceAreas {
    regions: Vec<Region>,
}

const BUNDLED_AREAS: &str = include_str!("../data/service_areas.json");

impl ServiceAreas {
    /// Service areas shipped with the binary, used when no override file
    /// is configured.
    pub fn bundled() -> Self {
        Self::from_json(BUNDLED_AREAS).expect("bundled service area data is valid")
    }

    pub fn from_file(path: &str) -> Result<Self, RegionError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, RegionError> {
        let defs: Vec<RegionDef> = serde_json::from_str(json)?;

        let mut regions = Vec::with_capacity(defs.len());
        for def in defs {
            if def.tag == RegionTag::OutOfTown {
                return Err(RegionError::ReservedFallbackTag);
            }

            let mut distinct: Vec<[f64; 2]> = Vec::new();
            for vertex in &def.ring {
                if !distinct.contains(vertex) {
                    distinct.push(*vertex);
                }
            }
            if distinct.len() < 3 {
                return Err(RegionError::DegenerateRing(def.tag));
            }

            let exterior: Vec<(f64, f64)> =
                def.ring.iter().map(|[lng, lat]| (*lng, *lat)).collect();
            regions.push(Region {
                tag: def.tag,
                boundary: Polygon::new(LineString::from(exterior), vec![]),
            });
        }

        Ok(Self { regions })
    }

    /// Classify a coordinate against the service areas. Total: any point
    /// outside every polygon is `OutOfTown`.
    pub fn classify(&self, coordinate: Coordinate) -> RegionTag {
        let point = Point::new(coordinate.lng, coordinate.lat);
        self.regions
            .iter()
            .find(|region| region.boundary.contains(&point))
            .map(|region| region.tag)
            .unwrap_or(RegionTag::OutOfTown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn areas() -> ServiceAreas {
        ServiceAreas::bundled()
    }

    #[test]
    fn test_marana_center_classifies_as_marana() {
        let tag = areas().classify(Coordinate {
            lat: 32.4364,
            lng: -111.2224,
        });
        assert_eq!(tag, RegionTag::Marana);
    }

    #[test]
    fn test_tucson_center_classifies_as_in_town() {
        let tag = areas().classify(Coordinate {
            lat: 32.2226,
            lng: -110.9747,
        });
        assert_eq!(tag, RegionTag::InTown);
    }

    #[test]
    fn test_far_away_point_is_out_of_town() {
        let tag = areas().classify(Coordinate { lat: 0.0, lng: 0.0 });
        assert_eq!(tag, RegionTag::OutOfTown);
    }

    #[test]
    fn test_overlapping_regions_resolve_by_declaration_order() {
        // Two unit squares sharing the region 0..1, with a point inside both.
        let json = r#"[
            {"tag": "marana", "ring": [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]},
            {"tag": "in-town", "ring": [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0], [-1.0, -1.0]]}
        ]"#;
        let areas = ServiceAreas::from_json(json).unwrap();
        let shared = Coordinate { lat: 0.5, lng: 0.5 };

        for _ in 0..10 {
            assert_eq!(areas.classify(shared), RegionTag::Marana);
        }
    }

    #[test]
    fn test_non_convex_ring_is_supported() {
        // Vail's boundary has 8 vertices and a concave notch.
        let tag = areas().classify(Coordinate {
            lat: 32.0,
            lng: -110.69,
        });
        assert_eq!(tag, RegionTag::Vail);
    }

    #[test]
    fn test_degenerate_ring_is_rejected() {
        let json = r#"[{"tag": "vail", "ring": [[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]}]"#;
        assert!(matches!(
            ServiceAreas::from_json(json),
            Err(RegionError::DegenerateRing(RegionTag::Vail))
        ));
    }

    #[test]
    fn test_fallback_tag_cannot_have_a_polygon() {
        let json = r#"[{"tag": "out-of-town", "ring": [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]}]"#;
        assert!(matches!(
            ServiceAreas::from_json(json),
            Err(RegionError::ReservedFallbackTag)
        ));
    }
}
