//! State boundary loading from GeoJSON.
//!
//! Only `Polygon` and `MultiPolygon` geometries are read. Every feature is
//! kept for the land fill and outlines; features whose name belongs to no
//! region are simply left unfilled.

use std::path::Path;

use flowmap_core::error::{FlowMapError, Result};
use flowmap_core::models::Region;
use flowmap_core::regions::region_of_state;
use geo::{LineString, MultiPolygon, Polygon};
use serde_json::Value;
use tracing::{debug, info};

/// Properties checked, in order, for a feature's state name.
const NAME_PROPERTIES: [&str; 3] = ["STATE_NAME", "name", "NAME"];

/// A named boundary and the region it fills, if any.
///
/// Coordinates are `(lon, lat)` degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub name: String,
    pub region: Option<Region>,
    pub geometry: MultiPolygon<f64>,
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Read a GeoJSON `FeatureCollection` from disk.
pub fn load_boundaries(path: &Path) -> Result<Vec<Boundary>> {
    let text = std::fs::read_to_string(path).map_err(|e| FlowMapError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let boundaries = parse_boundaries(&text, path)?;
    let filled = boundaries.iter().filter(|b| b.region.is_some()).count();
    info!(
        "Loaded {} boundaries from {} ({} inside the modelled regions)",
        boundaries.len(),
        path.display(),
        filled
    );
    Ok(boundaries)
}

/// Parse GeoJSON text; `source` only labels errors.
pub fn parse_boundaries(text: &str, source: &Path) -> Result<Vec<Boundary>> {
    let document: Value = serde_json::from_str(text)?;
    let parse_error = |message: &str| FlowMapError::Parse {
        path: source.to_path_buf(),
        message: message.to_string(),
    };

    if document.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(parse_error("expected a GeoJSON FeatureCollection"));
    }
    let features = document
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| parse_error("FeatureCollection has no features array"))?;

    let mut boundaries = Vec::with_capacity(features.len());
    for (index, feature) in features.iter().enumerate() {
        let name = feature_name(feature).unwrap_or_default();
        let geometry = match feature.get("geometry").map(read_geometry) {
            Some(Some(geometry)) if !geometry.0.is_empty() => geometry,
            _ => {
                debug!("Skipping feature {} ({:?}): no polygon geometry", index, name);
                continue;
            }
        };
        let region = region_of_state(&name);
        if region.is_none() {
            debug!("Boundary {:?} is outside the modelled regions", name);
        }
        boundaries.push(Boundary {
            name,
            region,
            geometry,
        });
    }
    Ok(boundaries)
}

fn feature_name(feature: &Value) -> Option<String> {
    let properties = feature.get("properties")?;
    NAME_PROPERTIES
        .iter()
        .find_map(|key| properties.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn read_geometry(geometry: &Value) -> Option<MultiPolygon<f64>> {
    let coordinates = geometry.get("coordinates")?;
    match geometry.get("type")?.as_str()? {
        "Polygon" => read_polygon(coordinates).map(|p| MultiPolygon::new(vec![p])),
        "MultiPolygon" => coordinates
            .as_array()?
            .iter()
            .map(read_polygon)
            .collect::<Option<Vec<_>>>()
            .map(MultiPolygon::new),
        _ => None,
    }
}

fn read_polygon(value: &Value) -> Option<Polygon<f64>> {
    let mut rings = value.as_array()?.iter().map(read_ring);
    let exterior = rings.next()??;
    let holes = rings.collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(exterior, holes))
}

fn read_ring(value: &Value) -> Option<LineString<f64>> {
    value
        .as_array()?
        .iter()
        .map(|position| {
            let position = position.as_array()?;
            Some((position.first()?.as_f64()?, position.get(1)?.as_f64()?))
        })
        .collect::<Option<Vec<_>>>()
        .map(LineString::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Contains, Point};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"STATE_NAME": "Georgia"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-85.0, 31.0], [-81.0, 31.0], [-81.0, 35.0], [-85.0, 35.0], [-85.0, 31.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"name": "Michigan"},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[-87.0, 42.0], [-83.0, 42.0], [-84.0, 46.0], [-87.0, 42.0]]],
                        [[[-90.0, 46.0], [-85.0, 46.0], [-85.0, 47.0], [-90.0, 46.0]],
                         [[-88.0, 46.2], [-87.0, 46.2], [-87.0, 46.5], [-88.0, 46.2]]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": {"NAME": "Texas"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-100.0, 28.0], [-94.0, 28.0], [-94.0, 34.0], [-100.0, 28.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"STATE_NAME": "Ohio"},
                "geometry": {"type": "Point", "coordinates": [-82.0, 40.0]}
            }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let boundaries = parse_boundaries(SAMPLE, Path::new("states.json")).unwrap();
        assert_eq!(boundaries.len(), 3);

        assert_eq!(boundaries[0].name, "Georgia");
        assert_eq!(boundaries[0].region, region_of_state("Georgia"));
        assert!(boundaries[0].region.is_some());
        assert_eq!(boundaries[0].geometry.0.len(), 1);
        assert_eq!(boundaries[0].geometry.0[0].exterior().0.len(), 5);

        assert_eq!(boundaries[1].name, "Michigan");
        assert_eq!(boundaries[1].geometry.0.len(), 2);
    }

    #[test]
    fn test_holes_are_kept() {
        let boundaries = parse_boundaries(SAMPLE, Path::new("states.json")).unwrap();
        let michigan = &boundaries[1].geometry;
        assert!(michigan.0[0].interiors().is_empty());
        assert_eq!(michigan.0[1].interiors().len(), 1);

        // The hole is outside the land area.
        assert!(!michigan.contains(&Point::new(-87.5, 46.3)));
        assert!(michigan.contains(&Point::new(-86.0, 46.1)));
    }

    #[test]
    fn test_unknown_state_is_kept_unfilled() {
        let boundaries = parse_boundaries(SAMPLE, Path::new("states.json")).unwrap();
        let texas = boundaries.iter().find(|b| b.name == "Texas").unwrap();
        assert_eq!(texas.region, None);
    }

    #[test]
    fn test_not_a_feature_collection() {
        let err = parse_boundaries(r#"{"type": "Feature"}"#, Path::new("x.json")).unwrap_err();
        assert!(matches!(err, FlowMapError::Parse { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_boundaries("{not json", Path::new("x.json")).unwrap_err();
        assert!(matches!(err, FlowMapError::JsonParse(_)));
    }

    #[test]
    fn test_malformed_coordinates_skip_feature() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"properties": {"STATE_NAME": "Ohio"},
             "geometry": {"type": "Polygon", "coordinates": [[["a", 1.0]]]}}
        ]}"#;
        let boundaries = parse_boundaries(text, Path::new("x.json")).unwrap();
        assert!(boundaries.is_empty());
    }

    #[test]
    fn test_load_boundaries_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let boundaries = load_boundaries(file.path()).unwrap();
        assert_eq!(boundaries.len(), 3);
    }

    #[test]
    fn test_load_boundaries_missing_file() {
        let err = load_boundaries(Path::new("/nonexistent/states.json")).unwrap_err();
        assert!(matches!(err, FlowMapError::FileRead { .. }));
    }
}
