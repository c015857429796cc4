use geojson::{Feature, GeoJson, Value};

use crate::error::Geojson2WpmlError;
use crate::options::ConvertOptions;

type Result<T> = std::result::Result<T, Geojson2WpmlError>;

/// One normalized flight stop, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub longitude: f64,
    pub latitude: f64,
    /// Meters relative to the seed mission's take-off reference.
    /// `None` means the document reconciler falls back to the seed
    /// template's own altitude.
    pub altitude: Option<f64>,
}

/// Extract the ordered waypoint sequence from a GeoJSON document.
///
/// Non-point features are skipped; altitude for each point resolves as
/// override > designated feature property > geometry third coordinate >
/// none.
pub fn extract_waypoints(geojson_text: &str, opts: &ConvertOptions) -> Result<Vec<Waypoint>> {
    let features = collect_features(geojson_text.parse::<GeoJson>()?);

    let mut waypoints = Vec::new();
    for feature in &features {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        let Value::Point(coords) = &geometry.value else {
            continue;
        };
        if coords.len() < 2 {
            continue;
        }

        let longitude = coords[0];
        let latitude = coords[1];
        if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
            return Err(Geojson2WpmlError::InvalidCoordinate {
                feature: waypoints.len(),
                longitude,
                latitude,
            });
        }

        let altitude = opts
            .altitude_override
            .or_else(|| property_altitude(feature, &opts.altitude_property))
            .or_else(|| coords.get(2).copied());

        waypoints.push(Waypoint {
            longitude,
            latitude,
            altitude,
        });
    }

    if waypoints.is_empty() {
        return Err(Geojson2WpmlError::NoPointFeatures);
    }
    if waypoints.len() < opts.min_points {
        return Err(Geojson2WpmlError::InsufficientPoints {
            found: waypoints.len(),
            required: opts.min_points,
        });
    }

    Ok(waypoints)
}

/// Flatten any top-level GeoJSON shape into a feature list.
fn collect_features(gj: GeoJson) -> Vec<Feature> {
    match gj {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![Feature {
            bbox: None,
            geometry: Some(g),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    }
}

fn property_altitude(feature: &Feature, property: &str) -> Option<f64> {
    feature
        .properties
        .as_ref()
        .and_then(|props| props.get(property))
        .and_then(|v| v.as_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(geojson: &str) -> Result<Vec<Waypoint>> {
        extract_waypoints(geojson, &ConvertOptions::default())
    }

    #[test]
    fn test_point_collection() {
        let gj = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[139.65,35.67]},"properties":{}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[139.66,35.68]},"properties":{}}
        ]}"#;
        let wps = extract(gj).unwrap();
        assert_eq!(wps.len(), 2);
        assert!((wps[0].longitude - 139.65).abs() < 1e-10);
        assert!((wps[0].latitude - 35.67).abs() < 1e-10);
        assert_eq!(wps[0].altitude, None);
    }

    #[test]
    fn test_order_preserved() {
        let gj = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[1.0,1.0]},"properties":{}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[2.0,2.0]},"properties":{}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[3.0,3.0]},"properties":{}}
        ]}"#;
        let wps = extract(gj).unwrap();
        let lons: Vec<f64> = wps.iter().map(|w| w.longitude).collect();
        assert_eq!(lons, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_non_point_features_skipped() {
        let gj = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[1.0,1.0]},"properties":{}},
            {"type":"Feature","geometry":{"type":"LineString","coordinates":[[1.0,1.0],[2.0,2.0]]},"properties":{}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[2.0,2.0]},"properties":{}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[3.0,3.0]},"properties":{}}
        ]}"#;
        let wps = extract(gj).unwrap();
        assert_eq!(wps.len(), 3);
    }

    #[test]
    fn test_altitude_from_property() {
        let gj = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[1.0,1.0]},"properties":{"alt_m":45.5}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[2.0,2.0]},"properties":{}}
        ]}"#;
        let wps = extract(gj).unwrap();
        assert_eq!(wps[0].altitude, Some(45.5));
        assert_eq!(wps[1].altitude, None);
    }

    #[test]
    fn test_altitude_from_third_coordinate() {
        let gj = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[1.0,1.0,80.0]},"properties":{}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[2.0,2.0]},"properties":{}}
        ]}"#;
        let wps = extract(gj).unwrap();
        assert_eq!(wps[0].altitude, Some(80.0));
    }

    #[test]
    fn test_property_beats_third_coordinate() {
        let gj = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[1.0,1.0,80.0]},"properties":{"alt_m":45.0}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[2.0,2.0]},"properties":{}}
        ]}"#;
        let wps = extract(gj).unwrap();
        assert_eq!(wps[0].altitude, Some(45.0));
    }

    #[test]
    fn test_override_beats_everything() {
        let gj = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[1.0,1.0,80.0]},"properties":{"alt_m":45.0}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[2.0,2.0]},"properties":{}}
        ]}"#;
        let opts = ConvertOptions {
            altitude_override: Some(120.0),
            ..Default::default()
        };
        let wps = extract_waypoints(gj, &opts).unwrap();
        assert_eq!(wps[0].altitude, Some(120.0));
        assert_eq!(wps[1].altitude, Some(120.0));
    }

    #[test]
    fn test_custom_altitude_property() {
        let gj = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[1.0,1.0]},"properties":{"elevation":17.0}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[2.0,2.0]},"properties":{}}
        ]}"#;
        let opts = ConvertOptions {
            altitude_property: "elevation".to_string(),
            ..Default::default()
        };
        let wps = extract_waypoints(gj, &opts).unwrap();
        assert_eq!(wps[0].altitude, Some(17.0));
    }

    #[test]
    fn test_no_points_at_all() {
        let gj = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"LineString","coordinates":[[1.0,1.0],[2.0,2.0]]},"properties":{}}
        ]}"#;
        assert!(matches!(
            extract(gj),
            Err(Geojson2WpmlError::NoPointFeatures)
        ));
    }

    #[test]
    fn test_single_point_insufficient() {
        let gj = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[1.0,1.0]},"properties":{}}
        ]}"#;
        assert!(matches!(
            extract(gj),
            Err(Geojson2WpmlError::InsufficientPoints {
                found: 1,
                required: 2
            })
        ));
    }

    #[test]
    fn test_min_points_configurable() {
        let gj = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[1.0,1.0]},"properties":{}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[2.0,2.0]},"properties":{}}
        ]}"#;
        let opts = ConvertOptions {
            min_points: 3,
            ..Default::default()
        };
        assert!(matches!(
            extract_waypoints(gj, &opts),
            Err(Geojson2WpmlError::InsufficientPoints {
                found: 2,
                required: 3
            })
        ));
    }

    #[test]
    fn test_out_of_range_coordinate() {
        let gj = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[181.0,1.0]},"properties":{}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[2.0,2.0]},"properties":{}}
        ]}"#;
        assert!(matches!(
            extract(gj),
            Err(Geojson2WpmlError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            extract("{not geojson"),
            Err(Geojson2WpmlError::GeoJson(_))
        ));
    }

    #[test]
    fn test_non_numeric_property_ignored() {
        let gj = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[1.0,1.0]},"properties":{"alt_m":"high"}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[2.0,2.0]},"properties":{}}
        ]}"#;
        let wps = extract(gj).unwrap();
        assert_eq!(wps[0].altitude, None);
    }
}
