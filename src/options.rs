use serde::Deserialize;

/// Options for GeoJSON to WPML mission conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Fixed altitude in meters applied to every waypoint, overriding any
    /// per-point altitude source (default: none)
    #[serde(default)]
    pub altitude_override: Option<f64>,

    /// Feature property holding the per-point altitude in meters
    /// (default: "alt_m")
    #[serde(default = "default_altitude_property")]
    pub altitude_property: String,

    /// Minimum number of point features required for a mission (default: 2)
    #[serde(default = "default_min_points")]
    pub min_points: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            altitude_override: None,
            altitude_property: default_altitude_property(),
            min_points: default_min_points(),
        }
    }
}

fn default_altitude_property() -> String {
    "alt_m".to_string()
}

fn default_min_points() -> usize {
    2
}
