use serde::Serialize;

use crate::error::Geojson2WpmlError;
use crate::kmz;
use crate::options::ConvertOptions;
use crate::reconcile::{self, DocFlavor, Namespaces};
use crate::waypoints;
use crate::xml_tree;

type Result<T> = std::result::Result<T, Geojson2WpmlError>;

/// Human-readable summary of one conversion run.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReport {
    /// Waypoint record count in both output documents.
    pub waypoint_count: usize,
    /// Labels of the documents rewritten inside the archive.
    pub updated_documents: Vec<String>,
    /// Input points that carried no altitude and fell back to the seed
    /// template's value.
    pub altitude_fallbacks: usize,
}

/// Successful conversion output.
#[derive(Debug)]
pub struct Conversion {
    pub kmz: Vec<u8>,
    pub report: ConversionReport,
}

/// Run the whole pipeline: open the seed archive, extract waypoints from
/// the GeoJSON text, reconcile both mission documents, and repack.
///
/// Stateless and allocation-scoped to this call; the archive is only
/// written after both documents reconciled, so a failure never produces
/// partial output.
pub fn convert(seed_kmz: &[u8], geojson: &str, opts: &ConvertOptions) -> Result<Conversion> {
    let seed = kmz::read_seed(seed_kmz)?;
    let points = waypoints::extract_waypoints(geojson, opts)?;

    let waylines_flavor = DocFlavor::waylines();
    let mut waylines_root = xml_tree::parse_document(&seed.waylines_text)?;
    let waylines_ns = Namespaces::resolve(&waylines_root, waylines_flavor.label)?;
    reconcile::reconcile(&mut waylines_root, &waylines_ns, &points, &waylines_flavor)?;

    let template_flavor = DocFlavor::template();
    let mut template_root = xml_tree::parse_document(&seed.template_text)?;
    let template_ns = Namespaces::resolve(&template_root, template_flavor.label)?;
    reconcile::reconcile(&mut template_root, &template_ns, &points, &template_flavor)?;

    let waylines_out = xml_tree::serialize_document(&waylines_root)?;
    let template_out = xml_tree::serialize_document(&template_root)?;
    let bytes = kmz::write_kmz(&seed, &waylines_out, &template_out)?;

    let report = ConversionReport {
        waypoint_count: points.len(),
        updated_documents: vec![
            waylines_flavor.label.to_string(),
            template_flavor.label.to_string(),
        ],
        altitude_fallbacks: points.iter().filter(|p| p.altitude.is_none()).count(),
    };

    Ok(Conversion { kmz: bytes, report })
}
