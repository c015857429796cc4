use crate::error::Geojson2WpmlError;
use crate::waypoints::Waypoint;
use crate::xml_tree::{XmlElement, XmlNode};

type Result<T> = std::result::Result<T, Geojson2WpmlError>;

/// Namespace URI bases recognized on a seed document root. Matching by
/// base keeps the resolver working across WPML vocabulary versions
/// (1.0, 1.0.2, ...).
pub const KML_NS_BASE: &str = "http://www.opengis.net/kml";
pub const WPML_NS_BASE: &str = "http://www.dji.com/wpmz";

/// Prefixes the seed document declares for the KML and WPML vocabularies.
/// `None` means the vocabulary is the default namespace. Lookups always go
/// through this map, so the seed's own prefix choices are preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct Namespaces {
    kml: Option<String>,
    wpml: Option<String>,
}

impl Namespaces {
    /// Extract the prefix map from the root element's xmlns declarations.
    pub fn resolve(root: &XmlElement, document: &'static str) -> Result<Self> {
        let mut kml = None;
        let mut wpml = None;

        for (key, value) in &root.attributes {
            let prefix = if key == "xmlns" {
                None
            } else if let Some(p) = key.strip_prefix("xmlns:") {
                Some(p.to_string())
            } else {
                continue;
            };
            if value.starts_with(KML_NS_BASE) {
                kml = Some(prefix);
            } else if value.starts_with(WPML_NS_BASE) {
                wpml = Some(prefix);
            }
        }

        let kml = kml.ok_or(Geojson2WpmlError::NamespaceResolution {
            document,
            uri_base: KML_NS_BASE,
        })?;
        let wpml = wpml.ok_or(Geojson2WpmlError::NamespaceResolution {
            document,
            uri_base: WPML_NS_BASE,
        })?;

        Ok(Self { kml, wpml })
    }

    /// Qualified name for a KML-vocabulary element.
    pub fn kml(&self, local: &str) -> String {
        qualify(&self.kml, local)
    }

    /// Qualified name for a WPML-vocabulary element.
    pub fn wpml(&self, local: &str) -> String {
        qualify(&self.wpml, local)
    }
}

fn qualify(prefix: &Option<String>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{p}:{local}"),
        None => local.to_string(),
    }
}

/// How sequential waypoint indices are numbered in a document.
#[derive(Debug, Clone, Copy)]
pub enum IndexBase {
    Fixed(i64),
    /// Use whatever base the seed's first record already carries.
    FromSeed,
}

/// Structural conventions of one target document.
#[derive(Debug, Clone)]
pub struct DocFlavor {
    pub label: &'static str,
    /// Altitude is the third component of the coordinate string.
    pub embedded_altitude: bool,
    /// Local name of a separate WPML altitude element, if the flavor uses one.
    pub height_element: Option<&'static str>,
    pub index_base: IndexBase,
}

impl DocFlavor {
    /// Executable route document: 2-D coordinates, separate execute
    /// height, indices always 0-based.
    pub fn waylines() -> Self {
        Self {
            label: "waylines.wpml",
            embedded_altitude: false,
            height_element: Some("executeHeight"),
            index_base: IndexBase::Fixed(0),
        }
    }

    /// Planning/visualization document: 3-D coordinates, index base
    /// inherited from the seed.
    pub fn template() -> Self {
        Self {
            label: "template.kml",
            embedded_altitude: true,
            height_element: None,
            index_base: IndexBase::FromSeed,
        }
    }
}

/// Reconcile the document's waypoint records with the input sequence:
/// grow by deep-cloning the first record, shrink from the tail, then
/// rewrite each record's coordinates, altitude, and sequential index.
///
/// All existing records are validated before any mutation, so a malformed
/// seed never leaves the tree half-rewritten.
pub fn reconcile(
    root: &mut XmlElement,
    ns: &Namespaces,
    waypoints: &[Waypoint],
    flavor: &DocFlavor,
) -> Result<()> {
    let placemark = ns.kml("Placemark");
    let point = ns.kml("Point");
    let coordinates = ns.kml("coordinates");
    let index_name = ns.wpml("index");

    let document = flavor.label;
    let parent = find_record_parent(root, &placemark, &point)
        .ok_or(Geojson2WpmlError::NoTemplateRecord { document })?;
    let positions = record_positions(parent, &placemark, &point);

    // Fail-fast: every existing record must carry its coordinate and
    // index children before we touch anything.
    for (ordinal, &pos) in positions.iter().enumerate() {
        let Some(record) = element_at(parent, pos) else {
            continue;
        };
        if record
            .child(&point)
            .and_then(|p| p.child(&coordinates))
            .is_none()
        {
            return Err(Geojson2WpmlError::MalformedRecord {
                document,
                record: ordinal,
                missing: format!("<{coordinates}>"),
            });
        }
        if record.child(&index_name).is_none() {
            return Err(Geojson2WpmlError::MalformedRecord {
                document,
                record: ordinal,
                missing: format!("<{index_name}>"),
            });
        }
    }

    let first = *positions.first().ok_or(Geojson2WpmlError::NoTemplateRecord { document })?;
    let template = element_at(parent, first)
        .cloned()
        .ok_or(Geojson2WpmlError::NoTemplateRecord { document })?;

    let template_altitude = template_altitude(&template, ns, flavor)?;
    if template_altitude.is_none() && waypoints.iter().any(|w| w.altitude.is_none()) {
        let missing = match flavor.height_element {
            Some(height) => format!("an altitude fallback value in <{}>", ns.wpml(height)),
            None => format!("an altitude component in <{coordinates}>"),
        };
        return Err(Geojson2WpmlError::MalformedRecord {
            document,
            record: 0,
            missing,
        });
    }

    let base = match flavor.index_base {
        IndexBase::Fixed(b) => b,
        IndexBase::FromSeed => {
            let text = template
                .child(&index_name)
                .map(|el| el.text())
                .unwrap_or_default();
            text.parse::<i64>()
                .map_err(|_| Geojson2WpmlError::InvalidRecordValue {
                    document,
                    record: 0,
                    element: index_name.clone(),
                    value: text,
                })?
        }
    };

    // Cardinality: clone the template after the last record, or drop
    // trailing records, until counts match.
    if waypoints.len() > positions.len() {
        let insert_at = positions[positions.len() - 1] + 1;
        for k in 0..waypoints.len() - positions.len() {
            parent
                .children
                .insert(insert_at + k, XmlNode::Element(template.clone()));
        }
    } else if waypoints.len() < positions.len() {
        for &pos in positions[waypoints.len()..].iter().rev() {
            parent.children.remove(pos);
        }
    }

    let positions = record_positions(parent, &placemark, &point);
    for (ordinal, (&pos, waypoint)) in positions.iter().zip(waypoints).enumerate() {
        let Some(record) = element_at_mut(parent, pos) else {
            continue;
        };
        let altitude = waypoint.altitude.or(template_altitude);

        let coord_text = if flavor.embedded_altitude {
            let alt = altitude.ok_or(Geojson2WpmlError::MalformedRecord {
                document,
                record: ordinal,
                missing: format!("an altitude component in <{coordinates}>"),
            })?;
            format!(
                "{:.7},{:.7},{:.7}",
                waypoint.longitude, waypoint.latitude, alt
            )
        } else {
            format!("{:.7},{:.7}", waypoint.longitude, waypoint.latitude)
        };

        record
            .child_mut(&point)
            .and_then(|p| p.child_mut(&coordinates))
            .ok_or(Geojson2WpmlError::MalformedRecord {
                document,
                record: ordinal,
                missing: format!("<{coordinates}>"),
            })?
            .set_text(coord_text);

        if let Some(height) = flavor.height_element {
            let name = ns.wpml(height);
            let alt = altitude.ok_or(Geojson2WpmlError::MalformedRecord {
                document,
                record: ordinal,
                missing: format!("<{name}>"),
            })?;
            match record.child_mut(&name) {
                Some(el) => el.set_text(alt.to_string()),
                None => {
                    let mut el = XmlElement::new(name);
                    el.set_text(alt.to_string());
                    record.push_element(el);
                }
            }
        }

        record
            .child_mut(&index_name)
            .ok_or(Geojson2WpmlError::MalformedRecord {
                document,
                record: ordinal,
                missing: format!("<{index_name}>"),
            })?
            .set_text((base + ordinal as i64).to_string());
    }

    Ok(())
}

/// The flavor's fallback altitude, read from the untouched template record.
fn template_altitude(
    template: &XmlElement,
    ns: &Namespaces,
    flavor: &DocFlavor,
) -> Result<Option<f64>> {
    if let Some(height) = flavor.height_element {
        let name = ns.wpml(height);
        let Some(el) = template.child(&name) else {
            return Ok(None);
        };
        let text = el.text();
        if text.is_empty() {
            return Ok(None);
        }
        return text
            .parse::<f64>()
            .map(Some)
            .map_err(|_| Geojson2WpmlError::InvalidRecordValue {
                document: flavor.label,
                record: 0,
                element: name,
                value: text,
            });
    }

    let coordinates = ns.kml("coordinates");
    let coord_text = template
        .child(&ns.kml("Point"))
        .and_then(|p| p.child(&coordinates))
        .map(|el| el.text())
        .unwrap_or_default();
    let Some(component) = coord_text.split(',').nth(2) else {
        return Ok(None);
    };
    component
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|_| Geojson2WpmlError::InvalidRecordValue {
            document: flavor.label,
            record: 0,
            element: coordinates,
            value: coord_text,
        })
}

fn is_record(node: &XmlNode, placemark: &str, point: &str) -> bool {
    matches!(node, XmlNode::Element(el) if el.name == placemark && el.child(point).is_some())
}

/// Positions of waypoint records among the parent's children.
fn record_positions(parent: &XmlElement, placemark: &str, point: &str) -> Vec<usize> {
    parent
        .children
        .iter()
        .enumerate()
        .filter(|(_, node)| is_record(node, placemark, point))
        .map(|(pos, _)| pos)
        .collect()
}

fn element_at(parent: &XmlElement, pos: usize) -> Option<&XmlElement> {
    match parent.children.get(pos) {
        Some(XmlNode::Element(el)) => Some(el),
        _ => None,
    }
}

fn element_at_mut(parent: &mut XmlElement, pos: usize) -> Option<&mut XmlElement> {
    match parent.children.get_mut(pos) {
        Some(XmlNode::Element(el)) => Some(el),
        _ => None,
    }
}

/// First element (depth-first) that directly holds waypoint records.
fn find_record_parent<'a>(
    el: &'a mut XmlElement,
    placemark: &str,
    point: &str,
) -> Option<&'a mut XmlElement> {
    if el
        .children
        .iter()
        .any(|node| is_record(node, placemark, point))
    {
        return Some(el);
    }
    for node in el.children.iter_mut() {
        if let XmlNode::Element(child) = node {
            if let Some(found) = find_record_parent(child, placemark, point) {
                return Some(found);
            }
        }
    }
    None
}
