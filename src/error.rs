use wasm_bindgen::JsValue;

#[derive(Debug)]
pub enum Geojson2WpmlError {
    /// Seed archive is not a readable ZIP container.
    Zip(zip::result::ZipError),
    Io(std::io::Error),
    /// Seed archive has no entry whose name ends with the given suffix.
    MissingEntry { suffix: &'static str },
    Utf8 {
        entry: String,
        source: std::str::Utf8Error,
    },
    XmlParse(quick_xml::Error),
    /// Document parsed to completion without yielding a root element.
    EmptyXmlDocument,
    GeoJson(geojson::Error),
    /// Point collection parsed but contains no Point-type features.
    NoPointFeatures,
    InsufficientPoints {
        found: usize,
        required: usize,
    },
    InvalidCoordinate {
        feature: usize,
        longitude: f64,
        latitude: f64,
    },
    /// Document root declares no recognizable KML or WPML namespace.
    NamespaceResolution {
        document: &'static str,
        uri_base: &'static str,
    },
    /// Document has no waypoint record to use as a clone template.
    NoTemplateRecord { document: &'static str },
    /// An existing waypoint record lacks an expected child element.
    MalformedRecord {
        document: &'static str,
        record: usize,
        missing: String,
    },
    /// An existing record's numeric text could not be parsed.
    InvalidRecordValue {
        document: &'static str,
        record: usize,
        element: String,
        value: String,
    },
}

impl std::fmt::Display for Geojson2WpmlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zip(e) => write!(f, "Seed KMZ read/write error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::MissingEntry { suffix } => {
                write!(f, "Seed KMZ has no entry ending with '{suffix}'")
            }
            Self::Utf8 { entry, source } => {
                write!(f, "Entry '{entry}' is not valid UTF-8: {source}")
            }
            Self::XmlParse(e) => write!(f, "XML parse error: {e}"),
            Self::EmptyXmlDocument => write!(f, "XML document has no root element"),
            Self::GeoJson(e) => write!(f, "GeoJSON parse error: {e}"),
            Self::NoPointFeatures => {
                write!(f, "Point collection contains no Point-type features")
            }
            Self::InsufficientPoints { found, required } => write!(
                f,
                "Need at least {required} point features, found {found}"
            ),
            Self::InvalidCoordinate {
                feature,
                longitude,
                latitude,
            } => write!(
                f,
                "Point feature {feature} is out of range: lon {longitude}, lat {latitude}"
            ),
            Self::NamespaceResolution { document, uri_base } => write!(
                f,
                "{document}: root declares no namespace under {uri_base}"
            ),
            Self::NoTemplateRecord { document } => write!(
                f,
                "{document}: no existing waypoint record to clone as template"
            ),
            Self::MalformedRecord {
                document,
                record,
                missing,
            } => write!(
                f,
                "{document}: waypoint record {record} is missing {missing}"
            ),
            Self::InvalidRecordValue {
                document,
                record,
                element,
                value,
            } => write!(
                f,
                "{document}: waypoint record {record} has invalid <{element}> value '{value}'"
            ),
        }
    }
}

impl std::error::Error for Geojson2WpmlError {}

impl From<zip::result::ZipError> for Geojson2WpmlError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Zip(e)
    }
}

impl From<std::io::Error> for Geojson2WpmlError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<quick_xml::Error> for Geojson2WpmlError {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlParse(e)
    }
}

impl From<geojson::Error> for Geojson2WpmlError {
    fn from(e: geojson::Error) -> Self {
        Self::GeoJson(e)
    }
}

impl From<Geojson2WpmlError> for JsValue {
    fn from(e: Geojson2WpmlError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
