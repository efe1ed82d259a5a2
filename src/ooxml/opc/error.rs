/// Error types for OPC package operations
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpcError {
    #[error("Invalid pack URI: {0}")]
    InvalidPackUri(String),

    /// A relationship id was looked up that its owning part does not declare.
    #[error("Unresolved relationship '{r_id}' in {source_part}")]
    UnresolvedRelationship { source_part: String, r_id: String },

    /// A relationship resolved to a partname the store does not contain.
    #[error("Part not found: {0}")]
    MissingPart(String),

    /// The store failed while probing candidate partnames.
    #[error("Cannot allocate a partname for '{pattern}': {source}")]
    NameAllocation {
        pattern: String,
        #[source]
        source: Box<OpcError>,
    },

    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),

    #[error("XML parsing error: {0}")]
    XmlError(String),

    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Quick-XML error: {0}")]
    QuickXmlError(#[from] quick_xml::Error),

    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    #[error("Attribute error: {0}")]
    AttrError(String),
}

impl From<quick_xml::events::attributes::AttrError> for OpcError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        OpcError::AttrError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OpcError>;
