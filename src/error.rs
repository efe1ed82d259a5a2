/// Crate-level error type.
///
/// Package operations surface OPC failures unchanged through
/// [`Error::Opc`]; failures while opening a package are wrapped in
/// [`Error::PackageOpen`] with the path that was being opened.
use crate::ooxml::opc::error::OpcError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for package composition.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The archive could not be opened, or a required manifest part is
    /// missing.
    #[error("Cannot open package {}: {source}", path.display())]
    PackageOpen {
        path: PathBuf,
        #[source]
        source: OpcError,
    },

    /// OPC package error
    #[error("OPC error: {0}")]
    Opc(#[from] OpcError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A part exists but does not have the expected structure
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Options could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn package_open(path: impl Into<PathBuf>, source: OpcError) -> Self {
        Error::PackageOpen {
            path: path.into(),
            source,
        }
    }

    /// The underlying OPC error, if any.
    pub fn opc(&self) -> Option<&OpcError> {
        match self {
            Error::PackageOpen { source, .. } | Error::Opc(source) => Some(source),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Opc(OpcError::from(err))
    }
}
