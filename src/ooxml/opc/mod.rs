/// Open Packaging Conventions (OPC) layer.
///
/// Models a package as a set of named parts connected by relationships:
///
/// - Partnames and relative references ([`PackURI`])
/// - Relationship tables ([`Relationships`])
/// - Typed parts over an owned XML tree ([`XmlPart`], [`BlobPart`])
/// - The content-type manifest ([`ContentTypeRegistry`])
/// - Byte stores backed by memory or a zip working copy ([`ArchiveStore`])
/// - Fresh partname allocation ([`naming::allocate`])

pub mod constants;
pub mod content_types;
pub mod error;
pub mod naming;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod rel;
pub mod xml;

// Re-export commonly used types
pub use content_types::ContentTypeRegistry;
pub use error::OpcError;
pub use package::PackageSnapshot;
pub use packuri::PackURI;
pub use part::{BlobPart, Part, PartFactory, Resource, XmlPart};
pub use phys_pkg::{ArchiveStore, MemoryStore, ZipStore};
pub use rel::{Relationship, Relationships};
pub use xml::{XmlDocument, XmlElement, XmlNode};
