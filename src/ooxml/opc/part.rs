/// Package parts: the nodes of the resource graph.
///
/// A part has a partname, an optional content type, a body (parsed XML or
/// opaque bytes) and the relationship table read from its `.rels` sidecar.
/// Parts never touch the content-type manifest; only the package does.
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::phys_pkg::ArchiveStore;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::opc::xml::XmlDocument;
use bytes::Bytes;
use std::collections::BTreeSet;

/// Trait representing a part in an OPC package.
pub trait Part {
    fn partname(&self) -> &PackURI;

    /// Content type the source manifest resolved for this part, if any.
    fn content_type(&self) -> Option<&str>;

    /// Serialized body.
    fn blob(&self) -> Bytes;

    fn rels(&self) -> &Relationships;

    fn rels_mut(&mut self) -> &mut Relationships;

    fn set_partname(&mut self, partname: PackURI);

    /// Change the filename, keeping the directory.
    ///
    /// Only meaningful on a detached copy: relationships elsewhere that
    /// point at the old name are not rewritten.
    fn rename(&mut self, filename: &str) -> Result<()> {
        let renamed = self.partname().with_filename(filename)?;
        self.set_partname(renamed);
        Ok(())
    }

    /// Partname pattern used to allocate a name for a copy of this part.
    fn pattern(&self) -> String {
        self.partname().pattern()
    }

    /// Register a relationship to `target` and return its fresh id.
    ///
    /// Call this before writing any content that references the id.
    fn relate_to(&mut self, target: &PackURI, reltype: &str) -> String {
        self.rels_mut().add(reltype, target)
    }

    /// Absolute partname a relationship id points at.
    fn target_partname(&self, r_id: &str) -> Result<PackURI> {
        self.rels()
            .get(r_id)
            .ok_or_else(|| OpcError::UnresolvedRelationship {
                source_part: self.partname().to_string(),
                r_id: r_id.to_string(),
            })?
            .target_partname()
    }

    /// Write the body and, when non-empty, the relationship part.
    fn save(&self, store: &mut dyn ArchiveStore) -> Result<()> {
        store.write(self.partname(), self.blob())?;
        self.save_rels(store)
    }

    /// Write only the relationship part, skipped when the table is empty.
    fn save_rels(&self, store: &mut dyn ArchiveStore) -> Result<()> {
        if !self.rels().is_empty() {
            let rels_uri = self.partname().rels_uri()?;
            store.write(&rels_uri, Bytes::from(self.rels().to_xml()))?;
        }
        Ok(())
    }
}

/// Read the relationship table of `partname`, empty when it has no `.rels`.
fn load_rels(store: &dyn ArchiveStore, partname: &PackURI) -> Result<Relationships> {
    let rels_uri = partname.rels_uri()?;
    if store.exists(&rels_uri)? {
        let xml = store.read(&rels_uri)?;
        Relationships::from_xml(partname.base_uri().to_string(), &xml)
    } else {
        Ok(Relationships::new(partname.base_uri().to_string()))
    }
}

/// A part with opaque binary content (images, embedded workbooks, media).
#[derive(Debug, Clone)]
pub struct BlobPart {
    partname: PackURI,
    content_type: Option<String>,
    blob: Bytes,
    rels: Relationships,
}

impl BlobPart {
    pub fn new(partname: PackURI, content_type: Option<String>, blob: Bytes) -> Self {
        let rels = Relationships::new(partname.base_uri().to_string());
        Self {
            partname,
            content_type,
            blob,
            rels,
        }
    }

    pub fn load(
        store: &dyn ArchiveStore,
        partname: PackURI,
        content_type: Option<String>,
    ) -> Result<Self> {
        let blob = store.read(&partname)?;
        let rels = load_rels(store, &partname)?;
        Ok(Self {
            partname,
            content_type,
            blob,
            rels,
        })
    }
}

impl Part for BlobPart {
    fn partname(&self) -> &PackURI {
        &self.partname
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn blob(&self) -> Bytes {
        self.blob.clone()
    }

    fn rels(&self) -> &Relationships {
        &self.rels
    }

    fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    fn set_partname(&mut self, partname: PackURI) {
        self.rels.set_base_uri(partname.base_uri());
        self.partname = partname;
    }
}

/// A part whose content is an owned, mutable XML tree.
#[derive(Debug, Clone)]
pub struct XmlPart {
    partname: PackURI,
    content_type: Option<String>,
    document: XmlDocument,
    rels: Relationships,
}

impl XmlPart {
    pub fn new(partname: PackURI, content_type: Option<String>, document: XmlDocument) -> Self {
        let rels = Relationships::new(partname.base_uri().to_string());
        Self {
            partname,
            content_type,
            document,
            rels,
        }
    }

    /// Parse the part at `partname` and its relationship table.
    pub fn load(
        store: &dyn ArchiveStore,
        partname: PackURI,
        content_type: Option<String>,
    ) -> Result<Self> {
        let xml = store.read(&partname)?;
        let document = XmlDocument::parse(&xml).map_err(|e| {
            OpcError::XmlError(format!("{}: {}", partname, e))
        })?;
        let rels = load_rels(store, &partname)?;
        Ok(Self {
            partname,
            content_type,
            document,
            rels,
        })
    }

    #[inline]
    pub fn document(&self) -> &XmlDocument {
        &self.document
    }

    #[inline]
    pub fn document_mut(&mut self) -> &mut XmlDocument {
        &mut self.document
    }

    /// Prefix bound to the office relationships namespace on the root
    /// element, usually `r`.
    pub fn rels_prefix(&self) -> Option<&str> {
        self.document
            .root()
            .attributes()
            .find(|(_, value)| *value == namespace::OFC_RELATIONSHIPS)
            .and_then(|(key, _)| key.strip_prefix("xmlns:"))
    }

    /// Relationship ids referenced by attributes in the relationships
    /// namespace (`r:id`, `r:embed`, `r:link`, ...).
    pub fn referenced_r_ids(&self) -> BTreeSet<String> {
        let Some(prefix) = self.rels_prefix() else {
            return BTreeSet::new();
        };
        let root = self.document.root();
        std::iter::once(root)
            .chain(root.descendants())
            .flat_map(|el| el.attributes())
            .filter(|(key, _)| key.split_once(':').is_some_and(|(p, _)| p == prefix))
            .map(|(_, value)| value.to_string())
            .collect()
    }
}

impl Part for XmlPart {
    fn partname(&self) -> &PackURI {
        &self.partname
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn blob(&self) -> Bytes {
        Bytes::from(self.document.to_bytes())
    }

    fn rels(&self) -> &Relationships {
        &self.rels
    }

    fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    fn set_partname(&mut self, partname: PackURI) {
        self.rels.set_base_uri(partname.base_uri());
        self.partname = partname;
    }
}

/// A loaded part, typed by what it is in the presentation graph.
#[derive(Debug, Clone)]
pub enum Resource {
    /// A slide part (`/ppt/slides/slideN.xml`).
    Slide(XmlPart),
    Xml(XmlPart),
    Blob(BlobPart),
}

impl Resource {
    pub fn as_part(&self) -> &dyn Part {
        match self {
            Resource::Slide(part) | Resource::Xml(part) => part,
            Resource::Blob(part) => part,
        }
    }

    pub fn as_part_mut(&mut self) -> &mut dyn Part {
        match self {
            Resource::Slide(part) | Resource::Xml(part) => part,
            Resource::Blob(part) => part,
        }
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        self.as_part().partname()
    }

    #[inline]
    pub fn is_slide(&self) -> bool {
        matches!(self, Resource::Slide(_))
    }
}

/// Selects the part type for a partname and content type.
pub struct PartFactory;

impl PartFactory {
    pub fn load(
        store: &dyn ArchiveStore,
        partname: PackURI,
        content_type: Option<String>,
    ) -> Result<Resource> {
        if !store.exists(&partname)? {
            return Err(OpcError::MissingPart(partname.to_string()));
        }
        if Self::is_slide_partname(&partname) {
            Ok(Resource::Slide(XmlPart::load(store, partname, content_type)?))
        } else if Self::is_xml(&partname, content_type.as_deref()) {
            Ok(Resource::Xml(XmlPart::load(store, partname, content_type)?))
        } else {
            Ok(Resource::Blob(BlobPart::load(store, partname, content_type)?))
        }
    }

    /// Whether a partname follows the slide pattern `/ppt/slides/slideN.xml`.
    pub fn is_slide_partname(partname: &PackURI) -> bool {
        partname.base_uri() == "/ppt/slides"
            && partname.ext().eq_ignore_ascii_case("xml")
            && partname.stem().strip_prefix("slide").is_some_and(|n| {
                !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())
            })
    }

    #[inline]
    fn is_xml(partname: &PackURI, content_type: Option<&str>) -> bool {
        match content_type {
            Some(ct) => ct.ends_with("+xml") || ct.ends_with("/xml"),
            None => partname.ext().eq_ignore_ascii_case("xml"),
        }
    }
}
