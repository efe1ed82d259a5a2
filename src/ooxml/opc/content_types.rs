//! The package content-type manifest (`[Content_Types].xml`).
//!
//! Lookup follows the OPC discovery rule: an `Override` for the exact
//! partname wins, otherwise the `Default` for the partname's extension.
//! Mutations edit the parsed manifest in place, so entries that were
//! already present keep their order and spelling.

use crate::ooxml::opc::constants::{EXTENSION_CONTENT_TYPES, is_default_content_type, namespace};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PackURI};
use crate::ooxml::opc::phys_pkg::ArchiveStore;
use crate::ooxml::opc::xml::{XmlDocument, XmlElement, XmlNode};
use bytes::Bytes;
use quick_xml::escape::unescape;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ContentTypeRegistry {
    document: XmlDocument,
    /// Lowercase extension to content type
    defaults: HashMap<String, String>,
    /// Partname to content type
    overrides: HashMap<String, String>,
}

impl ContentTypeRegistry {
    /// An empty manifest.
    pub fn new() -> Self {
        let root = XmlElement::new("Types").with_attribute("xmlns", namespace::OPC_CONTENT_TYPES);
        Self {
            document: XmlDocument::new(root),
            defaults: HashMap::new(),
            overrides: HashMap::new(),
        }
    }

    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let document = XmlDocument::parse(xml)?;
        let mut defaults = HashMap::new();
        let mut overrides = HashMap::new();

        for el in document.root().elements() {
            let value = |name: &str| -> Result<Option<String>> {
                el.attribute(name)
                    .map(|raw| {
                        unescape(raw)
                            .map(|v| v.into_owned())
                            .map_err(|e| OpcError::XmlError(e.to_string()))
                    })
                    .transpose()
            };
            match el.local_name() {
                "Default" => {
                    if let (Some(ext), Some(ct)) = (value("Extension")?, value("ContentType")?) {
                        defaults.insert(ext.to_lowercase(), ct);
                    }
                },
                "Override" => {
                    if let (Some(partname), Some(ct)) = (value("PartName")?, value("ContentType")?) {
                        overrides.insert(partname, ct);
                    }
                },
                _ => {},
            }
        }

        Ok(Self {
            document,
            defaults,
            overrides,
        })
    }

    /// Read the manifest from a store.
    pub fn load(store: &dyn ArchiveStore) -> Result<Self> {
        let partname = Self::partname();
        let xml = store.read(&partname)?;
        Self::from_xml(&xml)
    }

    /// Partname of the manifest itself.
    pub fn partname() -> PackURI {
        PackURI::from_static(CONTENT_TYPES_URI)
    }

    /// The content type a consumer would resolve for `partname`.
    pub fn resolve(&self, partname: &PackURI) -> Option<&str> {
        self.overrides
            .get(partname.as_str())
            .or_else(|| self.defaults.get(&partname.ext().to_lowercase()))
            .map(String::as_str)
    }

    /// The fixed extension table's content type for `partname`.
    pub fn type_for(partname: &PackURI) -> Option<&'static str> {
        EXTENSION_CONTENT_TYPES
            .get(partname.ext().to_lowercase().as_str())
            .copied()
    }

    #[inline]
    pub fn default_for(&self, ext: &str) -> Option<&str> {
        self.defaults.get(&ext.to_lowercase()).map(String::as_str)
    }

    #[inline]
    pub fn override_for(&self, partname: &PackURI) -> Option<&str> {
        self.overrides.get(partname.as_str()).map(String::as_str)
    }

    /// Add an `Override` for `partname` with the extension table's type.
    /// No-op for unknown extensions. Returns whether the manifest changed.
    pub fn register_override(&mut self, partname: &PackURI) -> bool {
        match Self::type_for(partname) {
            Some(ct) => self.add_override(partname, ct),
            None => false,
        }
    }

    /// Declare `content_type` for a part copied into this package.
    ///
    /// Nothing is written when the extension's `Default` already matches. A
    /// missing `Default` is added for standard extension/type pairs; any
    /// other type gets an `Override`. Without a known type the extension
    /// table is consulted, and an unknown extension registers nothing.
    pub fn register(&mut self, partname: &PackURI, content_type: Option<&str>) -> bool {
        let ext = partname.ext().to_lowercase();
        let Some(content_type) = content_type.or_else(|| Self::type_for(partname)) else {
            tracing::debug!(%partname, "no content type known, nothing registered");
            return false;
        };

        match self.defaults.get(&ext) {
            Some(existing) if existing == content_type => {
                if self.overrides.get(partname.as_str()).is_some_and(|ct| ct != content_type) {
                    self.add_override(partname, content_type)
                } else {
                    false
                }
            },
            None if is_default_content_type(&ext, content_type) => {
                self.add_default(&ext, content_type)
            },
            _ => self.add_override(partname, content_type),
        }
    }

    /// Add a `Default` entry. Existing defaults are left untouched.
    pub fn add_default(&mut self, ext: &str, content_type: &str) -> bool {
        let ext = ext.to_lowercase();
        if self.defaults.contains_key(&ext) {
            return false;
        }
        let element = XmlElement::new(self.qualified("Default"))
            .with_attribute("Extension", &ext)
            .with_attribute("ContentType", content_type);
        let root = self.document.root_mut();
        let after_last_default = root
            .children()
            .iter()
            .rposition(|node| matches!(node, XmlNode::Element(el) if el.local_name() == "Default"))
            .map_or(0, |pos| pos + 1);
        root.insert_child(after_last_default, element);
        self.defaults.insert(ext.clone(), content_type.to_string());
        tracing::debug!(%ext, content_type, "registered content-type default");
        true
    }

    /// Add or update the `Override` for `partname`; an identical entry is
    /// never duplicated.
    pub fn add_override(&mut self, partname: &PackURI, content_type: &str) -> bool {
        match self.overrides.get(partname.as_str()) {
            Some(existing) if existing == content_type => return false,
            Some(_) => {
                let name = partname.as_str();
                if let Some(el) = self.document.root_mut().children_mut().iter_mut().find_map(
                    |node| match node {
                        XmlNode::Element(el)
                            if el.local_name() == "Override"
                                && el.attribute("PartName").is_some_and(|p| {
                                    unescape(p).is_ok_and(|p| p == name)
                                }) =>
                        {
                            Some(el)
                        },
                        _ => None,
                    },
                ) {
                    el.set_attribute("ContentType", content_type);
                }
            },
            None => {
                let element = XmlElement::new(self.qualified("Override"))
                    .with_attribute("PartName", partname.as_str())
                    .with_attribute("ContentType", content_type);
                self.document.root_mut().push_child(element);
            },
        }
        self.overrides
            .insert(partname.to_string(), content_type.to_string());
        tracing::debug!(%partname, content_type, "registered content-type override");
        true
    }

    /// Number of `Override` entries.
    pub fn override_count(&self) -> usize {
        self.document
            .root()
            .elements()
            .filter(|el| el.local_name() == "Override")
            .count()
    }

    pub fn to_xml(&self) -> Vec<u8> {
        self.document.to_bytes()
    }

    /// Persist the manifest to the store.
    pub fn save(&self, store: &mut dyn ArchiveStore) -> Result<()> {
        store.write(&Self::partname(), Bytes::from(self.to_xml()))
    }

    /// Element name in the same prefix as the root element.
    fn qualified(&self, local: &str) -> String {
        match self.document.root().prefix() {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        }
    }
}

impl Default for ContentTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
