//! Relationship tables for OPC parts.
//!
//! Each part with a `.rels` sidecar owns one [`Relationships`] table mapping
//! relationship ids to targets. Targets are kept as written (relative to the
//! owning part's directory) and resolved on demand.

use crate::ooxml::opc::constants::{namespace, target_mode};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::xml::XmlDocument;
use quick_xml::escape::{escape, unescape};
use std::collections::BTreeSet;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a relative part reference or external URL
    target_ref: String,

    /// Base URI for resolving relative references
    base_uri: String,

    is_external: bool,
}

impl Relationship {
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_uri: String,
        is_external: bool,
    ) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
            is_external,
        }
    }

    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// The target as written in the `.rels` part.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Absolute target partname for internal relationships.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(format!(
                "Cannot get target_partname for external relationship {}",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref)
    }
}

/// The relationship table of one source part, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationships {
    base_uri: String,
    rels: Vec<Relationship>,
}

impl Relationships {
    /// An empty table whose targets resolve against `base_uri`.
    pub fn new(base_uri: String) -> Self {
        Self {
            base_uri,
            rels: Vec::new(),
        }
    }

    /// Parse a `.rels` part.
    pub fn from_xml(base_uri: String, xml: &[u8]) -> Result<Self> {
        let doc = XmlDocument::parse(xml)?;
        let mut rels = Self::new(base_uri);
        for el in doc.root().elements().filter(|el| el.local_name() == "Relationship") {
            let attr = |name: &str| -> Result<String> {
                let raw = el.attribute(name).ok_or_else(|| {
                    OpcError::InvalidRelationship(format!("Relationship without {} attribute", name))
                })?;
                unescape(raw)
                    .map(|v| v.into_owned())
                    .map_err(|e| OpcError::XmlError(e.to_string()))
            };
            let is_external = el.attribute("TargetMode") == Some(target_mode::EXTERNAL);
            rels.add_relationship(attr("Type")?, attr("Target")?, attr("Id")?, is_external);
        }
        Ok(rels)
    }

    #[inline]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Re-anchor relative targets, used when the owning part moves directory.
    pub fn set_base_uri(&mut self, base_uri: &str) {
        self.base_uri = base_uri.to_string();
        for rel in &mut self.rels {
            rel.base_uri = base_uri.to_string();
        }
    }

    /// Insert a relationship with a known id, replacing any with the same id.
    pub fn add_relationship(
        &mut self,
        reltype: String,
        target_ref: String,
        r_id: String,
        is_external: bool,
    ) -> &Relationship {
        let rel = Relationship::new(r_id, reltype, target_ref, self.base_uri.clone(), is_external);
        let slot = match self.rels.iter().position(|r| r.r_id == rel.r_id) {
            Some(pos) => {
                self.rels[pos] = rel;
                pos
            },
            None => {
                self.rels.push(rel);
                self.rels.len() - 1
            },
        };
        &self.rels[slot]
    }

    /// Add an internal relationship to `target` under a fresh id and return
    /// the id.
    pub fn add(&mut self, reltype: &str, target: &PackURI) -> String {
        let r_id = self.next_r_id();
        let target_ref = target.relative_ref(&self.base_uri);
        self.add_relationship(reltype.to_string(), target_ref, r_id.clone(), false);
        r_id
    }

    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.r_id == r_id)
    }

    /// Point an existing relationship at a different target reference.
    pub fn retarget(&mut self, r_id: &str, target_ref: String) -> Result<()> {
        let rel = self
            .rels
            .iter_mut()
            .find(|rel| rel.r_id == r_id)
            .ok_or_else(|| OpcError::UnresolvedRelationship {
                source_part: self.base_uri.clone(),
                r_id: r_id.to_string(),
            })?;
        rel.target_ref = target_ref;
        Ok(())
    }

    /// The next relationship id: `rId` followed by one more than the largest
    /// numeric suffix in use, or `rId1` for an empty table.
    ///
    /// If the largest suffix is `u64::MAX`, the lowest unused suffix is taken.
    pub fn next_r_id(&self) -> String {
        let used: BTreeSet<u64> = self
            .rels
            .iter()
            .filter_map(|rel| rel.r_id.strip_prefix("rId"))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .collect();
        let next = match used.last() {
            Some(max) => max.checked_add(1).unwrap_or_else(|| Self::lowest_unused(&used)),
            None => 1,
        };
        format!("rId{}", next)
    }

    /// Smallest suffix from 1 up that `used` does not contain.
    fn lowest_unused(used: &BTreeSet<u64>) -> u64 {
        let mut n = 1;
        for &id in used.range(1..) {
            if id != n {
                break;
            }
            n += 1;
        }
        n
    }

    /// The single relationship of a type.
    ///
    /// Returns an error if none or more than one exists.
    pub fn part_with_reltype(&self, reltype: &str) -> Result<&Relationship> {
        let mut matching = self.rels.iter().filter(|rel| rel.reltype == reltype);
        match (matching.next(), matching.next()) {
            (Some(rel), None) => Ok(rel),
            (None, _) => Err(OpcError::InvalidRelationship(format!(
                "No relationship of type '{}'",
                reltype
            ))),
            (Some(_), Some(_)) => Err(OpcError::InvalidRelationship(format!(
                "Multiple relationships of type '{}'",
                reltype
            ))),
        }
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Serialize to `.rels` XML, in table order.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 + self.rels.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str("\r\n");
        xml.push_str(r#"<Relationships xmlns=""#);
        xml.push_str(namespace::OPC_RELATIONSHIPS);
        xml.push_str(r#"">"#);

        for rel in &self.rels {
            let target_mode = if rel.is_external() {
                r#" TargetMode="External""#
            } else {
                ""
            };

            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                escape(rel.r_id()),
                escape(rel.reltype()),
                escape(rel.target_ref()),
                target_mode
            ));
        }

        xml.push_str("</Relationships>");
        xml
    }
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new("/".to_string())
    }
}
