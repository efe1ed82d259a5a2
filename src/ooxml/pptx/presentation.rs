//! The presentation manifest (`ppt/presentation.xml`).
//!
//! Slide order is the order of `p:sldId` entries in `p:sldIdLst`. Each entry
//! carries a numeric slide id (a sequence number unique within the
//! presentation) and a relationship id into the manifest's own relationship
//! table; the two are distinct namespaces.
use crate::error::{Error, Result};
use crate::ooxml::opc::constants::{namespace, relationship_type};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{Part, XmlPart};
use crate::ooxml::opc::xml::{XmlElement, XmlNode};
use quick_xml::escape::unescape;

/// Smallest slide id PresentationML allows.
pub const MIN_SLIDE_ID: u32 = 256;

/// Elements that precede `p:sldIdLst` in a presentation.
const SLIDE_LIST_PREDECESSORS: [&str; 3] = ["sldMasterIdLst", "notesMasterIdLst", "handoutMasterIdLst"];

#[derive(Debug, Clone)]
pub struct Presentation {
    part: XmlPart,
}

impl Presentation {
    pub fn new(part: XmlPart) -> Self {
        Self { part }
    }

    #[inline]
    pub fn part(&self) -> &XmlPart {
        &self.part
    }

    #[inline]
    pub fn part_mut(&mut self) -> &mut XmlPart {
        &mut self.part
    }

    /// Relationship ids of the slides, in presentation order.
    pub fn slide_rids(&self) -> Result<Vec<String>> {
        let key = format!("{}:id", self.part.rels_prefix().unwrap_or("r"));
        self.part
            .document()
            .query("sldIdLst/sldId")
            .into_iter()
            .filter_map(|el| el.attribute(&key))
            .map(|raw| {
                unescape(raw)
                    .map(|v| v.into_owned())
                    .map_err(|e| Error::InvalidFormat(format!("sldId r:id: {}", e)))
            })
            .collect()
    }

    /// Numeric slide ids, in presentation order.
    pub fn slide_ids(&self) -> Vec<u32> {
        self.part
            .document()
            .query("sldIdLst/sldId")
            .into_iter()
            .filter_map(|el| el.attribute("id"))
            .filter_map(|id| id.parse::<u32>().ok())
            .collect()
    }

    /// One more than the largest slide id in use, or [`MIN_SLIDE_ID`].
    pub fn next_slide_id(&self) -> u32 {
        self.slide_ids()
            .into_iter()
            .max()
            .map_or(MIN_SLIDE_ID, |max| max.saturating_add(1).max(MIN_SLIDE_ID))
    }

    /// Partnames of the slides, in presentation order.
    pub fn slide_partnames(&self) -> Result<Vec<PackURI>> {
        let mut partnames = Vec::new();
        for r_id in self.slide_rids()? {
            let rel = self.part.rels().get(&r_id).ok_or_else(|| {
                crate::ooxml::opc::error::OpcError::UnresolvedRelationship {
                    source_part: self.part.partname().to_string(),
                    r_id: r_id.clone(),
                }
            })?;
            if rel.reltype() != relationship_type::SLIDE {
                tracing::warn!(%r_id, reltype = rel.reltype(), "slide reference with a non-slide relationship");
            }
            partnames.push(rel.target_partname()?);
        }
        Ok(partnames)
    }

    /// Reference `slide` from the manifest: a fresh relationship id first,
    /// then a `sldId` entry appended to the slide list. Returns the
    /// relationship id and the slide id.
    pub fn add_slide(&mut self, slide: &PackURI) -> Result<(String, u32)> {
        let r_id = self.part.relate_to(slide, relationship_type::SLIDE);
        let id = self.next_slide_id();

        let r_prefix = self.ensure_rels_prefix();
        let prefix = self.part.document().root().prefix().map(str::to_string);
        let qualified = |local: &str| match &prefix {
            Some(p) => format!("{}:{}", p, local),
            None => local.to_string(),
        };

        let entry = XmlElement::new(qualified("sldId"))
            .with_attribute("id", &id.to_string())
            .with_attribute(&format!("{}:id", r_prefix), &r_id);

        let root = self.part.document_mut().root_mut();
        if root.position("sldIdLst").is_none() {
            let at = root
                .children()
                .iter()
                .rposition(|node| {
                    matches!(node, XmlNode::Element(el) if SLIDE_LIST_PREDECESSORS.contains(&el.local_name()))
                })
                .map_or(0, |pos| pos + 1);
            root.insert_child(at, XmlElement::new(qualified("sldIdLst")));
        }
        let list = root
            .find_mut("sldIdLst")
            .ok_or_else(|| Error::InvalidFormat("presentation has no sldIdLst".to_string()))?;
        list.push_child(entry);

        tracing::debug!(%slide, %r_id, id, "referenced slide from presentation");
        Ok((r_id, id))
    }

    /// Prefix bound to the relationships namespace, declaring `r` on the
    /// root when no prefix is bound.
    fn ensure_rels_prefix(&mut self) -> String {
        if let Some(prefix) = self.part.rels_prefix() {
            return prefix.to_string();
        }
        self.part
            .document_mut()
            .root_mut()
            .set_attribute("xmlns:r", namespace::OFC_RELATIONSHIPS);
        "r".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::xml::XmlDocument;

    const P: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

    fn presentation(body: &str) -> Presentation {
        let xml = format!("<p:presentation {}>{}</p:presentation>", P, body);
        let part = XmlPart::new(
            PackURI::new("/ppt/presentation.xml").unwrap(),
            None,
            XmlDocument::parse(xml.as_bytes()).unwrap(),
        );
        Presentation::new(part)
    }

    #[test]
    fn test_slide_rids_in_order() {
        let pres = presentation(
            r#"<p:sldIdLst><p:sldId id="257" r:id="rId3"/><p:sldId id="256" r:id="rId2"/></p:sldIdLst>"#,
        );
        assert_eq!(pres.slide_rids().unwrap(), vec!["rId3", "rId2"]);
        assert_eq!(pres.slide_ids(), vec![257, 256]);
        assert_eq!(pres.next_slide_id(), 258);
    }

    #[test]
    fn test_next_slide_id_uses_max_not_gaps() {
        let pres = presentation(
            r#"<p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="300" r:id="rId3"/></p:sldIdLst>"#,
        );
        assert_eq!(pres.next_slide_id(), 301);
    }

    #[test]
    fn test_add_slide_appends_entry() {
        let mut pres = presentation(r#"<p:sldMasterIdLst/><p:sldIdLst><p:sldId id="256" r:id="rId1"/></p:sldIdLst><p:sldSz cx="1" cy="1"/>"#);
        pres.part_mut().rels_mut().add_relationship(
            relationship_type::SLIDE.into(),
            "slides/slide1.xml".into(),
            "rId1".into(),
            false,
        );

        let (r_id, id) = pres.add_slide(&PackURI::new("/ppt/slides/slide2.xml").unwrap()).unwrap();
        assert_eq!(r_id, "rId2");
        assert_eq!(id, 257);
        assert_eq!(pres.slide_rids().unwrap(), vec!["rId1", "rId2"]);
        assert_eq!(
            pres.slide_partnames().unwrap().last().unwrap().as_str(),
            "/ppt/slides/slide2.xml"
        );
        assert_eq!(pres.part().rels().get("rId2").unwrap().target_ref(), "slides/slide2.xml");
    }

    #[test]
    fn test_add_slide_creates_list_after_masters() {
        let mut pres = presentation(r#"<p:sldMasterIdLst/><p:notesMasterIdLst/><p:sldSz cx="1" cy="1"/>"#);
        let (_, id) = pres.add_slide(&PackURI::new("/ppt/slides/slide1.xml").unwrap()).unwrap();
        assert_eq!(id, MIN_SLIDE_ID);

        let order: Vec<&str> = pres
            .part()
            .document()
            .root()
            .elements()
            .map(|el| el.local_name())
            .collect();
        assert_eq!(order, vec!["sldMasterIdLst", "notesMasterIdLst", "sldIdLst", "sldSz"]);
        assert_eq!(pres.slide_rids().unwrap(), vec!["rId1"]);
    }

    #[test]
    fn test_unresolved_slide_reference() {
        let pres = presentation(r#"<p:sldIdLst><p:sldId id="256" r:id="rId9"/></p:sldIdLst>"#);
        assert!(matches!(
            pres.slide_partnames(),
            Err(Error::Opc(crate::ooxml::opc::error::OpcError::UnresolvedRelationship { .. }))
        ));
    }
}
