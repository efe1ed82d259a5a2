/// Read-only views of a package and traversal of its part graph.
///
/// A [`PackageSnapshot`] freezes the entries of a store together with the
/// content-type manifest they were written with. Slides keep the snapshot of
/// the package they were loaded from, so they can be imported into another
/// package (or back into their own) after the source has moved on.
use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::content_types::ContentTypeRegistry;
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::{Part, PartFactory, Resource};
use crate::ooxml::opc::phys_pkg::{ArchiveStore, MemoryStore};
use crate::ooxml::opc::rel::Relationships;
use std::collections::{HashSet, VecDeque};

/// Fallback location of the main presentation part.
pub const DEFAULT_MAIN_PARTNAME: &str = "/ppt/presentation.xml";

/// A point-in-time view of a package's entries and content types.
#[derive(Debug, Clone)]
pub struct PackageSnapshot {
    store: MemoryStore,
    content_types: ContentTypeRegistry,
}

impl PackageSnapshot {
    /// Freeze `store`, reading its content-type manifest.
    pub fn new(store: MemoryStore) -> Result<Self> {
        let content_types = ContentTypeRegistry::load(&store)?;
        Ok(Self {
            store,
            content_types,
        })
    }

    pub fn from_parts(store: MemoryStore, content_types: ContentTypeRegistry) -> Self {
        Self {
            store,
            content_types,
        }
    }

    #[inline]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    #[inline]
    pub fn content_types(&self) -> &ContentTypeRegistry {
        &self.content_types
    }

    /// Load the part at `partname`, typed by [`PartFactory`].
    pub fn load(&self, partname: &PackURI) -> Result<Resource> {
        let content_type = self.content_types.resolve(partname).map(str::to_string);
        PartFactory::load(&self.store, partname.clone(), content_type)
    }

    /// Resolve `r_id` through the relationship table of `part` and load the
    /// target.
    pub fn get_resource(&self, part: &dyn Part, r_id: &str) -> Result<Resource> {
        let target = part.target_partname(r_id)?;
        self.load(&target)
    }

    /// Package-level relationships (`/_rels/.rels`), empty when absent.
    pub fn package_rels(&self) -> Result<Relationships> {
        let package = PackURI::from_static(PACKAGE_URI);
        let rels_uri = package.rels_uri()?;
        if self.store.exists(&rels_uri)? {
            Relationships::from_xml(PACKAGE_URI.to_string(), &self.store.read(&rels_uri)?)
        } else {
            Ok(Relationships::new(PACKAGE_URI.to_string()))
        }
    }

    /// Partname of the main document: the package-level officeDocument
    /// relationship, or [`DEFAULT_MAIN_PARTNAME`] when there is none.
    pub fn main_document_partname(&self) -> Result<PackURI> {
        let rels = self.package_rels()?;
        match rels.part_with_reltype(relationship_type::OFFICE_DOCUMENT) {
            Ok(rel) if !rel.is_external() => rel.target_partname(),
            _ => Ok(PackURI::from_static(DEFAULT_MAIN_PARTNAME)),
        }
    }

    /// Every part reachable from `root` through internal relationships,
    /// breadth-first in relationship-table order, each partname once, `root`
    /// itself excluded.
    pub fn collect_resources(&self, root: &dyn Part) -> Result<Vec<Resource>> {
        self.traverse(root, |_| Ok(true))
    }

    /// Breadth-first traversal from `root`. Every discovered part is passed
    /// to `visit` and returned; traversal descends into its relationships
    /// only when `visit` returns `true`.
    pub fn traverse<F>(&self, root: &dyn Part, mut visit: F) -> Result<Vec<Resource>>
    where
        F: FnMut(&Resource) -> Result<bool>,
    {
        let mut seen: HashSet<PackURI> = HashSet::new();
        seen.insert(root.partname().clone());

        let mut queue: VecDeque<PackURI> = VecDeque::new();
        Self::enqueue(root, &mut seen, &mut queue)?;

        let mut found = Vec::new();
        while let Some(partname) = queue.pop_front() {
            let resource = self.load(&partname)?;
            if visit(&resource)? {
                Self::enqueue(resource.as_part(), &mut seen, &mut queue)?;
            }
            found.push(resource);
        }
        Ok(found)
    }

    fn enqueue(
        part: &dyn Part,
        seen: &mut HashSet<PackURI>,
        queue: &mut VecDeque<PackURI>,
    ) -> Result<()> {
        for rel in part.rels().iter().filter(|rel| !rel.is_external()) {
            let target = rel.target_partname()?;
            if seen.insert(target.clone()) {
                queue.push_back(target);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::content_type as ct;
    use crate::ooxml::opc::error::OpcError;
    use bytes::Bytes;

    const TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="xlsx" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"/><Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/><Override PartName="/ppt/charts/chart1.xml" ContentType="application/vnd.openxmlformats-officedocument.drawingml.chart+xml"/></Types>"#;

    fn rels(entries: &[(&str, &str, &str)]) -> Bytes {
        let mut xml = String::from(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (id, reltype, target) in entries {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                id, reltype, target
            ));
        }
        xml.push_str("</Relationships>");
        Bytes::from(xml)
    }

    fn put(store: &mut MemoryStore, name: &str, blob: Bytes) {
        store.write(&PackURI::new(name).unwrap(), blob).unwrap();
    }

    fn chart_snapshot() -> PackageSnapshot {
        let mut store = MemoryStore::new();
        put(&mut store, "/[Content_Types].xml", Bytes::from_static(TYPES.as_bytes()));
        put(&mut store, "/ppt/slides/slide1.xml", Bytes::from_static(b"<p:sld xmlns:p=\"urn:p\"/>"));
        put(
            &mut store,
            "/ppt/slides/_rels/slide1.xml.rels",
            rels(&[
                ("rId1", relationship_type::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
                ("rId2", relationship_type::CHART, "../charts/chart1.xml"),
            ]),
        );
        put(&mut store, "/ppt/slideLayouts/slideLayout1.xml", Bytes::from_static(b"<p:sldLayout xmlns:p=\"urn:p\"/>"));
        put(
            &mut store,
            "/ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            rels(&[("rId1", relationship_type::SLIDE_MASTER, "../slideMasters/slideMaster1.xml")]),
        );
        put(&mut store, "/ppt/slideMasters/slideMaster1.xml", Bytes::from_static(b"<p:sldMaster xmlns:p=\"urn:p\"/>"));
        put(
            &mut store,
            "/ppt/slideMasters/_rels/slideMaster1.xml.rels",
            rels(&[("rId1", relationship_type::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml")]),
        );
        put(&mut store, "/ppt/charts/chart1.xml", Bytes::from_static(b"<c:chartSpace xmlns:c=\"urn:c\"/>"));
        put(
            &mut store,
            "/ppt/charts/_rels/chart1.xml.rels",
            rels(&[("rId1", relationship_type::PACKAGE, "../embeddings/Microsoft_Excel_Worksheet1.xlsx")]),
        );
        put(&mut store, "/ppt/embeddings/Microsoft_Excel_Worksheet1.xlsx", Bytes::from_static(b"PK\x03\x04"));
        PackageSnapshot::new(store).unwrap()
    }

    #[test]
    fn test_closure_is_breadth_first_and_unique() {
        let snapshot = chart_snapshot();
        let slide = snapshot.load(&PackURI::new("/ppt/slides/slide1.xml").unwrap()).unwrap();
        assert!(slide.is_slide());

        let found = snapshot.collect_resources(slide.as_part()).unwrap();
        let names: Vec<&str> = found.iter().map(|r| r.partname().as_str()).collect();
        assert_eq!(
            names,
            vec![
                "/ppt/slideLayouts/slideLayout1.xml",
                "/ppt/charts/chart1.xml",
                "/ppt/slideMasters/slideMaster1.xml",
                "/ppt/embeddings/Microsoft_Excel_Worksheet1.xlsx",
            ]
        );
        assert!(matches!(found[3], Resource::Blob(_)));
        assert_eq!(found[1].as_part().content_type(), Some(ct::DML_CHART));
    }

    #[test]
    fn test_traverse_stops_at_skipped_parts() {
        let snapshot = chart_snapshot();
        let slide = snapshot.load(&PackURI::new("/ppt/slides/slide1.xml").unwrap()).unwrap();
        let found = snapshot
            .traverse(slide.as_part(), |r| Ok(!r.partname().as_str().contains("slideLayout")))
            .unwrap();
        let names: Vec<&str> = found.iter().map(|r| r.partname().as_str()).collect();
        assert_eq!(
            names,
            vec![
                "/ppt/slideLayouts/slideLayout1.xml",
                "/ppt/charts/chart1.xml",
                "/ppt/embeddings/Microsoft_Excel_Worksheet1.xlsx",
            ]
        );
    }

    #[test]
    fn test_get_resource_errors() {
        let snapshot = chart_snapshot();
        let slide = snapshot.load(&PackURI::new("/ppt/slides/slide1.xml").unwrap()).unwrap();
        assert!(matches!(
            snapshot.get_resource(slide.as_part(), "rId9"),
            Err(OpcError::UnresolvedRelationship { .. })
        ));

        let mut store = snapshot.store().clone();
        put(
            &mut store,
            "/ppt/slides/_rels/slide1.xml.rels",
            rels(&[("rId1", relationship_type::IMAGE, "../media/image1.png")]),
        );
        let broken = PackageSnapshot::new(store).unwrap();
        let slide = broken.load(&PackURI::new("/ppt/slides/slide1.xml").unwrap()).unwrap();
        assert!(matches!(
            broken.get_resource(slide.as_part(), "rId1"),
            Err(OpcError::MissingPart(_))
        ));
    }

    #[test]
    fn test_main_document_fallback() {
        let snapshot = chart_snapshot();
        assert_eq!(snapshot.main_document_partname().unwrap().as_str(), DEFAULT_MAIN_PARTNAME);

        let mut store = snapshot.store().clone();
        put(
            &mut store,
            "/_rels/.rels",
            rels(&[("rId1", relationship_type::OFFICE_DOCUMENT, "ppt/main.xml")]),
        );
        let snapshot = PackageSnapshot::new(store).unwrap();
        assert_eq!(snapshot.main_document_partname().unwrap().as_str(), "/ppt/main.xml");
    }
}
