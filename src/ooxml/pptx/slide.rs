use crate::error::Result;
use crate::ooxml::opc::package::PackageSnapshot;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{Part, Resource, XmlPart};
use crate::ooxml::pptx::template;
use quick_xml::escape::unescape;
use std::collections::HashMap;
use std::sync::Arc;

/// A slide part together with the package snapshot it was loaded from.
///
/// The snapshot keeps the slide's dependencies (layouts, media, charts)
/// readable after the source package has been mutated or dropped, so a
/// slide can be passed to [`Package::add_slide`](crate::Package::add_slide)
/// of any package, including its own.
#[derive(Debug, Clone)]
pub struct Slide {
    part: XmlPart,
    source: Arc<PackageSnapshot>,
}

impl Slide {
    pub(crate) fn new(part: XmlPart, source: Arc<PackageSnapshot>) -> Self {
        Self { part, source }
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        self.part.partname()
    }

    #[inline]
    pub fn part(&self) -> &XmlPart {
        &self.part
    }

    /// The package view this slide resolves its relationships against.
    #[inline]
    pub fn source(&self) -> &Arc<PackageSnapshot> {
        &self.source
    }

    /// Everything this slide depends on, transitively, breadth-first from
    /// its own relationships. The slide itself is not included.
    pub fn get_resources(&self) -> Result<Vec<Resource>> {
        Ok(self.source.collect_resources(&self.part)?)
    }

    /// Load the target of one of this slide's relationships.
    pub fn get_resource(&self, r_id: &str) -> Result<Resource> {
        Ok(self.source.get_resource(&self.part, r_id)?)
    }

    /// Replace placeholders in every text node of the slide. Returns the
    /// number of replacements.
    pub fn template(&mut self, values: &HashMap<String, String>) -> usize {
        template::substitute(self.part.document_mut().root_mut(), values)
    }

    /// DrawingML text (`a:t`) of the slide, one line per run.
    pub fn text(&self) -> Result<String> {
        let mut lines = Vec::new();
        for el in self.part.document().root().descendants() {
            if el.local_name() == "t" {
                lines.push(el.text()?);
            }
        }
        Ok(lines.join("\n"))
    }

    /// The `name` attribute of `p:cSld`, empty when unnamed.
    pub fn name(&self) -> Result<String> {
        match self.part.document().root().find("cSld").and_then(|el| el.attribute("name")) {
            Some(raw) => Ok(unescape(raw)
                .map_err(|e| crate::Error::InvalidFormat(format!("cSld name: {}", e)))?
                .into_owned()),
            None => Ok(String::new()),
        }
    }
}
