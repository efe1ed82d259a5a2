/// Placeholder substitution payloads for slide text.
///
/// Keys are literal placeholders (`{{title}}`, `$NAME`, ...) matched inside
/// individual text nodes. A placeholder split across two runs is not found.
use crate::ooxml::opc::xml::XmlElement;
use quick_xml::escape::{partial_escape, unescape};
use std::collections::HashMap;

/// Values to substitute into slides.
#[derive(Clone, Copy)]
pub enum TemplateData<'a> {
    /// The same mapping for every slide.
    Values(&'a HashMap<String, String>),
    /// A mapping produced per slide from its 0-based position.
    PerSlide(&'a dyn Fn(usize) -> HashMap<String, String>),
}

impl<'a> TemplateData<'a> {
    /// Mapping to apply to the slide at `index`.
    pub fn values_for(&self, index: usize) -> HashMap<String, String> {
        match self {
            TemplateData::Values(values) => (*values).clone(),
            TemplateData::PerSlide(produce) => produce(index),
        }
    }
}

impl<'a> From<&'a HashMap<String, String>> for TemplateData<'a> {
    fn from(values: &'a HashMap<String, String>) -> Self {
        TemplateData::Values(values)
    }
}

impl std::fmt::Debug for TemplateData<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateData::Values(values) => f.debug_tuple("Values").field(values).finish(),
            TemplateData::PerSlide(_) => f.write_str("PerSlide(..)"),
        }
    }
}

/// Replace every placeholder of `values` in the text nodes below `root`.
/// Returns the number of replacements.
///
/// Text is matched unescaped, so a key never matches inside an entity
/// reference. Nodes with an entity quick-xml cannot resolve are left alone.
pub(crate) fn substitute(root: &mut XmlElement, values: &HashMap<String, String>) -> usize {
    // Longest key first, so a key wins over any key it starts with.
    let mut pairs: Vec<(&str, &str)> = values
        .iter()
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    if pairs.is_empty() {
        return 0;
    }
    pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

    let mut replaced = 0;
    root.visit_text_mut(&mut |raw: &mut String| {
        let (text, hits) = match unescape(raw.as_str()) {
            Ok(plain) => replace_all(&plain, &pairs),
            Err(e) => {
                tracing::debug!(error = %e, "text node left untemplated");
                return;
            },
        };
        if hits > 0 {
            *raw = partial_escape(text.as_str()).into_owned();
            replaced += hits;
        }
    });
    replaced
}

/// One left-to-right pass over `text`. Inserted values are not rescanned.
fn replace_all(text: &str, pairs: &[(&str, &str)]) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut hits = 0;
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        match pairs.iter().find(|(key, _)| rest.starts_with(*key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &rest[key.len()..];
                hits += 1;
            },
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            },
        }
    }
    (out, hits)
}
