/// The PackURI value type: a partname inside an OPC package.
///
/// PackURIs always begin with a forward slash and use forward slashes as
/// path separators. The archive member name is the same string without its
/// leading slash.
use crate::ooxml::opc::error::{OpcError, Result};

/// Placeholder substituted by the name allocator in a partname pattern.
pub const INDEX_PLACEHOLDER: &str = "%d";

/// The package pseudo-partname, representing the package itself
pub const PACKAGE_URI: &str = "/";

/// The URI for the [Content_Types].xml part
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    uri: String,
}

impl PackURI {
    /// Create a new PackURI. The string must begin with a forward slash.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(OpcError::InvalidPackUri(format!(
                "PackURI must begin with slash, got '{}'",
                uri
            )));
        }
        Ok(PackURI { uri })
    }

    /// Create a PackURI from a zip member name (no leading slash).
    pub fn from_membername(membername: &str) -> Result<Self> {
        let trimmed = membername.trim_start_matches('/');
        Self::new(format!("/{}", trimmed.replace('\\', "/")))
    }

    /// Resolve a relative reference (like "../media/image1.png") against a
    /// base URI (like "/ppt/slides") into an absolute PackURI.
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self> {
        let joined = if relative_ref.starts_with('/') {
            relative_ref.to_string()
        } else if base_uri.ends_with('/') {
            format!("{}{}", base_uri, relative_ref)
        } else {
            format!("{}/{}", base_uri, relative_ref)
        };
        Self::new(Self::normalize_path(&joined))
    }

    /// Directory portion, e.g. "/ppt/slides" for "/ppt/slides/slide1.xml".
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Filename portion, e.g. "slide1.xml". Empty for the package URI.
    pub fn filename(&self) -> &str {
        match self.uri.rfind('/') {
            Some(pos) => &self.uri[pos + 1..],
            None => "",
        }
    }

    /// Extension without the leading period, e.g. "xml".
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(pos) => &filename[pos + 1..],
            None => "",
        }
    }

    /// Filename without its extension, e.g. "slide1".
    pub fn stem(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(pos) => &filename[..pos],
            None => filename,
        }
    }

    /// Numeric suffix of tuple partnames: 21 for "/ppt/slides/slide21.xml",
    /// None for singleton partnames such as "/ppt/presentation.xml".
    pub fn idx(&self) -> Option<u32> {
        let stem = self.stem();
        let digits = stem.len() - stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 || digits == stem.len() {
            return None;
        }
        stem[stem.len() - digits..].parse::<u32>().ok()
    }

    /// The partname pattern used when this part is copied into another
    /// package: the trailing index is replaced by [`INDEX_PLACEHOLDER`], or
    /// the placeholder is appended to the stem when there is no index.
    ///
    /// "/ppt/media/image12.png" becomes "/ppt/media/image%d.png".
    pub fn pattern(&self) -> String {
        let stem = self.stem();
        let name = stem.trim_end_matches(|c: char| c.is_ascii_digit());
        let name = if name.is_empty() { stem } else { name };
        let ext = self.ext();
        let dir = self.base_uri().trim_end_matches('/');
        if ext.is_empty() {
            format!("{}/{}{}", dir, name, INDEX_PLACEHOLDER)
        } else {
            format!("{}/{}{}.{}", dir, name, INDEX_PLACEHOLDER, ext)
        }
    }

    /// The same directory with a different filename.
    pub fn with_filename(&self, filename: &str) -> Result<Self> {
        let dir = self.base_uri().trim_end_matches('/');
        Self::new(format!("{}/{}", dir, filename))
    }

    /// Zip member name: the URI with its leading slash stripped.
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Relative reference from `base_uri` to this PackURI, e.g.
    /// "../slideLayouts/slideLayout1.xml" from "/ppt/slides".
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == "/" {
            return self.membername().to_string();
        }

        let from_parts: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to_parts: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();

        // The last segment of `to_parts` is the filename and never matches a directory.
        let common = from_parts
            .iter()
            .zip(to_parts.iter().take(to_parts.len().saturating_sub(1)))
            .take_while(|(a, b)| a == b)
            .count();

        let mut segments: Vec<&str> = Vec::with_capacity(from_parts.len() + to_parts.len());
        segments.extend(std::iter::repeat_n("..", from_parts.len() - common));
        segments.extend(to_parts.iter().skip(common));
        segments.join("/")
    }

    /// PackURI of the .rels part for this part, e.g.
    /// "/ppt/slides/_rels/slide1.xml.rels" for "/ppt/slides/slide1.xml".
    pub fn rels_uri(&self) -> Result<PackURI> {
        let base_uri = self.base_uri();
        if base_uri == "/" {
            Self::new(format!("/_rels/{}.rels", self.filename()))
        } else {
            Self::new(format!("{}/_rels/{}.rels", base_uri, self.filename()))
        }
    }

    /// Partname from a literal known to begin with a slash.
    pub(crate) fn from_static(uri: &'static str) -> Self {
        debug_assert!(uri.starts_with('/'));
        PackURI {
            uri: uri.to_string(),
        }
    }

    /// Whether this partname is a relationship part.
    pub fn is_rels(&self) -> bool {
        self.ext().eq_ignore_ascii_case("rels")
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Resolve "." and ".." segments.
    fn normalize_path(path: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for part in path.split('/') {
            match part {
                "" | "." => {},
                ".." => {
                    parts.pop();
                },
                _ => parts.push(part),
            }
        }
        format!("/{}", parts.join("/"))
    }
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}
