/// Constant values related to the Open Packaging Convention.
///
/// Content type URIs, XML namespaces and relationship types used when
/// composing presentation packages, plus the fixed extension table that
/// backs content-type lookup for parts the manifest does not describe.
use phf::phf_map;

/// Content type URIs (like MIME-types) that specify a part's format
pub mod content_type {
    // Image content types
    pub const BMP: &str = "image/bmp";
    pub const GIF: &str = "image/gif";
    pub const JPEG: &str = "image/jpeg";
    pub const PNG: &str = "image/png";
    pub const SVG: &str = "image/svg+xml";
    pub const TIFF: &str = "image/tiff";
    pub const WEBP: &str = "image/webp";
    pub const MS_PHOTO: &str = "image/vnd.ms-photo";
    pub const X_EMF: &str = "image/x-emf";
    pub const X_WMF: &str = "image/x-wmf";

    // Media
    pub const MP3: &str = "audio/mpeg";
    pub const WAV: &str = "audio/wav";
    pub const MP4: &str = "video/mp4";

    // DrawingML content types
    pub const DML_CHART: &str = "application/vnd.openxmlformats-officedocument.drawingml.chart+xml";
    pub const DML_CHARTSHAPES: &str =
        "application/vnd.openxmlformats-officedocument.drawingml.chartshapes+xml";
    pub const DML_DIAGRAM_DATA: &str =
        "application/vnd.openxmlformats-officedocument.drawingml.diagramData+xml";

    // Office common content types
    pub const OFC_OLE_OBJECT: &str = "application/vnd.openxmlformats-officedocument.oleObject";
    pub const OFC_PACKAGE: &str = "application/vnd.openxmlformats-officedocument.package";
    pub const OFC_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const OFC_VML_DRAWING: &str = "application/vnd.openxmlformats-officedocument.vmlDrawing";

    // OPC core content types
    pub const OPC_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

    // SpreadsheetML (embedded workbooks behind charts)
    pub const SML_SHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

    // PresentationML content types
    pub const PML_PRESENTATION_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const PML_PRES_MACRO_MAIN: &str =
        "application/vnd.ms-powerpoint.presentation.macroEnabled.main+xml";
    pub const PML_SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const PML_SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const PML_SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const PML_NOTES_SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
    pub const PML_NOTES_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml";

    // Generic XML
    pub const XML: &str = "application/xml";
}

/// XML namespace URIs used in OPC packages
pub mod namespace {
    /// Office relationships namespace (the `r:` prefix in part content)
    pub const OFC_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    /// OPC relationships namespace
    pub const OPC_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships";

    /// OPC content types namespace
    pub const OPC_CONTENT_TYPES: &str =
        "http://schemas.openxmlformats.org/package/2006/content-types";

    /// PresentationML main namespace
    pub const PML_MAIN: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
}

/// Open XML relationship target modes
pub mod target_mode {
    /// Internal relationship target mode (default)
    pub const INTERNAL: &str = "Internal";

    /// External relationship target mode (e.g., hyperlinks to external URLs)
    pub const EXTERNAL: &str = "External";
}

/// Relationship type URIs used in OPC packages
pub mod relationship_type {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

    // Presentation parts
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";

    // Images and media
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

    // Chart and embeddings
    pub const CHART: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
    pub const PACKAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/package";

    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
}

/// Extension (lowercase, no leading period) to content type, for parts the
/// package manifest does not resolve.
pub static EXTENSION_CONTENT_TYPES: phf::Map<&'static str, &'static str> = phf_map! {
    "rels" => content_type::OPC_RELATIONSHIPS,
    "xml" => content_type::XML,
    "bmp" => content_type::BMP,
    "gif" => content_type::GIF,
    "jpg" => content_type::JPEG,
    "jpeg" => content_type::JPEG,
    "png" => content_type::PNG,
    "svg" => content_type::SVG,
    "tif" => content_type::TIFF,
    "tiff" => content_type::TIFF,
    "webp" => content_type::WEBP,
    "wdp" => content_type::MS_PHOTO,
    "emf" => content_type::X_EMF,
    "wmf" => content_type::X_WMF,
    "mp3" => content_type::MP3,
    "wav" => content_type::WAV,
    "mp4" => content_type::MP4,
    "bin" => content_type::OFC_OLE_OBJECT,
    "vml" => content_type::OFC_VML_DRAWING,
    "xlsx" => content_type::SML_SHEET,
};

/// Whether an extension/content-type pair is declared through a `Default`
/// element rather than a per-part `Override`.
pub fn is_default_content_type(ext: &str, content_type: &str) -> bool {
    matches!(
        (ext, content_type),
        ("rels", content_type::OPC_RELATIONSHIPS)
            | ("xml", content_type::XML)
            | ("bmp", content_type::BMP)
            | ("gif", content_type::GIF)
            | ("jpg", content_type::JPEG)
            | ("jpeg", content_type::JPEG)
            | ("png", content_type::PNG)
            | ("svg", content_type::SVG)
            | ("tif", content_type::TIFF)
            | ("tiff", content_type::TIFF)
            | ("webp", content_type::WEBP)
            | ("wdp", content_type::MS_PHOTO)
            | ("emf", content_type::X_EMF)
            | ("wmf", content_type::X_WMF)
            | ("mp3", content_type::MP3)
            | ("wav", content_type::WAV)
            | ("mp4", content_type::MP4)
            | ("bin", content_type::OFC_OLE_OBJECT)
            | ("vml", content_type::OFC_VML_DRAWING)
            | ("xlsx", content_type::SML_SHEET)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_table() {
        assert_eq!(EXTENSION_CONTENT_TYPES.get("png"), Some(&content_type::PNG));
        assert_eq!(EXTENSION_CONTENT_TYPES.get("jpeg"), Some(&content_type::JPEG));
        assert_eq!(EXTENSION_CONTENT_TYPES.get("foo"), None);
    }

    #[test]
    fn test_default_pairs() {
        assert!(is_default_content_type("png", "image/png"));
        assert!(!is_default_content_type("xml", content_type::PML_SLIDE));
    }
}
