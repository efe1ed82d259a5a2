//! Minimal .pptx packages built in-test with the zip writer.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

pub const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// One slide of a fixture deck.
#[derive(Debug, Clone, Default)]
pub struct SlideFixture {
    pub text: String,
    pub image: Option<Vec<u8>>,
    pub chart: bool,
    pub notes: bool,
    pub hyperlink: Option<String>,
}

impl SlideFixture {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn with_image(mut self, bytes: &[u8]) -> Self {
        self.image = Some(bytes.to_vec());
        self
    }

    pub fn with_chart(mut self) -> Self {
        self.chart = true;
        self
    }

    pub fn with_notes(mut self) -> Self {
        self.notes = true;
        self
    }

    pub fn with_hyperlink(mut self, url: &str) -> Self {
        self.hyperlink = Some(url.to_string());
        self
    }
}

/// A deck with one master, one layout and one theme.
#[derive(Debug, Clone, Default)]
pub struct DeckBuilder {
    slides: Vec<SlideFixture>,
    /// Extra images already in `ppt/media`, not referenced by any slide.
    loose_media: Vec<(String, Vec<u8>)>,
    /// Distinguishes this deck's layout from other decks' byte for byte.
    layout_name: String,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self {
            layout_name: "Title and Content".to_string(),
            ..Self::default()
        }
    }

    pub fn slide(mut self, slide: SlideFixture) -> Self {
        self.slides.push(slide);
        self
    }

    pub fn layout_name(mut self, name: &str) -> Self {
        self.layout_name = name.to_string();
        self
    }

    pub fn loose_media(mut self, name: &str, bytes: &[u8]) -> Self {
        self.loose_media.push((name.to_string(), bytes.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut entries: Vec<(String, Vec<u8>)> = Vec::new();
        let mut overrides = vec![
            ("/ppt/presentation.xml", "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml".to_string()),
            ("/ppt/slideMasters/slideMaster1.xml", "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml".to_string()),
            ("/ppt/slideLayouts/slideLayout1.xml", "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml".to_string()),
            ("/ppt/theme/theme1.xml", "application/vnd.openxmlformats-officedocument.theme+xml".to_string()),
        ]
        .into_iter()
        .map(|(p, c)| (p.to_string(), c))
        .collect::<Vec<_>>();
        let mut has_png = !self.loose_media.is_empty();
        let mut has_xlsx = false;

        entries.push((
            "_rels/.rels".into(),
            rels(&[("rId1", "officeDocument", "ppt/presentation.xml", false)]).into_bytes(),
        ));

        let mut pres_rels = vec![
            ("rId1".to_string(), "slideMaster", "slideMasters/slideMaster1.xml".to_string()),
            ("rId2".to_string(), "theme", "theme/theme1.xml".to_string()),
        ];
        let mut sld_ids = String::new();
        let mut image_index = self.loose_media.len();
        let mut chart_index = 0;
        let mut notes_index = 0;

        for (i, fixture) in self.slides.iter().enumerate() {
            let n = i + 1;
            let r_id = format!("rId{}", n + 2);
            pres_rels.push((r_id.clone(), "slide", format!("slides/slide{}.xml", n)));
            sld_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 255 + n, r_id));

            let mut slide_rels: Vec<(String, String, String, bool)> = vec![(
                "rId1".into(),
                "slideLayout".into(),
                "../slideLayouts/slideLayout1.xml".into(),
                false,
            )];
            let mut body = format!(
                r#"<p:sp><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
                fixture.text
            );

            if let Some(image) = &fixture.image {
                image_index += 1;
                has_png = true;
                let r = format!("rId{}", slide_rels.len() + 1);
                slide_rels.push((r.clone(), "image".into(), format!("../media/image{}.png", image_index), false));
                entries.push((format!("ppt/media/image{}.png", image_index), image.clone()));
                body.push_str(&format!(r#"<p:pic><p:blipFill><a:blip r:embed="{}"/></p:blipFill></p:pic>"#, r));
            }
            if fixture.chart {
                chart_index += 1;
                has_xlsx = true;
                let r = format!("rId{}", slide_rels.len() + 1);
                slide_rels.push((r.clone(), "chart".into(), format!("../charts/chart{}.xml", chart_index), false));
                body.push_str(&format!(
                    r#"<p:graphicFrame><a:graphic><a:graphicData><c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" r:id="{}"/></a:graphicData></a:graphic></p:graphicFrame>"#,
                    r
                ));
                entries.push((
                    format!("ppt/charts/chart{}.xml", chart_index),
                    format!(
                        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:r="{}"><c:externalData r:id="rId1"/><c:title>Chart {}</c:title></c:chartSpace>"#,
                        REL, chart_index
                    )
                    .into_bytes(),
                ));
                entries.push((
                    format!("ppt/charts/_rels/chart{}.xml.rels", chart_index),
                    rels(&[(
                        "rId1",
                        "package",
                        &format!("../embeddings/Microsoft_Excel_Worksheet{}.xlsx", chart_index),
                        false,
                    )])
                    .into_bytes(),
                ));
                entries.push((
                    format!("ppt/embeddings/Microsoft_Excel_Worksheet{}.xlsx", chart_index),
                    format!("PK-workbook-{}", chart_index).into_bytes(),
                ));
                overrides.push((
                    format!("/ppt/charts/chart{}.xml", chart_index),
                    "application/vnd.openxmlformats-officedocument.drawingml.chart+xml".into(),
                ));
            }
            if fixture.notes {
                notes_index += 1;
                let r = format!("rId{}", slide_rels.len() + 1);
                slide_rels.push((r, "notesSlide".into(), format!("../notesSlides/notesSlide{}.xml", notes_index), false));
                entries.push((
                    format!("ppt/notesSlides/notesSlide{}.xml", notes_index),
                    format!(
                        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes {}><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>Speaker notes</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:notes>"#,
                        NS
                    )
                    .into_bytes(),
                ));
                entries.push((
                    format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", notes_index),
                    rels(&[("rId1", "slide", &format!("../slides/slide{}.xml", n), false)]).into_bytes(),
                ));
                overrides.push((
                    format!("/ppt/notesSlides/notesSlide{}.xml", notes_index),
                    "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml".into(),
                ));
            }
            if let Some(url) = &fixture.hyperlink {
                let r = format!("rId{}", slide_rels.len() + 1);
                slide_rels.push((r.clone(), "hyperlink".into(), url.clone(), true));
                body.push_str(&format!(
                    r#"<p:sp><p:txBody><a:p><a:r><a:rPr><a:hlinkClick r:id="{}"/></a:rPr><a:t>link</a:t></a:r></a:p></p:txBody></p:sp>"#,
                    r
                ));
            }

            entries.push((
                format!("ppt/slides/slide{}.xml", n),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {}><p:cSld name="Slide {}"><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
                    NS, n, body
                )
                .into_bytes(),
            ));
            let slide_rels: Vec<(&str, &str, &str, bool)> = slide_rels
                .iter()
                .map(|(a, b, c, d)| (a.as_str(), b.as_str(), c.as_str(), *d))
                .collect();
            entries.push((format!("ppt/slides/_rels/slide{}.xml.rels", n), rels(&slide_rels).into_bytes()));
            overrides.push((
                format!("/ppt/slides/slide{}.xml", n),
                "application/vnd.openxmlformats-officedocument.presentationml.slide+xml".into(),
            ));
        }

        for (name, bytes) in &self.loose_media {
            entries.push((format!("ppt/media/{}", name), bytes.clone()));
        }

        entries.push((
            "ppt/presentation.xml".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{}<p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
                NS,
                if sld_ids.is_empty() {
                    String::new()
                } else {
                    format!("<p:sldIdLst>{}</p:sldIdLst>", sld_ids)
                }
            )
            .into_bytes(),
        ));
        let pres_rels: Vec<(&str, &str, &str, bool)> = pres_rels
            .iter()
            .map(|(a, b, c)| (a.as_str(), *b, c.as_str(), false))
            .collect();
        entries.push(("ppt/_rels/presentation.xml.rels".into(), rels(&pres_rels).into_bytes()));

        entries.push((
            "ppt/slideMasters/slideMaster1.xml".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster {}><p:cSld><p:spTree/></p:cSld><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#,
                NS
            )
            .into_bytes(),
        ));
        entries.push((
            "ppt/slideMasters/_rels/slideMaster1.xml.rels".into(),
            rels(&[
                ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml", false),
                ("rId2", "theme", "../theme/theme1.xml", false),
            ])
            .into_bytes(),
        ));
        entries.push((
            "ppt/slideLayouts/slideLayout1.xml".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout {}><p:cSld name="{}"><p:spTree/></p:cSld></p:sldLayout>"#,
                NS, self.layout_name
            )
            .into_bytes(),
        ));
        entries.push((
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels".into(),
            rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml", false)]).into_bytes(),
        ));
        entries.push((
            "ppt/theme/theme1.xml".into(),
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"/>"#
                .to_vec(),
        ));

        let mut types = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>"#,
        );
        if has_png {
            types.push_str(r#"<Default Extension="png" ContentType="image/png"/>"#);
        }
        if has_xlsx {
            types.push_str(r#"<Default Extension="xlsx" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"/>"#);
        }
        for (partname, content_type) in &overrides {
            types.push_str(&format!(r#"<Override PartName="{}" ContentType="{}"/>"#, partname, content_type));
        }
        types.push_str("</Types>");

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(types.as_bytes()).unwrap();
        for (name, bytes) in &entries {
            zip.start_file(name.as_str(), options).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

fn rels(entries: &[(&str, &str, &str, bool)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (id, kind, target, external) in entries {
        let reltype = format!("{}/{}", REL, kind);
        let mode = if *external { r#" TargetMode="External""# } else { "" };
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
            id, reltype, target, mode
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Names of every entry in a zip file.
pub fn entry_names(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    archive.file_names().map(str::to_string).collect()
}

/// Bytes of one entry in a zip file.
pub fn read_entry(path: &Path, name: &str) -> Vec<u8> {
    use std::io::Read;
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).unwrap();
    bytes
}
