//! PowerPoint (.pptx) presentation composition.
//!
//! - [`Package`]: an open .pptx file with its working copy
//! - [`Presentation`]: the slide list in `ppt/presentation.xml`
//! - [`Slide`]: a slide part and the snapshot its dependencies resolve against
//! - [`TemplateData`]: placeholder values for [`Package::template`]
//!
//! # Example
//!
//! ```rust,no_run
//! use pptx_compose::ooxml::pptx::{Package, TemplateData};
//! use std::collections::HashMap;
//!
//! let mut report = Package::open("report.pptx")?;
//! let library = Package::open("library.pptx")?;
//!
//! // Append the second slide of the library deck
//! report.add_slide(&library.slides()[1])?;
//!
//! let values = HashMap::from([("{{quarter}}".to_string(), "Q3".to_string())]);
//! report.template(TemplateData::Values(&values))?;
//! report.save()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod package;
pub mod presentation;
pub mod slide;
pub mod template;

pub use package::{GraphIssue, Package};
pub use presentation::Presentation;
pub use slide::Slide;
pub use template::TemplateData;
