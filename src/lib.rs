//! pptx-compose - Compose PowerPoint presentations from existing decks
//!
//! A .pptx file is an OPC package: a zip container of parts linked by
//! relationships and typed by a content-type manifest. This crate imports
//! slides between packages together with every part they depend on
//! (layouts, masters, themes, media, charts, embedded workbooks), renaming
//! copies so nothing collides and keeping relationship tables, slide lists
//! and the content-type manifest consistent.
//!
//! # Example - Combining decks
//!
//! ```no_run
//! use pptx_compose::Package;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut deck = Package::open("deck.pptx")?;
//! let appendix = Package::open("appendix.pptx")?;
//!
//! for slide in appendix.slides() {
//!     println!("importing {} ({})", slide.name()?, slide.partname());
//! }
//! deck.add_slides(appendix.slides())?;
//! deck.save_as("deck-with-appendix.pptx")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Options
//!
//! ```no_run
//! use pptx_compose::{ComposeOptions, Package};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ComposeOptions::from_yaml_str("working_dir: /var/tmp\nreuse_identical_parts: false\n")?;
//! let deck = Package::open_with_options("deck.pptx", options)?;
//! assert!(deck.validate()?.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ooxml;

pub use config::{ComposeOptions, Compression};
pub use error::{Error, Result};
pub use ooxml::pptx::{GraphIssue, Package, Presentation, Slide, TemplateData};
