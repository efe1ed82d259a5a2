//! Office Open XML (OOXML) package handling.
//!
//! The implementation is organized in two layers:
//!
//! 1. **OPC Layer** (`opc`): parts, relationships, content types and the
//!    byte stores behind them
//! 2. **PresentationML** (`pptx`): presentations, slides and slide import
pub mod opc;
pub mod pptx;

// Re-export commonly used types from OPC layer
pub use opc::{PackURI, PackageSnapshot};
