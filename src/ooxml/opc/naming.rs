//! Fresh partname allocation.

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{INDEX_PLACEHOLDER, PackURI};
use crate::ooxml::opc::phys_pkg::ArchiveStore;

/// Find the first partname `pattern` produces, counting up from `start`,
/// that the store does not contain.
///
/// `pattern` contains one [`INDEX_PLACEHOLDER`], e.g.
/// `/ppt/slides/slide%d.xml`. A pattern without a placeholder names a single
/// part and is returned only if that part is free. The search has no upper
/// bound; it ends because stores are finite.
///
/// The caller must write the returned part before allocating again, or the
/// same name comes back.
pub fn allocate(store: &dyn ArchiveStore, pattern: &str, start: u32) -> Result<PackURI> {
    let wrap = |source: OpcError| OpcError::NameAllocation {
        pattern: pattern.to_string(),
        source: Box::new(source),
    };

    if !pattern.contains(INDEX_PLACEHOLDER) {
        let partname = PackURI::new(pattern)?;
        return if store.exists(&partname).map_err(wrap)? {
            Err(OpcError::InvalidPackUri(format!(
                "'{}' has no index placeholder and is already taken",
                pattern
            )))
        } else {
            Ok(partname)
        };
    }

    let mut n = start;
    loop {
        let candidate = PackURI::new(pattern.replacen(INDEX_PLACEHOLDER, &n.to_string(), 1))?;
        if !store.exists(&candidate).map_err(wrap)? {
            tracing::debug!(pattern, partname = %candidate, "allocated partname");
            return Ok(candidate);
        }
        n = n.checked_add(1).ok_or_else(|| {
            OpcError::InvalidPackUri(format!("index space exhausted for '{}'", pattern))
        })?;
    }
}
