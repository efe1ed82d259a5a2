//! Physical package access: a byte store keyed by partname.
//!
//! [`ArchiveStore`] is the seam between the part graph and the container
//! format. [`MemoryStore`] keeps entries as reference-counted buffers, so a
//! clone is a cheap point-in-time view. [`ZipStore`] is a file-backed working
//! copy: it is read into memory when opened and rewritten on [`ZipStore::flush`].

use crate::config::Compression;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PackURI};
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// Byte-level read/write/enumerate over a package container.
pub trait ArchiveStore {
    /// Bytes of the part, or [`OpcError::MissingPart`].
    fn read(&self, partname: &PackURI) -> Result<Bytes>;

    /// Create or replace a part.
    fn write(&mut self, partname: &PackURI, blob: Bytes) -> Result<()>;

    fn exists(&self, partname: &PackURI) -> Result<bool>;

    /// Every partname in the store.
    fn list(&self) -> Result<BTreeSet<PackURI>>;
}

/// Package entries held in memory, keyed by member name.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Bytes>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decompress every file entry of a zip archive.
    pub fn from_zip<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut entries = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').replace('\\', "/");
            let mut data = Vec::with_capacity(capacity_hint(file.size()));
            file.read_to_end(&mut data)?;
            entries.insert(name, Bytes::from(data));
        }
        Ok(Self { entries })
    }

    /// Write all entries as a zip archive. `[Content_Types].xml` goes first,
    /// the rest follow in member-name order.
    pub fn write_zip<W: Write + Seek>(&self, writer: W, compression: Compression) -> Result<W> {
        let mut zip = zip::ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(match compression {
            Compression::Deflated => zip::CompressionMethod::Deflated,
            Compression::Stored => zip::CompressionMethod::Stored,
        });

        let content_types = &CONTENT_TYPES_URI[1..];
        let ordered = self
            .entries
            .get_key_value(content_types)
            .into_iter()
            .chain(self.entries.iter().filter(|(name, _)| name.as_str() != content_types));
        for (name, blob) in ordered {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(blob)?;
        }
        Ok(zip.finish()?)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Most bytes reserved up front for one entry. Entries declaring more grow
/// as they are read.
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Buffer size to reserve for an entry whose header declares `declared`
/// uncompressed bytes.
fn capacity_hint(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOC)).unwrap_or(0)
}

impl ArchiveStore for MemoryStore {
    fn read(&self, partname: &PackURI) -> Result<Bytes> {
        self.entries
            .get(partname.membername())
            .cloned()
            .ok_or_else(|| OpcError::MissingPart(partname.to_string()))
    }

    fn write(&mut self, partname: &PackURI, blob: Bytes) -> Result<()> {
        self.entries.insert(partname.membername().to_string(), blob);
        Ok(())
    }

    fn exists(&self, partname: &PackURI) -> Result<bool> {
        Ok(self.entries.contains_key(partname.membername()))
    }

    fn list(&self) -> Result<BTreeSet<PackURI>> {
        self.entries
            .keys()
            .map(|name| PackURI::from_membername(name))
            .collect()
    }
}

/// The working copy of a package on disk.
#[derive(Debug)]
pub struct ZipStore {
    path: PathBuf,
    entries: MemoryStore,
    compression: Compression,
    dirty: bool,
}

impl ZipStore {
    /// Open the zip file at `path`.
    pub fn open<P: AsRef<Path>>(path: P, compression: Compression) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let entries = MemoryStore::from_zip(BufReader::new(file))?;
        tracing::debug!(path = %path.display(), parts = entries.len(), "opened working store");
        Ok(Self {
            path,
            entries,
            compression,
            dirty: false,
        })
    }

    /// Rewrite the zip file if anything was written since the last flush.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let file = File::create(&self.path)?;
        let mut writer = self.entries.write_zip(BufWriter::new(file), self.compression)?;
        writer.flush()?;
        self.dirty = false;
        tracing::debug!(path = %self.path.display(), parts = self.entries.len(), "flushed working store");
        Ok(())
    }

    /// Point-in-time view of the current entries.
    pub fn snapshot(&self) -> MemoryStore {
        self.entries.clone()
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl ArchiveStore for ZipStore {
    fn read(&self, partname: &PackURI) -> Result<Bytes> {
        self.entries.read(partname)
    }

    fn write(&mut self, partname: &PackURI, blob: Bytes) -> Result<()> {
        self.dirty = true;
        self.entries.write(partname, blob)
    }

    fn exists(&self, partname: &PackURI) -> Result<bool> {
        self.entries.exists(partname)
    }

    fn list(&self) -> Result<BTreeSet<PackURI>> {
        self.entries.list()
    }
}
