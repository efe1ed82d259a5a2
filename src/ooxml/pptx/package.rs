/// Package implementation for PowerPoint presentations.
use crate::config::{ComposeOptions, Compression};
use crate::error::{Error, Result};
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::content_types::ContentTypeRegistry;
use crate::ooxml::opc::error::OpcError;
use crate::ooxml::opc::naming;
use crate::ooxml::opc::package::PackageSnapshot;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{Part, Resource, XmlPart};
use crate::ooxml::opc::phys_pkg::{ArchiveStore, ZipStore};
use crate::ooxml::pptx::presentation::Presentation;
use crate::ooxml::pptx::slide::Slide;
use crate::ooxml::pptx::template::TemplateData;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// A PowerPoint (.pptx) package open for composition.
///
/// The source file is never modified until [`Package::save`]. All changes go
/// to an isolated working copy that is removed when the package is dropped.
/// Every slide import ends with a commit: the working copy is rewritten and
/// the whole graph is read back from it.
///
/// # Examples
///
/// ```rust,no_run
/// use pptx_compose::Package;
///
/// let mut deck = Package::open("deck.pptx")?;
/// let extras = Package::open("extras.pptx")?;
///
/// deck.add_slides(extras.slides())?;
/// deck.save_as("combined.pptx")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Package {
    source_path: PathBuf,
    options: ComposeOptions,
    working: NamedTempFile,
    store: ZipStore,
    content_types: ContentTypeRegistry,
    presentation: Presentation,
    slides: Vec<Slide>,
    snapshot: Arc<PackageSnapshot>,
}

/// A consistency problem in the part graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphIssue {
    /// XML content references a relationship id its table does not declare.
    DanglingRelationship { part: PackURI, r_id: String },
    /// An internal relationship points at a part the package does not contain.
    MissingTarget {
        part: PackURI,
        r_id: String,
        target: PackURI,
    },
    /// No content type resolves for a part.
    MissingContentType { part: PackURI },
}

/// The in-memory graph derived from the working copy.
struct Loaded {
    store: ZipStore,
    content_types: ContentTypeRegistry,
    presentation: Presentation,
    slides: Vec<Slide>,
    snapshot: Arc<PackageSnapshot>,
}

impl Package {
    /// Open a .pptx package with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ComposeOptions::default())
    }

    /// Open a .pptx package.
    ///
    /// The file is copied to a working location first. Fails with
    /// [`Error::PackageOpen`] if the copy cannot be made, the archive cannot
    /// be read, or the content-type manifest or presentation part is missing.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ComposeOptions) -> Result<Self> {
        let source_path = path.as_ref().to_path_buf();
        let working = Self::create_working_copy(&source_path, &options)
            .map_err(|e| Error::package_open(&source_path, OpcError::IoError(e)))?;
        let loaded = Self::load(working.path(), options.compression)
            .map_err(|e| Error::package_open(&source_path, e))?;

        tracing::info!(
            path = %source_path.display(),
            working = %working.path().display(),
            slides = loaded.slides.len(),
            "opened package"
        );

        Ok(Self {
            source_path,
            options,
            working,
            store: loaded.store,
            content_types: loaded.content_types,
            presentation: loaded.presentation,
            slides: loaded.slides,
            snapshot: loaded.snapshot,
        })
    }

    fn create_working_copy(source: &Path, options: &ComposeOptions) -> std::io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&options.working_prefix).suffix(".pptx");
        let working = match &options.working_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        std::fs::copy(source, working.path())?;
        Ok(working)
    }

    /// Read the working copy at `path` and derive the slide list from the
    /// presentation's slide references.
    fn load(path: &Path, compression: Compression) -> std::result::Result<Loaded, OpcError> {
        let store = ZipStore::open(path, compression)?;
        let snapshot = PackageSnapshot::new(store.snapshot())?;

        let main = snapshot.main_document_partname()?;
        let content_type = snapshot.content_types().resolve(&main).map(str::to_string);
        let presentation = Presentation::new(XmlPart::load(snapshot.store(), main, content_type)?);

        let snapshot = Arc::new(snapshot);
        let partnames = presentation.slide_partnames().map_err(|e| match e {
            Error::Opc(e) => e,
            other => OpcError::XmlError(other.to_string()),
        })?;

        let mut slides = Vec::with_capacity(partnames.len());
        for partname in partnames {
            match snapshot.load(&partname)? {
                Resource::Slide(part) | Resource::Xml(part) => {
                    slides.push(Slide::new(part, Arc::clone(&snapshot)));
                },
                Resource::Blob(_) => {
                    return Err(OpcError::InvalidRelationship(format!(
                        "slide reference {} is not an XML part",
                        partname
                    )));
                },
            }
        }

        let content_types = snapshot.content_types().clone();
        Ok(Loaded {
            store,
            content_types,
            presentation,
            slides,
            snapshot,
        })
    }

    /// Slides in presentation order.
    #[inline]
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    #[inline]
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    #[inline]
    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    #[inline]
    pub fn content_types(&self) -> &ContentTypeRegistry {
        &self.content_types
    }

    /// The working store, as of the last write.
    #[inline]
    pub fn store(&self) -> &ZipStore {
        &self.store
    }

    /// The committed state the current slides were loaded from.
    #[inline]
    pub fn snapshot(&self) -> &Arc<PackageSnapshot> {
        &self.snapshot
    }

    #[inline]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    #[inline]
    pub fn working_path(&self) -> &Path {
        self.working.path()
    }

    #[inline]
    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Import `slide`, with every part it depends on, as the last slide.
    ///
    /// Dependencies that already exist in this package byte for byte (same
    /// directory and extension) are shared instead of copied, unless
    /// [`ComposeOptions::reuse_identical_parts`] is off. Copies are given
    /// fresh partnames; relationship ids inside copied parts are kept and
    /// their targets rewritten to the new locations.
    ///
    /// Copied slide masters and notes masters are not listed in the
    /// presentation's `sldMasterIdLst` or `notesMasterIdLst`, nor related
    /// from it. When the source's masters differ from this package's,
    /// PowerPoint may offer to repair the result. Each such copy is logged
    /// at warn level.
    ///
    /// A failure part way leaves the working copy partially modified;
    /// reopen the package from its source in that case.
    pub fn add_slide(&mut self, slide: &Slide) -> Result<&mut Self> {
        let source = Arc::clone(slide.source());
        let root = slide.partname().clone();

        // Source partname to its partname in this package.
        let mut targets: HashMap<PackURI, PackURI> = HashMap::new();
        let existing = if self.options.reuse_identical_parts {
            self.store.list()?
        } else {
            BTreeSet::new()
        };

        let dependents = source.traverse(slide.part(), |resource| {
            if Self::belongs_to(resource.as_part(), &root) {
                return Ok(true);
            }
            match self.find_identical(&source, resource.partname(), &existing)? {
                Some(found) => {
                    tracing::debug!(source = %resource.partname(), target = %found, "reusing identical part");
                    targets.insert(resource.partname().clone(), found);
                    Ok(false)
                },
                None => Ok(true),
            }
        })?;
        let copies: Vec<Resource> = dependents
            .into_iter()
            .filter(|resource| !targets.contains_key(resource.partname()))
            .collect();

        // Allocate every name up front, writing each one before the next
        // allocation so no two copies collide. Dependents are never edited,
        // so their source bytes are the final body.
        for resource in &copies {
            let part = resource.as_part();
            let blob = source.store().read(part.partname())?;
            let name = self.reserve(&part.pattern(), blob)?;
            targets.insert(part.partname().clone(), name);
        }
        let slide_name = self.reserve(&slide.part().pattern(), slide.part().blob())?;
        targets.insert(root.clone(), slide_name.clone());

        for mut resource in copies {
            let source_name = resource.partname().clone();
            let part = resource.as_part_mut();
            let target = Self::relocate(part, &targets)?;
            let part: &dyn Part = part;
            part.save_rels(&mut self.store)?;
            self.register_content_type(part, part.content_type())?;
            if Self::is_master(part) {
                tracing::warn!(source = %source_name, %target, "copied master is not listed in the presentation");
            }
            tracing::debug!(source = %source_name, %target, "copied part");
        }

        let mut copy = slide.part().clone();
        Self::relocate(&mut copy, &targets)?;
        copy.save(&mut self.store)?;
        self.register_content_type(&copy, copy.content_type().or(Some(ct::PML_SLIDE)))?;

        let (r_id, id) = self.presentation.add_slide(&slide_name)?;
        self.presentation.part().save(&mut self.store)?;
        self.content_types.save(&mut self.store)?;

        tracing::info!(
            source = %root,
            slide = %slide_name,
            %r_id,
            id,
            parts = targets.len(),
            "added slide"
        );
        self.commit()?;
        Ok(self)
    }

    /// [`add_slide`](Self::add_slide) for each slide, in order.
    pub fn add_slides<'s, I>(&mut self, slides: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = &'s Slide>,
    {
        for slide in slides {
            self.add_slide(slide)?;
        }
        Ok(self)
    }

    /// Substitute placeholders in every slide and write the changed slides
    /// to the working copy. Returns the number of replacements.
    pub fn template(&mut self, data: TemplateData<'_>) -> Result<usize> {
        let mut replaced = 0;
        for (index, slide) in self.slides.iter_mut().enumerate() {
            let values = data.values_for(index);
            let count = slide.template(&values);
            if count > 0 {
                slide.part().save(&mut self.store)?;
                replaced += count;
            }
        }
        tracing::debug!(replaced, "templated slides");
        Ok(replaced)
    }

    /// Write the package to `path`. The package stays usable.
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.store.flush()?;
        std::fs::copy(self.working.path(), path)?;
        tracing::info!(path = %path.display(), slides = self.slides.len(), "saved package");
        self.refresh()
    }

    /// Overwrite the file the package was opened from.
    pub fn save(&mut self) -> Result<()> {
        let target = self.source_path.clone();
        self.save_as(target)
    }

    /// Check the working copy for dangling relationship ids, missing
    /// relationship targets and parts without a content type.
    pub fn validate(&self) -> Result<Vec<GraphIssue>> {
        let snapshot = PackageSnapshot::from_parts(self.store.snapshot(), self.content_types.clone());
        let manifest = ContentTypeRegistry::partname();
        let mut issues = Vec::new();

        for partname in snapshot.store().list()? {
            if partname == manifest {
                continue;
            }
            if snapshot.content_types().resolve(&partname).is_none() {
                issues.push(GraphIssue::MissingContentType {
                    part: partname.clone(),
                });
            }
            if partname.is_rels() {
                continue;
            }

            let resource = snapshot.load(&partname)?;
            let part = resource.as_part();
            for rel in part.rels().iter().filter(|rel| !rel.is_external()) {
                let target = rel.target_partname()?;
                if !snapshot.store().exists(&target)? {
                    issues.push(GraphIssue::MissingTarget {
                        part: partname.clone(),
                        r_id: rel.r_id().to_string(),
                        target,
                    });
                }
            }
            if let Resource::Slide(xml) | Resource::Xml(xml) = &resource {
                for r_id in xml.referenced_r_ids() {
                    if !r_id.is_empty() && part.rels().get(&r_id).is_none() {
                        issues.push(GraphIssue::DanglingRelationship {
                            part: partname.clone(),
                            r_id,
                        });
                    }
                }
            }
        }

        if !issues.is_empty() {
            tracing::warn!(count = issues.len(), "package graph has issues");
        }
        Ok(issues)
    }

    /// Rewrite the working copy and rebuild the graph from it.
    fn commit(&mut self) -> Result<()> {
        self.store.flush()?;
        self.refresh()?;
        tracing::info!(slides = self.slides.len(), "committed package");
        Ok(())
    }

    /// Reload everything from the working copy on disk.
    fn refresh(&mut self) -> Result<()> {
        let loaded = Self::load(self.working.path(), self.options.compression)?;
        self.store = loaded.store;
        self.content_types = loaded.content_types;
        self.presentation = loaded.presentation;
        self.slides = loaded.slides;
        self.snapshot = loaded.snapshot;
        Ok(())
    }

    /// Allocate a free partname for `pattern` and claim it with `blob`.
    fn reserve(&mut self, pattern: &str, blob: bytes::Bytes) -> Result<PackURI> {
        let name = naming::allocate(&self.store, pattern, 1)?;
        self.store.write(&name, blob)?;
        Ok(name)
    }

    /// Move `part` to its allocated name and point its internal
    /// relationships at the new locations of their targets.
    fn relocate(part: &mut dyn Part, targets: &HashMap<PackURI, PackURI>) -> Result<PackURI> {
        let new_name = targets
            .get(part.partname())
            .cloned()
            .ok_or_else(|| OpcError::MissingPart(part.partname().to_string()))?;

        let mut retargets = Vec::new();
        for rel in part.rels().iter().filter(|rel| !rel.is_external()) {
            let target = rel.target_partname()?;
            let relocated = match targets.get(&target) {
                Some(mapped) => mapped.clone(),
                None => {
                    tracing::warn!(part = %part.partname(), r_id = rel.r_id(), %target, "relationship target was not imported");
                    target
                },
            };
            retargets.push((rel.r_id().to_string(), relocated.relative_ref(new_name.base_uri())));
        }

        part.set_partname(new_name.clone());
        for (r_id, target_ref) in retargets {
            part.rels_mut().retarget(&r_id, target_ref)?;
        }
        Ok(new_name)
    }

    /// Declare content types for a copied part and its relationship part.
    fn register_content_type(&mut self, part: &dyn Part, content_type: Option<&str>) -> Result<()> {
        self.content_types.register(part.partname(), content_type);
        if !part.rels().is_empty() {
            let rels_uri = part.partname().rels_uri()?;
            self.content_types.register(&rels_uri, Some(ct::OPC_RELATIONSHIPS));
        }
        Ok(())
    }

    /// Whether `part` has a relationship back to `slide`, as notes slides
    /// do. Such parts are always copied with the slide.
    fn belongs_to(part: &dyn Part, slide: &PackURI) -> bool {
        part.rels()
            .iter()
            .filter(|rel| !rel.is_external())
            .any(|rel| rel.target_partname().is_ok_and(|target| &target == slide))
    }

    /// Whether `part` is a slide master or notes master.
    fn is_master(part: &dyn Part) -> bool {
        matches!(part.content_type(), Some(ct::PML_SLIDE_MASTER | ct::PML_NOTES_MASTER))
    }

    /// A part of this package with the same directory, extension and bytes
    /// as `partname` in `source`.
    fn find_identical(
        &self,
        source: &PackageSnapshot,
        partname: &PackURI,
        existing: &BTreeSet<PackURI>,
    ) -> std::result::Result<Option<PackURI>, OpcError> {
        let mut candidates = existing.iter().filter(|candidate| {
            candidate.base_uri() == partname.base_uri()
                && candidate.ext().eq_ignore_ascii_case(partname.ext())
        });
        let Some(first) = candidates.next() else {
            return Ok(None);
        };
        let bytes = source.store().read(partname)?;
        for candidate in std::iter::once(first).chain(candidates) {
            if self.store.read(candidate)? == bytes {
                return Ok(Some(candidate.clone()));
            }
        }
        Ok(None)
    }
}
