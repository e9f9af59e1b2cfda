//! The build-side pipeline: extract, assign references, serialize, write.
//!
//! Nothing in here aborts a documentation build. Malformed rows are skipped, a missing
//! text engine degrades to a table-only bundle, and a failed write is reported in the
//! [`BuildReport`] instead of being returned as an error.

use crate::bundle::{IndexBundle, digest, write_bundle};
use crate::config::Config;
use crate::entry::{EntryDraft, EntrySet};
use crate::error::{BundleWriteError, IndexBuildUnavailable, MalformedEntryWarning};
use crate::extract::{EntryExtractor, ExtractOptions, Extraction};
use crate::reference::ReferenceAssigner;
use crate::search::build_index;
use crate::source::GeneratorIndex;
use std::path::{Path, PathBuf};

/// Whether the text engine can pre-build an index for this build.
///
/// Resolved once up front; later stages branch on it rather than probing again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCapability {
    Available,
    Unavailable(IndexBuildUnavailable),
}

impl EngineCapability {
    pub fn resolve(config: &Config) -> Self {
        if config.prebuild_index {
            Self::Available
        } else {
            Self::Unavailable(IndexBuildUnavailable {
                reason: "disabled by `prebuild_index = false`".to_string(),
            })
        }
    }

    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// A serialized bundle ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedBundle {
    pub json: String,
    pub digest: String,
    /// Whether the image carries a pre-built text index.
    pub prebuilt: bool,
    pub entries: usize,
}

/// The three build stages, swappable for tests or alternative engines.
pub trait IndexBuilder {
    fn extract(&self, source: &GeneratorIndex) -> Extraction;

    fn assign_references(&self, drafts: Vec<EntryDraft>) -> EntrySet {
        ReferenceAssigner::new().assign_all(drafts)
    }

    fn serialize(&self, entries: &EntrySet) -> serde_json::Result<SerializedBundle>;
}

/// Default builder: BM25 text index plus back-reference table in one JSON bundle.
#[derive(Debug, Clone)]
pub struct LunrIndexBuilder {
    options: ExtractOptions,
    capability: EngineCapability,
}

impl LunrIndexBuilder {
    pub const fn new(options: ExtractOptions, capability: EngineCapability) -> Self {
        Self {
            options,
            capability,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.extract_options(), EngineCapability::resolve(config))
    }
}

impl IndexBuilder for LunrIndexBuilder {
    fn extract(&self, source: &GeneratorIndex) -> Extraction {
        EntryExtractor::new(source, self.options).extract()
    }

    fn serialize(&self, entries: &EntrySet) -> serde_json::Result<SerializedBundle> {
        let index = match &self.capability {
            EngineCapability::Available => Some(build_index(entries)),
            EngineCapability::Unavailable(why) => {
                tracing::info!("{}; shipping back-reference table only", why);
                None
            }
        };
        let prebuilt = index.is_some();
        let json = IndexBundle::new(index, entries).to_json()?;
        Ok(SerializedBundle {
            digest: digest(&json),
            json,
            prebuilt,
            entries: entries.len(),
        })
    }
}

/// What a build produced. Search is deployed only when `write_error` is `None`.
#[derive(Debug)]
pub struct BuildReport {
    pub entries: usize,
    pub warnings: Vec<MalformedEntryWarning>,
    pub prebuilt: bool,
    pub digest: Option<String>,
    pub bundle_path: PathBuf,
    pub write_error: Option<BundleWriteError>,
}

impl BuildReport {
    pub const fn is_deployed(&self) -> bool {
        self.write_error.is_none()
    }
}

/// Runs every stage and writes the bundle under `out_dir`.
pub fn build_bundle(
    builder: &impl IndexBuilder,
    source: &GeneratorIndex,
    out_dir: &Path,
    bundle_path: &Path,
) -> BuildReport {
    let Extraction { drafts, warnings } = builder.extract(source);
    let entries = builder.assign_references(drafts);
    let bundle_path = out_dir.join(bundle_path);

    let serialized = match builder.serialize(&entries) {
        Ok(serialized) => serialized,
        Err(e) => {
            let error = BundleWriteError {
                path: bundle_path.clone(),
                source: std::io::Error::other(e),
            };
            tracing::warn!("{}; search will be unavailable", error);
            return BuildReport {
                entries: entries.len(),
                warnings,
                prebuilt: false,
                digest: None,
                bundle_path,
                write_error: Some(error),
            };
        }
    };

    let write_error = write_bundle(&bundle_path, &serialized.json).err();
    if let Some(error) = &write_error {
        tracing::warn!("{}; search will be unavailable", error);
    } else {
        tracing::info!(
            "Search bundle: {} entries, {} skipped, digest {}",
            serialized.entries,
            warnings.len(),
            serialized.digest
        );
    }

    BuildReport {
        entries: serialized.entries,
        warnings,
        prebuilt: serialized.prebuilt,
        digest: Some(serialized.digest),
        bundle_path,
        write_error,
    }
}

/// Builds with the default builder as configured.
pub fn build(source: &GeneratorIndex, config: &Config, out_dir: &Path) -> BuildReport {
    build_bundle(
        &LunrIndexBuilder::from_config(config),
        source,
        out_dir,
        &config.bundle_path,
    )
}
