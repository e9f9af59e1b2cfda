//! Shared test fixtures and utilities for integration tests.
//!
//! Every test gets its own [`TempWorkspace`] so bundles written by one test never leak
//! into another. [`SAMPLE_INDEX`] is a small generator index covering Python and C++
//! objects, page titles and free-text terms, plus one malformed C++ row.

use lunrsearch::{Config, GeneratorIndex};
use rstest::fixture;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Generator search index used across integration tests.
///
/// Extraction order (and therefore references) for the default options:
/// 0 `ns::Widget::draw`, 1 `pkg.Reader`, 2 `pkg.load`, 3 `Reader.close`, 4 `Reader.read`,
/// then titles 5 `API Reference` (api), 6 `Installation`, 7 `API Reference` (refer),
/// 8 `Welcome`. `lonely` is skipped.
#[allow(dead_code)]
pub const SAMPLE_INDEX: &str = r#"{
    "docnames": ["api", "guide/install", "index"],
    "filenames": ["api.rst", "guide/install.rst", "index.rst"],
    "titles": ["API Reference", "Installation", "Welcome"],
    "objects": {
        "": {
            "lonely": [0, 3, 1, "lonely"],
            "ns::Widget::draw": [0, 3, 1, "_CPPv4N2ns6Widget4drawEv"]
        },
        "pkg": {
            "Reader": [0, 2, 1, "pkg.Reader"],
            "load": [0, 1, 1, "pkg.load"]
        },
        "pkg.Reader": {
            "close": [0, 0, 1, "pkg.Reader.close"],
            "read": [0, 0, 1, "pkg.Reader.read"]
        }
    },
    "objtypes": {"0": "py:method", "1": "py:function", "2": "py:class", "3": "cpp:function"},
    "objnames": {"0": ["py", "method", "Python method"]},
    "titleterms": {"api": 0, "instal": 1, "refer": 0, "welcom": 2},
    "terms": {"load": 0, "reader": [0, 2]}
}"#;

/// A temporary workspace directory for test isolation.
///
/// Removed when dropped.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file, and its parent directories, within this workspace.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
        full_path
    }

    /// Reads a file from this workspace.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read_file(&self, path: &Path) -> String {
        std::fs::read_to_string(self.root.join(path))
            .unwrap_or_else(|e| panic!("Failed to read '{}': {}", path.display(), e))
    }

    /// Output directory for a build.
    pub fn out_dir(&self) -> PathBuf {
        self.root.join("_build/html")
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// A workspace holding `searchindex.json` with [`SAMPLE_INDEX`].
#[allow(dead_code)]
pub struct SampleProject {
    pub workspace: TempWorkspace,
    pub index_path: PathBuf,
}

#[allow(dead_code)]
impl SampleProject {
    pub fn new() -> Self {
        let workspace = TempWorkspace::new();
        let index_path = workspace.create_file("_build/searchindex.json", SAMPLE_INDEX);
        Self {
            workspace,
            index_path,
        }
    }

    pub fn source(&self) -> GeneratorIndex {
        GeneratorIndex::load(&self.index_path).expect("sample index should parse")
    }

    /// Builds with `config` and returns the written bundle bytes.
    pub fn build(&self, config: &Config) -> Vec<u8> {
        let report = lunrsearch::build(&self.source(), config, &self.workspace.out_dir());
        assert!(report.is_deployed(), "bundle write failed: {:?}", report.write_error);
        std::fs::read(&report.bundle_path).expect("bundle should exist after a build")
    }
}

#[fixture]
pub fn sample_project() -> SampleProject {
    lunrsearch::tracing::init(false);
    SampleProject::new()
}
