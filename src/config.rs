//! Build and presentation settings, read from `lunrsearch.toml`.

use crate::bundle::DEFAULT_BUNDLE_PATH;
use crate::error::Result;
use crate::extract::ExtractOptions;
use crate::render::{DedupPolicy, RenderOptions};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `highlight_matches` (`0` or `1`).
pub const HIGHLIGHT_ENV: &str = "LUNRSEARCH_HIGHLIGHT";

/// All keys are optional; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub highlight_matches: bool,
    /// Index free-text terms as well as objects and titles.
    pub include_terms: bool,
    /// Ship a pre-built text index. When off, clients index the entries themselves.
    pub prebuild_index: bool,
    /// Bundle location relative to the build output directory.
    pub bundle_path: PathBuf,
    pub url_root: String,
    pub file_suffix: String,
    pub max_results: usize,
    pub dedup: DedupPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            highlight_matches: true,
            include_terms: false,
            prebuild_index: true,
            bundle_path: PathBuf::from(DEFAULT_BUNDLE_PATH),
            url_root: String::new(),
            file_suffix: ".html".to_string(),
            max_results: 5,
            dedup: DedupPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid lunrsearch configuration")
    }

    /// Reads a config file and applies environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a config file.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(HIGHLIGHT_ENV) {
            self.apply_highlight_override(&value);
        }
    }

    fn apply_highlight_override(&mut self, value: &str) {
        match value.trim() {
            "1" | "true" | "on" => self.highlight_matches = true,
            "0" | "false" | "off" => self.highlight_matches = false,
            other => tracing::warn!("Ignoring {}={:?}: expected 0 or 1", HIGHLIGHT_ENV, other),
        }
    }

    pub const fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            include_terms: self.include_terms,
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            highlight: self.highlight_matches,
            url_root: self.url_root.clone(),
            file_suffix: self.file_suffix.clone(),
            dedup: self.dedup,
            max_results: self.max_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    #[test]
    fn empty_file_is_all_defaults() {
        let_assert!(Ok(config) = Config::from_toml(""));
        check!(config == Config::default());
        check!(config.bundle_path == Path::new("_static/js/lunrindex.json"));
    }

    #[test]
    fn keys_override_defaults() {
        let text = r#"
            highlight_matches = false
            include_terms = true
            url_root = "../"
            dedup = "source-file"
            max_results = 10
        "#;
        let_assert!(Ok(config) = Config::from_toml(text));
        check!(!config.highlight_matches);
        check!(config.extract_options().include_terms);
        check!(config.prebuild_index);

        let options = config.render_options();
        check!(options.url_root == "../");
        check!(options.dedup == DedupPolicy::SourceFile);
        check!(options.max_results == 10);
        check!(options.file_suffix == ".html");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        check!(Config::from_toml("hightlight = true").is_err());
    }

    #[rstest]
    #[case("0", true, false)]
    #[case("1", false, true)]
    #[case("off", true, false)]
    #[case("maybe", true, true)]
    #[case("maybe", false, false)]
    fn highlight_override(#[case] value: &str, #[case] initial: bool, #[case] expected: bool) {
        let mut config = Config {
            highlight_matches: initial,
            ..Config::default()
        };
        config.apply_highlight_override(value);
        check!(config.highlight_matches == expected);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let_assert!(Err(error) = Config::load(&dir.path().join("lunrsearch.toml")));
        check!(error.to_string().contains("Failed to read config file"));
    }
}
