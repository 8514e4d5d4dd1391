//! Locale Store
//!
//! Read-only registry of locale datasets, shared by every session. Unknown
//! locale codes never fail hard: the accessors silently use the default
//! locale's dataset, and `lookup` reports the fallback for callers that care.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use super::catalog::substitute;
use super::dataset::{LocaleDataset, LocaleLoadError, Location, MilestoneMarker, PathRecord};
use crate::error::NavError;

/// Locale code used when nothing else is configured
pub const DEFAULT_LOCALE: &str = "en";

const BUILTIN_EN: &str = include_str!("../../config/locales/en.yaml");
const BUILTIN_HI: &str = include_str!("../../config/locales/hi.yaml");
const BUILTIN_TE: &str = include_str!("../../config/locales/te.yaml");

/// Registry of locale datasets with a designated default
#[derive(Debug, Clone)]
pub struct LocaleStore {
    datasets: BTreeMap<String, LocaleDataset>,
    default_locale: String,
}

impl LocaleStore {
    /// Build a store from datasets; the default locale must be among them.
    pub fn from_datasets(
        datasets: Vec<LocaleDataset>,
        default_locale: &str,
    ) -> Result<Self, LocaleLoadError> {
        let mut map = BTreeMap::new();
        for dataset in datasets {
            for warning in dataset.warnings() {
                warn!("{}", warning);
            }
            let code = dataset.code.to_lowercase();
            if map.contains_key(&code) {
                return Err(LocaleLoadError::DuplicateCode { code });
            }
            map.insert(code, dataset);
        }

        let default_locale = default_locale.to_lowercase();
        if !map.contains_key(&default_locale) {
            return Err(LocaleLoadError::MissingDefault {
                code: default_locale,
            });
        }

        info!(
            "Loaded {} locale datasets (default '{}')",
            map.len(),
            default_locale
        );

        Ok(Self {
            datasets: map,
            default_locale,
        })
    }

    /// The English, Hindi and Telugu datasets compiled into the crate
    pub fn builtin() -> Result<Self, LocaleLoadError> {
        Self::builtin_with_default(DEFAULT_LOCALE)
    }

    /// Built-in datasets with a different default locale
    pub fn builtin_with_default(default_locale: &str) -> Result<Self, LocaleLoadError> {
        let datasets = [BUILTIN_EN, BUILTIN_HI, BUILTIN_TE]
            .iter()
            .map(|yaml| LocaleDataset::load_from_str(yaml))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_datasets(datasets, default_locale)
    }

    /// Load every `*.yaml` / `*.yml` file in a directory as a dataset.
    ///
    /// The file stem names the locale and must agree with the dataset's `code`.
    pub fn load_from_dir(dir: &Path, default_locale: &str) -> Result<Self, LocaleLoadError> {
        let entries = std::fs::read_dir(dir).map_err(|e| LocaleLoadError::IoError {
            path: dir.display().to_string(),
            source: e,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| LocaleLoadError::IoError {
                path: dir.display().to_string(),
                source: e,
            })?;
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false);
            if is_yaml {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(LocaleLoadError::NoDatasets(dir.display().to_string()));
        }

        let mut datasets = Vec::with_capacity(files.len());
        for path in files {
            debug!("Loading locale dataset {}", path.display());
            let dataset = LocaleDataset::load_from_file(&path)?;
            let stem = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .to_lowercase();
            if stem != dataset.code.trim().to_lowercase() {
                return Err(LocaleLoadError::CodeMismatch {
                    path: path.display().to_string(),
                    stem,
                    code: dataset.code,
                });
            }
            datasets.push(dataset);
        }

        Self::from_datasets(datasets, default_locale)
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Supported locale codes in sorted order
    pub fn codes(&self) -> Vec<&str> {
        self.datasets.keys().map(|k| k.as_str()).collect()
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.datasets.contains_key(&code.trim().to_lowercase())
    }

    /// Strict lookup; `UnknownLocale` names the fallback the lenient accessors use.
    pub fn lookup(&self, code: &str) -> Result<&LocaleDataset, NavError> {
        self.datasets
            .get(&code.trim().to_lowercase())
            .ok_or_else(|| NavError::UnknownLocale {
                code: code.to_string(),
                fallback: self.default_locale.clone(),
            })
    }

    /// Dataset for a locale, falling back to the default for unknown codes
    pub fn get(&self, code: &str) -> &LocaleDataset {
        match self.lookup(code) {
            Ok(dataset) => dataset,
            Err(e) => {
                warn!("{}", e);
                self.default_dataset()
            }
        }
    }

    pub fn default_dataset(&self) -> &LocaleDataset {
        // from_datasets guarantees the default is present
        &self.datasets[&self.default_locale]
    }

    /// Effective locale code after fallback
    pub fn effective_code(&self, code: &str) -> String {
        self.get(code).code.to_lowercase()
    }

    /// Locations in declaration order
    pub fn locations(&self, code: &str) -> &[Location] {
        &self.get(code).locations
    }

    pub fn paths(&self, code: &str) -> &[PathRecord] {
        &self.get(code).paths
    }

    pub fn milestone_marker(&self, code: &str) -> &MilestoneMarker {
        &self.get(code).milestone_marker
    }

    /// Render a bot message.
    ///
    /// Falls back to the default locale's template, then to the key itself.
    pub fn message(&self, code: &str, key: &str, replacements: &[(&str, &str)]) -> String {
        if let Some(text) = self.get(code).messages.render(key, replacements) {
            return text;
        }
        if let Some(text) = self.default_dataset().messages.render(key, replacements) {
            return text;
        }
        debug!("No template for message key '{}'", key);
        substitute(key, replacements)
    }
}
