//! Configuration loader
//!
//! Reads `nav.yaml` from the config directory (`CAMPUS_NAV_CONFIG_DIR`, default
//! `config`) and builds the locale store. Everything has a default, so a
//! missing config file or locale directory is not an error.
//!
//! ```yaml
//! default_locale: en
//! reverse_policy: reverse_and_mirror
//! reset_delay_ms: 3000
//! locales_dir: locales        # relative to the config directory
//! phrases:
//!   end: [end, finish, stop, bye]
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::conversation::{ConversationMachine, IntentClassifier, IntentPhrases};
use crate::locale::{LocaleStore, DEFAULT_LOCALE};
use crate::navigation::ReversePolicy;

/// Environment variable naming the config directory
pub const CONFIG_DIR_ENV: &str = "CAMPUS_NAV_CONFIG_DIR";

const CONFIG_FILE: &str = "nav.yaml";
const LOCALES_SUBDIR: &str = "locales";

/// Process-wide navigation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NavConfig {
    pub default_locale: String,
    pub reverse_policy: ReversePolicy,
    /// Delay between the farewell and the automatic reset
    pub reset_delay_ms: u64,
    /// Directory of locale YAML files; built-in data when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locales_dir: Option<PathBuf>,
    pub phrases: IntentPhrases,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            default_locale: DEFAULT_LOCALE.to_string(),
            reverse_policy: ReversePolicy::default(),
            reset_delay_ms: 3000,
            locales_dir: None,
            phrases: IntentPhrases::default(),
        }
    }
}

impl NavConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse navigation config")
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    /// Build a state machine over `store` with these settings
    pub fn machine(&self, store: Arc<LocaleStore>) -> ConversationMachine {
        ConversationMachine::new(store)
            .with_policy(self.reverse_policy)
            .with_classifier(IntentClassifier::new(self.phrases.clone()))
            .with_reset_delay(self.reset_delay())
    }
}

/// Locates and loads configuration from a directory
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Create loader from CAMPUS_NAV_CONFIG_DIR env var or default to "config"
    pub fn from_env() -> Self {
        let dir = std::env::var(CONFIG_DIR_ENV).unwrap_or_else(|_| "config".to_string());
        Self::new(dir)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Load `nav.yaml`, or defaults when the file does not exist
    pub fn load_config(&self) -> Result<NavConfig> {
        let path = self.config_dir.join(CONFIG_FILE);
        if !path.exists() {
            info!("No {} found, using defaults", path.display());
            return Ok(NavConfig::default());
        }

        info!("Loading navigation config from {}", path.display());
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: NavConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Load the locale store.
    ///
    /// Uses `locales_dir` when configured, then `<config_dir>/locales` if it
    /// exists, then the built-in datasets.
    pub fn load_store(&self, config: &NavConfig) -> Result<LocaleStore> {
        let dir = match &config.locales_dir {
            Some(dir) if dir.is_relative() => Some(self.config_dir.join(dir)),
            Some(dir) => Some(dir.clone()),
            None => {
                let candidate = self.config_dir.join(LOCALES_SUBDIR);
                candidate.is_dir().then_some(candidate)
            }
        };

        match dir {
            Some(dir) => {
                info!("Loading locale datasets from {}", dir.display());
                LocaleStore::load_from_dir(&dir, &config.default_locale)
                    .with_context(|| format!("Failed to load locales from {}", dir.display()))
            }
            None => {
                info!("Using built-in locale datasets");
                LocaleStore::builtin_with_default(&config.default_locale)
                    .context("Failed to load built-in locale datasets")
            }
        }
    }

    /// Config plus a ready state machine
    pub fn load_machine(&self) -> Result<(NavConfig, ConversationMachine)> {
        let config = self.load_config()?;
        let store = Arc::new(self.load_store(&config)?);
        let machine = config.machine(store);
        Ok((config, machine))
    }
}
