//! Traversal settings.
//!
//! [`TraversifyConfig`] is loaded from the optional `config/config.toml` file
//! (section `[traversify]`) and environment variables prefixed with `TRAVERSIFY`,
//! e.g. `TRAVERSIFY__TRAVERSIFY__SEARCH_WITH_PREFIX=true` (the `__` separator
//! also follows the prefix).

use crate::error::TraverseError;
use crate::query::Backend;
use config::{Config, ConfigError, Environment, File, FileFormat};
use once_cell::sync::Lazy;
use serde::Deserialize;

const ENV_PREFIX: &str = "TRAVERSIFY";

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("__")
}

static GLOBAL: Lazy<TraversifyConfig> = Lazy::new(|| {
    TraversifyConfig::load().unwrap_or_else(|err| {
        log::warn!("Failed to load traversify settings, using defaults. Error: {}", err);
        TraversifyConfig::default()
    })
});

/// What a feature scope does when its model declares no allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingConfigPolicy {
    /// Abort with [`TraverseError::FeatureNotConfigured`]
    #[default]
    Strict,
    /// Log a warning and leave the query untouched
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct TraversifyConfig {
    /// Render primary keys as `PREFIX-id` labels inside search concatenations
    pub search_with_prefix: bool,
    /// SQL dialect; selects ILIKE vs LIKE and the renderer
    pub backend: Backend,
    pub missing_config: MissingConfigPolicy,
}

impl TraversifyConfig {
    /// Load settings from `config/config.toml`, falling back to env vars.
    pub fn load() -> Result<Self, TraverseError> {
        let builder = Config::builder()
            .add_source(File::with_name("config/config.toml").required(false))
            .add_source(environment());

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new("config/config.toml").exists() {
                    log::warn!(
                        "Failed to load config file, falling back to env. Error: {}",
                        err
                    );
                }
                Config::builder()
                    .add_source(environment())
                    .build()?
            }
        };

        Self::from_settings(&settings)
    }

    /// Parse settings from a TOML document containing a `[traversify]` section.
    pub fn from_toml(source: &str) -> Result<Self, TraverseError> {
        let settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        Self::from_settings(&settings)
    }

    /// Process-wide settings, loaded once on first use.
    pub fn global() -> &'static TraversifyConfig {
        &GLOBAL
    }

    fn from_settings(settings: &Config) -> Result<Self, TraverseError> {
        match settings.get::<TraversifyConfig>("traversify") {
            Ok(cfg) => Ok(cfg),
            // A missing section means "all defaults"
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(err) => Err(TraverseError::Config(format!(
                "traversify settings could not be loaded from file or environment: {}",
                err
            ))),
        }
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_search_prefix(mut self, enabled: bool) -> Self {
        self.search_with_prefix = enabled;
        self
    }

    pub fn with_missing_config(mut self, policy: MissingConfigPolicy) -> Self {
        self.missing_config = policy;
        self
    }
}
