//! Configuration module
//!
//! Reads `~/.config/lot-pagination/config.toml`. Every section and field
//! is optional; missing values fall back to the defaults below.
//!
//! ```toml
//! [pagination]
//! default_page_size = 20
//! allowed_page_sizes = [10, 20, 50, 100]
//! max_visible_pages = 7
//! debounce_ms = 100
//!
//! [retry]
//! max_retries = 2
//! base_delay_ms = 300
//!
//! [url]
//! prefix = "items"
//! preserve_query = true
//! debounce_ms = 100
//!
//! [catalog]
//! seed_items = 47
//! failure_rate = 0.0
//! latency_ms = 0
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::application::pagination::EngineOptions;
use crate::application::url_sync::UrlSyncOptions;
use crate::domain::pagination::{DEFAULT_MAX_VISIBLE_PAGES, DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZES};
use crate::shared::types::ConfigError;
use crate::shared::utills::RetryConfig;

const CONFIG_DIR: &str = "lot-pagination";
const CONFIG_FILE: &str = "config.toml";

/// Default location of the configuration file
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    #[validate(nested)]
    pub pagination: PaginationSection,
    #[validate(nested)]
    pub retry: RetrySection,
    #[validate(nested)]
    pub url: UrlSection,
    #[validate(nested)]
    pub catalog: CatalogSection,
    #[validate(nested)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "default_size_is_allowed"))]
pub struct PaginationSection {
    #[validate(range(min = 1, max = 1000))]
    pub default_page_size: u32,
    #[validate(length(min = 1, message = "at least one page size is required"))]
    pub allowed_page_sizes: Vec<u32>,
    #[validate(range(min = 1, max = 50))]
    pub max_visible_pages: u32,
    pub debounce_ms: u64,
}

impl Default for PaginationSection {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            allowed_page_sizes: DEFAULT_PAGE_SIZES.to_vec(),
            max_visible_pages: DEFAULT_MAX_VISIBLE_PAGES,
            debounce_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RetrySection {
    #[validate(range(max = 10))]
    pub max_retries: u32,
    #[validate(range(max = 60_000))]
    pub base_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UrlSection {
    #[validate(length(min = 1, max = 32))]
    pub prefix: Option<String>,
    pub preserve_query: bool,
    pub debounce_ms: u64,
}

impl Default for UrlSection {
    fn default() -> Self {
        Self {
            prefix: None,
            preserve_query: true,
            debounce_ms: 100,
        }
    }
}

/// Demo catalog served by the CLI
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CatalogSection {
    #[validate(range(max = 100_000))]
    pub seed_items: usize,
    #[validate(range(min = 0.0, max = 1.0))]
    pub failure_rate: f64,
    pub latency_ms: u64,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            seed_items: 47,
            failure_rate: 0.0,
            latency_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingSection {
    #[validate(length(min = 1))]
    pub level: String,
    /// `text` or `json`
    #[validate(custom(function = "known_log_format"))]
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

fn default_size_is_allowed(section: &PaginationSection) -> Result<(), ValidationError> {
    if section.allowed_page_sizes.contains(&0) {
        return Err(ValidationError::new("zero_page_size"));
    }
    if !section.allowed_page_sizes.contains(&section.default_page_size) {
        return Err(ValidationError::new("default_page_size_not_allowed"));
    }
    Ok(())
}

fn known_log_format(format: &str) -> Result<(), ValidationError> {
    match format.to_lowercase().as_str() {
        "text" | "json" => Ok(()),
        _ => Err(ValidationError::new("unknown_log_format")),
    }
}

impl AppConfig {
    /// Load and validate the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(
            self.retry.max_retries,
            Duration::from_millis(self.retry.base_delay_ms),
        )
    }

    /// Engine options for the list called `name`.
    pub fn engine_options(&self, name: impl Into<String>) -> EngineOptions {
        EngineOptions {
            name: name.into(),
            initial_page_size: self.pagination.default_page_size,
            retry: self.retry_config(),
            debounce: Duration::from_millis(self.pagination.debounce_ms),
            allowed_page_sizes: Some(self.pagination.allowed_page_sizes.clone()),
            ..EngineOptions::default()
        }
    }

    pub fn url_options(&self) -> UrlSyncOptions {
        UrlSyncOptions {
            prefix: self.url.prefix.clone(),
            default_page_size: self.pagination.default_page_size,
            allowed_page_sizes: self.pagination.allowed_page_sizes.clone(),
            debounce: Duration::from_millis(self.url.debounce_ms),
            preserve_query: self.url.preserve_query,
        }
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
