use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {section} configuration: {source}")]
    Env {
        section: &'static str,
        #[source]
        source: envy::Error,
    },

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub catalog: CatalogConfig,
    pub tracker: TrackerConfig,
    pub analytics: AnalyticsConfig,
    pub reader: ReaderConfig,
    pub insight: InsightConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Emit JSON log lines instead of the human readable format
    #[serde(default)]
    pub log_json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Path to the JSON catalog loaded at startup
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Sustained focus required before an item counts as read
    #[serde(default = "default_dwell_ms")]
    pub dwell_ms: u64,
    /// Fraction of the viewport an item must cover to be in focus
    #[serde(default = "default_focus_threshold")]
    pub focus_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_top_genres_limit")]
    pub top_genres_limit: usize,
    #[serde(default = "default_genre_bias_limit")]
    pub genre_bias_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReaderConfig {
    /// Display name stamped on comments written by the local reader
    #[serde(default = "default_reader_name")]
    pub display_name: String,
    #[serde(default = "default_avatar_ref")]
    pub avatar_ref: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightConfig {
    /// No key means the insight assistant is disabled
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_insight_model")]
    pub model: String,
    #[serde(default = "default_insight_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_insight_temperature")]
    pub temperature: f32,
    #[serde(default = "default_insight_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_service_name() -> String {
    "engagement-service".to_string()
}

fn default_catalog_path() -> String {
    "data/catalog.json".to_string()
}

fn default_dwell_ms() -> u64 {
    3000
}

fn default_focus_threshold() -> f64 {
    0.8
}

fn default_top_genres_limit() -> usize {
    4
}

fn default_genre_bias_limit() -> usize {
    5
}

fn default_reader_name() -> String {
    "You".to_string()
}

fn default_avatar_ref() -> String {
    "https://i.pravatar.cc/40?u=current_user".to_string()
}

fn default_insight_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_insight_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_insight_temperature() -> f32 {
    0.5
}

fn default_insight_timeout_secs() -> u64 {
    30
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_json: false,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            dwell_ms: default_dwell_ms(),
            focus_threshold: default_focus_threshold(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_genres_limit: default_top_genres_limit(),
            genre_bias_limit: default_genre_bias_limit(),
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            display_name: default_reader_name(),
            avatar_ref: default_avatar_ref(),
        }
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_insight_model(),
            endpoint: default_insight_endpoint(),
            temperature: default_insight_temperature(),
            timeout_secs: default_insight_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            catalog: CatalogConfig::default(),
            tracker: TrackerConfig::default(),
            analytics: AnalyticsConfig::default(),
            reader: ReaderConfig::default(),
            insight: InsightConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let config = Config {
            service: section("service", "SERVICE_")?,
            catalog: section("catalog", "CATALOG_")?,
            tracker: section("tracker", "TRACKER_")?,
            analytics: section("analytics", "ANALYTICS_")?,
            reader: section("reader", "READER_")?,
            insight: section("insight", "INSIGHT_")?,
        };
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.tracker.focus_threshold) {
            return Err(ConfigError::InvalidValue(format!(
                "TRACKER_FOCUS_THRESHOLD must be within [0, 1], got {}",
                self.tracker.focus_threshold
            )));
        }
        if self.tracker.dwell_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "TRACKER_DWELL_MS must be greater than zero".to_string(),
            ));
        }
        if self.insight.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "INSIGHT_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn section<T: serde::de::DeserializeOwned>(name: &'static str, prefix: &str) -> Result<T> {
    envy::prefixed(prefix)
        .from_env::<T>()
        .map_err(|source| ConfigError::Env {
            section: name,
            source,
        })
}
