use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// AI extraction and image generation service
    #[serde(default)]
    pub ai: AiConfig,
    /// Headless browser used to render pages
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Plain HTTP fetching (fallback renders, metadata titles, image downloads)
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Background queue scheduling
    #[serde(default)]
    pub queue: QueueConfig,
    /// Object storage for recipe images
    #[serde(default)]
    pub storage: StorageConfig,
    /// In-process read caches
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Configuration for the OpenAI-compatible AI service
#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    /// API key (can also be set via OPENAI_API_KEY or OPENAI_KEY)
    pub api_key: Option<String>,
    /// Base URL for the API endpoint
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    /// Chat model used for structured extraction
    #[serde(default = "default_model")]
    pub model: String,
    /// Model used for image generation
    #[serde(default = "default_image_model")]
    pub image_model: String,
    /// Maximum completion tokens for extraction
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Extraction request timeout in seconds
    #[serde(default = "default_ai_timeout")]
    pub timeout: u64,
    /// Image generation request timeout in seconds
    #[serde(default = "default_image_timeout")]
    pub image_timeout: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_ai_base_url(),
            model: default_model(),
            image_model: default_image_model(),
            max_tokens: default_max_tokens(),
            timeout: default_ai_timeout(),
            image_timeout: default_image_timeout(),
        }
    }
}

impl AiConfig {
    /// Resolve the API key from config first, then the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .or_else(|| std::env::var("OPENAI_KEY").ok())
    }
}

/// Configuration for the headless browser renderer
#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    /// Explicit browser binary; takes precedence over CHROMIUM_BIN
    pub binary: Option<PathBuf>,
    /// Navigation timeout per attempt in seconds
    #[serde(default = "default_page_timeout")]
    pub timeout: u64,
    /// Render attempts before falling back to plain HTTP
    #[serde(default = "default_render_attempts")]
    pub attempts: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            binary: None,
            timeout: default_page_timeout(),
            attempts: default_render_attempts(),
        }
    }
}

/// Configuration for plain HTTP requests
#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds
    #[serde(default = "default_page_timeout")]
    pub timeout: u64,
    /// Timeout for the cheap title lookup used by placeholders
    #[serde(default = "default_title_timeout")]
    pub title_timeout: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_page_timeout(),
            title_timeout: default_title_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Configuration for the queue scheduler
#[derive(Debug, Deserialize, Clone)]
pub struct QueueConfig {
    /// Seconds between polls of the pending queue
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Maximum items fetched per tick
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Jobs running at the same time within a batch
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Failed attempts after which an item is finalized anyway
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl QueueConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// Configuration for image object storage
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory objects are written to
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Public URL prefix under which stored keys are served
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            public_base_url: default_public_base_url(),
        }
    }
}

/// Configuration for read caches
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// TTL for single recipe entries in seconds
    #[serde(default = "default_recipe_ttl")]
    pub recipe_ttl_secs: u64,
    /// TTL for per-user listings in seconds
    #[serde(default = "default_list_ttl")]
    pub list_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            recipe_ttl_secs: default_recipe_ttl(),
            list_ttl_secs: default_list_ttl(),
        }
    }
}

// Default value functions
fn default_ai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-5-mini".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_max_tokens() -> u32 {
    16384
}

fn default_ai_timeout() -> u64 {
    240
}

fn default_image_timeout() -> u64 {
    60
}

fn default_page_timeout() -> u64 {
    60
}

fn default_render_attempts() -> u32 {
    2
}

fn default_title_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_batch_size() -> usize {
    5
}

fn default_concurrency() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    5
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data/objects")
}

fn default_public_base_url() -> String {
    "http://localhost:8080/objects".to_string()
}

fn default_recipe_ttl() -> u64 {
    30 * 60
}

fn default_list_ttl() -> u64 {
    60 * 60
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_INGEST__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_INGEST__QUEUE__CONCURRENCY
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
///
/// See [`AppConfig::load`] for the layering.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: RECIPE_INGEST__AI__MODEL
        .add_source(
            Environment::with_prefix("RECIPE_INGEST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = AppConfig::default();
        assert_eq!(config.queue.batch_size, 5);
        assert_eq!(config.queue.concurrency, 4);
        assert_eq!(config.queue.max_attempts, 5);
        assert_eq!(config.queue.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.browser.timeout, 60);
        assert_eq!(config.browser.attempts, 2);
        assert_eq!(config.fetch.timeout, 60);
        assert_eq!(config.ai.timeout, 240);
        assert_eq!(config.cache.recipe_ttl_secs, 1800);
        assert_eq!(config.cache.list_ttl_secs, 3600);
    }

    #[test]
    fn test_poll_interval_never_zero() {
        let queue = QueueConfig {
            poll_interval_secs: 0,
            ..QueueConfig::default()
        };
        assert_eq!(queue.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let settings = Config::builder()
            .add_source(File::from_str(
                "[queue]\nconcurrency = 2\n\n[ai]\nmodel = \"gpt-4o-mini\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: AppConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.queue.concurrency, 2);
        assert_eq!(config.queue.batch_size, 5);
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(config.ai.base_url, "https://api.openai.com");
        assert!(config.browser.binary.is_none());
    }

    #[test]
    fn test_resolve_api_key_prefers_config() {
        let ai = AiConfig {
            api_key: Some("from-config".to_string()),
            ..AiConfig::default()
        };
        assert_eq!(ai.resolve_api_key().as_deref(), Some("from-config"));
    }
}
