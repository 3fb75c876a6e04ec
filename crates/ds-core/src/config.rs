//! Configuration structures for the DocuSense analysis core.
//!
//! This module provides configuration types for all components of the
//! application:
//!
//! - [`RegistryConfig`] - File registry settings (snapshot path, cleanup age)
//! - [`ScanConfig`] - Scanner settings (cache TTL, tree rendering guards)
//! - [`QueueConfig`] - Queue and dispatcher settings (timeouts, retries)
//! - [`SyncConfig`] - Status synchronizer settings (poll interval)
//! - [`AiConfig`] - Per-provider analysis engine credentials and parameters
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`] with sensible values.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::AnalysisMode;

/// Configuration for the file registry.
///
/// # Examples
///
/// ```
/// use ds_core::RegistryConfig;
///
/// let config = RegistryConfig::default();
/// assert_eq!(config.cleanup_after_days, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Path of the JSON snapshot the registry persists to.
    pub snapshot_path: Utf8PathBuf,

    /// Path prefix archived files are moved under.
    pub archive_prefix: Utf8PathBuf,

    /// Age threshold in days for the cleanup purge.
    pub cleanup_after_days: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            snapshot_path: Utf8PathBuf::from("file_registry.json"),
            archive_prefix: Utf8PathBuf::from("archive"),
            cleanup_after_days: 30,
        }
    }
}

/// Configuration for the directory scanner and tree cache.
///
/// # Examples
///
/// ```
/// use ds_core::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert_eq!(config.cache_ttl_secs, 300);
/// assert_eq!(config.max_tree_depth, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Freshness window of the tree cache in seconds.
    ///
    /// A cached tree older than this is rebuilt even when the directory
    /// signature is unchanged, bounding staleness when files are processed
    /// server-side between scans.
    pub cache_ttl_secs: u64,

    /// Maximum tree depth rendered by the presentation view.
    ///
    /// Deeper data stays complete and queryable; this only bounds
    /// rendering.
    pub max_tree_depth: usize,

    /// Maximum sibling nodes rendered per directory.
    pub max_siblings: usize,

    /// Additional directory names to skip while walking.
    pub skip_dirs: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
            max_tree_depth: 32,
            max_siblings: 500,
            skip_dirs: Vec::new(),
        }
    }
}

/// Configuration for the analysis queue and dispatcher.
///
/// # Examples
///
/// ```
/// use ds_core::QueueConfig;
///
/// let config = QueueConfig::default();
/// assert_eq!(config.backend_timeout_secs, 30);
/// assert_eq!(config.retry_attempts, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Upper bound on a single backend call, in seconds.
    ///
    /// A timeout is treated identically to any other analysis failure.
    pub backend_timeout_secs: u64,

    /// How many times a backend call is retried before the task fails.
    pub retry_attempts: u32,

    /// How long completed tasks stay visible in the queue, in seconds.
    pub completed_retention_secs: u64,

    /// Path of the JSON snapshot the task queue persists to.
    pub store_path: Utf8PathBuf,

    /// Path of the prompt catalog file.
    pub prompts_path: Utf8PathBuf,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend_timeout_secs: 30,
            retry_attempts: 2,
            completed_retention_secs: 3600,
            store_path: Utf8PathBuf::from("task_queue.json"),
            prompts_path: Utf8PathBuf::from("prompts/prompts_list.json"),
        }
    }
}

/// Configuration for the status synchronizer.
///
/// # Examples
///
/// ```
/// use ds_core::SyncConfig;
///
/// let config = SyncConfig::default();
/// assert_eq!(config.poll_interval_secs, 10);
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between polls of registry and queue state.
    pub poll_interval_secs: u64,

    /// Whether background synchronization runs at all.
    pub enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            enabled: true,
        }
    }
}

/// Connection and generation parameters for one analysis provider.
///
/// # Examples
///
/// ```
/// use ds_core::ProviderConfig;
///
/// let config = ProviderConfig::default();
/// assert_eq!(config.max_tokens, 1024);
/// assert!(config.api_key.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API endpoint base URL (OpenAI-compatible).
    pub endpoint: String,

    /// Model name to request.
    pub model: String,

    /// Credential string; required for cloud providers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum output tokens per analysis.
    pub max_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            model: String::new(),
            api_key: None,
            temperature: 0.3,
            max_tokens: 1024,
        }
    }
}

/// Analysis engine configuration: one [`ProviderConfig`] per cloud mode,
/// plus the local engine endpoint.
///
/// Credentials are validated by format per provider before acceptance; a
/// malformed key is rejected up front rather than failing at dispatch time.
///
/// # Examples
///
/// ```
/// use ds_core::AiConfig;
///
/// let mut config = AiConfig::default();
/// config.openai.api_key = Some("sk-test-1234567890abcdef".to_owned());
/// assert!(config.validate().is_ok());
///
/// config.openai.api_key = Some("not-a-key".to_owned());
/// assert!(config.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Local analysis engine (no credentials required).
    pub local: ProviderConfig,

    /// OpenAI provider settings.
    pub openai: ProviderConfig,

    /// Anthropic Claude provider settings.
    pub claude: ProviderConfig,

    /// Mistral provider settings.
    pub mistral: ProviderConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            local: ProviderConfig {
                endpoint: "http://127.0.0.1:11434/v1".to_owned(),
                model: "llama3.2".to_owned(),
                ..ProviderConfig::default()
            },
            openai: ProviderConfig {
                endpoint: "https://api.openai.com/v1".to_owned(),
                model: "gpt-4o-mini".to_owned(),
                ..ProviderConfig::default()
            },
            claude: ProviderConfig {
                endpoint: "https://api.anthropic.com/v1".to_owned(),
                model: "claude-3-5-haiku-latest".to_owned(),
                ..ProviderConfig::default()
            },
            mistral: ProviderConfig {
                endpoint: "https://api.mistral.ai/v1".to_owned(),
                model: "mistral-small-latest".to_owned(),
                ..ProviderConfig::default()
            },
        }
    }
}

impl AiConfig {
    /// Minimum plausible credential length for any provider.
    const MIN_KEY_LEN: usize = 16;

    /// Returns the provider configuration for a mode, if the mode is known.
    #[must_use]
    pub fn provider(&self, mode: AnalysisMode) -> Option<&ProviderConfig> {
        match mode {
            AnalysisMode::Local => Some(&self.local),
            AnalysisMode::OpenAi => Some(&self.openai),
            AnalysisMode::Claude => Some(&self.claude),
            AnalysisMode::Mistral => Some(&self.mistral),
        }
    }

    /// Returns the modes that are currently usable: local always, cloud
    /// providers only when they hold a well-formed key.
    #[must_use]
    pub fn configured_modes(&self) -> Vec<AnalysisMode> {
        let mut modes = vec![AnalysisMode::Local];
        for mode in [
            AnalysisMode::OpenAi,
            AnalysisMode::Claude,
            AnalysisMode::Mistral,
        ] {
            if self.key_is_valid(mode) {
                modes.push(mode);
            }
        }
        modes
    }

    /// Validates every configured credential's format.
    ///
    /// Absent keys are fine (the provider is simply not configured); a
    /// present key with the wrong shape is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCredential`] naming the offending
    /// provider.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for mode in [
            AnalysisMode::OpenAi,
            AnalysisMode::Claude,
            AnalysisMode::Mistral,
        ] {
            let Some(provider) = self.provider(mode) else {
                continue;
            };
            if provider.api_key.is_some() && !self.key_is_valid(mode) {
                return Err(ConfigError::invalid_credential(
                    mode.label().to_ascii_lowercase(),
                    Self::format_hint(mode),
                ));
            }
        }
        Ok(())
    }

    /// Checks the key format for one mode.
    fn key_is_valid(&self, mode: AnalysisMode) -> bool {
        let Some(provider) = self.provider(mode) else {
            return false;
        };
        let Some(key) = provider.api_key.as_deref() else {
            return false;
        };
        if key.len() < Self::MIN_KEY_LEN {
            return false;
        }
        match mode {
            AnalysisMode::Claude => key.starts_with("sk-ant-"),
            AnalysisMode::OpenAi => key.starts_with("sk-"),
            AnalysisMode::Mistral => key.chars().all(|c| c.is_ascii_alphanumeric()),
            AnalysisMode::Local => true,
        }
    }

    /// Human-readable format expectation per provider.
    const fn format_hint(mode: AnalysisMode) -> &'static str {
        match mode {
            AnalysisMode::OpenAi => "key must start with 'sk-' and be at least 16 characters",
            AnalysisMode::Claude => "key must start with 'sk-ant-' and be at least 16 characters",
            AnalysisMode::Mistral => "key must be alphanumeric and at least 16 characters",
            AnalysisMode::Local => "local engine requires no credential",
        }
    }
}

/// Root configuration for the DocuSense analysis core.
///
/// Combines all component configurations into a single structure that can
/// be loaded from a configuration file or constructed programmatically.
///
/// # Examples
///
/// ```
/// use ds_core::Config;
///
/// let config = Config::default();
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// assert!(json.contains("poll_interval_secs"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File registry configuration.
    pub registry: RegistryConfig,

    /// Scanner and tree cache configuration.
    pub scan: ScanConfig,

    /// Queue and dispatcher configuration.
    pub queue: QueueConfig,

    /// Status synchronizer configuration.
    pub sync: SyncConfig,

    /// Analysis engine configuration.
    pub ai: AiConfig,
}
