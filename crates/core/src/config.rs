//! Configuration management for LabChat.
//!
//! Configuration is layered, from lowest to highest precedence:
//! - Built-in defaults (mirroring the deployed proof-of-concept)
//! - Config file (`.labchat/config.yaml` in the workspace)
//! - Environment variables (`LABCHAT_*`, `RUST_LOG`, `NO_COLOR`)
//! - Command-line flags
//!
//! The retrieval thresholds live here as injectable configuration rather
//! than constants so tests and deployments can tune them independently.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Thresholds used by the knowledge-base hit filter / router.
///
/// A candidate passage is admitted as evidence when at least two of the
/// four conditions (score, length, overlap, margin) hold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FilterThresholds {
    /// Minimum relevance score for a hit to count as "scored well"
    #[serde(rename = "minScore")]
    pub min_score: f32,

    /// Minimum passage length in characters
    #[serde(rename = "minChars")]
    pub min_chars: usize,

    /// Minimum top1/top2 score ratio for the result set to count as peaked
    #[serde(rename = "marginMin")]
    pub margin_min: f32,

    /// Minimum question/passage token-set overlap
    #[serde(rename = "overlapMin")]
    pub overlap_min: usize,

    /// Number of nearest neighbours requested from the index
    #[serde(rename = "topK")]
    pub top_k: usize,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            min_score: 0.25,
            min_chars: 160,
            margin_min: 1.05,
            overlap_min: 3,
            top_k: 5,
        }
    }
}

/// Sampling parameters for a generation call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,

    #[serde(rename = "topP")]
    pub top_p: f32,

    #[serde(rename = "maxTokens")]
    pub max_tokens: u32,
}

impl GenerationParams {
    /// Deterministic settings used for evidence-grounded answers.
    pub fn factual() -> Self {
        Self {
            temperature: 0.0,
            top_p: 1.0,
            max_tokens: 1024,
        }
    }

    /// Settings used for the conversational tool agents.
    pub fn agent() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
            max_tokens: 64000,
        }
    }
}

/// Location of the managed vector index and its document field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Collection host, e.g. "example.us-west-2.aoss.amazonaws.com"
    pub host: String,

    /// Index name
    pub index: String,

    /// Field holding the passage text
    #[serde(rename = "textField")]
    pub text_field: String,

    /// Field holding the query vector
    #[serde(rename = "vectorField")]
    pub vector_field: String,

    /// Field holding the source document URI
    #[serde(rename = "sourceField")]
    pub source_field: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            host: "localhost:9200".to_string(),
            index: "bedrock-knowledge-base-default-index".to_string(),
            text_field: "AMAZON_BEDROCK_TEXT".to_string(),
            vector_field: "embedding_v2".to_string(),
            source_field: "x-amz-bedrock-kb-source-uri".to_string(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .labchat/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Model provider ("bedrock", "ollama", "mock")
    pub provider: String,

    /// Cloud region identifier
    pub region: String,

    /// Chat/generation model identifier
    pub model: String,

    /// Embedding model identifier
    #[serde(rename = "embeddingModel")]
    pub embedding_model: String,

    /// API key for the managed model service
    pub api_key: Option<String>,

    /// Vector index location and field names
    pub search: SearchConfig,

    /// Hit filter thresholds
    pub thresholds: FilterThresholds,

    /// Sampling for knowledge-base answer generation
    #[serde(rename = "kbGeneration")]
    pub kb_generation: GenerationParams,

    /// Sampling for tool agents
    #[serde(rename = "agentGeneration")]
    pub agent_generation: GenerationParams,

    /// Conversation sliding-window size in messages
    #[serde(rename = "windowSize")]
    pub window_size: usize,

    /// Connect timeout for the model service, in seconds
    #[serde(rename = "connectTimeoutSecs")]
    pub connect_timeout_secs: u64,

    /// Read timeout for the model service, in seconds
    #[serde(rename = "readTimeoutSecs")]
    pub read_timeout_secs: u64,

    /// Maximum attempts for transient model-service failures
    #[serde(rename = "retryMaxAttempts")]
    pub retry_max_attempts: u32,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    provider: Option<String>,
    region: Option<String>,
    model: Option<String>,
    #[serde(rename = "embeddingModel")]
    embedding_model: Option<String>,
    search: Option<SearchConfig>,
    thresholds: Option<FilterThresholds>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "bedrock".to_string(),
            region: "us-west-2".to_string(),
            model: "us.anthropic.claude-3-7-sonnet-20250219-v1:0".to_string(),
            embedding_model: "amazon.titan-embed-text-v2:0".to_string(),
            api_key: None,
            search: SearchConfig::default(),
            thresholds: FilterThresholds::default(),
            kb_generation: GenerationParams::factual(),
            agent_generation: GenerationParams::agent(),
            window_size: 10,
            connect_timeout_secs: 900,
            read_timeout_secs: 900,
            retry_max_attempts: 3,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `LABCHAT_WORKSPACE`: Override workspace path
    /// - `LABCHAT_CONFIG`: Path to config file
    /// - `LABCHAT_PROVIDER`: Model provider
    /// - `LABCHAT_REGION`: Cloud region
    /// - `LABCHAT_MODEL`: Generation model identifier
    /// - `LABCHAT_API_KEY`: API key for the managed service
    /// - `LABCHAT_SEARCH_HOST`: Vector index host
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("LABCHAT_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("LABCHAT_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.workspace.join(".labchat/config.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("LABCHAT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(region) = std::env::var("LABCHAT_REGION") {
            config.region = region;
        }

        if let Ok(model) = std::env::var("LABCHAT_MODEL") {
            config.model = model;
        }

        if let Ok(host) = std::env::var("LABCHAT_SEARCH_HOST") {
            config.search.host = host;
        }

        config.api_key = std::env::var("LABCHAT_API_KEY").ok();
        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(provider) = config_file.provider {
            result.provider = provider;
        }

        if let Some(region) = config_file.region {
            result.region = region;
        }

        if let Some(model) = config_file.model {
            result.model = model;
        }

        if let Some(embedding_model) = config_file.embedding_model {
            result.embedding_model = embedding_model;
        }

        if let Some(search) = config_file.search {
            result.search = search;
        }

        if let Some(thresholds) = config_file.thresholds {
            result.thresholds = thresholds;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and YAML.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        region: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(region) = region {
            self.region = region;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .labchat directory.
    pub fn labchat_dir(&self) -> PathBuf {
        self.workspace.join(".labchat")
    }

    /// Validate configuration for the active provider and thresholds.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["bedrock", "ollama", "mock"];

        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.provider == "bedrock" && self.api_key.is_none() {
            return Err(AppError::Config(
                "Bedrock provider requires LABCHAT_API_KEY".to_string(),
            ));
        }

        let t = &self.thresholds;
        if !(0.0..=1.0).contains(&t.min_score) {
            return Err(AppError::Config(format!(
                "minScore must be within [0, 1], got {}",
                t.min_score
            )));
        }

        if t.margin_min < 1.0 {
            return Err(AppError::Config(format!(
                "marginMin must be at least 1.0, got {}",
                t.margin_min
            )));
        }

        if t.top_k == 0 {
            return Err(AppError::Config("topK must be at least 1".to_string()));
        }

        if self.window_size == 0 {
            return Err(AppError::Config(
                "windowSize must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "bedrock");
        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.window_size, 10);
        assert_eq!(config.retry_max_attempts, 3);
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_default_thresholds() {
        let t = FilterThresholds::default();
        assert_eq!(t.min_score, 0.25);
        assert_eq!(t.min_chars, 160);
        assert_eq!(t.margin_min, 1.05);
        assert_eq!(t.overlap_min, 3);
        assert_eq!(t.top_k, 5);
    }

    #[test]
    fn test_generation_params() {
        let factual = GenerationParams::factual();
        assert_eq!(factual.temperature, 0.0);
        assert_eq!(factual.top_p, 1.0);
        assert_eq!(factual.max_tokens, 1024);

        let agent = GenerationParams::agent();
        assert_eq!(agent.temperature, 0.1);
        assert_eq!(agent.top_p, 0.9);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("eu-west-1".to_string()),
            Some("claude-test".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.region, "eu-west-1");
        assert_eq!(overridden.model, "claude-test");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bedrock_requires_key() {
        let mut config = AppConfig::default();
        config.provider = "bedrock".to_string();
        config.api_key = None;
        assert!(config.validate().is_err());

        config.api_key = Some("key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_threshold_bounds() {
        let mut config = AppConfig::default();
        config.provider = "mock".to_string();
        config.thresholds.margin_min = 0.5;
        assert!(config.validate().is_err());

        config.thresholds.margin_min = 1.05;
        config.thresholds.min_score = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_yaml_overrides_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "region: ap-northeast-2\nthresholds:\n  minScore: 0.4\n  minChars: 200\n  marginMin: 1.1\n  overlapMin: 2\n  topK: 3\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        let merged = config.merge_yaml(&path).unwrap();

        assert_eq!(merged.region, "ap-northeast-2");
        assert_eq!(merged.thresholds.min_score, 0.4);
        assert_eq!(merged.thresholds.top_k, 3);
        // Untouched fields keep defaults
        assert_eq!(merged.model, AppConfig::default().model);
    }

    #[test]
    fn test_load_layers_env_over_yaml_under_cli() {
        // The only test that calls load(); the env vars it sets are not
        // read anywhere else in this module.
        let dir = tempfile::tempdir().unwrap();
        let labchat_dir = dir.path().join(".labchat");
        std::fs::create_dir_all(&labchat_dir).unwrap();
        std::fs::write(
            labchat_dir.join("config.yaml"),
            "provider: ollama\nregion: eu-central-1\n",
        )
        .unwrap();

        std::env::set_var("LABCHAT_WORKSPACE", dir.path());
        std::env::set_var("LABCHAT_REGION", "ap-northeast-2");

        let config = AppConfig::load().unwrap();

        // Env beats YAML; YAML beats defaults where no env var is set
        assert_eq!(config.region, "ap-northeast-2");
        assert_eq!(config.provider, "ollama");

        // CLI overrides beat the env layer
        let config = config.with_overrides(
            None,
            None,
            Some("us-east-1".to_string()),
            None,
            None,
            false,
            false,
        );
        assert_eq!(config.region, "us-east-1");

        std::env::remove_var("LABCHAT_WORKSPACE");
        std::env::remove_var("LABCHAT_REGION");
    }
}
