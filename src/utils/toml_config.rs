//! TOML-based configuration for Delve
//!
//! This module provides declarative configuration for the server, the research
//! workflow, the LLM provider and the search backend via a TOML file
//! (`delve.toml`).
//!
//! # Hot Reloading
//!
//! Configuration changes are automatically detected and applied at runtime.
//! Use `DelveConfigManager` for thread-safe access to the current configuration.
//! Jobs capture the configuration current at creation; running jobs are not
//! affected by a reload.

use crate::jobs::JobSettings;
use crate::llm::Provider;
use crate::research::ResearchParams;
use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Root configuration structure loaded from delve.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DelveConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub research: ResearchConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

// ============= Research Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Round budget: search/summarize/reflect iterations per job
    #[serde(default = "default_max_web_research_loops")]
    pub max_web_research_loops: u32,

    /// Sources fetched from the search provider before the engine starts
    #[serde(default = "default_seed_results")]
    pub seed_results: usize,

    /// Search hits requested in each engine round
    #[serde(default = "default_results_per_round")]
    pub results_per_round: usize,

    #[serde(default = "default_true")]
    pub fetch_full_page: bool,

    #[serde(default = "default_true")]
    pub strip_thinking_tokens: bool,

    /// Maximum concurrently running jobs; unbounded when absent.
    ///
    /// Read once at startup. Unlike the other research settings, a hot reload
    /// does not change it; restart the server to apply a new limit.
    pub max_concurrent_jobs: Option<usize>,
}

fn default_max_web_research_loops() -> u32 {
    2
}

fn default_seed_results() -> usize {
    5
}

fn default_results_per_round() -> usize {
    3
}

fn default_true() -> bool {
    true
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_web_research_loops: default_max_web_research_loops(),
            seed_results: default_seed_results(),
            results_per_round: default_results_per_round(),
            fetch_full_page: true,
            strip_thinking_tokens: true,
            max_concurrent_jobs: None,
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LlmConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_ollama_model")]
        model: String,
    },
    OpenAI {
        /// Environment variable containing the API key
        api_key_env: Option<String>,
        #[serde(default = "default_openai_base")]
        api_base: String,
        model: String,
    },
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig::Ollama {
            base_url: default_ollama_url(),
            model: default_ollama_model(),
        }
    }
}

// ============= Search Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    #[default]
    DuckDuckGo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub backend: SearchBackend,
}

// ============= Errors =============

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("File watcher error: {0}")]
    WatchError(#[from] notify::Error),
}

impl DelveConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: DelveConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        let research = &self.research;

        if research.max_web_research_loops == 0 {
            return Err(ConfigError::ValidationError(
                "research.max_web_research_loops must be at least 1".to_string(),
            ));
        }
        if research.seed_results == 0 {
            return Err(ConfigError::ValidationError(
                "research.seed_results must be at least 1".to_string(),
            ));
        }
        if research.results_per_round == 0 {
            return Err(ConfigError::ValidationError(
                "research.results_per_round must be at least 1".to_string(),
            ));
        }
        if research.max_concurrent_jobs == Some(0) {
            return Err(ConfigError::ValidationError(
                "research.max_concurrent_jobs must be at least 1 when set".to_string(),
            ));
        }

        match &self.llm {
            LlmConfig::Ollama { model, .. } | LlmConfig::OpenAI { model, .. }
                if model.trim().is_empty() =>
            {
                return Err(ConfigError::ValidationError(
                    "llm.model must not be empty".to_string(),
                ));
            }
            LlmConfig::OpenAI {
                api_key_env: Some(env),
                ..
            } => self.validate_env_var(env)?,
            _ => {}
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        self.resolve_env(name)
            .map(|_| ())
            .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
    }

    /// Resolve an environment variable by name
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// Build the LLM provider described by `[llm]`
    pub fn provider(&self) -> Result<Provider, ConfigError> {
        Ok(match &self.llm {
            LlmConfig::Ollama { base_url, model } => Provider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
            },
            LlmConfig::OpenAI {
                api_key_env,
                api_base,
                model,
            } => {
                let api_key = match api_key_env {
                    Some(env) => self
                        .resolve_env(env)
                        .ok_or_else(|| ConfigError::MissingEnvVar(env.clone()))?,
                    None => String::new(),
                };
                Provider::OpenAI {
                    api_key,
                    api_base: api_base.clone(),
                    model: model.clone(),
                }
            }
        })
    }

    /// Per-job execution settings derived from `[research]`
    pub fn job_settings(&self) -> JobSettings {
        let research = &self.research;
        JobSettings {
            seed_results: research.seed_results,
            research: ResearchParams {
                round_budget: research.max_web_research_loops,
                results_per_round: research.results_per_round,
                fetch_full_page: research.fetch_full_page,
                strip_thinking_tokens: research.strip_thinking_tokens,
            },
        }
    }

    /// Render as TOML, e.g. for scaffolding a new config file
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ValidationError(format!("Failed to serialize config: {}", e)))
    }
}

// ============= Config Manager =============

/// Thread-safe access to the current configuration with hot reloading
pub struct DelveConfigManager {
    config: Arc<ArcSwap<DelveConfig>>,
    config_path: PathBuf,
    watcher: RwLock<Option<RecommendedWatcher>>,
}

impl DelveConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Convert to absolute path for reliable file watching
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = DelveConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: path,
            watcher: RwLock::new(None),
        })
    }

    /// Create a config manager directly from a config.
    /// This won't have file watching capabilities.
    pub fn from_config(config: DelveConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: PathBuf::from("delve.toml"),
            watcher: RwLock::new(None),
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<DelveConfig> {
        self.config.load_full()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Manually reload the configuration from disk
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = DelveConfig::load(&self.config_path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Start watching for configuration file changes
    pub fn start_watching(&self) -> Result<(), ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let config_path = self.config_path.clone();
        let config_arc = Arc::clone(&self.config);
        let file_name = config_path.file_name().map(|n| n.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                        // Send reload signal (debounced in the receiver)
                        let _ = tx.send(());
                    }
                }
                Err(e) => {
                    error!("Config watcher error: {:?}", e);
                }
            }
        })?;

        // Watch the config file's parent directory
        if let Some(parent) = self.config_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }

        *self.watcher.write() = Some(watcher);

        tokio::spawn(async move {
            let debounce_duration = Duration::from_millis(500);
            let mut last_reload: Option<std::time::Instant> = None;

            while rx.recv().await.is_some() {
                if last_reload.is_some_and(|t| t.elapsed() < debounce_duration) {
                    continue;
                }

                // Wait a bit for file write to complete
                tokio::time::sleep(Duration::from_millis(100)).await;

                match DelveConfig::load(&config_path) {
                    Ok(new_config) => {
                        config_arc.store(Arc::new(new_config));
                        info!("Configuration hot-reloaded successfully");
                        last_reload = Some(std::time::Instant::now());
                    }
                    Err(e) => {
                        warn!(
                            "Failed to hot-reload config: {}. Keeping previous config.",
                            e
                        );
                    }
                }
            }
        });

        info!("Configuration hot-reload watcher started");
        Ok(())
    }

    /// Stop watching for configuration changes
    pub fn stop_watching(&self) {
        *self.watcher.write() = None;
        info!("Configuration hot-reload watcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config("");
        let config = DelveConfig::load(file.path()).unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.research.max_web_research_loops, 2);
        assert_eq!(config.research.seed_results, 5);
        assert!(config.research.fetch_full_page);
        assert!(config.research.max_concurrent_jobs.is_none());
        assert!(matches!(config.llm, LlmConfig::Ollama { ref model, .. } if model == "llama3.2"));
        assert_eq!(config.search.backend, SearchBackend::DuckDuckGo);
    }

    #[test]
    fn test_full_config_parses() {
        let file = write_config(
            r#"
[server]
host = "0.0.0.0"
port = 8080

[research]
max_web_research_loops = 4
seed_results = 8
fetch_full_page = false
max_concurrent_jobs = 16

[llm]
type = "openai"
api_base = "http://localhost:1234/v1"
model = "qwen2.5-7b-instruct"

[search]
backend = "duckduckgo"
"#,
        );

        let config = DelveConfig::load(file.path()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.research.max_concurrent_jobs, Some(16));

        let settings = config.job_settings();
        assert_eq!(settings.seed_results, 8);
        assert_eq!(settings.research.round_budget, 4);
        assert!(!settings.research.fetch_full_page);

        let provider = config.provider().unwrap();
        assert_eq!(provider.name(), "OpenAI");
        assert_eq!(provider.model(), "qwen2.5-7b-instruct");
    }

    #[test]
    fn test_missing_file() {
        let result = DelveConfig::load("/nonexistent/delve.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let file = write_config("[research\nmax_web_research_loops = ");
        assert!(matches!(
            DelveConfig::load(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_zero_round_budget_rejected() {
        let mut config = DelveConfig::default();
        config.research.max_web_research_loops = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_zero_job_limit_rejected() {
        let mut config = DelveConfig::default();
        config.research.max_concurrent_jobs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_model_rejected() {
        let mut config = DelveConfig::default();
        config.llm = LlmConfig::Ollama {
            base_url: default_ollama_url(),
            model: " ".to_string(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_api_key_env_rejected() {
        let mut config = DelveConfig::default();
        config.llm = LlmConfig::OpenAI {
            api_key_env: Some("DELVE_TEST_UNSET_API_KEY_VAR".to_string()),
            api_base: default_openai_base(),
            model: "gpt-4o-mini".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingEnvVar(name)) if name == "DELVE_TEST_UNSET_API_KEY_VAR"
        ));
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let rendered = DelveConfig::default().to_toml().unwrap();
        let parsed: DelveConfig = toml::from_str(&rendered).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.server.port, 5000);
    }

    #[test]
    fn test_manager_reload() {
        let file = write_config("[server]\nport = 7000\n");
        let manager = DelveConfigManager::new(file.path()).unwrap();
        assert_eq!(manager.config().server.port, 7000);

        std::fs::write(file.path(), "[server]\nport = 7001\n").unwrap();
        manager.reload().unwrap();
        assert_eq!(manager.config().server.port, 7001);
    }

    #[test]
    fn test_manager_keeps_config_on_failed_reload() {
        let file = write_config("[server]\nport = 7000\n");
        let manager = DelveConfigManager::new(file.path()).unwrap();

        std::fs::write(file.path(), "[research]\nseed_results = 0\n").unwrap();
        assert!(manager.reload().is_err());
        assert_eq!(manager.config().server.port, 7000);
    }

    #[tokio::test]
    async fn test_stop_watching_releases_watcher() {
        let file = write_config("[server]\nport = 7000\n");
        let manager = DelveConfigManager::new(file.path()).unwrap();

        manager.start_watching().unwrap();
        assert!(manager.watcher.read().is_some());

        manager.stop_watching();
        assert!(manager.watcher.read().is_none());
    }
}
