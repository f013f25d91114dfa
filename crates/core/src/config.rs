//! Configuration management.
//!
//! Configuration is layered, lowest precedence first:
//! - Built-in defaults
//! - `.env` in the current directory (loaded into the process environment)
//! - YAML config file (`<workspace>/.docchat/config.yaml` or `--config`)
//! - Environment variables
//! - Command-line flags (`with_overrides`)
//!
//! All persistent state lives under `<workspace>/.docchat/`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-workspace data directory.
pub const DATA_DIR_NAME: &str = ".docchat";

/// Hugging Face token variable, used when no explicit key is configured.
pub const HF_TOKEN_ENV: &str = "HUGGINGFACEHUB_API_TOKEN";

/// Chat-completion providers the factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["huggingface", "ollama"];

/// Embedding providers the knowledge crate knows how to build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 3] = ["huggingface", "ollama", "trigram"];

/// Lowercase a provider name and expand the `hf` alias.
pub fn normalize_provider(name: &str) -> String {
    match name.trim().to_lowercase().as_str() {
        "hf" => "huggingface".to_string(),
        other => other.to_string(),
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace root (contains .docchat/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Chat-completion provider ("huggingface", "ollama")
    pub provider: String,

    /// Chat model identifier
    pub model: String,

    /// Custom provider endpoint
    pub endpoint: Option<String>,

    /// Environment variable holding the API key, from the YAML file
    pub api_key_env: Option<String>,

    /// Resolved API key for hosted providers
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub embedding: EmbeddingSettings,

    pub chunking: ChunkingSettings,

    pub retrieval: RetrievalSettings,

    pub server: ServerSettings,
}

/// Embedding model selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub endpoint: Option<String>,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "huggingface".to_string(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            endpoint: None,
            batch_size: 100,
        }
    }
}

/// Text splitting parameters, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
        }
    }
}

/// Retrieval parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Number of chunks handed to the LLM per question
    pub top_k: usize,

    /// Vector store collection name
    pub collection: String,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            collection: "rag_documents".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            max_upload_mb: 200,
        }
    }
}

/// On-disk YAML layout. Every field is optional so partial files merge.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    llm: Option<LlmSection>,
    embedding: Option<EmbeddingSection>,
    chunking: Option<ChunkingSection>,
    retrieval: Option<RetrievalSection>,
    server: Option<ServerSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    api_key_env: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
    endpoint: Option<String>,
    batch_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChunkingSection {
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalSection {
    top_k: Option<usize>,
    collection: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerSection {
    host: Option<String>,
    port: Option<u16>,
    max_upload_mb: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "huggingface".to_string(),
            model: "meta-llama/Llama-3.2-3B-Instruct".to_string(),
            endpoint: None,
            api_key_env: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            embedding: EmbeddingSettings::default(),
            chunking: ChunkingSettings::default(),
            retrieval: RetrievalSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, environment variables and the YAML file.
    ///
    /// Environment variables:
    /// - `DOCCHAT_WORKSPACE`: Workspace path
    /// - `DOCCHAT_CONFIG`: Path to config file
    /// - `DOCCHAT_PROVIDER`: Chat provider
    /// - `DOCCHAT_MODEL`: Chat model identifier
    /// - `DOCCHAT_API_KEY`: API key (falls back to `HUGGINGFACEHUB_API_TOKEN`)
    /// - `DOCCHAT_EMBEDDING_PROVIDER`: Embedding provider
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docchat_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Store: {:?}", config.store_path());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], but with workspace and config file chosen by
    /// the caller (usually from command-line flags) before the YAML is read.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env_var("DOCCHAT_WORKSPACE").map(PathBuf::from)) {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| env_var("DOCCHAT_CONFIG").map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config.config_path();
        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Some(provider) = env_var("DOCCHAT_PROVIDER") {
            config.provider = provider;
        }

        if let Some(model) = env_var("DOCCHAT_MODEL") {
            config.model = model;
        }

        if let Some(provider) = env_var("DOCCHAT_EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }

        config.api_key = env_var("DOCCHAT_API_KEY")
            .or_else(|| config.api_key_env.as_deref().and_then(env_var))
            .or_else(|| env_var(HF_TOKEN_ENV));

        if let Some(level) = env_var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var_os("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                self.provider = provider;
            }
            if let Some(model) = llm.model {
                self.model = model;
            }
            if llm.endpoint.is_some() {
                self.endpoint = llm.endpoint;
            }
            if llm.api_key_env.is_some() {
                self.api_key_env = llm.api_key_env;
            }
        }

        if let Some(embedding) = file.embedding {
            if let Some(provider) = embedding.provider {
                self.embedding.provider = provider;
            }
            if let Some(model) = embedding.model {
                self.embedding.model = model;
            }
            if let Some(dimensions) = embedding.dimensions {
                self.embedding.dimensions = dimensions;
            }
            if embedding.endpoint.is_some() {
                self.embedding.endpoint = embedding.endpoint;
            }
            if let Some(batch_size) = embedding.batch_size {
                self.embedding.batch_size = batch_size;
            }
        }

        if let Some(chunking) = file.chunking {
            if let Some(size) = chunking.chunk_size {
                self.chunking.chunk_size = size;
            }
            if let Some(overlap) = chunking.chunk_overlap {
                self.chunking.chunk_overlap = overlap;
            }
        }

        if let Some(retrieval) = file.retrieval {
            if let Some(top_k) = retrieval.top_k {
                self.retrieval.top_k = top_k;
            }
            if let Some(collection) = retrieval.collection {
                self.retrieval.collection = collection;
            }
        }

        if let Some(server) = file.server {
            if let Some(host) = server.host {
                self.server.host = host;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(max_upload_mb) = server.max_upload_mb {
                self.server.max_upload_mb = max_upload_mb;
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Flags take precedence over the environment and the YAML file.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
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

    /// Path to the .docchat directory.
    pub fn data_dir(&self) -> PathBuf {
        self.workspace.join(DATA_DIR_NAME)
    }

    /// Ensure the .docchat directory exists.
    pub fn ensure_data_dir(&self) -> AppResult<()> {
        let data_dir = self.data_dir();
        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", DATA_DIR_NAME, e))
            })?;
        }
        Ok(())
    }

    /// Config file in effect: the explicit one, or `.docchat/config.yaml`.
    pub fn config_path(&self) -> PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(|| self.data_dir().join("config.yaml"))
    }

    /// SQLite vector store location.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join("store.db")
    }

    /// Directory searched for prompt overrides (`strict.yml`, `hybrid.yml`).
    pub fn prompts_dir(&self) -> PathBuf {
        self.data_dir().join("prompts")
    }

    /// Upload size limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.server.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// Validate the configuration before any provider is built.
    pub fn validate(&self) -> AppResult<()> {
        let provider = normalize_provider(&self.provider);

        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "huggingface" && self.api_key.is_none() {
            return Err(AppError::Config(format!(
                "API key not found. Set {} or DOCCHAT_API_KEY",
                HF_TOKEN_ENV
            )));
        }

        let embedding_provider = normalize_provider(&self.embedding.provider);
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if embedding_provider == "huggingface" && self.api_key.is_none() {
            return Err(AppError::Config(format!(
                "Hugging Face embeddings need an API key. Set {} or use the 'ollama' or 'trigram' embedding provider",
                HF_TOKEN_ENV
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding batch size must be greater than zero".to_string(),
            ));
        }

        if self.chunking.chunk_size == 0 {
            return Err(AppError::Config(
                "Chunk size must be greater than zero".to_string(),
            ));
        }

        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "Retrieval top_k must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Read a non-empty environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn offline_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        config.embedding.provider = "trigram".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "huggingface");
        assert_eq!(config.model, "meta-llama/Llama-3.2-3B-Instruct");
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.collection, "rag_documents");
        assert_eq!(config.embedding.dimensions, 384);
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_data_paths() {
        let config = AppConfig::default();
        assert!(config.data_dir().ends_with(".docchat"));
        assert!(config.store_path().ends_with(".docchat/store.db"));
        assert!(config.prompts_dir().ends_with(".docchat/prompts"));
        assert!(config.config_path().ends_with(".docchat/config.yaml"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_partial_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
llm:
  provider: ollama
  model: llama3.2
  endpoint: http://localhost:11434
chunking:
  chunkSize: 800
retrieval:
  topK: 8
server:
  port: 9000
logging:
  color: false
"#,
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.merge_yaml(&path).unwrap();

        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.retrieval.collection, "rag_documents");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.no_color);
    }

    #[test]
    fn test_merge_yaml_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "chunking: [not, a, map").unwrap();

        let mut config = AppConfig::default();
        let result = config.merge_yaml(&path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_with_missing_workspace() {
        let result = AppConfig::load_with(Some(PathBuf::from("/definitely/not/here")), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_with_missing_explicit_config_file() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load_with(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("absent.yaml")),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = offline_config();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_offline_stack() {
        assert!(offline_config().validate().is_ok());
    }

    #[test]
    fn test_validate_huggingface_requires_key() {
        let mut config = offline_config();
        config.provider = "huggingface".to_string();
        config.api_key = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(HF_TOKEN_ENV));

        config.api_key = Some("hf_test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_accepts_provider_aliases() {
        let mut config = offline_config();
        config.api_key = Some("hf_test".to_string());
        config.provider = "HF".to_string();
        config.embedding.provider = "hf".to_string();
        assert!(config.validate().is_ok());

        config.api_key = None;
        assert!(config.validate().is_err());

        config.provider = "Ollama".to_string();
        config.embedding.provider = "Trigram".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_normalize_provider() {
        assert_eq!(normalize_provider(" HF "), "huggingface");
        assert_eq!(normalize_provider("HuggingFace"), "huggingface");
        assert_eq!(normalize_provider("ollama"), "ollama");
    }

    #[test]
    fn test_validate_overlap_must_be_smaller_than_size() {
        let mut config = offline_config();
        config.chunking.chunk_overlap = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_top_k() {
        let mut config = offline_config();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_upload_bytes() {
        let config = AppConfig::default();
        assert_eq!(config.max_upload_bytes(), 200 * 1024 * 1024);
    }
}
