//! Configuration system (layered: defaults < TOML file < environment).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ThreadloopError;
use crate::prompt::PromptConfig;
use crate::provider::GenerationSettings;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_STEPS: usize = 15;
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Lamento que haya habido un error, ¿puedes intentar \
reformular su pregunta? Intenta simplificar la pregunta. Gracias.";
const CONFIG_FILE_NAME: &str = "threadloop.toml";

/// Where thread snapshots are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum CheckpointBackend {
    Memory,
    File { dir: PathBuf },
    Sqlite { path: PathBuf },
}

impl Default for CheckpointBackend {
    fn default() -> Self {
        if cfg!(feature = "sqlite") {
            Self::Sqlite {
                path: default_data_dir().join("threads.db"),
            }
        } else {
            Self::File {
                dir: default_data_dir().join("threads"),
            }
        }
    }
}

/// Web-search tool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: u64,
    /// Override of the search API endpoint.
    pub base_url: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            base_url: None,
        }
    }
}

/// Complete runtime configuration.
///
/// Resolution order, later wins:
/// 1. Built-in defaults
/// 2. TOML file (explicit path, or `threadloop.toml` in the user config dir)
/// 3. Environment (`.env` is loaded first when present)
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadloopConfig {
    pub model: String,
    pub temperature: f64,
    pub max_steps: usize,
    pub fallback_message: String,
    pub prompt: PromptConfig,
    pub checkpoint: CheckpointBackend,
    pub search: SearchConfig,
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    #[serde(skip_serializing)]
    pub tavily_api_key: Option<String>,
}

impl fmt::Debug for ThreadloopConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadloopConfig")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_steps", &self.max_steps)
            .field("checkpoint", &self.checkpoint)
            .field("search", &self.search)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| ".."))
            .field("openai_base_url", &self.openai_base_url)
            .field("tavily_api_key", &self.tavily_api_key.as_ref().map(|_| ".."))
            .finish()
    }
}

impl Default for ThreadloopConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_steps: DEFAULT_MAX_STEPS,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            prompt: PromptConfig::default(),
            checkpoint: CheckpointBackend::default(),
            search: SearchConfig::default(),
            openai_api_key: None,
            openai_base_url: None,
            tavily_api_key: None,
        }
    }
}

impl ThreadloopConfig {
    /// Load the full layered configuration.
    ///
    /// With `path == None` the default config file is used if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ThreadloopError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ThreadloopError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            ThreadloopError::Configuration(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ThreadloopError> {
        toml::from_str(raw)
            .map_err(|err| ThreadloopError::Configuration(format!("invalid config file: {err}")))
    }

    /// Overlay environment values read through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ThreadloopError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.openai_base_url = Some(url);
        }
        if let Some(key) = get("TAVILY_API_KEY") {
            self.tavily_api_key = Some(key);
        }
        if let Some(model) = get("THREADLOOP_MODEL") {
            self.model = model;
        }
        if let Some(steps) = get("THREADLOOP_MAX_STEPS") {
            self.max_steps = steps.trim().parse().map_err(|_| {
                ThreadloopError::Configuration(format!(
                    "THREADLOOP_MAX_STEPS must be a positive integer, got '{steps}'"
                ))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ThreadloopError> {
        if self.max_steps == 0 {
            return Err(ThreadloopError::Configuration(
                "max_steps must be at least 1".into(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ThreadloopError::Configuration("model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ThreadloopError::Configuration(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        if self.fallback_message.trim().is_empty() {
            return Err(ThreadloopError::Configuration(
                "fallback_message must not be empty".into(),
            ));
        }
        if self.search.max_results == 0 {
            return Err(ThreadloopError::Configuration(
                "search.max_results must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings::builder()
            .temperature(self.temperature)
            .build()
    }

    pub fn require_openai_key(&self) -> Result<&str, ThreadloopError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| ThreadloopError::Configuration("OPENAI_API_KEY is not set".into()))
    }
}

/// `threadloop.toml` inside the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "threadloop")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Platform data directory, falling back to `./.threadloop`.
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "threadloop")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".threadloop"))
}
