//! Configuration for redraft.
//!
//! Layered load: explicit --config path, then .redraft.yml in the current
//! directory, then ~/.config/redraft/redraft.yml, then defaults. Model
//! credentials are resolved once into an explicit Credentials value and
//! handed to the gateway, never read ambiently at call time.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Global configuration for redraft.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Model backend settings.
    pub llm: LlmSettings,

    /// Test runner settings.
    pub runner: RunnerSettings,

    /// Working directory layout.
    pub workspace: WorkspaceSettings,

    /// Maximum test-and-critique rounds before giving up.
    #[serde(rename = "max-rounds")]
    pub max_rounds: u32,
}

impl GlobalConfig {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .redraft.yml in current directory
    /// 3. ~/.config/redraft/redraft.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        let project_config = PathBuf::from(".redraft.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from .redraft.yml");
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load .redraft.yml: {}", e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("redraft").join("redraft.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            eyre::bail!("max-rounds must be > 0");
        }
        if self.llm.max_tokens == 0 {
            eyre::bail!("llm.max-tokens must be > 0");
        }
        if self.runner.command.trim().is_empty() {
            eyre::bail!("runner.command must not be empty");
        }
        if self.workspace.code_file.trim().is_empty() || self.workspace.test_file.trim().is_empty()
        {
            eyre::bail!("workspace file names must not be empty");
        }
        if self.workspace.code_file == self.workspace.test_file {
            eyre::bail!("workspace code-file and test-file must differ");
        }
        Ok(())
    }
}

/// Model backend settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model override; each backend has its own default when unset.
    pub model: Option<String>,

    /// Max tokens per response.
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Timeout per model call in milliseconds.
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 8192,
            timeout_ms: 300_000,
        }
    }
}

/// Test runner settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Shell command run in the working directory; exit 0 means pass.
    pub command: String,

    /// Timeout for one test run in milliseconds.
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            command: "pytest -q".to_string(),
            timeout_ms: 120_000,
        }
    }
}

/// Working directory layout. The directory is deleted and recreated at the
/// start of every run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    /// Scratch directory for generated artifacts.
    pub dir: PathBuf,

    /// Generated code module file name.
    #[serde(rename = "code-file")]
    pub code_file: String,

    /// Generated test module file name.
    #[serde(rename = "test-file")]
    pub test_file: String,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("work_dir"),
            code_file: "user_code.py".to_string(),
            test_file: "test_user_code.py".to_string(),
        }
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            runner: RunnerSettings::default(),
            workspace: WorkspaceSettings::default(),
            max_rounds: 5,
        }
    }
}

/// API keys for the supported backends, resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl Credentials {
    /// Resolve credentials from the process environment. Empty values
    /// count as absent.
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
        }
    }

    /// Credentials with only an Anthropic key (tests and embedding)
    pub fn with_anthropic(key: impl Into<String>) -> Self {
        Self {
            anthropic_api_key: Some(key.into()),
            openai_api_key: None,
        }
    }

    /// Credentials with only an OpenAI key (tests and embedding)
    pub fn with_openai(key: impl Into<String>) -> Self {
        Self {
            anthropic_api_key: None,
            openai_api_key: Some(key.into()),
        }
    }

    /// True when no backend key is present
    pub fn is_empty(&self) -> bool {
        self.anthropic_api_key.is_none() && self.openai_api_key.is_none()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Load KEY=VALUE pairs from a local env file into the process
/// environment. Variables already set win. Missing file is not an error.
///
/// Must be called before the async runtime starts; mutating the
/// environment is only sound while the process is single-threaded.
pub fn load_env_file(path: &Path) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().trim_matches('"').trim_matches('\'');
        if key.is_empty() || std::env::var_os(key).is_some() {
            continue;
        }
        // SAFETY: callers invoke this before spawning any threads
        unsafe {
            std::env::set_var(key, value);
        }
    }
    log::debug!("Loaded env file {}", path.display());
}
