//! Configuration for stashvoice.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (STASHVOICE_HOME, WHISPER_PATH, VISUAL, EDITOR)
//! 2. Config file (.stashvoice/config.yaml)
//! 3. Defaults (~/.stashvoice)
//!
//! Config file discovery:
//! - Searches current directory and parents for .stashvoice/config.yaml
//! - Relative paths in the config file are relative to the .stashvoice/ directory
//!
//! The resolved configuration is a plain value handed to each component;
//! there is no process-wide cached copy. Credentials are read from the
//! environment only, see [`Credentials`].

pub mod paths;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::core::codec::{KeyOrder, DEFAULT_KEY_ORDER};

/// Configuration problems that must stop the program before any work starts
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("Missing environment variables for inventory authentication: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub home: Option<String>,
    #[serde(default)]
    pub intake: IntakeSection,
    #[serde(default)]
    pub labeling: LabelingSection,
    #[serde(default)]
    pub voice: VoiceSection,
    #[serde(default)]
    pub review: ReviewSection,
    #[serde(default)]
    pub llm: LlmSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntakeSection {
    pub generate_description: Option<bool>,
    pub output_csv: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelingSection {
    pub relabel_labeled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoiceSection {
    pub whisper_path: Option<String>,
    pub model: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewSection {
    pub scratch_path: Option<String>,
    pub editor: Option<String>,
    pub key_order: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmSection {
    pub model: Option<String>,
    pub endpoint: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to stashvoice home (scratch file, lock)
    pub home: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub intake: IntakeSettings,
    pub labeling: LabelingSettings,
    pub voice: VoiceSettings,
    pub review: ReviewSettings,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, Default)]
pub struct IntakeSettings {
    /// Ask the LLM for a short description of each item
    pub generate_description: bool,
    /// Write an importable CSV instead of pushing to the inventory
    pub output_csv: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LabelingSettings {
    /// Also propose labels for items that already have some
    pub relabel_labeled: bool,
}

#[derive(Debug, Clone)]
pub struct VoiceSettings {
    pub whisper_path: String,
    pub model: String,
    pub language: String,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            whisper_path: "whisper".to_string(),
            model: "base".to_string(),
            language: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReviewSettings {
    pub scratch_path: PathBuf,
    /// Editor command line; platform default when `None`
    pub editor: Option<String>,
    pub key_order: KeyOrder,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub model: String,
    pub endpoint: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

/// Inventory login details, taken from the environment only
#[derive(Clone)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    /// Read HOMEBOX_URL, HOMEBOX_USERNAME and HOMEBOX_PASSWORD
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key| env(key).filter(|v: &String| !v.is_empty());
        let url = get("HOMEBOX_URL");
        let username = get("HOMEBOX_USERNAME");
        let password = get("HOMEBOX_PASSWORD");

        match (url, username, password) {
            (Some(url), Some(username), Some(password)) => Ok(Self {
                url,
                username,
                password,
            }),
            (url, username, password) => {
                let missing = [
                    ("HOMEBOX_URL", url.is_none()),
                    ("HOMEBOX_USERNAME", username.is_none()),
                    ("HOMEBOX_PASSWORD", password.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, missing)| missing.then_some(name))
                .collect();
                Err(ConfigError::MissingCredentials(missing))
            }
        }
    }
}

/// Read GEMINI_API_KEY
pub fn gemini_api_key() -> Result<String, ConfigError> {
    std::env::var("GEMINI_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or(ConfigError::MissingEnv("GEMINI_API_KEY"))
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(paths::CONFIG_DIR).join(paths::CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Combine file settings, environment and defaults
fn resolve_config(
    config_file: Option<PathBuf>,
    file: ConfigFile,
    default_home: PathBuf,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let config_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf);

    let home = if let Some(env_home) = env("STASHVOICE_HOME") {
        PathBuf::from(env_home)
    } else if let (Some(dir), Some(home)) = (&config_dir, &file.home) {
        resolve_path(dir, home)
    } else {
        default_home
    };

    let scratch_path = match (&config_dir, &file.review.scratch_path) {
        (Some(dir), Some(scratch)) => resolve_path(dir, scratch),
        (None, Some(scratch)) => PathBuf::from(scratch),
        _ => paths::scratch_file(&home),
    };

    let editor = env("VISUAL")
        .or_else(|| env("EDITOR"))
        .or(file.review.editor)
        .filter(|e| !e.trim().is_empty());

    let key_order = match file.review.key_order {
        Some(keys) if !keys.is_empty() => KeyOrder::new(keys),
        _ => KeyOrder::new(DEFAULT_KEY_ORDER),
    };

    let voice_defaults = VoiceSettings::default();
    let voice = VoiceSettings {
        whisper_path: env("WHISPER_PATH")
            .or(file.voice.whisper_path)
            .unwrap_or(voice_defaults.whisper_path),
        model: file.voice.model.unwrap_or(voice_defaults.model),
        language: file.voice.language.unwrap_or(voice_defaults.language),
    };

    let llm_defaults = LlmSettings::default();
    let llm = LlmSettings {
        model: file.llm.model.unwrap_or(llm_defaults.model),
        endpoint: file
            .llm
            .endpoint
            .map(|e| e.trim_end_matches('/').to_string())
            .unwrap_or(llm_defaults.endpoint),
    };

    ResolvedConfig {
        home,
        config_file,
        intake: IntakeSettings {
            generate_description: file.intake.generate_description.unwrap_or(false),
            output_csv: file.intake.output_csv.unwrap_or(false),
        },
        labeling: LabelingSettings {
            relabel_labeled: file.labeling.relabel_labeled.unwrap_or(false),
        },
        voice,
        review: ReviewSettings {
            scratch_path,
            editor,
            key_order,
        },
        llm,
    }
}

/// Load configuration from all sources, discovering the config file from
/// the current directory
pub fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    load_config_from(&cwd)
}

/// Load configuration, discovering the config file from `start`
pub fn load_config_from(start: &Path) -> Result<ResolvedConfig> {
    let default_home = paths::default_home()?;
    let config_file = find_config_file(start);

    let file = match &config_file {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    Ok(resolve_config(config_file, file, default_home, |key| {
        std::env::var(key).ok()
    }))
}
