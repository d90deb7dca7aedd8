use crate::defaults;
use crate::error::{PrepcallError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub call: CallConfig,
    pub interviewer: InterviewerConfig,
    pub feedback: FeedbackConfig,
    pub storage: StorageConfig,
    pub network: NetworkConfig,
}

/// Call lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CallConfig {
    /// Workflow started for generation calls. Generation is unavailable without it.
    pub workflow_id: Option<String>,
    /// Seconds to wait for `call-start` before giving up (0 = wait forever).
    pub connect_timeout_secs: u64,
}

/// Interviewer persona used for structured interview calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InterviewerConfig {
    pub name: String,
    pub first_message: String,
    pub system_prompt: String,
    pub voice: Option<String>,
    pub model: Option<String>,
}

/// Feedback generation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedbackConfig {
    pub model: String,
    pub api_base: String,
    /// Prefer the environment variable; a key in the file is read but never written back.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory of the file store (default: XDG data dir)
    pub data_dir: Option<PathBuf>,
}

/// Connectivity watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    pub watch: bool,
    pub probe_addr: String,
    pub probe_interval_ms: u64,
    pub probe_timeout_ms: u64,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            workflow_id: None,
            connect_timeout_secs: defaults::CONNECT_TIMEOUT_SECS,
        }
    }
}

impl Default for InterviewerConfig {
    fn default() -> Self {
        Self {
            name: defaults::INTERVIEWER_NAME.to_string(),
            first_message: defaults::INTERVIEWER_FIRST_MESSAGE.to_string(),
            system_prompt: defaults::INTERVIEWER_SYSTEM_PROMPT.to_string(),
            voice: None,
            model: None,
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            model: defaults::FEEDBACK_MODEL.to_string(),
            api_base: defaults::GEMINI_API_BASE.to_string(),
            api_key: None,
            timeout_secs: defaults::MODEL_TIMEOUT_SECS,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            watch: true,
            probe_addr: defaults::NETWORK_PROBE_ADDR.to_string(),
            probe_interval_ms: defaults::NETWORK_PROBE_INTERVAL_MS,
            probe_timeout_ms: defaults::NETWORK_PROBE_TIMEOUT_MS,
        }
    }
}

impl StorageConfig {
    /// Resolve the store root: configured dir, else `~/.local/share/prepcall`.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("prepcall")
        })
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if it doesn't exist.
    ///
    /// Invalid TOML is an error, never silently replaced by defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Write configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = self.to_toml()?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Render the configuration as pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PrepcallError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - PREPCALL_WORKFLOW_ID → call.workflow_id
    /// - PREPCALL_MODEL → feedback.model
    /// - PREPCALL_DATA_DIR → storage.data_dir
    /// - GOOGLE_GENERATIVE_AI_API_KEY → feedback.api_key
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(workflow) = std::env::var("PREPCALL_WORKFLOW_ID")
            && !workflow.is_empty()
        {
            self.call.workflow_id = Some(workflow);
        }

        if let Ok(model) = std::env::var("PREPCALL_MODEL")
            && !model.is_empty()
        {
            self.feedback.model = model;
        }

        if let Ok(dir) = std::env::var("PREPCALL_DATA_DIR")
            && !dir.is_empty()
        {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }

        if let Ok(key) = std::env::var(defaults::GEMINI_API_KEY_ENV)
            && !key.is_empty()
        {
            self.feedback.api_key = Some(key);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/prepcall/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prepcall")
            .join("config.toml")
    }

    /// Read a value by dotted key (e.g. `call.workflow_id`).
    ///
    /// Returns `None` for unknown keys and unset optional values.
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let root = toml::Value::try_from(self).map_err(|e| PrepcallError::ConfigParse {
            message: e.to_string(),
        })?;
        let value = key.split('.').try_fold(&root, |node, part| node.get(part));
        Ok(value.map(|v| match v {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    /// Set a value by dotted key, parsing it with the type of the current value.
    pub fn set_value(&mut self, key: &str, raw: &str) -> Result<()> {
        let mut root = toml::Value::try_from(&*self).map_err(|e| PrepcallError::ConfigParse {
            message: e.to_string(),
        })?;

        let (section, field) = key
            .split_once('.')
            .ok_or_else(|| PrepcallError::ConfigInvalidValue {
                key: key.to_string(),
                message: "expected <section>.<field>".to_string(),
            })?;

        let table = root
            .get_mut(section)
            .and_then(|v| v.as_table_mut())
            .ok_or_else(|| PrepcallError::ConfigInvalidValue {
                key: key.to_string(),
                message: format!("unknown section '{section}'"),
            })?;

        let parsed = match table.get(field) {
            Some(toml::Value::Integer(_)) => {
                raw.parse::<i64>()
                    .map(toml::Value::Integer)
                    .map_err(|e| PrepcallError::ConfigInvalidValue {
                        key: key.to_string(),
                        message: e.to_string(),
                    })?
            }
            Some(toml::Value::Boolean(_)) => {
                raw.parse::<bool>()
                    .map(toml::Value::Boolean)
                    .map_err(|e| PrepcallError::ConfigInvalidValue {
                        key: key.to_string(),
                        message: e.to_string(),
                    })?
            }
            _ => toml::Value::String(raw.to_string()),
        };
        table.insert(field.to_string(), parsed);

        let updated: Config = root.try_into().map_err(|e: toml::de::Error| {
            PrepcallError::ConfigInvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }
        })?;
        // Keys are never serialized, so carry them across.
        let api_key = self.feedback.api_key.take();
        *self = updated;
        self.feedback.api_key = api_key;
        Ok(())
    }
}
