use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirs::data_dir;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_lsp::lsp_types::DiagnosticSeverity;

use crate::dictionary::DEFAULT_COOLDOWN;

/// Key clients nest the settings under in `workspace/configuration`.
pub const SETTINGS_SECTION: &str = "miniSpellChecker";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    #[serde(alias = "information")]
    Info,
    Warning,
    Hint,
}

impl Severity {
    pub fn to_lsp_diagnostic(&self) -> DiagnosticSeverity {
        match self {
            Severity::Error => DiagnosticSeverity::ERROR,
            Severity::Info => DiagnosticSeverity::INFORMATION,
            Severity::Warning => DiagnosticSeverity::WARNING,
            Severity::Hint => DiagnosticSeverity::HINT,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Error => "error",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Hint => "hint",
        };
        f.write_str(label)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_enabled_languages")]
    pub enabled_languages: Vec<String>,
    #[serde(default = "default_dictionary_folder")]
    pub dictionary_folder: PathBuf,
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,
    #[serde(default = "default_diagnostic_severity")]
    pub diagnostic_severity: Severity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            enabled_languages: default_enabled_languages(),
            dictionary_folder: default_dictionary_folder(),
            cooldown_seconds: default_cooldown_seconds(),
            diagnostic_severity: default_diagnostic_severity(),
        }
    }
}

impl Config {
    /// Whether documents of `language_id` get scanned at all.
    pub fn should_check(&self, language_id: &str) -> bool {
        self.enabled && self.enabled_languages.iter().any(|l| l == language_id)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    pub fn dictionary_folder(&self) -> PathBuf {
        expand_tilde(&self.dictionary_folder).unwrap_or_else(|| self.dictionary_folder.clone())
    }

    /// Settings sent by a client, either bare or nested under
    /// [`SETTINGS_SECTION`], on top of the defaults.
    pub fn from_value(value: Value) -> Config {
        Config::default().merged(value)
    }

    /// Applies the keys a client sent on top of `self`. Keys it leaves out
    /// keep their current value, so `{}` or another extension's section
    /// changes nothing. Unparseable settings are ignored as a whole.
    pub fn merged(&self, value: Value) -> Config {
        let settings = match value {
            Value::Object(mut map) if map.contains_key(SETTINGS_SECTION) => {
                map.remove(SETTINGS_SECTION).unwrap_or(Value::Null)
            }
            other => other,
        };
        let settings = match settings {
            Value::Object(map) => map,
            Value::Null => return self.clone(),
            other => {
                warn!("Ignoring settings that are not an object: {other}");
                return self.clone();
            }
        };

        let mut current = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => {
                warn!("Current settings cannot be merged, ignoring update");
                return self.clone();
            }
        };
        current.extend(settings);
        serde_json::from_value(Value::Object(current)).unwrap_or_else(|err| {
            warn!("Ignoring invalid settings: {err}");
            self.clone()
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn default_enabled() -> bool {
    true
}

fn default_enabled_languages() -> Vec<String> {
    ["plaintext", "markdown", "javascript", "typescript"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_dictionary_folder() -> PathBuf {
    data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("minispell")
}

fn default_cooldown_seconds() -> u64 {
    DEFAULT_COOLDOWN.as_secs()
}

fn default_diagnostic_severity() -> Severity {
    Severity::Warning
}

pub fn expand_tilde<P: AsRef<Path>>(path_user_input: P) -> Option<PathBuf> {
    let p = path_user_input.as_ref();
    if !p.starts_with("~") {
        return Some(p.to_path_buf());
    }
    if p == Path::new("~") {
        return dirs::home_dir();
    }
    let rest = p.strip_prefix("~").ok()?;
    dirs::home_dir().map(|h| {
        if h == Path::new("/") {
            // Corner case: `h` root directory;
            // don't prepend extra `/`, just drop the tilde.
            rest.to_path_buf()
        } else {
            h.join(rest)
        }
    })
}
