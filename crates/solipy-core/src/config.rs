use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const KEY_VAR: &str = "OPENAI_API_KEY";
const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
const MODEL_VAR: &str = "OPENAI_MODEL";

/// Credentials and endpoint for the chat-completion API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

fn unquote(value: &str) -> String {
    value.trim().trim_matches(|c| c == '"' || c == '\'').to_string()
}

/// Double-quoted dotenv value; `\`, `"` and `$` are escaped so the value
/// reads back verbatim instead of being substituted.
fn quote_env_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

impl Settings {
    /// Defaults, then `.env`, then the legacy `doc.txt` if no key was found.
    /// Unreadable files are logged and skipped.
    pub fn load(paths: &AppPaths) -> Self {
        let mut settings = Self::default();

        if paths.env_file.exists() {
            if let Err(e) = settings.apply_env_file(&paths.env_file) {
                log::error!("Failed to read {}: {}", paths.env_file.display(), e);
            }
        }

        if settings.api_key.is_empty() && paths.doc_file.exists() {
            if let Err(e) = settings.apply_doc_file(&paths.doc_file) {
                log::error!("Failed to read {}: {}", paths.doc_file.display(), e);
            }
        }

        settings
    }

    pub fn from_env_file(path: &Path) -> Result<Self, AppError> {
        let mut settings = Self::default();
        settings.apply_env_file(path)?;
        Ok(settings)
    }

    /// Overlay `OPENAI_*` entries from a dotenv file. Other keys are ignored.
    pub fn apply_env_file(&mut self, path: &Path) -> Result<(), AppError> {
        let iter = dotenvy::from_path_iter(path)
            .map_err(|e| AppError::ConfigError(format!("{}: {}", path.display(), e)))?;

        for item in iter {
            let (key, value) = match item {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("Skipping malformed line in {}: {}", path.display(), e);
                    continue;
                }
            };
            let value = value.trim().to_string();
            match key.as_str() {
                KEY_VAR => self.api_key = value,
                BASE_URL_VAR => self.base_url = value,
                MODEL_VAR => self.model = value,
                _ => {}
            }
        }
        Ok(())
    }

    /// Loose `doc.txt` format: any line mentioning "api key", "base_url" or
    /// "model" with an `=` assigns its right-hand side.
    pub fn apply_doc_file(&mut self, path: &Path) -> Result<(), AppError> {
        let contents = std::fs::read_to_string(path)?;
        for line in contents.lines() {
            let Some((_, rhs)) = line.split_once('=') else {
                continue;
            };
            let lower = line.to_lowercase();
            let value = unquote(rhs);
            if lower.contains("api key") {
                self.api_key = value.clone();
            }
            if lower.contains("base_url") {
                self.base_url = value.clone();
            }
            if lower.contains("model") {
                self.model = value;
            }
        }
        Ok(())
    }

    /// Write the three `OPENAI_*` entries into `path`, replacing existing
    /// lines in place and appending missing ones. Other lines are kept.
    pub fn save_env(&self, path: &Path) -> Result<(), AppError> {
        let existing = if path.exists() {
            std::fs::read_to_string(path)?
        } else {
            String::new()
        };

        let entries = [
            (KEY_VAR, &self.api_key),
            (BASE_URL_VAR, &self.base_url),
            (MODEL_VAR, &self.model),
        ];
        let mut found = [false; 3];
        let mut lines: Vec<String> = Vec::new();

        for line in existing.lines() {
            let replaced = entries.iter().enumerate().find_map(|(i, (var, value))| {
                line.starts_with(&format!("{}=", var))
                    .then(|| (i, format!("{}={}", var, quote_env_value(value))))
            });
            match replaced {
                Some((i, new_line)) => {
                    found[i] = true;
                    lines.push(new_line);
                }
                None => lines.push(line.to_string()),
            }
        }

        for (i, (var, value)) in entries.iter().enumerate() {
            if !found[i] {
                lines.push(format!("{}={}", var, quote_env_value(value)));
            }
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = lines.join("\n");
        out.push('\n');
        std::fs::write(path, out)?;
        log::info!("API settings saved to {}", path.display());
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        !self.api_key.trim().is_empty()
            && !self.base_url.trim().is_empty()
            && !self.model.trim().is_empty()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(AppError::ConfigError(
                "API key, base URL and model must all be set".into(),
            ))
        }
    }

    /// Trimmed copy, as entered in the settings form.
    pub fn normalized(&self) -> Self {
        Self {
            api_key: self.api_key.trim().to_string(),
            base_url: self.base_url.trim().to_string(),
            model: self.model.trim().to_string(),
        }
    }
}

/// Filesystem layout rooted at the application directory.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub scripts_dir: PathBuf,
    pub history_dir: PathBuf,
    pub env_file: PathBuf,
    pub doc_file: PathBuf,
    pub log_file: PathBuf,
}

impl AppPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let scripts_dir = root.join("scripts");
        Self {
            history_dir: scripts_dir.join("history"),
            scripts_dir,
            env_file: root.join(".env"),
            doc_file: root.join("doc.txt"),
            log_file: root.join("sw_api_panel.log"),
            root,
        }
    }

    /// `SOLIPY_HOME` if set, otherwise the directory holding the executable,
    /// otherwise the working directory.
    pub fn resolve() -> Self {
        if let Some(home) = std::env::var_os("SOLIPY_HOME").filter(|v| !v.is_empty()) {
            return Self::new(PathBuf::from(home));
        }
        let root = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(root)
    }

    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.scripts_dir)?;
        std::fs::create_dir_all(&self.history_dir)?;
        Ok(())
    }
}

/// Studio preferences persisted as JSON in the user's config directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudioConfig {
    #[serde(default = "default_script_host")]
    pub script_host: String,
    #[serde(default = "default_script_host_args")]
    pub script_host_args: Vec<String>,
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    #[serde(default = "default_execution_timeout_secs")]
    pub execution_timeout_secs: u64,
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,
}

fn default_script_host() -> String {
    "cscript".to_string()
}

fn default_script_host_args() -> Vec<String> {
    vec!["//NoLogo".to_string()]
}

fn default_max_history() -> usize {
    20
}

fn default_execution_timeout_secs() -> u64 {
    300
}

fn default_generation_timeout_secs() -> u64 {
    120
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            script_host: default_script_host(),
            script_host_args: default_script_host_args(),
            max_history: default_max_history(),
            execution_timeout_secs: default_execution_timeout_secs(),
            generation_timeout_secs: default_generation_timeout_secs(),
        }
    }
}

impl StudioConfig {
    /// Reject values that would make every run or request fail outright.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.script_host.trim().is_empty() {
            return Err(AppError::ConfigError("Script host must be set".into()));
        }
        if self.max_history == 0 {
            return Err(AppError::ConfigError(
                "History must keep at least one script".into(),
            ));
        }
        if self.execution_timeout_secs == 0 || self.generation_timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "Timeouts must be at least one second".into(),
            ));
        }
        Ok(())
    }

    /// Never zero, even when the file on disk says so.
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs.max(1))
    }

    pub fn config_path() -> Result<PathBuf, AppError> {
        let data_dir = dirs::config_dir()
            .ok_or_else(|| AppError::ConfigError("Cannot find config directory".into()))?;
        Ok(data_dir.join("solipy-studio").join("config.json"))
    }

    /// Load config from disk, or return default if not found
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: StudioConfig = serde_json::from_str(&contents)
                .map_err(|e| AppError::ConfigError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<(), AppError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.api_key.is_empty());
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert!(!settings.is_complete());
    }

    #[test]
    fn test_env_file_overrides_and_unquotes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "OPENAI_API_KEY=\"sk-test\"\nOPENAI_MODEL='google/gemini-1.5-pro'\nOTHER=1\n",
        )
        .unwrap();

        let settings = Settings::from_env_file(&path).unwrap();
        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.model, "google/gemini-1.5-pro");
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_doc_file_used_only_without_key() {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::new(dir.path());
        std::fs::write(&paths.env_file, "OPENAI_MODEL=gpt-4o\n").unwrap();
        std::fs::write(
            &paths.doc_file,
            "my api key = \"sk-doc\"\nbase_url = https://openrouter.ai/api/v1/chat/completions\nnotes without equals\n",
        )
        .unwrap();

        let settings = Settings::load(&paths);
        assert_eq!(settings.api_key, "sk-doc");
        assert_eq!(
            settings.base_url,
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(settings.model, "gpt-4o");

        std::fs::write(&paths.env_file, "OPENAI_API_KEY=sk-env\n").unwrap();
        let settings = Settings::load(&paths);
        assert_eq!(settings.api_key, "sk-env");
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_load_without_files_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&AppPaths::new(dir.path()));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_env_replaces_and_preserves_other_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "# comment\nOPENAI_API_KEY=old\nRUST_LOG=debug\n").unwrap();

        let settings = Settings {
            api_key: "new-key".into(),
            base_url: "https://example.test/v1/chat/completions".into(),
            model: "gpt-4o".into(),
        };
        settings.save_env(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "# comment");
        assert_eq!(lines[1], "OPENAI_API_KEY=\"new-key\"");
        assert_eq!(lines[2], "RUST_LOG=debug");
        assert!(lines.contains(&"OPENAI_BASE_URL=\"https://example.test/v1/chat/completions\""));
        assert!(lines.contains(&"OPENAI_MODEL=\"gpt-4o\""));
        assert_eq!(written.matches("OPENAI_API_KEY").count(), 1);

        assert_eq!(Settings::from_env_file(&path).unwrap(), settings);
    }

    #[test]
    fn test_save_env_round_trips_special_characters() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        let settings = Settings {
            api_key: r#"sk-ab$cd\ef"g'h"#.into(),
            base_url: "https://example.test/v1?a=$HOME".into(),
            model: "team\\model #1".into(),
        };
        settings.save_env(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains(r#"OPENAI_API_KEY="sk-ab\$cd\\ef\"g'h""#));
        assert_eq!(Settings::from_env_file(&path).unwrap(), settings);
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let settings = Settings {
            api_key: "  ".into(),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(AppError::ConfigError(_))));

        let settings = Settings {
            api_key: "sk".into(),
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_paths_layout() {
        let paths = AppPaths::new("/opt/solipy");
        assert_eq!(paths.scripts_dir, PathBuf::from("/opt/solipy/scripts"));
        assert_eq!(paths.history_dir, PathBuf::from("/opt/solipy/scripts/history"));
        assert_eq!(paths.env_file, PathBuf::from("/opt/solipy/.env"));
    }

    #[test]
    fn test_studio_config_partial_json_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "max_history": 5 }"#).unwrap();

        let config = StudioConfig::load_from(&path).unwrap();
        assert_eq!(config.max_history, 5);
        assert_eq!(config.script_host, "cscript");
        assert_eq!(config.script_host_args, vec!["//NoLogo".to_string()]);

        config.save_to(&path).unwrap();
        assert_eq!(StudioConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_studio_config_rejects_zero_timeouts() {
        assert!(StudioConfig::default().validate().is_ok());

        let config = StudioConfig {
            generation_timeout_secs: 0,
            ..StudioConfig::default()
        };
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
        assert_eq!(config.generation_timeout(), Duration::from_secs(1));

        let config = StudioConfig {
            max_history: 0,
            ..StudioConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
