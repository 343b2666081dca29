//! Configuration: TOML, loaded with `serde` + `toml`. Loading order mirrors
//! the wider service family: parse the file at a configurable path (or the
//! default path), fall back to built-in defaults section-by-section if the
//! file or a section is absent, then apply a small set of environment
//! overrides.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub temperature: f32,
    pub terminal_temperature: f32,
    pub max_tokens: u32,
    pub context_window: usize,
    pub per_call_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            terminal_temperature: 0.2,
            max_tokens: 512,
            context_window: 4096,
            per_call_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MemoryConfig {
    pub service_url: String,
    pub per_fetch_timeout_ms: u64,
    pub context_deadline_ms: u64,
    pub recent_turns_limit: usize,
    pub knowledge_k: usize,
    pub episodes_n: usize,
    pub context_char_budget: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8700".to_owned(),
            per_fetch_timeout_ms: 2000,
            context_deadline_ms: 3000,
            recent_turns_limit: 5,
            knowledge_k: 5,
            episodes_n: 3,
            context_char_budget: 1500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SafetySectionConfig {
    pub rate_limits: HashMap<String, usize>,
    pub thresholds: (f64, f64, f64),
    pub allow_http_localhost: bool,
    pub blocked_domains: Vec<String>,
    pub abuse_window_secs: u64,
    pub abuse_max_blocks: usize,
}

impl Default for SafetySectionConfig {
    fn default() -> Self {
        Self {
            rate_limits: HashMap::from([
                ("low".to_owned(), 60),
                ("medium".to_owned(), 30),
                ("high".to_owned(), 10),
                ("critical".to_owned(), 1),
            ]),
            thresholds: (0.25, 0.50, 0.75),
            allow_http_localhost: true,
            blocked_domains: Vec::new(),
            abuse_window_secs: 600,
            abuse_max_blocks: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub max_iterations: u32,
    pub dev_mode: bool,
    pub llm: LlmConfig,
    pub memory: MemoryConfig,
    pub safety: SafetySectionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            dev_mode: true,
            llm: LlmConfig::default(),
            memory: MemoryConfig::default(),
            safety: SafetySectionConfig::default(),
        }
    }
}

/// `~/.react-core/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".react-core").join("config.toml"))
}

/// Load `AppConfig` from `path`, falling back to defaults when the file is
/// absent, then apply `REACT_CORE_*` environment overrides.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let mut config = match fs::read_to_string(path) {
        Ok(content) => toml::from_str::<AppConfig>(&content).map_err(|e| CoreError::ConfigParse {
            path: path.display().to_string(),
            source: e,
        })?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(e) => {
            return Err(CoreError::ConfigIo {
                path: path.display().to_string(),
                source: e,
            })
        }
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Load from `REACT_CORE_CONFIG` or the default path; never fails — a
/// missing or unreadable file degrades to `AppConfig::default()`.
pub fn load_default_config() -> AppConfig {
    let path = env::var("REACT_CORE_CONFIG")
        .map(PathBuf::from)
        .ok()
        .or_else(default_config_path)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    load_config(&path).unwrap_or_default()
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(v) = env::var("REACT_CORE_MAX_ITERATIONS") {
        if let Ok(n) = v.parse::<u32>() {
            config.max_iterations = n;
        }
    }
    if let Ok(v) = env::var("REACT_CORE_MEMORY_URL") {
        config.memory.service_url = v;
    }
    if let Ok(v) = env::var("REACT_CORE_LLM_TEMPERATURE") {
        if let Ok(t) = v.parse::<f32>() {
            config.llm.temperature = t;
        }
    }
    if let Ok(v) = env::var("REACT_CORE_DEV_MODE") {
        config.dev_mode = v == "1" || v.eq_ignore_ascii_case("true");
    }
}

/// Atomically save `config` to `path` (temp file, backup, rename).
pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    let content = toml::to_string_pretty(config).map_err(|e| CoreError::ConfigSerialize(e.to_string()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CoreError::ConfigIo {
            path: path.display().to_string(),
            source: e,
        })?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, &content).map_err(|e| CoreError::ConfigIo {
        path: tmp_path.display().to_string(),
        source: e,
    })?;

    if path.exists() {
        let bak_path = path.with_extension("toml.bak");
        let _ = fs::copy(path, &bak_path);
    }

    fs::rename(&tmp_path, path).map_err(|e| CoreError::ConfigIo {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.llm.temperature, 0.7);
        assert_eq!(config.memory.per_fetch_timeout_ms, 2000);
        assert_eq!(config.safety.thresholds, (0.25, 0.50, 0.75));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_iterations = 3\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.llm, LlmConfig::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.max_iterations = 7;
        save_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.max_iterations, 7);
    }

    #[test]
    fn env_override_wins_over_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_iterations = 3\n").unwrap();
        // SAFETY: test-only, single-threaded within this test function; no
        // other thread reads this process's environment concurrently.
        #[allow(unsafe_code)]
        unsafe {
            env::set_var("REACT_CORE_MAX_ITERATIONS", "99");
        }
        let config = load_config(&path).unwrap();
        #[allow(unsafe_code)]
        unsafe {
            env::remove_var("REACT_CORE_MAX_ITERATIONS");
        }
        assert_eq!(config.max_iterations, 99);
    }
}
