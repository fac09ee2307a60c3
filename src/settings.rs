use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AtencionesError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_export_dir() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("atenciones")
        .to_string_lossy()
        .to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            export_dir: default_export_dir(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn export_path(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.export_dir))
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("atenciones")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn log_path() -> PathBuf {
    config_dir().join("atenciones.log")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| AtencionesError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            api_url: "http://clinic.local:8080".to_string(),
            export_dir: "/tmp/exports".to_string(),
            timeout_secs: 5,
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.api_url, "http://clinic.local:8080");
        assert_eq!(loaded.export_dir, "/tmp/exports");
        assert_eq!(loaded.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.api_url, "http://localhost:3000");
        assert_eq!(s.timeout_secs, 30);
        assert!(s.export_dir.ends_with("atenciones"));
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"api_url": "http://10.0.0.5:3000"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.api_url, "http://10.0.0.5:3000");
        assert_eq!(s.timeout_secs, 30);
        assert!(!s.export_dir.is_empty());
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let s = Settings {
            timeout_secs: 0,
            ..Settings::default()
        };
        assert_eq!(s.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_tilde_expansion() {
        if let Some(home) = dirs::home_dir() {
            let expanded = shellexpand_path("~/exports");
            assert!(expanded.starts_with(&*home.to_string_lossy()));
            assert!(expanded.ends_with("exports"));
        }
        assert_eq!(shellexpand_path("/abs/path"), "/abs/path");
    }
}
