use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sampling period in milliseconds; 500, 1000, and 2000 are the values
    /// the UI exposes.
    pub refresh_interval_ms: u64,
    pub start_paused: bool,
    /// Upper bound on external tool invocations (systemctl, the display
    /// server probe).
    pub tool_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 1000,
            start_paused: false,
            tool_timeout_ms: 5000,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let path = config_path();
        if let Ok(data) = fs::read_to_string(&path) {
            serde_json::from_str(&data).unwrap_or_default()
        } else {
            Config::default()
        }
    }

    pub fn save(&self) {
        let path = config_path();
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(data) = serde_json::to_string_pretty(self) {
            let _ = fs::write(&path, data);
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_millis(self.tool_timeout_ms)
    }
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("taskmon")
        .join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.refresh_interval_ms, 1000);
        assert_eq!(back.tool_timeout_ms, 5000);
        assert!(!back.start_paused);
    }

    #[test]
    fn unknown_file_content_falls_back_to_defaults() {
        let parsed: Config = serde_json::from_str("not json").unwrap_or_default();
        assert_eq!(parsed.refresh_interval_ms, 1000);
    }
}
