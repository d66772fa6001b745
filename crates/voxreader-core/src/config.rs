//! Config — nested sections per subsystem, loaded from config.json.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxConfig {
    /// Process-wide deadline for accessibility round-trips, in seconds.
    #[serde(default = "default_ax_timeout_secs")]
    pub timeout_secs: f64,
}

impl Default for AxConfig {
    fn default() -> Self {
        Self { timeout_secs: default_ax_timeout_secs() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Window for the lock-key double tap, in milliseconds.
    #[serde(default = "default_double_tap_window_ms")]
    pub double_tap_window_ms: u64,
    /// Start with browse mode (sticky capture) enabled.
    #[serde(default)]
    pub browse_mode: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { double_tap_window_ms: default_double_tap_window_ms(), browse_mode: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// TTS backend: "log" or "say".
    #[serde(default = "default_speech_backend")]
    pub backend: String,
    /// Voice name for backends that support one.
    #[serde(default)]
    pub voice: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self { backend: default_speech_backend(), voice: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Directory element dumps are written into.
    #[serde(default = "default_dump_directory")]
    pub directory: PathBuf,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self { directory: default_dump_directory() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub ax: AxConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub dump: DumpConfig,
}

// ── Defaults ───────────────────────────────────────────────────────────────

fn default_ax_timeout_secs() -> f64 { 5.0 }
fn default_double_tap_window_ms() -> u64 { 250 }
fn default_speech_backend() -> String { "log".into() }
fn default_dump_directory() -> PathBuf { PathBuf::from(".") }

// ── Load / save ────────────────────────────────────────────────────────────

fn config_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join("config.json")))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

/// Load config from config.json next to the binary, defaults when absent.
pub fn load_config() -> Config {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Config {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => {
            log::info!("No config at {:?}, using defaults", path);
            return Config::default();
        }
    };
    serde_json::from_str(&contents).unwrap_or_else(|e| {
        log::warn!("Failed to parse config {:?}: {e}. Using defaults.", path);
        Config::default()
    })
}

pub fn save_config(cfg: &Config) {
    let path = config_path();
    match serde_json::to_string_pretty(cfg) {
        Ok(contents) => {
            if let Err(e) = std::fs::write(&path, contents) {
                log::error!("Failed to write config.json: {e}");
            }
        }
        Err(e) => log::error!("Failed to serialize config: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.ax.timeout_secs, 5.0);
        assert_eq!(cfg.input.double_tap_window_ms, 250);
        assert!(!cfg.input.browse_mode);
        assert_eq!(cfg.speech.backend, "log");
        assert_eq!(cfg.dump.directory, PathBuf::from("."));
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let cfg: Config =
            serde_json::from_str(r#"{ "speech": { "backend": "say" } }"#).unwrap();
        assert_eq!(cfg.speech.backend, "say");
        assert_eq!(cfg.ax.timeout_secs, 5.0);
        assert_eq!(cfg.input.double_tap_window_ms, 250);
    }

    #[test]
    fn round_trips_through_json() {
        let mut cfg = Config::default();
        cfg.input.browse_mode = true;
        cfg.speech.voice = Some("Samantha".into());
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert!(parsed.input.browse_mode);
        assert_eq!(parsed.speech.voice.as_deref(), Some("Samantha"));
    }
}
