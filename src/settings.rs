use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Name this client registers with the MIDI and audio systems.
    pub client_name: String,
    pub host_name: Option<String>,
    pub output_device: Option<String>,
    pub sample_rate: Option<u32>,
    pub buffer_size: Option<u32>,
    pub midi_input_port: Option<String>,
    pub midi_output_port: Option<String>,
    /// Substrings tried in order when no exact port name is configured.
    pub port_hints: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            client_name: "EdrumulusGUI".to_string(),
            host_name: None,
            output_device: None,
            sample_rate: None,
            buffer_size: None,
            midi_input_port: None,
            midi_output_port: None,
            port_hints: vec!["Edrumulus".to_string(), "ttymidi".to_string()],
        }
    }
}

pub fn get_config_dir() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "edrum-ctl")?;
    let dir = dirs.config_dir().to_path_buf();
    if !dir.exists() {
        if let Err(e) = fs::create_dir_all(&dir) {
            eprintln!("Failed to create directory at {}: {}", dir.display(), e);
            return None;
        }
    }
    Some(dir)
}

pub fn save_settings_to(path: &Path, settings: &AppSettings) -> Result<()> {
    let json_string =
        serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
    fs::write(path, json_string)
        .with_context(|| format!("Failed to write settings to {}", path.display()))
}

/// Reads settings from `path`, falling back to defaults when the file is
/// missing or cannot be parsed.
pub fn load_settings_from(path: &Path) -> AppSettings {
    if !path.exists() {
        return AppSettings::default();
    }
    match fs::read_to_string(path) {
        Ok(json_string) => match serde_json::from_str(&json_string) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to parse settings file, using defaults. Error: {}", e);
                AppSettings::default()
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read settings file, using defaults. Error: {}", e);
            AppSettings::default()
        }
    }
}

pub fn settings_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(SETTINGS_FILE))
}

pub fn load_settings() -> AppSettings {
    match settings_path() {
        Some(path) => load_settings_from(&path),
        None => AppSettings::default(),
    }
}

pub fn save_settings(settings: &AppSettings) {
    if let Some(path) = settings_path() {
        if let Err(e) = save_settings_to(&path, settings) {
            tracing::error!("{:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("edrum-ctl-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let parsed: AppSettings =
            serde_json::from_str(r#"{ "midi_input_port": "Edrumulus:0", "buffer_size": 128 }"#)
                .unwrap();
        assert_eq!(parsed.midi_input_port.as_deref(), Some("Edrumulus:0"));
        assert_eq!(parsed.buffer_size, Some(128));
        assert_eq!(parsed.client_name, "EdrumulusGUI");
        assert_eq!(parsed.port_hints, AppSettings::default().port_hints);
    }

    #[test]
    fn save_then_load_returns_the_same_settings() {
        let path = temp_path("roundtrip");
        let settings = AppSettings {
            host_name: Some("JACK".to_string()),
            port_hints: vec!["Teensy".to_string()],
            ..AppSettings::default()
        };
        save_settings_to(&path, &settings).unwrap();
        assert_eq!(load_settings_from(&path), settings);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_or_broken_file_yields_defaults() {
        let path = temp_path("broken");
        assert_eq!(load_settings_from(&path), AppSettings::default());
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings_from(&path), AppSettings::default());
        let _ = fs::remove_file(&path);
    }
}
