//! Settings files for the rivulet signal graph.
//!
//! Graph-wide construction defaults ([`GraphSettings`]) live under a
//! `[graph]` table in a TOML file. Every key is optional; missing keys keep
//! their defaults and the result is validated before it is returned.
//!
//! ```toml
//! [graph]
//! sample_rate = 44100.0
//! tee_capacity = 16384
//! adapter_chunk_size = 512
//! resample_mode = "linear"
//! resample_chunk_size = 128
//! ```
//!
//! # Example
//!
//! ```rust
//! use rivulet_config::parse_settings;
//! use rivulet_core::{ResampleMode, SignalGraph};
//!
//! let settings = parse_settings("[graph]\nresample_mode = \"cubic\"\n").unwrap();
//! assert_eq!(settings.resample_mode, ResampleMode::Cubic);
//!
//! let graph = SignalGraph::with_settings(settings).unwrap();
//! assert_eq!(graph.settings().sample_rate, 48000.0);
//! ```

mod error;

use serde::{Deserialize, Serialize};
use std::path::Path;

pub use error::ConfigError;
pub use rivulet_core::GraphSettings;

/// On-disk layout of a settings file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    graph: GraphSettings,
}

/// Parses settings from a TOML string and validates them.
pub fn parse_settings(toml_str: &str) -> Result<GraphSettings, ConfigError> {
    let file: SettingsFile = toml::from_str(toml_str)?;
    file.graph.validate()?;
    Ok(file.graph)
}

/// Loads settings from a TOML file and validates them.
pub fn load_settings(path: impl AsRef<Path>) -> Result<GraphSettings, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    parse_settings(&content)
}

/// Serializes settings to a TOML string.
///
/// Invalid settings are rejected so that every file written can be loaded
/// back.
pub fn to_toml_string(settings: &GraphSettings) -> Result<String, ConfigError> {
    settings.validate()?;
    let file = SettingsFile {
        graph: settings.clone(),
    };
    Ok(toml::to_string_pretty(&file)?)
}

/// Saves settings to a TOML file, creating parent directories as needed.
pub fn save_settings(path: impl AsRef<Path>, settings: &GraphSettings) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let content = to_toml_string(settings)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
    }

    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}
