//! Integration tests for rivulet-config.
//!
//! Settings files on disk, and graphs built from them.

use rivulet_config::{ConfigError, GraphSettings, load_settings, save_settings};
use rivulet_core::{ConstantSource, ResampleMode, SignalGraph};
use tempfile::TempDir;

#[test]
fn save_then_load_preserves_settings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.toml");
    let settings = GraphSettings {
        sample_rate: 44100.0,
        tee_capacity: 4096,
        adapter_chunk_size: 333,
        resample_mode: ResampleMode::Fastest,
        resample_chunk_size: 64,
    };

    save_settings(&path, &settings).unwrap();
    assert_eq!(load_settings(&path).unwrap(), settings);
}

#[test]
fn save_creates_missing_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("graph.toml");

    save_settings(&path, &GraphSettings::default()).unwrap();
    assert!(path.exists());
}

#[test]
fn missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = load_settings(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { path: ref p, .. } if *p == path));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[graph\nsample_rate = ").unwrap();

    assert!(matches!(load_settings(&path), Err(ConfigError::TomlParse(_))));
}

#[test]
fn loaded_settings_drive_graph_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.toml");
    std::fs::write(
        &path,
        "[graph]\nsample_rate = 32000.0\nadapter_chunk_size = 7\nresample_mode = \"reference\"\n",
    )
    .unwrap();

    let mut graph = SignalGraph::with_settings(load_settings(&path).unwrap()).unwrap();
    let src = graph.add(ConstantSource::new(1.0f32));
    assert_eq!(graph.sample_rate(src.id()).unwrap(), 32000.0);

    let adapter = graph.add_adapter(src, None).unwrap();
    let out = graph.sample(&adapter, 10).unwrap().unwrap();
    assert_eq!(out.len(), 10);

    let resampled = graph.add_resample(adapter, 16000.0, None).unwrap();
    assert_eq!(graph.sample_rate(resampled.id()).unwrap(), 16000.0);
    let half = graph.sample(&resampled, 4).unwrap().unwrap();
    assert_eq!(half.as_f32().unwrap(), &[1.0; 4]);
}
