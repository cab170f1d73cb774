//! Configuration loading and parsing
//!
//! Every section and field is optional; a missing file section falls back to
//! the defaults below, and command-line flags override whatever was loaded.

use anyhow::{Context, Result};
use can_dash_decoder::{open_file_sink, FrameLogSink, IngestConfig, NullSink};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub log_sink: LogSinkConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Delay between frames in milliseconds
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
    /// Number of simulation steps to run (unlimited if absent)
    #[serde(default)]
    pub cycles: Option<usize>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval(),
            cycles: None,
        }
    }
}

fn default_frame_interval() -> u64 {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogSinkConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
}

impl Default for LogSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_log_path(),
        }
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from("can_log.txt")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Ingest loop settings for the simulator (five frames per cycle)
    pub fn ingest_config(&self) -> IngestConfig {
        let config = IngestConfig::new().with_frame_interval_ms(self.simulation.frame_interval_ms);
        match self.simulation.cycles {
            Some(cycles) => config.with_max_frames(cycles.saturating_mul(crate::simulator::FRAMES_PER_CYCLE)),
            None => config,
        }
    }

    /// Decode log sink shared by every mode; disabled logging yields a no-op sink
    pub fn open_log_sink(&self) -> Box<dyn FrameLogSink> {
        if self.log_sink.enabled {
            open_file_sink(&self.log_sink.path)
        } else {
            Box::new(NullSink)
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [simulation]
            frame_interval_ms = 20
            cycles = 3

            [log_sink]
            path = "/tmp/dash.log"

            [server]
            enabled = false
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.simulation.frame_interval_ms, 20);
        assert_eq!(config.simulation.cycles, Some(3));
        assert!(config.log_sink.enabled);
        assert_eq!(config.log_sink.path, PathBuf::from("/tmp/dash.log"));
        assert!(!config.server.enabled);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.simulation.frame_interval_ms, 100);
        assert_eq!(config.simulation.cycles, None);
        assert_eq!(config.log_sink.path, PathBuf::from("can_log.txt"));
        assert!(config.server.enabled);
    }

    #[test]
    fn test_ingest_config_from_cycles() {
        let mut config = AppConfig::default();
        config.simulation.cycles = Some(4);

        let ingest = config.ingest_config();
        assert_eq!(ingest.max_frames, Some(20));
        assert_eq!(ingest.frame_interval_ms, 100);
    }

    #[test]
    fn test_huge_cycle_count_saturates() {
        let mut config = AppConfig::default();
        config.simulation.cycles = Some(usize::MAX);

        assert_eq!(config.ingest_config().max_frames, Some(usize::MAX));
    }

    #[test]
    fn test_log_sink_follows_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.log_sink.path = dir.path().join("can_log.txt");

        config.log_sink.enabled = false;
        drop(config.open_log_sink());
        assert!(!config.log_sink.path.exists());

        config.log_sink.enabled = true;
        drop(config.open_log_sink());
        let text = fs::read_to_string(&config.log_sink.path).unwrap();
        assert!(text.starts_with(can_dash_decoder::sink::LOG_HEADER));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
