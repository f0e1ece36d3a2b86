//! Configuration for the downloader module.

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP downloader and media probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Path to the ffprobe binary.
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,

    /// Probe subprocess timeout in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

fn default_timeout() -> u64 {
    120
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_probe_timeout() -> u64 {
    30
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            ffprobe_path: default_ffprobe(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DownloaderConfig::default();
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.ffprobe_path, "ffprobe");
        assert_eq!(config.probe_timeout_secs, 30);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            timeout_secs = 60
        "#;
        let config: DownloaderConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.ffprobe_path, "ffprobe");
    }
}
