//! Configuration for trailer selection.

use serde::{Deserialize, Serialize};

/// Selection thresholds.
///
/// Candidates outside the duration window are filtered before ranking, so
/// a 10-second teaser bumper or a full-length feature mislabelled as a
/// trailer never wins on resolution alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Minimum acceptable trailer duration in seconds.
    #[serde(default = "default_min_duration")]
    pub min_duration_secs: u32,

    /// Maximum acceptable trailer duration in seconds.
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: u32,
}

fn default_min_duration() -> u32 {
    20
}

fn default_max_duration() -> u32 {
    300
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: default_min_duration(),
            max_duration_secs: default_max_duration(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window() {
        let config = SelectorConfig::default();
        assert_eq!(config.min_duration_secs, 20);
        assert_eq!(config.max_duration_secs, 300);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SelectorConfig = toml::from_str("min_duration_secs = 45").unwrap();
        assert_eq!(config.min_duration_secs, 45);
        assert_eq!(config.max_duration_secs, 300);
    }
}
