//! Configuration
//!
//! Platform details the protocol itself does not fix: where the null sample
//! buffers live, and whether register writes are traced.

use crate::sample::NullSamples;
use crate::{Result, SoundError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sound system configuration
///
/// Every field has a default, so a partial JSON document is valid:
///
/// ```
/// use sound_copro::SoundConfig;
///
/// let config = SoundConfig::from_json_str(r#"{ "trace_registers": true }"#).unwrap();
/// assert!(config.trace_registers);
/// assert_eq!(config.null_samples.pcm_address, 0x0001_0000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    /// Placement of the null sample buffers
    pub null_samples: NullSamples,

    /// Log every register write at `trace` level
    /// Very verbose: a single start command is 7-9 writes
    pub trace_registers: bool,
}

impl SoundConfig {
    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SoundError::ConfigError(e.to_string()))
    }

    /// Read and parse a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SoundError::ConfigError(e.to_string()))
    }

    /// Set the null sample placement
    pub fn with_null_samples(mut self, null_samples: NullSamples) -> Self {
        self.null_samples = null_samples;
        self
    }

    /// Enable or disable register tracing
    pub fn with_trace_registers(mut self, trace: bool) -> Self {
        self.trace_registers = trace;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SoundConfig::default();
        assert_eq!(config.null_samples, NullSamples::default());
        assert!(!config.trace_registers);
    }

    #[test]
    fn test_partial_json() {
        let config =
            SoundConfig::from_json_str(r#"{ "null_samples": { "adpcm_address": 512 } }"#).unwrap();
        assert_eq!(config.null_samples.adpcm_address, 512);
        assert_eq!(config.null_samples.pcm_address, NullSamples::DEFAULT_PCM_ADDRESS);
    }

    #[test]
    fn test_json_round_trip() {
        let config = SoundConfig::default()
            .with_trace_registers(true)
            .with_null_samples(NullSamples {
                pcm_address: 0x0002_0000,
                adpcm_address: 0x0002_0080,
            });
        let json = config.to_json_pretty().unwrap();
        assert_eq!(SoundConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = SoundConfig::from_json_str("{ trace_registers: yes").unwrap_err();
        assert!(matches!(err, SoundError::ConfigError(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "trace_registers": true }}"#).unwrap();
        let config = SoundConfig::from_path(file.path()).unwrap();
        assert!(config.trace_registers);

        let missing = SoundConfig::from_path(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(SoundError::Io(_))));
    }
}
