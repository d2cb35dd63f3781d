use super::params::SynthParams;
use super::voice_config::VoiceConfig;
use crate::error::{Result, SynthError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub max_voices: usize,
    pub channels: usize,
    pub voice: VoiceConfig,
    /// Parameter values at startup.
    pub params: SynthParams,
}

impl SynthConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.params = config.params.clamped();
        config.channels = config.channels.max(1);
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SynthError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            max_voices: 6,
            channels: 2,
            voice: VoiceConfig::default(),
            params: SynthParams::default(),
        }
    }
}
