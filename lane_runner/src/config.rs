//! Runner configuration, loaded from an optional YAML file.
//!
//! Every section and field has a default, so a file only needs the keys it
//! changes:
//!
//! ```yaml
//! sim:
//!   duration_secs: 60
//!   seed: 7
//! gesture:
//!   activity:
//!     impact_factor: 3.0
//! sound:
//!   enabled: false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hand_signal::PipelineConfig;
use lane_sim::SimConfig;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub gesture: PipelineConfig,
    pub camera:  CameraConfig,
    pub sim:     SimConfig,
    pub sound:   SoundConfig,
    pub scores:  ScoresConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Detector frame width in pixels; wrist X is scaled into this space.
    pub frame_width:   f32,
    /// Consecutive detector failures before the bus reports not live.
    pub max_failures:  u32,
    /// Producer sleep when a source has no new frame.
    pub poll_ms:       u64,
    /// Synthetic hand frame period.
    pub sim_frame_ms:  u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            frame_width:  640.0,
            max_failures: 3,
            poll_ms:      5,
            sim_frame_ms: 33,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    pub enabled:    bool,
    /// GM program 0–127.
    pub instrument: u8,
    pub channel:    u8,
    pub velocity:   u8,
}

impl Default for SoundConfig {
    fn default() -> Self {
        SoundConfig { enabled: true, instrument: 11, channel: 0, velocity: 100 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoresConfig {
    pub path: PathBuf,
}

impl Default for ScoresConfig {
    fn default() -> Self {
        ScoresConfig { path: PathBuf::from("scores.json") }
    }
}

impl RunnerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(RunnerConfig::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
