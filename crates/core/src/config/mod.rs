use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{EasingCurve, EngineError, Result};

/// Top-level configuration structure for hosts driving the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tempo: TempoConfig,
    pub modulator: ModulatorConfig,
    pub frame: FrameConfig,
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(?path, "loading configuration");
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Rejects values the engine would refuse at construction time, so a bad
    /// file fails on load rather than mid-run.
    pub fn validate(&self) -> Result<()> {
        if !self.tempo.bpm.is_finite() || self.tempo.bpm <= 0.0 {
            return Err(EngineError::config(format!(
                "tempo.bpm must be positive, found {}",
                self.tempo.bpm
            )));
        }
        if !self.tempo.beats_per_loop.is_finite() || self.tempo.beats_per_loop <= 0.0 {
            return Err(EngineError::config(format!(
                "tempo.beats_per_loop must be positive, found {}",
                self.tempo.beats_per_loop
            )));
        }
        if self.modulator.capacity == 0 {
            return Err(EngineError::config("modulator.capacity must be positive"));
        }
        if !self.modulator.crossfade_seconds.is_finite() || self.modulator.crossfade_seconds < 0.0 {
            return Err(EngineError::config(format!(
                "modulator.crossfade_seconds must be non-negative, found {}",
                self.modulator.crossfade_seconds
            )));
        }
        if !self.frame.fps.is_finite() || self.frame.fps <= 0.0 {
            return Err(EngineError::config(format!(
                "frame.fps must be positive, found {}",
                self.frame.fps
            )));
        }
        Ok(())
    }
}

/// Musical timing shared by every envelope the host creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    pub bpm: f64,
    pub beats_per_loop: f64,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            beats_per_loop: 4.0,
        }
    }
}

/// Configuration specific to the modulator and its crossfades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulatorConfig {
    pub capacity: usize,
    pub crossfade_seconds: f64,
    pub easing: EasingCurve,
}

impl Default for ModulatorConfig {
    fn default() -> Self {
        Self {
            capacity: crate::modulator::DEFAULT_CAPACITY,
            crossfade_seconds: 2.0,
            easing: EasingCurve::Linear,
        }
    }
}

/// Simulated frame loop used by headless hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub fps: f64,
    pub frames: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            fps: 60.0,
            frames: 240,
        }
    }
}

impl FrameConfig {
    /// Seconds between two simulated frames.
    pub fn delta_time(&self) -> f64 {
        1.0 / self.fps
    }
}
