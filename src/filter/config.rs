//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::filter::error::{FilterError, Result};

/// How tracks and detections are associated each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Minimum-cost assignment (LAPJV).
    #[default]
    Optimal,
    /// Repeatedly take the highest-IoU remaining pair.
    Greedy,
}

/// Configuration for the [`FilterEngine`](crate::FilterEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum IoU to associate a detection with a track.
    pub iou_threshold: f32,
    /// Consecutive matches required to confirm a track.
    pub confirm_frames: u32,
    /// Consecutive misses before a track is marked lost.
    pub lost_frames: u32,
    /// Minimum current score for a confirmed track to be emitted.
    pub emission_threshold: f32,
    /// Extra misses a lost track survives before it is destroyed.
    pub lost_grace_frames: u32,
    /// Number of recent scores kept per track.
    pub history_len: usize,
    pub match_strategy: MatchStrategy,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.3,
            confirm_frames: 3,
            lost_frames: 5,
            emission_threshold: 0.5,
            lost_grace_frames: 0,
            history_len: 10,
            match_strategy: MatchStrategy::Optimal,
        }
    }
}

impl FilterConfig {
    /// Parse a JSON document and validate it. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        unit_interval("iou_threshold", self.iou_threshold)?;
        unit_interval("emission_threshold", self.emission_threshold)?;
        if self.confirm_frames == 0 {
            return Err(FilterError::invalid_config("confirm_frames", "must be at least 1"));
        }
        if self.lost_frames == 0 {
            return Err(FilterError::invalid_config("lost_frames", "must be at least 1"));
        }
        if self.history_len == 0 {
            return Err(FilterError::invalid_config("history_len", "must be at least 1"));
        }
        Ok(())
    }
}

fn unit_interval(field: &'static str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(FilterError::invalid_config(
            field,
            format!("must be within [0, 1], got {value}"),
        ))
    }
}
