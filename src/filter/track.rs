//! Per-plate track and its lifecycle transitions.

use std::collections::VecDeque;

use serde::Serialize;

use crate::filter::config::FilterConfig;
use crate::filter::detection::Detection;
use crate::filter::rect::Rect;
use crate::filter::track_state::TrackState;

/// One physical plate followed across frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    /// Identifier, unique within the owning engine
    pub track_id: u64,
    pub state: TrackState,
    /// Whether the track has ever been confirmed
    pub is_activated: bool,
    /// Box of the most recent matched detection
    pub bbox: Rect,
    /// Score of the most recent matched detection
    pub score: f32,
    /// Most recent scores, oldest first
    pub confidence_history: VecDeque<f32>,
    /// Consecutive frames with a match
    pub hit_streak: u32,
    /// Consecutive frames without a match
    pub misses: u32,
    /// Frame the track was created in
    pub start_frame: u64,
    /// Frame of the most recent match
    pub frame_id: u64,
    /// Timestamp of the most recent match
    pub timestamp: f64,
    /// Text of the highest-scoring observation that carried text
    pub best_text: Option<String>,
    pub best_text_score: f32,
}

impl Track {
    pub(crate) fn new(track_id: u64, det: Detection, config: &FilterConfig) -> Self {
        let mut track = Self {
            track_id,
            state: TrackState::Tentative,
            is_activated: false,
            bbox: det.bbox,
            score: det.score,
            confidence_history: VecDeque::with_capacity(config.history_len),
            hit_streak: 0,
            misses: 0,
            start_frame: det.frame_id,
            frame_id: det.frame_id,
            timestamp: det.timestamp,
            best_text: None,
            best_text_score: 0.0,
        };
        track.mark_matched(det, config);
        track
    }

    /// Absorb this frame's matched detection.
    pub(crate) fn mark_matched(&mut self, det: Detection, config: &FilterConfig) {
        self.misses = 0;
        self.hit_streak = self.hit_streak.saturating_add(1);

        self.bbox = det.bbox;
        self.score = det.score;
        self.frame_id = det.frame_id;
        self.timestamp = det.timestamp;

        self.confidence_history.push_back(det.score);
        while self.confidence_history.len() > config.history_len {
            self.confidence_history.pop_front();
        }

        if let Some(text) = det.text {
            if self.best_text.is_none() || det.score > self.best_text_score {
                self.best_text = Some(text);
                self.best_text_score = det.score;
            }
        }

        self.state = match self.state {
            TrackState::Confirmed => TrackState::Confirmed,
            TrackState::Lost if self.is_activated => TrackState::Confirmed,
            _ if self.hit_streak >= config.confirm_frames => TrackState::Confirmed,
            _ => TrackState::Tentative,
        };
        if self.state == TrackState::Confirmed {
            self.is_activated = true;
        }
    }

    /// Record a frame in which nothing matched this track.
    pub(crate) fn mark_missed(&mut self, config: &FilterConfig) {
        self.misses = self.misses.saturating_add(1);
        self.hit_streak = 0;
        if self.misses >= config.lost_frames {
            self.state = TrackState::Lost;
        }
    }

    /// Lost for longer than the grace period.
    pub fn is_expired(&self, config: &FilterConfig) -> bool {
        self.state == TrackState::Lost
            && self.misses >= config.lost_frames.saturating_add(config.lost_grace_frames)
    }

    /// Whether this track was matched in `frame_id`.
    pub fn seen_in(&self, frame_id: u64) -> bool {
        self.frame_id == frame_id && self.misses == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::detection::RawDetection;

    fn det(frame_id: u64, score: f32, text: Option<&str>) -> Detection {
        let mut raw = RawDetection::new(10.0, 10.0, 50.0, 50.0, score, frame_id);
        raw.text = text.map(str::to_owned);
        raw.validate().unwrap()
    }

    #[test]
    fn test_promotion_after_confirm_frames() {
        let config = FilterConfig::default();
        let mut track = Track::new(1, det(1, 0.9, None), &config);
        assert_eq!(track.state, TrackState::Tentative);

        track.mark_matched(det(2, 0.9, None), &config);
        assert_eq!(track.state, TrackState::Tentative);

        track.mark_matched(det(3, 0.9, None), &config);
        assert_eq!(track.state, TrackState::Confirmed);
        assert!(track.is_activated);
    }

    #[test]
    fn test_single_frame_confirmation() {
        let config = FilterConfig {
            confirm_frames: 1,
            ..FilterConfig::default()
        };
        let track = Track::new(1, det(1, 0.9, None), &config);
        assert_eq!(track.state, TrackState::Confirmed);
    }

    #[test]
    fn test_miss_resets_streak() {
        let config = FilterConfig::default();
        let mut track = Track::new(1, det(1, 0.9, None), &config);
        track.mark_matched(det(2, 0.9, None), &config);
        track.mark_missed(&config);
        track.mark_matched(det(4, 0.9, None), &config);
        assert_eq!(track.hit_streak, 1);
        assert_eq!(track.state, TrackState::Tentative);
    }

    #[test]
    fn test_lost_and_expired() {
        let config = FilterConfig {
            lost_grace_frames: 2,
            ..FilterConfig::default()
        };
        let mut track = Track::new(1, det(1, 0.9, None), &config);
        for _ in 0..4 {
            track.mark_missed(&config);
        }
        assert_eq!(track.state, TrackState::Tentative);

        track.mark_missed(&config);
        assert_eq!(track.state, TrackState::Lost);
        assert!(!track.is_expired(&config));

        track.mark_missed(&config);
        track.mark_missed(&config);
        assert!(track.is_expired(&config));
    }

    #[test]
    fn test_lost_recovery_restores_confirmation() {
        let config = FilterConfig {
            lost_grace_frames: 3,
            ..FilterConfig::default()
        };
        let mut track = Track::new(1, det(1, 0.9, None), &config);
        track.mark_matched(det(2, 0.9, None), &config);
        track.mark_matched(det(3, 0.9, None), &config);
        for _ in 0..5 {
            track.mark_missed(&config);
        }
        assert_eq!(track.state, TrackState::Lost);

        track.mark_matched(det(9, 0.8, None), &config);
        assert_eq!(track.state, TrackState::Confirmed);
        assert_eq!(track.misses, 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let config = FilterConfig {
            history_len: 3,
            ..FilterConfig::default()
        };
        let mut track = Track::new(1, det(1, 0.1, None), &config);
        for (frame, score) in [(2, 0.2), (3, 0.3), (4, 0.4)] {
            track.mark_matched(det(frame, score, None), &config);
        }
        assert_eq!(
            track.confidence_history.iter().copied().collect::<Vec<_>>(),
            vec![0.2, 0.3, 0.4]
        );
    }

    #[test]
    fn test_best_text_follows_highest_score() {
        let config = FilterConfig::default();
        let mut track = Track::new(1, det(1, 0.6, Some("A8C123")), &config);
        track.mark_matched(det(2, 0.9, Some("ABC123")), &config);
        track.mark_matched(det(3, 0.7, Some("ABC12")), &config);
        track.mark_matched(det(4, 0.95, None), &config);
        assert_eq!(track.best_text.as_deref(), Some("ABC123"));
        assert_eq!(track.best_text_score, 0.9);
    }
}
