//! Frame-by-frame filter engine.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::filter::config::FilterConfig;
use crate::filter::detection::{Detection, RawDetection};
use crate::filter::error::{InvalidDetection, Result};
use crate::filter::matching::{self, AssignmentResult};
use crate::filter::rect::Rect;
use crate::filter::track::Track;
use crate::filter::track_state::TrackState;

/// One stable plate observation emitted for a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResult {
    pub track_id: u64,
    pub bbox: Rect,
    pub score: f32,
    pub text: Option<String>,
    pub state: TrackState,
    pub frame_id: u64,
    pub timestamp: f64,
}

impl FilterResult {
    fn from_track(track: &Track) -> Self {
        Self {
            track_id: track.track_id,
            bbox: track.bbox,
            score: track.score,
            text: track.best_text.clone(),
            state: track.state,
            frame_id: track.frame_id,
            timestamp: track.timestamp,
        }
    }
}

/// Running counters for one engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub frames_processed: u64,
    /// Frames ignored because they arrived out of order
    pub frames_rejected: u64,
    pub detections_received: u64,
    pub detections_dropped: u64,
    pub tracks_created: u64,
    pub tracks_confirmed: u64,
    pub tracks_destroyed: u64,
    pub results_emitted: u64,
}

/// Turns per-frame detections of one video stream into stable plate tracks.
///
/// Frames must be fed in arrival order. Each stream needs its own engine;
/// engines share no state.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    /// Active tracks, ordered by id
    tracks: Vec<Track>,
    config: FilterConfig,
    frame_id: Option<u64>,
    next_track_id: u64,
    stats: FilterStats,
}

impl FilterEngine {
    pub fn new(config: FilterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_checked_config(config))
    }

    /// Build an engine from a configuration that already passed `validate`.
    pub(crate) fn with_checked_config(config: FilterConfig) -> Self {
        Self {
            tracks: Vec::new(),
            config,
            frame_id: None,
            next_track_id: 1,
            stats: FilterStats::default(),
        }
    }

    /// Process one frame and return the confirmed plates seen in it, ordered
    /// by track id.
    ///
    /// Invalid detections are dropped. A frame whose id is not greater than
    /// the previous one is ignored and yields no results.
    pub fn process_frame(
        &mut self,
        frame_id: u64,
        detections: Vec<RawDetection>,
    ) -> Vec<FilterResult> {
        if let Some(last) = self.frame_id {
            if frame_id <= last {
                warn!(frame_id, last, "ignoring out-of-order frame");
                self.stats.frames_rejected += 1;
                return Vec::new();
            }
        }
        self.frame_id = Some(frame_id);
        self.stats.frames_processed += 1;

        let detections = self.accept_detections(frame_id, detections);

        // Step 1: Associate detections with every live track
        let track_boxes: Vec<Rect> = self.tracks.iter().map(|t| t.bbox).collect();
        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::match_detections(
            &track_boxes,
            &detections,
            self.config.iou_threshold,
            self.config.match_strategy,
        );

        let mut detections: Vec<Option<Detection>> = detections.into_iter().map(Some).collect();

        // Step 2: Update matched tracks
        for (itrack, idet) in matches {
            let Some(det) = detections[idet].take() else {
                continue;
            };
            let track = &mut self.tracks[itrack];
            let before = track.state;
            track.mark_matched(det, &self.config);
            if before != TrackState::Confirmed && track.state == TrackState::Confirmed {
                if before == TrackState::Lost {
                    debug!(track_id = track.track_id, frame_id, "track recovered");
                } else {
                    debug!(track_id = track.track_id, frame_id, "track confirmed");
                    self.stats.tracks_confirmed += 1;
                }
            }
        }

        // Step 3: Age tracks that found nothing
        for itrack in unmatched_tracks {
            let track = &mut self.tracks[itrack];
            let before = track.state;
            track.mark_missed(&self.config);
            if before != TrackState::Lost && track.state == TrackState::Lost {
                debug!(track_id = track.track_id, frame_id, misses = track.misses, "track lost");
            }
        }

        // Step 4: Start tracks for leftover detections
        for idet in unmatched_detections {
            let Some(det) = detections[idet].take() else {
                continue;
            };
            let track_id = self.next_track_id;
            self.next_track_id += 1;
            let track = Track::new(track_id, det, &self.config);
            debug!(track_id, frame_id, state = ?track.state, "track created");
            self.stats.tracks_created += 1;
            if track.state == TrackState::Confirmed {
                self.stats.tracks_confirmed += 1;
            }
            self.tracks.push(track);
        }

        // Step 5: Drop tracks lost beyond the grace period
        let config = &self.config;
        let stats = &mut self.stats;
        self.tracks.retain(|track| {
            if track.is_expired(config) {
                debug!(track_id = track.track_id, frame_id, "track destroyed");
                stats.tracks_destroyed += 1;
                false
            } else {
                true
            }
        });

        let results: Vec<FilterResult> = self
            .tracks
            .iter()
            .filter(|t| t.state == TrackState::Confirmed && t.seen_in(frame_id))
            .filter(|t| t.score >= self.config.emission_threshold)
            .map(FilterResult::from_track)
            .collect();

        self.stats.results_emitted += results.len() as u64;
        trace!(
            frame_id,
            tracks = self.tracks.len(),
            emitted = results.len(),
            "frame processed"
        );
        results
    }

    /// Validate incoming detections and put them in a canonical order so
    /// association does not depend on the detector's output order.
    fn accept_detections(&mut self, frame_id: u64, raw: Vec<RawDetection>) -> Vec<Detection> {
        self.stats.detections_received += raw.len() as u64;

        let mut accepted = Vec::with_capacity(raw.len());
        for det in raw {
            let checked = det.validate().and_then(|det| {
                if det.frame_id == frame_id {
                    Ok(det)
                } else {
                    Err(InvalidDetection::FrameMismatch {
                        expected: frame_id,
                        detection: det.frame_id,
                    })
                }
            });
            match checked {
                Ok(det) => accepted.push(det),
                Err(err) => {
                    debug!(frame_id, %err, "dropping invalid detection");
                    self.stats.detections_dropped += 1;
                }
            }
        }

        accepted.sort_by(canonical_order);
        accepted
    }

    /// Active tracks (tentative, confirmed, and lost within grace), ordered by id.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, track_id: u64) -> Option<&Track> {
        self.tracks
            .binary_search_by_key(&track_id, |t| t.track_id)
            .ok()
            .map(|idx| &self.tracks[idx])
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn stats(&self) -> FilterStats {
        self.stats
    }

    /// Id of the last processed frame.
    pub fn frame_id(&self) -> Option<u64> {
        self.frame_id
    }

    /// Forget all tracks and counters, keeping the configuration.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.frame_id = None;
        self.next_track_id = 1;
        self.stats = FilterStats::default();
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::with_checked_config(FilterConfig::default())
    }
}

fn canonical_order(a: &Detection, b: &Detection) -> Ordering {
    let (ta, tb) = (a.bbox.to_tlwh(), b.bbox.to_tlwh());
    ta.iter()
        .zip(tb.iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
        .then(b.score.total_cmp(&a.score))
        .then_with(|| a.text.cmp(&b.text))
        .then(a.timestamp.total_cmp(&b.timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plate(frame_id: u64, score: f32) -> RawDetection {
        RawDetection::new(10.0, 10.0, 50.0, 50.0, score, frame_id)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = FilterConfig {
            iou_threshold: -0.5,
            ..FilterConfig::default()
        };
        assert!(FilterEngine::new(config).is_err());
    }

    #[test]
    fn test_ids_increase_per_engine() {
        let mut a = FilterEngine::new(FilterConfig::default()).unwrap();
        let mut b = FilterEngine::new(FilterConfig::default()).unwrap();
        a.process_frame(1, vec![plate(1, 0.9)]);
        b.process_frame(1, vec![plate(1, 0.9)]);
        assert_eq!(a.tracks()[0].track_id, 1);
        assert_eq!(b.tracks()[0].track_id, 1);
    }

    #[test]
    fn test_out_of_order_frame_ignored() {
        let mut engine = FilterEngine::new(FilterConfig::default()).unwrap();
        engine.process_frame(5, vec![plate(5, 0.9)]);
        let results = engine.process_frame(5, vec![plate(5, 0.9)]);
        assert!(results.is_empty());
        assert_eq!(engine.tracks()[0].hit_streak, 1);
        assert_eq!(engine.stats().frames_rejected, 1);
        assert_eq!(engine.frame_id(), Some(5));
    }

    #[test]
    fn test_frame_mismatch_dropped() {
        let mut engine = FilterEngine::new(FilterConfig::default()).unwrap();
        engine.process_frame(2, vec![plate(1, 0.9)]);
        assert!(engine.tracks().is_empty());
        assert_eq!(engine.stats().detections_dropped, 1);
    }

    #[test]
    fn test_emission_threshold_gates_confirmed_tracks() {
        let mut engine = FilterEngine::new(FilterConfig::default()).unwrap();
        for frame in 1..=3 {
            engine.process_frame(frame, vec![plate(frame, 0.9)]);
        }
        let results = engine.process_frame(4, vec![plate(4, 0.4)]);
        assert!(results.is_empty());
        assert_eq!(engine.tracks()[0].state, TrackState::Confirmed);

        let results = engine.process_frame(5, vec![plate(5, 0.8)]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 0.8);
    }

    #[test]
    fn test_lookup_and_reset() {
        let mut engine = FilterEngine::new(FilterConfig::default()).unwrap();
        engine.process_frame(
            1,
            vec![
                plate(1, 0.9),
                RawDetection::new(200.0, 200.0, 260.0, 230.0, 0.8, 1),
            ],
        );
        assert_eq!(engine.tracks().len(), 2);
        assert!(engine.track(2).is_some());
        assert!(engine.track(3).is_none());

        engine.reset();
        assert!(engine.tracks().is_empty());
        assert_eq!(engine.frame_id(), None);
        assert_eq!(engine.stats(), FilterStats::default());
    }

    #[test]
    fn test_canonical_order_prefers_position_then_score() {
        let a = plate(1, 0.5).validate().unwrap();
        let b = plate(1, 0.9).validate().unwrap();
        let c = RawDetection::new(0.0, 0.0, 5.0, 5.0, 0.1, 1).validate().unwrap();
        let mut dets = vec![a.clone(), b.clone(), c.clone()];
        dets.sort_by(canonical_order);
        assert_eq!(dets, vec![c, b, a]);
    }
}
