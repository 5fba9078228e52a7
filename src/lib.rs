//! Temporal filtering of license plate detections.
//!
//! Raw per-frame detector output (boxes, scores, optional plate text) goes
//! into a [`FilterEngine`], which associates detections across frames by IoU,
//! runs each plate through a tentative / confirmed / lost lifecycle, and
//! emits one [`FilterResult`] per confirmed plate per frame.
//!
//! ```
//! use plate_filter_rs::{FilterConfig, FilterEngine, RawDetection};
//!
//! let mut engine = FilterEngine::new(FilterConfig::default()).unwrap();
//! for frame in 1..=3 {
//!     let dets = vec![RawDetection::new(10.0, 10.0, 50.0, 50.0, 0.9, frame)];
//!     let results = engine.process_frame(frame, dets);
//!     assert_eq!(results.len(), usize::from(frame == 3));
//! }
//! ```

pub mod filter;
pub mod integration;

pub use filter::{
    BoxCoords, Detection, FilterConfig, FilterEngine, FilterError, FilterResult, FilterStats,
    InvalidDetection, MatchStrategy, RawDetection, Rect, Track, TrackState,
};
pub use integration::{
    DetectionBuilder, DetectionSource, FilterPipeline, IntoDetections, MultiStreamFilter,
};
