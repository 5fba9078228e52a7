mod config;
mod detection;
mod engine;
mod error;
mod matching;
mod rect;
mod track;
mod track_state;

pub use config::{FilterConfig, MatchStrategy};
pub use detection::{BoxCoords, Detection, RawDetection};
pub use engine::{FilterEngine, FilterResult, FilterStats};
pub use error::{FilterError, InvalidDetection, Result};
pub use matching::{AssignmentResult, match_detections};
pub use rect::{Rect, iou_batch};
pub use track::Track;
pub use track_state::TrackState;
