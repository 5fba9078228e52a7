use serde::{Deserialize, Serialize};

/// Track lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackState {
    /// Seen, but not yet in enough consecutive frames
    #[default]
    Tentative,
    /// Stable track whose observations are emitted
    Confirmed,
    /// Unmatched for too long; kept only for the grace period
    Lost,
}
