//! Builder for creating RawDetection objects from various input formats.

use crate::filter::{BoxCoords, RawDetection};

/// Builder for creating `RawDetection` objects from various input formats.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    coords: Option<BoxCoords>,
    score: f32,
    text: Option<String>,
    frame_id: u64,
    timestamp: f64,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2), absolute pixels.
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.coords = Some(BoxCoords::Pixels([x1, y1, x2, y2]));
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.tlbr(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(self, l: f32, t: f32, w: f32, h: f32) -> Self {
        self.tlbr(l, t, l + w, t + h)
    }

    /// Set bounding box as TLBR fractions of a `frame_width` x `frame_height` frame.
    pub fn normalized(
        mut self,
        tlbr: [f32; 4],
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        self.coords = Some(BoxCoords::Normalized {
            tlbr,
            frame_width,
            frame_height,
        });
        self
    }

    /// Set the confidence score.
    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    /// Set the recognized plate text.
    pub fn text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn frame_id(mut self, frame_id: u64) -> Self {
        self.frame_id = frame_id;
        self
    }

    pub fn timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Build the final `RawDetection`. A builder without a box yields an
    /// empty box, which the engine drops as malformed.
    pub fn build(self) -> RawDetection {
        RawDetection {
            coords: self.coords.unwrap_or(BoxCoords::Pixels([0.0; 4])),
            score: self.score,
            text: self.text,
            frame_id: self.frame_id,
            timestamp: self.timestamp,
        }
    }
}
