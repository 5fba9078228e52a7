//! Detection records: raw detector output and its validated form.

use serde::{Deserialize, Serialize};

use crate::filter::error::InvalidDetection;
use crate::filter::rect::Rect;

/// Box coordinates as produced by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxCoords {
    /// Absolute pixel corners (x_min, y_min, x_max, y_max).
    Pixels([f32; 4]),
    /// Corners in [0, 1] relative to the frame size.
    Normalized {
        tlbr: [f32; 4],
        frame_width: u32,
        frame_height: u32,
    },
}

/// One unvalidated detection handed in by the upstream detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub coords: BoxCoords,
    pub score: f32,
    #[serde(default)]
    pub text: Option<String>,
    pub frame_id: u64,
    #[serde(default)]
    pub timestamp: f64,
}

impl RawDetection {
    /// Raw detection with absolute pixel corners.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32, frame_id: u64) -> Self {
        Self {
            coords: BoxCoords::Pixels([x1, y1, x2, y2]),
            score,
            text: None,
            frame_id,
            timestamp: 0.0,
        }
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Check the detection and convert it to absolute pixels.
    pub fn validate(self) -> Result<Detection, InvalidDetection> {
        if !(0.0..=1.0).contains(&self.score) {
            return Err(InvalidDetection::ScoreOutOfRange(self.score));
        }
        if !self.timestamp.is_finite() {
            return Err(InvalidDetection::InvalidTimestamp(self.timestamp));
        }

        let tlbr = match self.coords {
            BoxCoords::Pixels(tlbr) => tlbr,
            BoxCoords::Normalized {
                tlbr,
                frame_width,
                frame_height,
            } => {
                if frame_width == 0 || frame_height == 0 {
                    return Err(InvalidDetection::InvalidFrameSize {
                        width: frame_width,
                        height: frame_height,
                    });
                }
                if tlbr.iter().any(|v| !(0.0..=1.0).contains(v)) {
                    return Err(InvalidDetection::NormalizedOutOfRange(tlbr));
                }
                let (w, h) = (frame_width as f32, frame_height as f32);
                [tlbr[0] * w, tlbr[1] * h, tlbr[2] * w, tlbr[3] * h]
            }
        };

        let bbox = Rect::from_tlbr(tlbr[0], tlbr[1], tlbr[2], tlbr[3]);
        if !bbox.is_well_formed() {
            return Err(InvalidDetection::MalformedBox(tlbr));
        }

        Ok(Detection {
            bbox,
            score: self.score,
            text: self.text,
            frame_id: self.frame_id,
            timestamp: self.timestamp,
        })
    }
}

/// A validated detection in absolute pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: Rect,
    pub score: f32,
    pub text: Option<String>,
    pub frame_id: u64,
    pub timestamp: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_pixel_detection() {
        let det = RawDetection::new(10.0, 10.0, 50.0, 50.0, 0.9, 1)
            .with_text("ABC123")
            .validate()
            .unwrap();
        assert_eq!(det.bbox, Rect::new(10.0, 10.0, 40.0, 40.0));
        assert_eq!(det.text.as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_normalized_converted_to_pixels() {
        let raw = RawDetection {
            coords: BoxCoords::Normalized {
                tlbr: [0.1, 0.25, 0.5, 0.75],
                frame_width: 200,
                frame_height: 100,
            },
            score: 0.5,
            text: None,
            frame_id: 3,
            timestamp: 0.1,
        };
        let det = raw.validate().unwrap();
        assert_eq!(det.bbox.to_tlbr(), [20.0, 25.0, 100.0, 75.0]);
    }

    #[test]
    fn test_rejects_bad_scores() {
        for score in [-0.1, 1.01, f32::NAN, f32::INFINITY] {
            let err = RawDetection::new(0.0, 0.0, 10.0, 10.0, score, 1)
                .validate()
                .unwrap_err();
            assert!(matches!(err, InvalidDetection::ScoreOutOfRange(_)));
        }
    }

    #[test]
    fn test_rejects_inverted_and_degenerate_boxes() {
        let inverted = RawDetection::new(50.0, 10.0, 10.0, 50.0, 0.9, 1).validate();
        assert!(matches!(inverted, Err(InvalidDetection::MalformedBox(_))));

        let flat = RawDetection::new(10.0, 10.0, 50.0, 10.0, 0.9, 1).validate();
        assert!(matches!(flat, Err(InvalidDetection::MalformedBox(_))));

        let nan = RawDetection::new(f32::NAN, 10.0, 50.0, 50.0, 0.9, 1).validate();
        assert!(matches!(nan, Err(InvalidDetection::MalformedBox(_))));

        let inf = RawDetection::new(0.0, 0.0, f32::INFINITY, 50.0, 0.9, 1).validate();
        assert!(matches!(inf, Err(InvalidDetection::MalformedBox(_))));
    }

    #[test]
    fn test_rejects_bad_normalized_input() {
        let mut raw = RawDetection::new(0.0, 0.0, 1.0, 1.0, 0.9, 1);
        raw.coords = BoxCoords::Normalized {
            tlbr: [0.0, 0.0, 1.2, 0.5],
            frame_width: 640,
            frame_height: 480,
        };
        assert!(matches!(
            raw.clone().validate(),
            Err(InvalidDetection::NormalizedOutOfRange(_))
        ));

        raw.coords = BoxCoords::Normalized {
            tlbr: [0.0, 0.0, 0.5, 0.5],
            frame_width: 0,
            frame_height: 480,
        };
        assert!(matches!(
            raw.validate(),
            Err(InvalidDetection::InvalidFrameSize { .. })
        ));
    }

    #[test]
    fn test_rejects_non_finite_timestamp() {
        let err = RawDetection::new(0.0, 0.0, 10.0, 10.0, 0.5, 1)
            .with_timestamp(f64::NAN)
            .validate()
            .unwrap_err();
        assert!(matches!(err, InvalidDetection::InvalidTimestamp(_)));
    }

    #[test]
    fn test_raw_detection_from_json() {
        let raw: RawDetection = serde_json::from_str(
            r#"{"coords":{"pixels":[1.0,2.0,3.0,4.0]},"score":0.7,"frame_id":9}"#,
        )
        .unwrap();
        assert_eq!(raw.coords, BoxCoords::Pixels([1.0, 2.0, 3.0, 4.0]));
        assert_eq!(raw.text, None);
        assert_eq!(raw.timestamp, 0.0);
    }
}
