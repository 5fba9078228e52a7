//! Trait for upstream plate detectors.

use crate::filter::RawDetection;

/// Trait for license plate detection backends.
///
/// Implement this trait to connect any detection model to the filter. The
/// detector must return fully materialized results for the frame.
///
/// # Example
///
/// ```ignore
/// use plate_filter_rs::{DetectionSource, RawDetection};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(
///         &mut self,
///         frame_id: u64,
///         input: &[u8],
///         width: u32,
///         height: u32,
///     ) -> Result<Vec<RawDetection>, Self::Error> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error;

    /// Run inference on raw image data and return detections.
    ///
    /// # Arguments
    /// * `frame_id` - Identifier of the frame, stamped onto every detection
    /// * `input` - Raw image bytes (format depends on implementation)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    fn detect(
        &mut self,
        frame_id: u64,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<RawDetection>, Self::Error>;
}

/// Helper trait for converting model-specific outputs to `RawDetection`.
pub trait IntoDetections {
    /// Convert the output into detections belonging to `frame_id`.
    fn into_detections(self, frame_id: u64) -> Vec<RawDetection>;
}

impl IntoDetections for Vec<RawDetection> {
    fn into_detections(self, frame_id: u64) -> Vec<RawDetection> {
        self.into_iter()
            .map(|mut det| {
                det.frame_id = frame_id;
                det
            })
            .collect()
    }
}

/// `(x1, y1, x2, y2, score)` tuples in absolute pixels, as emitted by most
/// detector post-processing.
impl IntoDetections for Vec<([f32; 4], f32)> {
    fn into_detections(self, frame_id: u64) -> Vec<RawDetection> {
        self.into_iter()
            .map(|([x1, y1, x2, y2], score)| RawDetection::new(x1, y1, x2, y2, score, frame_id))
            .collect()
    }
}
