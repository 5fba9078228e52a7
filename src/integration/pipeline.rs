//! FilterPipeline for combining detection with filtering.

use crate::filter::{FilterConfig, FilterEngine, FilterResult, Result};

use super::DetectionSource;

/// Bundles a detector with a [`FilterEngine`] for one video stream.
pub struct FilterPipeline<D: DetectionSource> {
    detector: D,
    engine: FilterEngine,
}

impl<D: DetectionSource> FilterPipeline<D> {
    /// Create a new pipeline with the given detector and filter config.
    pub fn new(detector: D, config: FilterConfig) -> Result<Self> {
        Ok(Self {
            detector,
            engine: FilterEngine::new(config)?,
        })
    }

    /// Create a new pipeline with default filter configuration.
    pub fn with_default_config(detector: D) -> Self {
        Self {
            detector,
            engine: FilterEngine::default(),
        }
    }

    /// Run detection on a frame and filter the result.
    ///
    /// Only detector failures are returned as errors; filtering itself never
    /// fails.
    pub fn process_frame(
        &mut self,
        frame_id: u64,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> std::result::Result<Vec<FilterResult>, D::Error> {
        let detections = self.detector.detect(frame_id, input, width, height)?;
        Ok(self.engine.process_frame(frame_id, detections))
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying engine.
    pub fn engine(&self) -> &FilterEngine {
        &self.engine
    }

    /// Get a mutable reference to the underlying engine.
    pub fn engine_mut(&mut self) -> &mut FilterEngine {
        &mut self.engine
    }
}
