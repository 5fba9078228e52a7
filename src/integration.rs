//! Integration module for connecting plate detectors with the filter.
//!
//! This module provides traits and utilities for feeding detector output
//! into a [`FilterEngine`](crate::FilterEngine), for one stream or many.

mod builder;
mod detector;
mod multi_stream;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use multi_stream::MultiStreamFilter;
pub use pipeline::FilterPipeline;
