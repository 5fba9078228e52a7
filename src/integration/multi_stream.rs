//! One isolated filter engine per camera stream.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::debug;

use crate::filter::{FilterConfig, FilterEngine, FilterResult, RawDetection, Result};

/// Keeps an independent [`FilterEngine`] for every stream key.
///
/// Engines are created lazily from a shared configuration on a stream's
/// first frame. Nothing is shared between them, so `engines_mut` can hand
/// them out to separate threads.
#[derive(Debug, Clone)]
pub struct MultiStreamFilter {
    config: FilterConfig,
    engines: BTreeMap<String, FilterEngine>,
}

impl MultiStreamFilter {
    pub fn new(config: FilterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            engines: BTreeMap::new(),
        })
    }

    /// Filter one frame of `stream`.
    pub fn process_frame(
        &mut self,
        stream: &str,
        frame_id: u64,
        detections: Vec<RawDetection>,
    ) -> Vec<FilterResult> {
        let engine = match self.engines.entry(stream.to_owned()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                debug!(stream, "starting filter for new stream");
                entry.insert(FilterEngine::with_checked_config(self.config.clone()))
            }
        };
        engine.process_frame(frame_id, detections)
    }

    pub fn engine(&self, stream: &str) -> Option<&FilterEngine> {
        self.engines.get(stream)
    }

    /// Mutable access to every engine, ordered by stream key.
    pub fn engines_mut(&mut self) -> impl Iterator<Item = (&str, &mut FilterEngine)> {
        self.engines.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Tear a stream down, returning its engine.
    pub fn remove_stream(&mut self, stream: &str) -> Option<FilterEngine> {
        self.engines.remove(stream)
    }

    /// Known stream keys in sorted order.
    pub fn streams(&self) -> impl Iterator<Item = &str> {
        self.engines.keys().map(String::as_str)
    }
}
