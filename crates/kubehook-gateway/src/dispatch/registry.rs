use std::sync::Arc;

use dashmap::DashMap;

use kubehook_core::error::{KubehookError, Result};
use kubehook_core::review::ReviewKind;

use super::dispatcher::ReviewProcessor;

/// Maps a review kind to the processor that handles it.
#[derive(Default)]
pub struct Registry {
    processors: DashMap<ReviewKind, Arc<dyn ReviewProcessor>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            processors: DashMap::new(),
        }
    }

    /// Register a processor under the kind it declares. Replaces any earlier
    /// registration for that kind.
    pub fn register(&self, processor: Arc<dyn ReviewProcessor>) {
        self.processors.insert(processor.kind(), processor);
    }

    pub fn registered_kinds(&self) -> Vec<ReviewKind> {
        self.processors.iter().map(|e| *e.key()).collect()
    }

    /// Kinds of the closed set that have no processor yet.
    pub fn missing_kinds(&self) -> Vec<ReviewKind> {
        ReviewKind::ALL
            .into_iter()
            .filter(|k| !self.processors.contains_key(k))
            .collect()
    }

    /// Look up the processor for a wire `kind` string.
    pub fn resolve(&self, kind: &str) -> Result<Arc<dyn ReviewProcessor>> {
        let parsed: ReviewKind = kind.parse()?;
        self.processors
            .get(&parsed)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| KubehookError::UnknownKind(kind.to_string()))
    }
}
