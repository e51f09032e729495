//! Immutable object snapshots
//!
//! A `FrozenObject` is the capture-time snapshot of an object's own
//! enumerable properties. Updates elsewhere in the system always produce a
//! new snapshot; an existing one is never edited in place.

use std::sync::Arc;

use crate::error::CoreError;
use crate::value::ShareableValue;

/// Marker property holding a worklet's content-hash identity.
pub const KEY_WORKLET_HASH: &str = "__workletHash";
/// Marker property holding a worklet's source text.
pub const KEY_AS_STRING: &str = "asString";
/// Marker property holding a worklet's human-readable origin label.
pub const KEY_LOCATION: &str = "__location";

/// Ordered property snapshot, frozen at capture time.
#[derive(Debug, Clone)]
pub struct FrozenObject {
    entries: Vec<(String, Arc<ShareableValue>)>,
}

impl FrozenObject {
    pub fn new(entries: Vec<(String, Arc<ShareableValue>)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ShareableValue>> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, value)| value)
    }

    /// Entries in capture order.
    pub fn iter(&self) -> impl Iterator<Item = &(String, Arc<ShareableValue>)> {
        self.entries.iter()
    }

    /// Extract worklet identity from the marker properties.
    ///
    /// Fails with [`CoreError::MissingWorkletMetadata`] when the snapshot was
    /// not captured from a worklet. A missing `__location` is tolerated.
    pub fn worklet_metadata(&self) -> Result<(i64, &str, &str), CoreError> {
        let hash = self
            .get(KEY_WORKLET_HASH)
            .ok_or(CoreError::MissingWorkletMetadata { field: KEY_WORKLET_HASH })?
            .as_number()? as i64;
        let source = self
            .get(KEY_AS_STRING)
            .ok_or(CoreError::MissingWorkletMetadata { field: KEY_AS_STRING })?
            .as_str()?;
        let location = match self.get(KEY_LOCATION) {
            Some(value) => value.as_str()?,
            None => "<unknown>",
        };
        Ok((hash, source, location))
    }
}

/// Wire representation of a worklet: identity, source text and every
/// variable it captured.
#[derive(Debug, Clone)]
pub struct WorkletSnapshot {
    /// Stable content-hash identity; taken as given, never recomputed.
    pub hash: i64,
    /// Source text of a function expression.
    pub source: String,
    /// Origin label used for diagnostics only.
    pub location: String,
    /// Captured variables, excluding the marker properties.
    pub captures: FrozenObject,
}
