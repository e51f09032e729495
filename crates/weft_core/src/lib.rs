//! Weft Core
//!
//! Engine-agnostic building blocks of the worklet bridge:
//! - Structural value model (`ValueWrapper`, `ShareableValue`)
//! - Immutable object snapshots (`FrozenObject`, `WorkletSnapshot`)
//! - Listener keys with explicit subsystem scoping
//! - Blocking FIFO queue for cross-thread hand-off
//!
//! Nothing in this crate touches a JS engine; values that cross a runtime
//! boundary are structural copies or opaque capability handles.

pub mod error;
pub mod frozen;
pub mod listener;
pub mod queue;
pub mod value;

pub use error::CoreError;
pub use frozen::{FrozenObject, WorkletSnapshot, KEY_AS_STRING, KEY_LOCATION, KEY_WORKLET_HASH};
pub use listener::{ListenerKey, ListenerScope};
pub use queue::ThreadSafeQueue;
pub use value::{RemoteHandle, RuntimeId, ShareableValue, ValueWrapper};

/// Bridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
