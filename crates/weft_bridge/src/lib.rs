//! Weft Bridge Layer
//!
//! Cross-thread plumbing on top of the scripting layer:
//!
//! - **RuntimeThread / Scheduler:** one engine per thread, reached only
//!   through its job queue
//! - **MutableValue:** thread-safe reactive cell with ordered listeners
//! - **LayoutAnimationsProxy:** per-view progress/end notifications driven
//!   by MutableValue updates

pub mod error;
pub mod layout;
pub mod mutable;
pub mod scheduler;

pub use error::BridgeError;
pub use layout::{LayoutAnimationObserver, LayoutAnimationsProxy};
pub use mutable::{Listener, MutableValue};
pub use scheduler::{RuntimeThread, Scheduler};
