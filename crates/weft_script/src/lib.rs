//! Weft Scripting Layer
//!
//! Hosts the secondary JS execution context (QuickJS via rquickjs) and the
//! machinery that moves values in and out of it:
//!
//! - **WorkletRuntime:** one engine instance pinned to one thread
//! - **Conversion:** wrap live values into [`weft_core::ShareableValue`]
//!   trees and hydrate them back
//! - **WorkletsCache:** content-hash-keyed memoization of compiled worklets
//! - **Decorator:** installs the platform capability surface as globals

pub mod cache;
pub mod convert;
pub mod decorator;
pub mod error;
pub mod runtime;

pub use cache::WorkletsCache;
pub use convert::{hydrate_value, shallow_clone, wrap_value};
pub use decorator::{decorate_runtime, PlatformDepMethodsHolder, RenderTask};
pub use error::ScriptError;
pub use runtime::{RuntimeCore, WorkletRuntime};

pub use rquickjs;
