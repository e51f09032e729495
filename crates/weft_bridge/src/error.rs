use thiserror::Error;
use weft_core::RuntimeId;
use weft_script::ScriptError;

/// Errors from the cross-thread layer.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to spawn runtime thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("runtime thread is gone")]
    RuntimeGone,

    #[error("expected a {expected} to schedule, found a {found}")]
    NotSchedulable {
        expected: &'static str,
        found: &'static str,
    },

    #[error("no runtime thread hosts runtime {runtime}")]
    UnknownRuntime { runtime: RuntimeId },
}
