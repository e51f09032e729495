use rquickjs::Ctx;
use thiserror::Error;
use weft_core::{CoreError, RuntimeId};

/// Errors crossing the engine boundary.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("engine error: {0}")]
    Engine(#[from] rquickjs::Error),

    #[error("script exception: {message}")]
    Evaluation { message: String },

    #[error("worklet `{location}` failed to compile: {message}")]
    Compilation { location: String, message: String },

    #[error("worklet `{location}` did not evaluate to a function")]
    NotAFunction { location: String },

    #[error("unsupported value type `{type_name}` crossing the runtime boundary")]
    UnsupportedValue { type_name: String },

    #[error("capability handle belongs to runtime {owner}, not runtime {current}")]
    ForeignCapability { owner: RuntimeId, current: RuntimeId },

    #[error("capability slot {slot} is not registered in this runtime")]
    UnknownCapability { slot: u64 },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Best-effort message for the currently pending engine exception.
pub(crate) fn exception_message(ctx: &Ctx<'_>) -> String {
    let caught = ctx.catch();
    if let Some(object) = caught.as_object() {
        if let Ok(message) = object.get::<_, String>("message") {
            return message;
        }
    }
    if let Some(text) = caught.as_string() {
        if let Ok(message) = text.to_string() {
            return message;
        }
    }
    "unknown engine exception".into()
}

/// Map an engine error, pulling the pending exception text when there is one.
pub(crate) fn engine_error(ctx: &Ctx<'_>, err: rquickjs::Error) -> ScriptError {
    if matches!(err, rquickjs::Error::Exception) {
        ScriptError::Evaluation { message: exception_message(ctx) }
    } else {
        ScriptError::Engine(err)
    }
}
