use thiserror::Error;

/// Errors raised by the structural value model.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("expected a {expected} value, found {found}")]
    VariantMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("worklet object is missing `{field}`")]
    MissingWorkletMetadata { field: &'static str },

    #[error("{kind} values have no JSON representation")]
    NotJsonRepresentable { kind: &'static str },
}
