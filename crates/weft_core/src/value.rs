// value.rs - Structural, runtime-agnostic value model
//
// A value that crosses the boundary between two JS runtimes is copied into
// this representation. No variant ever stores a pointer into an engine heap;
// functions and host objects are referenced through `RemoteHandle`, which is
// only redeemable in the runtime that issued it.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::CoreError;
use crate::frozen::{FrozenObject, WorkletSnapshot};

/// Identity of one JS runtime instance, unique per process.
pub type RuntimeId = u64;

/// Opaque capability handle: a slot in the origin runtime's host registry.
///
/// The handle itself is freely copyable across threads; redeeming it outside
/// the origin runtime fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemoteHandle {
    pub runtime: RuntimeId,
    pub slot: u64,
}

/// Tagged union over every value shape that may cross a runtime boundary.
///
/// Compound variants share subtrees via `Arc` and are never mutated after
/// construction.
#[derive(Debug, Clone)]
pub enum ValueWrapper {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    /// Also carries BigInt values as their decimal text.
    String(String),
    Array(Vec<Arc<ShareableValue>>),
    /// Ordered string-keyed snapshot of a plain object.
    Object(Arc<FrozenObject>),
    /// Worklet: source text plus metadata and captured variables.
    Worklet(Arc<WorkletSnapshot>),
    /// Function defined in the origin runtime, callable only there.
    RemoteFunction(RemoteHandle),
    /// Native-backed object owned by the origin runtime.
    HostObject(RemoteHandle),
}

impl ValueWrapper {
    /// Short variant name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ValueWrapper::Undefined => "undefined",
            ValueWrapper::Null => "null",
            ValueWrapper::Bool(_) => "boolean",
            ValueWrapper::Number(_) => "number",
            ValueWrapper::String(_) => "string",
            ValueWrapper::Array(_) => "array",
            ValueWrapper::Object(_) => "object",
            ValueWrapper::Worklet(_) => "worklet",
            ValueWrapper::RemoteFunction(_) => "remote function",
            ValueWrapper::HostObject(_) => "host object",
        }
    }
}

/// A `ValueWrapper` plus provenance: which runtime the value was captured in.
///
/// `origin` is `None` for values built from JSON or plain Rust data.
#[derive(Debug, Clone)]
pub struct ShareableValue {
    wrapper: ValueWrapper,
    origin: Option<RuntimeId>,
}

impl ShareableValue {
    pub fn new(wrapper: ValueWrapper, origin: Option<RuntimeId>) -> Self {
        Self { wrapper, origin }
    }

    pub fn wrapper(&self) -> &ValueWrapper {
        &self.wrapper
    }

    pub fn origin(&self) -> Option<RuntimeId> {
        self.origin
    }

    pub fn kind(&self) -> &'static str {
        self.wrapper.kind()
    }

    pub fn as_number(&self) -> Result<f64, CoreError> {
        match &self.wrapper {
            ValueWrapper::Number(n) => Ok(*n),
            other => Err(CoreError::VariantMismatch {
                expected: "number",
                found: other.kind(),
            }),
        }
    }

    pub fn as_bool(&self) -> Result<bool, CoreError> {
        match &self.wrapper {
            ValueWrapper::Bool(b) => Ok(*b),
            other => Err(CoreError::VariantMismatch {
                expected: "boolean",
                found: other.kind(),
            }),
        }
    }

    pub fn as_str(&self) -> Result<&str, CoreError> {
        match &self.wrapper {
            ValueWrapper::String(s) => Ok(s),
            other => Err(CoreError::VariantMismatch {
                expected: "string",
                found: other.kind(),
            }),
        }
    }

    pub fn as_frozen_object(&self) -> Result<&Arc<FrozenObject>, CoreError> {
        match &self.wrapper {
            ValueWrapper::Object(frozen) => Ok(frozen),
            other => Err(CoreError::VariantMismatch {
                expected: "object",
                found: other.kind(),
            }),
        }
    }

    pub fn as_worklet(&self) -> Result<&Arc<WorkletSnapshot>, CoreError> {
        match &self.wrapper {
            ValueWrapper::Worklet(snapshot) => Ok(snapshot),
            other => Err(CoreError::VariantMismatch {
                expected: "worklet",
                found: other.kind(),
            }),
        }
    }

    /// Build a value from JSON. Object keys land in serde_json's stable
    /// (sorted) order.
    pub fn from_json(value: &JsonValue) -> Self {
        let wrapper = match value {
            JsonValue::Null => ValueWrapper::Null,
            JsonValue::Bool(b) => ValueWrapper::Bool(*b),
            JsonValue::Number(n) => ValueWrapper::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => ValueWrapper::String(s.clone()),
            JsonValue::Array(items) => ValueWrapper::Array(
                items
                    .iter()
                    .map(|item| Arc::new(Self::from_json(item)))
                    .collect(),
            ),
            JsonValue::Object(map) => {
                let entries = map
                    .iter()
                    .map(|(name, item)| (name.clone(), Arc::new(Self::from_json(item))))
                    .collect();
                ValueWrapper::Object(Arc::new(FrozenObject::new(entries)))
            }
        };
        Self::new(wrapper, None)
    }

    /// Inverse of [`from_json`](Self::from_json) for the JSON-representable
    /// variants. Whole numbers come back as JSON integers.
    pub fn to_json(&self) -> Result<JsonValue, CoreError> {
        match &self.wrapper {
            // JSON has no `undefined`; fold it into null like JSON.stringify
            // does for array holes.
            ValueWrapper::Undefined | ValueWrapper::Null => Ok(JsonValue::Null),
            ValueWrapper::Bool(b) => Ok(JsonValue::Bool(*b)),
            ValueWrapper::Number(n) => {
                if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n <= i64::MAX as f64 {
                    Ok(JsonValue::from(*n as i64))
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(JsonValue::Number)
                        .ok_or(CoreError::NotJsonRepresentable { kind: "non-finite number" })
                }
            }
            ValueWrapper::String(s) => Ok(JsonValue::String(s.clone())),
            ValueWrapper::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.to_json()?);
                }
                Ok(JsonValue::Array(out))
            }
            ValueWrapper::Object(frozen) => {
                let mut map = serde_json::Map::with_capacity(frozen.len());
                for (name, entry) in frozen.iter() {
                    map.insert(name.clone(), entry.to_json()?);
                }
                Ok(JsonValue::Object(map))
            }
            other => Err(CoreError::NotJsonRepresentable { kind: other.kind() }),
        }
    }
}
