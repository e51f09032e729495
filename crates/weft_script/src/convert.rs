//! Conversion between live engine values and the structural model
//!
//! `wrap_value` copies a live value out of a runtime into a
//! [`ShareableValue`] tree; `hydrate_value` materializes a tree back into a
//! (possibly different) runtime. Functions never cross as raw pointers:
//! worklets travel as source + hash and are resolved through the target
//! runtime's cache, everything else callable becomes a capability handle
//! redeemable only in its origin runtime.

use std::sync::Arc;

use rquickjs::convert::Coerced;
use rquickjs::{Array, Ctx, IntoJs, Object, Type, Value};
use weft_core::{
    FrozenObject, ShareableValue, ValueWrapper, WorkletSnapshot, KEY_AS_STRING, KEY_LOCATION,
    KEY_WORKLET_HASH,
};

use crate::error::ScriptError;
use crate::runtime::RuntimeCore;

fn unsupported(value: &Value<'_>) -> ScriptError {
    ScriptError::UnsupportedValue {
        type_name: format!("{:?}", value.type_of()),
    }
}

/// Copy a live value into its structural representation.
pub fn wrap_value<'js>(
    core: &RuntimeCore,
    ctx: &Ctx<'js>,
    value: &Value<'js>,
) -> Result<ShareableValue, ScriptError> {
    let wrapper = match value.type_of() {
        Type::Uninitialized | Type::Undefined => ValueWrapper::Undefined,
        Type::Null => ValueWrapper::Null,
        Type::Bool => ValueWrapper::Bool(value.as_bool().unwrap_or_default()),
        Type::Int | Type::Float => ValueWrapper::Number(value.get()?),
        Type::String => ValueWrapper::String(value.get()?),
        Type::BigInt => {
            // Decimal text, so values beyond i64 still cross intact.
            let text: Coerced<String> = value.get()?;
            ValueWrapper::String(text.0)
        }
        Type::Array => wrap_array(core, ctx, value)?,
        Type::Object | Type::Exception | Type::Function | Type::Constructor => {
            wrap_object(core, ctx, value)?
        }
        _ => return Err(unsupported(value)),
    };
    Ok(ShareableValue::new(wrapper, Some(core.id())))
}

fn wrap_array<'js>(
    core: &RuntimeCore,
    ctx: &Ctx<'js>,
    value: &Value<'js>,
) -> Result<ValueWrapper, ScriptError> {
    let array = value.as_array().cloned().ok_or_else(|| unsupported(value))?;
    let mut items = Vec::with_capacity(array.len());
    for item in array.iter::<Value>() {
        let item = item?;
        items.push(Arc::new(wrap_value(core, ctx, &item)?));
    }
    Ok(ValueWrapper::Array(items))
}

fn wrap_object<'js>(
    core: &RuntimeCore,
    ctx: &Ctx<'js>,
    value: &Value<'js>,
) -> Result<ValueWrapper, ScriptError> {
    let object = value.as_object().cloned().ok_or_else(|| unsupported(value))?;

    // Worklet markers win over every other classification; worklets are
    // usually functions carrying their own metadata as properties.
    let hash: Value = object.get(KEY_WORKLET_HASH)?;
    if !hash.is_undefined() {
        return wrap_worklet(core, ctx, &object, &hash);
    }

    if matches!(value.type_of(), Type::Function | Type::Constructor) {
        let handle = core.register_capability(ctx, value.clone());
        return Ok(ValueWrapper::RemoteFunction(handle));
    }

    let mut entries = Vec::new();
    for prop in object.props::<String, Value>() {
        let (name, item) = prop?;
        entries.push((name, Arc::new(wrap_value(core, ctx, &item)?)));
    }
    Ok(ValueWrapper::Object(Arc::new(FrozenObject::new(entries))))
}

fn wrap_worklet<'js>(
    core: &RuntimeCore,
    ctx: &Ctx<'js>,
    object: &Object<'js>,
    hash: &Value<'js>,
) -> Result<ValueWrapper, ScriptError> {
    let hash = hash.get::<f64>()? as i64;

    let source: Value = object.get(KEY_AS_STRING)?;
    if source.is_undefined() {
        return Err(weft_core::CoreError::MissingWorkletMetadata { field: KEY_AS_STRING }.into());
    }
    let source: String = source.get()?;

    let location: Value = object.get(KEY_LOCATION)?;
    let location: String = if location.is_undefined() {
        "<unknown>".into()
    } else {
        location.get()?
    };

    let mut captures = Vec::new();
    for prop in object.props::<String, Value>() {
        let (name, item) = prop?;
        if name == KEY_WORKLET_HASH || name == KEY_AS_STRING || name == KEY_LOCATION {
            continue;
        }
        captures.push((name, Arc::new(wrap_value(core, ctx, &item)?)));
    }

    Ok(ValueWrapper::Worklet(Arc::new(WorkletSnapshot {
        hash,
        source,
        location,
        captures: FrozenObject::new(captures),
    })))
}

/// Materialize a structural value as a live value of the target runtime.
///
/// Compound variants are built fresh on every call; the result never
/// aliases a previous hydration.
pub fn hydrate_value<'js>(
    core: &RuntimeCore,
    ctx: &Ctx<'js>,
    value: &ShareableValue,
) -> Result<Value<'js>, ScriptError> {
    match value.wrapper() {
        ValueWrapper::Undefined => Ok(rquickjs::Undefined.into_js(ctx)?),
        ValueWrapper::Null => Ok(rquickjs::Null.into_js(ctx)?),
        ValueWrapper::Bool(b) => Ok((*b).into_js(ctx)?),
        ValueWrapper::Number(n) => Ok((*n).into_js(ctx)?),
        ValueWrapper::String(s) => Ok(s.as_str().into_js(ctx)?),
        ValueWrapper::Array(items) => {
            let array = Array::new(ctx.clone())?;
            for (index, item) in items.iter().enumerate() {
                array.set(index, hydrate_value(core, ctx, item)?)?;
            }
            Ok(array.into_js(ctx)?)
        }
        ValueWrapper::Object(frozen) => Ok(shallow_clone(core, ctx, frozen)?.into_js(ctx)?),
        ValueWrapper::Worklet(snapshot) => hydrate_worklet(core, ctx, snapshot),
        ValueWrapper::RemoteFunction(handle) | ValueWrapper::HostObject(handle) => {
            core.capability(ctx, *handle)
        }
    }
}

/// Build a brand-new object in the target runtime from a frozen snapshot,
/// hydrating every entry one level.
pub fn shallow_clone<'js>(
    core: &RuntimeCore,
    ctx: &Ctx<'js>,
    frozen: &FrozenObject,
) -> Result<Object<'js>, ScriptError> {
    let object = Object::new(ctx.clone())?;
    for (name, entry) in frozen.iter() {
        object.set(name.as_str(), hydrate_value(core, ctx, entry)?)?;
    }
    Ok(object)
}

fn hydrate_worklet<'js>(
    core: &RuntimeCore,
    ctx: &Ctx<'js>,
    snapshot: &WorkletSnapshot,
) -> Result<Value<'js>, ScriptError> {
    let function = core.cache().borrow_mut().resolve(ctx, snapshot)?;
    // Reattach the identity markers and captures as properties, so a
    // hydrated worklet can be re-wrapped losslessly.
    function.set(KEY_WORKLET_HASH, snapshot.hash as f64)?;
    function.set(KEY_AS_STRING, snapshot.source.as_str())?;
    function.set(KEY_LOCATION, snapshot.location.as_str())?;
    for (name, entry) in snapshot.captures.iter() {
        function.set(name.as_str(), hydrate_value(core, ctx, entry)?)?;
    }
    Ok(function.into_js(ctx)?)
}
