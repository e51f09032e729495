//! Worklet compilation cache
//!
//! Compiled functions are memoized per runtime, keyed by the worklet's
//! content hash. Functions are not portable across engine instances, so a
//! cache is owned by exactly one runtime and dies with it.

use std::collections::HashMap;

use rquickjs::{Ctx, Function, Persistent, Value};
use weft_core::WorkletSnapshot;

use crate::error::{exception_message, ScriptError};

pub struct WorkletsCache {
    entries: HashMap<i64, Persistent<Function<'static>>>,
}

impl WorkletsCache {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached function; must happen while the engine is alive.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Return the compiled function for a worklet, compiling on first use.
    ///
    /// A hit returns the cached function unchanged. A miss evaluates
    /// `"(" + source + ")"` — the parentheses force the function text to
    /// parse as an expression — and requires the result to be callable.
    /// Failed compilations are not cached, so a later call may retry.
    pub fn resolve<'js>(
        &mut self,
        ctx: &Ctx<'js>,
        worklet: &WorkletSnapshot,
    ) -> Result<Function<'js>, ScriptError> {
        if let Some(cached) = self.entries.get(&worklet.hash) {
            return Ok(cached.clone().restore(ctx)?);
        }

        tracing::debug!(
            hash = worklet.hash,
            location = %worklet.location,
            "compiling worklet"
        );
        let wrapped = format!("({})", worklet.source);
        let value: Value = match ctx.eval(wrapped.as_str()) {
            Ok(value) => value,
            Err(rquickjs::Error::Exception) => {
                return Err(ScriptError::Compilation {
                    location: worklet.location.clone(),
                    message: exception_message(ctx),
                });
            }
            Err(err) => {
                return Err(ScriptError::Compilation {
                    location: worklet.location.clone(),
                    message: err.to_string(),
                });
            }
        };
        let function = value
            .as_function()
            .cloned()
            .ok_or_else(|| ScriptError::NotAFunction {
                location: worklet.location.clone(),
            })?;
        self.entries
            .insert(worklet.hash, Persistent::save(ctx, function.clone()));
        Ok(function)
    }
}

impl Default for WorkletsCache {
    fn default() -> Self {
        Self::new()
    }
}
