//! Worklet runtime management
//!
//! One `WorkletRuntime` is one QuickJS engine instance plus the per-runtime
//! state the bridge needs: the worklet cache, the capability slot registry
//! and the frame-callback queue. An instance is not `Send`; it lives and
//! dies on the thread that created it, and other threads reach it only by
//! scheduling work onto that thread.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use rquickjs::function::Args;
use rquickjs::{Context, Ctx, Function, Persistent, Runtime, Value};
use weft_core::{RemoteHandle, RuntimeId, ShareableValue, ValueWrapper};

use crate::cache::WorkletsCache;
use crate::convert;
use crate::error::{engine_error, ScriptError};

static NEXT_RUNTIME_ID: AtomicU64 = AtomicU64::new(1);

/// Per-runtime state shared with host functions installed into the engine.
///
/// Holds everything that must survive between `with` scopes: compiled
/// worklets, registered capabilities and pending frame callbacks.
pub struct RuntimeCore {
    id: RuntimeId,
    cache: RefCell<WorkletsCache>,
    slots: RefCell<HashMap<u64, Persistent<Value<'static>>>>,
    next_slot: Cell<u64>,
    frame_callbacks: RefCell<Vec<Persistent<Function<'static>>>>,
    render_requested: Cell<bool>,
}

impl RuntimeCore {
    fn new(id: RuntimeId) -> Self {
        Self {
            id,
            cache: RefCell::new(WorkletsCache::new()),
            slots: RefCell::new(HashMap::new()),
            next_slot: Cell::new(1),
            frame_callbacks: RefCell::new(Vec::new()),
            render_requested: Cell::new(false),
        }
    }

    pub fn id(&self) -> RuntimeId {
        self.id
    }

    pub fn cache(&self) -> &RefCell<WorkletsCache> {
        &self.cache
    }

    /// Park an engine value in the slot registry and hand out a transferable
    /// handle for it.
    pub fn register_capability<'js>(&self, ctx: &Ctx<'js>, value: Value<'js>) -> RemoteHandle {
        let slot = self.next_slot.get();
        self.next_slot.set(slot + 1);
        self.slots
            .borrow_mut()
            .insert(slot, Persistent::save(ctx, value));
        tracing::trace!(runtime = self.id, slot, "registered capability");
        RemoteHandle { runtime: self.id, slot }
    }

    /// Redeem a capability handle. Only the issuing runtime can do this.
    pub fn capability<'js>(
        &self,
        ctx: &Ctx<'js>,
        handle: RemoteHandle,
    ) -> Result<Value<'js>, ScriptError> {
        if handle.runtime != self.id {
            return Err(ScriptError::ForeignCapability {
                owner: handle.runtime,
                current: self.id,
            });
        }
        let persistent = self
            .slots
            .borrow()
            .get(&handle.slot)
            .cloned()
            .ok_or(ScriptError::UnknownCapability { slot: handle.slot })?;
        Ok(persistent.restore(ctx)?)
    }

    pub(crate) fn queue_frame_callback(&self, callback: Persistent<Function<'static>>) {
        self.frame_callbacks.borrow_mut().push(callback);
    }

    pub(crate) fn take_frame_callbacks(&self) -> Vec<Persistent<Function<'static>>> {
        std::mem::take(&mut *self.frame_callbacks.borrow_mut())
    }

    pub(crate) fn render_requested(&self) -> bool {
        self.render_requested.get()
    }

    pub(crate) fn set_render_requested(&self, requested: bool) {
        self.render_requested.set(requested);
    }
}

impl Drop for WorkletRuntime {
    fn drop(&mut self) {
        // Installed globals hold `Rc<RuntimeCore>` clones that die only during
        // engine teardown, which is too late to release persistent values.
        // Release them here, while the context is still alive.
        self.core.cache.borrow_mut().clear();
        self.core.slots.borrow_mut().clear();
        self.core.frame_callbacks.borrow_mut().clear();
    }
}

/// One JS execution context with its own heap and single-threaded model.
pub struct WorkletRuntime {
    // Field order is drop order: the core's persistent values must be
    // released before the context, and the runtime must outlive both.
    core: Rc<RuntimeCore>,
    context: Context,
    #[allow(dead_code)] // Kept alive for context lifetime
    runtime: Runtime,
}

impl WorkletRuntime {
    pub fn new() -> Result<Self, ScriptError> {
        let runtime = Runtime::new()?;
        let context = Context::full(&runtime)?;
        let id = NEXT_RUNTIME_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(runtime = id, "worklet runtime created");
        Ok(Self {
            runtime,
            context,
            core: Rc::new(RuntimeCore::new(id)),
        })
    }

    pub fn id(&self) -> RuntimeId {
        self.core.id()
    }

    pub fn core(&self) -> &Rc<RuntimeCore> {
        &self.core
    }

    /// Enter the engine context.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: for<'js> FnOnce(Ctx<'js>) -> R,
    {
        self.context.with(f)
    }

    /// Evaluate a script for its side effects.
    pub fn eval(&self, source: &str) -> Result<(), ScriptError> {
        self.with(|ctx| {
            ctx.eval::<(), _>(source)
                .map_err(|err| engine_error(&ctx, err))
        })
    }

    /// Evaluate an expression and capture the result as a shareable value.
    pub fn share(&self, source: &str) -> Result<ShareableValue, ScriptError> {
        self.with(|ctx| {
            let value: Value = ctx.eval(source).map_err(|err| engine_error(&ctx, err))?;
            convert::wrap_value(&self.core, &ctx, &value)
        })
    }

    /// Hydrate a callable shareable value (worklet or own remote function)
    /// and invoke it with the given arguments.
    pub fn invoke(
        &self,
        callable: &ShareableValue,
        args: &[ShareableValue],
    ) -> Result<ShareableValue, ScriptError> {
        let location = match callable.wrapper() {
            ValueWrapper::Worklet(snapshot) => snapshot.location.clone(),
            other => format!("<{}>", other.kind()),
        };
        self.with(|ctx| {
            let value = convert::hydrate_value(&self.core, &ctx, callable)?;
            let function = value
                .as_function()
                .cloned()
                .ok_or(ScriptError::NotAFunction { location })?;
            let mut call_args = Args::new(ctx.clone(), args.len());
            for arg in args {
                call_args.push_arg(convert::hydrate_value(&self.core, &ctx, arg)?)?;
            }
            let result: Value = function
                .call_arg(call_args)
                .map_err(|err| engine_error(&ctx, err))?;
            convert::wrap_value(&self.core, &ctx, &result)
        })
    }

    /// Number of worklets compiled into this runtime so far.
    pub fn cached_worklets(&self) -> usize {
        self.core.cache.borrow().len()
    }

    /// Drain and run every queued frame callback with the given timestamp.
    ///
    /// Clears the render-requested flag first, so callbacks may queue the
    /// next frame while this one is still running. A failing callback does
    /// not starve the rest of the batch; the first error is reported after
    /// every callback has run.
    pub fn run_frame_callbacks(&self, timestamp: f64) -> Result<(), ScriptError> {
        self.core.set_render_requested(false);
        let callbacks = self.core.take_frame_callbacks();
        self.with(|ctx| {
            let mut first_error = None;
            for callback in callbacks {
                let result = callback
                    .restore(&ctx)
                    .map_err(ScriptError::from)
                    .and_then(|function| {
                        function
                            .call::<_, ()>((timestamp,))
                            .map_err(|err| engine_error(&ctx, err))
                    });
                if let Err(err) = result {
                    tracing::warn!(%err, "frame callback failed");
                    first_error.get_or_insert(err);
                }
            }
            match first_error {
                Some(err) => Err(err),
                None => Ok(()),
            }
        })
    }
}
