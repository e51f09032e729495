//! Thread-safe reactive cell
//!
//! A `MutableValue` holds one structural value and a set of listeners keyed
//! by [`ListenerKey`]. Any thread may read or write; listeners run
//! synchronously on the writing thread, which passes its runtime and engine
//! context along so listeners can hydrate what they need.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

use weft_core::{ListenerKey, ShareableValue};
use weft_script::rquickjs::{Ctx, Value};
use weft_script::{ScriptError, WorkletRuntime};

/// Listeners read state through their captures; the runtime and context of
/// the writing thread are handed in as ambient arguments.
pub type Listener = Arc<dyn for<'js> Fn(&WorkletRuntime, &Ctx<'js>) + Send + Sync>;

pub struct MutableValue {
    value: Mutex<Arc<ShareableValue>>,
    /// The animation currently driving this cell, if any. Weak: the cell
    /// must not keep a finished animation alive.
    animation: Mutex<Weak<ShareableValue>>,
    listeners: Mutex<BTreeMap<ListenerKey, Listener>>,
    /// Serializes whole set+notify passes. Never held while the value
    /// mutex is wanted by a listener.
    notify_gate: Mutex<()>,
}

impl MutableValue {
    pub fn new(initial: ShareableValue) -> Self {
        Self {
            value: Mutex::new(Arc::new(initial)),
            animation: Mutex::new(Weak::new()),
            listeners: Mutex::new(BTreeMap::new()),
            notify_gate: Mutex::new(()),
        }
    }

    /// Structural view of the current value.
    pub fn snapshot(&self) -> Arc<ShareableValue> {
        Arc::clone(&self.value.lock().unwrap())
    }

    /// Hydrate the current value into the given runtime.
    ///
    /// Only the `Arc` clone happens under the value mutex; hydration can
    /// reach an engine evaluation (worklet compilation), which must never
    /// run inside the critical section.
    pub fn get<'js>(
        &self,
        runtime: &WorkletRuntime,
        ctx: &Ctx<'js>,
    ) -> Result<Value<'js>, ScriptError> {
        let current = self.snapshot();
        weft_script::hydrate_value(runtime.core(), ctx, &current)
    }

    /// Wrap a live value, store it and notify listeners.
    pub fn set<'js>(
        &self,
        runtime: &WorkletRuntime,
        ctx: &Ctx<'js>,
        value: &Value<'js>,
    ) -> Result<(), ScriptError> {
        let wrapped = weft_script::wrap_value(runtime.core(), ctx, value)?;
        self.set_shared(runtime, ctx, Arc::new(wrapped));
        Ok(())
    }

    /// Store an already-wrapped value and notify listeners.
    ///
    /// The value mutex is released before fan-out, so listeners may read the
    /// cell. The gate is held for the whole pass: two writers never
    /// interleave their notification phases. Listeners run in ascending key
    /// order over a snapshot of the map, so add/remove during notification
    /// (self-removal included) is safe within the pass.
    ///
    /// The gate is not reentrant: a listener must not write to the same cell
    /// from inside the pass, or it deadlocks on its own notification.
    /// Follow-up writes go through the scheduler instead.
    pub fn set_shared(&self, runtime: &WorkletRuntime, ctx: &Ctx<'_>, value: Arc<ShareableValue>) {
        let _pass = self.notify_gate.lock().unwrap();
        *self.value.lock().unwrap() = value;
        let listeners: Vec<Listener> = self.listeners.lock().unwrap().values().cloned().collect();
        for listener in listeners {
            listener(runtime, ctx);
        }
    }

    /// Register a listener, replacing any previous entry under the same key.
    pub fn add_listener(&self, key: ListenerKey, listener: Listener) {
        let replaced = self.listeners.lock().unwrap().insert(key, listener).is_some();
        tracing::debug!(?key, replaced, "listener added");
    }

    /// Detach a listener; unknown keys are a no-op.
    pub fn remove_listener(&self, key: &ListenerKey) -> bool {
        let removed = self.listeners.lock().unwrap().remove(key).is_some();
        if removed {
            tracing::debug!(?key, "listener removed");
        }
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    /// Remember the animation currently driving this cell.
    pub fn set_driver(&self, animation: &Arc<ShareableValue>) {
        *self.animation.lock().unwrap() = Arc::downgrade(animation);
    }

    pub fn driver(&self) -> Option<Arc<ShareableValue>> {
        self.animation.lock().unwrap().upgrade()
    }

    pub fn clear_driver(&self) {
        *self.animation.lock().unwrap() = Weak::new();
    }
}
