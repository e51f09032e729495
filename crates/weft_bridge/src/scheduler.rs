//! Runtime threads and the scheduler
//!
//! Engines are not `Send`, so each one lives on a dedicated thread that
//! constructs it locally and then drains a job queue. All cross-runtime
//! work travels as `FnOnce(&WorkletRuntime)` closures through that queue;
//! nothing else crosses the thread boundary.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use weft_core::{RuntimeId, ShareableValue, ThreadSafeQueue, ValueWrapper};
use weft_script::{decorate_runtime, PlatformDepMethodsHolder, ScriptError, WorkletRuntime};

use crate::error::BridgeError;

/// Unit of work executed on a runtime's home thread.
pub type Task = Box<dyn FnOnce(&WorkletRuntime) + Send + 'static>;

enum Job {
    Run(Task),
    Shutdown,
}

/// A thread owning exactly one [`WorkletRuntime`].
///
/// Dropping the handle shuts the thread down after the jobs already queued
/// have run.
pub struct RuntimeThread {
    name: &'static str,
    queue: Arc<ThreadSafeQueue<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl RuntimeThread {
    pub fn spawn(name: &'static str) -> Result<Self, BridgeError> {
        Self::spawn_with(name, |_| Ok(()))
    }

    /// Spawn with a setup closure run against the fresh runtime before any
    /// job, e.g. to decorate it.
    pub fn spawn_with<F>(name: &'static str, setup: F) -> Result<Self, BridgeError>
    where
        F: FnOnce(&WorkletRuntime) -> Result<(), ScriptError> + Send + 'static,
    {
        let queue = Arc::new(ThreadSafeQueue::new());
        let worker = Arc::clone(&queue);
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || run_worker(name, &worker, setup))?;
        Ok(Self {
            name,
            queue,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Queue a closure for execution on the runtime's home thread.
    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce(&WorkletRuntime) + Send + 'static,
    {
        self.queue.push(Job::Run(Box::new(task)));
    }

    /// Run a closure on the runtime thread and wait for its result.
    pub fn call<F, R>(&self, f: F) -> Result<R, BridgeError>
    where
        F: FnOnce(&WorkletRuntime) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        self.schedule(move |runtime| {
            let _ = tx.send(f(runtime));
        });
        rx.recv().map_err(|_| BridgeError::RuntimeGone)
    }

    /// Block until every job queued before this call has run.
    pub fn flush(&self) -> Result<(), BridgeError> {
        self.call(|_| ())
    }
}

impl Drop for RuntimeThread {
    fn drop(&mut self) {
        self.queue.push(Job::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_worker<F>(name: &'static str, queue: &ThreadSafeQueue<Job>, setup: F)
where
    F: FnOnce(&WorkletRuntime) -> Result<(), ScriptError>,
{
    let runtime = match WorkletRuntime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(thread = name, %err, "failed to create runtime");
            // Drain jobs unexecuted; dropped closures unblock any waiters.
            loop {
                if matches!(queue.pop(), Job::Shutdown) {
                    return;
                }
            }
        }
    };
    if let Err(err) = setup(&runtime) {
        tracing::error!(thread = name, %err, "runtime setup failed");
    }
    tracing::debug!(thread = name, runtime = runtime.id(), "runtime thread ready");
    loop {
        match queue.pop() {
            Job::Run(task) => task(&runtime),
            Job::Shutdown => break,
        }
    }
    tracing::debug!(thread = name, "runtime thread stopped");
}

/// The two home threads of the bridge: the JS side and the UI side.
pub struct Scheduler {
    js: RuntimeThread,
    ui: RuntimeThread,
    js_id: RuntimeId,
    ui_id: RuntimeId,
}

impl Scheduler {
    /// Spawn both threads; the UI runtime is decorated with the given
    /// platform hooks before it accepts work.
    pub fn new(methods: PlatformDepMethodsHolder) -> Result<Self, BridgeError> {
        let js = RuntimeThread::spawn("weft-js")?;
        let ui = RuntimeThread::spawn_with("weft-ui", move |runtime| {
            decorate_runtime(runtime, &methods)
        })?;
        let js_id = js.call(|runtime| runtime.id())?;
        let ui_id = ui.call(|runtime| runtime.id())?;
        tracing::debug!(js = js_id, ui = ui_id, "scheduler ready");
        Ok(Self { js, ui, js_id, ui_id })
    }

    pub fn js(&self) -> &RuntimeThread {
        &self.js
    }

    pub fn ui(&self) -> &RuntimeThread {
        &self.ui
    }

    pub fn js_runtime_id(&self) -> RuntimeId {
        self.js_id
    }

    pub fn ui_runtime_id(&self) -> RuntimeId {
        self.ui_id
    }

    pub fn schedule_on_js<F>(&self, task: F)
    where
        F: FnOnce(&WorkletRuntime) + Send + 'static,
    {
        self.js.schedule(task);
    }

    pub fn schedule_on_ui<F>(&self, task: F)
    where
        F: FnOnce(&WorkletRuntime) + Send + 'static,
    {
        self.ui.schedule(task);
    }

    /// Hand a worklet to the UI thread, compiling through the UI runtime's
    /// cache on first use.
    pub fn schedule_worklet_on_ui(
        &self,
        worklet: ShareableValue,
        args: Vec<ShareableValue>,
    ) -> Result<(), BridgeError> {
        let ValueWrapper::Worklet(snapshot) = worklet.wrapper() else {
            return Err(BridgeError::NotSchedulable {
                expected: "worklet",
                found: worklet.kind(),
            });
        };
        tracing::debug!(hash = snapshot.hash, "worklet handed to ui thread");
        self.ui.schedule(move |runtime| {
            if let Err(err) = runtime.invoke(&worklet, &args) {
                tracing::error!(%err, "scheduled worklet failed");
            }
        });
        Ok(())
    }

    /// Call a remote function back on the thread that issued its handle.
    pub fn schedule_remote_call(
        &self,
        callable: ShareableValue,
        args: Vec<ShareableValue>,
    ) -> Result<(), BridgeError> {
        let ValueWrapper::RemoteFunction(handle) = callable.wrapper() else {
            return Err(BridgeError::NotSchedulable {
                expected: "remote function",
                found: callable.kind(),
            });
        };
        let handle = *handle;
        let target = if handle.runtime == self.js_id {
            &self.js
        } else if handle.runtime == self.ui_id {
            &self.ui
        } else {
            return Err(BridgeError::UnknownRuntime { runtime: handle.runtime });
        };
        tracing::debug!(
            runtime = handle.runtime,
            slot = handle.slot,
            thread = target.name(),
            "remote call routed home"
        );
        target.schedule(move |runtime| {
            if let Err(err) = runtime.invoke(&callable, &args) {
                tracing::error!(%err, "remote call failed");
            }
        });
        Ok(())
    }

    /// Drive one UI frame: runs the callbacks queued through
    /// `requestAnimationFrame` with the given timestamp.
    pub fn tick_ui(&self, timestamp: f64) {
        self.ui.schedule(move |runtime| {
            if let Err(err) = runtime.run_frame_callbacks(timestamp) {
                tracing::error!(%err, "frame callback failed");
            }
        });
    }
}
