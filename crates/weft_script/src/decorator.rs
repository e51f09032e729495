//! Runtime decoration
//!
//! Installs the host capability surface into a worklet runtime as globals.
//! The platform hooks are plain callbacks so the same decorator serves the
//! real bridge, headless tools and tests alike.

use std::rc::Rc;
use std::sync::Arc;

use rquickjs::{Ctx, Exception, Function, Object, Persistent, Value};
use weft_core::{RuntimeId, ShareableValue};

use crate::convert;
use crate::error::ScriptError;
use crate::runtime::WorkletRuntime;

/// Called when a runtime wants a frame; the argument names the runtime.
pub type RenderTask = Arc<dyn Fn(RuntimeId) + Send + Sync>;
/// Receives a view tag and the wrapped props object.
pub type UpdatePropsFn = Arc<dyn Fn(i32, ShareableValue) + Send + Sync>;
/// Receives a view tag, target offsets and the animated flag.
pub type ScrollToFn = Arc<dyn Fn(i32, f64, f64, bool) + Send + Sync>;
/// Returns layout fields (`x`, `y`, `width`, `height`, ...) for a view tag,
/// in a stable declaration order.
pub type MeasureFn = Arc<dyn Fn(i32) -> Vec<(String, f64)> + Send + Sync>;

/// The platform-dependent half of the bridge, handed in by the host.
pub struct PlatformDepMethodsHolder {
    pub request_render: RenderTask,
    pub update_props: UpdatePropsFn,
    pub scroll_to: ScrollToFn,
    pub measure: MeasureFn,
}

impl Default for PlatformDepMethodsHolder {
    /// Hooks that only trace. Useful headless and in tests.
    fn default() -> Self {
        Self {
            request_render: Arc::new(|runtime| {
                tracing::trace!(runtime, "render requested");
            }),
            update_props: Arc::new(|view_tag, _props| {
                tracing::trace!(view_tag, "props update dropped (no host)");
            }),
            scroll_to: Arc::new(|view_tag, x, y, animated| {
                tracing::trace!(view_tag, x, y, animated, "scroll dropped (no host)");
            }),
            measure: Arc::new(|_view_tag| Vec::new()),
        }
    }
}

// Identity helpers that pin a closure's argument lifetimes together; without
// them each elided lifetime is distinct and the bodies fail to borrow-check.
fn pin_raf<F: for<'js> Fn(Ctx<'js>, Function<'js>)>(f: F) -> F {
    f
}

fn pin_update<F: for<'js> Fn(Ctx<'js>, i32, Value<'js>) -> Result<(), rquickjs::Error>>(
    f: F,
) -> F {
    f
}

fn pin_measure<F: for<'js> Fn(Ctx<'js>, i32) -> Result<Object<'js>, rquickjs::Error>>(f: F) -> F {
    f
}

/// Install the capability globals into a runtime.
///
/// Decorating twice replaces the previous hooks; scripts evaluated before
/// decoration simply do not see the globals yet.
pub fn decorate_runtime(
    runtime: &WorkletRuntime,
    methods: &PlatformDepMethodsHolder,
) -> Result<(), ScriptError> {
    let core = Rc::clone(runtime.core());
    let runtime_id = runtime.id();
    let request_render = Arc::clone(&methods.request_render);
    let update_props = Arc::clone(&methods.update_props);
    let scroll_to = Arc::clone(&methods.scroll_to);
    let measure = Arc::clone(&methods.measure);

    runtime.with(|ctx| -> Result<(), ScriptError> {
        let globals = ctx.globals();

        globals.set("_WORKLET", true)?;

        let log = Function::new(ctx.clone(), |message: String| {
            tracing::info!(target: "weft::worklet", "{}", message);
        })?
        .with_name("_log")?;
        globals.set("_log", log)?;

        {
            let core = Rc::clone(&core);
            let request_render = Arc::clone(&request_render);
            let raf = Function::new(
                ctx.clone(),
                pin_raf(move |ctx, callback| {
                    core.queue_frame_callback(Persistent::save(&ctx, callback));
                    // Coalesce: one host render request per batch of queued
                    // callbacks.
                    if !core.render_requested() {
                        core.set_render_requested(true);
                        request_render(runtime_id);
                    }
                }),
            )?
            .with_name("requestAnimationFrame")?;
            globals.set("requestAnimationFrame", raf)?;
        }

        {
            let core = Rc::clone(&core);
            let update_props = Arc::clone(&update_props);
            let update = Function::new(
                ctx.clone(),
                pin_update(move |ctx, view_tag, props| {
                    let wrapped = convert::wrap_value(&core, &ctx, &props)
                        .map_err(|err| Exception::throw_message(&ctx, &err.to_string()))?;
                    update_props(view_tag, wrapped);
                    Ok(())
                }),
            )?
            .with_name("_updateProps")?;
            globals.set("_updateProps", update)?;
        }

        {
            let scroll_to = Arc::clone(&scroll_to);
            let scroll = Function::new(
                ctx.clone(),
                move |view_tag: i32, x: f64, y: f64, animated: bool| {
                    scroll_to(view_tag, x, y, animated);
                },
            )?
            .with_name("_scrollTo")?;
            globals.set("_scrollTo", scroll)?;
        }

        {
            let measure = Arc::clone(&measure);
            let measure_fn = Function::new(
                ctx.clone(),
                pin_measure(move |ctx, view_tag| {
                    // Properties land in the order the hook reported them.
                    let layout = Object::new(ctx)?;
                    for (name, value) in measure(view_tag) {
                        layout.set(name, value)?;
                    }
                    Ok(layout)
                }),
            )?
            .with_name("_measure")?;
            globals.set("_measure", measure_fn)?;
        }

        Ok(())
    })
}
