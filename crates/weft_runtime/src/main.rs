//! Weft Runtime
//!
//! Demo binary that wires the bridge end to end: the JS thread authors a
//! worklet, the UI thread runs it against decorated globals, and a layout
//! animation streams progress back through the proxy.

mod config;

use std::sync::Arc;

use anyhow::Result;
use weft_bridge::{LayoutAnimationObserver, LayoutAnimationsProxy, MutableValue, Scheduler};
use weft_core::ShareableValue;
use weft_script::rquickjs::Object;
use weft_script::PlatformDepMethodsHolder;

use config::Settings;

struct LogObserver;

impl LayoutAnimationObserver for LogObserver {
    fn notify_about_progress(&self, view_tag: i32, progress: Object<'_>) {
        for (name, value) in progress.props::<String, f64>().flatten() {
            tracing::info!(view_tag, %name, value, "layout progress");
        }
    }

    fn notify_about_end(&self, view_tag: i32, was_cancelled: bool) {
        tracing::info!(view_tag, was_cancelled, "layout animation ended");
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    tracing::info!("Weft v{}", weft_core::VERSION);
    let settings = Settings::load();
    let view_tag = settings.demo.view_tag;

    let methods = PlatformDepMethodsHolder {
        update_props: Arc::new(|view_tag, props| match props.to_json() {
            Ok(json) => tracing::info!(view_tag, %json, "props update"),
            Err(err) => tracing::warn!(view_tag, %err, "props update not printable"),
        }),
        measure: Arc::new(|view_tag| {
            tracing::debug!(view_tag, "measure");
            vec![("width".into(), 320.0), ("height".into(), 240.0)]
        }),
        ..PlatformDepMethodsHolder::default()
    };
    let scheduler = Scheduler::new(methods)?;

    // A worklet authored on the JS side, executed on the UI side.
    let source = format!("(opacity) => {{ _updateProps({view_tag}, {{ opacity }}) }}");
    let worklet = scheduler
        .js()
        .call(move |runtime| {
            runtime.share(&format!(
                "(() => {{ const f = {source}; f.__workletHash = 1001; \
                 f.asString = {source:?}; f.__location = \"demo.js:1\"; return f; }})()"
            ))
        })??;
    scheduler.schedule_worklet_on_ui(
        worklet,
        vec![ShareableValue::from_json(&serde_json::json!(0.5))],
    )?;

    // A layout animation: writes to an observed cell become progress events.
    let proxy = LayoutAnimationsProxy::new(Arc::new(LogObserver));
    let cell = Arc::new(MutableValue::new(ShareableValue::from_json(
        &serde_json::json!({ "x": 0 }),
    )));
    proxy.start_observing(view_tag, &cell);

    for step in 1..=settings.demo.steps {
        let cell = Arc::clone(&cell);
        let value = Arc::new(ShareableValue::from_json(
            &serde_json::json!({ "x": step * 10 }),
        ));
        scheduler.schedule_on_ui(move |runtime| {
            runtime.with(|ctx| cell.set_shared(runtime, &ctx, value));
        });
    }
    scheduler.tick_ui(16.0);
    scheduler.ui().flush()?;
    proxy.stop_observing(view_tag, true);

    scheduler.js().flush()?;
    tracing::info!("demo complete");
    Ok(())
}
