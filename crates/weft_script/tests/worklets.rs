use std::sync::{Arc, Mutex};

use weft_core::{ShareableValue, ValueWrapper};
use weft_script::{
    decorate_runtime, wrap_value, PlatformDepMethodsHolder, ScriptError, WorkletRuntime,
};

/// Builds a worklet function value carrying its own identity markers, the
/// shape a worklet-aware compiler would emit.
fn share_increment_worklet(runtime: &WorkletRuntime) -> ShareableValue {
    runtime
        .share(
            r#"(() => {
                const f = (x) => x + 1;
                f.__workletHash = 42;
                f.asString = "(x) => x + 1";
                f.__location = "app.js:10";
                return f;
            })()"#,
        )
        .unwrap()
}

#[test]
fn worklet_classification_wins_over_function() {
    let runtime = WorkletRuntime::new().unwrap();
    let shared = share_increment_worklet(&runtime);
    let worklet = shared.as_worklet().unwrap();
    assert_eq!(worklet.hash, 42);
    assert_eq!(worklet.source, "(x) => x + 1");
    assert_eq!(worklet.location, "app.js:10");
    assert!(worklet.captures.is_empty());
}

#[test]
fn worklet_invokes_on_a_different_runtime() {
    let source = WorkletRuntime::new().unwrap();
    let target = WorkletRuntime::new().unwrap();
    let shared = share_increment_worklet(&source);

    let result = target
        .invoke(&shared, &[ShareableValue::new(ValueWrapper::Number(41.0), None)])
        .unwrap();
    assert_eq!(result.as_number().unwrap(), 42.0);
}

#[test]
fn cache_compiles_each_worklet_once() {
    let source = WorkletRuntime::new().unwrap();
    let target = WorkletRuntime::new().unwrap();
    let shared = share_increment_worklet(&source);

    for _ in 0..3 {
        target
            .invoke(&shared, &[ShareableValue::new(ValueWrapper::Number(1.0), None)])
            .unwrap();
    }
    assert_eq!(target.cached_worklets(), 1);
    // Sharing never compiles on the source side.
    assert_eq!(source.cached_worklets(), 0);
}

#[test]
fn hydrated_worklet_keeps_identity_within_a_runtime() {
    let source = WorkletRuntime::new().unwrap();
    let target = WorkletRuntime::new().unwrap();
    let shared = share_increment_worklet(&source);

    let same: bool = target.with(|ctx| {
        let first = weft_script::hydrate_value(target.core(), &ctx, &shared).unwrap();
        let second = weft_script::hydrate_value(target.core(), &ctx, &shared).unwrap();
        ctx.globals().set("__first", first).unwrap();
        ctx.globals().set("__second", second).unwrap();
        ctx.eval("Object.is(__first, __second)").unwrap()
    });
    assert!(same);
}

#[test]
fn caches_are_isolated_per_runtime() {
    let source = WorkletRuntime::new().unwrap();
    let left = WorkletRuntime::new().unwrap();
    let right = WorkletRuntime::new().unwrap();
    let shared = share_increment_worklet(&source);
    let one = ShareableValue::new(ValueWrapper::Number(1.0), None);

    left.invoke(&shared, &[one.clone()]).unwrap();
    right.invoke(&shared, &[one]).unwrap();

    assert_eq!(left.cached_worklets(), 1);
    assert_eq!(right.cached_worklets(), 1);
}

#[test]
fn frozen_object_survives_mutation_of_a_clone() {
    let source = WorkletRuntime::new().unwrap();
    let target = WorkletRuntime::new().unwrap();
    let shared = source.share("({ a: 1, nested: { b: 2 } })").unwrap();

    target.with(|ctx| {
        let copy = weft_script::hydrate_value(target.core(), &ctx, &shared).unwrap();
        ctx.globals().set("__copy", copy).unwrap();
        ctx.eval::<(), _>("__copy.a = 99; __copy.nested.b = 99;").unwrap();
    });

    // A later hydration still sees the snapshot, not the mutation.
    let fresh: f64 = target.with(|ctx| {
        let copy = weft_script::hydrate_value(target.core(), &ctx, &shared).unwrap();
        ctx.globals().set("__fresh", copy).unwrap();
        ctx.eval("__fresh.a + __fresh.nested.b").unwrap()
    });
    assert_eq!(fresh, 3.0);
}

#[test]
fn json_round_trip_preserves_structure() {
    let runtime = WorkletRuntime::new().unwrap();
    let json: serde_json::Value = serde_json::from_str(
        r#"{"a": [1, 2.5, null, true], "b": {"c": {"d": {"e": "deep"}}}, "z": -7}"#,
    )
    .unwrap();

    let shared = ShareableValue::from_json(&json);
    let rewrapped = runtime.with(|ctx| {
        let live = weft_script::hydrate_value(runtime.core(), &ctx, &shared).unwrap();
        wrap_value(runtime.core(), &ctx, &live).unwrap()
    });
    assert_eq!(rewrapped.to_json().unwrap(), json);
}

#[test]
fn plain_function_becomes_a_capability_of_its_origin() {
    let origin = WorkletRuntime::new().unwrap();
    let other = WorkletRuntime::new().unwrap();
    let shared = origin.share("((x) => x * 2)").unwrap();
    assert!(matches!(shared.wrapper(), ValueWrapper::RemoteFunction(_)));

    // Redeemable where it was issued.
    let result = origin
        .invoke(&shared, &[ShareableValue::new(ValueWrapper::Number(21.0), None)])
        .unwrap();
    assert_eq!(result.as_number().unwrap(), 42.0);

    // Rejected anywhere else.
    let err = other
        .invoke(&shared, &[ShareableValue::new(ValueWrapper::Number(21.0), None)])
        .unwrap_err();
    assert!(matches!(err, ScriptError::ForeignCapability { .. }));
}

#[test]
fn worklet_without_source_is_rejected() {
    let runtime = WorkletRuntime::new().unwrap();
    let err = runtime
        .share(
            r#"(() => {
                const f = () => 0;
                f.__workletHash = 1;
                return f;
            })()"#,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Core(weft_core::CoreError::MissingWorkletMetadata { .. })
    ));
}

#[test]
fn broken_worklet_source_reports_compilation_error() {
    let runtime = WorkletRuntime::new().unwrap();
    let shared = runtime
        .share(
            r#"(() => {
                const f = () => 0;
                f.__workletHash = 2;
                f.asString = "this is not javascript((";
                f.__location = "bad.js:1";
                return f;
            })()"#,
        )
        .unwrap();

    let err = runtime.invoke(&shared, &[]).unwrap_err();
    match err {
        ScriptError::Compilation { location, .. } => assert_eq!(location, "bad.js:1"),
        other => panic!("expected compilation error, got {other}"),
    }
    // Failed compiles are not memoized.
    assert_eq!(runtime.cached_worklets(), 0);
}

#[test]
fn invoking_a_non_callable_fails() {
    let runtime = WorkletRuntime::new().unwrap();
    let shared = runtime.share("({ a: 1 })").unwrap();
    let err = runtime.invoke(&shared, &[]).unwrap_err();
    assert!(matches!(err, ScriptError::NotAFunction { .. }));
}

#[test]
fn decorated_globals_reach_the_host_hooks() {
    let runtime = WorkletRuntime::new().unwrap();

    let props_log: Arc<Mutex<Vec<(i32, serde_json::Value)>>> = Arc::new(Mutex::new(Vec::new()));
    let scroll_log: Arc<Mutex<Vec<(i32, f64, f64, bool)>>> = Arc::new(Mutex::new(Vec::new()));
    let renders: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));

    let methods = PlatformDepMethodsHolder {
        request_render: {
            let renders = Arc::clone(&renders);
            Arc::new(move |_runtime| *renders.lock().unwrap() += 1)
        },
        update_props: {
            let props_log = Arc::clone(&props_log);
            Arc::new(move |view_tag, props| {
                props_log
                    .lock()
                    .unwrap()
                    .push((view_tag, props.to_json().unwrap()));
            })
        },
        scroll_to: {
            let scroll_log = Arc::clone(&scroll_log);
            Arc::new(move |view_tag, x, y, animated| {
                scroll_log.lock().unwrap().push((view_tag, x, y, animated));
            })
        },
        measure: Arc::new(|view_tag| vec![("width".into(), 100.0 + f64::from(view_tag))]),
    };
    decorate_runtime(&runtime, &methods).unwrap();

    runtime
        .eval(
            r#"
            if (!_WORKLET) { throw new Error("not a worklet runtime"); }
            _updateProps(7, { opacity: 0.5 });
            _scrollTo(9, 10, 20, true);
            const layout = _measure(3);
            _updateProps(7, { width: layout.width });
            "#,
        )
        .unwrap();

    let props = props_log.lock().unwrap();
    assert_eq!(props.len(), 2);
    assert_eq!(props[0].0, 7);
    assert_eq!(props[0].1["opacity"], serde_json::json!(0.5));
    assert_eq!(props[1].1["width"], serde_json::json!(103));

    let scrolls = scroll_log.lock().unwrap();
    assert_eq!(scrolls.as_slice(), &[(9, 10.0, 20.0, true)]);
}

#[test]
fn bigint_crosses_as_decimal_text() {
    let runtime = WorkletRuntime::new().unwrap();

    // Far beyond i64 range.
    let shared = runtime.share("(123456789012345678901234567890n)").unwrap();
    assert_eq!(shared.as_str().unwrap(), "123456789012345678901234567890");

    let negative = runtime.share("(-7n)").unwrap();
    assert_eq!(negative.as_str().unwrap(), "-7");
}

#[test]
fn measure_reports_fields_in_declaration_order() {
    let runtime = WorkletRuntime::new().unwrap();
    let methods = PlatformDepMethodsHolder {
        measure: Arc::new(|_view_tag| {
            vec![
                ("width".into(), 1.0),
                ("height".into(), 2.0),
                ("x".into(), 3.0),
            ]
        }),
        ..PlatformDepMethodsHolder::default()
    };
    decorate_runtime(&runtime, &methods).unwrap();

    let keys: String = runtime.with(|ctx| ctx.eval("Object.keys(_measure(0)).join(',')").unwrap());
    assert_eq!(keys, "width,height,x");
}

#[test]
fn failing_frame_callback_does_not_starve_the_batch() {
    let runtime = WorkletRuntime::new().unwrap();
    decorate_runtime(&runtime, &PlatformDepMethodsHolder::default()).unwrap();

    runtime
        .eval(
            r#"
            globalThis.frames = [];
            requestAnimationFrame(() => { throw new Error("broken callback"); });
            requestAnimationFrame((t) => frames.push(t));
            "#,
        )
        .unwrap();

    let err = runtime.run_frame_callbacks(16.0).unwrap_err();
    assert!(matches!(err, ScriptError::Evaluation { .. }));

    // The callback after the failing one still ran.
    let frames: Vec<f64> = runtime.with(|ctx| ctx.eval("frames").unwrap());
    assert_eq!(frames, vec![16.0]);
}

#[test]
fn frame_callbacks_run_once_and_coalesce_render_requests() {
    let runtime = WorkletRuntime::new().unwrap();
    let renders: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));
    let methods = PlatformDepMethodsHolder {
        request_render: {
            let renders = Arc::clone(&renders);
            Arc::new(move |_runtime| *renders.lock().unwrap() += 1)
        },
        ..PlatformDepMethodsHolder::default()
    };
    decorate_runtime(&runtime, &methods).unwrap();

    runtime
        .eval(
            r#"
            globalThis.frames = [];
            requestAnimationFrame((t) => frames.push(t));
            requestAnimationFrame((t) => frames.push(t + 1));
            "#,
        )
        .unwrap();
    // Two queued callbacks, one render request.
    assert_eq!(*renders.lock().unwrap(), 1);

    runtime.run_frame_callbacks(16.0).unwrap();
    let frames: Vec<f64> = runtime.with(|ctx| ctx.eval("frames").unwrap());
    assert_eq!(frames, vec![16.0, 17.0]);

    // The queue drained; a second tick runs nothing new.
    runtime.run_frame_callbacks(32.0).unwrap();
    let frames: Vec<f64> = runtime.with(|ctx| ctx.eval("frames").unwrap());
    assert_eq!(frames, vec![16.0, 17.0]);

    // Queueing after a tick requests a fresh render.
    runtime
        .eval("requestAnimationFrame((t) => frames.push(t))")
        .unwrap();
    assert_eq!(*renders.lock().unwrap(), 2);
}
