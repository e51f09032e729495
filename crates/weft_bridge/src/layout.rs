//! Layout animation progress plumbing
//!
//! The proxy ties per-view [`MutableValue`] cells to a platform observer:
//! every write to an observed cell becomes one progress notification, and
//! every observation ends with exactly one end notification. Proxy
//! operations never throw; bad input is logged and skipped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use weft_core::{ListenerKey, ValueWrapper};
use weft_script::rquickjs::Object;
use weft_script::shallow_clone;

use crate::mutable::MutableValue;

pub trait LayoutAnimationObserver: Send + Sync {
    /// Receives a fresh shallow clone of the animated values for one view.
    fn notify_about_progress(&self, view_tag: i32, progress: Object<'_>);
    /// Receives the end of an observation. `was_cancelled` is true when
    /// the animation did not run to completion.
    fn notify_about_end(&self, view_tag: i32, was_cancelled: bool);
}

pub struct LayoutAnimationsProxy {
    observer: Arc<dyn LayoutAnimationObserver>,
    observed: Mutex<HashMap<i32, Arc<MutableValue>>>,
}

impl LayoutAnimationsProxy {
    pub fn new(observer: Arc<dyn LayoutAnimationObserver>) -> Self {
        Self {
            observer,
            observed: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_observing(&self, view_tag: i32) -> bool {
        self.observed.lock().unwrap().contains_key(&view_tag)
    }

    /// Observe a view's animated values. An existing observation for the
    /// same tag is force-stopped first and reported as cancelled, so a tag
    /// never carries two live registrations.
    pub fn start_observing(&self, view_tag: i32, value: &Arc<MutableValue>) {
        let key = ListenerKey::layout(view_tag);
        let previous = self.observed.lock().unwrap().remove(&view_tag);
        if let Some(previous) = previous {
            previous.remove_listener(&key);
            tracing::warn!(view_tag, "observation replaced before it ended");
            self.observer.notify_about_end(view_tag, true);
        }

        let observer = Arc::clone(&self.observer);
        let cell = Arc::downgrade(value);
        value.add_listener(
            key,
            Arc::new(move |runtime, ctx| {
                let Some(cell) = cell.upgrade() else { return };
                let snapshot = cell.snapshot();
                match snapshot.wrapper() {
                    ValueWrapper::Object(frozen) => {
                        match shallow_clone(runtime.core(), ctx, frozen) {
                            Ok(progress) => observer.notify_about_progress(view_tag, progress),
                            Err(err) => {
                                tracing::warn!(view_tag, %err, "progress clone failed")
                            }
                        }
                    }
                    other => {
                        tracing::warn!(
                            view_tag,
                            kind = other.kind(),
                            "non-object progress skipped"
                        )
                    }
                }
            }),
        );
        self.observed
            .lock()
            .unwrap()
            .insert(view_tag, Arc::clone(value));
        tracing::debug!(view_tag, "layout observation started");
    }

    /// End an observation. Unobserved tags are a no-op; otherwise the
    /// listener is detached and the observer hears the end exactly once.
    pub fn stop_observing(&self, view_tag: i32, finished: bool) {
        let Some(cell) = self.observed.lock().unwrap().remove(&view_tag) else {
            return;
        };
        cell.remove_listener(&ListenerKey::layout(view_tag));
        tracing::debug!(view_tag, finished, "layout observation stopped");
        self.observer.notify_about_end(view_tag, !finished);
    }

    /// Report a cancelled animation. Also drops any live registration for
    /// the tag, so a cancelled view cannot keep feeding progress.
    pub fn notify_about_cancellation(&self, view_tag: i32) {
        if let Some(cell) = self.observed.lock().unwrap().remove(&view_tag) {
            cell.remove_listener(&ListenerKey::layout(view_tag));
        }
        self.observer.notify_about_end(view_tag, false);
    }
}
