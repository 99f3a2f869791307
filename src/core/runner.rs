//! # Run a single unit of work.
//!
//! Shared by the registry's execution contexts and the executor's
//! fire-and-forget units.
//!
//! ## Flow
//! ```text
//! handler.invoke(args) ──► Ok(out)   ──► post? (arity == out.len()) ──► post.invoke(out.clone())
//!                     └──► Err/panic ──► publish UnitFailed, out = []
//! ```
//!
//! ## Rules
//! - Never returns an error: handler failures become an empty result plus a
//!   `UnitFailed` event, post failures a `PostFailed` event.
//! - The post handler only sees a copy of the outputs; the unit's result is
//!   what the handler produced.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::debug;

use crate::events::{Bus, Event, EventKind};
use crate::invoke::{Handler, Value};

/// Runs `handler` with `args`, then `post` when its parameter count matches.
///
/// Returns the handler's outputs (empty on failure).
pub(crate) async fn run_unit(
    name: &str,
    handler: &Handler,
    post: Option<&Handler>,
    args: Vec<Value>,
    bus: &Bus,
) -> Vec<Value> {
    let out = match AssertUnwindSafe(handler.invoke(args)).catch_unwind().await {
        Ok(Ok(out)) => out,
        Ok(Err(e)) => {
            publish_failed(bus, EventKind::UnitFailed, name, e.to_string());
            return Vec::new();
        }
        Err(panic) => {
            publish_failed(bus, EventKind::UnitFailed, name, panic_message(&*panic));
            return Vec::new();
        }
    };

    if let Some(post) = post {
        if post.arity() == out.len() {
            let res = AssertUnwindSafe(post.invoke(out.clone())).catch_unwind().await;
            let reason = match res {
                Ok(Ok(_)) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(panic) => Some(panic_message(&*panic)),
            };
            if let Some(reason) = reason {
                debug!(unit = name, post = post.name(), %reason, "post handler failed");
                publish_failed(bus, EventKind::PostFailed, name, reason);
            }
        } else {
            debug!(
                unit = name,
                post = post.name(),
                outputs = out.len(),
                params = post.arity(),
                "post handler skipped: parameter count differs from output count"
            );
        }
    }

    out
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_owned()
    }
}

fn publish_failed(bus: &Bus, kind: EventKind, name: &str, reason: String) {
    bus.publish(Event::new(kind).with_task(name).with_reason(reason));
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};

    use super::*;

    #[tokio::test]
    async fn post_receives_outputs_when_counts_match() {
        let bus = Bus::new(8);
        let seen = Arc::new(AtomicI64::new(0));
        let s = Arc::clone(&seen);

        let handler = Handler::func(|n: i64| n * 10);
        let post = Handler::func(move |n: i64| {
            s.store(n, Ordering::SeqCst);
        });

        let out = run_unit("u", &handler, Some(&post), vec![Value::from(4i64)], &bus).await;
        assert_eq!(out, vec![Value::from(40i64)]);
        assert_eq!(seen.load(Ordering::SeqCst), 40);
    }

    #[tokio::test]
    async fn post_is_skipped_on_count_mismatch() {
        let bus = Bus::new(8);
        let seen = Arc::new(AtomicI64::new(0));
        let s = Arc::clone(&seen);

        let handler = Handler::func(|| (1i64, 2i64));
        let post = Handler::func(move |n: i64| {
            s.store(n, Ordering::SeqCst);
        });

        let out = run_unit("u", &handler, Some(&post), Vec::new(), &bus).await;
        assert_eq!(out.len(), 2);
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn panic_becomes_empty_result_and_event() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        let handler = Handler::func(|| -> i64 { panic!("boom") });
        let out = run_unit("p", &handler, None, Vec::new(), &bus).await;
        assert!(out.is_empty());

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::UnitFailed);
        assert_eq!(ev.reason.as_deref(), Some("panicked: boom"));
    }

    #[tokio::test]
    async fn post_failure_is_published() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        let handler = Handler::func(|| String::from("x"));
        let post = Handler::func(|_s: String| -> () { panic!("post bug") });
        let out = run_unit("q", &handler, Some(&post), Vec::new(), &bus).await;
        assert_eq!(out, vec![Value::from("x")]);

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::PostFailed);
        assert_eq!(ev.task.as_deref(), Some("q"));
    }
}
