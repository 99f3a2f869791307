//! # Gated executor with pipelines
//!
//! Demonstrates:
//! - Fire-and-forget units sharing one capacity gate
//! - Pipelines whose stage outputs lead the next stage's arguments
//! - Validation errors returned by `execute` without running anything
//! - Builder reuse through the pool

use std::sync::Arc;
use std::time::Duration;

use taskgate::{Config, Executor, Handler, Kind, LogWriter, Subscribe, Value};

fn stage1() -> Handler {
    Handler::func(|n: i64| {
        println!("stage1 got {n}");
        format!("2222-{n}")
    })
    .named("stage1")
}

fn stage2() -> Handler {
    Handler::func(|s: String, n: i64| {
        println!("stage2 got {s} and {n}");
    })
    .named("stage2")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = Config {
        gate_capacity: 2,
        verbose: true,
        ..Config::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let ex = Executor::builder(cfg).with_subscribers(subs).build();

    let nap = Handler::from_async([Kind::Int], Vec::<Kind>::new(), |args| async move {
        let ms = args[0].as_int().unwrap_or(0).unsigned_abs();
        tokio::time::sleep(Duration::from_millis(ms)).await;
        println!("napped {ms}ms");
        Vec::new()
    });
    for ms in [100i64, 150, 200] {
        let name = ex
            .fire_and_forget(None, nap.clone(), None, vec![Value::from(ms)])
            .await?;
        println!("admitted {name}");
    }

    for n in 1..=3i64 {
        ex.init(Some("label"))
            .append(stage1(), vec![Value::from(n)])
            .append(stage2(), vec![Value::from(4i64)])
            .execute()
            .await?;
    }

    let rejected = ex
        .init(None)
        .append(stage1(), vec![Value::from(1i64)])
        .append(stage2(), Vec::new())
        .execute()
        .await;
    if let Err(e) = rejected {
        println!("rejected pipeline: {e}");
    }

    ex.when_all_complete().await?;
    println!("idle builders in pool: {}", ex.idle_builders());
    Ok(())
}
