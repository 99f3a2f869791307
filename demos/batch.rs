//! # Batch run through the registry
//!
//! Demonstrates:
//! - Registering named units with arguments
//! - Post handlers that receive each unit's outputs
//! - Bounded parallelism and the aggregate result map
//! - Status lines and a progress subscriber
//!
//! Run with `RUST_LOG=debug cargo run --example batch` to see status lines.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use taskgate::{Config, Handler, Kind, LogWriter, ProgressReporter, Registry, Subscribe, Value};

/// Simulated fetch: waits a little, then returns the page "body" and its size.
fn fetch() -> Handler {
    Handler::from_async([Kind::Str, Kind::Int], [Kind::Str, Kind::Int], |args| async move {
        let url = args[0].as_str().unwrap_or_default().to_owned();
        let delay = args[1].as_int().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay.unsigned_abs())).await;
        let body = format!("<html>{url}</html>");
        let size = body.len() as i64;
        vec![Value::from(body), Value::from(size)]
    })
    .named("fetch")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let done = Arc::new(AtomicUsize::new(0));
    let ticks = Arc::clone(&done);
    let subs: Vec<Arc<dyn Subscribe>> = vec![
        Arc::new(LogWriter::new()),
        Arc::new(ProgressReporter::new(Arc::new(move || {
            let n = ticks.fetch_add(1, Ordering::Relaxed) + 1;
            println!("progress: {n} finished");
        }))),
    ];

    let reg = Registry::builder(Config::default())
        .with_subscribers(subs)
        .build();

    let report = Handler::func(|body: String, size: i64| {
        println!("fetched {size:>4} bytes: {body}");
    });

    for (i, site) in ["alpha", "beta", "gamma", "delta", "epsilon"].iter().enumerate() {
        reg.submit(
            *site,
            fetch(),
            Some(report.clone().into()),
            vec![
                Value::from(format!("https://{site}.example")),
                Value::from(50 * (i as i64 + 1)),
            ],
        )
        .await?;
    }

    let handle = reg.run(2).await?;
    reg.wait().await;
    let results = handle.results().await?;

    let mut names: Vec<_> = results.keys().cloned().collect();
    names.sort();
    for name in names {
        println!("{name}: {:?}", results[&name]);
    }
    for line in reg.status_lines().await {
        println!("{line}");
    }
    reg.log_status().await;

    Ok(())
}
