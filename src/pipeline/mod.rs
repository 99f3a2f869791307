//! Multi-stage pipelines run through the [`Executor`](crate::Executor)'s gate.
//!
//! ## Contents
//! - [`PipelineBuilder`], [`Stage`], [`BuilderState`] validated stage list
//! - [`BuilderPool`] free list of reset builders
//! - [`Chain`] fluent handle returned by `Executor::init`
//!
//! ## Example
//! ```rust
//! use taskgate::{Config, Executor, Handler, Value};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let ex = Executor::new(Config::default());
//!
//!     ex.init(Some("label"))
//!         .append(Handler::func(|n: i64| format!("item-{n}")), vec![Value::from(7i64)])
//!         .append(Handler::func(|s: String, n: i64| s.len() as i64 + n), vec![Value::from(4i64)])
//!         .execute()
//!         .await
//!         .unwrap();
//!
//!     ex.join().await;
//! }
//! ```

mod builder;
mod chain;
mod pool;

pub use builder::{BuilderState, PipelineBuilder, Stage};
pub use chain::Chain;
pub use pool::BuilderPool;
