//! The pipeline engine every business module runs on.
//!
//! A [`handler::Handler`] scans a store for actionable entities, gates them
//! through the shared [`running::RunningSet`], executes them on a pool of
//! workers and routes each result to the persist, notify and release stages.
//! All stages communicate over `tokio` channels and stop on a shared
//! cancellation token.

pub mod executor;
pub mod feed;
pub mod handler;
pub mod message;
pub mod notif;
pub mod persistent;
pub mod retry;
pub mod running;
pub mod scanner;
pub mod scheduler;
