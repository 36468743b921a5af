//! Middleware layer.
//!
//! Cross-cutting concerns wrapped around every dispatched request.
//!
//! - [`trace`]: per-request span with method and path, plus one completion
//!   event carrying status and latency.

mod trace;

pub(crate) use trace::trace;
