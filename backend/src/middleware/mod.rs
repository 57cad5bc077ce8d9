//! Actix middleware shared by every route.
//!
//! [`Trace`] tags each request with a [`crate::TraceId`], logs its
//! completion, and echoes the id in the `trace-id` response header.

pub mod trace;

pub use trace::Trace;
