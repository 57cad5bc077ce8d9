//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **ai**: chat-completions client for module generation and answer grading
//! - **notify**: certificate notification sinks
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod ai;
pub mod notify;
pub mod persistence;
