//! # Lifecycle Events
//!
//! Broadcast channel for task and mutation lifecycle events. Publishing with
//! no subscribers succeeds; observability layers above the core attach
//! receivers when they care.

pub mod publisher;

pub use publisher::{EventPublisher, LifecycleEvent, PublishError};
