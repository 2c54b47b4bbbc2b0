//! Use-case services over the synchronizer.
//!
//! # Responsibility
//! - Expose entity-specific entry points to the UI/FFI/CLI layers.
//! - Keep callers unaware of cache keys and remote collection names.

pub mod calendar_service;
