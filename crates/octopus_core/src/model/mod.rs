//! Synchronized entity model.
//!
//! # Responsibility
//! - Define the envelope every cached/remote record satisfies.
//! - Define concrete entity kinds (calendar events).
//!
//! # Invariants
//! - An entity id identifies one logical record across local and remote sets.
//! - Each entity kind owns exactly one cache key and one remote collection.

pub mod calendar_event;
pub mod entity;
