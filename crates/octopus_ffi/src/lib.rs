//! Flutter-facing bindings over `octopus_core`.

pub mod api;
