//! Panels: per-surface controllers and the multi-panel host.

pub mod controller;
pub mod host;
