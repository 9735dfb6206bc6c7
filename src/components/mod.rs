//! Reusable ratatui widgets.

pub mod dialog;
pub mod grid;
pub mod status_bar;
pub mod tree;
