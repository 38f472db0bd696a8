//! `sora-studio` library crate.
//!
//! Holds the composition root and the command implementations; the
//! binary entrypoint lives in `main.rs`.

pub mod app;
pub mod commands;

pub use app::Studio;
