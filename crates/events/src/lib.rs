//! In-process notifications for job state changes.
//!
//! The store publishes [`StudioEvent`]s on an [`EventBus`]; renderers
//! (the CLI today, any other front end tomorrow) subscribe and react.

pub mod bus;

pub use bus::{EventBus, StudioEvent};
