//! Command handlers.

pub mod folder;
pub mod gate;
pub mod misc;
pub mod pin;
pub mod watch;
