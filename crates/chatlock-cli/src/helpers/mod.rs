//! Input helpers for the CLI.

mod input;

pub use input::{confirm, prompt_new_pin, prompt_pin};
