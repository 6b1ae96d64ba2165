//! UI primitives for the Chatlock CLI.
//!
//! - **Context**: Terminal probing and output mode (json, plain, pretty)
//! - **Theme**: Badge tokens and styles
//! - **Render**: Tables, headers, receipts, hints
//! - **Format**: String utilities (truncate, timestamps)
//! - **Overlay**: Drawing gate and folder frames in the terminal

mod context;
pub mod format;
pub mod overlay;
pub mod render;
pub mod theme;

pub use context::{OutputMode, UiContext};
pub use theme::Badge;

pub use render::{badge, header, hint, kv, print, print_error, receipt, simple_table};

pub use format::{format_locked_at, truncate};
pub use overlay::TerminalHost;
