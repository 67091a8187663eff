//! Terminal host for a mounted page.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `render` - Layout: navbar, sidebar, main content
//! - `outline` - Element tree to styled lines
//! - `status` - Status bar widget
//! - `help` - Keybinding overlay
//! - `text` - Width-aware truncation and sanitizing

mod help;
mod input;
mod loop_runner;
mod outline;
mod render;
mod status;
mod text;

pub use loop_runner::{run, Action};
