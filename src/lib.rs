//! Sidebar, countdown and form behaviors for server-rendered pages.
//!
//! The page is an in-memory [`dom::Document`]. Components mount onto it,
//! render their state as [`dom::DomOp`] lists, and the host commits those
//! ops. The terminal host in `main.rs` is one such host; tests are another.
//!
//! - [`countdown`] - daily/weekly reset countdowns
//! - [`sidebar`] - collapsible sidebar with mutually exclusive submenus
//! - [`navbar`] - profile menu toggle
//! - [`glue`] - element to transition bindings
//! - [`localize`], [`preview`], [`wizard`] - one-shot page helpers
//! - [`page`] - mounts all of the above with failure isolation

pub mod clock;
pub mod config;
pub mod countdown;
pub mod dom;
pub mod error;
pub mod glue;
pub mod localize;
pub mod navbar;
pub mod page;
pub mod preview;
pub mod sidebar;
pub mod wizard;
