//! UI components built with Leptos.
//!
//! - [`router`] - Application routing (main entry point)
//! - [`storage`] - Data storage browser: toolbar, item table, dialogs
//! - [`cli`] - CLI install and configuration commands
//! - [`users`] - Users CSV import and export
//! - [`widgets`] - Small shared views (code block, region tag, metadata editor)
//! - [`icons`] - Centralized icon definitions (change theme here)

pub mod cli;
pub mod icons;
pub mod router;
pub mod storage;
pub mod users;
pub mod widgets;

pub use router::AppRouter;
