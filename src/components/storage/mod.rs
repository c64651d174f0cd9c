//! Data-storage browser.
//!
//! Components:
//! - [`DataStorage`] - Browser view of one storage, driven by the route
//! - [`Toolbar`] - Breadcrumbs, view toggles and bulk actions
//! - [`ItemTable`] - Rows of the visible page
//! - [`Pagination`] - Marker-based page navigation
//! - [`Dialogs`] - The one open modal dialog

mod dialogs;
mod item_table;
mod pagination;
#[allow(clippy::module_inception)]
mod storage;
mod toolbar;

pub use dialogs::Dialogs;
pub use item_table::ItemTable;
pub use pagination::Pagination;
pub use storage::{DataStorage, StorageRouteContext};
pub use toolbar::Toolbar;
