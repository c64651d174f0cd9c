//! Core business logic of the storage console.
//!
//! Nothing in here touches the DOM:
//! - [`api`], [`storage_api`], [`users_api`] - REST client and endpoints
//! - [`request`], [`store`], [`cache`] - Remote state, subscriptions, entity caches
//! - [`listing`], [`selectors`], [`browser`] - Paginated storage browsing
//! - [`restore`] - Life-cycle restore state of archived objects
//! - [`csv`], [`users`], [`cli_template`], [`validation`] - Forms and exchange formats

pub mod api;
pub mod browser;
pub mod cache;
pub mod cli_template;
pub mod csv;
pub mod error;
pub mod listing;
pub mod request;
pub mod restore;
pub mod selectors;
pub mod storage_api;
pub mod store;
pub mod users;
pub mod users_api;
pub mod validation;

pub use api::ApiClient;
pub use browser::{BrowserSession, BrowserState, LifecycleRestoreForm, Notice, NoticeKind};
pub use cache::DataStorageCache;
pub use error::{ApiError, FetchError};
pub use listing::{ListingOptions, ListingPhase, ListingQuery};
pub use storage_api::StorageApi;
pub use store::Store;
pub use users_api::UsersApi;
