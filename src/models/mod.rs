//! Data models and types for the application.
//!
//! Contains domain types for:
//! - [`StorageItem`], [`ItemType`], [`ListingPage`], [`StorageInfo`] - Storage listing payloads
//! - [`SelectionSet`], [`ItemKey`], [`BrowserDialog`] - Browser view state
//! - [`CurrentUser`], [`AccessToken`], [`GitCredentials`] - Users and credentials
//! - [`AppRoute`], [`BrowserRoute`] - Hash-based navigation with deep links

mod browser;
mod route;
mod storage;
mod user;

pub use browser::{BrowserDialog, DialogState, ItemKey, SelectionSet};
pub use route::{AppRoute, BrowserRoute, normalize_folder_path};
pub use storage::{
    DownloadUrl, FileContent, ItemTags, ItemType, ListingPage, MountStatus, STORAGE_CLASS_LABEL,
    StorageInfo, StorageItem, StoragePolicy, StorageType,
};
pub use user::{
    AccessToken, CurrentUser, ExportOptions, GitCredentials, ImportEvent, ImportOptions, Role,
    ROLE_ADMIN, ROLE_STORAGE_MANAGER,
};
