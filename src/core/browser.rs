//! Storage browser session.
//!
//! [`BrowserSession`] ties the listing store, the open dialog and the shared
//! entity caches to a [`StorageApi`]. Views only call its methods and read
//! its [`Store`]; every network round-trip and every state change happens
//! here.
//!
//! Mutations follow one pattern: mark the dialog busy, issue the request,
//! then either invalidate the touched cache entries, close the dialog and
//! refresh the listing, or keep the dialog open with the error message and
//! leave the listing untouched.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::ArchiveGatePolicy;
use crate::core::cache::{CacheKey, DataStorageCache};
use crate::core::error::{ApiError, ValidationError};
use crate::core::listing::{
    InfoRequest, ListingOptions, ListingQuery, ListingStore, LoadPlan, PageRequest, RestoreLoad,
};
use crate::core::restore::{
    RestoreInfo, RestoreMode, RestoreNotification, RestorePath, RestoreRequest,
};
use crate::core::selectors::{
    self, Access, CapabilityContext, MaskRoleEvaluator, RoleEvaluator,
};
use crate::core::storage_api::{DeleteItem, StorageApi, UpdateItem};
use crate::core::store::Store;
use crate::core::validation::{child_path, validate_item_name};
use crate::models::{
    BrowserDialog, CurrentUser, DialogState, DownloadUrl, FileContent, ItemKey, ItemTags,
    ItemType, StoragePolicy,
};

// =============================================================================
// State
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Transient message shown above the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BrowserState {
    pub listing: ListingStore,
    pub dialog: DialogState,
    pub notice: Option<Notice>,
}

/// Options of a life-cycle restore submitted from the dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleRestoreForm {
    pub days: u32,
    pub restore_versions: bool,
    pub mode: RestoreMode,
    pub recipients: Vec<String>,
}

/// What to reload after a successful mutation.
#[derive(Default)]
struct Refresh {
    /// Object paths whose cache entries are stale.
    paths: Vec<String>,
    info: bool,
    restore: bool,
    /// Drop the selection; the selected entries are gone.
    clear_selection: bool,
}

// =============================================================================
// Session
// =============================================================================

pub struct BrowserSession<S, R = MaskRoleEvaluator> {
    api: Rc<S>,
    store: Rc<Store<BrowserState>>,
    cache: Rc<DataStorageCache>,
    user: RefCell<Option<CurrentUser>>,
    roles: R,
    gate: ArchiveGatePolicy,
}

impl<S: StorageApi> BrowserSession<S, MaskRoleEvaluator> {
    pub fn new(
        api: Rc<S>,
        cache: Rc<DataStorageCache>,
        options: ListingOptions,
        gate: ArchiveGatePolicy,
    ) -> Self {
        Self::with_roles(api, cache, options, gate, MaskRoleEvaluator)
    }
}

impl<S: StorageApi, R: RoleEvaluator> BrowserSession<S, R> {
    pub fn with_roles(
        api: Rc<S>,
        cache: Rc<DataStorageCache>,
        options: ListingOptions,
        gate: ArchiveGatePolicy,
        roles: R,
    ) -> Self {
        let state = BrowserState {
            listing: ListingStore::new(options),
            ..Default::default()
        };
        Self {
            api,
            store: Rc::new(Store::new(state)),
            cache,
            user: RefCell::new(None),
            roles,
            gate,
        }
    }

    pub fn store(&self) -> &Rc<Store<BrowserState>> {
        &self.store
    }

    pub fn cache(&self) -> &Rc<DataStorageCache> {
        &self.cache
    }

    pub fn set_user(&self, user: Option<CurrentUser>) {
        *self.user.borrow_mut() = user;
        // access flags depend on the user
        self.store.update(|_| {});
    }

    pub fn user(&self) -> Option<CurrentUser> {
        self.user.borrow().clone()
    }

    pub fn access(&self) -> Access {
        let user = self.user.borrow();
        self.store
            .with(|s| selectors::access(&s.listing, user.as_ref(), &self.roles))
    }

    /// Run `f` with the listing and the capability context of its rows.
    pub fn with_capabilities<T>(
        &self,
        now: &str,
        f: impl FnOnce(&ListingStore, &CapabilityContext<'_>) -> T,
    ) -> T {
        let access = self.access();
        self.store.with(|s| {
            let ctx = CapabilityContext {
                access,
                gate: self.gate,
                restore: s.listing.restore_info(),
                now,
            };
            f(&s.listing, &ctx)
        })
    }

    // -------------------------------------------------------------------------
    // Listing
    // -------------------------------------------------------------------------

    pub async fn initialize(&self, query: ListingQuery) {
        let plan = self.store.update(|s| {
            s.notice = None;
            s.listing.initialize(query)
        });
        self.execute(plan).await;
    }

    /// Reload info, page and restore state of the current query.
    pub async fn reload(&self) {
        let plan = self.store.update(|s| {
            s.notice = None;
            s.listing.reload()
        });
        self.execute(plan).await;
    }

    pub async fn navigate_to_path(&self, path: Option<&str>) {
        let plan = self.store.update(|s| s.listing.navigate_to_path(path));
        self.execute(plan).await;
    }

    pub async fn next_page(&self) {
        let request = self.store.update(|s| s.listing.navigate_to_next_page());
        self.load_page(request).await;
    }

    pub async fn previous_page(&self) {
        let request = self.store.update(|s| s.listing.navigate_to_previous_page());
        self.load_page(request).await;
    }

    pub async fn first_page(&self) {
        let request = self.store.update(|s| s.listing.navigate_to_first_page());
        self.load_page(request).await;
    }

    pub async fn refresh(&self, keep_current_page: bool) {
        let request = self
            .store
            .update(|s| s.listing.refresh_current_path(keep_current_page));
        self.load_page(request).await;
    }

    /// Run the requests of `plan` concurrently and apply their outcomes.
    async fn execute(&self, plan: LoadPlan) {
        let LoadPlan {
            info,
            page,
            restore,
        } = plan;
        futures::join!(
            self.load_info(info),
            self.load_page(page),
            self.load_restore(restore)
        );
    }

    async fn load_info(&self, request: Option<InfoRequest>) {
        let Some(request) = request else { return };
        let result = self.api.storage_info(request.storage_id).await;
        if let Err(error) = &result {
            tracing::warn!(storage_id = request.storage_id, %error, "storage info failed");
        }
        self.store
            .update(|s| s.listing.apply_info(request.ticket, result));
    }

    async fn load_page(&self, request: Option<PageRequest>) {
        let Some(request) = request else { return };
        tracing::debug!(
            storage_id = request.storage_id,
            path = ?request.path,
            page = request.page,
            "loading listing page"
        );
        let result = self.api.list_page(&request).await;
        self.store.update(|s| s.listing.apply_page(&request, result));
    }

    async fn load_restore(&self, request: Option<RestoreLoad>) {
        let Some(request) = request else { return };
        let result = self
            .api
            .restore_hierarchy(request.storage_id, request.path.as_deref())
            .await
            .map(|records| RestoreInfo::from_hierarchy(request.path.as_deref(), records));
        self.store
            .update(|s| s.listing.apply_restore(request.ticket, result));
    }

    // -------------------------------------------------------------------------
    // Selection and dialogs
    // -------------------------------------------------------------------------

    pub fn toggle_selection(&self, key: ItemKey) {
        self.store.update(|s| s.listing.toggle_selection(key));
    }

    pub fn select_all(&self, now: &str) {
        let access = self.access();
        let gate = self.gate;
        self.store.update(|s| {
            let restore = s.listing.restore_info().cloned();
            let ctx = CapabilityContext {
                access,
                gate,
                restore: restore.as_ref(),
                now,
            };
            s.listing
                .select_all(|item| selectors::item_capabilities(item, true, &ctx).selectable);
        });
    }

    pub fn clear_selection(&self) {
        self.store.update(|s| s.listing.clear_selection());
    }

    pub fn open_dialog(&self, dialog: BrowserDialog) {
        self.store.update(|s| s.dialog.open(dialog));
    }

    pub fn close_dialog(&self) {
        self.store.update(|s| s.dialog.close());
    }

    pub fn notify(&self, notice: Notice) {
        self.store.update(|s| s.notice = Some(notice));
    }

    pub fn dismiss_notice(&self) {
        self.store.update(|s| s.notice = None);
    }

    fn reject(&self, error: ValidationError) -> ApiError {
        let message = error.to_string();
        self.store.update(|s| {
            s.dialog.busy = false;
            s.dialog.error = Some(message);
        });
        error.into()
    }

    fn storage_id(&self) -> Result<u64, ApiError> {
        self.store
            .with(|s| s.listing.storage_id())
            .ok_or_else(|| ApiError::envelope("No storage selected"))
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Busy, request, then refresh or keep the dialog open with the error.
    async fn mutate<F, Fut>(
        &self,
        action: &'static str,
        request: F,
        refresh: Refresh,
    ) -> Result<(), ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ApiError>>,
    {
        let storage_id = self.storage_id()?;
        self.store.update(|s| {
            s.dialog.busy = true;
            s.dialog.error = None;
        });

        if let Err(error) = request().await {
            tracing::warn!(action, %error, "mutation failed");
            let message = error.to_string();
            self.store.update(|s| {
                s.dialog.busy = false;
                if s.dialog.dialog.is_open() {
                    s.dialog.error = Some(message);
                } else {
                    s.notice = Some(Notice::error(message));
                }
            });
            return Err(error);
        }

        tracing::info!(action, storage_id, "mutation succeeded");
        for path in &refresh.paths {
            self.cache.invalidate_object(storage_id, path);
        }
        let plan = self.store.update(|s| {
            s.dialog.close();
            if refresh.clear_selection {
                s.listing.clear_selection();
            }
            LoadPlan {
                info: refresh.info.then(|| s.listing.refresh_info()).flatten(),
                page: s.listing.refresh_current_path(true),
                restore: refresh.restore.then(|| s.listing.refresh_restore()).flatten(),
            }
        });
        self.execute(plan).await;
        Ok(())
    }

    /// Create an empty file or a folder in the current folder.
    pub async fn create_item(&self, item_type: ItemType, name: &str) -> Result<(), ApiError> {
        let (folder, siblings) = self.store.with(|s| {
            (
                s.listing.path().map(str::to_string),
                s.listing.items().to_vec(),
            )
        });
        if let Err(error) = validate_item_name(name, &siblings, None) {
            return Err(self.reject(error));
        }
        let storage_id = self.storage_id()?;
        let path = child_path(folder.as_deref(), name);
        let items = [UpdateItem::create(item_type, path)];
        self.mutate(
            "create",
            || self.api.update_items(storage_id, &items),
            Refresh::default(),
        )
        .await
    }

    /// Rename an entry of the visible page.
    pub async fn rename(&self, key: &ItemKey, new_name: &str) -> Result<(), ApiError> {
        let (folder, siblings, item) = self.store.with(|s| {
            (
                s.listing.path().map(str::to_string),
                s.listing.items().to_vec(),
                s.listing.find_item(key).cloned(),
            )
        });
        let Some(item) = item else {
            return Err(ApiError::envelope(format!("'{}' is no longer listed", key.name)));
        };
        if let Err(error) = validate_item_name(new_name, &siblings, Some(&item.name)) {
            return Err(self.reject(error));
        }
        let storage_id = self.storage_id()?;
        let new_path = child_path(folder.as_deref(), new_name);
        let items = [UpdateItem::rename(item.item_type, item.path.clone(), new_path)];
        let refresh = Refresh {
            paths: vec![item.path.clone()],
            ..Default::default()
        };
        self.mutate("rename", || self.api.update_items(storage_id, &items), refresh)
            .await
    }

    /// Delete entries of the visible page; `totally` also drops versions.
    pub async fn delete(&self, keys: &[ItemKey], totally: bool) -> Result<(), ApiError> {
        let items: Vec<DeleteItem> = self.store.with(|s| {
            keys.iter()
                .filter_map(|key| s.listing.find_item(key))
                .map(|item| DeleteItem {
                    item_type: item.item_type,
                    path: item.path.clone(),
                    version: None,
                })
                .collect()
        });
        if items.is_empty() {
            return Err(self.reject(ValidationError::EmptySelection));
        }
        let storage_id = self.storage_id()?;
        let refresh = Refresh {
            paths: items.iter().map(|i| i.path.clone()).collect(),
            clear_selection: true,
            ..Default::default()
        };
        self.mutate(
            "delete",
            || self.api.delete_items(storage_id, &items, totally),
            refresh,
        )
        .await
    }

    /// Delete one version of a file.
    pub async fn delete_version(&self, path: &str, version: &str) -> Result<(), ApiError> {
        let storage_id = self.storage_id()?;
        let items = [DeleteItem {
            item_type: ItemType::File,
            path: path.to_string(),
            version: Some(version.to_string()),
        }];
        let refresh = Refresh {
            paths: vec![path.to_string()],
            ..Default::default()
        };
        self.mutate(
            "delete version",
            || self.api.delete_items(storage_id, &items, false),
            refresh,
        )
        .await
    }

    /// Make an older version the latest one.
    pub async fn restore_version(&self, path: &str, version: &str) -> Result<(), ApiError> {
        let storage_id = self.storage_id()?;
        let refresh = Refresh {
            paths: vec![path.to_string()],
            ..Default::default()
        };
        self.mutate(
            "restore version",
            || self.api.restore_version(storage_id, path, version),
            refresh,
        )
        .await
    }

    /// Switch the storage to versioned mode.
    pub async fn convert_to_versioned(&self) -> Result<(), ApiError> {
        let storage_id = self.storage_id()?;
        let policy = self
            .store
            .with(|s| s.listing.info().map(|info| info.storage_policy.clone()))
            .unwrap_or_default();
        let policy = StoragePolicy {
            versioning_enabled: true,
            ..policy
        };
        let refresh = Refresh {
            info: true,
            ..Default::default()
        };
        self.mutate(
            "convert to versioned",
            || async {
                self.api.update_policy(storage_id, &policy).await?;
                Ok(())
            },
            refresh,
        )
        .await
    }

    /// Request a life-cycle restore of archived paths.
    pub async fn request_lifecycle_restore(
        &self,
        paths: &[String],
        form: LifecycleRestoreForm,
    ) -> Result<(), ApiError> {
        if form.days == 0 {
            return Err(self.reject(ValidationError::InvalidDuration));
        }
        if paths.is_empty() {
            return Err(self.reject(ValidationError::EmptySelection));
        }
        let storage_id = self.storage_id()?;
        let restore_paths = self.store.with(|s| {
            paths
                .iter()
                .map(|path| {
                    let item_type = s
                        .listing
                        .items()
                        .iter()
                        .find(|item| &item.path == path)
                        .map_or(ItemType::File, |item| item.item_type);
                    RestorePath {
                        path: format!("/{}", path.trim_start_matches('/')),
                        path_type: item_type.into(),
                    }
                })
                .collect()
        });
        let request = RestoreRequest {
            datastorage_id: storage_id,
            days: form.days,
            restore_versions: form.restore_versions,
            restore_mode: form.mode,
            paths: restore_paths,
            notification: RestoreNotification {
                enabled: !form.recipients.is_empty(),
                recipients: form.recipients,
            },
        };
        let refresh = Refresh {
            restore: true,
            ..Default::default()
        };
        self.mutate(
            "life-cycle restore",
            || async {
                self.api.request_restore(&request).await?;
                Ok(())
            },
            refresh,
        )
        .await
    }

    /// Replace the tags of an object.
    pub async fn update_tags(
        &self,
        path: &str,
        version: Option<&str>,
        tags: ItemTags,
    ) -> Result<(), ApiError> {
        let storage_id = self.storage_id()?;
        self.store.update(|s| {
            s.dialog.busy = true;
            s.dialog.error = None;
        });
        match self.api.update_tags(storage_id, path, version, &tags).await {
            Ok(updated) => {
                self.cache.tags.invalidate(storage_id, path, version);
                let cell = self.cache.tags.get(storage_id, path, version);
                let ticket = cell.borrow_mut().begin();
                cell.borrow_mut().resolve(ticket, Ok(updated));
                self.store.update(|s| s.dialog.close());
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, path, "tag update failed");
                let message = error.to_string();
                self.store.update(|s| {
                    s.dialog.busy = false;
                    s.dialog.error = Some(message);
                });
                Err(error)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Cached reads
    // -------------------------------------------------------------------------

    pub async fn tags(&self, path: &str, version: Option<&str>) -> Result<ItemTags, ApiError> {
        let storage_id = self.storage_id()?;
        let key = CacheKey::new(storage_id, path, version);
        self.cache
            .tags
            .load(key, || self.api.tags(storage_id, path, version))
            .await
    }

    pub async fn content(
        &self,
        path: &str,
        version: Option<&str>,
    ) -> Result<FileContent, ApiError> {
        let storage_id = self.storage_id()?;
        let key = CacheKey::new(storage_id, path, version);
        self.cache
            .content
            .load(key, || self.api.content(storage_id, path, version))
            .await
    }

    pub async fn download_url(
        &self,
        path: &str,
        version: Option<&str>,
    ) -> Result<DownloadUrl, ApiError> {
        let storage_id = self.storage_id()?;
        let key = CacheKey::new(storage_id, path, version);
        self.cache
            .download_url
            .load(key, || self.api.download_url(storage_id, path, version))
            .await
    }

    /// Generate links for the selection and show them in a dialog.
    pub async fn download_selected(&self, now: &str) -> Result<(), ApiError> {
        let enabled = self.with_capabilities(now, selectors::bulk_download_enabled);
        if !enabled {
            let error = ValidationError::EmptySelection;
            self.store
                .update(|s| s.notice = Some(Notice::error(error.to_string())));
            return Err(error.into());
        }
        let storage_id = self.storage_id()?;
        let paths: Vec<String> = self.store.with(|s| {
            s.listing
                .selected_items()
                .into_iter()
                .map(|item| item.path.clone())
                .collect()
        });

        let result = match paths.as_slice() {
            [single] => self.download_url(single, None).await.map(|url| vec![url]),
            _ => self.api.download_urls(storage_id, &paths).await,
        };
        match result {
            Ok(urls) => {
                let urls = urls.into_iter().map(|u| u.url).collect();
                self.store
                    .update(|s| s.dialog.open(BrowserDialog::DownloadUrls { urls }));
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, count = paths.len(), "download link generation failed");
                self.store
                    .update(|s| s.notice = Some(Notice::error(error.to_string())));
                Err(error)
            }
        }
    }
}

#[cfg(test)]
pub mod mock {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::core::restore::RestoreRecord;
    use crate::models::{ListingPage, StorageInfo};

    /// In-memory storage API answering from queues and logging calls.
    #[derive(Default)]
    pub struct MockStorage {
        pub info: RefCell<Option<StorageInfo>>,
        pub pages: RefCell<VecDeque<Result<ListingPage, ApiError>>>,
        pub mutations: RefCell<VecDeque<Result<(), ApiError>>>,
        pub calls: RefCell<Vec<String>>,
        pub tags: RefCell<ItemTags>,
    }

    impl MockStorage {
        fn log(&self, call: impl Into<String>) {
            self.calls.borrow_mut().push(call.into());
        }

        fn mutation(&self) -> Result<(), ApiError> {
            self.mutations.borrow_mut().pop_front().unwrap_or(Ok(()))
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl StorageApi for MockStorage {
        async fn storage_info(&self, storage_id: u64) -> Result<StorageInfo, ApiError> {
            self.log(format!("info {storage_id}"));
            self.info
                .borrow()
                .clone()
                .ok_or_else(|| ApiError::http(404, "Storage not found"))
        }

        async fn list_page(&self, request: &PageRequest) -> Result<ListingPage, ApiError> {
            self.log(format!("list {:?} {:?}", request.path, request.marker));
            self.pages
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(ListingPage::default()))
        }

        async fn update_items(&self, _: u64, items: &[UpdateItem]) -> Result<(), ApiError> {
            for item in items {
                self.log(format!("update {:?} {}", item.action, item.path));
            }
            self.mutation()
        }

        async fn delete_items(&self, _: u64, items: &[DeleteItem], totally: bool) -> Result<(), ApiError> {
            for item in items {
                self.log(format!("delete {} {totally}", item.path));
            }
            self.mutation()
        }

        async fn restore_version(&self, _: u64, path: &str, version: &str) -> Result<(), ApiError> {
            self.log(format!("restore {path} {version}"));
            self.mutation()
        }

        async fn download_url(&self, _: u64, path: &str, _: Option<&str>) -> Result<DownloadUrl, ApiError> {
            self.log(format!("url {path}"));
            Ok(DownloadUrl {
                url: format!("https://dl/{path}"),
                path: Some(path.to_string()),
                expires: None,
            })
        }

        async fn download_urls(&self, _: u64, paths: &[String]) -> Result<Vec<DownloadUrl>, ApiError> {
            self.log(format!("urls {}", paths.len()));
            Ok(paths
                .iter()
                .map(|p| DownloadUrl {
                    url: format!("https://dl/{p}"),
                    path: Some(p.clone()),
                    expires: None,
                })
                .collect())
        }

        async fn tags(&self, _: u64, path: &str, _: Option<&str>) -> Result<ItemTags, ApiError> {
            self.log(format!("tags {path}"));
            Ok(self.tags.borrow().clone())
        }

        async fn update_tags(
            &self,
            _: u64,
            path: &str,
            _: Option<&str>,
            tags: &ItemTags,
        ) -> Result<ItemTags, ApiError> {
            self.log(format!("update tags {path}"));
            self.mutation()?;
            *self.tags.borrow_mut() = tags.clone();
            Ok(tags.clone())
        }

        async fn content(&self, _: u64, path: &str, _: Option<&str>) -> Result<FileContent, ApiError> {
            self.log(format!("content {path}"));
            Ok(FileContent {
                bytes: b"hello".to_vec(),
                truncated: false,
                may_be_binary: false,
            })
        }

        async fn update_policy(&self, _: u64, policy: &StoragePolicy) -> Result<StorageInfo, ApiError> {
            self.log(format!("policy versioning={}", policy.versioning_enabled));
            self.mutation()?;
            let mut info = self.info.borrow().clone().unwrap_or_default();
            info.storage_policy = policy.clone();
            *self.info.borrow_mut() = Some(info.clone());
            Ok(info)
        }

        async fn restore_hierarchy(&self, _: u64, path: Option<&str>) -> Result<Vec<RestoreRecord>, ApiError> {
            self.log(format!("hierarchy {path:?}"));
            Ok(Vec::new())
        }

        async fn request_restore(&self, request: &RestoreRequest) -> Result<Vec<RestoreRecord>, ApiError> {
            self.log(format!("lifecycle restore {} {}", request.paths.len(), request.days));
            self.mutation()?;
            Ok(Vec::new())
        }
    }
}
