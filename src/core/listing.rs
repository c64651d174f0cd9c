//! Paginated storage listing.
//!
//! [`ListingStore`] is the single owner of the browsing state of one storage:
//! the current folder, the page marker history, the visible page and its
//! selection, the storage info and the restore state of the folder.
//!
//! The store never performs I/O. Every transition returns the request(s) to
//! issue, stamped with a ticket; the caller runs them and feeds the outcome
//! back through the `apply_*` methods. Outcomes carrying a superseded ticket
//! are dropped, so rapid navigation can never show a stale page.
//!
//! # Page markers
//!
//! `page_markers[0]` is always `None` (the first page needs no marker) and
//! `page_markers[k]` exists only if page `k - 1` was fetched and returned a
//! continuation token.

use std::collections::HashMap;

use crate::config::{ListingSettings, PageHistoryPolicy};
use crate::core::error::ApiError;
use crate::core::request::{RemoteRequest, Ticket};
use crate::core::restore::RestoreInfo;
use crate::models::{
    normalize_folder_path, BrowserRoute, ItemKey, ListingPage, SelectionSet, StorageInfo,
    StorageItem,
};

// =============================================================================
// Requests
// =============================================================================

/// What is being listed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListingQuery {
    pub storage_id: u64,
    /// Folder path, `None` for the storage root.
    pub path: Option<String>,
    pub show_versions: bool,
    pub show_archives: bool,
}

impl ListingQuery {
    pub fn new(storage_id: u64, path: Option<&str>) -> Self {
        Self {
            storage_id,
            path: path.and_then(normalize_folder_path),
            show_versions: false,
            show_archives: false,
        }
    }

    fn path_key(&self) -> &str {
        self.path.as_deref().unwrap_or("")
    }
}

impl From<&BrowserRoute> for ListingQuery {
    fn from(route: &BrowserRoute) -> Self {
        Self {
            storage_id: route.storage_id,
            path: route.path.clone(),
            show_versions: route.versions,
            show_archives: route.archives,
        }
    }
}

/// Fetch of one listing page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub ticket: Ticket,
    pub storage_id: u64,
    pub path: Option<String>,
    /// Zero-based page number being fetched.
    pub page: usize,
    pub marker: Option<String>,
    pub page_size: usize,
    pub show_versions: bool,
    pub show_archives: bool,
}

/// Fetch of the storage info.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoRequest {
    pub ticket: Ticket,
    pub storage_id: u64,
}

/// Fetch of the restore hierarchy of a folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestoreLoad {
    pub ticket: Ticket,
    pub storage_id: u64,
    pub path: Option<String>,
}

/// Requests produced by one transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadPlan {
    pub info: Option<InfoRequest>,
    pub page: Option<PageRequest>,
    pub restore: Option<RestoreLoad>,
}

impl LoadPlan {
    fn page(page: PageRequest) -> Self {
        Self {
            info: None,
            page: Some(page),
            restore: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_none() && self.page.is_none() && self.restore.is_none()
    }
}

// =============================================================================
// State
// =============================================================================

/// Coarse loading state derived from the individual requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingPhase {
    Idle,
    LoadingInfo,
    LoadingPage,
    Ready,
    InfoFailed,
    PageFailed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct PageHistory {
    markers: Vec<Option<String>>,
    current_page: usize,
}

impl Default for PageHistory {
    fn default() -> Self {
        Self {
            markers: vec![None],
            current_page: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListingOptions {
    pub page_size: usize,
    pub keep_pages_history: bool,
    pub page_history_policy: PageHistoryPolicy,
}

impl Default for ListingOptions {
    fn default() -> Self {
        ListingSettings::default().into()
    }
}

impl From<ListingSettings> for ListingOptions {
    fn from(settings: ListingSettings) -> Self {
        Self {
            page_size: settings.page_size.max(1),
            keep_pages_history: settings.keep_pages_history,
            page_history_policy: settings.page_history_policy,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ListingStore {
    options: ListingOptions,
    query: Option<ListingQuery>,
    pages: PageHistory,
    /// Saved page history of other folders, keyed by folder path.
    history: HashMap<String, PageHistory>,
    info: RemoteRequest<StorageInfo, ApiError>,
    page: RemoteRequest<ListingPage, ApiError>,
    restore: RemoteRequest<RestoreInfo, ApiError>,
    selection: SelectionSet,
}

impl ListingStore {
    pub fn new(options: ListingOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Point the store at `query`.
    ///
    /// Switching storages resets everything and reloads the storage info.
    /// Toggling versions/archives forgets every marker (pages differ).
    /// A new path behaves like [`navigate_to_path`](Self::navigate_to_path);
    /// the same query refreshes the current page.
    pub fn initialize(&mut self, query: ListingQuery) -> LoadPlan {
        let Some(current) = self.query.clone() else {
            return self.reset_to(query);
        };

        if current.storage_id != query.storage_id {
            return self.reset_to(query);
        }

        if current.show_versions != query.show_versions
            || current.show_archives != query.show_archives
        {
            self.history.clear();
            self.pages = PageHistory::default();
            self.selection.clear();
            self.query = Some(query);
            let page = self.begin_page(0);
            return LoadPlan::page(page);
        }

        if current.path != query.path {
            return self.navigate_to_path(query.path.as_deref());
        }

        match self.refresh_current_path(true) {
            Some(page) => LoadPlan::page(page),
            None => self.reset_to(query),
        }
    }

    fn reset_to(&mut self, query: ListingQuery) -> LoadPlan {
        tracing::debug!(storage_id = query.storage_id, path = ?query.path, "listing reset");
        // Requests are reset rather than recreated so tickets issued for the
        // previous storage stay stale.
        self.history.clear();
        self.pages = PageHistory::default();
        self.selection.clear();
        self.info.reset();
        self.page.reset();
        self.restore.reset();
        self.query = Some(query.clone());

        let info = InfoRequest {
            ticket: self.info.begin(),
            storage_id: query.storage_id,
        };
        let page = self.begin_page(0);
        let restore = self.begin_restore();
        LoadPlan {
            info: Some(info),
            page: Some(page),
            restore,
        }
    }

    /// Start over with the current query, reloading the storage info.
    pub fn reload(&mut self) -> LoadPlan {
        match self.query.clone() {
            Some(query) => self.reset_to(query),
            None => LoadPlan {
                info: None,
                page: None,
                restore: None,
            },
        }
    }

    /// Open another folder of the same storage.
    pub fn navigate_to_path(&mut self, path: Option<&str>) -> LoadPlan {
        let Some(mut query) = self.query.clone() else {
            return LoadPlan {
                info: None,
                page: None,
                restore: None,
            };
        };
        let target = path.and_then(normalize_folder_path);

        if self.options.keep_pages_history {
            self.history
                .insert(query.path_key().to_string(), self.pages.clone());
        }
        if self.options.page_history_policy == PageHistoryPolicy::Truncate {
            let depth = path_depth(target.as_deref().unwrap_or(""));
            self.history.retain(|key, _| path_depth(key) <= depth);
        }

        query.path = target;
        self.pages = if self.options.keep_pages_history {
            self.history.remove(query.path_key()).unwrap_or_default()
        } else {
            PageHistory::default()
        };
        self.query = Some(query);
        self.selection.clear();

        let page = self.begin_page(self.pages.current_page);
        let restore = self.begin_restore();
        LoadPlan {
            info: None,
            page: Some(page),
            restore,
        }
    }

    /// Fetch the page after the current one, if a marker for it exists.
    pub fn navigate_to_next_page(&mut self) -> Option<PageRequest> {
        if !self.can_go_next() {
            return None;
        }
        self.selection.clear();
        Some(self.begin_page(self.pages.current_page + 1))
    }

    pub fn navigate_to_previous_page(&mut self) -> Option<PageRequest> {
        if !self.can_go_previous() {
            return None;
        }
        self.selection.clear();
        Some(self.begin_page(self.pages.current_page - 1))
    }

    pub fn navigate_to_first_page(&mut self) -> Option<PageRequest> {
        self.query.as_ref()?;
        self.selection.clear();
        Some(self.begin_page(0))
    }

    /// Re-fetch the current page (or the first one) with the known markers.
    pub fn refresh_current_path(&mut self, keep_current_page: bool) -> Option<PageRequest> {
        self.query.as_ref()?;
        let page = if keep_current_page {
            self.pages.current_page
        } else {
            0
        };
        Some(self.begin_page(page))
    }

    /// Re-fetch the storage info (after a policy change or rename).
    pub fn refresh_info(&mut self) -> Option<InfoRequest> {
        let storage_id = self.query.as_ref()?.storage_id;
        Some(InfoRequest {
            ticket: self.info.begin(),
            storage_id,
        })
    }

    /// Re-fetch the restore hierarchy of the current folder.
    pub fn refresh_restore(&mut self) -> Option<RestoreLoad> {
        self.begin_restore()
    }

    fn begin_page(&mut self, page: usize) -> PageRequest {
        let query = self.query.clone().unwrap_or_default();
        let marker = self.pages.markers.get(page).cloned().flatten();
        PageRequest {
            ticket: self.page.begin(),
            storage_id: query.storage_id,
            path: query.path,
            page,
            marker,
            page_size: self.options.page_size,
            show_versions: query.show_versions,
            show_archives: query.show_archives,
        }
    }

    fn begin_restore(&mut self) -> Option<RestoreLoad> {
        let query = self.query.clone()?;
        Some(RestoreLoad {
            ticket: self.restore.begin(),
            storage_id: query.storage_id,
            path: query.path,
        })
    }

    // -------------------------------------------------------------------------
    // Outcomes
    // -------------------------------------------------------------------------

    /// Apply a page outcome. Returns `false` for superseded requests.
    pub fn apply_page(&mut self, request: &PageRequest, result: Result<ListingPage, ApiError>) -> bool {
        let next_marker = result
            .as_ref()
            .ok()
            .map(|page| page.next_page_marker.clone());
        if !self.page.resolve(request.ticket, result) {
            tracing::warn!(page = request.page, "discarding stale listing page");
            return false;
        }

        if let Some(next_marker) = next_marker {
            self.pages.current_page = request.page;
            self.pages.markers.truncate(request.page + 1);
            while self.pages.markers.len() < request.page + 1 {
                self.pages.markers.push(None);
            }
            if let Some(marker) = next_marker {
                self.pages.markers.push(Some(marker));
            }
            let items = self.items().to_vec();
            self.selection
                .retain(|key| items.iter().any(|item| &item.key() == key));
        }
        true
    }

    pub fn apply_info(&mut self, ticket: Ticket, result: Result<StorageInfo, ApiError>) -> bool {
        self.info.resolve(ticket, result)
    }

    pub fn apply_restore(&mut self, ticket: Ticket, result: Result<RestoreInfo, ApiError>) -> bool {
        self.restore.resolve(ticket, result)
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    pub fn toggle_selection(&mut self, key: ItemKey) -> bool {
        self.selection.toggle(key)
    }

    /// Check every selectable entry of the visible page.
    pub fn select_all(&mut self, selectable: impl Fn(&StorageItem) -> bool) {
        let keys: Vec<ItemKey> = self
            .items()
            .iter()
            .filter(|item| selectable(item))
            .map(StorageItem::key)
            .collect();
        for key in keys {
            self.selection.insert(key);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn options(&self) -> ListingOptions {
        self.options
    }

    pub fn query(&self) -> Option<&ListingQuery> {
        self.query.as_ref()
    }

    pub fn storage_id(&self) -> Option<u64> {
        self.query.as_ref().map(|q| q.storage_id)
    }

    pub fn path(&self) -> Option<&str> {
        self.query.as_ref().and_then(|q| q.path.as_deref())
    }

    pub fn page_markers(&self) -> &[Option<String>] {
        &self.pages.markers
    }

    pub fn current_page(&self) -> usize {
        self.pages.current_page
    }

    pub fn can_go_next(&self) -> bool {
        self.query.is_some()
            && matches!(self.pages.markers.get(self.pages.current_page + 1), Some(Some(_)))
    }

    pub fn can_go_previous(&self) -> bool {
        self.query.is_some() && self.pages.current_page > 0
    }

    pub fn items(&self) -> &[StorageItem] {
        self.page
            .value()
            .map(|page| page.results.as_slice())
            .unwrap_or_default()
    }

    pub fn find_item(&self, key: &ItemKey) -> Option<&StorageItem> {
        self.items().iter().find(|item| &item.key() == key)
    }

    pub fn info(&self) -> Option<&StorageInfo> {
        self.info.value()
    }

    pub fn info_error(&self) -> Option<&ApiError> {
        self.info.error()
    }

    pub fn page_error(&self) -> Option<&ApiError> {
        self.page.error()
    }

    pub fn restore_info(&self) -> Option<&RestoreInfo> {
        self.restore.value()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selected_items(&self) -> Vec<&StorageItem> {
        self.selection.resolve(self.items()).collect()
    }

    pub fn phase(&self) -> ListingPhase {
        if self.query.is_none() {
            ListingPhase::Idle
        } else if self.info.pending() {
            ListingPhase::LoadingInfo
        } else if self.info.error().is_some() {
            ListingPhase::InfoFailed
        } else if self.page.pending() {
            ListingPhase::LoadingPage
        } else if self.page.error().is_some() {
            ListingPhase::PageFailed
        } else if self.page.loaded() {
            ListingPhase::Ready
        } else {
            ListingPhase::Idle
        }
    }

    /// Deep link describing the current state.
    pub fn route(&self) -> Option<BrowserRoute> {
        let query = self.query.as_ref()?;
        Some(BrowserRoute {
            storage_id: query.storage_id,
            path: query.path.clone(),
            versions: query.show_versions,
            archives: query.show_archives,
        })
    }
}

fn path_depth(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemType;

    fn page(names: &[&str], next: Option<&str>) -> ListingPage {
        ListingPage {
            results: names
                .iter()
                .map(|n| StorageItem::new(*n, ItemType::File))
                .collect(),
            next_page_marker: next.map(str::to_string),
        }
    }

    fn info(id: u64) -> StorageInfo {
        StorageInfo {
            id,
            ..Default::default()
        }
    }

    /// Store pointed at storage 1 root with info and first page applied.
    fn ready_store(options: ListingOptions, first: ListingPage) -> ListingStore {
        let mut store = ListingStore::new(options);
        let plan = store.initialize(ListingQuery::new(1, None));
        let info_request = plan.info.unwrap();
        assert!(store.apply_info(info_request.ticket, Ok(info(1))));
        assert!(store.apply_page(&plan.page.unwrap(), Ok(first)));
        store
    }

    fn assert_marker_invariant(store: &ListingStore) {
        assert_eq!(store.page_markers()[0], None);
        assert!(store.page_markers().len() <= store.current_page() + 2);
    }

    #[test]
    fn test_single_page_folder() {
        let store = ready_store(ListingOptions::default(), page(&["a", "b", "c"], None));
        assert_eq!(store.page_markers().len(), 1);
        assert_eq!(store.items().len(), 3);
        assert!(!store.can_go_next());
        assert!(!store.can_go_previous());
        assert_eq!(store.phase(), ListingPhase::Ready);
    }

    #[test]
    fn test_next_page_uses_returned_marker() {
        let mut store = ready_store(ListingOptions::default(), page(&["a"], Some("tok1")));
        assert_eq!(store.page_markers(), &[None, Some("tok1".to_string())]);

        let request = store.navigate_to_next_page().unwrap();
        assert_eq!(request.marker.as_deref(), Some("tok1"));
        assert_eq!(request.page, 1);
        assert_eq!(store.phase(), ListingPhase::LoadingPage);

        assert!(store.apply_page(&request, Ok(page(&["b"], None))));
        assert_eq!(store.page_markers(), &[None, Some("tok1".to_string())]);
        assert_eq!(store.current_page(), 1);
        assert!(!store.can_go_next());
        assert!(store.can_go_previous());
    }

    #[test]
    fn test_marker_invariant_over_navigation() {
        let mut store = ready_store(ListingOptions::default(), page(&["a"], Some("t1")));
        let tokens = [Some("t2"), Some("t3"), None];
        for token in tokens {
            let request = store.navigate_to_next_page().unwrap();
            store.apply_page(&request, Ok(page(&["x"], token)));
            assert_marker_invariant(&store);
        }
        assert_eq!(store.current_page(), 3);
        assert!(store.navigate_to_next_page().is_none());

        let request = store.navigate_to_previous_page().unwrap();
        assert_eq!(request.marker.as_deref(), Some("t2"));
        store.apply_page(&request, Ok(page(&["x"], Some("t3"))));
        assert_marker_invariant(&store);
        assert_eq!(store.page_markers().len(), 4);

        let request = store.navigate_to_first_page().unwrap();
        assert_eq!(request.marker, None);
        store.apply_page(&request, Ok(page(&["x"], Some("t1"))));
        assert_eq!(store.page_markers(), &[None, Some("t1".to_string())]);
        assert!(store.navigate_to_previous_page().is_none());
    }

    #[test]
    fn test_stale_page_is_discarded() {
        let mut store = ready_store(ListingOptions::default(), page(&["a"], Some("t1")));
        let slow = store.navigate_to_next_page().unwrap();
        let fast = store.navigate_to_first_page().unwrap();

        assert!(store.apply_page(&fast, Ok(page(&["first"], Some("t1")))));
        assert!(!store.apply_page(&slow, Ok(page(&["second"], None))));
        assert_eq!(store.current_page(), 0);
        assert_eq!(store.items()[0].path, "first");
    }

    #[test]
    fn test_failed_page_keeps_markers() {
        let mut store = ready_store(ListingOptions::default(), page(&["a"], Some("t1")));
        let request = store.navigate_to_next_page().unwrap();
        store.apply_page(&request, Err(ApiError::envelope("boom")));
        assert_eq!(store.phase(), ListingPhase::PageFailed);
        assert_eq!(store.current_page(), 0);
        assert_eq!(store.page_markers().len(), 2);
        assert!(store.items().is_empty());
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let mut store = ready_store(ListingOptions::default(), page(&["a"], Some("t1")));
        let request = store.navigate_to_next_page().unwrap();
        store.apply_page(&request, Ok(page(&["b", "c"], None)));

        let mut snapshots = Vec::new();
        for _ in 0..2 {
            let request = store.refresh_current_path(true).unwrap();
            assert_eq!(request.page, 1);
            assert_eq!(request.marker.as_deref(), Some("t1"));
            store.apply_page(&request, Ok(page(&["b", "c"], None)));
            snapshots.push(store.items().to_vec());
        }
        assert_eq!(snapshots[0], snapshots[1]);

        let request = store.refresh_current_path(false).unwrap();
        assert_eq!(request.page, 0);
        assert_eq!(request.marker, None);
    }

    #[test]
    fn test_storage_switch_resets_everything() {
        let mut store = ready_store(ListingOptions::default(), page(&["a"], Some("t1")));
        store.toggle_selection(ItemKey::new("a", ItemType::File));
        let request = store.navigate_to_next_page().unwrap();
        store.apply_page(&request, Ok(page(&["b"], None)));

        let plan = store.initialize(ListingQuery::new(2, Some("x")));
        assert!(plan.info.is_some());
        assert!(plan.restore.is_some());
        let page_request = plan.page.unwrap();
        assert_eq!(page_request.storage_id, 2);
        assert_eq!(page_request.page, 0);
        assert_eq!(store.page_markers(), &[None]);
        assert!(store.selection().is_empty());
        assert_eq!(store.phase(), ListingPhase::LoadingInfo);
        assert!(store.info().is_none());
    }

    #[test]
    fn test_response_for_previous_storage_is_discarded() {
        let mut store = ready_store(ListingOptions::default(), page(&["a"], None));
        let old = store.refresh_current_path(true).unwrap();
        let plan = store.initialize(ListingQuery::new(2, None));

        assert!(!store.apply_page(&old, Ok(page(&["stale"], None))));
        assert!(store.apply_page(&plan.page.unwrap(), Ok(page(&["fresh"], None))));
        assert_eq!(store.items()[0].path, "fresh");
    }

    #[test]
    fn test_same_query_only_refreshes_page() {
        let mut store = ready_store(ListingOptions::default(), page(&["a"], None));
        let plan = store.initialize(ListingQuery::new(1, None));
        assert!(plan.info.is_none());
        assert!(plan.page.is_some());
        assert!(store.info().is_some());
    }

    #[test]
    fn test_toggle_versions_forgets_markers() {
        let mut store = ready_store(ListingOptions::default(), page(&["a"], Some("t1")));
        let request = store.navigate_to_next_page().unwrap();
        store.apply_page(&request, Ok(page(&["b"], None)));

        let mut query = ListingQuery::new(1, None);
        query.show_versions = true;
        let plan = store.initialize(query);
        let request = plan.page.unwrap();
        assert!(request.show_versions);
        assert_eq!(request.page, 0);
        assert_eq!(store.page_markers(), &[None]);
    }

    fn drill_down(store: &mut ListingStore) {
        // root is on page 1 ...
        let request = store.navigate_to_next_page().unwrap();
        store.apply_page(&request, Ok(page(&["x"], None)));
        // ... open a/b and move to its second page
        let plan = store.navigate_to_path(Some("a"));
        store.apply_page(&plan.page.unwrap(), Ok(page(&["y"], None)));
        let plan = store.navigate_to_path(Some("/a/b/"));
        let request = plan.page.unwrap();
        assert_eq!(request.path.as_deref(), Some("a/b"));
        assert_eq!(request.page, 0);
        store.apply_page(&request, Ok(page(&["z"], Some("b1"))));
        let request = store.navigate_to_next_page().unwrap();
        store.apply_page(&request, Ok(page(&["z2"], None)));
    }

    #[test]
    fn test_truncate_policy_restores_parent_and_forgets_deeper() {
        let mut store = ready_store(ListingOptions::default(), page(&["a"], Some("t1")));
        drill_down(&mut store);

        // back to root: its page is restored
        let plan = store.navigate_to_path(None);
        let request = plan.page.unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.marker.as_deref(), Some("t1"));
        store.apply_page(&request, Ok(page(&["x"], None)));

        // a/b was deeper than root and is forgotten
        let plan = store.navigate_to_path(Some("a/b"));
        assert_eq!(plan.page.unwrap().page, 0);
    }

    #[test]
    fn test_preserve_policy_keeps_deeper_pages() {
        let options = ListingOptions {
            page_history_policy: PageHistoryPolicy::Preserve,
            ..ListingOptions::default()
        };
        let mut store = ready_store(options, page(&["a"], Some("t1")));
        drill_down(&mut store);

        let plan = store.navigate_to_path(None);
        store.apply_page(&plan.page.unwrap(), Ok(page(&["x"], None)));

        let plan = store.navigate_to_path(Some("a/b"));
        let request = plan.page.unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.marker.as_deref(), Some("b1"));
    }

    #[test]
    fn test_without_history_every_folder_starts_fresh() {
        let options = ListingOptions {
            keep_pages_history: false,
            ..ListingOptions::default()
        };
        let mut store = ready_store(options, page(&["a"], Some("t1")));
        let request = store.navigate_to_next_page().unwrap();
        store.apply_page(&request, Ok(page(&["x"], None)));
        store.navigate_to_path(Some("a"));
        let plan = store.navigate_to_path(None);
        assert_eq!(plan.page.unwrap().page, 0);
        assert_eq!(store.page_markers(), &[None]);
    }

    #[test]
    fn test_selection_cleared_on_navigation() {
        let mut store = ready_store(ListingOptions::default(), page(&["a", "b"], Some("t1")));
        store.select_all(|_| true);
        assert_eq!(store.selection().len(), 2);
        assert_eq!(store.selected_items().len(), 2);

        store.navigate_to_next_page();
        assert!(store.selection().is_empty());
    }

    #[test]
    fn test_refresh_prunes_vanished_selection() {
        let mut store = ready_store(ListingOptions::default(), page(&["a", "b"], None));
        store.select_all(|_| true);
        let request = store.refresh_current_path(true).unwrap();
        store.apply_page(&request, Ok(page(&["b"], None)));
        assert_eq!(store.selection().len(), 1);
        assert!(store.selection().contains(&ItemKey::new("b", ItemType::File)));
    }

    #[test]
    fn test_info_failure_phase() {
        let mut store = ListingStore::new(ListingOptions::default());
        let plan = store.initialize(ListingQuery::new(1, None));
        store.apply_info(plan.info.unwrap().ticket, Err(ApiError::http(404, "not found")));
        assert_eq!(store.phase(), ListingPhase::InfoFailed);
        assert_eq!(store.info_error(), Some(&ApiError::http(404, "not found")));
    }

    #[test]
    fn test_reload_after_info_failure() {
        let mut store = ListingStore::new(ListingOptions::default());
        assert!(store.reload().is_empty());

        let plan = store.initialize(ListingQuery::new(1, None));
        store.apply_info(plan.info.unwrap().ticket, Err(ApiError::http(500, "boom")));
        let retry = store.reload();
        assert!(retry.info.is_some());
        assert!(retry.page.is_some());
        assert_eq!(store.phase(), ListingPhase::LoadingInfo);
        assert!(store.apply_info(retry.info.unwrap().ticket, Ok(info(1))));
        assert!(store.info_error().is_none());
    }

    #[test]
    fn test_route_reflects_query() {
        let mut store = ListingStore::new(ListingOptions::default());
        assert!(store.route().is_none());
        let mut query = ListingQuery::new(4, Some("a/b"));
        query.show_archives = true;
        store.initialize(query);
        let route = store.route().unwrap();
        assert_eq!(route.storage_id, 4);
        assert_eq!(route.path.as_deref(), Some("a/b"));
        assert!(route.archives);
    }
}
