//! Entity caches for storage objects.
//!
//! Tags, file previews and download URLs are memoized per
//! `(storage id, path, version)`. Each key maps to one shared
//! [`RemoteRequest`] cell, so every view asking for the same object observes
//! the same load. Entries live until explicitly invalidated by the operation
//! that changed the remote object, or until the configured
//! [`EvictionPolicy`] drops them.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::channel::oneshot;

use crate::core::error::ApiError;
use crate::core::request::{RemoteRequest, run_tracked};
use crate::models::{DownloadUrl, FileContent, ItemTags};

// =============================================================================
// Keys
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub storage_id: u64,
    pub path: String,
    pub version: Option<String>,
}

impl CacheKey {
    pub fn new(storage_id: u64, path: impl Into<String>, version: Option<&str>) -> Self {
        Self {
            storage_id,
            path: path.into(),
            version: version.map(str::to_string),
        }
    }
}

/// `{id}-{path}` or `{id}-{path}-{version}`.
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}-{}-{}", self.storage_id, self.path, version),
            None => write!(f, "{}-{}", self.storage_id, self.path),
        }
    }
}

// =============================================================================
// Eviction
// =============================================================================

/// Decides which entries to drop as the cache grows.
pub trait EvictionPolicy {
    /// A key was read.
    fn touch(&mut self, key: &CacheKey);

    /// A key was inserted; returns the keys to evict.
    fn admit(&mut self, key: &CacheKey) -> Vec<CacheKey>;

    /// A key was removed by invalidation.
    fn forget(&mut self, key: &CacheKey);
}

/// Keep everything until invalidated.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbounded;

impl EvictionPolicy for Unbounded {
    fn touch(&mut self, _key: &CacheKey) {}

    fn admit(&mut self, _key: &CacheKey) -> Vec<CacheKey> {
        Vec::new()
    }

    fn forget(&mut self, _key: &CacheKey) {}
}

/// Least-recently-used eviction bounded by entry count.
#[derive(Clone, Debug)]
pub struct Lru {
    capacity: usize,
    order: VecDeque<CacheKey>,
}

impl Lru {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
        }
    }
}

impl EvictionPolicy for Lru {
    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn admit(&mut self, key: &CacheKey) -> Vec<CacheKey> {
        self.order.push_back(key.clone());
        let mut evicted = Vec::new();
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                evicted.push(oldest);
            }
        }
        evicted
    }

    fn forget(&mut self, key: &CacheKey) {
        self.order.retain(|k| k != key);
    }
}

// =============================================================================
// EntityCache
// =============================================================================

/// Shared request cell handed out by a cache.
pub type CachedRequest<V> = Rc<RefCell<RemoteRequest<V, ApiError>>>;

/// A load in progress and the callers waiting for its result.
struct InFlight<V> {
    cell: CachedRequest<V>,
    waiters: Vec<oneshot::Sender<Result<V, ApiError>>>,
}

struct Entries<V, P> {
    map: HashMap<CacheKey, CachedRequest<V>>,
    policy: P,
    in_flight: HashMap<CacheKey, InFlight<V>>,
}

/// What a caller of [`EntityCache::load`] does next.
enum Slot<V> {
    Ready(V),
    Wait(oneshot::Receiver<Result<V, ApiError>>),
    Load(CachedRequest<V>),
}

/// Memoized request cells keyed by [`CacheKey`].
pub struct EntityCache<V, P = Unbounded> {
    entries: RefCell<Entries<V, P>>,
}

impl<V> Default for EntityCache<V, Unbounded> {
    fn default() -> Self {
        Self::with_policy(Unbounded)
    }
}

impl<V, P: EvictionPolicy> EntityCache<V, P> {
    pub fn with_policy(policy: P) -> Self {
        Self {
            entries: RefCell::new(Entries {
                map: HashMap::new(),
                policy,
                in_flight: HashMap::new(),
            }),
        }
    }

    /// Cell for `key`, created empty if absent.
    pub fn get(&self, storage_id: u64, path: &str, version: Option<&str>) -> CachedRequest<V> {
        self.get_key(CacheKey::new(storage_id, path, version))
    }

    pub fn get_key(&self, key: CacheKey) -> CachedRequest<V> {
        let mut entries = self.entries.borrow_mut();
        if let Some(cell) = entries.map.get(&key).cloned() {
            entries.policy.touch(&key);
            return cell;
        }

        let cell: CachedRequest<V> = Rc::new(RefCell::new(RemoteRequest::new()));
        let evicted = entries.policy.admit(&key);
        entries.map.insert(key, cell.clone());
        for old in evicted {
            tracing::debug!(key = %old, "evicting cache entry");
            entries.map.remove(&old);
        }
        cell
    }

    /// Drop the entry for exactly this key.
    pub fn invalidate(&self, storage_id: u64, path: &str, version: Option<&str>) {
        let key = CacheKey::new(storage_id, path, version);
        let mut entries = self.entries.borrow_mut();
        if entries.map.remove(&key).is_some() {
            entries.policy.forget(&key);
            tracing::debug!(%key, "cache entry invalidated");
        }
    }

    /// Drop every version of `path` and everything below it.
    pub fn invalidate_path(&self, storage_id: u64, path: &str) {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut entries = self.entries.borrow_mut();
        let stale: Vec<CacheKey> = entries
            .map
            .keys()
            .filter(|k| k.storage_id == storage_id && (k.path == path || k.path.starts_with(&prefix)))
            .cloned()
            .collect();
        for key in stale {
            entries.map.remove(&key);
            entries.policy.forget(&key);
        }
    }

    /// Drop everything cached for a storage.
    pub fn invalidate_storage(&self, storage_id: u64) {
        let mut entries = self.entries.borrow_mut();
        let stale: Vec<CacheKey> = entries
            .map
            .keys()
            .filter(|k| k.storage_id == storage_id)
            .cloned()
            .collect();
        for key in stale {
            entries.map.remove(&key);
            entries.policy.forget(&key);
        }
    }

    /// Remove the in-flight record of `cell`, returning its waiters.
    ///
    /// `None` when the record belongs to a newer load of the same key.
    fn settle(
        &self,
        key: &CacheKey,
        cell: &CachedRequest<V>,
    ) -> Option<Vec<oneshot::Sender<Result<V, ApiError>>>> {
        let mut entries = self.entries.borrow_mut();
        match entries.in_flight.get(key) {
            Some(flight) if Rc::ptr_eq(&flight.cell, cell) => {
                entries.in_flight.remove(key).map(|flight| flight.waiters)
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone, P: EvictionPolicy> EntityCache<V, P> {
    /// Cached value for `key`, loading it with `load` when absent.
    ///
    /// Concurrent callers for the same key share one load: the first one
    /// runs `load`, the others wait for its result. A waiter whose loader was
    /// dropped before finishing starts over. A load invalidated while
    /// pending still hands its result to its own callers but leaves the
    /// replacement entry alone.
    pub async fn load<F, Fut>(&self, key: CacheKey, load: F) -> Result<V, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>>,
    {
        let cell = loop {
            match self.claim(&key) {
                Slot::Ready(value) => return Ok(value),
                Slot::Wait(receiver) => match receiver.await {
                    Ok(result) => return result,
                    Err(oneshot::Canceled) => continue,
                },
                Slot::Load(cell) => break cell,
            }
        };

        let mut guard = LoadGuard {
            cache: self,
            key: &key,
            cell: &cell,
            settled: false,
        };
        let tracked = run_tracked(&cell, load()).await;
        guard.settled = true;

        if !tracked.applied {
            tracing::debug!(%key, "cache load superseded");
        }
        for waiter in self.settle(&key, &cell).unwrap_or_default() {
            let _ = waiter.send(tracked.result.clone());
        }
        tracked.result
    }

    fn claim(&self, key: &CacheKey) -> Slot<V> {
        let cell = self.get_key(key.clone());
        if let Some(value) = cell.borrow().value().cloned() {
            return Slot::Ready(value);
        }

        let mut entries = self.entries.borrow_mut();
        if cell.borrow().pending()
            && let Some(flight) = entries.in_flight.get_mut(key)
            && Rc::ptr_eq(&flight.cell, &cell)
        {
            let (sender, receiver) = oneshot::channel();
            flight.waiters.push(sender);
            return Slot::Wait(receiver);
        }
        entries.in_flight.insert(
            key.clone(),
            InFlight {
                cell: cell.clone(),
                waiters: Vec::new(),
            },
        );
        Slot::Load(cell)
    }
}

/// Releases the in-flight record when a load is dropped before finishing,
/// so its waiters retry instead of hanging on a cell that stays pending.
struct LoadGuard<'a, V, P: EvictionPolicy> {
    cache: &'a EntityCache<V, P>,
    key: &'a CacheKey,
    cell: &'a CachedRequest<V>,
    settled: bool,
}

impl<V, P: EvictionPolicy> Drop for LoadGuard<'_, V, P> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if self.cache.settle(self.key, self.cell).is_some() && self.cell.borrow().pending() {
            self.cell.borrow_mut().reset();
        }
    }
}

// =============================================================================
// DataStorageCache
// =============================================================================

/// The caches shared by every storage view.
///
/// Constructed once by the application and handed to views through the
/// context; nothing here is a global.
pub struct DataStorageCache {
    pub tags: EntityCache<ItemTags, Box<dyn EvictionPolicy>>,
    pub content: EntityCache<FileContent, Box<dyn EvictionPolicy>>,
    pub download_url: EntityCache<DownloadUrl, Box<dyn EvictionPolicy>>,
}

impl EvictionPolicy for Box<dyn EvictionPolicy> {
    fn touch(&mut self, key: &CacheKey) {
        (**self).touch(key)
    }

    fn admit(&mut self, key: &CacheKey) -> Vec<CacheKey> {
        (**self).admit(key)
    }

    fn forget(&mut self, key: &CacheKey) {
        (**self).forget(key)
    }
}

impl Default for DataStorageCache {
    fn default() -> Self {
        Self::new(|| Box::new(Unbounded))
    }
}

impl DataStorageCache {
    /// Build the caches, each with its own policy instance from `policy`.
    pub fn new(policy: impl Fn() -> Box<dyn EvictionPolicy>) -> Self {
        Self {
            tags: EntityCache::with_policy(policy()),
            content: EntityCache::with_policy(policy()),
            download_url: EntityCache::with_policy(policy()),
        }
    }

    /// Bounded variant for long sessions.
    pub fn bounded(capacity: usize) -> Self {
        Self::new(move || Box::new(Lru::new(capacity)))
    }

    /// Forget an object after it was renamed, deleted or rewritten.
    pub fn invalidate_object(&self, storage_id: u64, path: &str) {
        self.tags.invalidate_path(storage_id, path);
        self.content.invalidate_path(storage_id, path);
        self.download_url.invalidate_path(storage_id, path);
    }

    pub fn invalidate_storage(&self, storage_id: u64) {
        self.tags.invalidate_storage(storage_id);
        self.content.invalidate_storage(storage_id);
        self.download_url.invalidate_storage(storage_id);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_key_composition() {
        assert_eq!(CacheKey::new(1, "a/b.txt", None).to_string(), "1-a/b.txt");
        assert_eq!(
            CacheKey::new(1, "a/b.txt", Some("v2")).to_string(),
            "1-a/b.txt-v2"
        );
    }

    #[test]
    fn test_same_key_returns_same_instance() {
        let cache: EntityCache<u32> = EntityCache::default();
        let first = cache.get(1, "a.txt", None);
        let second = cache.get(1, "a.txt", None);
        assert!(Rc::ptr_eq(&first, &second));

        let versioned = cache.get(1, "a.txt", Some("v1"));
        assert!(!Rc::ptr_eq(&first, &versioned));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_invalidate_then_get_returns_new_instance() {
        let cache: EntityCache<u32> = EntityCache::default();
        let first = cache.get(1, "a.txt", None);
        cache.invalidate(1, "a.txt", None);
        let second = cache.get(1, "a.txt", None);
        assert!(!Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_invalidate_path_covers_versions_and_children() {
        let cache: EntityCache<u32> = EntityCache::default();
        cache.get(1, "dir", None);
        cache.get(1, "dir/a.txt", Some("v1"));
        cache.get(1, "dir2/a.txt", None);
        cache.get(2, "dir/a.txt", None);

        cache.invalidate_path(1, "dir");
        assert_eq!(cache.len(), 2);
        cache.invalidate_storage(2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_evicts_least_recently_used() {
        let cache: EntityCache<u32, Lru> = EntityCache::with_policy(Lru::new(2));
        let a = cache.get(1, "a", None);
        cache.get(1, "b", None);
        // touch a, so b becomes the oldest
        assert!(Rc::ptr_eq(&a, &cache.get(1, "a", None)));
        cache.get(1, "c", None);

        assert_eq!(cache.len(), 2);
        assert!(Rc::ptr_eq(&a, &cache.get(1, "a", None)));
    }

    #[tokio::test]
    async fn test_load_is_memoized() {
        let cache: EntityCache<u32> = EntityCache::default();
        let calls = Cell::new(0);
        let key = CacheKey::new(1, "a", None);

        for _ in 0..2 {
            let value = cache
                .load(key.clone(), || async {
                    calls.set(calls.get() + 1);
                    Ok(9)
                })
                .await
                .unwrap();
            assert_eq!(value, 9);
        }
        assert_eq!(calls.get(), 1);

        cache.invalidate(1, "a", None);
        cache.load(key, || async { Ok(10) }).await.unwrap();
        assert_eq!(cache.get(1, "a", None).borrow().value(), Some(&10));
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_request() {
        let cache: EntityCache<u32> = EntityCache::default();
        let calls = Cell::new(0);
        let key = CacheKey::new(1, "a", None);
        let load = || async {
            calls.set(calls.get() + 1);
            tokio::task::yield_now().await;
            Ok(7)
        };

        let (first, second) = futures::join!(
            cache.load(key.clone(), load),
            cache.load(key.clone(), load)
        );
        assert_eq!(first, Ok(7));
        assert_eq!(second, Ok(7));
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.get(1, "a", None).borrow().value(), Some(&7));
    }

    #[tokio::test]
    async fn test_dropped_load_releases_entry() {
        use futures::FutureExt;

        let cache: EntityCache<u32> = EntityCache::default();
        let key = CacheKey::new(1, "a", None);

        // Start a load and drop it while it is pending.
        let pending = cache
            .load(key.clone(), || futures::future::pending::<Result<u32, ApiError>>())
            .now_or_never();
        assert!(pending.is_none());
        assert!(!cache.get(1, "a", None).borrow().pending());

        assert_eq!(cache.load(key, || async { Ok(4) }).await, Ok(4));
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let cache: EntityCache<u32> = EntityCache::default();
        let key = CacheKey::new(1, "a", None);
        let err = cache
            .load(key.clone(), || async { Err(ApiError::envelope("nope")) })
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::envelope("nope"));
        assert_eq!(cache.load(key, || async { Ok(1) }).await.unwrap(), 1);
    }

    #[test]
    fn test_data_storage_cache_invalidate_object() {
        let cache = DataStorageCache::bounded(8);
        let tags = cache.tags.get(1, "a.txt", None);
        cache.download_url.get(1, "a.txt", Some("v1"));
        cache.invalidate_object(1, "a.txt");
        assert!(cache.download_url.is_empty());
        assert!(!Rc::ptr_eq(&tags, &cache.tags.get(1, "a.txt", None)));
    }
}
