//! Values derived from the listing state.
//!
//! Everything here is a pure function of the store contents, the current
//! user and configuration, so views recompute it on every tick and tests
//! exercise it without a browser.

use crate::config::ArchiveGatePolicy;
use crate::core::listing::ListingStore;
use crate::core::restore::{RestoreInfo, RestoreStatus};
use crate::models::{CurrentUser, MountStatus, ROLE_STORAGE_MANAGER, StorageInfo, StorageItem};

/// Permission mask bits reported by the server.
pub const MASK_READ: u32 = 1;
pub const MASK_WRITE: u32 = 1 << 2;

// =============================================================================
// Roles
// =============================================================================

/// Decides storage-level access for a user.
pub trait RoleEvaluator {
    fn is_owner(&self, info: &StorageInfo, user: Option<&CurrentUser>) -> bool;
    fn read_allowed(&self, info: &StorageInfo, user: Option<&CurrentUser>) -> bool;
    fn write_allowed(&self, info: &StorageInfo, user: Option<&CurrentUser>) -> bool;
}

/// Owner name, admin/storage-manager role, then permission mask.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaskRoleEvaluator;

impl MaskRoleEvaluator {
    fn privileged(&self, info: &StorageInfo, user: Option<&CurrentUser>) -> bool {
        user.is_some_and(|u| u.is_admin() || u.has_role(ROLE_STORAGE_MANAGER))
            || self.is_owner(info, user)
    }
}

impl RoleEvaluator for MaskRoleEvaluator {
    fn is_owner(&self, info: &StorageInfo, user: Option<&CurrentUser>) -> bool {
        user.is_some_and(|u| !info.owner.is_empty() && u.user_name.eq_ignore_ascii_case(&info.owner))
    }

    fn read_allowed(&self, info: &StorageInfo, user: Option<&CurrentUser>) -> bool {
        if info.is_file_share() && info.mount_status == MountStatus::MountDisabled {
            return false;
        }
        self.privileged(info, user) || info.mask & MASK_READ != 0
    }

    fn write_allowed(&self, info: &StorageInfo, user: Option<&CurrentUser>) -> bool {
        if info.locked || info.mount_status != MountStatus::Active {
            return false;
        }
        self.privileged(info, user) || info.mask & MASK_WRITE != 0
    }
}

// =============================================================================
// Storage access
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Access {
    pub read: bool,
    pub write: bool,
    pub owner: bool,
}

/// Access to the listed storage; nothing is allowed until its info loaded.
pub fn access(
    listing: &ListingStore,
    user: Option<&CurrentUser>,
    roles: &impl RoleEvaluator,
) -> Access {
    listing
        .info()
        .map(|info| Access {
            read: roles.read_allowed(info, user),
            write: roles.write_allowed(info, user),
            owner: roles.is_owner(info, user),
        })
        .unwrap_or_default()
}

// =============================================================================
// Item capabilities
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ItemCapabilities {
    pub downloadable: bool,
    pub editable: bool,
    pub deletable: bool,
    pub selectable: bool,
    /// Archived and not restored; shown with a badge.
    pub archived: bool,
}

/// Inputs shared by every row of one page.
#[derive(Clone, Copy, Debug)]
pub struct CapabilityContext<'a> {
    pub access: Access,
    pub gate: ArchiveGatePolicy,
    pub restore: Option<&'a RestoreInfo>,
    /// `yyyy-MM-dd HH:mm:ss.SSS`, compared against restore expiry.
    pub now: &'a str,
}

impl CapabilityContext<'_> {
    fn archive_blocked(&self, item: &StorageItem, latest: bool) -> bool {
        if !item.is_archived() {
            return false;
        }
        let restored = self
            .restore
            .is_some_and(|info| info.is_restored(item, latest, self.now));
        !restored
    }
}

/// Capabilities of one row. `latest` is false for rows of older versions.
pub fn item_capabilities(
    item: &StorageItem,
    latest: bool,
    ctx: &CapabilityContext<'_>,
) -> ItemCapabilities {
    let archived = ctx.archive_blocked(item, latest);
    let gated = archived && ctx.gate == ArchiveGatePolicy::RequireRestore;
    let live = !item.delete_marker;

    let downloadable = ctx.access.read && live && !item.is_folder() && !gated;
    let editable = ctx.access.write && live && latest && !gated;
    let deletable = ctx.access.write;
    ItemCapabilities {
        downloadable,
        editable,
        deletable,
        selectable: downloadable || deletable,
        archived,
    }
}

// =============================================================================
// Page-level selectors
// =============================================================================

pub fn can_go_next(listing: &ListingStore) -> bool {
    listing.can_go_next()
}

pub fn can_go_previous(listing: &ListingStore) -> bool {
    listing.can_go_previous()
}

fn all_selected(
    listing: &ListingStore,
    ctx: &CapabilityContext<'_>,
    check: impl Fn(&ItemCapabilities) -> bool,
) -> bool {
    let selected = listing.selected_items();
    !selected.is_empty()
        && selected
            .iter()
            .all(|item| check(&item_capabilities(item, true, ctx)))
}

/// Every selected item can be downloaded.
pub fn bulk_download_enabled(listing: &ListingStore, ctx: &CapabilityContext<'_>) -> bool {
    all_selected(listing, ctx, |caps| caps.downloadable)
}

/// Every selected item can be deleted.
pub fn bulk_delete_enabled(listing: &ListingStore, ctx: &CapabilityContext<'_>) -> bool {
    all_selected(listing, ctx, |caps| caps.deletable)
}

/// Life-cycle restore is offered for archived selections of object storages.
pub fn bulk_restore_enabled(listing: &ListingStore, ctx: &CapabilityContext<'_>) -> bool {
    let object_storage = listing.info().is_some_and(|info| !info.is_file_share());
    object_storage && ctx.access.write && all_selected(listing, ctx, |caps| caps.archived)
}

// =============================================================================
// Table rows
// =============================================================================

/// One rendered row of the browser table.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemRow {
    pub item: StorageItem,
    /// False for older versions listed below their object.
    pub latest: bool,
    pub selected: bool,
    pub capabilities: ItemCapabilities,
    /// Restore applying to the row, if any.
    pub restore: Option<RestoreStatus>,
}

/// Rows of the visible page; older versions follow their object when the
/// listing shows versions.
pub fn table_rows(listing: &ListingStore, ctx: &CapabilityContext<'_>) -> Vec<ItemRow> {
    let show_versions = listing.query().is_some_and(|q| q.show_versions);
    let restore_of = |item: &StorageItem| {
        ctx.restore
            .and_then(|info| info.status_for(&item.path))
            .map(|record| record.status)
    };

    let mut rows = Vec::with_capacity(listing.items().len());
    for item in listing.items() {
        rows.push(ItemRow {
            item: item.clone(),
            latest: true,
            selected: listing.selection().contains(&item.key()),
            capabilities: item_capabilities(item, true, ctx),
            restore: restore_of(item),
        });
        if !show_versions {
            continue;
        }
        for version in item.versions.iter().filter(|v| v.version != item.version) {
            rows.push(ItemRow {
                item: version.clone(),
                latest: false,
                selected: false,
                capabilities: item_capabilities(version, false, ctx),
                restore: restore_of(version),
            });
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::listing::{ListingOptions, ListingQuery};
    use crate::core::restore::{RestorePathType, RestoreRecord, RestoreStatus};
    use crate::models::{ItemKey, ItemType, ListingPage, Role, ROLE_ADMIN, StorageType};
    use std::collections::BTreeMap;

    const NOW: &str = "2025-06-01 12:00:00.000";

    fn archived(path: &str) -> StorageItem {
        let mut item = StorageItem::new(path, ItemType::File);
        item.labels = BTreeMap::from([("StorageClass".to_string(), "GLACIER".to_string())]);
        item
    }

    fn listing_with(items: Vec<StorageItem>, info: StorageInfo) -> ListingStore {
        let mut store = ListingStore::new(ListingOptions::default());
        let plan = store.initialize(ListingQuery::new(info.id, None));
        store.apply_info(plan.info.unwrap().ticket, Ok(info));
        store.apply_page(
            &plan.page.unwrap(),
            Ok(ListingPage {
                results: items,
                next_page_marker: None,
            }),
        );
        store
    }

    fn full_access() -> Access {
        Access {
            read: true,
            write: true,
            owner: false,
        }
    }

    fn ctx(access: Access) -> CapabilityContext<'static> {
        CapabilityContext {
            access,
            gate: ArchiveGatePolicy::RequireRestore,
            restore: None,
            now: NOW,
        }
    }

    fn user(name: &str, roles: &[&str]) -> CurrentUser {
        CurrentUser {
            user_name: name.to_string(),
            roles: roles
                .iter()
                .map(|r| Role {
                    name: r.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_mask_evaluation() {
        let evaluator = MaskRoleEvaluator;
        let info = StorageInfo {
            mask: MASK_READ,
            owner: "OWNER".to_string(),
            ..Default::default()
        };
        let stranger = user("someone", &[]);
        assert!(evaluator.read_allowed(&info, Some(&stranger)));
        assert!(!evaluator.write_allowed(&info, Some(&stranger)));
        assert!(!evaluator.is_owner(&info, Some(&stranger)));

        let owner = user("owner", &[]);
        assert!(evaluator.is_owner(&info, Some(&owner)));
        assert!(evaluator.write_allowed(&info, Some(&owner)));

        let admin = user("root", &[ROLE_ADMIN]);
        assert!(evaluator.write_allowed(&info, Some(&admin)));
        assert!(!evaluator.read_allowed(&StorageInfo::default(), None));
    }

    #[test]
    fn test_read_only_mount_denies_write() {
        let evaluator = MaskRoleEvaluator;
        let info = StorageInfo {
            storage_type: StorageType::Nfs,
            mask: MASK_READ | MASK_WRITE,
            mount_status: MountStatus::ReadOnly,
            ..Default::default()
        };
        assert!(evaluator.read_allowed(&info, None));
        assert!(!evaluator.write_allowed(&info, None));

        let disabled = StorageInfo {
            mount_status: MountStatus::MountDisabled,
            ..info
        };
        assert!(!evaluator.read_allowed(&disabled, None));
    }

    #[test]
    fn test_access_requires_loaded_info() {
        let store = ListingStore::new(ListingOptions::default());
        assert_eq!(access(&store, None, &MaskRoleEvaluator), Access::default());

        let store = listing_with(
            Vec::new(),
            StorageInfo {
                id: 3,
                mask: MASK_READ | MASK_WRITE,
                ..Default::default()
            },
        );
        let access = access(&store, None, &MaskRoleEvaluator);
        assert!(access.read && access.write && !access.owner);
    }

    #[test]
    fn test_archive_gate_policies() {
        let item = archived("cold.bin");
        let strict = ctx(full_access());
        let caps = item_capabilities(&item, true, &strict);
        assert!(caps.archived);
        assert!(!caps.downloadable);
        assert!(!caps.editable);
        assert!(caps.deletable);

        let relaxed = CapabilityContext {
            gate: ArchiveGatePolicy::LabelOnly,
            ..strict
        };
        let caps = item_capabilities(&item, true, &relaxed);
        assert!(caps.archived);
        assert!(caps.downloadable);
    }

    #[test]
    fn test_restored_archive_is_downloadable() {
        let restore = RestoreInfo {
            parent: None,
            current: vec![RestoreRecord {
                path: "cold.bin".to_string(),
                path_type: RestorePathType::File,
                status: RestoreStatus::Succeeded,
                restore_versions: false,
                restored_till: Some("2030-01-01 00:00:00.000".to_string()),
                days: Some(3),
            }],
        };
        let context = CapabilityContext {
            restore: Some(&restore),
            ..ctx(full_access())
        };
        let item = archived("cold.bin");
        assert!(item_capabilities(&item, true, &context).downloadable);
        assert!(!item_capabilities(&item, false, &context).downloadable);
    }

    #[test]
    fn test_folders_and_delete_markers() {
        let context = ctx(full_access());
        let folder = StorageItem::new("dir/", ItemType::Folder);
        let caps = item_capabilities(&folder, true, &context);
        assert!(!caps.downloadable);
        assert!(caps.editable);

        let mut marker = StorageItem::new("gone.txt", ItemType::File);
        marker.delete_marker = true;
        let caps = item_capabilities(&marker, true, &context);
        assert!(!caps.downloadable && !caps.editable);
        assert!(caps.selectable);
    }

    #[test]
    fn test_bulk_download_disabled_when_one_item_is_not_downloadable() {
        let info = StorageInfo {
            id: 1,
            mask: MASK_READ | MASK_WRITE,
            ..Default::default()
        };
        let mut store = listing_with(
            vec![StorageItem::new("a.txt", ItemType::File), archived("b.bin")],
            info,
        );
        let context = ctx(full_access());

        store.toggle_selection(ItemKey::new("a.txt", ItemType::File));
        assert!(bulk_download_enabled(&store, &context));

        store.toggle_selection(ItemKey::new("b.bin", ItemType::File));
        assert!(!bulk_download_enabled(&store, &context));
        assert!(bulk_delete_enabled(&store, &context));
        assert!(!bulk_restore_enabled(&store, &context));

        store.clear_selection();
        assert!(!bulk_download_enabled(&store, &context));
        assert!(!bulk_delete_enabled(&store, &context));
    }

    #[test]
    fn test_bulk_restore_needs_archived_selection() {
        let info = StorageInfo {
            id: 1,
            mask: MASK_READ | MASK_WRITE,
            ..Default::default()
        };
        let mut store = listing_with(vec![archived("x.bin"), archived("y.bin")], info);
        store.select_all(|_| true);
        assert!(bulk_restore_enabled(&store, &ctx(full_access())));
        assert!(!can_go_next(&store));
        assert!(!can_go_previous(&store));
    }

    #[test]
    fn test_table_rows_include_older_versions() {
        let info = StorageInfo {
            id: 1,
            mask: MASK_READ | MASK_WRITE,
            ..Default::default()
        };
        let mut latest = StorageItem::new("log.txt", ItemType::File);
        latest.version = Some("v2".to_string());
        let mut older = latest.clone();
        older.version = Some("v1".to_string());
        latest.versions = vec![latest.clone(), older];

        let mut store = ListingStore::new(ListingOptions::default());
        let mut query = ListingQuery::new(info.id, None);
        query.show_versions = true;
        let plan = store.initialize(query);
        store.apply_info(plan.info.unwrap().ticket, Ok(info));
        store.apply_page(
            &plan.page.unwrap(),
            Ok(ListingPage {
                results: vec![latest],
                next_page_marker: None,
            }),
        );
        store.toggle_selection(ItemKey::new("log.txt", ItemType::File));

        let rows = table_rows(&store, &ctx(full_access()));
        assert_eq!(rows.len(), 2);
        assert!(rows[0].latest && rows[0].selected);
        assert_eq!(rows[1].item.version.as_deref(), Some("v1"));
        assert!(!rows[1].latest && !rows[1].selected);
        assert!(!rows[1].capabilities.editable);
        assert!(rows[1].capabilities.downloadable);
    }
}
