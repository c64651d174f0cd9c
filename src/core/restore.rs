//! Life-cycle restore state of archived objects.
//!
//! The server reports the *effective hierarchy* of restore actions for a
//! folder: restores started on an ancestor folder apply to everything below
//! it, restores on individual entries apply to that entry only. The most
//! specific record wins.

use serde::{Deserialize, Serialize};

use crate::models::{ItemType, StorageItem};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestoreStatus {
    Initiated,
    Running,
    Succeeded,
    Cancelled,
    Failed,
}

impl RestoreStatus {
    /// Restore requested and not finished yet.
    pub fn is_in_progress(self) -> bool {
        matches!(self, Self::Initiated | Self::Running)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RestorePathType {
    File,
    Folder,
}

impl From<ItemType> for RestorePathType {
    fn from(value: ItemType) -> Self {
        match value {
            ItemType::File => Self::File,
            ItemType::Folder => Self::Folder,
        }
    }
}

/// One restore action as reported by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRecord {
    pub path: String,
    #[serde(rename = "type")]
    pub path_type: RestorePathType,
    pub status: RestoreStatus,
    #[serde(default)]
    pub restore_versions: bool,
    /// `yyyy-MM-dd HH:mm:ss.SSS` UTC; lexicographic order is time order.
    #[serde(default)]
    pub restored_till: Option<String>,
    #[serde(default)]
    pub days: Option<u32>,
}

impl RestoreRecord {
    fn covers(&self, path: &str) -> bool {
        let own = trim(&self.path);
        let path = trim(path);
        match self.path_type {
            RestorePathType::File => own == path,
            RestorePathType::Folder => {
                own.is_empty() || own == path || path.starts_with(&format!("{own}/"))
            }
        }
    }

    /// Succeeded and not yet expired at `now`.
    pub fn is_active(&self, now: &str) -> bool {
        self.status == RestoreStatus::Succeeded
            && self
                .restored_till
                .as_deref()
                .is_none_or(|till| till > now)
    }
}

fn trim(path: &str) -> &str {
    path.trim_matches('/')
}

fn parent_folder(path: &str) -> &str {
    trim(path).rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

/// Restore records relevant to one listed folder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreInfo {
    /// Nearest folder restore at or above the listed folder.
    pub parent: Option<RestoreRecord>,
    /// Restores of entries directly inside the listed folder.
    pub current: Vec<RestoreRecord>,
}

impl RestoreInfo {
    /// Split an effective hierarchy into parent and current records.
    pub fn from_hierarchy(folder: Option<&str>, records: Vec<RestoreRecord>) -> Self {
        let folder = trim(folder.unwrap_or(""));
        let mut info = Self::default();
        for record in records {
            let own = trim(&record.path);
            let is_ancestor = record.path_type == RestorePathType::Folder && record.covers(folder);
            if is_ancestor {
                let deeper = info
                    .parent
                    .as_ref()
                    .is_none_or(|p| trim(&p.path).len() < own.len());
                if deeper {
                    info.parent = Some(record);
                }
            } else if parent_folder(own) == folder {
                info.current.push(record);
            }
        }
        info
    }

    /// Most specific record applying to `path`.
    pub fn status_for(&self, path: &str) -> Option<&RestoreRecord> {
        self.current
            .iter()
            .find(|r| trim(&r.path) == trim(path))
            .or_else(|| self.parent.as_ref().filter(|p| p.covers(path)))
    }

    /// Whether an archived item is currently readable.
    ///
    /// Non-latest versions additionally need a restore that included
    /// versions.
    pub fn is_restored(&self, item: &StorageItem, latest: bool, now: &str) -> bool {
        self.status_for(&item.path)
            .is_some_and(|r| r.is_active(now) && (latest || r.restore_versions))
    }
}

/// Body of a restore request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    pub datastorage_id: u64,
    pub days: u32,
    pub restore_versions: bool,
    pub restore_mode: RestoreMode,
    pub paths: Vec<RestorePath>,
    pub notification: RestoreNotification,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestoreMode {
    #[default]
    Standard,
    Bulk,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorePath {
    pub path: String,
    #[serde(rename = "type")]
    pub path_type: RestorePathType,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreNotification {
    pub enabled: bool,
    pub recipients: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, path_type: RestorePathType, status: RestoreStatus) -> RestoreRecord {
        RestoreRecord {
            path: path.to_string(),
            path_type,
            status,
            restore_versions: false,
            restored_till: Some("2030-01-01 00:00:00.000".to_string()),
            days: Some(7),
        }
    }

    const NOW: &str = "2025-06-01 12:00:00.000";

    #[test]
    fn test_hierarchy_split() {
        let info = RestoreInfo::from_hierarchy(
            Some("data/raw"),
            vec![
                record("data", RestorePathType::Folder, RestoreStatus::Running),
                record("data/raw/", RestorePathType::Folder, RestoreStatus::Succeeded),
                record("data/raw/a.bin", RestorePathType::File, RestoreStatus::Failed),
                record("other/b.bin", RestorePathType::File, RestoreStatus::Succeeded),
            ],
        );
        assert_eq!(info.parent.as_ref().map(|p| p.path.as_str()), Some("data/raw/"));
        assert_eq!(info.current.len(), 1);
        assert_eq!(info.current[0].path, "data/raw/a.bin");
    }

    #[test]
    fn test_exact_record_wins_over_parent() {
        let info = RestoreInfo::from_hierarchy(
            Some("data"),
            vec![
                record("data", RestorePathType::Folder, RestoreStatus::Succeeded),
                record("data/a.bin", RestorePathType::File, RestoreStatus::Running),
            ],
        );
        assert_eq!(
            info.status_for("data/a.bin").map(|r| r.status),
            Some(RestoreStatus::Running)
        );
        assert_eq!(
            info.status_for("data/b.bin").map(|r| r.status),
            Some(RestoreStatus::Succeeded)
        );
        assert!(info.status_for("elsewhere/c.bin").is_none());
    }

    #[test]
    fn test_is_restored_respects_expiry_and_versions() {
        let mut parent = record("", RestorePathType::Folder, RestoreStatus::Succeeded);
        let info = RestoreInfo {
            parent: Some(parent.clone()),
            current: Vec::new(),
        };
        let item = StorageItem::new("x/y.bin", ItemType::File);
        assert!(info.is_restored(&item, true, NOW));
        assert!(!info.is_restored(&item, false, NOW));

        parent.restored_till = Some("2020-01-01 00:00:00.000".to_string());
        let expired = RestoreInfo {
            parent: Some(parent),
            current: Vec::new(),
        };
        assert!(!expired.is_restored(&item, true, NOW));
    }

    #[test]
    fn test_record_decoding() {
        let json = r#"{"path": "a/b", "type": "FOLDER", "status": "SUCCEEDED",
                       "restoreVersions": true, "restoredTill": "2030-01-01 00:00:00.000"}"#;
        let record: RestoreRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.path_type, RestorePathType::Folder);
        assert!(record.restore_versions);
        assert!(record.is_active(NOW));
    }
}
