//! Data storage types as exchanged with the REST API.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// Item Type
// =============================================================================

/// Kind of a listing entry.
///
/// The API spells it `"File"`/`"Folder"` but older endpoints send lowercase;
/// the variant is resolved once when a response is decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemType {
    Folder,
    File,
}

impl ItemType {
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("folder") {
            Some(Self::Folder)
        } else if value.eq_ignore_ascii_case("file") {
            Some(Self::File)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Folder => "Folder",
            Self::File => "File",
        }
    }

    pub fn is_folder(self) -> bool {
        self == Self::Folder
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ItemType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ItemType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown item type '{raw}'")))
    }
}

// =============================================================================
// Storage Item
// =============================================================================

/// Label carrying the object's storage class.
pub const STORAGE_CLASS_LABEL: &str = "StorageClass";

/// Storage classes that are not readable without a restore.
const ARCHIVE_STORAGE_CLASSES: &[&str] = &["GLACIER", "DEEP_ARCHIVE"];

/// A file or folder entry of one listing page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageItem {
    /// Display name (last path segment).
    #[serde(default)]
    pub name: String,
    /// Full path inside the storage, without leading slash.
    pub path: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default)]
    pub size: Option<u64>,
    /// Server timestamp, `yyyy-MM-dd HH:mm:ss.SSS` in UTC.
    #[serde(default)]
    pub changed: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub delete_marker: bool,
    /// Previous versions (versioned storages with `showVersion`).
    #[serde(default)]
    pub versions: Vec<StorageItem>,
}

impl StorageItem {
    pub fn new(path: impl Into<String>, item_type: ItemType) -> Self {
        let path = path.into();
        let name = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            name,
            path,
            item_type,
            size: None,
            changed: None,
            labels: BTreeMap::new(),
            version: None,
            delete_marker: false,
            versions: Vec::new(),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.item_type.is_folder()
    }

    pub fn storage_class(&self) -> Option<&str> {
        self.labels.get(STORAGE_CLASS_LABEL).map(String::as_str)
    }

    /// Whether the object sits in an archive tier.
    pub fn is_archived(&self) -> bool {
        self.storage_class()
            .is_some_and(|class| ARCHIVE_STORAGE_CLASSES.contains(&class))
    }

    /// Composite key used by the selection set.
    pub fn key(&self) -> crate::models::ItemKey {
        crate::models::ItemKey::new(&self.name, self.item_type)
    }
}

/// One page of a storage listing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    #[serde(default)]
    pub results: Vec<StorageItem>,
    /// Continuation token for the following page.
    #[serde(default)]
    pub next_page_marker: Option<String>,
}

// =============================================================================
// Storage Info
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StorageType {
    #[default]
    S3,
    Az,
    Gs,
    Nfs,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MountStatus {
    #[default]
    Active,
    ReadOnly,
    MountDisabled,
}

/// Versioning and retention settings of a storage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePolicy {
    #[serde(default)]
    pub versioning_enabled: bool,
    #[serde(default)]
    pub backup_duration: Option<u32>,
    #[serde(default)]
    pub short_term_storage_duration: Option<u32>,
    #[serde(default)]
    pub long_term_storage_duration: Option<u32>,
}

/// Metadata of a storage (bucket or file share).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default)]
    pub storage_type: StorageType,
    #[serde(default)]
    pub storage_policy: StoragePolicy,
    #[serde(default)]
    pub region_id: Option<u64>,
    /// Effective permission mask of the current user.
    #[serde(default)]
    pub mask: u32,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub mount_status: MountStatus,
    #[serde(default)]
    pub locked: bool,
}

impl StorageInfo {
    pub fn is_versioned(&self) -> bool {
        self.storage_policy.versioning_enabled
    }

    pub fn is_file_share(&self) -> bool {
        self.storage_type == StorageType::Nfs
    }

    /// Object storages can be switched to versioned mode; file shares cannot.
    pub fn can_convert_to_versioned(&self) -> bool {
        !self.is_file_share() && !self.is_versioned()
    }
}

// =============================================================================
// Content & URLs
// =============================================================================

/// Pre-signed download link for one object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUrl {
    pub url: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
}

/// Decoded preview of a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileContent {
    pub bytes: Vec<u8>,
    /// Server returned only the first chunk of the file.
    pub truncated: bool,
    pub may_be_binary: bool,
}

impl FileContent {
    /// Lossy UTF-8 text, `None` for binary content.
    pub fn text(&self) -> Option<String> {
        (!self.may_be_binary).then(|| String::from_utf8_lossy(&self.bytes).into_owned())
    }
}

/// Object tags (string key/value metadata).
pub type ItemTags = BTreeMap<String, String>;
