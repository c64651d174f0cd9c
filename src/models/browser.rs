//! View state of the storage browser: selection and dialogs.

use std::collections::BTreeSet;

use crate::models::{ItemType, StorageItem};

// =============================================================================
// Selection
// =============================================================================

/// Identifies an entry of the visible page by name and kind.
///
/// A folder and a file may share a name in object storages, so the kind is
/// part of the key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub name: String,
    pub item_type: ItemType,
}

impl ItemKey {
    pub fn new(name: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            name: name.into(),
            item_type,
        }
    }
}

/// Checked entries of the visible page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSet {
    keys: BTreeSet<ItemKey>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the checked state of one entry. Returns the new state.
    pub fn toggle(&mut self, key: ItemKey) -> bool {
        if self.keys.remove(&key) {
            false
        } else {
            self.keys.insert(key);
            true
        }
    }

    pub fn insert(&mut self, key: ItemKey) {
        self.keys.insert(key);
    }

    pub fn contains(&self, key: &ItemKey) -> bool {
        self.keys.contains(key)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn retain(&mut self, keep: impl FnMut(&ItemKey) -> bool) {
        self.keys.retain(keep);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemKey> {
        self.keys.iter()
    }

    /// Entries of `items` that are currently checked.
    pub fn resolve<'a>(&'a self, items: &'a [StorageItem]) -> impl Iterator<Item = &'a StorageItem> {
        items.iter().filter(|item| self.contains(&item.key()))
    }
}

// =============================================================================
// Dialogs
// =============================================================================

/// The one modal dialog currently open in the browser, if any.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum BrowserDialog {
    #[default]
    None,
    CreateFolder,
    CreateFile,
    Rename {
        item: ItemKey,
    },
    EditTags {
        path: String,
        version: Option<String>,
    },
    DeleteConfirmation {
        items: Vec<ItemKey>,
        totally: bool,
    },
    ConvertToVersioned,
    DownloadUrls {
        urls: Vec<String>,
    },
    LifecycleRestore {
        paths: Vec<String>,
    },
}

impl BrowserDialog {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Dialog plus the outcome of its last submission.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DialogState {
    pub dialog: BrowserDialog,
    /// Submission in flight.
    pub busy: bool,
    /// Error of the last failed submission, shown inside the dialog.
    pub error: Option<String>,
}

impl DialogState {
    pub fn open(&mut self, dialog: BrowserDialog) {
        self.dialog = dialog;
        self.busy = false;
        self.error = None;
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }
}
