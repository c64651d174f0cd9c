//! Client-side form rules.
//!
//! Checks run before a request is issued; a failure blocks submission and is
//! shown next to the field.

use crate::core::error::ValidationError;
use crate::models::{ItemTags, StorageItem};

const RESERVED_NAMES: &[&str] = &[".", ".."];
const FORBIDDEN_CHARACTERS: &[char] = &['/', '\\'];

/// Validate a new file or folder name inside the current folder.
///
/// `siblings` are the entries of the visible page; `current` is the name
/// being replaced when renaming.
pub fn validate_item_name(
    name: &str,
    siblings: &[StorageItem],
    current: Option<&str>,
) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.trim() != name {
        return Err(ValidationError::SurroundingWhitespace);
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARACTERS.contains(c)) {
        return Err(ValidationError::ForbiddenCharacter(c));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(ValidationError::ReservedName(name.to_string()));
    }
    let taken = siblings
        .iter()
        .any(|item| item.name == name && Some(item.name.as_str()) != current);
    if taken {
        return Err(ValidationError::NameAlreadyExists(name.to_string()));
    }
    Ok(())
}

/// Parse a positive number of days (token duration, restore duration).
pub fn parse_days(input: &str) -> Result<u32, ValidationError> {
    match input.trim().parse::<u32>() {
        Ok(days) if days > 0 => Ok(days),
        _ => Err(ValidationError::InvalidDuration),
    }
}

/// Join a folder and a child name into an object path.
pub fn child_path(folder: Option<&str>, name: &str) -> String {
    match folder.map(|f| f.trim_matches('/')).filter(|f| !f.is_empty()) {
        Some(folder) => format!("{folder}/{name}"),
        None => name.to_string(),
    }
}

/// Build object tags from editor rows; blank rows are skipped.
pub fn tags_from_rows(rows: &[(String, String)]) -> Result<ItemTags, ValidationError> {
    let mut tags = ItemTags::new();
    for (key, value) in rows {
        let key = key.trim();
        if key.is_empty() {
            if value.trim().is_empty() {
                continue;
            }
            return Err(ValidationError::EmptyTagKey);
        }
        if tags.insert(key.to_string(), value.clone()).is_some() {
            return Err(ValidationError::DuplicateTagKey(key.to_string()));
        }
    }
    Ok(tags)
}
