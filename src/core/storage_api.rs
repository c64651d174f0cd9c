//! Data storage endpoints.
//!
//! [`StorageApi`] is the seam between the browser session and the REST
//! server. [`ApiClient`] implements it over HTTP; tests implement it in
//! memory.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::core::api::{ApiClient, AuthFlow, HttpTransport, Ignored};
use crate::core::error::ApiError;
use crate::core::listing::PageRequest;
use crate::core::restore::{RestoreRecord, RestoreRequest};
use crate::models::{
    DownloadUrl, FileContent, ItemTags, ItemType, ListingPage, StorageInfo, StoragePolicy,
};

// =============================================================================
// Payloads
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UpdateAction {
    Create,
    Move,
}

/// One entry of an `updateItems` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItem {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub action: UpdateAction,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
}

impl UpdateItem {
    pub fn create(item_type: ItemType, path: impl Into<String>) -> Self {
        Self {
            item_type,
            action: UpdateAction::Create,
            path: path.into(),
            old_path: None,
            contents: (item_type == ItemType::File).then(String::new),
        }
    }

    pub fn rename(item_type: ItemType, old_path: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            item_type,
            action: UpdateAction::Move,
            path: path.into(),
            old_path: Some(old_path.into()),
            contents: None,
        }
    }
}

/// One entry of a delete call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteItem {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BulkUrlRequest<'a> {
    paths: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PolicyUpdate<'a> {
    id: u64,
    storage_policy: &'a StoragePolicy,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentPayload {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    may_be_binary: bool,
}

impl ContentPayload {
    fn decode(self) -> Result<FileContent, ApiError> {
        let bytes = match self.content {
            Some(encoded) => STANDARD
                .decode(encoded.trim())
                .map_err(|e| ApiError::Decode(format!("file content: {e}")))?,
            None => Vec::new(),
        };
        Ok(FileContent {
            bytes,
            truncated: self.truncated,
            may_be_binary: self.may_be_binary,
        })
    }
}

// =============================================================================
// Contract
// =============================================================================

#[allow(async_fn_in_trait)]
pub trait StorageApi {
    async fn storage_info(&self, storage_id: u64) -> Result<StorageInfo, ApiError>;

    async fn list_page(&self, request: &PageRequest) -> Result<ListingPage, ApiError>;

    async fn update_items(&self, storage_id: u64, items: &[UpdateItem]) -> Result<(), ApiError>;

    async fn delete_items(
        &self,
        storage_id: u64,
        items: &[DeleteItem],
        totally: bool,
    ) -> Result<(), ApiError>;

    /// Make `version` the latest version of `path`.
    async fn restore_version(
        &self,
        storage_id: u64,
        path: &str,
        version: &str,
    ) -> Result<(), ApiError>;

    async fn download_url(
        &self,
        storage_id: u64,
        path: &str,
        version: Option<&str>,
    ) -> Result<DownloadUrl, ApiError>;

    async fn download_urls(
        &self,
        storage_id: u64,
        paths: &[String],
    ) -> Result<Vec<DownloadUrl>, ApiError>;

    async fn tags(
        &self,
        storage_id: u64,
        path: &str,
        version: Option<&str>,
    ) -> Result<ItemTags, ApiError>;

    /// Replace every tag of the object.
    async fn update_tags(
        &self,
        storage_id: u64,
        path: &str,
        version: Option<&str>,
        tags: &ItemTags,
    ) -> Result<ItemTags, ApiError>;

    async fn content(
        &self,
        storage_id: u64,
        path: &str,
        version: Option<&str>,
    ) -> Result<FileContent, ApiError>;

    async fn update_policy(
        &self,
        storage_id: u64,
        policy: &StoragePolicy,
    ) -> Result<StorageInfo, ApiError>;

    /// Effective restore records for the folder `path` (root when `None`).
    async fn restore_hierarchy(
        &self,
        storage_id: u64,
        path: Option<&str>,
    ) -> Result<Vec<RestoreRecord>, ApiError>;

    async fn request_restore(&self, request: &RestoreRequest)
    -> Result<Vec<RestoreRecord>, ApiError>;
}

fn object_query(path: &str, version: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![("path", path.to_string())];
    if let Some(version) = version {
        query.push(("version", version.to_string()));
    }
    query
}

impl<T: HttpTransport, A: AuthFlow> StorageApi for ApiClient<T, A> {
    async fn storage_info(&self, storage_id: u64) -> Result<StorageInfo, ApiError> {
        self.get(&format!("datastorage/{storage_id}/load"), &[]).await
    }

    async fn list_page(&self, request: &PageRequest) -> Result<ListingPage, ApiError> {
        let mut query = vec![
            ("showVersion", request.show_versions.to_string()),
            ("showArchived", request.show_archives.to_string()),
            ("pageSize", request.page_size.to_string()),
        ];
        if let Some(path) = &request.path {
            query.push(("path", path.clone()));
        }
        if let Some(marker) = &request.marker {
            query.push(("marker", marker.clone()));
        }
        let page: Option<ListingPage> = self
            .get(&format!("datastorage/{}/list", request.storage_id), &query)
            .await?;
        Ok(page.unwrap_or_default())
    }

    async fn update_items(&self, storage_id: u64, items: &[UpdateItem]) -> Result<(), ApiError> {
        tracing::info!(storage_id, count = items.len(), "updating items");
        let _: Ignored = self
            .post(&format!("datastorage/{storage_id}/updateItems"), &[], items)
            .await?;
        Ok(())
    }

    async fn delete_items(
        &self,
        storage_id: u64,
        items: &[DeleteItem],
        totally: bool,
    ) -> Result<(), ApiError> {
        tracing::info!(storage_id, count = items.len(), totally, "deleting items");
        let _: Ignored = self
            .delete(
                &format!("datastorage/{storage_id}/list"),
                &[("totally", totally.to_string())],
                items,
            )
            .await?;
        Ok(())
    }

    async fn restore_version(
        &self,
        storage_id: u64,
        path: &str,
        version: &str,
    ) -> Result<(), ApiError> {
        let query = object_query(path, Some(version));
        let _: Ignored = self
            .post(&format!("datastorage/{storage_id}/list/restore"), &query, &())
            .await?;
        Ok(())
    }

    async fn download_url(
        &self,
        storage_id: u64,
        path: &str,
        version: Option<&str>,
    ) -> Result<DownloadUrl, ApiError> {
        let query = object_query(path, version);
        self.get(&format!("datastorage/{storage_id}/generateUrl"), &query)
            .await
    }

    async fn download_urls(
        &self,
        storage_id: u64,
        paths: &[String],
    ) -> Result<Vec<DownloadUrl>, ApiError> {
        self.post(
            &format!("datastorage/{storage_id}/generateUrl"),
            &[],
            &BulkUrlRequest { paths },
        )
        .await
    }

    async fn tags(
        &self,
        storage_id: u64,
        path: &str,
        version: Option<&str>,
    ) -> Result<ItemTags, ApiError> {
        let query = object_query(path, version);
        let tags: Option<ItemTags> = self
            .get(&format!("datastorage/{storage_id}/tags"), &query)
            .await?;
        Ok(tags.unwrap_or_default())
    }

    async fn update_tags(
        &self,
        storage_id: u64,
        path: &str,
        version: Option<&str>,
        tags: &ItemTags,
    ) -> Result<ItemTags, ApiError> {
        let mut query = object_query(path, version);
        query.push(("rewrite", "true".to_string()));
        let tags: Option<ItemTags> = self
            .post(&format!("datastorage/{storage_id}/tags"), &query, tags)
            .await?;
        Ok(tags.unwrap_or_default())
    }

    async fn content(
        &self,
        storage_id: u64,
        path: &str,
        version: Option<&str>,
    ) -> Result<FileContent, ApiError> {
        let query = object_query(path, version);
        let payload: ContentPayload = self
            .get(&format!("datastorage/{storage_id}/content"), &query)
            .await?;
        payload.decode()
    }

    async fn update_policy(
        &self,
        storage_id: u64,
        policy: &StoragePolicy,
    ) -> Result<StorageInfo, ApiError> {
        tracing::info!(storage_id, versioning = policy.versioning_enabled, "updating storage policy");
        self.post(
            "datastorage/policy",
            &[],
            &PolicyUpdate {
                id: storage_id,
                storage_policy: policy,
            },
        )
        .await
    }

    async fn restore_hierarchy(
        &self,
        storage_id: u64,
        path: Option<&str>,
    ) -> Result<Vec<RestoreRecord>, ApiError> {
        let folder = format!("/{}", path.unwrap_or(""));
        let query = [
            ("datastorageId", storage_id.to_string()),
            ("path", folder),
            ("pathType", "FOLDER".to_string()),
            ("recursive", "false".to_string()),
        ];
        let records: Option<Vec<RestoreRecord>> = self
            .get("datastorage/lifecycle/restore/effectiveHierarchy", &query)
            .await?;
        Ok(records.unwrap_or_default())
    }

    async fn request_restore(
        &self,
        request: &RestoreRequest,
    ) -> Result<Vec<RestoreRecord>, ApiError> {
        tracing::info!(
            storage_id = request.datastorage_id,
            paths = request.paths.len(),
            days = request.days,
            "requesting life-cycle restore"
        );
        let records: Option<Vec<RestoreRecord>> = self
            .post(
                &format!("datastorage/{}/lifecycle/restore", request.datastorage_id),
                &[],
                request,
            )
            .await?;
        Ok(records.unwrap_or_default())
    }
}
