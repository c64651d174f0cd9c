//! DOM and Web API utility functions.
//!
//! Provides safe, consistent access to browser APIs with proper error handling.

use js_sys::{Array, Promise};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, File, HtmlAnchorElement, Url, Window};

use crate::core::error::FetchError;

/// Get the browser window object.
#[inline]
pub fn window() -> Option<Window> {
    web_sys::window()
}

// =============================================================================
// Browser Navigation
// =============================================================================

/// Set the URL hash (adds to browser history).
///
/// The hash should include the '#' prefix.
pub fn set_hash(hash: &str) {
    if let Some(window) = window() {
        let _ = window.location().set_hash(hash);
    }
}

/// Page origin, e.g. `https://cloud.example.com`.
pub fn origin() -> String {
    window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default()
}

/// `path` joined to `origin` unless it already is absolute.
pub fn resolve_url(origin: &str, path: &str) -> String {
    if path.contains("://") {
        path.to_string()
    } else {
        format!("{}/{}", origin.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// Open a URL in a new tab.
pub fn open_url(url: &str) {
    if let Some(window) = window() {
        let _ = window.open_with_url_and_target(url, "_blank");
    }
}

// =============================================================================
// Files and Clipboard
// =============================================================================

/// Offer `content` to the user as a downloaded file.
pub fn download_text(file_name: &str, content: &str, mime: &str) -> Result<(), FetchError> {
    let document = window()
        .and_then(|w| w.document())
        .ok_or(FetchError::NoWindow)?;

    let parts = Array::of1(&JsValue::from_str(content));
    let bag = BlobPropertyBag::new();
    bag.set_type(mime);
    let blob = Blob::new_with_str_sequence_and_options(&parts, &bag)
        .map_err(|_| FetchError::RequestCreationFailed)?;
    let url = Url::create_object_url_with_blob(&blob).map_err(|_| FetchError::InvalidContent)?;

    let anchor: HtmlAnchorElement = document
        .create_element("a")
        .map_err(|_| FetchError::RequestCreationFailed)?
        .dyn_into()
        .map_err(|_| FetchError::RequestCreationFailed)?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();

    let _ = Url::revoke_object_url(&url);
    Ok(())
}

/// Read a user-picked file as text.
pub async fn read_file_text(file: &File) -> Result<String, FetchError> {
    let promise: Promise = file.text();
    JsFuture::from(promise)
        .await
        .map_err(|_| FetchError::ResponseReadFailed)?
        .as_string()
        .ok_or(FetchError::InvalidContent)
}

/// Copy text to the clipboard.
pub async fn copy_to_clipboard(text: &str) -> Result<(), FetchError> {
    let clipboard = window().ok_or(FetchError::NoWindow)?.navigator().clipboard();
    JsFuture::from(clipboard.write_text(text))
        .await
        .map(|_| ())
        .map_err(|e| FetchError::NetworkError(e.as_string().unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("https://cloud.example.com", "/restapi"),
            "https://cloud.example.com/restapi"
        );
        assert_eq!(resolve_url("https://a/", "b/c"), "https://a/b/c");
        assert_eq!(resolve_url("https://a", "http://other/x"), "http://other/x");
    }
}
