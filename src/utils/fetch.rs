//! Browser implementations of the endpoint client's transport contract.
//!
//! [`BrowserTransport`] performs requests with `window.fetch`, raced against
//! a timeout. Redirects are not followed: a redirected call is reported to
//! the client so it can start the login flow. [`BrowserAuthFlow`] opens the
//! login page in a new tab and sleeps on browser timers.

use js_sys::{Array, Promise};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobPropertyBag, FormData, Headers, Request, RequestCredentials, RequestInit,
    RequestMode, RequestRedirect, Response, ResponseType,
};

use crate::config::FETCH_TIMEOUT_MS;
use crate::core::api::{AuthFlow, HttpBody, HttpRequest, HttpResponse, HttpTransport};
use crate::core::error::FetchError;

// =============================================================================
// Promise Racing Utilities
// =============================================================================

/// Result of a promise race with timeout.
#[derive(Debug)]
pub enum RaceResult {
    /// The promise completed before timeout.
    Completed(JsValue),
    /// Timeout occurred before promise completed.
    TimedOut,
    /// Promise rejected with an error.
    Error(String),
}

/// Race a promise against a timeout.
///
/// # Returns
/// * `RaceResult::Completed` if promise resolves before timeout
/// * `RaceResult::TimedOut` if timeout occurs first
/// * `RaceResult::Error` if promise rejects
pub async fn race_with_timeout(promise: Promise, timeout_ms: i32) -> RaceResult {
    let Some(window) = web_sys::window() else {
        return RaceResult::Error("Window not available".to_string());
    };

    // Resolves to undefined
    let timeout_promise = Promise::new(&mut |resolve, _| {
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout_ms);
    });

    let race_array = Array::new();
    race_array.push(&promise);
    race_array.push(&timeout_promise);
    let race_promise = Promise::race(&race_array);

    match JsFuture::from(race_promise).await {
        Ok(result) => {
            if result.is_undefined() {
                RaceResult::TimedOut
            } else {
                RaceResult::Completed(result)
            }
        }
        Err(e) => RaceResult::Error(describe_js_error(&e)),
    }
}

/// Message of a rejected promise (`TypeError` objects carry no string value).
fn describe_js_error(error: &JsValue) -> String {
    error
        .as_string()
        .or_else(|| {
            error
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| "Unknown error".to_string())
}

// =============================================================================
// Transport
// =============================================================================

/// `window.fetch` transport with cookies included and manual redirects.
#[derive(Clone, Copy, Debug)]
pub struct BrowserTransport {
    timeout_ms: i32,
}

impl Default for BrowserTransport {
    fn default() -> Self {
        Self {
            timeout_ms: FETCH_TIMEOUT_MS,
        }
    }
}

impl BrowserTransport {
    fn build(&self, request: &HttpRequest) -> Result<Request, FetchError> {
        let opts = RequestInit::new();
        opts.set_method(request.method.as_str());
        opts.set_mode(RequestMode::Cors);
        opts.set_credentials(RequestCredentials::Include);
        opts.set_redirect(RequestRedirect::Manual);

        let headers = Headers::new().map_err(|_| FetchError::RequestCreationFailed)?;
        for (name, value) in &request.headers {
            headers
                .set(name, value)
                .map_err(|_| FetchError::RequestCreationFailed)?;
        }
        opts.set_headers(&headers);

        match &request.body {
            Some(HttpBody::Json(json)) => opts.set_body(&JsValue::from_str(json)),
            Some(HttpBody::File {
                field,
                file_name,
                content,
                content_type,
            }) => {
                let form = file_form(field, file_name, content, content_type)?;
                opts.set_body(&form);
            }
            None => {}
        }

        Request::new_with_str_and_init(&request.url, &opts)
            .map_err(|_| FetchError::RequestCreationFailed)
    }
}

/// Multipart form with a single file field.
fn file_form(
    field: &str,
    file_name: &str,
    content: &str,
    content_type: &str,
) -> Result<FormData, FetchError> {
    let parts = Array::of1(&JsValue::from_str(content));
    let bag = BlobPropertyBag::new();
    bag.set_type(content_type);
    let blob = Blob::new_with_str_sequence_and_options(&parts, &bag)
        .map_err(|_| FetchError::RequestCreationFailed)?;
    let form = FormData::new().map_err(|_| FetchError::RequestCreationFailed)?;
    form.append_with_blob_and_filename(field, &blob, file_name)
        .map_err(|_| FetchError::RequestCreationFailed)?;
    Ok(form)
}

impl HttpTransport for BrowserTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let window = web_sys::window().ok_or(FetchError::NoWindow)?;
        let js_request = self.build(&request)?;

        tracing::debug!(method = %request.method, url = %request.url, "fetch");
        let response: Response =
            match race_with_timeout(window.fetch_with_request(&js_request), self.timeout_ms).await
            {
                RaceResult::Completed(value) => value
                    .dyn_into()
                    .map_err(|_| FetchError::InvalidContent)?,
                RaceResult::TimedOut => {
                    tracing::warn!(url = %request.url, "request timed out");
                    return Err(FetchError::Timeout);
                }
                RaceResult::Error(message) => return Err(FetchError::NetworkError(message)),
            };

        // Manual redirects surface as opaque responses with status 0.
        let redirected =
            response.redirected() || response.type_() == ResponseType::Opaqueredirect;
        if redirected {
            return Ok(HttpResponse {
                status: response.status(),
                redirected: true,
                body: String::new(),
            });
        }

        let text_promise = response.text().map_err(|_| FetchError::ResponseReadFailed)?;
        let body = JsFuture::from(text_promise)
            .await
            .map_err(|_| FetchError::ResponseReadFailed)?
            .as_string()
            .ok_or(FetchError::InvalidContent)?;

        Ok(HttpResponse {
            status: response.status(),
            redirected: false,
            body,
        })
    }
}

// =============================================================================
// Login Flow
// =============================================================================

#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserAuthFlow;

impl AuthFlow for BrowserAuthFlow {
    fn open_window(&self, url: &str) -> Result<(), FetchError> {
        let window = web_sys::window().ok_or(FetchError::NoWindow)?;
        match window.open_with_url_and_target(url, "_blank") {
            Ok(Some(_)) => Ok(()),
            // Blocked popup
            Ok(None) => Err(FetchError::NetworkError(
                "Login window was blocked by the browser".to_string(),
            )),
            Err(e) => Err(FetchError::NetworkError(describe_js_error(&e))),
        }
    }

    async fn sleep(&self, ms: u32) {
        gloo_timers::future::TimeoutFuture::new(ms).await;
    }
}
