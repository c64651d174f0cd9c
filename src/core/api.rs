//! REST endpoint client.
//!
//! [`ApiClient`] turns relative endpoint paths into full URLs, attaches the
//! session bearer token and unwraps the `{status, message, payload}`
//! envelope every endpoint answers with.
//!
//! When a call is redirected (the session expired and the gateway sends the
//! browser to the login page) the client raises
//! `requires_user_authentication`, opens the login page in a new window,
//! polls the health-check endpoint until it stops redirecting and retries
//! the original call exactly once. Status and envelope errors are returned
//! as they are.

use std::cell::{Cell, RefCell};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ApiSettings, AuthSettings};
use crate::core::error::{ApiError, FetchError};

// =============================================================================
// Transport Contract
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body variants understood by the transports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HttpBody {
    Json(String),
    /// Single-file multipart upload.
    File {
        field: String,
        file_name: String,
        content: String,
        content_type: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<HttpBody>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// The request was answered with (or followed) a redirect.
    pub redirected: bool,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            redirected: false,
            body: body.into(),
        }
    }

    pub fn redirect() -> Self {
        Self {
            status: 302,
            redirected: true,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single HTTP exchange.
#[allow(async_fn_in_trait)]
pub trait HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// Interactive login used after a redirected call.
#[allow(async_fn_in_trait)]
pub trait AuthFlow {
    /// Open the login page for the user (new window/tab).
    fn open_window(&self, url: &str) -> Result<(), FetchError>;

    async fn sleep(&self, ms: u32);
}

// =============================================================================
// Envelope
// =============================================================================

const STATUS_OK: &str = "OK";

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    payload: Option<Value>,
}

/// Decode an API envelope, returning the payload on `OK`.
///
/// A missing payload decodes as JSON `null`, so `Option<T>` and `()` targets
/// accept payload-less answers.
pub fn decode_envelope<R: DeserializeOwned>(body: &str) -> Result<R, ApiError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    if envelope.status != STATUS_OK {
        return Err(ApiError::envelope(
            envelope
                .message
                .unwrap_or_else(|| format!("Request failed with status {}", envelope.status)),
        ));
    }
    serde_json::from_value(envelope.payload.unwrap_or(Value::Null))
        .map_err(|e| ApiError::Decode(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    token: String,
}

/// Payload target for calls whose answer carries nothing of interest.
pub type Ignored = serde::de::IgnoredAny;

// =============================================================================
// ApiClient
// =============================================================================

/// Query parameters of a call.
pub type Query<'a> = &'a [(&'a str, String)];

pub struct ApiClient<T, A> {
    settings: ApiSettings,
    auth_settings: AuthSettings,
    transport: T,
    auth: A,
    token: RefCell<Option<String>>,
    requires_user_authentication: Cell<bool>,
}

impl<T: HttpTransport, A: AuthFlow> ApiClient<T, A> {
    pub fn new(settings: ApiSettings, auth_settings: AuthSettings, transport: T, auth: A) -> Self {
        Self {
            settings,
            auth_settings,
            transport,
            auth,
            token: RefCell::new(None),
            requires_user_authentication: Cell::new(false),
        }
    }

    /// Set when the last call was redirected and not yet recovered.
    pub fn requires_user_authentication(&self) -> bool {
        self.requires_user_authentication.get()
    }

    /// Seed or clear the cached bearer token.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.borrow_mut() = token;
    }

    pub fn api_path(&self) -> &str {
        &self.settings.api_path
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build `{api_path}/{path}?{query}` with percent-encoded values.
    pub fn url(&self, path: &str, query: Query<'_>) -> String {
        let base = self.settings.api_path.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let mut url = format!("{base}/{path}");
        let mut separator = if url.contains('?') { '&' } else { '?' };
        for (key, value) in query {
            url.push(separator);
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
            separator = '&';
        }
        url
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str, query: Query<'_>) -> Result<R, ApiError> {
        let body = self.call_raw(Method::Get, path, query, None).await?;
        decode_envelope(&body)
    }

    pub async fn post<R, B>(&self, path: &str, query: Query<'_>, body: &B) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let json = serde_json::to_string(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        let body = self
            .call_raw(Method::Post, path, query, Some(HttpBody::Json(json)))
            .await?;
        decode_envelope(&body)
    }

    pub async fn delete<R, B>(&self, path: &str, query: Query<'_>, body: &B) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let json = serde_json::to_string(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        let body = self
            .call_raw(Method::Delete, path, query, Some(HttpBody::Json(json)))
            .await?;
        decode_envelope(&body)
    }

    /// Upload one file as multipart form data and unwrap the envelope.
    pub async fn upload<R: DeserializeOwned>(
        &self,
        path: &str,
        query: Query<'_>,
        file: HttpBody,
    ) -> Result<R, ApiError> {
        let body = self.call_raw(Method::Post, path, query, Some(file)).await?;
        decode_envelope(&body)
    }

    /// Call an endpoint answering with plain text instead of an envelope.
    pub async fn text(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<HttpBody>,
    ) -> Result<String, ApiError> {
        self.call_raw(method, path, query, body).await
    }

    async fn call_raw(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<HttpBody>,
    ) -> Result<String, ApiError> {
        let url = self.url(path, query);
        match self.send_once(method, &url, body.clone()).await {
            Err(error) if error.is_authentication_required() => {
                tracing::warn!(%method, %url, "call redirected, user authentication required");
                self.requires_user_authentication.set(true);
                if !self.reauthenticate().await {
                    return Err(error);
                }
                self.send_once(method, &url, body).await
            }
            other => other,
        }
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        body: Option<HttpBody>,
    ) -> Result<String, ApiError> {
        let mut request = HttpRequest::new(method, url);
        if let Some(token) = self.token().await? {
            request
                .headers
                .push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        if matches!(body, Some(HttpBody::Json(_))) {
            request
                .headers
                .push(("Content-Type".to_string(), "application/json".to_string()));
        }
        request.body = body;

        tracing::debug!(%method, url, "api call");
        let response = self.transport.send(request).await?;
        check_response(url, response)
    }

    /// Cached bearer token, fetched on first use.
    async fn token(&self) -> Result<Option<String>, ApiError> {
        if let Some(token) = self.token.borrow().clone() {
            return Ok(Some(token));
        }
        let Some(token_path) = self.settings.token_path.as_deref() else {
            return Ok(None);
        };

        let url = self.url(token_path, &[]);
        let response = self
            .transport
            .send(HttpRequest::new(Method::Get, url.clone()))
            .await?;
        let body = check_response(&url, response)?;
        let payload: TokenPayload = decode_envelope(&body)?;
        *self.token.borrow_mut() = Some(payload.token.clone());
        Ok(Some(payload.token))
    }

    /// Open the login window and wait for the session to come back.
    ///
    /// Returns `true` once the health-check endpoint answers without a
    /// redirect, `false` if the window could not be opened or the timeout
    /// elapsed.
    async fn reauthenticate(&self) -> bool {
        if let Err(error) = self.auth.open_window(&self.settings.login_path) {
            tracing::warn!(%error, "failed to open authentication window");
            return false;
        }

        let health_url = self.url(&self.settings.health_check_path, &[]);
        // a zero interval would never reach the timeout
        let interval = self.auth_settings.poll_interval_ms.max(1);
        let mut elapsed = 0;
        while elapsed < self.auth_settings.timeout_ms {
            self.auth.sleep(interval).await;
            elapsed += interval;

            let probe = HttpRequest::new(Method::Get, health_url.clone());
            match self.transport.send(probe).await {
                Ok(response) if !response.redirected && response.is_success() => {
                    tracing::info!(elapsed_ms = elapsed, "user re-authenticated");
                    self.requires_user_authentication.set(false);
                    self.set_token(None);
                    return true;
                }
                Ok(_) => {}
                Err(error) => tracing::debug!(%error, "health check failed"),
            }
        }

        tracing::warn!(
            timeout_ms = self.auth_settings.timeout_ms,
            "authentication window timed out"
        );
        false
    }
}

fn check_response(url: &str, response: HttpResponse) -> Result<String, ApiError> {
    if response.redirected || (300..400).contains(&response.status) {
        return Err(ApiError::AuthenticationRequired {
            url: url.to_string(),
        });
    }
    if !response.is_success() {
        let message = serde_json::from_str::<Envelope>(&response.body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("HTTP error: {}", response.status));
        return Err(ApiError::http(response.status, message));
    }
    Ok(response.body)
}

// =============================================================================
// Test Doubles
// =============================================================================

#[cfg(test)]
pub mod mock {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use super::*;

    /// Transport answering from a queue and recording every request.
    #[derive(Default)]
    pub struct MockTransport {
        pub responses: RefCell<VecDeque<Result<HttpResponse, FetchError>>>,
        pub requests: RefCell<Vec<HttpRequest>>,
    }

    impl MockTransport {
        pub fn with(responses: Vec<Result<HttpResponse, FetchError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                requests: RefCell::new(Vec::new()),
            }
        }

        pub fn urls(&self) -> Vec<String> {
            self.requests.borrow().iter().map(|r| r.url.clone()).collect()
        }
    }

    impl HttpTransport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
            self.requests.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::NetworkError("no scripted response".into())))
        }
    }

    #[derive(Default)]
    pub struct MockAuthFlow {
        pub opened: RefCell<Vec<String>>,
        pub slept_ms: Cell<u32>,
        pub fail_open: bool,
    }

    impl AuthFlow for MockAuthFlow {
        fn open_window(&self, url: &str) -> Result<(), FetchError> {
            if self.fail_open {
                return Err(FetchError::NoWindow);
            }
            self.opened.borrow_mut().push(url.to_string());
            Ok(())
        }

        async fn sleep(&self, ms: u32) {
            self.slept_ms.set(self.slept_ms.get() + ms);
        }
    }

    pub fn ok_envelope(payload: Value) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse::ok(
            serde_json::json!({"status": "OK", "payload": payload}).to_string(),
        ))
    }

    pub fn error_envelope(message: &str) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse::ok(
            serde_json::json!({"status": "ERROR", "message": message}).to_string(),
        ))
    }

    pub fn client(transport: MockTransport) -> ApiClient<MockTransport, MockAuthFlow> {
        let settings = ApiSettings {
            token_path: None,
            ..ApiSettings::default()
        };
        let auth = AuthSettings {
            poll_interval_ms: 100,
            timeout_ms: 500,
        };
        ApiClient::new(settings, auth, transport, MockAuthFlow::default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::mock::*;
    use super::*;

    #[test]
    fn test_url_building() {
        let api = client(MockTransport::default());
        assert_eq!(api.url("datastorage/1/load", &[]), "/restapi/datastorage/1/load");
        assert_eq!(
            api.url(
                "/datastorage/1/list",
                &[("path", "a b/c".into()), ("marker", "t&1".into())]
            ),
            "/restapi/datastorage/1/list?path=a%20b%2Fc&marker=t%261"
        );
    }

    #[test]
    fn test_envelope_decoding() {
        let value: u32 = decode_envelope(r#"{"status":"OK","payload":5}"#).unwrap();
        assert_eq!(value, 5);

        let empty: Option<u32> = decode_envelope(r#"{"status":"OK"}"#).unwrap();
        assert_eq!(empty, None);

        let err = decode_envelope::<u32>(r#"{"status":"ERROR","message":"Name already exists"}"#)
            .unwrap_err();
        assert_eq!(err, ApiError::envelope("Name already exists"));

        assert!(matches!(
            decode_envelope::<u32>("<html>"),
            Err(ApiError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_get_unwraps_payload() {
        let api = client(MockTransport::with(vec![ok_envelope(json!({"token": "x"}))]));
        let payload: TokenPayload = api.get("route/token", &[]).await.unwrap();
        assert_eq!(payload.token, "x");
        assert!(!api.requires_user_authentication());
    }

    #[tokio::test]
    async fn test_http_error_is_not_retried() {
        let api = client(MockTransport::with(vec![Ok(HttpResponse {
            status: 500,
            redirected: false,
            body: r#"{"status":"ERROR","message":"internal"}"#.into(),
        })]));
        let err = api.get::<Value>("x", &[]).await.unwrap_err();
        assert_eq!(err, ApiError::http(500, "internal"));
        assert_eq!(api.transport.requests.borrow().len(), 1);
        assert!(api.auth.opened.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_network_error_is_not_retried() {
        let api = client(MockTransport::with(vec![Err(FetchError::Timeout)]));
        let err = api.get::<Value>("x", &[]).await.unwrap_err();
        assert_eq!(err, ApiError::Network(FetchError::Timeout));
        assert!(api.auth.opened.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_redirect_triggers_reauthentication_and_single_retry() {
        let api = client(MockTransport::with(vec![
            Ok(HttpResponse::redirect()),
            // first health poll still redirects, second succeeds
            Ok(HttpResponse::redirect()),
            Ok(HttpResponse::ok("{}")),
            ok_envelope(json!(42)),
        ]));

        let value: u32 = api.get("datastorage/1/load", &[]).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(api.auth.opened.borrow().as_slice(), ["/restapi/saml/login"]);
        assert_eq!(api.auth.slept_ms.get(), 200);
        assert!(!api.requires_user_authentication());
        assert_eq!(
            api.transport.urls(),
            vec![
                "/restapi/datastorage/1/load",
                "/restapi/app/info",
                "/restapi/app/info",
                "/restapi/datastorage/1/load",
            ]
        );
    }

    #[tokio::test]
    async fn test_reauthentication_timeout_surfaces_original_error() {
        let mut responses = vec![Ok(HttpResponse::redirect())];
        responses.extend((0..5).map(|_| Ok(HttpResponse::redirect())));
        let api = client(MockTransport::with(responses));

        let err = api.get::<Value>("datastorage/1/load", &[]).await.unwrap_err();
        assert!(err.is_authentication_required());
        assert!(api.requires_user_authentication());
        assert_eq!(api.auth.slept_ms.get(), 500);
        // original call + five polls, no retry
        assert_eq!(api.transport.requests.borrow().len(), 6);
    }

    #[tokio::test]
    async fn test_zero_poll_interval_still_times_out() {
        let api = ApiClient::new(
            ApiSettings {
                token_path: None,
                ..ApiSettings::default()
            },
            AuthSettings {
                poll_interval_ms: 0,
                timeout_ms: 3,
            },
            MockTransport::with(vec![Ok(HttpResponse::redirect())]),
            MockAuthFlow::default(),
        );

        let err = api.get::<Value>("x", &[]).await.unwrap_err();
        assert!(err.is_authentication_required());
        assert_eq!(api.auth.slept_ms.get(), 3);
        // original call + three polls answered by the network error fallback
        assert_eq!(api.transport.requests.borrow().len(), 4);
    }

    #[tokio::test]
    async fn test_retry_happens_only_once() {
        let api = client(MockTransport::with(vec![
            Ok(HttpResponse::redirect()),
            Ok(HttpResponse::ok("{}")),
            Ok(HttpResponse::redirect()),
        ]));
        let err = api.get::<Value>("x", &[]).await.unwrap_err();
        assert!(err.is_authentication_required());
        assert_eq!(api.auth.opened.borrow().len(), 1);
        assert_eq!(api.transport.requests.borrow().len(), 3);
    }

    #[tokio::test]
    async fn test_token_is_fetched_once_and_attached() {
        let settings = ApiSettings::default();
        let transport = MockTransport::with(vec![
            ok_envelope(json!({"token": "jwt-1"})),
            ok_envelope(json!(1)),
            ok_envelope(json!(2)),
        ]);
        let api = ApiClient::new(
            settings,
            AuthSettings::default(),
            transport,
            MockAuthFlow::default(),
        );

        let _: u32 = api.get("a", &[]).await.unwrap();
        let _: u32 = api.get("b", &[]).await.unwrap();

        let requests = api.transport.requests.borrow();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].url, "/restapi/route/token");
        assert_eq!(requests[1].header("authorization"), Some("Bearer jwt-1"));
        assert_eq!(requests[2].header("Authorization"), Some("Bearer jwt-1"));
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let api = client(MockTransport::with(vec![ok_envelope(Value::Null)]));
        let _: Ignored = api
            .post("datastorage/1/updateItems", &[], &json!([{"path": "a"}]))
            .await
            .unwrap();
        let requests = api.transport.requests.borrow();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].header("Content-Type"), Some("application/json"));
        assert_eq!(
            requests[0].body,
            Some(HttpBody::Json(r#"[{"path":"a"}]"#.to_string()))
        );
    }
}
