//! User, credential and users import/export endpoints.

use crate::core::api::{ApiClient, AuthFlow, HttpBody, HttpTransport, Method};
use crate::core::error::ApiError;
use crate::models::{
    AccessToken, CurrentUser, ExportOptions, GitCredentials, ImportEvent, ImportOptions,
};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;
const CSV_CONTENT_TYPE: &str = "text/csv";

#[allow(async_fn_in_trait)]
pub trait UsersApi {
    async fn current_user(&self) -> Result<CurrentUser, ApiError>;

    /// Issue an API access token valid for `days`.
    async fn access_token(&self, days: u32) -> Result<AccessToken, ApiError>;

    async fn git_credentials(&self, days: u32) -> Result<GitCredentials, ApiError>;

    /// Users as CSV text.
    async fn export_users(&self, options: &ExportOptions) -> Result<String, ApiError>;

    async fn import_users(
        &self,
        file_name: &str,
        csv: String,
        options: &ImportOptions,
    ) -> Result<Vec<ImportEvent>, ApiError>;
}

impl<T: HttpTransport, A: AuthFlow> UsersApi for ApiClient<T, A> {
    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.get("whoami", &[]).await
    }

    async fn access_token(&self, days: u32) -> Result<AccessToken, ApiError> {
        let seconds = u64::from(days) * SECONDS_PER_DAY;
        tracing::info!(days, "issuing access token");
        self.get("user/token", &[("expiration", seconds.to_string())])
            .await
    }

    async fn git_credentials(&self, days: u32) -> Result<GitCredentials, ApiError> {
        self.get("pipeline/git/credentials", &[("duration", days.to_string())])
            .await
    }

    async fn export_users(&self, options: &ExportOptions) -> Result<String, ApiError> {
        let json = serde_json::to_string(options).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.text(Method::Post, "users/export", &[], Some(HttpBody::Json(json)))
            .await
    }

    async fn import_users(
        &self,
        file_name: &str,
        csv: String,
        options: &ImportOptions,
    ) -> Result<Vec<ImportEvent>, ApiError> {
        tracing::info!(file_name, bytes = csv.len(), "importing users");
        let query = [
            ("createUser", options.create_user.to_string()),
            ("createGroup", options.create_group.to_string()),
            ("createMetadata", options.create_metadata.to_string()),
        ];
        let file = HttpBody::File {
            field: "file".to_string(),
            file_name: file_name.to_string(),
            content: csv,
            content_type: CSV_CONTENT_TYPE.to_string(),
        };
        let events: Option<Vec<ImportEvent>> = self.upload("users/import", &query, file).await?;
        Ok(events.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::api::HttpResponse;
    use crate::core::api::mock::*;

    #[tokio::test]
    async fn test_access_token_expiration_in_seconds() {
        let api = client(MockTransport::with(vec![ok_envelope(json!({
            "token": "jwt", "expiration": "2030-01-01 00:00:00"
        }))]));
        let token = api.access_token(2).await.unwrap();
        assert_eq!(token.token, "jwt");
        assert_eq!(
            api.transport().urls()[0],
            "/restapi/user/token?expiration=172800"
        );
    }

    #[tokio::test]
    async fn test_export_returns_raw_text() {
        let api = client(MockTransport::with(vec![Ok(HttpResponse::ok(
            "username,groups\nalice,ops\n",
        ))]));
        let csv = api.export_users(&ExportOptions::default()).await.unwrap();
        assert!(csv.starts_with("username,groups"));

        let requests = api.transport().requests.borrow();
        assert_eq!(requests[0].method, Method::Post);
        let Some(HttpBody::Json(body)) = &requests[0].body else {
            panic!("expected json body");
        };
        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(body["includeHeader"], json!(true));
    }

    #[tokio::test]
    async fn test_import_uploads_file() {
        let api = client(MockTransport::with(vec![ok_envelope(json!([
            {"status": "CREATED", "message": "User alice created"}
        ]))]));
        let options = ImportOptions {
            create_user: true,
            ..Default::default()
        };
        let events = api
            .import_users("users.csv", "username,groups\nalice,\n".to_string(), &options)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, "CREATED");

        let requests = api.transport().requests.borrow();
        assert_eq!(
            requests[0].url,
            "/restapi/users/import?createUser=true&createGroup=false&createMetadata=false"
        );
        assert!(matches!(
            &requests[0].body,
            Some(HttpBody::File { file_name, .. }) if file_name == "users.csv"
        ));
        assert_eq!(requests[0].header("Content-Type"), None);
    }
}
