// =============================================================================
// GOOGLE DRIVE / DOCS CLIENT
// =============================================================================
//
// Talks to the two Google endpoints the provisioning workflow needs:
//
// - Drive v3 `files.copy` to duplicate a template document
// - Docs v1 `documents.batchUpdate` with `replaceAllText` requests to fill
//   placeholders in the copy
//
// Both calls authenticate with the user's OAuth access token (see
// `oauth_client.rs`). Nothing is retried: a failed call is reported once
// with the status and body Google returned.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::auth::Credential;
use crate::core::provisioning::{
    DocumentApi, DocumentReference, ProvisionError, Replacement, SubstitutionResult,
};

const DRIVE_API_BASE: &str = "https://www.googleapis.com";
const DOCS_API_BASE: &str = "https://docs.googleapis.com";

// =============================================================================
// REQUEST STRUCTURES
// =============================================================================

#[derive(Debug, Serialize)]
struct CopyFileRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateRequest {
    requests: Vec<DocsRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocsRequest {
    replace_all_text: ReplaceAllTextRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplaceAllTextRequest {
    contains_text: SubstringMatchCriteria,
    replace_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubstringMatchCriteria {
    text: String,
    match_case: bool,
}

impl BatchUpdateRequest {
    /// One case-sensitive `replaceAllText` per replacement, order preserved.
    fn replace_all(replacements: &[Replacement]) -> Self {
        let requests = replacements
            .iter()
            .map(|r| DocsRequest {
                replace_all_text: ReplaceAllTextRequest {
                    contains_text: SubstringMatchCriteria {
                        text: r.marker.clone(),
                        match_case: true,
                    },
                    replace_text: r.value.clone(),
                },
            })
            .collect();

        Self { requests }
    }
}

// =============================================================================
// RESPONSE STRUCTURES
// =============================================================================

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<Reply>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reply {
    replace_all_text: Option<ReplaceAllTextResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplaceAllTextResponse {
    occurrences_changed: Option<u32>,
}

impl BatchUpdateResponse {
    fn occurrences_changed(&self) -> Vec<u32> {
        self.replies
            .iter()
            .map(|reply| {
                reply
                    .replace_all_text
                    .as_ref()
                    .and_then(|r| r.occurrences_changed)
                    .unwrap_or(0)
            })
            .collect()
    }
}

// =============================================================================
// GOOGLE DOCS CLIENT
// =============================================================================

/// Client for copying and editing Google Docs on behalf of the user.
pub struct GoogleDocsClient {
    client: Client,
    drive_base_url: String,
    docs_base_url: String,
}

impl GoogleDocsClient {
    pub fn new() -> Self {
        Self::with_base_urls(DRIVE_API_BASE, DOCS_API_BASE)
    }

    /// Points the client at different API hosts (e.g. a local stub).
    pub fn with_base_urls(drive_base_url: &str, docs_base_url: &str) -> Self {
        Self {
            client: Client::new(),
            drive_base_url: drive_base_url.trim_end_matches('/').to_string(),
            docs_base_url: docs_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn copy_url(&self, document_id: &str) -> String {
        format!("{}/drive/v3/files/{}/copy", self.drive_base_url, document_id)
    }

    fn batch_update_url(&self, document_id: &str) -> String {
        format!(
            "{}/v1/documents/{}:batchUpdate",
            self.docs_base_url, document_id
        )
    }

    async fn error_from(response: reqwest::Response, action: &str) -> ProvisionError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        ProvisionError::RemoteService(format!("{} failed ({}): {}", action, status, text))
    }
}

impl Default for GoogleDocsClient {
    fn default() -> Self {
        Self::new()
    }
}

fn transport_error(e: reqwest::Error) -> ProvisionError {
    ProvisionError::RemoteService(e.to_string())
}

#[async_trait]
impl DocumentApi for GoogleDocsClient {
    async fn clone_document(
        &self,
        credential: &Credential,
        source_document_id: &str,
        new_name: &str,
    ) -> Result<DocumentReference, ProvisionError> {
        tracing::debug!("Copying Google Doc {} as '{}'", source_document_id, new_name);

        let response = self
            .client
            .post(self.copy_url(source_document_id))
            .bearer_auth(&credential.access_token)
            .query(&[("supportsAllDrives", "true"), ("fields", "id,name")])
            .json(&CopyFileRequest { name: new_name })
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "Copying document").await);
        }

        let file: DriveFile = response.json().await.map_err(transport_error)?;

        Ok(DocumentReference {
            name: file.name.unwrap_or_else(|| new_name.to_string()),
            id: file.id,
        })
    }

    async fn substitute_placeholders(
        &self,
        credential: &Credential,
        document_id: &str,
        replacements: &[Replacement],
    ) -> Result<SubstitutionResult, ProvisionError> {
        tracing::debug!(
            "Replacing {} placeholder(s) in Google Doc {}",
            replacements.len(),
            document_id
        );

        let response = self
            .client
            .post(self.batch_update_url(document_id))
            .bearer_auth(&credential.access_token)
            .json(&BatchUpdateRequest::replace_all(replacements))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "Replacing placeholders").await);
        }

        let body: BatchUpdateResponse = response.json().await.map_err(transport_error)?;

        Ok(SubstitutionResult {
            document_id: document_id.to_string(),
            occurrences_changed: body.occurrences_changed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    fn credential() -> Credential {
        Credential {
            access_token: "token".to_string(),
            refresh_token: None,
            token_uri: None,
            client_id: None,
            client_secret: None,
            scopes: Vec::new(),
            expiry: None,
        }
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            == Some("Bearer token")
    }

    async fn copy_file(
        Path(id): Path<String>,
        Query(params): Query<HashMap<String, String>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, String) {
        if !authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, "Missing bearer token".to_string());
        }
        if params.get("supportsAllDrives").map(String::as_str) != Some("true") {
            return (StatusCode::BAD_REQUEST, "supportsAllDrives not set".to_string());
        }
        if id == "missing" {
            return (StatusCode::NOT_FOUND, "File not found: missing".to_string());
        }
        let reply = json!({ "id": "R1", "name": body["name"] });
        (StatusCode::OK, reply.to_string())
    }

    async fn batch_update(
        Path(target): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, String) {
        if !authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, "Missing bearer token".to_string());
        }
        match target.split_once(':') {
            Some(("bad", "batchUpdate")) => {
                (StatusCode::BAD_REQUEST, "Invalid requests[0]".to_string())
            }
            Some((document_id, "batchUpdate")) => {
                let requests = body["requests"].as_array().cloned().unwrap_or_default();
                let replies: Vec<Value> = requests
                    .iter()
                    .enumerate()
                    .map(|(i, _)| json!({ "replaceAllText": { "occurrencesChanged": i } }))
                    .collect();
                let reply = json!({ "documentId": document_id, "replies": replies });
                (StatusCode::OK, reply.to_string())
            }
            _ => (StatusCode::NOT_FOUND, "Unknown method".to_string()),
        }
    }

    /// Serves both APIs from one local port and returns its base URL.
    async fn start_google_stub() -> String {
        let app = Router::new()
            .route("/drive/v3/files/:id/copy", post(copy_file))
            .route("/v1/documents/:target", post(batch_update));

        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        base
    }

    #[test]
    fn batch_contains_one_case_sensitive_request_per_replacement() {
        let replacements = vec![
            Replacement::new("{{title}}", "Engineer"),
            Replacement::new("{{company_name}}", "Acme"),
            Replacement::new("{{date}}", "2024-01-01"),
        ];

        let body = serde_json::to_value(BatchUpdateRequest::replace_all(&replacements)).unwrap();

        assert_eq!(
            body,
            json!({
                "requests": [
                    { "replaceAllText": {
                        "containsText": { "text": "{{title}}", "matchCase": true },
                        "replaceText": "Engineer" } },
                    { "replaceAllText": {
                        "containsText": { "text": "{{company_name}}", "matchCase": true },
                        "replaceText": "Acme" } },
                    { "replaceAllText": {
                        "containsText": { "text": "{{date}}", "matchCase": true },
                        "replaceText": "2024-01-01" } }
                ]
            })
        );
    }

    #[test]
    fn occurrence_counts_default_to_zero() {
        let response: BatchUpdateResponse = serde_json::from_value(json!({
            "documentId": "R1",
            "replies": [
                { "replaceAllText": { "occurrencesChanged": 2 } },
                { "replaceAllText": {} },
                {}
            ]
        }))
        .unwrap();

        assert_eq!(response.occurrences_changed(), vec![2, 0, 0]);
    }

    #[test]
    fn endpoints_are_built_from_base_urls() {
        let client = GoogleDocsClient::with_base_urls("http://drive.local/", "http://docs.local");
        assert_eq!(
            client.copy_url("tmpl"),
            "http://drive.local/drive/v3/files/tmpl/copy"
        );
        assert_eq!(
            client.batch_update_url("R1"),
            "http://docs.local/v1/documents/R1:batchUpdate"
        );
    }

    #[test]
    fn copy_response_only_needs_an_id() {
        let file: DriveFile = serde_json::from_value(json!({ "id": "abc" })).unwrap();
        assert_eq!(file.id, "abc");
        assert!(file.name.is_none());
    }

    #[tokio::test]
    async fn clone_returns_the_new_document() {
        let base = start_google_stub().await;
        let client = GoogleDocsClient::with_base_urls(&base, &base);

        let copy = client
            .clone_document(&credential(), "tmpl", "Resume - Acme - Engineer")
            .await
            .unwrap();

        assert_eq!(copy.id, "R1");
        assert_eq!(copy.name, "Resume - Acme - Engineer");
    }

    #[tokio::test]
    async fn rejected_clone_reports_status_and_body() {
        let base = start_google_stub().await;
        let client = GoogleDocsClient::with_base_urls(&base, &base);

        let err = client
            .clone_document(&credential(), "missing", "Resume - Acme - Engineer")
            .await
            .unwrap_err();

        match err {
            ProvisionError::RemoteService(message) => {
                assert!(message.contains("404"), "{}", message);
                assert!(message.contains("File not found"), "{}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn substitution_returns_counts_per_replacement() {
        let base = start_google_stub().await;
        let client = GoogleDocsClient::with_base_urls(&base, &base);
        let replacements = vec![
            Replacement::new("{{title}}", "Engineer"),
            Replacement::new("{{company_name}}", "Acme"),
            Replacement::new("{{date}}", "2024-01-01"),
        ];

        let result = client
            .substitute_placeholders(&credential(), "R1", &replacements)
            .await
            .unwrap();

        assert_eq!(result.document_id, "R1");
        assert_eq!(result.occurrences_changed, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn rejected_batch_is_a_single_error() {
        let base = start_google_stub().await;
        let client = GoogleDocsClient::with_base_urls(&base, &base);

        let err = client
            .substitute_placeholders(&credential(), "bad", &[Replacement::new("{{title}}", "x")])
            .await
            .unwrap_err();

        match err {
            ProvisionError::RemoteService(message) => {
                assert!(message.contains("400"), "{}", message);
                assert!(message.contains("Invalid requests[0]"), "{}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn wrong_token_is_rejected_by_the_api() {
        let base = start_google_stub().await;
        let client = GoogleDocsClient::with_base_urls(&base, &base);
        let mut stale = credential();
        stale.access_token = "expired".to_string();

        let err = client
            .clone_document(&stale, "tmpl", "Resume - Acme - Engineer")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("401"));
    }
}
