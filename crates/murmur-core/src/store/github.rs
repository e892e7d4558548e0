//! GitHub contents API document store.

use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};

use super::{Document, DocumentStore, StoreError, VersionToken, WriteOutcome};
use crate::util::{compact_text, is_http_url, normalize_text_option};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Connection settings for a repository-backed store.
#[derive(Clone, PartialEq, Eq)]
pub struct GitHubConfig {
    /// API root, e.g. `https://api.github.com`.
    pub api_url: String,
    /// `owner/name`.
    pub repo: String,
    pub branch: String,
    pub token: String,
    pub timeout: Duration,
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("GitHubConfig")
            .field("api_url", &self.api_url)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Clone)]
pub struct GitHubStore {
    api_url: String,
    repo: String,
    branch: String,
    token: String,
    client: reqwest::Client,
}

impl fmt::Debug for GitHubStore {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("GitHubStore")
            .field("api_url", &self.api_url)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .finish_non_exhaustive()
    }
}

impl GitHubStore {
    pub fn new(config: GitHubConfig) -> Result<Self, StoreError> {
        let api_url = normalize_text_option(Some(config.api_url))
            .filter(|url| is_http_url(url))
            .ok_or_else(|| {
                StoreError::InvalidPayload("API URL must include http:// or https://".to_string())
            })?;
        let repo = config.repo.trim().trim_matches('/').to_string();
        if repo.split('/').filter(|part| !part.is_empty()).count() != 2 {
            return Err(StoreError::InvalidPayload(format!(
                "repository must look like owner/name, got '{repo}'"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("murmur/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            repo,
            branch: config.branch.trim().to_string(),
            token: config.token.trim().to_string(),
            client,
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_url,
            self.repo,
            encode_path(path)
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }
}

impl DocumentStore for GitHubStore {
    async fn read(&self, path: &str) -> Result<Document, StoreError> {
        let url = self.contents_url(path);
        tracing::debug!("GET {} (ref {})", url, self.branch);

        let response = self
            .request(reqwest::Method::GET, &url)
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_read_response(status, &body)
    }

    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
    ) -> Result<WriteOutcome, StoreError> {
        let url = self.contents_url(path);
        let payload = PutContentsRequest {
            message,
            content: BASE64_STANDARD.encode(bytes),
            branch: &self.branch,
            sha: expected.map(VersionToken::as_str),
        };
        tracing::debug!(
            "PUT {} (branch {}, expected {:?})",
            url,
            self.branch,
            expected
        );

        let response = self
            .request(reqwest::Method::PUT, &url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_write_response(status, &body)
    }
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: PutContentsEntry,
}

#[derive(Debug, Deserialize)]
struct PutContentsEntry {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: Option<String>,
}

fn parse_read_response(status: StatusCode, body: &str) -> Result<Document, StoreError> {
    if status == StatusCode::NOT_FOUND {
        return Ok(Document::missing());
    }
    if !status.is_success() {
        return Err(api_error(status, body));
    }

    let payload = serde_json::from_str::<ContentsResponse>(body)
        .map_err(|error| StoreError::InvalidPayload(format!("contents response: {error}")))?;

    if let Some(encoding) = payload.encoding.as_deref() {
        if encoding != "base64" {
            return Err(StoreError::InvalidPayload(format!(
                "unsupported content encoding '{encoding}'"
            )));
        }
    }

    // GitHub wraps base64 content at 60 columns.
    let packed = payload
        .content
        .unwrap_or_default()
        .split_whitespace()
        .collect::<String>();
    let version = Some(VersionToken::new(payload.sha));

    match BASE64_STANDARD.decode(packed.as_bytes()) {
        Ok(bytes) => Ok(Document { bytes, version }),
        Err(error) => {
            tracing::warn!("Stored content is not base64 ({}); treating as empty", error);
            Ok(Document {
                version,
                ..Document::missing()
            })
        }
    }
}

fn parse_write_response(status: StatusCode, body: &str) -> Result<WriteOutcome, StoreError> {
    if status.is_success() {
        let payload = serde_json::from_str::<PutContentsResponse>(body)
            .map_err(|error| StoreError::InvalidPayload(format!("put response: {error}")))?;
        return Ok(WriteOutcome::Written(VersionToken::new(payload.content.sha)));
    }

    if status == StatusCode::CONFLICT {
        return Ok(WriteOutcome::Conflict);
    }

    // A create without `sha` racing a concurrent create is rejected as 422
    // "\"sha\" wasn't supplied".
    if status == StatusCode::UNPROCESSABLE_ENTITY && error_message(body).contains("sha") {
        return Ok(WriteOutcome::Conflict);
    }

    Err(api_error(status, body))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<GitHubErrorBody>(body)
        .ok()
        .and_then(|payload| payload.message)
        .unwrap_or_else(|| body.to_string())
}

fn api_error(status: StatusCode, body: &str) -> StoreError {
    let message = compact_text(&error_message(body));
    StoreError::Api {
        status,
        message: if message.is_empty() {
            format!("HTTP {}", status.as_u16())
        } else {
            message
        },
    }
}

fn encode_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GitHubConfig {
        GitHubConfig {
            api_url: "https://api.github.com/".to_string(),
            repo: "aiktc/feedback-data".to_string(),
            branch: "main".to_string(),
            token: "ghp_secret".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn read_decodes_wrapped_base64_content() {
        let body = r#"{"sha": "abc123", "encoding": "base64",
                       "content": "W3siaWQi\nOiAxfV0=\n"}"#;
        let document = parse_read_response(StatusCode::OK, body).unwrap();
        assert_eq!(document.bytes, br#"[{"id": 1}]"#.to_vec());
        assert_eq!(document.version, Some(VersionToken::new("abc123")));
    }

    #[test]
    fn read_undecodable_content_is_empty_at_current_sha() {
        let body = r#"{"sha": "abc123", "encoding": "base64", "content": "%%%"}"#;
        let document = parse_read_response(StatusCode::OK, body).unwrap();
        assert_eq!(document.bytes, b"[]".to_vec());
        assert_eq!(document.version, Some(VersionToken::new("abc123")));
    }

    #[test]
    fn read_missing_document_is_empty_collection() {
        let document = parse_read_response(StatusCode::NOT_FOUND, "{}").unwrap();
        assert_eq!(document, Document::missing());
    }

    #[test]
    fn read_auth_failure_is_an_error() {
        let error = parse_read_response(
            StatusCode::UNAUTHORIZED,
            r#"{"message": "Bad credentials"}"#,
        )
        .unwrap_err();
        assert!(error.to_string().contains("Bad credentials"));
    }

    #[test]
    fn write_success_returns_new_sha() {
        let body = r#"{"content": {"sha": "def456", "name": "feedback.json"}, "commit": {}}"#;
        assert_eq!(
            parse_write_response(StatusCode::CREATED, body).unwrap(),
            WriteOutcome::Written(VersionToken::new("def456"))
        );
    }

    #[test]
    fn write_stale_sha_is_a_conflict() {
        let body = r#"{"message": "feedback.json does not match abc123"}"#;
        assert_eq!(
            parse_write_response(StatusCode::CONFLICT, body).unwrap(),
            WriteOutcome::Conflict
        );
    }

    #[test]
    fn write_missing_sha_on_existing_file_is_a_conflict() {
        let body = r#"{"message": "Invalid request.\n\n\"sha\" wasn't supplied."}"#;
        assert_eq!(
            parse_write_response(StatusCode::UNPROCESSABLE_ENTITY, body).unwrap(),
            WriteOutcome::Conflict
        );
    }

    #[test]
    fn write_other_failures_are_errors() {
        let error = parse_write_response(StatusCode::FORBIDDEN, "").unwrap_err();
        match error {
            StoreError::Api { status, message } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(message, "HTTP 403");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn contents_url_encodes_segments() {
        let store = GitHubStore::new(config()).unwrap();
        assert_eq!(
            store.contents_url("/data/new feedback.json"),
            "https://api.github.com/repos/aiktc/feedback-data/contents/data/new%20feedback.json"
        );
    }

    #[test]
    fn new_rejects_malformed_repo_and_url() {
        let mut bad_repo = config();
        bad_repo.repo = "just-a-name".to_string();
        assert!(GitHubStore::new(bad_repo).is_err());

        let mut bad_url = config();
        bad_url.api_url = "api.github.com".to_string();
        assert!(GitHubStore::new(bad_url).is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let debug = format!("{:?}", config());
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
