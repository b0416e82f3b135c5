//! TwitterClient - uploads media and creates posts over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use super::credentials::Credentials;
use super::oauth::{authorization_header, Nonce, SigningError};

/// Default base URL for media uploads.
pub const UPLOAD_BASE_URL: &str = "https://upload.twitter.com";

/// Default base URL for the posting API.
pub const API_BASE_URL: &str = "https://api.twitter.com";

const MEDIA_UPLOAD_PATH: &str = "/1.1/media/upload.json";
const CREATE_POST_PATH: &str = "/2/tweets";

/// Default timeout for HTTP requests (60 seconds, uploads can be slow).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const HTTP_STATUS_UNAUTHORIZED: u16 = 401;
const HTTP_STATUS_FORBIDDEN: u16 = 403;
const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Identifier of uploaded media, as returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaId(pub String);

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A created post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    media_id_string: String,
}

#[derive(Debug, Serialize)]
struct CreatePostRequest<'a> {
    text: &'a str,
    media: PostMedia<'a>,
}

#[derive(Debug, Serialize)]
struct PostMedia<'a> {
    media_ids: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct CreatePostResponse {
    data: PostRecord,
}

/// Errors from the social-media API.
#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Not authorized ({status}): {message}")]
    Unauthorized {
        status: u16,
        message: String,
    },

    #[error("Rate limited: {message}")]
    RateLimit {
        /// Human-readable rate limit message
        message: String,
        /// Retry-After header value in seconds, if provided. Informational
        /// only; the publish backoff keeps its own schedule.
        retry_after_secs: Option<u64>,
    },

    #[error("API error ({status}): {message}")]
    ApiError {
        status: u16,
        message: String,
    },

    #[error(transparent)]
    Signing(#[from] SigningError),
}

/// The two operations the publisher needs from a social-media account.
#[async_trait]
pub trait SocialApi: Send + Sync {
    async fn upload_media(&self, bytes: Vec<u8>) -> Result<MediaId, SocialError>;

    async fn create_post(&self, text: &str, media_id: &MediaId) -> Result<PostRecord, SocialError>;
}

/// Client for the v1.1 media upload and v2 post endpoints, using OAuth 1.0a
/// user-context signing.
pub struct TwitterClient {
    credentials: Credentials,
    upload_base_url: String,
    api_base_url: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for TwitterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterClient")
            .field("credentials", &self.credentials)
            .field("upload_base_url", &self.upload_base_url)
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

impl TwitterClient {
    /// Create a client against the production endpoints.
    pub fn new(credentials: Credentials) -> Result<Self, SocialError> {
        Self::with_base_urls(
            credentials,
            UPLOAD_BASE_URL.to_string(),
            API_BASE_URL.to_string(),
        )
    }

    /// Create a client with custom base URLs.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_urls(
        credentials: Credentials,
        upload_base_url: String,
        api_base_url: String,
    ) -> Result<Self, SocialError> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            credentials,
            upload_base_url: upload_base_url.trim_end_matches('/').to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn upload_base_url(&self) -> &str {
        &self.upload_base_url
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    fn authorization(&self, method: &str, url: &str) -> Result<String, SigningError> {
        authorization_header(&self.credentials, method, url, &[], &Nonce::generate())
    }

    /// Turn a non-success response into the matching [`SocialError`].
    async fn error_from_response(response: reqwest::Response) -> SocialError {
        let status = response.status().as_u16();

        if status == HTTP_STATUS_TOO_MANY_REQUESTS {
            let retry_after_secs = parse_retry_after(&response);
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Rate limit exceeded".to_string());
            log::warn!("Rate limited by API. Retry-After: {:?} seconds", retry_after_secs);
            return SocialError::RateLimit {
                message,
                retry_after_secs,
            };
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status == HTTP_STATUS_UNAUTHORIZED || status == HTTP_STATUS_FORBIDDEN {
            return SocialError::Unauthorized { status, message };
        }

        SocialError::ApiError { status, message }
    }
}

/// Parse the Retry-After header value in whole seconds.
pub fn parse_retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

#[async_trait]
impl SocialApi for TwitterClient {
    /// Upload image bytes as multipart form field `media`.
    async fn upload_media(&self, bytes: Vec<u8>) -> Result<MediaId, SocialError> {
        let url = format!("{}{}", self.upload_base_url, MEDIA_UPLOAD_PATH);
        let part = Part::bytes(bytes)
            .file_name("motion.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new().part("media", part);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.authorization("POST", &url)?)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let upload: UploadResponse = response.json().await?;
        log::debug!("Uploaded media {}", upload.media_id_string);
        Ok(MediaId(upload.media_id_string))
    }

    /// Create a post with `text` and one attached media item.
    async fn create_post(&self, text: &str, media_id: &MediaId) -> Result<PostRecord, SocialError> {
        let url = format!("{}{}", self.api_base_url, CREATE_POST_PATH);
        let body = CreatePostRequest {
            text,
            media: PostMedia {
                media_ids: [media_id.0.as_str()],
            },
        };

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.authorization("POST", &url)?)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let created: CreatePostResponse = response.json().await?;
        Ok(created.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new("key", "secret", "token", "token-secret")
    }

    #[test]
    fn test_new_uses_production_urls() {
        let client = TwitterClient::new(creds()).unwrap();
        assert_eq!(client.upload_base_url(), UPLOAD_BASE_URL);
        assert_eq!(client.api_base_url(), API_BASE_URL);
    }

    #[test]
    fn test_with_base_urls_trims_trailing_slash() {
        let client = TwitterClient::with_base_urls(
            creds(),
            "http://127.0.0.1:9000/".to_string(),
            "http://127.0.0.1:9001".to_string(),
        )
        .unwrap();
        assert_eq!(client.upload_base_url(), "http://127.0.0.1:9000");
        assert_eq!(client.api_base_url(), "http://127.0.0.1:9001");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let client = TwitterClient::new(creds()).unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("token-secret"));
    }

    #[test]
    fn test_create_post_request_body() {
        let id = MediaId("1455952740635586573".to_string());
        let body = CreatePostRequest {
            text: "Mon Oct 19 14:03:22 2026 UTC9",
            media: PostMedia {
                media_ids: [id.0.as_str()],
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "text": "Mon Oct 19 14:03:22 2026 UTC9",
                "media": { "media_ids": ["1455952740635586573"] }
            })
        );
    }

    #[test]
    fn test_social_error_display() {
        let err = SocialError::RateLimit {
            message: "Too Many Requests".to_string(),
            retry_after_secs: Some(900),
        };
        assert_eq!(err.to_string(), "Rate limited: Too Many Requests");
        let err = SocialError::Unauthorized {
            status: 401,
            message: "Unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "Not authorized (401): Unauthorized");
    }
}
