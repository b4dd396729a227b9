//! GitHub-backed media hosting for image posts.
//!
//! The Threads Graph API only accepts publicly reachable image URLs, so image
//! bytes are parked in a GitHub repository via the contents API and served
//! from raw.githubusercontent.com just long enough to publish the post. The
//! file is deleted afterwards on a best-effort basis.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::ThreadsError;
use crate::config::MediaHostConfig;
use crate::media::ImageData;

const GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("promptpipe/", env!("CARGO_PKG_VERSION"));

/// A file parked on the media host.
#[derive(Debug)]
pub struct UploadedMedia {
    /// Publicly reachable URL for the uploaded bytes.
    pub url: String,
    path: String,
    sha: String,
}

pub struct MediaHost {
    client: Client,
    owner: String,
    repo: String,
    branch: String,
    token: String,
}

impl MediaHost {
    pub fn new(config: &MediaHostConfig, token: String) -> Self {
        Self {
            client: Client::new(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            token,
        }
    }

    /// Upload image bytes and return the raw URL they are served from.
    pub async fn upload(&self, image: &ImageData) -> Result<UploadedMedia, ThreadsError> {
        let path = format!(
            "uploads/{}.{}",
            Uuid::new_v4().simple(),
            image.extension()
        );
        let url = format!(
            "{GITHUB_API_URL}/repos/{}/{}/contents/{}",
            self.owner, self.repo, path
        );

        let body = serde_json::json!({
            "message": "promptpipe media upload",
            "content": STANDARD.encode(image.bytes()),
            "branch": self.branch,
        });

        let response = self
            .client
            .put(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ThreadsError::MediaUpload { status, message });
        }

        let uploaded: UploadResponse = response.json().await?;
        debug!(%path, "uploaded media file");

        Ok(UploadedMedia {
            url: format!(
                "https://raw.githubusercontent.com/{}/{}/{}/{}",
                self.owner, self.repo, self.branch, path
            ),
            path,
            sha: uploaded.content.sha,
        })
    }

    /// Delete a previously uploaded file. Failures are logged and swallowed;
    /// a stale upload never fails a publish that already went through.
    pub async fn remove(&self, media: &UploadedMedia) {
        let url = format!(
            "{GITHUB_API_URL}/repos/{}/{}/contents/{}",
            self.owner, self.repo, media.path
        );

        let body = serde_json::json!({
            "message": "promptpipe media cleanup",
            "sha": media.sha,
            "branch": self.branch,
        });

        let result = self
            .client
            .delete(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .json(&body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(path = %media.path, "removed media file");
            }
            Ok(response) => {
                warn!(path = %media.path, status = %response.status(), "failed to remove media file");
            }
            Err(e) => {
                warn!(path = %media.path, error = %e, "failed to remove media file");
            }
        }
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    content: UploadedContent,
}

#[derive(Deserialize)]
struct UploadedContent {
    sha: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_response_deserialization() {
        let response: UploadResponse = serde_json::from_str(
            r#"{"content": {"name": "x.png", "sha": "abc123", "path": "uploads/x.png"}}"#,
        )
        .unwrap();
        assert_eq!(response.content.sha, "abc123");
    }
}
