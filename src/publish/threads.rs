//! Threads Graph API publisher.
//!
//! Posting is a two-step flow: create a media container, then publish it by
//! creation id. Image containers are processed asynchronously by the platform
//! and must report FINISHED before they can be published.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::error::ThreadsError;
use super::media_host::MediaHost;
use super::{PublishOutcome, Publisher};
use crate::config::ThreadsConfig;
use crate::media::ImageData;

const STATUS_ATTEMPTS: u32 = 10;
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// The authenticated Threads account, resolved at startup.
#[derive(Debug, Clone)]
struct Identity {
    user_id: String,
    username: String,
}

pub struct ThreadsPublisher {
    client: Client,
    base_url: String,
    access_token: String,
    identity: Option<Identity>,
    media: Option<MediaHost>,
}

impl ThreadsPublisher {
    pub fn new(config: &ThreadsConfig, access_token: String, media: Option<MediaHost>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            access_token,
            identity: None,
            media,
        }
    }

    /// Validate the access token and resolve the account identity. An invalid
    /// or missing token leaves the publisher logged out; publishes then report
    /// `posted: false` instead of failing requests.
    pub async fn connect(mut self) -> Self {
        if self.access_token.is_empty() {
            warn!("no Threads access token configured");
            return self;
        }

        match self.fetch_profile().await {
            Ok(identity) => {
                info!(
                    username = %identity.username,
                    user_id = %identity.user_id,
                    "authenticated with Threads"
                );
                self.identity = Some(identity);
            }
            Err(e) => {
                warn!(error = %e, "Threads token validation failed");
            }
        }
        self
    }

    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.username.as_str())
    }

    async fn fetch_profile(&self) -> Result<Identity, ThreadsError> {
        let url = format!("{}/me", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("fields", "id,username")])
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ThreadsError::Api { status, message });
        }

        let profile: Profile = response.json().await?;
        Ok(Identity {
            user_id: profile.id,
            username: profile.username,
        })
    }

    async fn try_publish(
        &self,
        text: &str,
        image: Option<&ImageData>,
    ) -> Result<String, ThreadsError> {
        let identity = self.identity.as_ref().ok_or(ThreadsError::NotLoggedIn)?;

        match image {
            Some(image) => {
                let host = self.media.as_ref().ok_or(ThreadsError::NoMediaHost)?;
                let upload = host.upload(image).await?;
                let result = self.publish_image(identity, text, &upload.url).await;
                host.remove(&upload).await;
                result
            }
            None => {
                let container = self.create_text_container(identity, text).await?;
                self.publish_container(identity, &container).await
            }
        }
    }

    async fn publish_image(
        &self,
        identity: &Identity,
        text: &str,
        image_url: &str,
    ) -> Result<String, ThreadsError> {
        let container = self.create_image_container(identity, text, image_url).await?;
        self.wait_for_container(&container).await?;
        self.publish_container(identity, &container).await
    }

    async fn create_text_container(
        &self,
        identity: &Identity,
        text: &str,
    ) -> Result<String, ThreadsError> {
        let url = format!("{}/{}/threads", self.base_url, identity.user_id);
        let response = self
            .client
            .post(&url)
            .query(&[
                ("media_type", "TEXT"),
                ("text", text),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await?;

        parse_media_id(response).await
    }

    async fn create_image_container(
        &self,
        identity: &Identity,
        text: &str,
        image_url: &str,
    ) -> Result<String, ThreadsError> {
        let url = format!("{}/{}/threads", self.base_url, identity.user_id);
        let mut query = vec![
            ("media_type", "IMAGE"),
            ("image_url", image_url),
            ("access_token", self.access_token.as_str()),
        ];
        // An image with no reply text publishes with an empty caption.
        if !text.is_empty() {
            query.push(("text", text));
        }

        let response = self.client.post(&url).query(&query).send().await?;
        parse_media_id(response).await
    }

    /// Poll an image container until the platform reports it ready.
    async fn wait_for_container(&self, container_id: &str) -> Result<(), ThreadsError> {
        let url = format!("{}/{}", self.base_url, container_id);

        for attempt in 0..STATUS_ATTEMPTS {
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("fields", "status,error_message"),
                    ("access_token", self.access_token.as_str()),
                ])
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let message = response.text().await.unwrap_or_default();
                return Err(ThreadsError::Api { status, message });
            }

            let status: ContainerStatus = response.json().await?;
            match status.status.as_str() {
                "FINISHED" => return Ok(()),
                "ERROR" => {
                    return Err(ThreadsError::Container {
                        message: status
                            .error_message
                            .unwrap_or_else(|| "unknown container error".to_string()),
                    });
                }
                other => {
                    debug!(container_id, status = other, attempt, "container not ready");
                    tokio::time::sleep(STATUS_INTERVAL).await;
                }
            }
        }

        Err(ThreadsError::ContainerTimeout)
    }

    async fn publish_container(
        &self,
        identity: &Identity,
        container_id: &str,
    ) -> Result<String, ThreadsError> {
        let url = format!("{}/{}/threads_publish", self.base_url, identity.user_id);
        let response = self
            .client
            .post(&url)
            .query(&[
                ("creation_id", container_id),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await?;

        parse_media_id(response).await
    }
}

#[async_trait]
impl Publisher for ThreadsPublisher {
    async fn publish(&self, text: &str, image: Option<&ImageData>) -> PublishOutcome {
        match self.try_publish(text, image).await {
            Ok(post_id) => {
                debug!(%post_id, "published to Threads");
                PublishOutcome::posted(format!("Post sent to Threads (post id {post_id})"))
            }
            Err(ThreadsError::NotLoggedIn) => {
                PublishOutcome::failed("Not posted to Threads: not logged in")
            }
            Err(e) => {
                warn!(error = %e, "failed to post to Threads");
                PublishOutcome::failed(format!("Error posting to Threads: {e}"))
            }
        }
    }
}

async fn parse_media_id(response: reqwest::Response) -> Result<String, ThreadsError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        return Err(ThreadsError::Api { status, message });
    }

    let media: MediaResponse = response.json().await?;
    Ok(media.id)
}

// --- Graph API response types ---

#[derive(Deserialize)]
struct Profile {
    id: String,
    username: String,
}

#[derive(Deserialize)]
struct MediaResponse {
    id: String,
}

#[derive(Deserialize)]
struct ContainerStatus {
    status: String,
    error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_out_publisher() -> ThreadsPublisher {
        ThreadsPublisher::new(&ThreadsConfig::default(), String::new(), None)
    }

    #[tokio::test]
    async fn logged_out_publisher_reports_failure_as_outcome() {
        let publisher = logged_out_publisher();
        assert!(!publisher.is_logged_in());

        let outcome = publisher.publish("Hello", None).await;
        assert!(!outcome.posted);
        assert!(outcome.message.contains("not logged in"));
    }

    #[tokio::test]
    async fn image_without_media_host_is_contained() {
        let mut publisher = logged_out_publisher();
        publisher.identity = Some(Identity {
            user_id: "17841400000000000".to_string(),
            username: "tester".to_string(),
        });

        let image = ImageData::new(bytes::Bytes::from_static(b"\xff\xd8\xffdata"));
        let outcome = publisher.publish("caption", Some(&image)).await;
        assert!(!outcome.posted);
        assert!(outcome.message.contains("no media host"));
    }

    #[test]
    fn profile_deserialization() {
        let profile: Profile =
            serde_json::from_str(r#"{"id": "178414", "username": "prompt_pipe"}"#).unwrap();
        assert_eq!(profile.id, "178414");
        assert_eq!(profile.username, "prompt_pipe");
    }

    #[test]
    fn container_status_deserialization() {
        let status: ContainerStatus = serde_json::from_str(
            r#"{"status": "ERROR", "error_message": "media type unsupported", "id": "99"}"#,
        )
        .unwrap();
        assert_eq!(status.status, "ERROR");
        assert_eq!(status.error_message.as_deref(), Some("media type unsupported"));
    }
}
