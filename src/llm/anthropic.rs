//! Anthropic completion client with native API format.

use async_trait::async_trait;
use reqwest::Client;

use super::client::CompletionClient;
use super::error::CompletionError;
use crate::config::AnthropicConfig;
use crate::media::ImageData;

/// Completion client for the Anthropic Messages API.
///
/// Each call sends a single user message carrying the prompt text and, when
/// present, the image as a base64 content block. Conversation history is not
/// forwarded; every prompt stands alone.
pub struct AnthropicClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_version: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub const DEFAULT_API_VERSION: &'static str = "2023-06-01";

    pub fn new(api_key: String, config: &AnthropicConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key,
            api_version: Self::DEFAULT_API_VERSION.to_string(),
            model: config.model.clone(),
            max_tokens: config.max_output_tokens,
        }
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(
        &self,
        prompt: &str,
        image: Option<&ImageData>,
    ) -> Result<String, CompletionError> {
        let url = format!("{}/v1/messages", self.base_url);
        let request = to_request(&self.model, self.max_tokens, prompt, image);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api { status, message });
        }

        let response: Response = response.json().await?;
        from_response(response)
    }
}

// --- Request/Response types ---

#[derive(serde::Serialize)]
struct Request {
    model: String,
    max_tokens: u32,
    messages: Vec<RequestMessage>,
}

#[derive(serde::Serialize)]
struct RequestMessage {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(serde::Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: String,
    data: String,
}

#[derive(serde::Deserialize)]
struct Response {
    content: Vec<Content>,
}

#[derive(serde::Deserialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

// --- Conversions ---

fn to_request(model: &str, max_tokens: u32, prompt: &str, image: Option<&ImageData>) -> Request {
    let mut content = Vec::new();

    if !prompt.is_empty() {
        content.push(ContentBlock::Text {
            text: prompt.to_string(),
        });
    }

    if let Some(image) = image {
        content.push(ContentBlock::Image {
            source: ImageSource {
                source_type: "base64",
                media_type: image.media_type().to_string(),
                data: image.to_base64(),
            },
        });
    }

    Request {
        model: model.to_string(),
        max_tokens,
        messages: vec![RequestMessage {
            role: "user",
            content,
        }],
    }
}

fn from_response(response: Response) -> Result<String, CompletionError> {
    let text = response
        .content
        .into_iter()
        .filter(|c| c.content_type == "text")
        .map(|c| c.text)
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        return Err(CompletionError::EmptyResponse);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn request_with_text_only() {
        let request = to_request("claude-3-7-sonnet-20250219", 4096, "Hello", None);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "claude-3-7-sonnet-20250219");
        assert_eq!(json["max_tokens"], 4096);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][0]["text"], "Hello");
    }

    #[test]
    fn request_with_image_adds_base64_block() {
        let image = ImageData::new(Bytes::from_static(b"\x89PNG\r\n\x1a\ndata"));
        let request = to_request("model", 1024, "What is this?", Some(&image));
        let json = serde_json::to_value(&request).unwrap();

        let blocks = json["messages"][0]["content"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1]["type"], "image");
        assert_eq!(blocks[1]["source"]["type"], "base64");
        assert_eq!(blocks[1]["source"]["media_type"], "image/png");
        assert_eq!(blocks[1]["source"]["data"], image.to_base64());
    }

    #[test]
    fn request_with_image_and_empty_prompt_has_no_text_block() {
        let image = ImageData::new(Bytes::from_static(b"\xff\xd8\xffdata"));
        let request = to_request("model", 1024, "", Some(&image));
        let json = serde_json::to_value(&request).unwrap();

        let blocks = json["messages"][0]["content"].as_array().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["type"], "image");
    }

    #[test]
    fn response_text_blocks_are_joined() {
        let response: Response = serde_json::from_str(
            r#"{
                "id": "msg_01",
                "content": [
                    {"type": "text", "text": "Hello"},
                    {"type": "tool_use", "text": ""},
                    {"type": "text", "text": " world"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(from_response(response).unwrap(), "Hello world");
    }

    #[test]
    fn empty_response_is_an_error() {
        let response: Response = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(matches!(
            from_response(response),
            Err(CompletionError::EmptyResponse)
        ));
    }
}
