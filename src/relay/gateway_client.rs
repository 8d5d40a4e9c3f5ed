use crate::{
    config::GatewayConfig,
    error::{RelayError, Result},
    models::{ContentPart, ModelMessage},
    relay::traits::ImageModel,
};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

const OUTPUT_MODALITIES: [&str; 2] = ["image", "text"];

/// Chat-completions style client for the image gateway. One request per call,
/// no retries.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayClient")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    modalities: [&'static str; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a [ContentPart],
}

const IMAGE_URL_POINTER: &str = "/choices/0/message/images/0/image_url/url";
const CONTENT_POINTER: &str = "/choices/0/message/content";

/// First generated image reference; any missing or null step yields `None`.
fn first_image(response: &Value) -> Option<&str> {
    response
        .pointer(IMAGE_URL_POINTER)
        .and_then(Value::as_str)
        .filter(|url| !url.trim().is_empty())
}

/// Assistant text, whether `content` is a plain string or a list of parts.
fn assistant_text(response: &Value) -> Option<String> {
    match response.pointer(CONTENT_POINTER)? {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let text: Vec<&str> = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            Some(text.join(" "))
        }
        _ => None,
    }
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            model: config.model.clone(),
            api_key,
            timeout,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> RelayError {
        if e.is_timeout() {
            RelayError::TransportError(format!(
                "gateway did not answer within {}s",
                self.timeout.as_secs()
            ))
        } else {
            RelayError::TransportError(e.to_string())
        }
    }
}

#[async_trait]
impl ImageModel for GatewayClient {
    async fn generate_image(&self, message: &ModelMessage) -> Result<String> {
        let payload = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &message.parts,
            }],
            modalities: OUTPUT_MODALITIES,
        };

        log::info!("Generating image with model: {}", self.model);
        log::debug!(
            "Gateway request: policy={} parts={} images={}",
            message.policy,
            message.parts.len(),
            message.image_count()
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            log::warn!("AI gateway rate limited the request");
            return Err(RelayError::RateLimited);
        }
        if status == StatusCode::PAYMENT_REQUIRED {
            log::warn!("AI gateway reports exhausted credits");
            return Err(RelayError::QuotaExhausted);
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            log::error!("AI gateway error: {} {}", status.as_u16(), body);
            return Err(RelayError::UpstreamError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: Value =
            serde_json::from_str(&body).map_err(|e| RelayError::UpstreamError {
                status: status.as_u16(),
                body: format!("unparsable gateway response: {}", e),
            })?;

        log::info!("AI response received");
        match first_image(&parsed) {
            Some(url) => Ok(url.to_string()),
            None => Err(RelayError::NoImageProduced(match assistant_text(&parsed) {
                Some(text) if !text.trim().is_empty() => {
                    format!("model answered with text only: {}", text)
                }
                _ => "response contained no image".to_string(),
            })),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageRef;
    use crate::prompt::PromptPolicy;
    use mockito::Matcher;
    use serde_json::json;

    fn message() -> ModelMessage {
        ModelMessage {
            policy: PromptPolicy::TemplateStrict,
            parts: vec![
                ContentPart::image(ImageRef::from("https://cdn.example.com/template.png")),
                ContentPart::text("Edit this template"),
            ],
        }
    }

    fn client_for(server: &mockito::ServerGuard) -> GatewayClient {
        let config = GatewayConfig::new()
            .with_api_key("test-key")
            .with_url(format!("{}/v1/chat/completions", server.url()))
            .with_timeout_secs(5);
        GatewayClient::new(&config).unwrap()
    }

    #[test]
    fn test_missing_credential() {
        let err = GatewayClient::new(&GatewayConfig::new()).unwrap_err();
        assert!(matches!(err, RelayError::MissingCredential(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = GatewayClient::new(&GatewayConfig::new().with_api_key("sk-live-123")).unwrap();
        assert!(!format!("{:?}", client).contains("sk-live-123"));
    }

    #[tokio::test]
    async fn test_success_returns_first_image() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(json!({
                "model": crate::config::DEFAULT_IMAGE_MODEL,
                "modalities": ["image", "text"],
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "image_url", "image_url": {"url": "https://cdn.example.com/template.png"}},
                        {"type": "text", "text": "Edit this template"}
                    ]
                }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{
                        "message": {
                            "content": "Here is your post",
                            "images": [
                                {"image_url": {"url": "data:image/png;base64,AAAA"}},
                                {"image_url": {"url": "data:image/png;base64,BBBB"}}
                            ]
                        }
                    }]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let url = client_for(&server).generate_image(&message()).await.unwrap();
        assert_eq!(url, "data:image/png;base64,AAAA");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .expect(1)
            .create_async()
            .await;

        let err = client_for(&server).generate_image(&message()).await.unwrap_err();
        assert!(matches!(err, RelayError::RateLimited));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_payment_required_maps_to_quota() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(402)
            .create_async()
            .await;

        let err = client_for(&server).generate_image(&message()).await.unwrap_err();
        assert!(matches!(err, RelayError::QuotaExhausted));
    }

    #[tokio::test]
    async fn test_other_status_keeps_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .expect(1)
            .create_async()
            .await;

        let err = client_for(&server).generate_image(&message()).await.unwrap_err();
        match err {
            RelayError::UpstreamError { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_image_path() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"I cannot draw that"}}]}"#)
            .create_async()
            .await;

        let err = client_for(&server).generate_image(&message()).await.unwrap_err();
        match err {
            RelayError::NoImageProduced(detail) => assert!(detail.contains("I cannot draw that")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let err = client_for(&server).generate_image(&message()).await.unwrap_err();
        assert!(matches!(err, RelayError::NoImageProduced(_)));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transport_error() {
        let config = GatewayConfig::new()
            .with_api_key("test-key")
            .with_url("http://127.0.0.1:9/v1/chat/completions")
            .with_timeout_secs(2);
        let client = GatewayClient::new(&config).unwrap();

        let err = client.generate_image(&message()).await.unwrap_err();
        assert!(matches!(err, RelayError::TransportError(_)));
    }

    #[tokio::test]
    async fn test_content_parts_array_still_yields_image() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"content":[{"type":"text","text":"done"}],"images":[{"image_url":{"url":"data:image/png;base64,AAAA"}}]}}]}"#,
            )
            .create_async()
            .await;

        let url = client_for(&server).generate_image(&message()).await.unwrap();
        assert_eq!(url, "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    async fn test_null_images_is_no_image_produced() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":null,"images":null}}]}"#)
            .create_async()
            .await;

        let err = client_for(&server).generate_image(&message()).await.unwrap_err();
        assert!(matches!(err, RelayError::NoImageProduced(_)));
    }

    #[tokio::test]
    async fn test_text_parts_reported_when_no_image() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":[{"type":"text","text":"refused"}]}}]}"#)
            .create_async()
            .await;

        let err = client_for(&server).generate_image(&message()).await.unwrap_err();
        match err {
            RelayError::NoImageProduced(detail) => assert!(detail.contains("refused")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_silent_gateway_times_out_as_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            // Accept and hold the connection without ever answering.
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
            drop(socket);
        });

        let config = GatewayConfig::new()
            .with_api_key("test-key")
            .with_url(format!("http://{}/v1/chat/completions", addr))
            .with_timeout_secs(1);
        let client = GatewayClient::new(&config).unwrap();

        let err = client.generate_image(&message()).await.unwrap_err();
        match err {
            RelayError::TransportError(detail) => assert!(detail.contains("within 1s")),
            other => panic!("unexpected error: {:?}", other),
        }
        hold.abort();
    }
}
