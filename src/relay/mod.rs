pub mod gateway_client;
pub mod traits;

use crate::{
    config::Config,
    error::Result,
    logger,
    models::{GenerationResult, RelayRequest},
    prompt::PromptBuilder,
};
use std::sync::Arc;
use uuid::Uuid;

pub use gateway_client::GatewayClient;
pub use traits::ImageModel;

/// Stateless relay: builds the prompt for each request and submits it to the
/// image model once.
#[derive(Clone)]
pub struct PostRelay {
    builder: PromptBuilder,
    model: Arc<dyn ImageModel>,
}

impl PostRelay {
    pub fn new(builder: PromptBuilder, model: Arc<dyn ImageModel>) -> Self {
        Self { builder, model }
    }

    /// Relay backed by the HTTP gateway. Fails with `MissingCredential` when
    /// no API key is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = GatewayClient::new(&config.gateway)?;
        Ok(Self::new(PromptBuilder::from_config(config), Arc::new(client)))
    }

    pub fn builder(&self) -> &PromptBuilder {
        &self.builder
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub async fn handle(&self, request: RelayRequest) -> Result<GenerationResult> {
        let request_id = Uuid::new_v4().to_string();
        log::info!(
            "[req:{}] Generating post with params: {}",
            request_id,
            describe(&request)
        );

        let message = match self.builder.build_for(&request) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("[req:{}] Rejected request: {}", request_id, e);
                return Err(e);
            }
        };
        log::info!(
            "[req:{}] Policy {} with {} attached image(s)",
            request_id,
            message.policy,
            message.image_count()
        );
        log::debug!("[req:{}] Generated prompt: {}", request_id, message.instruction());

        let timer = logger::timer(&format!("generation {}", request_id));
        let outcome = self.model.generate_image(&message).await;
        drop(timer);

        match outcome {
            Ok(image_url) => Ok(GenerationResult {
                image_url,
                prompt: message.instruction().to_string(),
            }),
            Err(e) => {
                log::error!("[req:{}] Generation failed: {}", request_id, e);
                Err(e)
            }
        }
    }
}

/// Log line for the request parameters. Images appear only as summaries.
fn describe(request: &RelayRequest) -> String {
    match request {
        RelayRequest::Generate(post) => format!(
            "mode=generate vehicles={:?} count={:?} theme={} offer={:?} keywords={:?} dealership={:?} template={} vehicle_images={} references={}",
            post.vehicle_names,
            post.vehicle_count,
            post.background_theme.map_or("none", |t| t.as_str()),
            post.special_feature,
            post.custom_keywords,
            post.dealership_name,
            post.template
                .as_ref()
                .filter(|t| !t.is_blank())
                .map_or_else(|| "none".to_string(), |t| t.summary()),
            post.vehicle_images.iter().filter(|i| !i.is_blank()).count(),
            post.reference_images().filter(|i| !i.is_blank()).count(),
        ),
        RelayRequest::Refine(refine) => format!(
            "mode=refine instruction={:?} current_image={} template={}",
            refine.refinement_instruction,
            refine.current_image.summary(),
            refine
                .template
                .as_ref()
                .filter(|t| !t.is_blank())
                .map_or_else(|| "none".to_string(), |t| t.summary()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use crate::models::{BackgroundTheme, ImageRef, ModelMessage, PostRequest, RefineRequest};
    use crate::prompt::{PromptPolicy, TemplateFit};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const TEMPLATE: &str = "data:image/png;base64,iVBORw0KGgo=";

    struct ScriptedModel {
        calls: Mutex<Vec<ModelMessage>>,
        reply: fn() -> Result<String>,
    }

    impl ScriptedModel {
        fn new(reply: fn() -> Result<String>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply,
            })
        }

        fn calls(&self) -> Vec<ModelMessage> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageModel for ScriptedModel {
        async fn generate_image(&self, message: &ModelMessage) -> Result<String> {
            self.calls.lock().unwrap().push(message.clone());
            (self.reply)()
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn relay(model: Arc<ScriptedModel>, require_template: bool) -> PostRelay {
        PostRelay::new(PromptBuilder::new(TemplateFit::Strict, require_template), model)
    }

    fn honda_city(template: Option<&str>) -> RelayRequest {
        RelayRequest::Generate(PostRequest {
            vehicle_names: vec!["Honda City".into()],
            background_theme: Some(BackgroundTheme::Sunset),
            template: template.map(ImageRef::from),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_success_echoes_prompt() {
        let model = ScriptedModel::new(|| Ok("https://cdn.example.com/out.png".into()));
        let result = relay(model.clone(), false)
            .handle(honda_city(Some(TEMPLATE)))
            .await
            .unwrap();

        assert_eq!(result.image_url, "https://cdn.example.com/out.png");
        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].policy, PromptPolicy::TemplateStrict);
        assert_eq!(result.prompt, calls[0].instruction());
        assert!(result.prompt.contains("Honda City"));
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_model() {
        let model = ScriptedModel::new(|| Ok("unused".into()));
        let err = relay(model.clone(), true)
            .handle(honda_city(None))
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::InvalidRequest(_)));
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_model_errors_propagate() {
        let model = ScriptedModel::new(|| Err(RelayError::RateLimited));
        let err = relay(model.clone(), false)
            .handle(honda_city(None))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::RateLimited));
        assert_eq!(model.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_refine_flow() {
        let model = ScriptedModel::new(|| Ok("https://cdn.example.com/v2.png".into()));
        let request = RelayRequest::Refine(RefineRequest::new(
            "https://cdn.example.com/v1.png",
            "make the car bigger",
        ));
        let result = relay(model.clone(), true).handle(request).await.unwrap();

        assert_eq!(result.image_url, "https://cdn.example.com/v2.png");
        let calls = model.calls();
        assert_eq!(calls[0].policy, PromptPolicy::Refine);
        assert!(calls[0]
            .images()
            .any(|image| image.as_str() == "https://cdn.example.com/v1.png"));
        assert!(calls[0].instruction().contains("make the car bigger"));
    }

    #[test]
    fn test_describe_hides_image_payload() {
        let line = describe(&honda_city(Some(TEMPLATE)));
        assert!(line.contains("Honda City"));
        assert!(line.contains("image/png"));
        assert!(!line.contains("iVBORw0KGgo"));
    }

    #[test]
    fn test_from_config_requires_key() {
        let err = PostRelay::from_config(&Config::new()).err().unwrap();
        assert!(matches!(err, RelayError::MissingCredential(_)));
    }
}
