use super::common::ImageRef;
use crate::prompt::PromptPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: ImageRef,
}

/// One unit of a multimodal user message, in the chat-completions wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(image: ImageRef) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl { url: image },
        }
    }

    pub fn as_image(&self) -> Option<&ImageRef> {
        match self {
            ContentPart::ImageUrl { image_url } => Some(&image_url.url),
            ContentPart::Text { .. } => None,
        }
    }
}

/// Ordered content sent to the image model. The first image part is treated
/// by the model as the edit canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMessage {
    pub policy: PromptPolicy,
    pub parts: Vec<ContentPart>,
}

impl ModelMessage {
    pub fn instruction(&self) -> &str {
        self.parts
            .iter()
            .find_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ImageUrl { .. } => None,
            })
            .unwrap_or_default()
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageRef> {
        self.parts.iter().filter_map(ContentPart::as_image)
    }

    pub fn image_count(&self) -> usize {
        self.images().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub image_url: String,
    pub prompt: String,
}
