use crate::{error::Result, models::ModelMessage};
use async_trait::async_trait;

/// A multimodal model that turns one user message into one generated image.
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Submits `message` once and returns the reference of the first image
    /// the model produced.
    async fn generate_image(&self, message: &ModelMessage) -> Result<String>;

    fn model_name(&self) -> &str;
}
