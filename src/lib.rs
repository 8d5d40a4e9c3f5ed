//! Relay that turns dealership form data into an image-generation prompt and
//! forwards it, with the dealership's images, to a multimodal image model.

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod prompt;
pub mod relay;
#[cfg(feature = "server")]
pub mod server;

pub use config::{Config, GatewayConfig};
pub use error::{RelayError, Result};
pub use models::*;
pub use prompt::{PromptBuilder, PromptPolicy, TemplateFit};
pub use relay::{GatewayClient, ImageModel, PostRelay};
