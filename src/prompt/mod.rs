pub mod builder;

use crate::error::{RelayError, Result};
use crate::models::{ModelMessage, RelayRequest};
use std::fmt;
use std::str::FromStr;

pub use builder::build;

/// Which instruction strategy the builder applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptPolicy {
    /// No template: compose the post from scratch.
    FreeCompose,
    /// Template used as a base, branding preserved, no geometric constraints.
    TemplateLoose,
    /// Template is the canvas: exact dimensions, edge-to-edge, footer intact.
    TemplateStrict,
    /// Edit a previously generated image with a follow-up instruction.
    Refine,
}

impl PromptPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptPolicy::FreeCompose => "free_compose",
            PromptPolicy::TemplateLoose => "template_loose",
            PromptPolicy::TemplateStrict => "template_strict",
            PromptPolicy::Refine => "refine",
        }
    }

    pub fn requires_template(&self) -> bool {
        matches!(
            self,
            PromptPolicy::TemplateLoose | PromptPolicy::TemplateStrict
        )
    }

    pub fn select(request: &RelayRequest, fit: TemplateFit, require_template: bool) -> Self {
        match request {
            RelayRequest::Refine(_) => PromptPolicy::Refine,
            RelayRequest::Generate(post) if require_template || post.has_template() => {
                fit.policy()
            }
            RelayRequest::Generate(_) => PromptPolicy::FreeCompose,
        }
    }
}

impl fmt::Display for PromptPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How tightly generated posts must follow a supplied template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateFit {
    Loose,
    Strict,
}

impl TemplateFit {
    pub fn policy(&self) -> PromptPolicy {
        match self {
            TemplateFit::Loose => PromptPolicy::TemplateLoose,
            TemplateFit::Strict => PromptPolicy::TemplateStrict,
        }
    }
}

impl FromStr for TemplateFit {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "loose" => Ok(TemplateFit::Loose),
            "strict" => Ok(TemplateFit::Strict),
            other => Err(RelayError::ConfigError(format!(
                "unknown template fit `{}` (expected `strict` or `loose`)",
                other
            ))),
        }
    }
}

/// Picks a policy for each request and builds the model message.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    fit: TemplateFit,
    require_template: bool,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            fit: TemplateFit::Strict,
            require_template: false,
        }
    }
}

impl PromptBuilder {
    pub fn new(fit: TemplateFit, require_template: bool) -> Self {
        Self {
            fit,
            require_template,
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.template_fit, config.require_template)
    }

    pub fn fit(&self) -> TemplateFit {
        self.fit
    }

    pub fn requires_template(&self) -> bool {
        self.require_template
    }

    pub fn policy_for(&self, request: &RelayRequest) -> PromptPolicy {
        PromptPolicy::select(request, self.fit, self.require_template)
    }

    pub fn build_for(&self, request: &RelayRequest) -> Result<ModelMessage> {
        build(self.policy_for(request), request)
    }
}
