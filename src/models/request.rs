use super::common::{optional_theme, sparse_images, BackgroundTheme, ImageRef};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Generate-path payload collected by the dealership form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    #[serde(default, alias = "numberOfVehicles")]
    pub vehicle_count: Option<u32>,
    #[serde(default)]
    pub vehicle_names: Vec<String>,
    #[serde(default, deserialize_with = "sparse_images")]
    pub vehicle_images: Vec<ImageRef>,
    #[serde(default, alias = "dealershipTemplate")]
    pub template: Option<ImageRef>,
    #[serde(default)]
    pub special_feature: Option<String>,
    #[serde(default, deserialize_with = "optional_theme")]
    pub background_theme: Option<BackgroundTheme>,
    #[serde(default)]
    pub custom_keywords: Option<String>,
    #[serde(default)]
    pub dealership_name: Option<String>,
    #[serde(default)]
    pub dealership_address: Option<String>,
    #[serde(default)]
    pub dealership_phone: Option<String>,
    #[serde(default, deserialize_with = "sparse_images")]
    pub example_images: Vec<ImageRef>,
    #[serde(default, deserialize_with = "sparse_images")]
    pub banner_images: Vec<ImageRef>,
    #[serde(default, deserialize_with = "sparse_images")]
    pub style_images: Vec<ImageRef>,
}

fn clean_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn clean_images(images: &[ImageRef]) -> Vec<ImageRef> {
    images
        .iter()
        .filter(|image| !image.is_blank())
        .map(|image| ImageRef::new(image.as_str().trim()))
        .collect()
}

impl PostRequest {
    /// Trims text, drops blank vehicle names, empty image slots and empty
    /// optional strings. Applying it twice yields the same request.
    pub fn normalized(&self) -> PostRequest {
        PostRequest {
            vehicle_count: self.vehicle_count,
            vehicle_names: self
                .vehicle_names
                .iter()
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect(),
            vehicle_images: clean_images(&self.vehicle_images),
            template: self
                .template
                .as_ref()
                .filter(|t| !t.is_blank())
                .map(|t| ImageRef::new(t.as_str().trim())),
            special_feature: clean_text(&self.special_feature),
            background_theme: self.background_theme,
            custom_keywords: clean_text(&self.custom_keywords),
            dealership_name: clean_text(&self.dealership_name),
            dealership_address: clean_text(&self.dealership_address),
            dealership_phone: clean_text(&self.dealership_phone),
            example_images: clean_images(&self.example_images),
            banner_images: clean_images(&self.banner_images),
            style_images: clean_images(&self.style_images),
        }
    }

    pub fn has_template(&self) -> bool {
        self.template.as_ref().map_or(false, |t| !t.is_blank())
    }

    /// Example posts, banners and style assets, in that order.
    pub fn reference_images(&self) -> impl Iterator<Item = &ImageRef> {
        self.example_images
            .iter()
            .chain(self.banner_images.iter())
            .chain(self.style_images.iter())
    }
}

/// Follow-up edit of a previously generated post.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineRequest {
    #[serde(default)]
    pub current_image: ImageRef,
    #[serde(default)]
    pub refinement_instruction: String,
    #[serde(default, alias = "dealershipTemplate")]
    pub template: Option<ImageRef>,
}

impl RefineRequest {
    pub fn new(current_image: impl Into<ImageRef>, instruction: impl Into<String>) -> Self {
        RefineRequest {
            current_image: current_image.into(),
            refinement_instruction: instruction.into(),
            template: None,
        }
    }

    pub fn with_template(mut self, template: impl Into<ImageRef>) -> Self {
        self.template = Some(template.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelayRequest {
    Generate(PostRequest),
    Refine(RefineRequest),
}

impl RelayRequest {
    pub fn mode(&self) -> &'static str {
        match self {
            RelayRequest::Generate(_) => "generate",
            RelayRequest::Refine(_) => "refine",
        }
    }
}

impl<'de> Deserialize<'de> for RelayRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let mode = value.get("mode").and_then(Value::as_str).map(str::to_owned);
        match mode.as_deref() {
            Some("refine") => RefineRequest::deserialize(value)
                .map(RelayRequest::Refine)
                .map_err(D::Error::custom),
            None | Some("generate") => PostRequest::deserialize(value)
                .map(RelayRequest::Generate)
                .map_err(D::Error::custom),
            Some(other) => Err(D::Error::custom(format!("unknown mode `{}`", other))),
        }
    }
}

impl From<PostRequest> for RelayRequest {
    fn from(request: PostRequest) -> Self {
        RelayRequest::Generate(request)
    }
}

impl From<RefineRequest> for RelayRequest {
    fn from(request: RefineRequest) -> Self {
        RelayRequest::Refine(request)
    }
}
