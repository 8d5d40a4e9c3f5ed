use base64::Engine;
use serde::de::IntoDeserializer;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

const BASE64_MARKER: &str = ";base64,";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    DataUrl,
    Remote,
    Unknown,
}

/// An image handed to the model: either an inline `data:` URL produced by the
/// browser or a remote http(s) URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        ImageRef(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn kind(&self) -> ImageKind {
        let raw = self.0.trim();
        if raw.starts_with("data:") && raw.contains(BASE64_MARKER) {
            ImageKind::DataUrl
        } else if raw.starts_with("https://") || raw.starts_with("http://") {
            ImageKind::Remote
        } else {
            ImageKind::Unknown
        }
    }

    fn data_url_parts(&self) -> Option<(&str, &str)> {
        let raw = self.0.trim().strip_prefix("data:")?;
        let (mime, payload) = raw.split_once(BASE64_MARKER)?;
        Some((mime, payload))
    }

    /// Checks that the reference is usable: remote URLs pass as-is, data URLs
    /// must carry a decodable base64 payload.
    pub fn validate(&self) -> Result<(), String> {
        match self.kind() {
            ImageKind::Remote => Ok(()),
            ImageKind::DataUrl => {
                let (mime, payload) = self
                    .data_url_parts()
                    .ok_or_else(|| "malformed data URL".to_string())?;
                if !mime.starts_with("image/") {
                    return Err(format!("data URL is not an image ({})", mime));
                }
                base64::engine::general_purpose::STANDARD
                    .decode(payload)
                    .map(|_| ())
                    .map_err(|e| format!("data URL payload is not valid base64: {}", e))
            }
            ImageKind::Unknown => {
                Err("image reference is neither a data URL nor an http(s) URL".to_string())
            }
        }
    }

    /// Log-safe description; never includes the payload itself.
    pub fn summary(&self) -> String {
        match (self.kind(), self.data_url_parts()) {
            (ImageKind::DataUrl, Some((mime, payload))) => format!(
                "{} (~{} bytes inline)",
                mime,
                base64::decoded_len_estimate(payload.len())
            ),
            (ImageKind::Remote, _) => {
                let url = self.0.trim();
                match url.char_indices().nth(96) {
                    Some((cut, _)) => format!("{}...", &url[..cut]),
                    None => url.to_string(),
                }
            }
            _ => format!("unrecognized reference ({} chars)", self.0.len()),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        ImageRef::new(value)
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        ImageRef(value)
    }
}

/// Accepts `["data:...", "", null]` style arrays where the browser leaves
/// unused upload slots empty.
pub(crate) fn sparse_images<'de, D>(deserializer: D) -> Result<Vec<ImageRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let slots: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(slots
        .unwrap_or_default()
        .into_iter()
        .map(|slot| ImageRef(slot.unwrap_or_default()))
        .collect())
}

/// Treats `""` and `null` as "no theme selected"; any other value must name
/// a known theme.
pub(crate) fn optional_theme<'de, D>(deserializer: D) -> Result<Option<BackgroundTheme>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => {
            BackgroundTheme::deserialize(raw.trim().into_deserializer()).map(Some)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundTheme {
    Showroom,
    Road,
    Mud,
    Sunset,
    Rain,
    Desert,
    Mountain,
    Ship,
}

impl BackgroundTheme {
    pub const ALL: [BackgroundTheme; 8] = [
        BackgroundTheme::Showroom,
        BackgroundTheme::Road,
        BackgroundTheme::Mud,
        BackgroundTheme::Sunset,
        BackgroundTheme::Rain,
        BackgroundTheme::Desert,
        BackgroundTheme::Mountain,
        BackgroundTheme::Ship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackgroundTheme::Showroom => "showroom",
            BackgroundTheme::Road => "road",
            BackgroundTheme::Mud => "mud",
            BackgroundTheme::Sunset => "sunset",
            BackgroundTheme::Rain => "rain",
            BackgroundTheme::Desert => "desert",
            BackgroundTheme::Mountain => "mountain",
            BackgroundTheme::Ship => "ship",
        }
    }

    pub fn scene(&self) -> &'static str {
        match self {
            BackgroundTheme::Showroom => "inside a bright, modern dealership showroom",
            BackgroundTheme::Road => "driving on an open road",
            BackgroundTheme::Mud => "powering through an off-road mud trail",
            BackgroundTheme::Sunset => "against a warm golden-hour sky",
            BackgroundTheme::Rain => "on wet streets under dramatic rainfall",
            BackgroundTheme::Desert => "among sweeping desert dunes",
            BackgroundTheme::Mountain => "on a scenic mountain pass",
            BackgroundTheme::Ship => "on the deck of a cargo ship at sea",
        }
    }
}

impl fmt::Display for BackgroundTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn test_image_kinds() {
        assert_eq!(ImageRef::from(PNG).kind(), ImageKind::DataUrl);
        assert_eq!(
            ImageRef::from("https://cdn.example.com/car.jpg").kind(),
            ImageKind::Remote
        );
        assert_eq!(ImageRef::from("car.jpg").kind(), ImageKind::Unknown);
        assert!(ImageRef::from("  ").is_blank());
    }

    #[test]
    fn test_validate() {
        assert!(ImageRef::from(PNG).validate().is_ok());
        assert!(ImageRef::from("https://cdn.example.com/car.jpg")
            .validate()
            .is_ok());
        assert!(ImageRef::from("data:image/png;base64,@@not base64@@")
            .validate()
            .is_err());
        assert!(ImageRef::from("data:text/plain;base64,aGVsbG8=")
            .validate()
            .is_err());
        assert!(ImageRef::from("car.jpg").validate().is_err());
    }

    #[test]
    fn test_summary_never_contains_payload() {
        let image = ImageRef::from(PNG);
        let summary = image.summary();
        assert!(summary.starts_with("image/png"));
        assert!(!summary.contains("iVBORw0KGgo"));
        assert_eq!(format!("{}", image), summary);
    }

    #[test]
    fn test_sparse_images_accepts_empty_slots() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "sparse_images")]
            images: Vec<ImageRef>,
        }

        let holder: Holder =
            serde_json::from_str(&format!(r#"{{"images": ["{}", "", null]}}"#, PNG)).unwrap();
        assert_eq!(holder.images.len(), 3);
        assert!(holder.images[1].is_blank());
        assert!(holder.images[2].is_blank());

        let empty: Holder = serde_json::from_str(r#"{"images": null}"#).unwrap();
        assert!(empty.images.is_empty());
    }

    #[test]
    fn test_theme_round_trip_names() {
        for theme in BackgroundTheme::ALL {
            let json = serde_json::to_string(&theme).unwrap();
            assert_eq!(json, format!("\"{}\"", theme.as_str()));
        }
        assert!(serde_json::from_str::<BackgroundTheme>("\"moon\"").is_err());
    }
}
