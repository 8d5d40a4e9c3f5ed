use super::PromptPolicy;
use crate::error::{RelayError, Result};
use crate::models::{ContentPart, ImageRef, ModelMessage, PostRequest, RefineRequest, RelayRequest};
use std::fmt::Write;

const CLOSING: &str = "The image should be high-quality, professional, and suitable for social media marketing. \
Style: modern automotive photography, dramatic lighting, professional composition. \
Make it eye-catching and premium looking.";

/// Builds the instruction text and ordered image list for `request` under
/// `policy`. Pure: the same inputs always produce the same message.
pub fn build(policy: PromptPolicy, request: &RelayRequest) -> Result<ModelMessage> {
    match (policy, request) {
        (PromptPolicy::Refine, RelayRequest::Refine(refine)) => build_refine(refine),
        (PromptPolicy::Refine, RelayRequest::Generate(_)) => Err(RelayError::invalid(
            "Refine policy requires a refine request",
        )),
        (_, RelayRequest::Refine(_)) => Err(RelayError::invalid(format!(
            "Policy {} cannot be applied to a refine request",
            policy
        ))),
        (_, RelayRequest::Generate(post)) => build_generate(policy, &post.normalized()),
    }
}

fn validate_images<'a>(images: impl Iterator<Item = &'a ImageRef>) -> Result<()> {
    for image in images {
        image
            .validate()
            .map_err(|e| RelayError::invalid(format!("Invalid image ({}): {}", image.summary(), e)))?;
    }
    Ok(())
}

fn build_generate(policy: PromptPolicy, post: &PostRequest) -> Result<ModelMessage> {
    if post.vehicle_count == Some(0) {
        return Err(RelayError::invalid("Number of vehicles must be at least 1"));
    }
    if post.vehicle_names.is_empty() {
        return Err(RelayError::invalid("Please enter at least one vehicle name"));
    }
    let theme = post
        .background_theme
        .ok_or_else(|| RelayError::invalid("Please select a background theme"))?;
    let template = match (&post.template, policy.requires_template()) {
        (Some(template), true) => Some(template),
        (None, true) => {
            return Err(RelayError::invalid(
                "A dealership template image is required for this post",
            ))
        }
        // Free composition never attaches a template.
        (_, false) => None,
    };
    validate_images(
        template
            .into_iter()
            .chain(post.vehicle_images.iter())
            .chain(post.reference_images()),
    )?;

    let mut text = String::new();
    let subject = match &post.dealership_name {
        Some(name) => format!("professional automotive dealership promotional post for {}", name),
        None => "professional automotive dealership promotional post".to_string(),
    };

    if policy == PromptPolicy::TemplateStrict {
        let _ = write!(
            text,
            "The first attached image is the dealership template. Edit this template in place to create a {}. ",
            subject
        );
        text.push_str("STRICT OUTPUT REQUIREMENTS: ");
        text.push_str("(1) The output dimensions must exactly match the template image's dimensions and aspect ratio. ");
        text.push_str("(2) Zero whitespace: no blank margins, borders, padding or letterboxing anywhere in the image. ");
        text.push_str("(3) Fill the canvas edge-to-edge so the artwork covers the full frame. ");
        text.push_str("(4) The template's logo, address, and footer must remain visible and unaltered. ");
    } else {
        let _ = write!(text, "Create a {}. ", subject);
    }

    let count = post.vehicle_names.len();
    let _ = write!(
        text,
        "Feature {} vehicle{}: {}. ",
        count,
        if count == 1 { "" } else { "s" },
        post.vehicle_names.join(", ")
    );
    let _ = write!(text, "Background setting: {}, {}. ", theme, theme.scene());

    if let Some(offer) = &post.special_feature {
        let _ = write!(text, "Highlight this special offer: {}. ", offer);
    }
    if let Some(keywords) = &post.custom_keywords {
        let _ = write!(text, "Additional details: {}. ", keywords);
    }

    if policy == PromptPolicy::FreeCompose {
        let contact: Vec<&str> = [&post.dealership_address, &post.dealership_phone]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .collect();
        if !contact.is_empty() {
            let _ = write!(text, "Include the dealership contact details: {}. ", contact.join(", "));
        }
    }

    if policy == PromptPolicy::TemplateLoose {
        text.push_str("IMPORTANT: Use the provided dealership template image as the base. Overlay the vehicles and promotional content on this template while preserving the logo, branding, and contact information visible in the template. ");
    }

    if !post.vehicle_images.is_empty() {
        if policy == PromptPolicy::TemplateStrict {
            text.push_str("The vehicle photos attached after the template show the exact vehicles to feature, in the order listed. ");
        } else {
            text.push_str("Use the provided vehicle photos in the composition. ");
        }
    }

    let references = reference_summary(post);
    if !references.is_empty() {
        let _ = write!(
            text,
            "The last attached images are style references ({}). Use them only as inspiration for layout, typography, color and texture; never copy them verbatim. ",
            references
        );
    }

    text.push_str(CLOSING);

    let mut parts = Vec::with_capacity(2 + post.vehicle_images.len());
    if policy == PromptPolicy::TemplateStrict {
        // Canvas goes first.
        parts.extend(template.cloned().map(ContentPart::image));
        parts.push(ContentPart::text(text));
    } else {
        parts.push(ContentPart::text(text));
        parts.extend(template.cloned().map(ContentPart::image));
    }
    parts.extend(post.vehicle_images.iter().cloned().map(ContentPart::image));
    parts.extend(post.reference_images().cloned().map(ContentPart::image));

    Ok(ModelMessage { policy, parts })
}

fn reference_summary(post: &PostRequest) -> String {
    [
        (post.example_images.len(), "example post"),
        (post.banner_images.len(), "banner"),
        (post.style_images.len(), "style asset"),
    ]
    .iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, label)| format!("{} {}{}", n, label, if *n == 1 { "" } else { "s" }))
    .collect::<Vec<_>>()
    .join(", ")
}

fn build_refine(refine: &RefineRequest) -> Result<ModelMessage> {
    if refine.refinement_instruction.trim().is_empty() {
        return Err(RelayError::invalid("Please describe the change you want"));
    }
    if refine.current_image.is_blank() {
        return Err(RelayError::invalid("There is no generated image to refine"));
    }
    let template = refine.template.as_ref().filter(|t| !t.is_blank());
    validate_images(std::iter::once(&refine.current_image).chain(template))?;

    let mut text = String::from(
        "Edit the first attached image, which is the previously generated promotional post. Apply this change: ",
    );
    text.push_str(&refine.refinement_instruction);
    text.push_str("\nKeep everything else about the image unchanged, including its dimensions.");
    if template.is_some() {
        text.push_str(" The dealership template is attached after it for brand consistency; keep its logo, address, and contact details intact.");
    }

    let mut parts = vec![
        ContentPart::text(text),
        ContentPart::image(refine.current_image.clone()),
    ];
    parts.extend(template.cloned().map(ContentPart::image));

    Ok(ModelMessage {
        policy: PromptPolicy::Refine,
        parts,
    })
}
