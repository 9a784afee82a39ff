//! Prompt composition from user-facing parameters.
//!
//! Given [`ProcessingParams`], looks up the matching [`StyleProfile`] and
//! joins its fragments in a fixed order: base, line thickness, shading,
//! reinforcing keywords. The downstream model is sensitive to token position,
//! so the order must not change.
use serde::Serialize;

use crate::image::ImagePayload;
use crate::prompt::profile::{self, InferenceParams, ProcessingParams, Style, StyleProfile};

/// A composed request minus the image. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestTemplate {
    pub style: Style,
    pub model_version: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub params: InferenceParams,
}

impl RequestTemplate {
    /// Attach the image, producing the body for a prediction create call.
    pub fn to_request(&self, image: &ImagePayload) -> GenerationRequest {
        GenerationRequest {
            version: self.model_version.clone(),
            input: PredictionInput {
                image: image.as_str().to_string(),
                prompt: self.prompt.clone(),
                negative_prompt: self.negative_prompt.clone(),
                params: self.params,
            },
        }
    }
}

/// Body of `POST /predictions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub version: String,
    pub input: PredictionInput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionInput {
    pub image: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(flatten)]
    pub params: InferenceParams,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptComposer;

impl PromptComposer {
    pub fn new() -> Self {
        PromptComposer
    }

    /// Never fails: unknown styles were already folded into the default
    /// profile when the params were parsed.
    pub fn compose(&self, params: &ProcessingParams) -> RequestTemplate {
        let profile = profile::profile(params.style);
        RequestTemplate {
            style: profile.style,
            model_version: profile.model_version.to_string(),
            prompt: self.build_prompt(profile, params),
            negative_prompt: profile.negative_prompt.map(str::to_string),
            params: profile.params,
        }
    }

    pub fn build_prompt(&self, profile: &StyleProfile, params: &ProcessingParams) -> String {
        let mut fragments: Vec<&str> = vec![
            profile.base,
            profile.thickness.get(params.line_thickness),
            profile.shading.get(params.preserve_shading),
        ];
        fragments.extend_from_slice(profile.keywords);
        fragments
            .into_iter()
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn styles(&self) -> &'static [StyleProfile] {
        &profile::STYLE_PROFILES
    }
}
