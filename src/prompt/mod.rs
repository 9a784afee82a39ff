pub mod composer;
pub mod profile;

pub use composer::{GenerationRequest, PredictionInput, PromptComposer, RequestTemplate};
pub use profile::{LineThickness, ProcessingParams, Style, StyleProfile};
