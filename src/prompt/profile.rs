//! Style profiles: one static table row per selectable rendering style.
//!
//! Adding a style means adding a [`Style`] variant and a row to
//! [`STYLE_PROFILES`].
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Style {
    Pencil,
    Modern,
    Experimental,
}

impl Style {
    pub const ALL: [Style; 3] = [Style::Pencil, Style::Modern, Style::Experimental];

    /// Unknown keys fall back to [`Style::Pencil`].
    pub fn from_key(key: &str) -> Style {
        match key.trim().to_ascii_lowercase().as_str() {
            "modern" | "modern-sketch" => Style::Modern,
            "experimental" | "test-sketch" => Style::Experimental,
            _ => Style::Pencil,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Style::Pencil => "pencil",
            Style::Modern => "modern",
            Style::Experimental => "experimental",
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Style::Pencil
    }
}

impl From<String> for Style {
    fn from(key: String) -> Self {
        Style::from_key(&key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum LineThickness {
    Thin,
    Normal,
    Thick,
}

impl LineThickness {
    pub const ALL: [LineThickness; 3] = [LineThickness::Thin, LineThickness::Normal, LineThickness::Thick];

    /// Unknown values are treated as [`LineThickness::Normal`].
    pub fn from_key(key: &str) -> LineThickness {
        match key.trim().to_ascii_lowercase().as_str() {
            "thin" => LineThickness::Thin,
            "thick" => LineThickness::Thick,
            _ => LineThickness::Normal,
        }
    }
}

impl Default for LineThickness {
    fn default() -> Self {
        LineThickness::Normal
    }
}

impl From<String> for LineThickness {
    fn from(key: String) -> Self {
        LineThickness::from_key(&key)
    }
}

/// User-chosen parameters for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingParams {
    #[serde(default)]
    pub line_thickness: LineThickness,
    #[serde(default)]
    pub preserve_shading: bool,
    #[serde(default)]
    pub style: Style,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThicknessFragments {
    pub thin: &'static str,
    pub normal: &'static str,
    pub thick: &'static str,
}

impl ThicknessFragments {
    pub fn get(&self, thickness: LineThickness) -> &'static str {
        match thickness {
            LineThickness::Thin => self.thin,
            LineThickness::Normal => self.normal,
            LineThickness::Thick => self.thick,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingFragments {
    pub preserve: &'static str,
    pub suppress: &'static str,
}

impl ShadingFragments {
    pub fn get(&self, preserve: bool) -> &'static str {
        if preserve {
            self.preserve
        } else {
            self.suppress
        }
    }
}

/// Inference parameters sent verbatim inside the prediction `input`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InferenceParams {
    pub prompt_strength: f32,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub num_outputs: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lora_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_quality: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub go_fast: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleProfile {
    pub style: Style,
    pub model_version: &'static str,
    pub negative_prompt: Option<&'static str>,
    pub base: &'static str,
    pub thickness: ThicknessFragments,
    pub shading: ShadingFragments,
    pub keywords: &'static [&'static str],
    pub params: InferenceParams,
}

const SKETCH_LORA_VERSION: &str = "32d7a493bcbd5212bf43e6a3f48b7ba716f9f159eabd13ccdbe5d0bcd747ff08";
const SDXL_SKETCH_VERSION: &str = "8307ba5394e5ad08f885a5d9df48f9ec3d16c2dc124209c2ca3eb9077e32d2d5";

const NO_THICKNESS: ThicknessFragments = ThicknessFragments { thin: "", normal: "", thick: "" };
const NO_SHADING: ShadingFragments = ShadingFragments { preserve: "", suppress: "" };

pub static STYLE_PROFILES: [StyleProfile; 3] = [
    StyleProfile {
        style: Style::Pencil,
        model_version: SKETCH_LORA_VERSION,
        negative_prompt: None,
        // TOK is the trigger word of the sketch LoRA.
        base: "TOK black and white pencil sketch, simple black line drawing, monochrome coloring book style",
        thickness: ThicknessFragments {
            thin: "fine delicate black lines, light thin pencil strokes",
            normal: "medium weight black lines, clear pencil strokes",
            thick: "bold thick black lines, dark heavy pencil strokes, strong black outlines",
        },
        shading: ShadingFragments {
            preserve: "subtle black and white shading, soft monochrome gradients, artistic sketch",
            suppress: "clean black outlines only, no shading, simple black line art",
        },
        keywords: &[
            "pure black and white, no color, monochrome, minimalist hand-drawn style",
            "coloring book page, suitable for children coloring, clear black boundaries",
        ],
        params: InferenceParams {
            prompt_strength: 0.75,
            num_inference_steps: 20,
            guidance_scale: 3.0,
            num_outputs: 1,
            model: Some("dev"),
            lora_scale: Some(1.0),
            aspect_ratio: Some("1:1"),
            width: None,
            height: None,
            output_format: Some("webp"),
            output_quality: Some(90),
            go_fast: Some(false),
            scheduler: None,
        },
    },
    StyleProfile {
        style: Style::Modern,
        model_version: SDXL_SKETCH_VERSION,
        negative_prompt: Some(
            "color, colorful, colored, rainbow, red, blue, green, yellow, orange, purple, pink, complex, detailed, realistic, photographic, cluttered, messy, painting, watercolor, oil painting, digital art, 3d render",
        ),
        base: "black and white sketch, line drawing, coloring book style, monochrome line art, clean black lines on white background",
        thickness: ThicknessFragments {
            thin: "fine thin lines, delicate black strokes, minimal line weight",
            normal: "medium black lines, balanced stroke weight",
            thick: "bold thick black lines, strong dark outlines, heavy black strokes",
        },
        shading: ShadingFragments {
            preserve: "subtle black and white gradients, monochrome shading",
            suppress: "pure black line art, no shading, simple black outlines only",
        },
        keywords: &[
            "pure black and white, no color, monochrome, minimalist",
            "coloring book page, simple design, clear black boundaries",
        ],
        params: InferenceParams {
            prompt_strength: 0.75,
            num_inference_steps: 30,
            guidance_scale: 5.0,
            num_outputs: 1,
            model: None,
            lora_scale: None,
            aspect_ratio: None,
            width: Some(512),
            height: Some(512),
            output_format: None,
            output_quality: None,
            go_fast: None,
            scheduler: Some("K_EULER"),
        },
    },
    StyleProfile {
        style: Style::Experimental,
        model_version: SKETCH_LORA_VERSION,
        negative_prompt: None,
        base: "Transform the image into a beautiful, simple pencil-sketch drawing.",
        thickness: NO_THICKNESS,
        shading: NO_SHADING,
        keywords: &[],
        params: InferenceParams {
            prompt_strength: 0.8,
            num_inference_steps: 28,
            guidance_scale: 3.5,
            num_outputs: 1,
            model: Some("dev"),
            lora_scale: Some(1.0),
            aspect_ratio: Some("1:1"),
            width: None,
            height: None,
            output_format: Some("webp"),
            output_quality: Some(90),
            go_fast: Some(false),
            scheduler: None,
        },
    },
];

/// Look up the profile for `style`. Every [`Style`] has a row.
pub fn profile(style: Style) -> &'static StyleProfile {
    STYLE_PROFILES
        .iter()
        .find(|p| p.style == style)
        .unwrap_or(&STYLE_PROFILES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_keys_and_unknowns_map_to_styles() {
        assert_eq!(Style::from_key("pencil-sketch"), Style::Pencil);
        assert_eq!(Style::from_key("modern-sketch"), Style::Modern);
        assert_eq!(Style::from_key("test-sketch"), Style::Experimental);
        assert_eq!(Style::from_key("Modern"), Style::Modern);
        assert_eq!(Style::from_key("watercolor"), Style::Pencil);
        assert_eq!(LineThickness::from_key("extra-bold"), LineThickness::Normal);
    }

    #[test]
    fn every_style_has_its_own_row() {
        for style in Style::ALL {
            assert_eq!(profile(style).style, style);
        }
    }

    #[test]
    fn params_deserialize_with_fallbacks() {
        let p: ProcessingParams =
            serde_json::from_str(r#"{"lineThickness":"thick","preserveShading":true,"style":"nope"}"#).unwrap();
        assert_eq!(p.style, Style::Pencil);
        assert_eq!(p.line_thickness, LineThickness::Thick);
        assert!(p.preserve_shading);

        let p: ProcessingParams = serde_json::from_str("{}").unwrap();
        assert_eq!(p, ProcessingParams::default());
    }
}
