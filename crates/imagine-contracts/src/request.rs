use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub const DEFAULT_IMAGE_MODEL: &str = "grok-imagine-image";
pub const MAX_BATCH_SIZE: u64 = 10;

/// Aspect ratios accepted by the generation endpoint. `Unspecified` is
/// omitted from the wire payload entirely rather than sent as an empty
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    Unspecified,
    Square,
    Landscape16x9,
    Portrait9x16,
    Landscape4x3,
    Portrait3x4,
    Landscape3x2,
    Portrait2x3,
}

impl AspectRatio {
    pub const CHOICES: &'static [&'static str] =
        &["auto", "1:1", "16:9", "9:16", "4:3", "3:4", "3:2", "2:3"];

    pub fn as_str(self) -> Option<&'static str> {
        match self {
            AspectRatio::Unspecified => None,
            AspectRatio::Square => Some("1:1"),
            AspectRatio::Landscape16x9 => Some("16:9"),
            AspectRatio::Portrait9x16 => Some("9:16"),
            AspectRatio::Landscape4x3 => Some("4:3"),
            AspectRatio::Portrait3x4 => Some("3:4"),
            AspectRatio::Landscape3x2 => Some("3:2"),
            AspectRatio::Portrait2x3 => Some("2:3"),
        }
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "" | "auto" => Ok(AspectRatio::Unspecified),
            "1:1" => Ok(AspectRatio::Square),
            "16:9" => Ok(AspectRatio::Landscape16x9),
            "9:16" => Ok(AspectRatio::Portrait9x16),
            "4:3" => Ok(AspectRatio::Landscape4x3),
            "3:4" => Ok(AspectRatio::Portrait3x4),
            "3:2" => Ok(AspectRatio::Landscape3x2),
            "2:3" => Ok(AspectRatio::Portrait2x3),
            other => Err(format!(
                "unknown aspect ratio '{other}' (expected one of {})",
                AspectRatio::CHOICES.join(", ")
            )),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("auto"))
    }
}

/// How the API should return each generated image: a fetchable URL or the
/// bytes inlined as base64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Url,
    B64Json,
}

impl ResponseFormat {
    pub const CHOICES: &'static [&'static str] = &["url", "b64_json"];

    pub fn as_str(self) -> &'static str {
        match self {
            ResponseFormat::Url => "url",
            ResponseFormat::B64Json => "b64_json",
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "url" => Ok(ResponseFormat::Url),
            "b64_json" => Ok(ResponseFormat::B64Json),
            other => Err(format!(
                "unknown response format '{other}' (expected one of {})",
                ResponseFormat::CHOICES.join(", ")
            )),
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound parameters, as the hosting environment hands them over. The
/// api_key may be blank; the engine then falls back to its configured
/// default credential.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub api_key: String,
    pub prompt: String,
    pub model: String,
    pub n: u64,
    pub aspect_ratio: AspectRatio,
    pub response_format: ResponseFormat,
}

impl GenerationParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            api_key: String::new(),
            prompt: prompt.into(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            n: 1,
            aspect_ratio: AspectRatio::Unspecified,
            response_format: ResponseFormat::Url,
        }
    }
}

/// The wire payload for `POST /images/generations`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub n: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<&'static str>,
    pub response_format: ResponseFormat,
}

/// Maps validated parameters onto the wire payload. Deterministic, no side
/// effects: the prompt passes through verbatim, the aspect ratio is omitted
/// when unspecified.
pub fn build_request(params: &GenerationParams) -> ImageGenerationRequest {
    ImageGenerationRequest {
        model: params.model.clone(),
        prompt: params.prompt.clone(),
        n: params.n.max(1),
        aspect_ratio: params.aspect_ratio.as_str(),
        response_format: params.response_format,
    }
}
