//! Request/response pipeline for the xAI Imagine image-generation endpoint.

use std::env;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::Rgb32FImage;
use imagine_contracts::error::{GenerateError, CREDENTIAL_ENV};
use imagine_contracts::request::{build_request, GenerationParams, ResponseFormat};
use imagine_contracts::response::{ImageDatum, ImagesResponse};
use reqwest::blocking::Client as HttpClient;
use reqwest::StatusCode;

pub const DEFAULT_API_BASE: &str = "https://api.x.ai/v1";
pub const API_BASE_ENV: &str = "XAI_API_BASE";

const GENERATIONS_PATH: &str = "/images/generations";
const RAW_BODY_PREVIEW_CHARS: usize = 512;

/// Engine configuration. All ambient state (environment credential, endpoint
/// override) is read once in `from_env`; the pipeline itself consults only
/// this struct.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api_base: String,
    /// Fallback credential used when the per-call `api_key` is blank.
    pub api_key: Option<String>,
    /// Timeout for the generation request. Image generation is slow.
    pub request_timeout: Duration,
    /// Timeout for each per-image URL fetch.
    pub fetch_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(120),
            fetch_timeout: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    /// Production defaults, with `XAI_API_BASE` overriding the endpoint and
    /// `XAI_API_KEY` providing the fallback credential.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(base) = non_empty_env(API_BASE_ENV) {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        config.api_key = non_empty_env(CREDENTIAL_ENV);
        config
    }
}

/// Raw transport output: status plus body text. Owned by the transport
/// stage, consumed by the classifier, not retained afterwards.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// One decoded image: an H×W×3 float buffer with values in [0,1], plus the
/// revision note the API attached to the originating item, if any.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub pixels: Rgb32FImage,
    pub revised_prompt: Option<String>,
}

/// The success arm of one pipeline invocation: the ordered batch and the
/// display-ready status line.
#[derive(Debug, Clone)]
pub struct Generation {
    pub images: Vec<DecodedImage>,
    pub status: String,
}

pub struct ImagineEngine {
    config: EngineConfig,
    http: HttpClient,
}

impl ImagineEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            http: HttpClient::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the full pipeline: validate → build → dispatch → classify →
    /// decode each item → assemble. The first failing stage terminates the
    /// invocation with its error; no partial batch is returned.
    pub fn generate(&self, params: &GenerationParams) -> Result<Generation, GenerateError> {
        let api_key = self.resolve_api_key(&params.api_key)?;
        let request = build_request(params);
        let raw = self.dispatch(&request, &api_key)?;
        let items = classify_response(&raw)?;
        tracing::debug!(count = items.len(), "decoding result items");

        let mut images = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            images.push(self.decode_item(index, item, params.response_format)?);
        }
        assemble_batch(images)
    }

    /// Host boundary: never fails. On success returns the batch and status;
    /// on failure an empty batch and an operator-readable explanation.
    pub fn run(&self, params: &GenerationParams) -> (Vec<DecodedImage>, String) {
        match self.generate(params) {
            Ok(generation) => (generation.images, generation.status),
            Err(error) => {
                tracing::warn!(%error, "image generation failed");
                (Vec::new(), failure_status(&error))
            }
        }
    }

    /// Credential precondition: the explicit parameter wins, the configured
    /// fallback covers a blank one, and a blank result short-circuits before
    /// any network call.
    fn resolve_api_key(&self, explicit: &str) -> Result<String, GenerateError> {
        let explicit = explicit.trim();
        if !explicit.is_empty() {
            return Ok(explicit.to_string());
        }
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or(GenerateError::MissingCredential)
    }

    fn dispatch(
        &self,
        request: &imagine_contracts::request::ImageGenerationRequest,
        api_key: &str,
    ) -> Result<RawResponse, GenerateError> {
        let endpoint = format!("{}{}", self.config.api_base, GENERATIONS_PATH);
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(api_key)
            .timeout(self.config.request_timeout)
            .json(request)
            .send()
            .map_err(|err| GenerateError::Transport(error_chain_text(&err)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|err| GenerateError::Transport(error_chain_text(&err)))?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "generation response received");
        Ok(RawResponse { status, body })
    }

    fn decode_item(
        &self,
        index: usize,
        item: &ImageDatum,
        format: ResponseFormat,
    ) -> Result<DecodedImage, GenerateError> {
        let bytes = match format {
            ResponseFormat::Url => {
                let url = item
                    .url
                    .as_deref()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .ok_or(GenerateError::MissingImageData {
                        index,
                        field: "url",
                    })?;
                self.fetch_image(index, url)?
            }
            ResponseFormat::B64Json => {
                let encoded = item
                    .b64_json
                    .as_deref()
                    .filter(|value| !value.is_empty())
                    .ok_or(GenerateError::MissingImageData {
                        index,
                        field: "b64_json",
                    })?;
                BASE64
                    .decode(encoded.as_bytes())
                    .map_err(|err| GenerateError::Decode {
                        index,
                        message: format!("base64 decode failed: {err}"),
                    })?
            }
        };
        let pixels = decode_pixels(index, &bytes)?;
        Ok(DecodedImage {
            pixels,
            revised_prompt: item.revised_prompt.clone(),
        })
    }

    fn fetch_image(&self, index: usize, url: &str) -> Result<Vec<u8>, GenerateError> {
        let response = self
            .http
            .get(url)
            .timeout(self.config.fetch_timeout)
            .send()
            .map_err(|err| GenerateError::Fetch {
                index,
                message: error_chain_text(&err),
            })?;
        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(GenerateError::Fetch {
                index,
                message: format!(
                    "HTTP {code}: {}",
                    truncate_text(body.trim(), RAW_BODY_PREVIEW_CHARS)
                ),
            });
        }
        let bytes = response.bytes().map_err(|err| GenerateError::Fetch {
            index,
            message: error_chain_text(&err),
        })?;
        Ok(bytes.to_vec())
    }
}

/// Classifies raw transport output per the documented precedence: an
/// embedded `error` object wins over the HTTP status (some gateways attach
/// one to a 200), then the status itself, then the empty-result refusal
/// heuristic. Pure over its input; classifying the same response twice
/// yields the same outcome.
pub fn classify_response(raw: &RawResponse) -> Result<Vec<ImageDatum>, GenerateError> {
    let parsed: Option<ImagesResponse> = serde_json::from_str(&raw.body).ok();

    if let Some(error) = parsed.as_ref().and_then(|body| body.error.as_ref()) {
        return Err(GenerateError::Api {
            kind: error
                .kind
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            message: error
                .message
                .clone()
                .unwrap_or_else(|| "Unknown API error".to_string()),
            raw: raw.body.clone(),
        });
    }

    if !raw.status.is_success() {
        let message = if raw.body.trim().is_empty() {
            format!("HTTP {} - No details", raw.status.as_u16())
        } else {
            truncate_text(raw.body.trim(), RAW_BODY_PREVIEW_CHARS)
        };
        return Err(GenerateError::Api {
            kind: "http".to_string(),
            message,
            raw: raw.body.clone(),
        });
    }

    let Some(body) = parsed else {
        return Err(GenerateError::Api {
            kind: "http".to_string(),
            message: "response was not valid JSON".to_string(),
            raw: raw.body.clone(),
        });
    };

    let items = body.data.unwrap_or_default();
    if items.is_empty() {
        // An empty result with no revision note is presumptively a
        // content-policy refusal.
        return Err(GenerateError::Empty {
            possible_refusal: body.revised_prompt.is_none(),
            raw: raw.body.clone(),
        });
    }
    Ok(items)
}

fn decode_pixels(index: usize, bytes: &[u8]) -> Result<Rgb32FImage, GenerateError> {
    let decoded = image::load_from_memory(bytes).map_err(|err| GenerateError::Decode {
        index,
        message: err.to_string(),
    })?;
    // to_rgb32f normalizes alpha/grayscale sources to three channels and
    // rescales integer samples to [0,1].
    Ok(decoded.to_rgb32f())
}

/// Concatenates decoded images in response order and composes the status
/// line, labeling every revision note per item.
fn assemble_batch(images: Vec<DecodedImage>) -> Result<Generation, GenerateError> {
    if images.is_empty() {
        return Err(GenerateError::Empty {
            possible_refusal: true,
            raw: String::new(),
        });
    }

    let mut status = format!("Generated {} image(s) successfully", images.len());
    for (index, image) in images.iter().enumerate() {
        if let Some(note) = &image.revised_prompt {
            status.push_str(&format!("\nImage {} prompt was revised: {note}", index + 1));
        }
    }
    Ok(Generation { images, status })
}

fn failure_status(error: &GenerateError) -> String {
    match error {
        GenerateError::MissingCredential => format!(
            "No API key provided. Pass api_key or set {CREDENTIAL_ENV}."
        ),
        GenerateError::Empty {
            possible_refusal: true,
            ..
        } => "The API returned no images. The prompt may have been declined by the content filter."
            .to_string(),
        GenerateError::Empty {
            possible_refusal: false,
            ..
        } => "The API returned no images.".to_string(),
        other => format!("Image generation failed: {other}"),
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn error_chain_text(err: &dyn std::error::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if parts.last().map(|existing| existing != &text).unwrap_or(true) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(" | caused by: ")
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
