use thiserror::Error;

/// Environment variable consulted by `EngineConfig::from_env` when no
/// explicit credential is supplied.
pub const CREDENTIAL_ENV: &str = "XAI_API_KEY";

/// Terminal failure taxonomy for one pipeline invocation. Every network,
/// parse, and decode fault is converted into exactly one of these variants
/// at the boundary nearest its origin; nothing panics through the pipeline.
///
/// `raw` fields carry the untruncated response body for operator debugging.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    #[error("no API key provided; pass one explicitly or set {CREDENTIAL_ENV}")]
    MissingCredential,

    #[error("API error ({kind}): {message}")]
    Api {
        kind: String,
        message: String,
        raw: String,
    },

    #[error("the response contained no images")]
    Empty { possible_refusal: bool, raw: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("image {index}: download failed: {message}")]
    Fetch { index: usize, message: String },

    #[error("image {index}: decode failed: {message}")]
    Decode { index: usize, message: String },

    #[error("image {index}: response item is missing the '{field}' field")]
    MissingImageData { index: usize, field: &'static str },
}
