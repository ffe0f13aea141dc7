pub mod error;
pub mod models;
pub mod nodes;
pub mod request;
pub mod response;

pub use error::GenerateError;
pub use request::{
    build_request, AspectRatio, GenerationParams, ImageGenerationRequest, ResponseFormat,
};
pub use response::{ApiErrorBody, ImageDatum, ImagesResponse};
