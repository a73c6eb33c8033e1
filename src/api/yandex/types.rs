//! Yandex ART async generation payloads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerationRequest {
    pub model_uri: String,
    pub generation_options: GenerationOptions,
    pub messages: Vec<PromptMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AspectRatio {
    pub width_ratio: u32,
    pub height_ratio: u32,
}

#[derive(Debug, Serialize)]
pub struct PromptMessage {
    pub weight: u32,
    pub text: String,
}

/// Long-running operation envelope returned by start and status calls.
#[derive(Debug, Deserialize)]
pub struct Operation {
    pub id: Option<String>,
    #[serde(default)]
    pub done: bool,
    pub response: Option<OperationResponse>,
    pub error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
pub struct OperationResponse {
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OperationError {
    pub code: Option<i64>,
    pub message: Option<String>,
}
