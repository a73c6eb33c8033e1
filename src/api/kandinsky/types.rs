//! FusionBrain request/response payloads.

use serde::{Deserialize, Serialize};

/// One entry of `GET /key/api/v1/pipelines`.
#[derive(Debug, Deserialize)]
pub struct Pipeline {
    pub id: Option<String>,
}

/// JSON `params` part of a pipeline run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    #[serde(rename = "type")]
    pub kind: String,
    pub style: String,
    pub num_images: u32,
    pub width: u32,
    pub height: u32,
    pub generate_params: GenerateParams,
}

#[derive(Debug, Serialize)]
pub struct GenerateParams {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct RunResponse {
    pub uuid: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: Option<String>,
    pub result: Option<GenerationResult>,
    pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerationResult {
    pub files: Option<Vec<String>>,
}

/// Entry of the public style table.
#[derive(Debug, Deserialize)]
pub struct RemoteStyle {
    #[serde(rename = "titleEn")]
    pub title: String,
    pub name: String,
}
