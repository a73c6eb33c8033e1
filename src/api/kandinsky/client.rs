use super::types::{
    GenerateParams, GenerationParams, Pipeline, RunResponse, StatusResponse,
};
use crate::api::session::{GenerationSession, JobSlot};
use crate::api::transport::{FormField, HttpSession, RequestOptions, TransportClient};
use crate::api::{decode_list, decode_object, GenerationProvider};
use crate::models::{Credentials, JobStatus};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::StatusCode;

const DEFAULT_BASE_URL: &str = "https://api-key.fusionbrain.ai";
const DEFAULT_STYLES_URL: &str = "https://cdn.fusionbrain.ai/static/styles/key";
const IMAGE_SIZE: u32 = 1024;

/// FusionBrain (Kandinsky) REST client for one generation request.
pub struct KandinskyClient {
    credentials: Option<Credentials>,
    pub(super) transport: TransportClient,
    base_url: String,
    pub(super) styles_url: String,
    session: GenerationSession,
}

impl KandinskyClient {
    pub fn new(credentials: Option<Credentials>) -> Self {
        Self {
            credentials,
            transport: TransportClient::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            styles_url: DEFAULT_STYLES_URL.to_string(),
            session: GenerationSession::new(),
        }
    }

    /// Reuse an externally managed HTTP session; it is left open on drop.
    pub fn with_session(mut self, session: HttpSession) -> Self {
        self.transport = TransportClient::with_session(session);
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_styles_url(mut self, styles_url: String) -> Self {
        self.styles_url = styles_url;
        self
    }

    pub fn transport(&self) -> &TransportClient {
        &self.transport
    }

    pub fn pending_jobs(&self) -> Vec<&str> {
        self.session.pending_ids()
    }

    /// Release the HTTP session if this client opened it.
    pub fn close(&mut self) {
        self.transport.close();
    }

    fn auth_headers(&self) -> Result<Vec<(&'static str, String)>> {
        self.credentials
            .as_ref()
            .map(Credentials::auth_headers)
            .ok_or_else(|| Error::IncorrectUse("User did not provide credentials".to_string()))
    }

    /// Id of the first pipeline the key has access to.
    pub async fn get_pipeline(&mut self) -> Result<String> {
        let headers = self.auth_headers()?;
        let url = format!("{}/key/api/v1/pipelines", self.base_url);
        let data = self
            .transport
            .get(
                StatusCode::OK,
                &url,
                RequestOptions::new().with_headers(headers),
            )
            .await?;

        let pipelines: Vec<Pipeline> = decode_list(data, "pipelines")?;
        pipelines
            .into_iter()
            .next()
            .and_then(|pipeline| pipeline.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::WrongResponseBody("Pipeline does not contain an id".to_string()))
    }

    async fn poll_pending(&mut self, headers: &[(&'static str, String)]) -> Result<()> {
        let Self {
            transport,
            base_url,
            session,
            ..
        } = self;

        for slot in session.slots_mut() {
            let job_id = match slot {
                JobSlot::Pending(id) => id.clone(),
                JobSlot::Resolved(_) => continue,
            };

            let url = format!("{}/key/api/v1/pipeline/status/{}", base_url, job_id);
            let data = transport
                .get(
                    StatusCode::OK,
                    &url,
                    RequestOptions::new().with_headers(headers.to_vec()),
                )
                .await?;
            let response: StatusResponse = decode_object(data, "Status response")?;

            let status = match response.status.as_deref() {
                None | Some("") => {
                    return Err(Error::WrongResponseBody(
                        "Response does not contain a status".to_string(),
                    ))
                }
                Some(status) => classify_status(status),
            };

            match status {
                JobStatus::Pending => {
                    tracing::debug!("Job {} is still processing", job_id);
                }
                JobStatus::Succeeded => {
                    let image = response
                        .result
                        .and_then(|result| result.files)
                        .and_then(|files| files.into_iter().next())
                        .ok_or_else(|| {
                            Error::WrongResponseBody(
                                "Success response does not contain any images".to_string(),
                            )
                        })?;
                    tracing::info!("Job {} finished", job_id);
                    *slot = JobSlot::Resolved(image);
                }
                JobStatus::Failed => {
                    let reason = response
                        .error_description
                        .unwrap_or_else(|| "Server failure".to_string());
                    tracing::error!("Job {} failed: {}", job_id, reason);
                    return Err(Error::ImageGeneration(reason));
                }
                JobStatus::Unrecognized(other) => {
                    return Err(Error::WrongResponseBody(format!(
                        "Unexpected generation status: {}",
                        other
                    )));
                }
            }
        }

        Ok(())
    }
}

pub(crate) fn classify_status(status: &str) -> JobStatus {
    match status {
        "INITIAL" | "PROCESSING" => JobStatus::Pending,
        "DONE" => JobStatus::Succeeded,
        "FAIL" => JobStatus::Failed,
        other => JobStatus::Unrecognized(other.to_string()),
    }
}

#[async_trait]
impl GenerationProvider for KandinskyClient {
    async fn start_generation(&mut self, prompt: &str, style: &str) -> Result<()> {
        let headers = self.auth_headers()?;
        if prompt.trim().is_empty() || style.trim().is_empty() {
            return Err(Error::WrongParameters(
                "Prompt and style must not be empty".to_string(),
            ));
        }

        let pipeline_id = self.get_pipeline().await?;

        let params = GenerationParams {
            kind: "GENERATE".to_string(),
            style: style.to_string(),
            num_images: 1,
            width: IMAGE_SIZE,
            height: IMAGE_SIZE,
            generate_params: GenerateParams {
                query: prompt.to_string(),
            },
        };
        let params = serde_json::to_value(&params)
            .map_err(|e| Error::Unexpected(format!("Failed to encode params: {}", e)))?;

        let url = format!("{}/key/api/v1/pipeline/run", self.base_url);
        let data = self
            .transport
            .post(
                StatusCode::CREATED,
                &url,
                RequestOptions::new().with_headers(headers).with_form(vec![
                    FormField::text("pipeline_id", pipeline_id),
                    FormField::json("params", &params),
                ]),
            )
            .await?;

        let response: RunResponse = decode_object(data, "Run response")?;
        let job_id = response
            .uuid
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::ImageGeneration("Response does not contain a job id".to_string())
            })?;

        tracing::info!("Started Kandinsky job {} (style {})", job_id, style);
        self.session.enqueue(job_id);
        Ok(())
    }

    async fn check_generation(&mut self) -> Result<()> {
        let headers = self.auth_headers()?;
        let result = self.poll_pending(&headers).await;
        self.session.settle();
        result
    }

    fn take_ready_images(&mut self) -> Vec<String> {
        self.session.take_ready()
    }
}
