use super::types::{
    AspectRatio, GenerationOptions, ImageGenerationRequest, Operation, PromptMessage,
};
use crate::api::session::{GenerationSession, JobSlot};
use crate::api::transport::{HttpSession, RequestOptions, TransportClient};
use crate::api::{decode_object, GenerationProvider};
use crate::models::JobStatus;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt;

const DEFAULT_BASE_URL: &str = "https://llm.api.cloud.yandex.net";

/// Cloud folder plus API key for the Yandex foundation models API.
#[derive(Clone)]
pub struct FolderCredentials {
    folder_id: String,
    api_key: String,
}

impl FolderCredentials {
    pub fn new(folder_id: impl Into<String>, api_key: impl Into<String>) -> Option<Self> {
        let folder_id = folder_id.into();
        let api_key = api_key.into();
        if folder_id.is_empty() || api_key.is_empty() {
            return None;
        }
        Some(Self { folder_id, api_key })
    }

    fn model_uri(&self) -> String {
        format!("art://{}/yandex-art/latest", self.folder_id)
    }

    fn auth_headers(&self) -> Vec<(&'static str, String)> {
        vec![("Authorization", format!("Api-Key {}", self.api_key))]
    }
}

impl fmt::Debug for FolderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FolderCredentials")
            .field("folder_id", &self.folder_id)
            .finish_non_exhaustive()
    }
}

/// Yandex ART client; each job is a long-running cloud operation.
pub struct YandexArtClient {
    credentials: Option<FolderCredentials>,
    transport: TransportClient,
    base_url: String,
    width_ratio: u32,
    height_ratio: u32,
    session: GenerationSession,
}

impl YandexArtClient {
    pub fn new(credentials: Option<FolderCredentials>) -> Self {
        Self {
            credentials,
            transport: TransportClient::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            width_ratio: 2,
            height_ratio: 1,
            session: GenerationSession::new(),
        }
    }

    pub fn with_session(mut self, session: HttpSession) -> Self {
        self.transport = TransportClient::with_session(session);
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn transport(&self) -> &TransportClient {
        &self.transport
    }

    pub fn pending_jobs(&self) -> Vec<&str> {
        self.session.pending_ids()
    }

    fn credentials(&self) -> Result<&FolderCredentials> {
        self.credentials
            .as_ref()
            .ok_or_else(|| Error::IncorrectUse("User did not provide credentials".to_string()))
    }

    async fn poll_pending(&mut self, headers: &[(&'static str, String)]) -> Result<()> {
        let Self {
            transport,
            base_url,
            session,
            ..
        } = self;

        for slot in session.slots_mut() {
            let operation_id = match slot {
                JobSlot::Pending(id) => id.clone(),
                JobSlot::Resolved(_) => continue,
            };

            let url = format!("{}/operations/{}", base_url, operation_id);
            let data = transport
                .get(
                    StatusCode::OK,
                    &url,
                    RequestOptions::new().with_headers(headers.to_vec()),
                )
                .await?;
            let operation: Operation = decode_object(data, "Operation")?;

            match operation_status(&operation) {
                JobStatus::Pending => {
                    tracing::debug!("Operation {} is still running", operation_id);
                }
                JobStatus::Succeeded => {
                    let image = operation
                        .response
                        .and_then(|response| response.image)
                        .filter(|image| !image.is_empty())
                        .ok_or_else(|| {
                            Error::WrongResponseBody(
                                "Finished operation does not contain an image".to_string(),
                            )
                        })?;
                    tracing::info!("Operation {} finished", operation_id);
                    *slot = JobSlot::Resolved(image);
                }
                JobStatus::Failed => {
                    let reason = operation
                        .error
                        .map(|error| {
                            format!(
                                "code {}: {}",
                                error.code.unwrap_or_default(),
                                error.message.unwrap_or_else(|| "unknown".to_string())
                            )
                        })
                        .unwrap_or_else(|| "Server failure".to_string());
                    tracing::error!("Operation {} failed: {}", operation_id, reason);
                    return Err(Error::ImageGeneration(reason));
                }
                JobStatus::Unrecognized(state) => {
                    return Err(Error::WrongResponseBody(format!(
                        "Operation finished in unexpected state: {}",
                        state
                    )));
                }
            }
        }

        Ok(())
    }
}

fn operation_status(operation: &Operation) -> JobStatus {
    if !operation.done {
        return JobStatus::Pending;
    }
    match (&operation.error, &operation.response) {
        (Some(_), _) => JobStatus::Failed,
        (None, Some(_)) => JobStatus::Succeeded,
        (None, None) => JobStatus::Unrecognized("done without response or error".to_string()),
    }
}

#[async_trait]
impl GenerationProvider for YandexArtClient {
    async fn start_generation(&mut self, prompt: &str, style: &str) -> Result<()> {
        let credentials = self.credentials()?.clone();
        if prompt.trim().is_empty() || style.trim().is_empty() {
            return Err(Error::WrongParameters(
                "Prompt and style must not be empty".to_string(),
            ));
        }

        let request = ImageGenerationRequest {
            model_uri: credentials.model_uri(),
            generation_options: GenerationOptions {
                aspect_ratio: AspectRatio {
                    width_ratio: self.width_ratio,
                    height_ratio: self.height_ratio,
                },
            },
            messages: vec![PromptMessage {
                weight: 1,
                text: prompt.to_string(),
            }],
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| Error::Unexpected(format!("Failed to encode request: {}", e)))?;

        let url = format!("{}/foundationModels/v1/imageGenerationAsync", self.base_url);
        let data = self
            .transport
            .post(
                StatusCode::OK,
                &url,
                RequestOptions::new()
                    .with_headers(credentials.auth_headers())
                    .with_json(body),
            )
            .await?;

        let operation: Operation = decode_object(data, "Operation")?;
        let operation_id = operation
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::ImageGeneration("Response does not contain an operation id".to_string())
            })?;

        tracing::info!("Started Yandex ART operation {}", operation_id);
        self.session.enqueue(operation_id);
        Ok(())
    }

    async fn check_generation(&mut self) -> Result<()> {
        let headers = self.credentials()?.auth_headers();
        let result = self.poll_pending(&headers).await;
        self.session.settle();
        result
    }

    fn take_ready_images(&mut self) -> Vec<String> {
        self.session.take_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer) -> YandexArtClient {
        YandexArtClient::new(FolderCredentials::new("b1gfolder", "secret-key"))
            .with_base_url(server.uri())
    }

    async fn mount_operation(server: &MockServer, id: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/operations/{}", id)))
            .and(header("Authorization", "Api-Key secret-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_start_generation_posts_model_uri_and_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/foundationModels/v1/imageGenerationAsync"))
            .and(header("Authorization", "Api-Key secret-key"))
            .and(body_string_contains("art://b1gfolder/yandex-art/latest"))
            .and(body_string_contains("\"text\":\"a red fox\""))
            .and(body_string_contains("\"widthRatio\":2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "op-1", "done": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = make_client(&server);
        client.start_generation("a red fox", "basic").await.unwrap();

        assert_eq!(client.pending_jobs(), vec!["op-1"]);
    }

    #[tokio::test]
    async fn test_start_generation_without_operation_id_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/foundationModels/v1/imageGenerationAsync"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "done": false })),
            )
            .mount(&server)
            .await;

        let mut client = make_client(&server);
        let err = client.start_generation("fox", "basic").await.unwrap_err();
        assert!(matches!(err, Error::ImageGeneration(_)));
    }

    #[tokio::test]
    async fn test_missing_credentials_is_incorrect_use() {
        let mut client = YandexArtClient::new(FolderCredentials::new("", "key"));
        assert!(matches!(
            client.start_generation("fox", "basic").await.unwrap_err(),
            Error::IncorrectUse(_)
        ));
        assert!(matches!(
            client.check_generation().await.unwrap_err(),
            Error::IncorrectUse(_)
        ));
    }

    #[tokio::test]
    async fn test_check_generation_collects_finished_operations() {
        let server = MockServer::start().await;
        mount_operation(&server, "op-1", serde_json::json!({ "id": "op-1", "done": false })).await;
        mount_operation(
            &server,
            "op-2",
            serde_json::json!({
                "id": "op-2",
                "done": true,
                "response": { "image": "QmFzZTY0", "modelVersion": "1.0" }
            }),
        )
        .await;

        let mut client = make_client(&server);
        client.session.enqueue("op-1".to_string());
        client.session.enqueue("op-2".to_string());

        client.check_generation().await.unwrap();

        assert_eq!(client.pending_jobs(), vec!["op-1"]);
        assert_eq!(client.take_ready_images(), vec!["QmFzZTY0"]);
    }

    #[tokio::test]
    async fn test_failed_operation_is_generation_error() {
        let server = MockServer::start().await;
        mount_operation(
            &server,
            "op-1",
            serde_json::json!({
                "id": "op-1",
                "done": true,
                "error": { "code": 3, "message": "it is not possible to generate an image" }
            }),
        )
        .await;

        let mut client = make_client(&server);
        client.session.enqueue("op-1".to_string());

        let err = client.check_generation().await.unwrap_err();
        assert!(matches!(err, Error::ImageGeneration(ref reason) if reason.contains("code 3")));
    }

    #[tokio::test]
    async fn test_done_without_result_is_wrong_response_body() {
        let server = MockServer::start().await;
        mount_operation(&server, "op-1", serde_json::json!({ "id": "op-1", "done": true })).await;

        let mut client = make_client(&server);
        client.session.enqueue("op-1".to_string());

        let err = client.check_generation().await.unwrap_err();
        assert!(matches!(err, Error::WrongResponseBody(_)));
    }

    #[test]
    fn test_credentials_debug_hides_api_key() {
        let creds = FolderCredentials::new("b1g", "very-secret").unwrap();
        assert!(!format!("{:?}", creds).contains("very-secret"));
    }
}
