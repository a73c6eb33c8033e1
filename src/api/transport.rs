//! Low-level request executor shared by every provider.
//!
//! One call is one HTTP request with a required status code. Responses are
//! returned as parsed JSON (object or array). Nothing here retries.

use crate::{Error, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Cloneable handle to an HTTP connection pool with an explicit closed flag.
///
/// Clones share the flag, so whoever holds a clone can observe when the
/// owning [`TransportClient`] released it.
#[derive(Clone)]
pub struct HttpSession {
    client: Client,
    closed: Arc<AtomicBool>,
}

impl HttpSession {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            tracing::error!("Failed to create HTTP session: {}", e);
            Error::Unexpected(format!("Failed to create HTTP session: {}", e))
        })?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("HTTP session closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// One field of a multipart form body.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub value: String,
    pub content_type: Option<String>,
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            content_type: None,
        }
    }

    pub fn json(name: impl Into<String>, value: &Value) -> Self {
        Self {
            name: name.into(),
            value: value.to_string(),
            content_type: Some("application/json".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<FormField>),
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(&'static str, String)>,
    pub body: RequestBody,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_headers(mut self, headers: Vec<(&'static str, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_form(mut self, fields: Vec<FormField>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }
}

/// Executes requests over a session it either borrows or owns.
///
/// A session passed to [`TransportClient::with_session`] is never closed by
/// this client. Without one, a session is created on first use and closed
/// when the client is closed or dropped.
pub struct TransportClient {
    session: Option<HttpSession>,
    owns_session: bool,
}

impl TransportClient {
    pub fn new() -> Self {
        Self {
            session: None,
            owns_session: false,
        }
    }

    pub fn with_session(session: HttpSession) -> Self {
        Self {
            session: Some(session),
            owns_session: false,
        }
    }

    pub fn owns_session(&self) -> bool {
        self.owns_session
    }

    /// The session currently in use, if one was supplied or created.
    pub fn current_session(&self) -> Option<&HttpSession> {
        self.session.as_ref()
    }

    /// Returns a live session, opening an owned one when none is usable.
    pub fn session(&mut self) -> Result<&HttpSession> {
        let session = match self.session.take() {
            Some(session) if !session.is_closed() => session,
            _ => {
                let session = HttpSession::new()?;
                tracing::debug!("Opened new HTTP session");
                self.owns_session = true;
                session
            }
        };
        let session: &HttpSession = self.session.insert(session);
        Ok(session)
    }

    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            if self.owns_session {
                session.close();
            }
        }
    }

    pub async fn request(
        &mut self,
        method: Method,
        required_status: StatusCode,
        url: &str,
        options: RequestOptions,
    ) -> Result<Value> {
        let client = self.session()?.client().clone();
        tracing::debug!("{} {}", method, url);

        let mut builder = client.request(method.clone(), url);
        for (name, value) in options.headers {
            builder = builder.header(name, value);
        }
        builder = match options.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Form(fields) => builder.multipart(build_form(fields)?),
        };

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Failed to send {} request to {}: {}", method, url, e);
            Error::RequestFailed(format!("Unable to complete the request: {}", e))
        })?;

        let status = response.status();
        if status != required_status {
            tracing::error!(
                "Unexpected status from {} (expected {}, got {})",
                url,
                required_status,
                status
            );
            return Err(Error::RequestFailed(format!(
                "Wrong response status: {}",
                status
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::error!("Failed to read response body from {}: {}", url, e);
            Error::RequestFailed(format!("Unable to read the response body: {}", e))
        })?;

        match serde_json::from_slice::<Value>(&body) {
            Ok(data @ (Value::Object(_) | Value::Array(_))) => Ok(data),
            Ok(_) => Err(Error::RequestFailed(
                "Response body is not a JSON object or array".to_string(),
            )),
            Err(e) => {
                tracing::error!("Failed to parse response from {}: {}", url, e);
                Err(Error::RequestFailed(format!(
                    "Unable to parse the response body: {}",
                    e
                )))
            }
        }
    }

    pub async fn get(
        &mut self,
        required_status: StatusCode,
        url: &str,
        options: RequestOptions,
    ) -> Result<Value> {
        self.request(Method::GET, required_status, url, options)
            .await
    }

    pub async fn post(
        &mut self,
        required_status: StatusCode,
        url: &str,
        options: RequestOptions,
    ) -> Result<Value> {
        self.request(Method::POST, required_status, url, options)
            .await
    }
}

impl Default for TransportClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TransportClient {
    fn drop(&mut self) {
        self.close();
    }
}

fn build_form(fields: Vec<FormField>) -> Result<Form> {
    let mut form = Form::new();
    for field in fields {
        let mut part = Part::text(field.value);
        if let Some(content_type) = field.content_type {
            part = part.mime_str(&content_type).map_err(|e| {
                Error::Unexpected(format!("Invalid content type {}: {}", content_type, e))
            })?;
        }
        form = form.part(field.name, part);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_get(server: &MockServer, route: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_request_returns_parsed_object() {
        let server = MockServer::start().await;
        mount_get(
            &server,
            "/data",
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "key": "value" })),
        )
        .await;

        let mut transport = TransportClient::new();
        let data = transport
            .get(
                StatusCode::OK,
                &format!("{}/data", server.uri()),
                RequestOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(data, serde_json::json!({ "key": "value" }));
    }

    #[tokio::test]
    async fn test_wrong_status_is_request_failed() {
        let server = MockServer::start().await;
        mount_get(&server, "/data", ResponseTemplate::new(400)).await;

        let mut transport = TransportClient::new();
        let err = transport
            .get(
                StatusCode::OK,
                &format!("{}/data", server.uri()),
                RequestOptions::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RequestFailed(_)));
        assert!(err.to_string().contains("400"));
    }

    #[tokio::test]
    async fn test_success_status_other_than_required_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/run"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let mut transport = TransportClient::new();
        let err = transport
            .post(
                StatusCode::CREATED,
                &format!("{}/run", server.uri()),
                RequestOptions::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_unparsable_body_is_request_failed() {
        let server = MockServer::start().await;
        mount_get(
            &server,
            "/data",
            ResponseTemplate::new(200).set_body_string("invalid"),
        )
        .await;

        let mut transport = TransportClient::new();
        let err = transport
            .get(
                StatusCode::OK,
                &format!("{}/data", server.uri()),
                RequestOptions::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_scalar_body_is_request_failed() {
        let server = MockServer::start().await;
        mount_get(
            &server,
            "/data",
            ResponseTemplate::new(200).set_body_string("42"),
        )
        .await;

        let mut transport = TransportClient::new();
        let err = transport
            .get(
                StatusCode::OK,
                &format!("{}/data", server.uri()),
                RequestOptions::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_connection_error_is_request_failed() {
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };

        let mut transport = TransportClient::new();
        let err = transport
            .get(
                StatusCode::OK,
                &format!("{}/data", uri),
                RequestOptions::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_headers_and_form_fields_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/run"))
            .and(header("X-Key", "Key abc"))
            .and(body_string_contains("name=\"pipeline_id\""))
            .and(body_string_contains("\"query\":\"fox\""))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([1, 2])))
            .expect(1)
            .mount(&server)
            .await;

        let mut transport = TransportClient::new();
        let data = transport
            .post(
                StatusCode::CREATED,
                &format!("{}/run", server.uri()),
                RequestOptions::new()
                    .with_headers(vec![("X-Key", "Key abc".to_string())])
                    .with_form(vec![
                        FormField::text("pipeline_id", "p1"),
                        FormField::json("params", &serde_json::json!({ "query": "fox" })),
                    ]),
            )
            .await
            .unwrap();

        assert_eq!(data, serde_json::json!([1, 2]));
    }

    #[tokio::test]
    async fn test_owned_session_is_created_lazily_and_closed_on_drop() {
        let mut transport = TransportClient::new();
        assert!(transport.current_session().is_none());

        let handle = transport.session().unwrap().clone();
        assert!(transport.owns_session());
        assert!(!handle.is_closed());

        drop(transport);
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn test_external_session_is_never_closed() {
        let external = HttpSession::new().unwrap();
        let mut transport = TransportClient::with_session(external.clone());

        transport.session().unwrap();
        assert!(!transport.owns_session());

        drop(transport);
        assert!(!external.is_closed());
    }

    #[tokio::test]
    async fn test_closed_external_session_is_replaced_by_owned_one() {
        let external = HttpSession::new().unwrap();
        external.close();
        let mut transport = TransportClient::with_session(external);

        let handle = transport.session().unwrap().clone();
        assert!(!handle.is_closed());
        assert!(transport.owns_session());

        transport.close();
        assert!(handle.is_closed());
        assert!(transport.current_session().is_none());
    }

    #[tokio::test]
    async fn test_session_released_when_request_errors() {
        let server = MockServer::start().await;
        mount_get(&server, "/data", ResponseTemplate::new(500)).await;

        async fn failing_turn(url: String) -> (Result<Value>, HttpSession) {
            let mut transport = TransportClient::new();
            let result = transport
                .get(StatusCode::OK, &url, RequestOptions::new())
                .await;
            let handle = transport.current_session().cloned().unwrap();
            (result, handle)
        }

        let (result, handle) = failing_turn(format!("{}/data", server.uri())).await;
        assert!(result.is_err());
        assert!(handle.is_closed());
    }
}
