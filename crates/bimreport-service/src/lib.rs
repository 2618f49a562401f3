//! Blocking client for the column analysis backend.

use bimreport_core::error::ServiceError;
use bimreport_core::settings::ServiceSettings;
use bimreport_core::workflow::{AnalysisRequest, AnalysisService};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

pub const ANALYZE_PATH: &str = "/extract_and_predict";
pub const HEALTH_PATH: &str = "/health";

pub struct HttpAnalysisService {
    http_client: Client,
    base_url: String,
}

impl HttpAnalysisService {
    pub fn new(settings: &ServiceSettings) -> Result<Self, ServiceError> {
        let http_client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Transport(error_chain(&e)))?;

        Ok(Self {
            http_client,
            base_url: settings.url.clone(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        endpoint_url(&self.base_url, path)
    }

    /// Liveness probe; returns the backend's status document.
    pub fn health(&self) -> Result<Value, ServiceError> {
        let url = self.endpoint(HEALTH_PATH);
        tracing::debug!(%url, "checking analysis service health");
        let response = self
            .http_client
            .get(&url)
            .send()
            .map_err(|e| transport_error(&e))?;
        read_json(response)
    }
}

impl AnalysisService for HttpAnalysisService {
    fn analyze(&self, request: &AnalysisRequest) -> Result<Value, ServiceError> {
        let url = self.endpoint(ANALYZE_PATH);
        let file = Part::bytes(request.file.bytes().to_vec())
            .file_name(request.file.name().to_string());

        let mut form = Form::new().part("file", file);
        for (name, value) in request.parameters.optional_fields() {
            form = form.text(name, value.to_string());
        }

        tracing::debug!(
            %url,
            file = request.file.name(),
            size = request.file.size(),
            "posting model to analysis service"
        );

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| transport_error(&e))?;
        read_json(response)
    }
}

fn read_json(response: reqwest::blocking::Response) -> Result<Value, ServiceError> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .map_err(|e| transport_error(&e))?;
    interpret_response(status, &body)
}

/// Maps a raw HTTP reply onto the service contract: any non-2xx status is a
/// failure, otherwise the body must be JSON.
pub fn interpret_response(status: u16, body: &str) -> Result<Value, ServiceError> {
    if !(200..300).contains(&status) {
        tracing::warn!(status, "analysis service returned an error status");
        return Err(ServiceError::Status(status));
    }
    serde_json::from_str(body)
        .map_err(|e| ServiceError::Transport(format!("invalid JSON from analysis service: {e}")))
}

/// Joins an error and its `source()` chain into one line, so the user sees
/// the underlying cause (refused connection, timeout) and not only reqwest's
/// top-level summary.
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

fn transport_error(error: &reqwest::Error) -> ServiceError {
    let message = error_chain(error);
    tracing::warn!(error = %message, "analysis service unreachable");
    ServiceError::Transport(message)
}

pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}
