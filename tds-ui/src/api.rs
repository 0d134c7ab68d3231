//! Blocking HTTP client for the TDS backend.
//!
//! Cursive callbacks run on the UI thread, so requests are made with
//! `reqwest::blocking` and complete before the next event is handled.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_DISPOSITION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tds_core::{CalculateRequest, CalculateResponse, ExcelRequest, SectionListing};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Could not reach the TDS service at {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response from the TDS service: {0}")]
    Decode(String),
}

/// Error body produced by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    details: Vec<String>,
}

/// Turns an error body into the single message shown to the user.
fn server_message(
    status: u16,
    body: &str,
) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) if !err.details.is_empty() => err.details.join("; "),
        Ok(err) => err.message,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => format!("Request failed with status {status}"),
    }
}

/// Pulls the filename out of `attachment; filename="..."`.
pub fn attachment_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

/// A downloaded report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcelDownload {
    /// Filename suggested by the server, if it sent one.
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::Network {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(
        &self,
        path: &str,
    ) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn check(
        url: &str,
        result: reqwest::Result<Response>,
    ) -> Result<Response, ApiError> {
        let response = result.map_err(|source| ApiError::Network {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let message = server_message(status.as_u16(), &body);
        warn!(url, status = status.as_u16(), %message, "request rejected");
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }

    fn json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response.json().map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `GET /sections/`
    pub fn sections(&self) -> Result<Vec<SectionListing>, ApiError> {
        let url = self.url("sections/");
        debug!(%url, "fetching sections");
        let response = Self::check(&url, self.http.get(&url).send())?;
        Self::json(response)
    }

    /// `POST /calculate/`
    pub fn calculate(
        &self,
        request: &CalculateRequest,
    ) -> Result<CalculateResponse, ApiError> {
        let url = self.url("calculate/");
        debug!(%url, transactions = request.transactions.len(), "calculating");
        let response = Self::check(&url, self.http.post(&url).json(request).send())?;
        Self::json(response)
    }

    /// `POST /generate-excel/`
    pub fn generate_excel(
        &self,
        request: &ExcelRequest,
    ) -> Result<ExcelDownload, ApiError> {
        let url = self.url("generate-excel/");
        debug!(%url, results = request.results.len(), "requesting report");
        let response = Self::check(&url, self.http.post(&url).json(request).send())?;

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_filename);
        let bytes = response
            .bytes()
            .map_err(|e| ApiError::Decode(e.to_string()))?
            .to_vec();

        Ok(ExcelDownload { filename, bytes })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn server_message_prefers_details() {
        let body = r#"{"status":400,"error":"validation_failed","message":"Request validation failed","details":["Entity name is required","At least one transaction is required"]}"#;

        assert_eq!(
            server_message(400, body),
            "Entity name is required; At least one transaction is required"
        );
    }

    #[test]
    fn server_message_falls_back_to_message_then_text() {
        let body = r#"{"status":400,"error":"unknown_section","message":"Section 194Z not found"}"#;

        assert_eq!(server_message(400, body), "Section 194Z not found");
        assert_eq!(server_message(502, "Bad Gateway"), "Bad Gateway");
        assert_eq!(server_message(500, ""), "Request failed with status 500");
    }

    #[test]
    fn attachment_filename_is_unquoted() {
        assert_eq!(
            attachment_filename("attachment; filename=\"Acme_Report_20250701.xlsx\""),
            Some("Acme_Report_20250701.xlsx".to_string())
        );
        assert_eq!(attachment_filename("attachment"), None);
        assert_eq!(attachment_filename("attachment; filename=\"\""), None);
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = ApiClient::new("http://localhost:8000/api/", Duration::from_secs(1)).unwrap();

        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.url("/sections/"), "http://localhost:8000/api/sections/");
    }
}
