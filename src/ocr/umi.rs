use std::time::Duration;

use anyhow::Result;
use base64::Engine;
use serde::Serialize;

use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::ocr::response::OcrResponse;
use crate::ocr::OcrBackend;

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    base64: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    lang: Option<&'a str>,
}

/// HTTP client for a local OCR service taking base64-encoded images.
pub struct UmiOcrBackend {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl UmiOcrBackend {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            client,
        })
    }
}

impl OcrBackend for UmiOcrBackend {
    fn name(&self) -> &str {
        "umi-ocr"
    }

    fn recognize(&self, image: &[u8], language: Option<&str>) -> Result<OcrResponse, OcrError> {
        let request = OcrRequest {
            base64: base64::engine::general_purpose::STANDARD.encode(image),
            lang: language,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| OcrError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OcrError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .map_err(|e| OcrError::Transport(e.to_string()))?;
        Ok(OcrResponse::from_bytes(&body))
    }
}
