use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{ClientConfig, Protocol};
use crate::error::PredictionError;
use crate::models::ProbabilityMap;

const UPLOAD_FIELD: &str = "file";
const UPLOAD_FILE_NAME: &str = "image.png";
const UPLOAD_MIME: &str = "image/png";

/// Turns PNG bytes into probabilities by talking to the remote endpoint.
#[async_trait]
pub trait PredictionBackend: Send + Sync {
    async fn fetch_probabilities(&self, png: Vec<u8>) -> Result<ProbabilityMap, PredictionError>;
}

pub fn backend_for(config: &ClientConfig) -> Result<Arc<dyn PredictionBackend>, PredictionError> {
    let endpoint = HttpEndpoint::new(config.clone())?;
    let backend: Arc<dyn PredictionBackend> = match config.protocol {
        Protocol::Direct => Arc::new(DirectBackend { endpoint }),
        Protocol::FileId => Arc::new(FileIdBackend { endpoint }),
    };
    Ok(backend)
}

struct HttpEndpoint {
    http: Client,
    config: ClientConfig,
}

impl HttpEndpoint {
    fn new(config: ClientConfig) -> Result<Self, PredictionError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    async fn post_image(&self, png: Vec<u8>) -> Result<Vec<u8>, PredictionError> {
        let url = self.config.predict_url();
        let png_len = png.len();
        let part = Part::bytes(png)
            .file_name(UPLOAD_FILE_NAME)
            .mime_str(UPLOAD_MIME)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        info!(%url, png_len, "posting image to prediction endpoint");
        let started = Instant::now();
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    %url,
                    timeout = err.is_timeout(),
                    connect = err.is_connect(),
                    "prediction request failed: {err}"
                );
                PredictionError::from(err)
            })?;

        let status = response.status();
        info!(
            %url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "prediction endpoint answered"
        );
        if !status.is_success() {
            return Err(PredictionError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn get_json(&self, file_id: &str) -> Result<Vec<u8>, PredictionError> {
        let url = self.config.json_url(file_id);
        let started = Instant::now();
        let response = self
            .http
            .get(&url)
            .timeout(self.config.fetch_timeout)
            .send()
            .await
            .map_err(|err| {
                warn!(%url, timeout = err.is_timeout(), "prediction fetch failed: {err}");
                PredictionError::from(err)
            })?;

        let status = response.status();
        info!(
            %url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "prediction fetch answered"
        );
        if !status.is_success() {
            return Err(PredictionError::FetchStatus(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// The upload response is the probability object itself.
pub struct DirectBackend {
    endpoint: HttpEndpoint,
}

#[async_trait]
impl PredictionBackend for DirectBackend {
    async fn fetch_probabilities(&self, png: Vec<u8>) -> Result<ProbabilityMap, PredictionError> {
        let body = self.endpoint.post_image(png).await?;
        ProbabilityMap::from_bytes(&body)
    }
}

/// Upload first, then fetch `/json/{file_id}`.
pub struct FileIdBackend {
    endpoint: HttpEndpoint,
}

#[async_trait]
impl PredictionBackend for FileIdBackend {
    async fn fetch_probabilities(&self, png: Vec<u8>) -> Result<ProbabilityMap, PredictionError> {
        let body = self.endpoint.post_image(png).await?;
        let receipt: Value = serde_json::from_slice(&body)?;
        let file_id = file_id_of(&receipt).ok_or(PredictionError::MissingFileId)?;
        let body = self.endpoint.get_json(&file_id).await?;
        ProbabilityMap::from_bytes(&body)
    }
}

fn file_id_of(receipt: &Value) -> Option<String> {
    match receipt.get("file_id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
