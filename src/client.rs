use std::io::Cursor;
use std::sync::Arc;

use actix_web::web;
use image::ImageOutputFormat;
use tracing::{debug, warn};

use crate::backend::{backend_for, PredictionBackend};
use crate::config::ClientConfig;
use crate::error::PredictionError;
use crate::models::{ResultRow, Threshold};

#[derive(Clone)]
pub struct PredictionClient {
    backend: Arc<dyn PredictionBackend>,
}

impl PredictionClient {
    pub fn new(config: &ClientConfig) -> Result<Self, PredictionError> {
        Ok(Self::with_backend(backend_for(config)?))
    }

    pub fn with_backend(backend: Arc<dyn PredictionBackend>) -> Self {
        Self { backend }
    }

    /// One submission: encode the upload, ask the endpoint, rank the answer.
    /// A missing or empty upload fails before anything leaves the process.
    pub async fn predict(
        &self,
        upload: Option<Vec<u8>>,
        threshold: Threshold,
    ) -> Result<Vec<ResultRow>, PredictionError> {
        let upload = match upload {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Err(PredictionError::NoInput),
        };

        let png = web::block(move || encode_png(&upload))
            .await
            .map_err(|err| PredictionError::Encode(err.to_string()))??;
        debug!(png_len = png.len(), "upload re-encoded as png");

        let probabilities = self.backend.fetch_probabilities(png).await?;
        if probabilities.is_empty() {
            warn!("endpoint returned no labels");
        }
        debug!(labels = probabilities.len(), "probabilities received");
        Ok(probabilities.into_rows(threshold))
    }
}

/// Decodes any supported image format and writes it back out as PNG.
pub(crate) fn encode_png(upload: &[u8]) -> Result<Vec<u8>, PredictionError> {
    let image = image::load_from_memory(upload)?;
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageOutputFormat::Png)?;
    Ok(buffer.into_inner())
}
