use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use serde_json::json;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::client::PredictionClient;
use crate::error::PredictionError;
use crate::models::{ResultTable, Threshold};

const INDEX_HTML: &str = include_str!("../static/index.html");

const IMAGE_FIELD: &str = "image";
const THRESHOLD_FIELD: &str = "threshold";

const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;
const MAX_THRESHOLD_BYTES: usize = 64;

pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

/// Always answers 200 with a table so the page has something to render.
pub async fn predict(client: web::Data<PredictionClient>, payload: Multipart) -> HttpResponse {
    let request_id = Uuid::new_v4();
    let outcome = async {
        let form = read_form(payload, MAX_IMAGE_BYTES).await?;
        // A missing image is reported ahead of a bad threshold.
        let image = match form.image {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Err(PredictionError::NoInput),
        };
        let threshold = Threshold::from_form(form.threshold.as_deref().unwrap_or(""))?;
        info!(
            upload_len = image.len(),
            threshold = threshold.value(),
            "prediction requested"
        );

        let outcome = client.predict(Some(image), threshold).await;
        match &outcome {
            Ok(rows) => info!(rows = rows.len(), "prediction complete"),
            Err(err) => warn!(kind = err.kind(), "prediction failed: {err}"),
        }
        outcome
    }
    .instrument(info_span!("predict", %request_id))
    .await;

    HttpResponse::Ok().json(ResultTable::from(outcome))
}

#[derive(Debug, Default)]
struct PredictForm {
    image: Option<Vec<u8>>,
    threshold: Option<String>,
}

async fn read_form(
    mut payload: Multipart,
    max_image: usize,
) -> Result<PredictForm, PredictionError> {
    let mut form = PredictForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(upload_error)?;
        let name = field
            .content_disposition()
            .get_name()
            .map(|name| name.to_string());

        match name.as_deref() {
            Some(IMAGE_FIELD) => form.image = Some(read_field(&mut field, max_image).await?),
            Some(THRESHOLD_FIELD) => {
                let data = read_field(&mut field, MAX_THRESHOLD_BYTES).await?;
                form.threshold = Some(String::from_utf8_lossy(&data).into_owned())
            }
            _ => {
                while let Some(chunk) = field.next().await {
                    chunk.map_err(upload_error)?;
                }
            }
        }
    }

    Ok(form)
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, PredictionError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(upload_error)?;
        if data.len() + chunk.len() > limit {
            return Err(PredictionError::TooLarge(limit));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

fn upload_error(err: MultipartError) -> PredictionError {
    PredictionError::Encode(format!("unreadable upload: {err}"))
}
