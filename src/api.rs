// API routes and handlers
use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpResponse, Responder, ResponseError};
use futures_util::StreamExt;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PredictionError;
use crate::features::{is_empty_payload, FeatureRow};
use crate::state::AppState;

pub const RUNNING_MESSAGE: &str = "Insurance Premium Prediction API is running.";
pub const NO_INPUT_MESSAGE: &str = "No input data provided";
/// Largest accepted `/predict` body, in bytes.
pub const MAX_BODY_SIZE: usize = 256 * 1024;
const REQUEST_SEPARATOR: &str =
    "--------------------------------------------------------------------------------";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    pub predicted_insurance_premium: f64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No input data provided")]
    NoInput,

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Failed to read request body: {0}")]
    Payload(String),

    #[error("{0}")]
    Processing(String),

    #[error("Internal server error")]
    Internal,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoInput | ApiError::InvalidJson(_) | ApiError::Payload(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Processing(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(RUNNING_MESSAGE)
}

#[post("/predict")]
pub async fn predict(
    state: web::Data<AppState>,
    payload: web::Payload,
) -> Result<web::Json<PredictionResponse>, ApiError> {
    debug!("Received a prediction request");
    let result = match read_body(payload).await {
        Ok(body) => run_prediction(&state, &body),
        Err(e) => {
            debug!("Rejected request body: {e}");
            Err(e)
        }
    };
    debug!("{REQUEST_SEPARATOR}");
    result
}

// Oversized or unreadable bodies become ApiError, so error bodies stay JSON.
async fn read_body(mut payload: web::Payload) -> Result<web::BytesMut, ApiError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| ApiError::Payload(e.to_string()))?;
        if body.len() + chunk.len() > MAX_BODY_SIZE {
            return Err(ApiError::PayloadTooLarge(MAX_BODY_SIZE));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

fn run_prediction(
    state: &AppState,
    body: &[u8],
) -> Result<web::Json<PredictionResponse>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        debug!("Rejected request with an empty body");
        return Err(ApiError::NoInput);
    }
    let payload: Value = serde_json::from_slice(body).map_err(|e| {
        debug!("Rejected request with malformed JSON: {e}");
        ApiError::InvalidJson(e.to_string())
    })?;
    if is_empty_payload(&payload) {
        debug!("Rejected request without input data: {payload}");
        return Err(ApiError::NoInput);
    }
    debug!("Received data: {payload}");

    let prediction: Result<f64, PredictionError> = FeatureRow::from_json(&payload)
        .map_err(PredictionError::from)
        .and_then(|row| {
            debug!("Input row: {row}");
            state.predict(&row)
        });

    match prediction {
        Ok(value) => {
            debug!("Prediction result: {value}");
            Ok(web::Json(PredictionResponse {
                predicted_insurance_premium: value,
            }))
        }
        Err(e) => {
            error!("Failed to preprocess data or predict: {e:?}");
            if state.expose_error_details {
                Err(ApiError::Processing(e.to_string()))
            } else {
                Err(ApiError::Internal)
            }
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(predict);
}
