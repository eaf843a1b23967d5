//! `POST /intake`: run a source payload through the intake pipeline.
//!
//! The body is read as raw bytes and parsed as JSON here, so clients that do
//! not send `Content-Type: application/json` are still accepted.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::config;
use crate::models::Gcim;
use crate::pipeline::IntakeOutcome;

#[derive(Deserialize)]
pub struct IntakeQuery {
    pub source_ehr: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Serialize)]
pub struct IntakeAccepted {
    pub gcim: Gcim,
}

#[derive(Serialize)]
pub struct IntakeRejected {
    pub errors: Vec<String>,
}

/// `POST /intake?source_ehr=<s>&content_type=<f>`
pub async fn submit(
    State(ctx): State<ApiContext>,
    Query(query): Query<IntakeQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let source_ehr = query
        .source_ehr
        .as_deref()
        .unwrap_or(config::DEFAULT_SOURCE_EHR);
    let content_type = query
        .content_type
        .as_deref()
        .unwrap_or(config::DEFAULT_CONTENT_TYPE);

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Body is not valid JSON: {e}")))?;

    match ctx.intake.run(&payload, source_ehr, content_type)? {
        IntakeOutcome::Accepted(gcim) => Ok(Json(IntakeAccepted { gcim }).into_response()),
        IntakeOutcome::Rejected(report) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(IntakeRejected {
                errors: report.errors,
            }),
        )
            .into_response()),
    }
}
