use axum::{
    body::{self, Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    Json,
};
use http_body_util::LengthLimitError;
use service_core::error::AppError;

use crate::dtos::{StatusBody, SubmitRequest, SUBMITTED_MESSAGE};
use crate::services::{record_submission, SubmissionOutcome};
use crate::startup::{AppState, SUBMIT_BODY_LIMIT};

/// Accept one contact-form submission.
///
/// Every method is routed here so that non-POST requests get the same
/// structured body as other failures. The method is checked before the body
/// is read.
#[tracing::instrument(skip_all, fields(method = %request.method()))]
pub async fn submit(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<StatusBody>), AppError> {
    let result = accept(&state, request).await;

    match &result {
        Ok(_) => record_submission(SubmissionOutcome::Stored),
        Err(e) => record_submission(SubmissionOutcome::from_error(e)),
    }

    result
}

async fn accept(
    state: &AppState,
    request: Request,
) -> Result<(StatusCode, Json<StatusBody>), AppError> {
    let (parts, body) = request.into_parts();
    if parts.method != Method::POST {
        return Err(AppError::MethodNotAllowed(parts.method.to_string()));
    }

    let body = read_body(body).await?;
    let request = SubmitRequest::from_body(content_type(&parts.headers), &body)?;

    state.submissions.submit(request).await?;

    Ok((StatusCode::OK, Json(StatusBody::ok(SUBMITTED_MESSAGE))))
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

async fn read_body(body: Body) -> Result<Bytes, AppError> {
    body::to_bytes(body, SUBMIT_BODY_LIMIT).await.map_err(|e| {
        let source = e.into_inner();
        if source.downcast_ref::<LengthLimitError>().is_some() {
            AppError::PayloadTooLarge(format!("body exceeds {} bytes", SUBMIT_BODY_LIMIT))
        } else {
            AppError::BadRequest(format!("failed to read request body: {}", source))
        }
    })
}
