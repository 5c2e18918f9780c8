use serde::Deserialize;
use service_core::error::AppError;
use validator::Validate;

pub use service_core::error::StatusBody;

pub const SUBMITTED_MESSAGE: &str = "Submission received successfully";

/// Inbound contact form. Absent fields deserialize to empty strings so that
/// "missing" and "empty" fail the same validation rule.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SubmitRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Email cannot be empty"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Message cannot be empty"))]
    pub message: String,
}

impl SubmitRequest {
    /// Decode a JSON or urlencoded form body. A missing content type is
    /// treated as JSON.
    pub fn from_body(content_type: Option<&str>, body: &[u8]) -> Result<Self, AppError> {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());

        match mime.as_deref() {
            None | Some("application/json") => Self::from_json(body),
            Some(m) if m.ends_with("+json") => Self::from_json(body),
            Some("application/x-www-form-urlencoded") => serde_urlencoded::from_bytes(body)
                .map_err(|e| AppError::BadRequest(format!("Invalid form body: {}", e))),
            Some(other) => Err(AppError::BadRequest(format!(
                "Unsupported content type: {}",
                other
            ))),
        }
    }

    fn from_json(body: &[u8]) -> Result<Self, AppError> {
        serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))
    }
}
