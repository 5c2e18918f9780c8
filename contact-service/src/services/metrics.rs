//! Metrics collection for contact-service.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use service_core::error::AppError;
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Stored,
    RejectedMethod,
    RejectedValidation,
    Failed,
}

impl SubmissionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionOutcome::Stored => "stored",
            SubmissionOutcome::RejectedMethod => "rejected_method",
            SubmissionOutcome::RejectedValidation => "rejected_validation",
            SubmissionOutcome::Failed => "failed",
        }
    }

    pub fn from_error(err: &AppError) -> Self {
        match err {
            AppError::MethodNotAllowed(_) => SubmissionOutcome::RejectedMethod,
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::PayloadTooLarge(_) => SubmissionOutcome::RejectedValidation,
            _ => SubmissionOutcome::Failed,
        }
    }
}

/// Install the global Prometheus recorder. Call once, from the binary.
pub fn init_metrics() -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("metrics handle already initialized"))?;

    Ok(())
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_submission(outcome: SubmissionOutcome) {
    metrics::counter!("contact_submissions_total", "outcome" => outcome.as_str()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors_by_outcome() {
        assert_eq!(
            SubmissionOutcome::from_error(&AppError::MethodNotAllowed("GET".into())),
            SubmissionOutcome::RejectedMethod
        );
        assert_eq!(
            SubmissionOutcome::from_error(&AppError::BadRequest("bad".into())),
            SubmissionOutcome::RejectedValidation
        );
        assert_eq!(
            SubmissionOutcome::from_error(&AppError::PayloadTooLarge("big".into())),
            SubmissionOutcome::RejectedValidation
        );
        assert_eq!(
            SubmissionOutcome::from_error(&AppError::PersistenceError(anyhow::anyhow!("down"))),
            SubmissionOutcome::Failed
        );
    }

    #[test]
    fn renders_placeholder_without_recorder() {
        if METRICS_HANDLE.get().is_none() {
            assert!(get_metrics().starts_with("# Metrics recorder not initialized"));
        }
    }
}
