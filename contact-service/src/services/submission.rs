use crate::dtos::SubmitRequest;
use crate::models::Submission;
use crate::services::store::{CollectionTarget, DocumentStore, ScopedConnection};
use service_core::error::AppError;
use std::sync::Arc;
use validator::Validate;

/// Validates submissions and writes each one through a connection scoped to
/// that single write.
#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn DocumentStore>,
    target: CollectionTarget,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn DocumentStore>, target: CollectionTarget) -> Self {
        Self { store, target }
    }

    pub fn target(&self) -> &CollectionTarget {
        &self.target
    }

    #[tracing::instrument(skip_all, fields(namespace = %self.target))]
    pub async fn submit(&self, request: SubmitRequest) -> Result<Submission, AppError> {
        request.validate()?;

        let submission = Submission::new(request.name, request.email, request.message);
        let document = submission
            .to_document()
            .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;

        let connection = ScopedConnection::acquire(self.store.as_ref()).await?;
        let inserted = connection.insert_one(&self.target, document).await;
        connection.release().await;
        inserted?;

        tracing::info!(created_at = %submission.created_at, "Stored contact submission");
        Ok(submission)
    }

    /// Open and close one connection to prove the store is reachable.
    pub async fn check_store(&self) -> Result<(), AppError> {
        let connection = ScopedConnection::acquire(self.store.as_ref()).await?;
        connection.release().await;
        Ok(())
    }
}
