pub mod metrics;
pub mod store;
pub mod submission;

pub use metrics::{get_metrics, init_metrics, record_submission, SubmissionOutcome};
pub use store::{
    CollectionTarget, DocumentStore, MemoryStore, MongoStore, ScopedConnection, StoreConnection,
    StoreError,
};
pub use submission::SubmissionService;
