//! Document store capability used by the submission service.
//!
//! Connections are short-lived: one is opened per write and closed before the
//! request completes. [`ScopedConnection`] owns that lifecycle.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::Document;
use service_core::error::AppError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to connect to document store: {0}")]
    Connect(#[source] anyhow::Error),

    #[error("Failed to insert into {target}: {source}")]
    Insert {
        target: CollectionTarget,
        #[source]
        source: anyhow::Error,
    },
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::PersistenceError(anyhow::Error::new(err))
    }
}

/// Database and collection a document is written to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionTarget {
    pub database: String,
    pub collection: String,
}

impl CollectionTarget {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for CollectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError>;
}

#[async_trait]
pub trait StoreConnection: Send + Sync {
    async fn insert_one(
        &self,
        target: &CollectionTarget,
        document: Document,
    ) -> Result<(), StoreError>;

    async fn close(&self);
}

/// An open connection that is closed exactly once.
///
/// Call [`ScopedConnection::release`] on every path. If the guard is dropped
/// instead (panic, or the request future being cancelled) the close is
/// spawned onto the current runtime.
pub struct ScopedConnection {
    connection: Arc<dyn StoreConnection>,
    released: bool,
}

impl ScopedConnection {
    pub async fn acquire(store: &dyn DocumentStore) -> Result<Self, StoreError> {
        let connection = store.connect().await?;
        Ok(Self {
            connection: Arc::from(connection),
            released: false,
        })
    }

    pub async fn insert_one(
        &self,
        target: &CollectionTarget,
        document: Document,
    ) -> Result<(), StoreError> {
        self.connection.insert_one(target, document).await
    }

    pub async fn release(mut self) {
        self.released = true;
        self.connection.close().await;
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        tracing::warn!("Document store connection dropped without release, closing in background");
        let connection = Arc::clone(&self.connection);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    connection.close().await;
                });
            }
            Err(_) => {
                tracing::error!("No async runtime available to close dropped connection");
            }
        }
    }
}
