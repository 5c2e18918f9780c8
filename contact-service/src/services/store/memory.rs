use super::{CollectionTarget, DocumentStore, StoreConnection, StoreError};
use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-process document store. Clones share state, so a test can keep a
/// handle while the application writes through another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    documents: Mutex<HashMap<CollectionTarget, Vec<Document>>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
    fail_connect: AtomicBool,
    fail_insert: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `connect` calls fail.
    pub fn fail_connects(&self, fail: bool) {
        self.state.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent inserts fail after the connection is opened.
    pub fn fail_inserts(&self, fail: bool) {
        self.state.fail_insert.store(fail, Ordering::SeqCst);
    }

    pub fn documents(&self, target: &CollectionTarget) -> Vec<Document> {
        self.state
            .documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(target)
            .cloned()
            .unwrap_or_default()
    }

    pub fn total_documents(&self) -> usize {
        self.state
            .documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .map(Vec::len)
            .sum()
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    pub fn open_connections(&self) -> usize {
        self.connects().saturating_sub(self.closes())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(StoreError::Connect(anyhow::anyhow!(
                "memory store configured to refuse connections"
            )));
        }

        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MemoryConnection {
    state: Arc<MemoryState>,
}

#[async_trait]
impl StoreConnection for MemoryConnection {
    async fn insert_one(
        &self,
        target: &CollectionTarget,
        mut document: Document,
    ) -> Result<(), StoreError> {
        if self.state.fail_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Insert {
                target: target.clone(),
                source: anyhow::anyhow!("memory store configured to reject inserts"),
            });
        }

        // Mirror the driver, which assigns `_id` client-side when absent.
        if !document.contains_key("_id") {
            document.insert("_id", ObjectId::new());
        }

        let mut documents = self.state.documents.lock().map_err(|_| StoreError::Insert {
            target: target.clone(),
            source: anyhow::anyhow!("memory store lock poisoned"),
        })?;
        documents.entry(target.clone()).or_default().push(document);

        Ok(())
    }

    async fn close(&self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}
