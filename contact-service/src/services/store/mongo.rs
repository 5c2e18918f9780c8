use super::{CollectionTarget, DocumentStore, StoreConnection, StoreError};
use crate::config::MongoConfig;
use async_trait::async_trait;
use mongodb::{
    bson::{doc, Document},
    options::ClientOptions,
    Client as MongoClient,
};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

const APP_NAME: &str = "contact-service";

/// MongoDB-backed store. Each `connect` builds a fresh client that the
/// returned connection shuts down on close.
pub struct MongoStore {
    uri: Secret<String>,
    server_selection_timeout: Duration,
}

impl MongoStore {
    pub fn new(config: &MongoConfig) -> Self {
        Self {
            uri: config.uri.clone(),
            server_selection_timeout: Duration::from_millis(config.server_selection_timeout_ms),
        }
    }

    async fn client_options(&self) -> Result<ClientOptions, StoreError> {
        let mut options = ClientOptions::parse(self.uri.expose_secret())
            .await
            .map_err(|e| StoreError::Connect(anyhow::Error::new(e)))?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_selection_timeout = Some(self.server_selection_timeout);
        Ok(options)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
        let options = self.client_options().await?;
        let client = MongoClient::with_options(options)
            .map_err(|e| StoreError::Connect(anyhow::Error::new(e)))?;

        // The driver connects lazily; ping so an unreachable server fails here.
        let ping = client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await;
        if let Err(e) = ping {
            client.shutdown().await;
            return Err(StoreError::Connect(anyhow::Error::new(e)));
        }

        tracing::info!("MongoDB connection established");
        Ok(Box::new(MongoConnection { client }))
    }
}

struct MongoConnection {
    client: MongoClient,
}

#[async_trait]
impl StoreConnection for MongoConnection {
    async fn insert_one(
        &self,
        target: &CollectionTarget,
        document: Document,
    ) -> Result<(), StoreError> {
        let result = self
            .client
            .database(&target.database)
            .collection::<Document>(&target.collection)
            .insert_one(document, None)
            .await
            .map_err(|e| StoreError::Insert {
                target: target.clone(),
                source: anyhow::Error::new(e),
            })?;

        tracing::debug!(
            inserted_id = %result.inserted_id,
            namespace = %target,
            "Inserted document"
        );
        Ok(())
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        tracing::info!("MongoDB connection closed");
    }
}
