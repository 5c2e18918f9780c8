//! Shared helpers for integration tests. Not every test binary uses all of them.
#![allow(dead_code)]

use contact_service::config::{ContactConfig, CorsConfig, MongoConfig};
use contact_service::services::{CollectionTarget, DocumentStore, MemoryStore};
use contact_service::startup::Application;
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: MemoryStore,
    pub target: CollectionTarget,
}

pub fn test_config(uri: &str, database: &str) -> ContactConfig {
    ContactConfig {
        // Use random port for testing (port 0)
        common: CoreConfig {
            port: 0,
            log_level: "debug".to_string(),
        },
        mongodb: MongoConfig {
            uri: Secret::new(uri.to_string()),
            database: database.to_string(),
            collection: "messages".to_string(),
            server_selection_timeout_ms: 2000,
        },
        cors: CorsConfig::default(),
        otlp_endpoint: None,
    }
}

impl TestApp {
    /// Spawn the application backed by an in-memory store.
    pub async fn spawn() -> Self {
        let store = MemoryStore::new();
        let config = test_config("mongodb://unused.invalid:27017", "contact_test");
        let target = CollectionTarget::new(&config.mongodb.database, &config.mongodb.collection);

        let app = Application::build_with_store(
            config,
            Arc::new(store.clone()) as Arc<dyn DocumentStore>,
        )
        .await
        .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        wait_until_ready(&address).await;

        TestApp {
            address,
            port,
            store,
            target,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Poll the health endpoint until the server answers.
pub async fn wait_until_ready(address: &str) {
    let client = reqwest::Client::new();
    let health_url = format!("{}/health", address);
    for _ in 0..50 {
        if client.get(&health_url).send().await.is_ok() {
            break;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }
}
