#![allow(dead_code)]

use contact_service::config::ContactConfig;
use contact_service::services::{EmailProvider, MockEmailProvider, Notifier};
use contact_service::startup::Application;
use service_core::config::Config as CoreConfig;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

pub const TEST_RECIPIENT: &str = "inbox@acme.test";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

pub fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn test_config() -> ContactConfig {
    let common = CoreConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        // Use random port for testing (port 0)
        port: 0,
    };
    ContactConfig::from_env(common, &env(&[("TARGET_EMAIL", TEST_RECIPIENT)]))
        .expect("Failed to build test configuration")
}

impl TestApp {
    /// Spawn the service with the given primary and fallback providers.
    pub async fn spawn(
        primary: Arc<dyn EmailProvider>,
        fallback: Arc<dyn EmailProvider>,
    ) -> Self {
        Self::spawn_with_notifier(Notifier::new(primary, fallback)).await
    }

    /// Spawn the service with a healthy primary and no fallback.
    pub async fn spawn_default() -> Self {
        Self::spawn(
            Arc::new(MockEmailProvider::succeeding("smtp")),
            Arc::new(MockEmailProvider::unconfigured("mailgun")),
        )
        .await
    }

    pub async fn spawn_with_notifier(notifier: Notifier) -> Self {
        let app = Application::build_with_notifier(test_config(), notifier)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub async fn post_contact(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/contact", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
