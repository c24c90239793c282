//! Test helpers for integration tests
//!
//! Spawns the real application (router + middleware + state) on an
//! ephemeral port and talks to it over HTTP.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use gateway_api::{create_app, create_app_state};
use gateway_common::AppConfig;
use reqwest::{Client, Response};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Configuration pointing the pool at a closed port
///
/// The pool opens connections lazily (min idle 0), so the server starts
/// fine; any endpoint that actually touches the database fails fast.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.database.host = "127.0.0.1".to_string();
    config.database.port = 1;
    config.pool.max_size = 2;
    config.pool.min_idle = 0;
    config.pool.acquire_timeout = Duration::from_millis(200);
    config.pool.statement_timeout = Duration::from_millis(200);
    config.health.probe_timeout = Duration::from_millis(300);
    config
}

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a test server with the no-database config
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let state = create_app_state(config).await;
        let app = create_app(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url()))
            .send()
            .await?;
        Ok(response)
    }

    /// Make a POST request with a JSON body
    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Response> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url()))
            .json(body)
            .send()
            .await?;
        Ok(response)
    }

    /// Make a PUT request with a JSON body
    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<Response> {
        let response = self
            .client
            .put(format!("{}{path}", self.base_url()))
            .json(body)
            .send()
            .await?;
        Ok(response)
    }
}
