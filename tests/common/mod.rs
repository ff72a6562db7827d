#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use todo_api_rust::config::{AppConfig, Environment};
use todo_api_rust::database::MemoryStore;
use todo_api_rust::{app, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

/// Development preset with a fixed secret and quiet request logging.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::with_secret(Environment::Development, TEST_SECRET);
    config.security.bcrypt_cost = 4;
    config.api.enable_request_logging = false;
    config
}

impl TestServer {
    /// Serve the app in-process on a free port, on the calling test's runtime.
    pub async fn spawn(config: AppConfig) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = AppState::new(config, MemoryStore::new())?;
        state.bootstrap_admin().await?;

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        let router = app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await;
        });

        let server = Self {
            port,
            base_url,
            state,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register an account through the public endpoint and return its id.
    pub async fn register(&self, email: &str, password: &str) -> Result<String> {
        let local = email.split('@').next().unwrap_or(email);
        let res = self
            .client
            .post(self.url("/api/register"))
            .json(&json!({ "email": email, "username": format!("{}_user", local), "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());
        let body: Value = res.json().await?;
        body["data"]["id"]
            .as_str()
            .map(str::to_string)
            .context("register response missing id")
    }

    /// Log in and return the full `data` object of the response.
    pub async fn login(&self, email: &str, password: &str) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/api/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        Ok(body["data"].clone())
    }

    pub async fn token_for(&self, email: &str, password: &str) -> Result<String> {
        let data = self.login(email, password).await?;
        data["token"]
            .as_str()
            .map(str::to_string)
            .context("login response missing token")
    }

    /// Admin account configured through the bootstrap settings.
    pub async fn spawn_with_admin(email: &str, password: &str) -> Result<Self> {
        let mut config = test_config();
        config.security.bootstrap_admin_email = Some(email.to_string());
        config.security.bootstrap_admin_password = Some(password.to_string());
        Self::spawn(config).await
    }

    /// Create a todo as the bearer of `token` and return its id.
    pub async fn create_todo(&self, token: &str, title: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/api/todos"))
            .bearer_auth(token)
            .json(&json!({ "title": title }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create todo failed: {}", res.status());
        let body: Value = res.json().await?;
        body["data"]["id"]
            .as_str()
            .map(str::to_string)
            .context("todo response missing id")
    }
}
