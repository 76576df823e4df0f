#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;

use cat_api::auth::{generate_jwt, Claims};
use cat_api::database::{InMemoryCatRepository, InMemoryUserRepository};
use cat_api::middleware::upload::{UPLOAD_COORDS_HEADER, UPLOAD_FILENAME_HEADER};
use cat_api::models::{Role, User};
use cat_api::AppState;

/// A server running inside the test's runtime, backed by in-memory stores
/// seeded with two regular users and one admin.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    pub alice: User,
    pub bob: User,
    pub admin: User,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let alice = User::new("alice", "alice@example.com", Role::User);
        let bob = User::new("bob", "bob@example.com", Role::User);
        let admin = User::new("root", "root@example.com", Role::Admin);

        let state = AppState::new(
            Arc::new(InMemoryCatRepository::new()),
            Arc::new(InMemoryUserRepository::with_users([alice.clone(), bob.clone(), admin.clone()])),
        );

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, cat_api::app(state)).await;
        });

        let server = Self {
            port,
            base_url,
            client: reqwest::Client::new(),
            alice,
            bob,
            admin,
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
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

    pub fn token(&self, user: &User) -> String {
        generate_jwt(&Claims::new(user.id, user.role)).expect("failed to sign test token")
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn as_user(&self, builder: RequestBuilder, user: &User) -> RequestBuilder {
        builder.bearer_auth(self.token(user))
    }

    /// POST /cats as `user` with an uploaded photo geotagged at (lon, lat).
    pub async fn create_cat(&self, user: &User, body: Value, lon: f64, lat: f64) -> Result<reqwest::Response> {
        let resp = self
            .client
            .post(self.url("/cats"))
            .bearer_auth(self.token(user))
            .header(UPLOAD_FILENAME_HEADER, "photo.jpg")
            .header(UPLOAD_COORDS_HEADER, format!("{},{}", lon, lat))
            .json(&body)
            .send()
            .await?;
        Ok(resp)
    }

    /// Create a cat and return the stored record from the `data` envelope.
    pub async fn create_cat_ok(&self, user: &User, name: &str, lon: f64, lat: f64) -> Result<Value> {
        let body = serde_json::json!({ "name": name, "weight": 4, "birthdate": "2020-01-01" });
        let resp = self.create_cat(user, body, lon, lat).await?;
        assert_eq!(resp.status(), StatusCode::OK, "create {} failed", name);
        let body = resp.json::<Value>().await?;
        Ok(body["data"].clone())
    }
}

/// Field of an error body, e.g. `error_field(&body, "code")`.
pub fn error_field<'a>(body: &'a Value, field: &str) -> &'a str {
    body.get(field).and_then(|v| v.as_str()).unwrap_or_default()
}
