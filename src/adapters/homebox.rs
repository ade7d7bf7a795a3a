//! Homebox REST client.
//!
//! Endpoints (all under `<url>/api/v1`):
//! - `POST /users/login` → token
//! - `GET /locations/tree`
//! - `GET /items?page=&pageSize=` (paged)
//! - `GET /items/{id}`, `PUT /items/{id}`, `POST /items`
//! - `GET /labels`
//!
//! Auth: the login token is sent verbatim in the `Authorization` header.

use anyhow::{Context, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::InventoryClient;
use crate::config::Credentials;
use crate::domain::{InventoryItem, Label, LocationNode, NewItem};

/// Items requested per page when listing
const PAGE_SIZE: usize = 100;

/// Homebox API client holding a session token
pub struct HomeboxClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    stay_logged_in: bool,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ItemPage {
    #[serde(default)]
    items: Vec<InventoryItem>,
    #[serde(default)]
    total: usize,
}

impl HomeboxClient {
    /// Create a client with an existing token
    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Log in and keep the returned token
    pub async fn login(credentials: &Credentials) -> Result<Self> {
        let mut session = Self::with_token(&credentials.url, "");

        let response = session
            .client
            .post(session.api_url("users/login"))
            .header("Accept", "application/json")
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
                stay_logged_in: true,
            })
            .send()
            .await
            .with_context(|| format!("Failed to reach inventory at {}", credentials.url))?;

        let login: LoginResponse = read_json(response)
            .await
            .context("Inventory login failed")?;

        session.token = login.token;
        Ok(session)
    }

    /// Build API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.api_url(path))
            .header("Authorization", &self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to GET {}", path))?;

        read_json(response)
            .await
            .with_context(|| format!("Bad response from GET {}", path))
    }
}

/// Decode a JSON body, refusing non-success statuses and non-JSON payloads
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        anyhow::bail!("Inventory API error ({}): {}", status, text);
    }
    if !is_json {
        let text = response.text().await.unwrap_or_default();
        anyhow::bail!("Server did not return JSON: {}", text);
    }

    response.json().await.context("Failed to parse JSON body")
}

/// Whether a write was accepted; rejected bodies are logged for diagnosis
async fn accepted(response: Response, expected: StatusCode) -> bool {
    let status = response.status();
    if status == expected || (expected == StatusCode::OK && status.is_success()) {
        return true;
    }
    let text = response.text().await.unwrap_or_default();
    debug!(%status, body = %text, "Inventory rejected write");
    false
}

#[async_trait]
impl InventoryClient for HomeboxClient {
    async fn location_tree(&self) -> Result<Vec<LocationNode>> {
        self.get_json("locations/tree").await
    }

    async fn add_item(&self, item: &NewItem) -> Result<bool> {
        let response = self
            .client
            .post(self.api_url("items"))
            .header("Authorization", &self.token)
            .header("Accept", "application/json")
            .json(item)
            .send()
            .await
            .context("Failed to send item to inventory")?;

        Ok(accepted(response, StatusCode::CREATED).await)
    }

    async fn items(&self) -> Result<IndexMap<String, InventoryItem>> {
        let mut items = IndexMap::new();
        let mut page = 1;

        loop {
            let batch: ItemPage = self
                .get_json(&format!("items?page={}&pageSize={}", page, PAGE_SIZE))
                .await?;
            let fetched = batch.items.len();
            for item in batch.items {
                items.insert(item.id.clone(), item);
            }
            if fetched == 0 || items.len() >= batch.total {
                break;
            }
            page += 1;
        }

        Ok(items)
    }

    async fn labels(&self) -> Result<IndexMap<String, Label>> {
        let labels: Vec<Label> = self.get_json("labels").await?;
        Ok(labels.into_iter().map(|l| (l.name.clone(), l)).collect())
    }

    async fn item(&self, id: &str) -> Result<serde_json::Value> {
        self.get_json(&format!("items/{}", id)).await
    }

    async fn update_item(&self, id: &str, item: &serde_json::Value) -> Result<bool> {
        let response = self
            .client
            .put(self.api_url(&format!("items/{}", id)))
            .header("Authorization", &self.token)
            .header("Accept", "application/json")
            .json(item)
            .send()
            .await
            .with_context(|| format!("Failed to update item {}", id))?;

        Ok(accepted(response, StatusCode::OK).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let client = HomeboxClient::with_token("http://hb.local:7745/", "Bearer t");
        assert_eq!(
            client.api_url("locations/tree"),
            "http://hb.local:7745/api/v1/locations/tree"
        );
    }

    #[test]
    fn test_base_url_trailing_slashes_are_normalized() {
        let client = HomeboxClient::with_token("http://hb.local//", "");
        assert_eq!(client.api_url("users/login"), "http://hb.local/api/v1/users/login");
    }

    #[test]
    fn test_login_request_shape() {
        let body = serde_json::to_value(LoginRequest {
            username: "u",
            password: "p",
            stay_logged_in: true,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"username": "u", "password": "p", "stayLoggedIn": true})
        );
    }

    #[test]
    fn test_item_page_parses_labels() {
        let page: ItemPage = serde_json::from_str(
            r#"{"page": 1, "pageSize": 100, "total": 1, "items": [
                {"id": "i1", "name": "Drill", "description": "",
                 "labels": [{"id": "l1", "name": "Tools"}], "quantity": 1}
            ]}"#,
        )
        .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].labels[0].id, "l1");
    }
}
