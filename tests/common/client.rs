//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per artist registry endpoint.
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::Value;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    /// GET /v1/artists/search?artistName={name}
    pub async fn search_artist(&self, name: &str) -> Response {
        self.client
            .get(format!("{}/v1/artists/search", self.base_url))
            .query(&[("artistName", name)])
            .send()
            .await
            .expect("Search request failed")
    }

    /// POST /v1/artists/apply with a JSON body
    pub async fn apply(&self, body: &Value) -> Response {
        self.client
            .post(format!("{}/v1/artists/apply", self.base_url))
            .json(body)
            .send()
            .await
            .expect("Apply request failed")
    }

    /// POST /v1/artists/apply with a raw body
    pub async fn apply_raw(&self, body: &str) -> Response {
        self.client
            .post(format!("{}/v1/artists/apply", self.base_url))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Apply request failed")
    }

    /// GET /v1/artists?query={query}
    pub async fn list_artists(&self, query: Option<&str>) -> Response {
        match query {
            Some(query) => self.list_artists_with(&[("query", query)]).await,
            None => self.list_artists_with(&[]).await,
        }
    }

    /// GET /v1/artists with arbitrary filter parameters
    pub async fn list_artists_with(&self, params: &[(&str, &str)]) -> Response {
        self.client
            .get(format!("{}/v1/artists", self.base_url))
            .query(params)
            .send()
            .await
            .expect("List request failed")
    }

    /// GET /v1/artists/{id}
    pub async fn get_artist(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/v1/artists/{}", self.base_url, id))
            .send()
            .await
            .expect("Get artist request failed")
    }
}
