//! Mock Fleet API server for testing the HTTP client
//!
//! This serves the category listing and object lookup endpoints without
//! requiring a live fleet hub.

use serde_json::{json, Value};
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub struct MockFleetServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockFleetServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    /// Serve `items` for one category
    pub async fn mock_category(&self, category: &str, items: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/{}", category)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
            .mount(&self.server)
            .await;
    }

    /// Serve a category only to requests carrying the bearer token
    pub async fn mock_category_with_token(&self, category: &str, token: &str, items: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/{}", category)))
            .and(header("Authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
            .mount(&self.server)
            .await;
    }

    /// Respond with a bare status for any request to `request_path`
    pub async fn mock_status(&self, request_path: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(status).set_body_string("unavailable"))
            .mount(&self.server)
            .await;
    }

    /// Respond with a body that is not a Fleet API document
    pub async fn mock_garbage(&self, request_path: &str) {
        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&self.server)
            .await;
    }

    /// Serve a single object at `request_path`
    pub async fn mock_object(&self, request_path: &str, object: Value) {
        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(object))
            .mount(&self.server)
            .await;
    }
}
