//! Client for an image upload endpoint hosted elsewhere.

use anyhow::Context;
use async_trait::async_trait;
use domains::{UploadEndpoint, UploadRequest, UploadResponse};

/// Posts [`UploadRequest`]s as JSON to a remote endpoint.
///
/// Any JSON answer is returned as-is, whatever the status code, so the
/// endpoint's own `error` text reaches the user. Only transport failures and
/// non-JSON bodies are errors.
#[derive(Debug, Clone)]
pub struct HttpUploadEndpoint {
    client: reqwest::Client,
    url: String,
}

impl HttpUploadEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl UploadEndpoint for HttpUploadEndpoint {
    async fn submit(&self, request: &UploadRequest) -> anyhow::Result<UploadResponse> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("POST {}", self.url))?;

        let status = response.status();
        let body = response
            .json::<UploadResponse>()
            .await
            .with_context(|| format!("upload endpoint answered {status} without a JSON body"))?;

        tracing::debug!(url = %self.url, %status, success = body.success, "upload endpoint answered");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}/api/boulders")
    }

    fn request() -> UploadRequest {
        UploadRequest {
            image_data: "data:image/png;base64,AAAA".into(),
            route_id: "new".into(),
            image_format: "image/png".into(),
        }
    }

    #[tokio::test]
    async fn success_body_is_returned() {
        let url = serve(Router::new().route(
            "/api/boulders",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["routeId"], "new");
                assert_eq!(body["imageFormat"], "image/png");
                Json(json!({ "success": true, "url": "https://cdn/new/a.png" }))
            }),
        ))
        .await;

        let response = HttpUploadEndpoint::new(url).submit(&request()).await.unwrap();
        assert!(response.success);
        assert_eq!(response.url.as_deref(), Some("https://cdn/new/a.png"));
    }

    #[tokio::test]
    async fn rejection_with_error_status_keeps_the_message() {
        let url = serve(Router::new().route(
            "/api/boulders",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": "Bucket full" })),
                )
            }),
        ))
        .await;

        let response = HttpUploadEndpoint::new(url).submit(&request()).await.unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Bucket full"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let endpoint = HttpUploadEndpoint::new("http://127.0.0.1:1/api/boulders");
        assert!(endpoint.submit(&request()).await.is_err());
    }
}
