//! In-process HTTP upstream for exercising the outbound API clients.

use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Json;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct Upstream {
    pub base_url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}
impl Upstream {
    /// Answers every request with `status` and `response`, recording what was sent.
    pub async fn start(status: StatusCode, response: Value) -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let recorder = captured.clone();

        let app = axum::Router::new().fallback(
            move |uri: Uri, headers: HeaderMap, Json(body): Json<Value>| {
                let recorder = recorder.clone();
                let response = response.clone();
                async move {
                    recorder.lock().await.push(CapturedRequest {
                        path: uri.path().to_string(),
                        headers,
                        body,
                    });
                    (status, Json(response))
                }
            },
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{address}"),
            captured,
        }
    }

    pub async fn single_request(&self) -> CapturedRequest {
        let captured = self.captured.lock().await;
        assert_eq!(captured.len(), 1, "Expected exactly one upstream request");
        captured[0].clone()
    }
}
