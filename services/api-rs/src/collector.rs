//! Clients for the analytics collection endpoint.

use async_trait::async_trait;
use evsim_generator::{random, Payload};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::DispatchError;

/// Call surface of the events client: identify a user, track an action,
/// record a page view.
#[async_trait]
pub trait Collector: Send + Sync {
    async fn identify(&self, user_id: &str, traits: &Payload) -> Result<(), DispatchError>;

    async fn track(&self, event: &str, properties: &Payload) -> Result<(), DispatchError>;

    async fn page(&self) -> Result<(), DispatchError>;
}

/// `https://{host}` unless the host already names a scheme.
pub fn base_url(api_host: &str) -> String {
    let host = api_host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// Posts Segment-style JSON to `{base}/v1/{identify,track,page}`, authenticated
/// with the write key as the basic-auth user.
pub struct HttpCollector {
    client: Client,
    write_key: String,
    base_url: String,
    anonymous_id: String,
}

impl HttpCollector {
    pub fn new(client: Client, write_key: &str, api_host: &str) -> Self {
        let anonymous_id = random::prefixed_id(&mut rand::thread_rng(), "anon");
        Self {
            client,
            write_key: write_key.to_string(),
            base_url: base_url(api_host),
            anonymous_id,
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    async fn send(&self, path: &'static str, mut body: Value) -> Result<(), DispatchError> {
        body["timestamp"] = json!(random::iso_now());
        body["context"] = json!({
            "library": { "name": env!("CARGO_PKG_NAME"), "version": env!("CARGO_PKG_VERSION") }
        });

        let resp = self
            .client
            .post(self.endpoint(path))
            .basic_auth(&self.write_key, Some(""))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            debug!(path, %status, "collector accepted call");
            Ok(())
        } else {
            Err(DispatchError::Rejected {
                path,
                status,
                body: resp.text().await.unwrap_or_default(),
            })
        }
    }
}

#[async_trait]
impl Collector for HttpCollector {
    async fn identify(&self, user_id: &str, traits: &Payload) -> Result<(), DispatchError> {
        self.send(
            "identify",
            json!({ "type": "identify", "userId": user_id, "traits": traits }),
        )
        .await
    }

    async fn track(&self, event: &str, properties: &Payload) -> Result<(), DispatchError> {
        self.send(
            "track",
            json!({
                "type": "track",
                "event": event,
                "properties": properties,
                "anonymousId": self.anonymous_id,
            }),
        )
        .await
    }

    async fn page(&self) -> Result<(), DispatchError> {
        self.send(
            "page",
            json!({ "type": "page", "anonymousId": self.anonymous_id, "properties": {} }),
        )
        .await
    }
}

/// Dry-run collector: every call is logged and reported as delivered.
pub struct LogCollector {
    write_key: String,
    api_host: String,
}

impl LogCollector {
    pub fn new(write_key: &str, api_host: &str) -> Self {
        Self {
            write_key: write_key.to_string(),
            api_host: api_host.to_string(),
        }
    }
}

#[async_trait]
impl Collector for LogCollector {
    async fn identify(&self, user_id: &str, traits: &Payload) -> Result<(), DispatchError> {
        info!(host = %self.api_host, user_id, traits = traits.len(), "dry-run identify");
        Ok(())
    }

    async fn track(&self, event: &str, properties: &Payload) -> Result<(), DispatchError> {
        info!(host = %self.api_host, event, properties = properties.len(), "dry-run track");
        Ok(())
    }

    async fn page(&self) -> Result<(), DispatchError> {
        info!(host = %self.api_host, key_len = self.write_key.len(), "dry-run page");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::{header::AUTHORIZATION, HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use std::sync::{Arc, Mutex};

    /// `(path segment, Authorization header, body)` per received call.
    type Received = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

    async fn collector_stub(reply: StatusCode) -> (String, Received) {
        let received: Received = Arc::default();
        let sink = received.clone();
        let app = Router::new().route(
            "/v1/:kind",
            post(move |Path(kind): Path<String>, headers: HeaderMap, Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    let auth = headers
                        .get(AUTHORIZATION)
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    sink.lock().unwrap().push((kind, auth, body));
                    reply
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), received)
    }

    #[test]
    fn base_url_adds_https() {
        assert_eq!(
            base_url("us-east-1.hightouch-events.com"),
            "https://us-east-1.hightouch-events.com"
        );
        assert_eq!(base_url(" http://localhost:9000/ "), "http://localhost:9000");
        assert_eq!(base_url("https://eu.example.com"), "https://eu.example.com");
    }

    #[test]
    fn endpoints_hang_off_v1() {
        let collector = HttpCollector::new(Client::new(), "wk", "collector.test");
        assert_eq!(collector.endpoint("track"), "https://collector.test/v1/track");
        assert!(collector.anonymous_id.starts_with("anon_"));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_error() {
        let collector = HttpCollector::new(Client::new(), "wk", "http://127.0.0.1:1");
        let err = collector.track("Cart Viewed", &Payload::new()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Request(_)));
    }

    #[tokio::test]
    async fn track_posts_segment_body_with_basic_auth() {
        let (host, received) = collector_stub(StatusCode::OK).await;
        let collector = HttpCollector::new(Client::new(), "wk", &host);
        let mut properties = Payload::new();
        properties.insert("currency".into(), json!("USD"));

        collector.track("Cart Viewed", &properties).await.unwrap();

        let received = received.lock().unwrap();
        let (kind, auth, body) = &received[0];
        assert_eq!(kind, "track");
        // base64("wk:")
        assert_eq!(auth.as_deref(), Some("Basic d2s6"));
        assert_eq!(body["type"], "track");
        assert_eq!(body["event"], "Cart Viewed");
        assert_eq!(body["properties"]["currency"], "USD");
        assert_eq!(body["anonymousId"], collector.anonymous_id.as_str());
        assert_eq!(body["context"]["library"]["name"], "evsim-api");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn identify_and_page_hit_their_own_paths() {
        let (host, received) = collector_stub(StatusCode::OK).await;
        let collector = HttpCollector::new(Client::new(), "wk", &host);
        let mut traits = Payload::new();
        traits.insert("email".into(), json!("jane@example.com"));

        collector.identify("user_abc", &traits).await.unwrap();
        collector.page().await.unwrap();

        let received = received.lock().unwrap();
        let kinds: Vec<&str> = received.iter().map(|(kind, _, _)| kind.as_str()).collect();
        assert_eq!(kinds, vec!["identify", "page"]);

        let identify = &received[0].2;
        assert_eq!(identify["type"], "identify");
        assert_eq!(identify["userId"], "user_abc");
        assert_eq!(identify["traits"]["email"], "jane@example.com");

        let page = &received[1].2;
        assert_eq!(page["type"], "page");
        assert_eq!(page["anonymousId"], collector.anonymous_id.as_str());
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (host, received) = collector_stub(StatusCode::BAD_REQUEST).await;
        let collector = HttpCollector::new(Client::new(), "wk", &host);

        let err = collector.track("Cart Viewed", &Payload::new()).await.unwrap_err();

        match err {
            DispatchError::Rejected { path, status, .. } => {
                assert_eq!(path, "track");
                assert_eq!(status.as_u16(), 400);
            }
            other => panic!("expected a rejection, got {other}"),
        }
        assert_eq!(received.lock().unwrap().len(), 1);
    }
}
