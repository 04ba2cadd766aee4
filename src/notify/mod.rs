//! Notification fan-out
//!
//! When a board item is archived, its final state is delivered to every
//! configured downstream service whose label appears among the item's labels.
//! Deliveries are fire-and-forget per service: one failure never prevents the
//! remaining attempts.

use crate::board::BoardItem;
use crate::config::ServiceConfig;
use crate::{BoardSyncError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Per-request timeout for notification deliveries
const POST_TIMEOUT: Duration = Duration::from_secs(10);

/// Authentication header carrying the service's shared secret
const SECRET_HEADER: &str = "X-Api-Key";

/// Outbound delivery surface, kept behind a trait so the fan-out logic is
/// testable without a network
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn post(&self, endpoint: &str, secret: &str, payload: &serde_json::Value) -> Result<()>;
}

/// HTTP transport: POST the payload as JSON with the secret header
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder().build().map_err(BoardSyncError::Http)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NotificationTransport for HttpTransport {
    async fn post(&self, endpoint: &str, secret: &str, payload: &serde_json::Value) -> Result<()> {
        let response = self
            .client
            .post(endpoint)
            .header(SECRET_HEADER, secret)
            .json(payload)
            .timeout(POST_TIMEOUT)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(BoardSyncError::Other(format!(
                "status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Deliver the item's current state to every service matching one of its
/// labels. Attempts run concurrently; failures are collected, never fatal.
pub async fn notify(
    item: &BoardItem,
    services: &[ServiceConfig],
    transport: &dyn NotificationTransport,
) -> Vec<BoardSyncError> {
    let payload = match serde_json::to_value(item) {
        Ok(value) => value,
        Err(e) => return vec![e.into()],
    };

    let deliveries = services
        .iter()
        .filter(|svc| item.labels.contains(&svc.label))
        .map(|svc| {
            let payload = &payload;
            async move {
                transport
                    .post(&svc.endpoint, &svc.secret, payload)
                    .await
                    .map_err(|e| BoardSyncError::Notification {
                        endpoint: svc.endpoint.clone(),
                        message: e.to_string(),
                    })
            }
        });

    futures::future::join_all(deliveries)
        .await
        .into_iter()
        .filter_map(Result::err)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        posts: Mutex<Vec<(String, String)>>,
        fail_endpoints: Vec<String>,
    }

    #[async_trait]
    impl NotificationTransport for RecordingTransport {
        async fn post(
            &self,
            endpoint: &str,
            secret: &str,
            _payload: &serde_json::Value,
        ) -> Result<()> {
            if self.fail_endpoints.iter().any(|e| e == endpoint) {
                return Err(BoardSyncError::Other("connection refused".into()));
            }
            self.posts
                .lock()
                .unwrap()
                .push((endpoint.to_string(), secret.to_string()));
            Ok(())
        }
    }

    fn archived_item(labels: &[&str]) -> BoardItem {
        BoardItem {
            id: "item-1".into(),
            name: "done task".into(),
            description: String::new(),
            due_date: None,
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn service(label: &str, endpoint: &str) -> ServiceConfig {
        ServiceConfig {
            label: label.into(),
            secret: format!("{}-secret", label),
            endpoint: endpoint.into(),
        }
    }

    #[tokio::test]
    async fn test_notifies_only_matching_labels() {
        let transport = RecordingTransport::default();
        let services = vec![
            service("lbl-a", "https://a.example.com"),
            service("lbl-b", "https://b.example.com"),
        ];

        let errors = notify(&archived_item(&["lbl-a"]), &services, &transport).await;

        assert!(errors.is_empty());
        let posts = transport.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "https://a.example.com");
        assert_eq!(posts[0].1, "lbl-a-secret");
    }

    #[tokio::test]
    async fn test_no_matching_service_is_a_noop() {
        let transport = RecordingTransport::default();
        let services = vec![service("lbl-a", "https://a.example.com")];

        let errors = notify(&archived_item(&["lbl-z"]), &services, &transport).await;

        assert!(errors.is_empty());
        assert!(transport.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_other_deliveries() {
        let transport = RecordingTransport {
            fail_endpoints: vec!["https://a.example.com".into()],
            ..Default::default()
        };
        let services = vec![
            service("lbl-a", "https://a.example.com"),
            service("lbl-a", "https://b.example.com"),
        ];

        let errors = notify(&archived_item(&["lbl-a"]), &services, &transport).await;

        assert_eq!(errors.len(), 1);
        let posts = transport.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "https://b.example.com");
    }

    #[tokio::test]
    async fn test_item_with_multiple_labels_hits_each_service_once() {
        let transport = RecordingTransport::default();
        let services = vec![
            service("lbl-a", "https://a.example.com"),
            service("lbl-b", "https://b.example.com"),
        ];

        let errors = notify(&archived_item(&["lbl-a", "lbl-b"]), &services, &transport).await;

        assert!(errors.is_empty());
        assert_eq!(transport.posts.lock().unwrap().len(), 2);
    }
}
