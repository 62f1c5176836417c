use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::Notifier;
use crate::error::DeliveryError;

/// Posts the digest as `{"text": ...}` JSON to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: Client,
    endpoint: Url,
}

impl WebhookNotifier {
    pub fn new(target: &str) -> Result<Self, DeliveryError> {
        let endpoint = Url::parse(target.trim())
            .map_err(|err| DeliveryError::Target(format!("{}: {}", target, err)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(DeliveryError::Target(format!(
                "unsupported scheme {}",
                endpoint.scheme()
            )));
        }
        let http = Client::builder()
            .user_agent(concat!("news-notifier/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;
        Ok(Self { http, endpoint })
    }

    pub fn build_request(&self, message: &str) -> Result<reqwest::Request, DeliveryError> {
        self.http
            .post(self.endpoint.clone())
            .json(&payload(message))
            .build()
            .map_err(|err| DeliveryError::Transport(err.to_string()))
    }
}

pub fn payload(message: &str) -> Value {
    json!({ "text": message })
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn publish(&self, message: &str) -> Result<(), DeliveryError> {
        let request = self.build_request(message)?;
        let res = self
            .http
            .execute(request)
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, "webhook rejected digest");
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        info!(%status, "digest delivered to webhook");
        Ok(())
    }
}
