use std::net::IpAddr;
use std::time::Duration;

use hmac::{Hmac, Mac};
use loco_rs::prelude::*;
use rand::RngCore;
use sea_orm::DatabaseConnection;
use sha2::Sha256;
use uuid::Uuid;

use crate::models::webhook_subscription::WebhookSubscription;
use crate::services::errors::WebhookError;

type HmacSha256 = Hmac<Sha256>;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_DELAYS_MS: [u64; 3] = [5_000, 10_000, 20_000];
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub struct WebhookVerification {
    pub valid: bool,
    pub reason: Option<String>,
}

/// Best-effort, signed, retried HTTP fan-out to per-workspace subscriber endpoints.
pub struct WebhookService {
    client: reqwest::Client,
}

impl WebhookService {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(DELIVERY_TIMEOUT)
                .build()
                .expect("reqwest client configuration is valid"),
        }
    }

    pub fn generate_secret() -> String {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Rejects non-HTTPS URLs and URLs whose resolved address falls in a loopback,
    /// RFC1918 private, or link-local range.
    pub async fn validate_callback_url(callback_url: &str) -> Result<(), WebhookError> {
        let parsed = url::Url::parse(callback_url).map_err(|e| WebhookError::InvalidUrl(e.to_string()))?;

        if parsed.scheme() != "https" {
            return Err(WebhookError::NotHttps);
        }

        let host = parsed.host_str().ok_or_else(|| WebhookError::InvalidUrl("missing host".to_string()))?;
        let port = parsed.port_or_known_default().unwrap_or(443);

        let addrs = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| WebhookError::InvalidUrl(e.to_string()))?;

        for addr in addrs {
            if Self::is_disallowed_address(addr.ip()) {
                return Err(WebhookError::PrivateAddress);
            }
        }

        Ok(())
    }

    fn is_disallowed_address(ip: IpAddr) -> bool {
        match ip {
            IpAddr::V4(v4) => v4.is_loopback() || v4.is_private() || v4.is_link_local(),
            IpAddr::V6(v6) => v6.is_loopback() || v6.is_unicast_link_local(),
        }
    }

    pub async fn create_subscription(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        user_id: Uuid,
        callback_url: String,
        event_types: Vec<String>,
    ) -> Result<WebhookSubscription> {
        Self::validate_callback_url(&callback_url)
            .await
            .map_err(loco_rs::Error::from)?;

        let secret_key = Self::generate_secret();
        WebhookSubscription::create(db, workspace_id, callback_url, event_types, secret_key, user_id).await
    }

    fn compute_signature(secret_key: &str, timestamp: i64, body: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
            .expect("HMAC accepts a key of any length");
        mac.update(format!("{timestamp}.{body}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    pub fn verify_webhook_signature(
        body: &str,
        signature: &str,
        timestamp: &str,
        secret_key: &str,
    ) -> WebhookVerification {
        let Ok(timestamp) = timestamp.parse::<i64>() else {
            return WebhookVerification { valid: false, reason: Some("Invalid timestamp".to_string()) };
        };

        let now = chrono::Utc::now().timestamp();
        if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
            return WebhookVerification { valid: false, reason: Some("Webhook timestamp too old".to_string()) };
        }

        let expected = Self::compute_signature(secret_key, timestamp, body);
        let provided = signature.strip_prefix("sha256=").unwrap_or(signature);

        if !constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
            return WebhookVerification { valid: false, reason: Some("Signature mismatch".to_string()) };
        }

        WebhookVerification { valid: true, reason: None }
    }

    /// Looks up active subscriptions for `payload["event"]` and fans delivery out
    /// concurrently. Never returns an error to the caller; every failure is logged.
    pub async fn deliver_event(&self, db: &DatabaseConnection, workspace_id: Uuid, payload: serde_json::Value) {
        let event = payload.get("event").and_then(|v| v.as_str()).unwrap_or("").to_string();

        let subscriptions = match WebhookSubscription::active_for_workspace_and_event(db, workspace_id, &event).await
        {
            Ok(subs) => subs,
            Err(err) => {
                tracing::error!(error = %err, workspace_id = %workspace_id, event = %event, "failed to look up webhook subscriptions");
                return;
            }
        };

        let body = payload.to_string();
        let deliveries = subscriptions.into_iter().map(|sub| {
            let client = self.client.clone();
            let body = body.clone();
            async move {
                Self::deliver_with_retries(&client, &sub, &body).await;
            }
        });

        futures::future::join_all(deliveries).await;
    }

    async fn deliver_with_retries(client: &reqwest::Client, subscription: &WebhookSubscription, body: &str) {
        for (attempt, delay_ms) in std::iter::once(0).chain(RETRY_DELAYS_MS).enumerate() {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let timestamp = chrono::Utc::now().timestamp();
            let signature = Self::compute_signature(&subscription.secret_key, timestamp, body);

            let result = client
                .post(&subscription.callback_url)
                .header("Content-Type", "application/json")
                .header("X-Webhook-Timestamp", timestamp.to_string())
                .header("X-Webhook-Signature", format!("sha256={signature}"))
                .body(body.to_string())
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => return,
                Ok(response) => {
                    tracing::warn!(
                        subscription_id = %subscription.id,
                        status = %response.status(),
                        attempt,
                        "webhook delivery returned non-2xx"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        subscription_id = %subscription.id,
                        error = %err,
                        attempt,
                        "webhook delivery transport error"
                    );
                }
            }
        }

        tracing::error!(subscription_id = %subscription.id, "webhook delivery exhausted all retries");
    }
}

impl Default for WebhookService {
    fn default() -> Self {
        Self::new()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_expired_timestamp() {
        let old_timestamp = (chrono::Utc::now().timestamp() - 1000).to_string();
        let result = WebhookService::verify_webhook_signature("{}", "sha256=deadbeef", &old_timestamp, "secret");
        assert!(!result.valid);
        assert_eq!(result.reason.as_deref(), Some("Webhook timestamp too old"));
    }

    #[test]
    fn rejects_non_numeric_timestamp() {
        let result = WebhookService::verify_webhook_signature("{}", "sha256=deadbeef", "not-a-number", "secret");
        assert!(!result.valid);
        assert_eq!(result.reason.as_deref(), Some("Invalid timestamp"));
    }

    #[test]
    fn accepts_matching_signature() {
        let timestamp = chrono::Utc::now().timestamp();
        let body = r#"{"event":"job.completed"}"#;
        let signature = WebhookService::compute_signature("secret", timestamp, body);

        let result = WebhookService::verify_webhook_signature(
            body,
            &format!("sha256={signature}"),
            &timestamp.to_string(),
            "secret",
        );
        assert!(result.valid);
    }

    #[test]
    fn rejects_mismatched_signature() {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let result = WebhookService::verify_webhook_signature("{}", "sha256=not-the-right-signature", &timestamp, "secret");
        assert!(!result.valid);
        assert_eq!(result.reason.as_deref(), Some("Signature mismatch"));
    }

    #[test]
    fn disallows_private_and_loopback_addresses() {
        use std::net::Ipv4Addr;
        assert!(WebhookService::is_disallowed_address(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))));
        assert!(WebhookService::is_disallowed_address(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))));
        assert!(WebhookService::is_disallowed_address(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))));
        assert!(WebhookService::is_disallowed_address(IpAddr::V4(Ipv4Addr::new(169, 254, 0, 1))));
        assert!(!WebhookService::is_disallowed_address(IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))));
    }
}
