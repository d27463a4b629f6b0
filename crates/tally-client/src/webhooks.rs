//! # Webhook Management
//!
//! Idempotent management of the platform's webhook subscriptions: the back
//! office declares which topics it wants delivered where, and `ensure_*`
//! converges the platform to that state. Receiving webhook deliveries is a
//! separate system; this module only manages subscriptions.
//!
//! The platform's webhook endpoints are not consistent about their reply
//! wrapper, so listing tolerates every shape observed in the wild: a bare
//! array, `{"webhooks": [..]}`, `{"data": [..]}`, a single `{"webhook":
//! {..}}`, and `{"webhooks": {id: {..}}}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};
use crate::http::RetailClient;

// =============================================================================
// Webhook Shape
// =============================================================================

/// A webhook subscription on the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    #[serde(default)]
    pub id: String,

    /// Topic the platform delivers, e.g. "sale.update".
    #[serde(rename = "type", default)]
    pub topic: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Serialize)]
struct CreateWebhook<'a> {
    #[serde(rename = "type")]
    topic: &'a str,
    url: &'a str,
    active: bool,
}

#[derive(Debug, Serialize)]
struct UpdateWebhook<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    active: Option<bool>,
}

// =============================================================================
// Operations
// =============================================================================

impl RetailClient {
    /// Lists all webhook subscriptions, whatever wrapper the platform
    /// chose to reply with.
    pub async fn list_webhooks(&self) -> ClientResult<Vec<Webhook>> {
        let raw: Value = self.get_json("webhooks").await?;
        normalize_webhook_list(raw, &self.endpoint_url("webhooks"))
    }

    /// Creates a new webhook subscription.
    pub async fn create_webhook(
        &self,
        topic: &str,
        url: &str,
        active: bool,
    ) -> ClientResult<Webhook> {
        info!(topic, url, "Creating webhook");
        self.post_json("webhooks", &CreateWebhook { topic, url, active })
            .await
    }

    /// Updates the URL and/or active flag of an existing subscription.
    pub async fn update_webhook(
        &self,
        webhook_id: &str,
        url: Option<&str>,
        active: Option<bool>,
    ) -> ClientResult<Webhook> {
        info!(webhook_id, "Updating webhook");
        self.put_json(
            &format!("webhooks/{}", webhook_id),
            &UpdateWebhook { url, active },
        )
        .await
    }

    /// Deletes a subscription.
    pub async fn delete_webhook(&self, webhook_id: &str) -> ClientResult<()> {
        info!(webhook_id, "Deleting webhook");
        self.delete(&format!("webhooks/{}", webhook_id)).await
    }

    /// Finds the subscription for a topic, if any.
    pub async fn find_webhook_by_topic(&self, topic: &str) -> ClientResult<Option<Webhook>> {
        Ok(self
            .list_webhooks()
            .await?
            .into_iter()
            .find(|wh| wh.topic == topic))
    }

    /// Idempotent: creates the subscription if missing, updates it if it
    /// exists but differs, leaves it alone otherwise.
    pub async fn ensure_webhook(
        &self,
        topic: &str,
        url: &str,
        active: bool,
    ) -> ClientResult<Webhook> {
        match self.find_webhook_by_topic(topic).await? {
            None => self.create_webhook(topic, url, active).await,
            Some(current) if webhook_differs(&current, url, active) => {
                self.update_webhook(&current.id, Some(url), Some(active)).await
            }
            Some(current) => {
                debug!(topic, "Webhook already as desired");
                Ok(current)
            }
        }
    }

    /// Converges a whole set of (topic, url) subscriptions.
    pub async fn ensure_webhooks(
        &self,
        desired: &[(&str, &str)],
        active: bool,
    ) -> ClientResult<BTreeMap<String, Webhook>> {
        let mut out = BTreeMap::new();
        for (topic, url) in desired {
            let webhook = self.ensure_webhook(topic, url, active).await?;
            out.insert((*topic).to_string(), webhook);
        }
        Ok(out)
    }
}

// =============================================================================
// Reply Normalization
// =============================================================================

/// True when an existing subscription does not match the desired state.
fn webhook_differs(current: &Webhook, url: &str, active: bool) -> bool {
    current.url.as_deref() != Some(url) || current.active != active
}

/// Normalizes the webhook-list reply into a plain vector.
fn normalize_webhook_list(raw: Value, url: &str) -> ClientResult<Vec<Webhook>> {
    let decode = |value: Value| -> ClientResult<Vec<Webhook>> {
        serde_json::from_value(value).map_err(|e| ClientError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    };

    match raw {
        Value::Array(_) => decode(raw),
        Value::Object(mut obj) => {
            match obj.remove("webhooks") {
                Some(list @ Value::Array(_)) => return decode(list),
                // Keyed by id: the values are the webhooks
                Some(Value::Object(by_id)) => {
                    return decode(Value::Array(by_id.into_iter().map(|(_, v)| v).collect()));
                }
                _ => {}
            }
            if let Some(list @ Value::Array(_)) = obj.remove("data") {
                return decode(list);
            }
            if let Some(single @ Value::Object(_)) = obj.remove("webhook") {
                return decode(Value::Array(vec![single]));
            }
            // Last resort: a single bare object is a one-element list
            decode(Value::Array(vec![Value::Object(obj)]))
        }
        other => Err(ClientError::Decode {
            url: url.to_string(),
            message: format!("unexpected webhooks reply shape: {}", other),
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
