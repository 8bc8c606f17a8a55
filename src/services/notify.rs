//! Notification relay: fan-out of status-change and assignment events to the
//! email/in-app collaborator.
//!
//! Delivery is fire-and-forget relative to the triggering transaction. A
//! failed delivery is retried a bounded number of times with backoff and then
//! only logged; it never rolls back or surfaces to the caller.

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;

const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF_MS: u64 = 500;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    StatusChanged {
        booking_id: Uuid,
        reference: String,
        old_status: String,
        new_status: String,
    },
    FleetAssigned {
        booking_id: Uuid,
        reference: String,
        fleet_id: Uuid,
    },
    TrackingLink {
        booking_id: Uuid,
        reference: String,
        customer_email: String,
        token: String,
    },
    InvoiceIssued {
        invoice_id: Uuid,
        invoice_number: String,
        entity_name: String,
    },
}

/// Queue a notification for out-of-band delivery. Returns immediately.
pub fn dispatch(config: &Config, notification: Notification) {
    let Some(url) = config.notify_webhook_url.clone() else {
        tracing::debug!(?notification, "notification webhook not configured, dropping");
        return;
    };

    tokio::spawn(async move {
        if let Err(err) = deliver(&url, &notification).await {
            tracing::error!(
                ?notification,
                error = %err,
                "notification delivery failed after {} attempts",
                MAX_ATTEMPTS
            );
        }
    });
}

async fn deliver(url: &str, notification: &Notification) -> Result<(), String> {
    let client = reqwest::Client::new();
    let mut last_err = String::new();

    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            let backoff = Duration::from_millis(BASE_BACKOFF_MS << (attempt - 1));
            tokio::time::sleep(backoff).await;
        }

        match client.post(url).json(notification).send().await {
            Ok(response) if response.status().is_success() => return Ok(()),
            Ok(response) => {
                tracing::warn!(
                    status = %response.status(),
                    attempt = attempt + 1,
                    "notification webhook returned error status"
                );
                last_err = format!("webhook returned {}", response.status());
            }
            Err(err) => {
                tracing::warn!(error = %err, attempt = attempt + 1, "notification send failed");
                last_err = err.to_string();
            }
        }
    }

    Err(last_err)
}
