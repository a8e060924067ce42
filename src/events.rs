//! Best-effort event publication for downstream collaborators.
//!
//! Order creation and status changes are announced on NATS when a client is
//! configured. Publication never fails the request; a broker outage costs an
//! event, not an order.

use serde_json::Value;

pub const ORDER_CREATED: &str = "orders.created";
pub const ORDER_STATUS: &str = "orders.status";

pub async fn publish(nats: &Option<async_nats::Client>, subject: &str, payload: Value) {
    let Some(client) = nats else { return };
    if let Err(err) = client
        .publish(subject.to_string(), payload.to_string().into())
        .await
    {
        tracing::warn!(subject, error = %err, "failed to publish event");
    }
}
