use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::MediatorError,
    event::{EventHeader, EventKind},
    message::Message,
};

/// What the emitter hands to the message broker.
///
/// `payload` is the JSON object of the event payload with `event_id` and
/// `event_timestamp` merged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerMessage {
    pub message_type: String,
    pub message_name: String,
    pub message_id: Uuid,
    pub payload: Value,
}

impl BrokerMessage {
    pub fn from_event(
        kind: EventKind,
        header: &EventHeader,
        payload: &dyn Message,
    ) -> Result<Self, MediatorError> {
        let body = payload
            .to_json()
            .map_err(|source| MediatorError::Serialization {
                type_name: header.name,
                source,
            })?;

        let mut fields = match body {
            Value::Object(fields) => fields,
            other => {
                let mut fields = Map::new();
                fields.insert("payload".to_owned(), other);
                fields
            }
        };
        fields.insert("event_id".to_owned(), Value::String(header.id.to_string()));
        fields.insert(
            "event_timestamp".to_owned(),
            Value::String(header.timestamp.to_rfc3339()),
        );

        Ok(Self {
            message_type: kind.message_type().to_owned(),
            message_name: header.name.to_owned(),
            message_id: header.id,
            payload: Value::Object(fields),
        })
    }
}

/// External publisher for notification and ECST events. Fire and forget: no
/// delivery confirmation, no retry.
#[async_trait]
pub trait MessageBroker: Send + Sync + 'static {
    async fn send_message(&self, message: BrokerMessage) -> anyhow::Result<()>;
}

/// In-process broker. Subscribers get every message sent after they
/// subscribed; messages sent with no subscriber are dropped.
#[derive(Debug, Clone)]
pub struct BroadcastBroker {
    tx: broadcast::Sender<BrokerMessage>,
}

impl BroadcastBroker {
    pub const DEFAULT_CAPACITY: usize = 256;

    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BrokerMessage> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastBroker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl MessageBroker for BroadcastBroker {
    async fn send_message(&self, message: BrokerMessage) -> anyhow::Result<()> {
        let name = message.message_name.clone();
        match self.tx.send(message) {
            Ok(receivers) => debug!(message = %name, receivers, "message broadcast"),
            Err(_) => debug!(message = %name, "no subscribers, message dropped"),
        }
        Ok(())
    }
}
