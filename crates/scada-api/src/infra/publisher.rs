use nest_mediator::BrokerMessage;
use serde::Serialize;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::{error, info, warn};

use crate::infra::output::LineWriter;

#[derive(Serialize)]
struct Published<'a> {
    event: &'a BrokerMessage,
}

/// Writes every broker message to `output` as `{"event": {...}}` until the
/// broker is dropped.
pub async fn forward(mut rx: Receiver<BrokerMessage>, output: LineWriter) {
    loop {
        match rx.recv().await {
            Ok(message) => {
                if let Err(e) = output.write_json(&Published { event: &message }).await {
                    error!("failed to publish {}: {}", message.message_name, e);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "publisher lagged behind, messages dropped");
            }
            Err(RecvError::Closed) => {
                info!("broker closed, publisher stopping");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use nest_mediator::{BroadcastBroker, MessageBroker};
    use serde_json::{Value, json};
    use tokio::io::{AsyncBufReadExt, BufReader};
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn test_messages_are_written_until_the_broker_closes() {
        let broker = BroadcastBroker::new(4);
        let (writer, reader) = tokio::io::duplex(4096);
        let task = tokio::spawn(forward(broker.subscribe(), LineWriter::new(writer)));

        let message = BrokerMessage {
            message_type: "notification_event".into(),
            message_name: "TechNestIndicatorsUpdated".into(),
            message_id: Uuid::new_v4(),
            payload: json!({"nest": 1}),
        };
        broker.send_message(message).await.unwrap();
        drop(broker);
        task.await.unwrap();

        let mut lines = BufReader::new(reader).lines();
        let line: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(line["event"]["message_name"], "TechNestIndicatorsUpdated");
        assert_eq!(line["event"]["payload"]["nest"], 1);
        assert_eq!(lines.next_line().await.unwrap(), None);
    }
}
