use std::sync::Arc;

use anyhow::Error;
use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::error;

use crate::{
    domain::{consumer::RequestConsumer, models::InboundRequest},
    infra::{consumer::router::RequestRouter, output::LineWriter},
};

pub struct Consumer {
    router: Arc<RequestRouter>,
    output: LineWriter,
    concurrency: usize,
}

impl Consumer {
    pub fn new(router: RequestRouter, output: LineWriter, concurrency: usize) -> Self {
        Self {
            router: Arc::new(router),
            output,
            concurrency: concurrency.max(1),
        }
    }
}

#[async_trait]
impl RequestConsumer for Consumer {
    /// Replies are written as requests complete, not in arrival order.
    async fn consume(&self, ch: mpsc::Receiver<InboundRequest>) {
        ReceiverStream::new(ch)
            .map(|request| {
                let router = self.router.clone();
                let output = self.output.clone();
                async move {
                    let reply = router.handle(request).await;
                    if let Err(e) = output.write_json(&reply).await {
                        handle_error(e);
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }
}

fn handle_error(e: Error) {
    error!("failed to write reply: {}", e);
}

#[cfg(test)]
mod tests {
    use nest_mediator::{BroadcastBroker, MiddlewareChain};
    use serde_json::{Value, json};
    use tokio::io::{AsyncBufReadExt, BufReader};

    use super::*;
    use crate::service::{Dependencies, bootstrap, setup_mediator};

    #[tokio::test]
    async fn test_every_request_gets_one_reply_line() {
        let mediator = setup_mediator(
            Dependencies::in_memory(),
            Arc::new(BroadcastBroker::default()),
            MiddlewareChain::new(),
        );
        let router = RequestRouter::new(bootstrap::registry(), mediator);
        let (writer, reader) = tokio::io::duplex(64 * 1024);
        let consumer = Consumer::new(router, LineWriter::new(writer), 4);

        let (tx, rx) = mpsc::channel(8);
        let lines = [
            json!({"type": "CreateHolder", "body": {"name": "Acme", "inn": "7812003110"}}),
            json!({"type": "CreateHolder", "body": {"name": "Beta", "inn": "500100732259"}}),
            json!({"type": "Ping"}),
        ];
        for line in &lines {
            tx.send(line.to_string().into()).await.unwrap();
        }
        drop(tx);

        consumer.consume(rx).await;
        drop(consumer);

        let mut replies = Vec::new();
        let mut reader = BufReader::new(reader).lines();
        while let Some(line) = reader.next_line().await.unwrap() {
            replies.push(serde_json::from_str::<Value>(&line).unwrap());
        }

        assert_eq!(replies.len(), 3);
        let ok = replies.iter().filter(|r| r["ok"] == true).count();
        assert_eq!(ok, 2);
    }
}
