use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::models::InboundRequest;

#[async_trait]
pub trait RequestConsumer: Send + Sync + 'static {
    async fn consume(&self, ch: mpsc::Receiver<InboundRequest>);
}
