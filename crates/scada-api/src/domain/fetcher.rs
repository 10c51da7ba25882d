use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::models::InboundRequest;

#[async_trait]
pub trait RequestFetcher: Send + Sync + 'static {
    async fn fetch(&self) -> mpsc::Receiver<InboundRequest>;
}
