use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::storage::IndicatorStorage;

/// Keeps only the latest value per id.
#[derive(Debug)]
pub struct InMemoryIndicatorStorage<V> {
    values: RwLock<HashMap<u64, V>>,
}

impl<V> InMemoryIndicatorStorage<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }
}

impl<V> Default for InMemoryIndicatorStorage<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V> IndicatorStorage<V> for InMemoryIndicatorStorage<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn set_value(&self, id: u64, value: V) -> anyhow::Result<()> {
        self.values.write().await.insert(id, value);
        Ok(())
    }

    async fn get_value(&self, id: u64) -> anyhow::Result<Option<V>> {
        Ok(self.values.read().await.get(&id).cloned())
    }

    async fn get_values(&self, ids: &[u64]) -> anyhow::Result<Vec<Option<V>>> {
        let values = self.values.read().await;
        Ok(ids.iter().map(|id| values.get(id).cloned()).collect())
    }
}
