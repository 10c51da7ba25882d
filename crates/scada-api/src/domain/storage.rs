use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::indicators::{DeviceIndicatorsValues, TechNestIndicatorsValues};

/// Latest indicator values keyed by nest or device id.
#[async_trait]
pub trait IndicatorStorage<V>: Send + Sync + 'static
where
    V: Send + Sync + 'static,
{
    async fn set_value(&self, id: u64, value: V) -> anyhow::Result<()>;

    async fn get_value(&self, id: u64) -> anyhow::Result<Option<V>>;

    /// One slot per id, in the order asked for.
    async fn get_values(&self, ids: &[u64]) -> anyhow::Result<Vec<Option<V>>>;
}

pub type TechNestStorage = Arc<dyn IndicatorStorage<TechNestIndicatorsValues>>;
pub type DeviceStorage = Arc<dyn IndicatorStorage<DeviceIndicatorsValues>>;
