use async_trait::async_trait;

use crate::domain::models::{Device, DeviceId, Holder, HolderId, NestId, TechNest};

/// Persistence of holders, nests and devices.
///
/// `add_*` return the id assigned to the new row. A duplicate fails with
/// `DomainError::AlreadyExists`.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn add_holder(&mut self, holder: Holder) -> anyhow::Result<HolderId>;

    async fn get_holder(&self, id: HolderId) -> anyhow::Result<Option<Holder>>;

    async fn add_nest(&mut self, nest: TechNest) -> anyhow::Result<NestId>;

    async fn get_nest(&self, id: NestId) -> anyhow::Result<Option<TechNest>>;

    async fn get_nests_by_holder(&self, holder: HolderId) -> anyhow::Result<Vec<TechNest>>;

    async fn add_device(&mut self, device: Device) -> anyhow::Result<DeviceId>;

    async fn get_devices(&self, nest: NestId) -> anyhow::Result<Vec<Device>>;
}

/// One unit of work. Dropping it without `commit` discards every write.
#[async_trait]
pub trait Transaction: Send {
    fn repository(&mut self) -> &mut dyn Repository;

    async fn commit(self: Box<Self>) -> anyhow::Result<()>;

    async fn rollback(self: Box<Self>) -> anyhow::Result<()>;
}

#[async_trait]
pub trait UnitOfWork: Send + Sync + 'static {
    async fn begin(&self) -> anyhow::Result<Box<dyn Transaction>>;
}
