use std::sync::Arc;

use async_trait::async_trait;
use nest_mediator::RequestHandler;

use crate::{
    domain::{
        DomainError,
        indicators::{DeviceIndicators, TechNestIndicators},
        models::{Holder, NestId},
        repository::{Repository, UnitOfWork},
        storage::{DeviceStorage, TechNestStorage},
    },
    service::{
        queries::{
            GetDevices, GetDevicesIndicators, GetHolder, GetTechNestIndicators, GetTechNests,
        },
        responses::{Devices, DevicesIndicators, TechNests},
    },
};

async fn ensure_nest(repository: &dyn Repository, nest: NestId) -> anyhow::Result<()> {
    match repository.get_nest(nest).await? {
        Some(_) => Ok(()),
        None => Err(DomainError::not_found(format!("Nest with id {nest} not found")).into()),
    }
}

pub struct GetHolderHandler {
    uow: Arc<dyn UnitOfWork>,
}

impl GetHolderHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl RequestHandler<GetHolder> for GetHolderHandler {
    async fn handle(&mut self, request: GetHolder) -> anyhow::Result<Holder> {
        let mut tx = self.uow.begin().await?;
        tx.repository()
            .get_holder(request.holder)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("Holder with id {} not found", request.holder))
                    .into()
            })
    }
}

pub struct GetTechNestsHandler {
    uow: Arc<dyn UnitOfWork>,
}

impl GetTechNestsHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl RequestHandler<GetTechNests> for GetTechNestsHandler {
    async fn handle(&mut self, request: GetTechNests) -> anyhow::Result<TechNests> {
        let mut tx = self.uow.begin().await?;
        if tx.repository().get_holder(request.holder).await?.is_none() {
            return Err(
                DomainError::not_found(format!("Holder with id {} not found", request.holder))
                    .into(),
            );
        }
        let tech_nests = tx.repository().get_nests_by_holder(request.holder).await?;

        Ok(TechNests {
            holder: request.holder,
            tech_nests,
        })
    }
}

pub struct GetDevicesHandler {
    uow: Arc<dyn UnitOfWork>,
}

impl GetDevicesHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl RequestHandler<GetDevices> for GetDevicesHandler {
    async fn handle(&mut self, request: GetDevices) -> anyhow::Result<Devices> {
        let mut tx = self.uow.begin().await?;
        ensure_nest(tx.repository(), request.nest).await?;
        let devices = tx.repository().get_devices(request.nest).await?;

        Ok(Devices {
            tech_nest: request.nest,
            devices,
        })
    }
}

pub struct GetTechNestIndicatorsHandler {
    uow: Arc<dyn UnitOfWork>,
    storage: TechNestStorage,
}

impl GetTechNestIndicatorsHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>, storage: TechNestStorage) -> Self {
        Self { uow, storage }
    }
}

#[async_trait]
impl RequestHandler<GetTechNestIndicators> for GetTechNestIndicatorsHandler {
    async fn handle(&mut self, request: GetTechNestIndicators) -> anyhow::Result<TechNestIndicators> {
        {
            let mut tx = self.uow.begin().await?;
            ensure_nest(tx.repository(), request.nest).await?;
        }

        let values = self.storage.get_value(request.nest).await?.ok_or_else(|| {
            DomainError::not_found(format!(
                "Indicator values for nest {} not found",
                request.nest
            ))
        })?;

        Ok(TechNestIndicators {
            nest: request.nest,
            values,
        })
    }
}

pub struct GetDevicesIndicatorsHandler {
    uow: Arc<dyn UnitOfWork>,
    storage: DeviceStorage,
}

impl GetDevicesIndicatorsHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>, storage: DeviceStorage) -> Self {
        Self { uow, storage }
    }
}

#[async_trait]
impl RequestHandler<GetDevicesIndicators> for GetDevicesIndicatorsHandler {
    async fn handle(&mut self, request: GetDevicesIndicators) -> anyhow::Result<DevicesIndicators> {
        let ids: Vec<u64> = {
            let mut tx = self.uow.begin().await?;
            ensure_nest(tx.repository(), request.nest).await?;
            tx.repository()
                .get_devices(request.nest)
                .await?
                .into_iter()
                .filter_map(|device| device.id)
                .collect()
        };

        let values = self.storage.get_values(&ids).await?;
        let devices = ids
            .into_iter()
            .zip(values)
            .filter_map(|(device, values)| {
                values.map(|values| DeviceIndicators {
                    nest: request.nest,
                    device,
                    values,
                })
            })
            .collect();

        Ok(DevicesIndicators { devices })
    }
}
