use std::sync::Arc;

use async_trait::async_trait;
use nest_mediator::{Event, RequestHandler};
use tracing::debug;

use crate::{
    domain::{
        DomainError,
        indicators::{DeviceIndicators, TechNestIndicators},
        models::{Device, Holder, TechNest, TechNestLocation},
        repository::UnitOfWork,
        storage::{DeviceStorage, TechNestStorage},
    },
    service::{
        commands::{
            AddDevice, AddTechNest, CreateHolder, UpdateDeviceIndicators, UpdateTechNestIndicators,
        },
        events::{DeviceIndicatorsUpdated, TechNestIndicatorsUpdated},
        responses::{DeviceAdded, HolderCreated, TechNestAdded},
    },
};

/// Registers a new holder company.
pub struct CreateHolderHandler {
    uow: Arc<dyn UnitOfWork>,
}

impl CreateHolderHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl RequestHandler<CreateHolder> for CreateHolderHandler {
    async fn handle(&mut self, request: CreateHolder) -> anyhow::Result<HolderCreated> {
        let mut tx = self.uow.begin().await?;
        let holder = Holder::new(request.name, request.inn, request.kpp);
        let id = match tx.repository().add_holder(holder).await {
            Ok(id) => id,
            Err(e) => {
                tx.rollback().await?;
                return Err(e);
            }
        };
        tx.commit().await?;

        Ok(HolderCreated { id })
    }
}

pub struct AddTechNestHandler {
    uow: Arc<dyn UnitOfWork>,
}

impl AddTechNestHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl RequestHandler<AddTechNest> for AddTechNestHandler {
    async fn handle(&mut self, request: AddTechNest) -> anyhow::Result<TechNestAdded> {
        let mut tx = self.uow.begin().await?;
        if tx.repository().get_holder(request.holder).await?.is_none() {
            tx.rollback().await?;
            return Err(
                DomainError::not_found(format!("Holder with id {} not found", request.holder))
                    .into(),
            );
        }

        let location = TechNestLocation::new(request.latitude, request.longitude, request.address);
        let nest = TechNest::new(request.holder, request.name, location);
        let id = tx.repository().add_nest(nest).await?;
        tx.commit().await?;

        Ok(TechNestAdded { id })
    }
}

pub struct AddDeviceHandler {
    uow: Arc<dyn UnitOfWork>,
}

impl AddDeviceHandler {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl RequestHandler<AddDevice> for AddDeviceHandler {
    async fn handle(&mut self, request: AddDevice) -> anyhow::Result<DeviceAdded> {
        let mut tx = self.uow.begin().await?;
        if tx.repository().get_nest(request.nest).await?.is_none() {
            tx.rollback().await?;
            return Err(
                DomainError::not_found(format!("Nest with id {} not found", request.nest)).into(),
            );
        }

        let device = Device::new(request.nest, request.name, request.model);
        let id = tx.repository().add_device(device).await?;
        tx.commit().await?;

        Ok(DeviceAdded { id })
    }
}

/// Stores nest readings and records one `TechNestIndicatorsUpdated`.
pub struct UpdateTechNestIndicatorsHandler {
    storage: TechNestStorage,
    events: Vec<Event>,
}

impl UpdateTechNestIndicatorsHandler {
    pub fn new(storage: TechNestStorage) -> Self {
        Self {
            storage,
            events: Vec::new(),
        }
    }
}

#[async_trait]
impl RequestHandler<UpdateTechNestIndicators> for UpdateTechNestIndicatorsHandler {
    async fn handle(&mut self, request: UpdateTechNestIndicators) -> anyhow::Result<()> {
        self.storage
            .set_value(request.nest, request.values.clone())
            .await?;
        debug!(nest = request.nest, "nest indicators stored");

        self.events
            .push(Event::notification(TechNestIndicatorsUpdated(
                TechNestIndicators {
                    nest: request.nest,
                    values: request.values,
                },
            )));
        Ok(())
    }

    fn events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

/// Stores device readings and records one `DeviceIndicatorsUpdated`.
pub struct UpdateDeviceIndicatorsHandler {
    storage: DeviceStorage,
    events: Vec<Event>,
}

impl UpdateDeviceIndicatorsHandler {
    pub fn new(storage: DeviceStorage) -> Self {
        Self {
            storage,
            events: Vec::new(),
        }
    }
}

#[async_trait]
impl RequestHandler<UpdateDeviceIndicators> for UpdateDeviceIndicatorsHandler {
    async fn handle(&mut self, request: UpdateDeviceIndicators) -> anyhow::Result<()> {
        self.storage
            .set_value(request.device, request.values.clone())
            .await?;
        debug!(nest = request.nest, device = request.device, "device indicators stored");

        self.events
            .push(Event::notification(DeviceIndicatorsUpdated(DeviceIndicators {
                nest: request.nest,
                device: request.device,
                values: request.values,
            })));
        Ok(())
    }

    fn events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
