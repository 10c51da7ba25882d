use std::sync::Arc;

use nest_mediator::{Container, Mediator, MessageBroker, MiddlewareChain, RequestMap, Scope};

use crate::{
    domain::{
        indicators::{DeviceIndicatorsValues, TechNestIndicatorsValues},
        repository::UnitOfWork,
        storage::{DeviceStorage, TechNestStorage},
    },
    infra::{
        consumer::RequestRegistry,
        memory::{InMemoryIndicatorStorage, InMemoryUnitOfWork},
    },
    service::{
        commands::{
            AddDevice, AddTechNest, CreateHolder, UpdateDeviceIndicators, UpdateTechNestIndicators,
        },
        handlers::{
            AddDeviceHandler, AddTechNestHandler, CreateHolderHandler, GetDevicesHandler,
            GetDevicesIndicatorsHandler, GetHolderHandler, GetTechNestIndicatorsHandler,
            GetTechNestsHandler, UpdateDeviceIndicatorsHandler, UpdateTechNestIndicatorsHandler,
        },
        queries::{
            GetDevices, GetDevicesIndicators, GetHolder, GetTechNestIndicators, GetTechNests,
        },
    },
};

/// Process-wide collaborators shared by every handler.
#[derive(Clone)]
pub struct Dependencies {
    pub uow: Arc<dyn UnitOfWork>,
    pub nest_storage: TechNestStorage,
    pub device_storage: DeviceStorage,
}

impl Dependencies {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            uow: Arc::new(InMemoryUnitOfWork::new()),
            nest_storage: Arc::new(InMemoryIndicatorStorage::<TechNestIndicatorsValues>::new()),
            device_storage: Arc::new(InMemoryIndicatorStorage::<DeviceIndicatorsValues>::new()),
        }
    }
}

pub fn init_commands(map: &mut RequestMap) {
    map.bind::<CreateHolder, CreateHolderHandler>();
    map.bind::<AddTechNest, AddTechNestHandler>();
    map.bind::<AddDevice, AddDeviceHandler>();
    map.bind::<UpdateTechNestIndicators, UpdateTechNestIndicatorsHandler>();
    map.bind::<UpdateDeviceIndicators, UpdateDeviceIndicatorsHandler>();
}

pub fn init_queries(map: &mut RequestMap) {
    map.bind::<GetHolder, GetHolderHandler>();
    map.bind::<GetTechNests, GetTechNestsHandler>();
    map.bind::<GetDevices, GetDevicesHandler>();
    map.bind::<GetTechNestIndicators, GetTechNestIndicatorsHandler>();
    map.bind::<GetDevicesIndicators, GetDevicesIndicatorsHandler>();
}

/// Every request the inbound adapter accepts, under its type name.
#[must_use]
pub fn registry() -> RequestRegistry {
    RequestRegistry::new()
        .with::<CreateHolder>()
        .with::<AddTechNest>()
        .with::<AddDevice>()
        .with::<UpdateTechNestIndicators>()
        .with::<UpdateDeviceIndicators>()
        .with::<GetHolder>()
        .with::<GetTechNests>()
        .with::<GetDevices>()
        .with::<GetTechNestIndicators>()
        .with::<GetDevicesIndicators>()
}

/// Singletons for the shared collaborators, one transient factory per
/// handler.
pub fn container(deps: Dependencies) -> Container {
    let mut container = Container::new();
    container
        .singleton(deps.uow)
        .singleton(deps.nest_storage)
        .singleton(deps.device_storage);

    container
        .transient(|scope: Scope| async move {
            anyhow::Ok(CreateHolderHandler::new(scope.resolve().await?))
        })
        .transient(|scope: Scope| async move {
            anyhow::Ok(AddTechNestHandler::new(scope.resolve().await?))
        })
        .transient(|scope: Scope| async move {
            anyhow::Ok(AddDeviceHandler::new(scope.resolve().await?))
        })
        .transient(|scope: Scope| async move {
            anyhow::Ok(UpdateTechNestIndicatorsHandler::new(scope.resolve().await?))
        })
        .transient(|scope: Scope| async move {
            anyhow::Ok(UpdateDeviceIndicatorsHandler::new(scope.resolve().await?))
        });

    container
        .transient(|scope: Scope| async move {
            anyhow::Ok(GetHolderHandler::new(scope.resolve().await?))
        })
        .transient(|scope: Scope| async move {
            anyhow::Ok(GetTechNestsHandler::new(scope.resolve().await?))
        })
        .transient(|scope: Scope| async move {
            anyhow::Ok(GetDevicesHandler::new(scope.resolve().await?))
        })
        .transient(|scope: Scope| async move {
            anyhow::Ok(GetTechNestIndicatorsHandler::new(
                scope.resolve().await?,
                scope.resolve().await?,
            ))
        })
        .transient(|scope: Scope| async move {
            anyhow::Ok(GetDevicesIndicatorsHandler::new(
                scope.resolve().await?,
                scope.resolve().await?,
            ))
        });

    container
}

/// No domain event handlers are bound: the event map stays empty.
pub fn setup_mediator(
    deps: Dependencies,
    broker: Arc<dyn MessageBroker>,
    middleware: MiddlewareChain,
) -> Mediator {
    let mut requests = RequestMap::new();
    init_commands(&mut requests);
    init_queries(&mut requests);

    Mediator::builder(requests, container(deps))
        .broker(broker)
        .middleware_chain(middleware)
        .build()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use nest_mediator::{BrokerMessage, MediatorError, Request, RequestId};
    use pretty_assertions::assert_eq;
    use serde::Serialize;
    use uuid::Uuid;

    use super::*;
    use crate::domain::{
        DomainError,
        indicators::{
            Ammeter, ConsumptionIndicatorsGroup, CumulativeWaterConsumption, DeviceStatus,
            Frequency, InputPowerIndicatorsGroup, InstantaneousWaterConsumption, Mode,
            PowerConsumption, WaterConsumptionIndicators,
        },
    };

    #[derive(Default)]
    struct RecordingBroker {
        sent: Mutex<Vec<BrokerMessage>>,
    }

    #[async_trait]
    impl MessageBroker for RecordingBroker {
        async fn send_message(&self, message: BrokerMessage) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    #[derive(Debug, Serialize)]
    struct Ping {
        request_id: RequestId,
    }

    impl Request for Ping {
        type Response = ();

        fn request_id(&self) -> Uuid {
            self.request_id.as_uuid()
        }
    }

    struct Fixture {
        mediator: Mediator,
        broker: Arc<RecordingBroker>,
        uow: InMemoryUnitOfWork,
    }

    fn fixture() -> Fixture {
        let uow = InMemoryUnitOfWork::new();
        let deps = Dependencies {
            uow: Arc::new(uow.clone()),
            ..Dependencies::in_memory()
        };
        let broker = Arc::new(RecordingBroker::default());
        let mediator = setup_mediator(deps, broker.clone(), MiddlewareChain::new());

        Fixture {
            mediator,
            broker,
            uow,
        }
    }

    fn nest_values() -> TechNestIndicatorsValues {
        TechNestIndicatorsValues {
            input_power: InputPowerIndicatorsGroup::default(),
            consumption: ConsumptionIndicatorsGroup {
                power: PowerConsumption::new(12.5),
                water: WaterConsumptionIndicators {
                    cumulative: CumulativeWaterConsumption::new(1400.0),
                    instantaneous: InstantaneousWaterConsumption::new(0.3),
                },
            },
            updated_at: Utc::now(),
        }
    }

    fn device_values() -> DeviceIndicatorsValues {
        DeviceIndicatorsValues {
            ammeter: Ammeter::new(8.0),
            mode: Mode::Auto,
            frequency: Frequency::new(50.0),
            status: DeviceStatus::TurnedOn,
            updated_at: Utc::now(),
        }
    }

    async fn add_nest(mediator: &Mediator, holder: u64, name: &str) -> u64 {
        mediator
            .send(AddTechNest {
                request_id: RequestId::new(),
                holder,
                name: name.to_string(),
                latitude: 59.938924,
                longitude: 30.315311,
                address: "Palace Square 2".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_holder_returns_new_id_without_events() {
        let fx = fixture();

        let created = fx
            .mediator
            .send(CreateHolder::new("Acme", "7812003110", None))
            .await
            .unwrap();

        assert!(created.id > 0);
        assert!(fx.broker.sent.lock().unwrap().is_empty());
        assert_eq!(fx.uow.committed(), 1);
    }

    #[tokio::test]
    async fn test_nest_indicators_update_publishes_one_notification() {
        let fx = fixture();

        fx.mediator
            .send(UpdateTechNestIndicators::new(4, nest_values()))
            .await
            .unwrap();

        let sent = fx.broker.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message_name, "TechNestIndicatorsUpdated");
        assert_eq!(sent[0].message_type, "notification_event");
        assert_eq!(sent[0].payload["nest"], 4);
        assert_eq!(sent[0].payload["values"]["consumption"]["power"]["unit"], "kW");
    }

    #[tokio::test]
    async fn test_unbound_request_touches_nothing() {
        let fx = fixture();

        let err = fx
            .mediator
            .send(Ping {
                request_id: RequestId::new(),
            })
            .await
            .unwrap_err();

        assert!(err.is_handler_not_found());
        assert_eq!(fx.uow.begun(), 0);
        assert!(fx.broker.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nest_for_unknown_holder_is_not_found() {
        let fx = fixture();

        let err = fx
            .mediator
            .send(AddTechNest {
                request_id: RequestId::new(),
                holder: 77,
                name: "Pump station".into(),
                latitude: 0.0,
                longitude: 0.0,
                address: "Nowhere".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(
            err.domain_error::<DomainError>(),
            Some(&DomainError::not_found("Holder with id 77 not found"))
        );
        assert_eq!(fx.uow.committed(), 0);
        assert_eq!(fx.uow.rolled_back(), 1);
    }

    #[tokio::test]
    async fn test_device_for_unknown_nest_rolls_back() {
        let fx = fixture();

        let err = fx
            .mediator
            .send(AddDevice {
                request_id: RequestId::new(),
                nest: 12,
                name: "Pump".into(),
                model: None,
            })
            .await
            .unwrap_err();

        assert_eq!(
            err.domain_error::<DomainError>(),
            Some(&DomainError::not_found("Nest with id 12 not found"))
        );
        assert_eq!(fx.uow.begun(), 1);
        assert_eq!(fx.uow.rolled_back(), 1);
    }

    #[tokio::test]
    async fn test_second_holder_with_same_inn_already_exists() {
        let fx = fixture();
        fx.mediator
            .send(CreateHolder::new("Acme", "7812003110", None))
            .await
            .unwrap();

        let err = fx
            .mediator
            .send(CreateHolder::new("Acme Two", "7812003110", None))
            .await
            .unwrap_err();

        assert!(matches!(
            err.domain_error::<DomainError>(),
            Some(DomainError::AlreadyExists { .. })
        ));
        assert!(matches!(err, MediatorError::Handler(_)));
        assert_eq!(fx.uow.committed(), 1);
        assert_eq!(fx.uow.rolled_back(), 1);
    }

    #[tokio::test]
    async fn test_holder_nests_and_devices_round_trip() {
        let fx = fixture();
        let holder = fx
            .mediator
            .send(CreateHolder::new("Acme", "7812003110", Some("783801001".into())))
            .await
            .unwrap()
            .id;
        let nest = add_nest(&fx.mediator, holder, "Pump station 1").await;
        let device = fx
            .mediator
            .send(AddDevice {
                request_id: RequestId::new(),
                nest,
                name: "Pump 1".into(),
                model: None,
            })
            .await
            .unwrap()
            .id;

        let found = fx
            .mediator
            .send(GetHolder {
                request_id: RequestId::new(),
                holder,
            })
            .await
            .unwrap();
        assert_eq!(found.kpp.as_deref(), Some("783801001"));

        let nests = fx
            .mediator
            .send(GetTechNests {
                request_id: RequestId::new(),
                holder,
            })
            .await
            .unwrap();
        assert_eq!(nests.tech_nests.len(), 1);
        assert_eq!(nests.tech_nests[0].devices[0].id, Some(device));

        let devices = fx
            .mediator
            .send(GetDevices {
                request_id: RequestId::new(),
                nest,
            })
            .await
            .unwrap();
        assert_eq!(devices.tech_nest, nest);
        assert_eq!(devices.devices.len(), 1);
    }

    #[tokio::test]
    async fn test_devices_indicators_skip_silent_devices() {
        let fx = fixture();
        let holder = fx
            .mediator
            .send(CreateHolder::new("Acme", "7812003110", None))
            .await
            .unwrap()
            .id;
        let nest = add_nest(&fx.mediator, holder, "Pump station 1").await;
        let mut devices = Vec::new();
        for name in ["Pump 1", "Pump 2"] {
            let added = fx
                .mediator
                .send(AddDevice {
                    request_id: RequestId::new(),
                    nest,
                    name: name.into(),
                    model: None,
                })
                .await
                .unwrap();
            devices.push(added.id);
        }

        fx.mediator
            .send(UpdateDeviceIndicators {
                request_id: RequestId::new(),
                nest,
                device: devices[1],
                values: device_values(),
            })
            .await
            .unwrap();

        let indicators = fx
            .mediator
            .send(GetDevicesIndicators {
                request_id: RequestId::new(),
                nest,
            })
            .await
            .unwrap();

        assert_eq!(indicators.devices.len(), 1);
        assert_eq!(indicators.devices[0].device, devices[1]);
        assert_eq!(indicators.devices[0].values.mode, Mode::Auto);

        let sent = fx.broker.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message_name, "DeviceIndicatorsUpdated");
    }

    #[tokio::test]
    async fn test_nest_indicators_before_any_update_are_not_found() {
        let fx = fixture();
        let holder = fx
            .mediator
            .send(CreateHolder::new("Acme", "7812003110", None))
            .await
            .unwrap()
            .id;
        let nest = add_nest(&fx.mediator, holder, "Pump station 1").await;
        let query = || GetTechNestIndicators {
            request_id: RequestId::new(),
            nest,
        };

        let err = fx.mediator.send(query()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Indicator values for nest {nest} not found")
        );

        let values = nest_values();
        fx.mediator
            .send(UpdateTechNestIndicators::new(nest, values.clone()))
            .await
            .unwrap();
        let indicators = fx.mediator.send(query()).await.unwrap();
        assert_eq!(indicators.values, values);
    }
}
