use nest_mediator::RequestId;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        indicators::{DeviceIndicatorsValues, TechNestIndicatorsValues},
        models::{DeviceId, HolderId, NestId},
    },
    service::responses::{DeviceAdded, HolderCreated, TechNestAdded},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHolder {
    #[serde(default)]
    pub request_id: RequestId,
    pub name: String,
    pub inn: String,
    #[serde(default)]
    pub kpp: Option<String>,
}

#[cfg(test)]
impl CreateHolder {
    pub fn new(name: impl Into<String>, inn: impl Into<String>, kpp: Option<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            name: name.into(),
            inn: inn.into(),
            kpp,
        }
    }
}

request!(CreateHolder => HolderCreated, Command);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTechNest {
    #[serde(default)]
    pub request_id: RequestId,
    pub holder: HolderId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

request!(AddTechNest => TechNestAdded, Command);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDevice {
    #[serde(default)]
    pub request_id: RequestId,
    pub nest: NestId,
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
}

request!(AddDevice => DeviceAdded, Command);

/// Stores the latest readings of a nest and announces them on the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTechNestIndicators {
    #[serde(default)]
    pub request_id: RequestId,
    pub nest: NestId,
    pub values: TechNestIndicatorsValues,
}

#[cfg(test)]
impl UpdateTechNestIndicators {
    pub fn new(nest: NestId, values: TechNestIndicatorsValues) -> Self {
        Self {
            request_id: RequestId::new(),
            nest,
            values,
        }
    }
}

request!(UpdateTechNestIndicators => (), Command);

/// Stores the latest readings of a device and announces them on the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDeviceIndicators {
    #[serde(default)]
    pub request_id: RequestId,
    pub nest: NestId,
    pub device: DeviceId,
    pub values: DeviceIndicatorsValues,
}

request!(UpdateDeviceIndicators => (), Command);
