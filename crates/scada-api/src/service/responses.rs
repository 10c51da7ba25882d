use serde::{Deserialize, Serialize};

use crate::domain::{
    indicators::DeviceIndicators,
    models::{Device, DeviceId, HolderId, NestId, TechNest},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderCreated {
    pub id: HolderId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechNestAdded {
    pub id: NestId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceAdded {
    pub id: DeviceId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechNests {
    pub holder: HolderId,
    pub tech_nests: Vec<TechNest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Devices {
    pub tech_nest: NestId,
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicesIndicators {
    pub devices: Vec<DeviceIndicators>,
}
