use nest_mediator::RequestId;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        indicators::TechNestIndicators,
        models::{Holder, HolderId, NestId},
    },
    service::responses::{Devices, DevicesIndicators, TechNests},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHolder {
    #[serde(default)]
    pub request_id: RequestId,
    pub holder: HolderId,
}

request!(GetHolder => Holder, Query);

/// Nests of one holder, with their locations and devices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTechNests {
    #[serde(default)]
    pub request_id: RequestId,
    pub holder: HolderId,
}

request!(GetTechNests => TechNests, Query);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDevices {
    #[serde(default)]
    pub request_id: RequestId,
    pub nest: NestId,
}

request!(GetDevices => Devices, Query);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTechNestIndicators {
    #[serde(default)]
    pub request_id: RequestId,
    pub nest: NestId,
}

request!(GetTechNestIndicators => TechNestIndicators, Query);

/// Latest readings of every device of a nest. Devices that never reported
/// are left out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDevicesIndicators {
    #[serde(default)]
    pub request_id: RequestId,
    pub nest: NestId,
}

request!(GetDevicesIndicators => DevicesIndicators, Query);
