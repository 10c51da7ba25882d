use serde::{Deserialize, Serialize};

pub type HolderId = u64;
pub type NestId = u64;
pub type DeviceId = u64;
pub type LocationId = u64;

/// Company owning technical nests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holder {
    #[serde(default)]
    pub id: Option<HolderId>,
    pub name: String,
    pub inn: String,
    #[serde(default)]
    pub kpp: Option<String>,
}

impl Holder {
    pub fn new(name: impl Into<String>, inn: impl Into<String>, kpp: Option<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            inn: inn.into(),
            kpp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechNestLocation {
    #[serde(default)]
    pub id: Option<LocationId>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

impl TechNestLocation {
    pub fn new(latitude: f64, longitude: f64, address: impl Into<String>) -> Self {
        Self {
            id: None,
            latitude,
            longitude,
            address: address.into(),
        }
    }

    /// Two locations are the same place when coordinates and address match.
    #[must_use]
    pub fn same_place(&self, other: &TechNestLocation) -> bool {
        self.latitude == other.latitude
            && self.longitude == other.longitude
            && self.address == other.address
    }
}

/// A technical nest: a site (pump station, substation) with devices on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechNest {
    #[serde(default)]
    pub id: Option<NestId>,
    pub name: String,
    #[serde(default)]
    pub devices: Vec<Device>,
    pub holder_id: HolderId,
    pub location: TechNestLocation,
}

impl TechNest {
    pub fn new(holder_id: HolderId, name: impl Into<String>, location: TechNestLocation) -> Self {
        Self {
            id: None,
            name: name.into(),
            devices: Vec::new(),
            holder_id,
            location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub id: Option<DeviceId>,
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    pub nest_id: NestId,
}

impl Device {
    pub fn new(nest_id: NestId, name: impl Into<String>, model: Option<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            model,
            nest_id,
        }
    }
}

/// One raw line received by the inbound transport.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundRequest {
    pub line: String,
}

impl From<String> for InboundRequest {
    fn from(line: String) -> Self {
        Self { line }
    }
}
