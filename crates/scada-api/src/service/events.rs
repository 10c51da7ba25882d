//! Notification events published after indicator updates.

use serde::Serialize;

use crate::domain::indicators::{DeviceIndicators, TechNestIndicators};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TechNestIndicatorsUpdated(pub TechNestIndicators);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DeviceIndicatorsUpdated(pub DeviceIndicators);
