use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};

use crate::domain::models::{DeviceId, NestId};

/// Declares a single instrument reading. Serialized as `{"value", "unit"}`;
/// the unit is fixed per type and ignored on input.
macro_rules! reading {
    ($(#[$meta:meta])* $name:ident, $unit:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
        pub struct $name {
            pub value: f64,
        }

        impl $name {
            pub const UNIT: &'static str = $unit;

            #[cfg(test)]
            pub fn new(value: f64) -> Self {
                Self { value }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut state = serializer.serialize_struct(stringify!($name), 2)?;
                state.serialize_field("value", &self.value)?;
                state.serialize_field("unit", Self::UNIT)?;
                state.end()
            }
        }
    };
}

reading!(
    /// Input voltage.
    Voltage,
    "V"
);
reading!(
    /// Electric power consumption.
    PowerConsumption,
    "kW"
);
reading!(CumulativeWaterConsumption, "m3");
reading!(InstantaneousWaterConsumption, "m3/s");
reading!(Ammeter, "A");
reading!(Frequency, "Hz");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Auto,
    #[default]
    Manual,
    Accident,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    TurnedOn,
    TurnedOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseControl {
    #[default]
    Normal,
    Accident,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPowerIndicators {
    /// Starts at 1.
    pub input_number: u32,
    pub supply: bool,
    pub voltage: Voltage,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputPowerIndicatorsGroup {
    #[serde(default)]
    pub inputs: Vec<InputPowerIndicators>,
    #[serde(default)]
    pub phase_control: PhaseControl,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterConsumptionIndicators {
    pub cumulative: CumulativeWaterConsumption,
    pub instantaneous: InstantaneousWaterConsumption,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionIndicatorsGroup {
    pub power: PowerConsumption,
    pub water: WaterConsumptionIndicators,
}

/// Everything the instruments of one nest report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechNestIndicatorsValues {
    pub input_power: InputPowerIndicatorsGroup,
    pub consumption: ConsumptionIndicatorsGroup,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechNestIndicators {
    pub nest: NestId,
    pub values: TechNestIndicatorsValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceIndicatorsValues {
    pub ammeter: Ammeter,
    #[serde(default)]
    pub mode: Mode,
    pub frequency: Frequency,
    pub status: DeviceStatus,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceIndicators {
    pub nest: NestId,
    pub device: DeviceId,
    pub values: DeviceIndicatorsValues,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_reading_serializes_its_unit() {
        let value = serde_json::to_value(Voltage::new(220.5)).unwrap();
        assert_eq!(value, json!({"value": 220.5, "unit": "V"}));
    }

    #[test]
    fn test_reading_ignores_unit_on_input() {
        let reading: Frequency = serde_json::from_value(json!({"value": 50.0, "unit": "x"})).unwrap();
        assert_eq!(reading, Frequency::new(50.0));
    }

    #[test]
    fn test_device_values_default_to_manual_mode() {
        let values: DeviceIndicatorsValues = serde_json::from_value(json!({
            "ammeter": {"value": 12.0},
            "frequency": {"value": 50.0},
            "status": "turned_on",
        }))
        .unwrap();

        assert_eq!(values.mode, Mode::Manual);
        assert_eq!(values.status, DeviceStatus::TurnedOn);
    }

    #[test]
    fn test_input_power_group_defaults() {
        let group: InputPowerIndicatorsGroup = serde_json::from_value(json!({})).unwrap();
        assert!(group.inputs.is_empty());
        assert_eq!(group.phase_control, PhaseControl::Normal);
    }
}
