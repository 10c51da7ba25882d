use crate::{
    domain::DomainError,
    service::{
        commands::{
            AddDevice, AddTechNest, CreateHolder, UpdateDeviceIndicators, UpdateTechNestIndicators,
        },
        queries::{GetDevices, GetDevicesIndicators, GetHolder, GetTechNestIndicators, GetTechNests},
    },
};

/// Structural checks run on an inbound request before it reaches the
/// mediator. Tax identifier checksums are not verified.
pub trait Validate {
    fn validate(&self) -> Result<(), DomainError>;
}

fn not_blank(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn positive_id(field: &str, id: u64) -> Result<(), DomainError> {
    if id == 0 {
        return Err(DomainError::validation(format!("{field} must be greater than 0")));
    }
    Ok(())
}

fn non_negative(field: &str, value: f64) -> Result<(), DomainError> {
    if value.is_nan() || value < 0.0 {
        return Err(DomainError::validation(format!("{field} must not be negative")));
    }
    Ok(())
}

fn within(field: &str, value: f64, bound: f64) -> Result<(), DomainError> {
    if !(-bound..=bound).contains(&value) {
        return Err(DomainError::validation(format!(
            "{field} must be between -{bound} and {bound}"
        )));
    }
    Ok(())
}

fn inn(value: &str) -> Result<(), DomainError> {
    let digits = value.chars().all(|c| c.is_ascii_digit());
    if !digits || !matches!(value.len(), 10 | 12) {
        return Err(DomainError::validation("inn must be 10 or 12 digits"));
    }
    Ok(())
}

fn kpp(value: &str) -> Result<(), DomainError> {
    if value.chars().count() != 9 || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DomainError::validation("kpp must be 9 characters"));
    }
    Ok(())
}

impl Validate for CreateHolder {
    fn validate(&self) -> Result<(), DomainError> {
        not_blank("name", &self.name)?;
        inn(&self.inn)?;
        match &self.kpp {
            Some(value) => kpp(value),
            None => Ok(()),
        }
    }
}

impl Validate for AddTechNest {
    fn validate(&self) -> Result<(), DomainError> {
        positive_id("holder", self.holder)?;
        not_blank("name", &self.name)?;
        not_blank("address", &self.address)?;
        within("latitude", self.latitude, 90.0)?;
        within("longitude", self.longitude, 180.0)
    }
}

impl Validate for AddDevice {
    fn validate(&self) -> Result<(), DomainError> {
        positive_id("nest", self.nest)?;
        not_blank("name", &self.name)
    }
}

impl Validate for UpdateTechNestIndicators {
    fn validate(&self) -> Result<(), DomainError> {
        positive_id("nest", self.nest)?;
        for input in &self.values.input_power.inputs {
            positive_id("input_number", u64::from(input.input_number))?;
        }
        let consumption = &self.values.consumption;
        non_negative("power", consumption.power.value)?;
        non_negative("water.cumulative", consumption.water.cumulative.value)?;
        non_negative("water.instantaneous", consumption.water.instantaneous.value)
    }
}

impl Validate for UpdateDeviceIndicators {
    fn validate(&self) -> Result<(), DomainError> {
        positive_id("nest", self.nest)?;
        positive_id("device", self.device)?;
        non_negative("ammeter", self.values.ammeter.value)?;
        non_negative("frequency", self.values.frequency.value)
    }
}

impl Validate for GetHolder {
    fn validate(&self) -> Result<(), DomainError> {
        positive_id("holder", self.holder)
    }
}

impl Validate for GetTechNests {
    fn validate(&self) -> Result<(), DomainError> {
        positive_id("holder", self.holder)
    }
}

impl Validate for GetDevices {
    fn validate(&self) -> Result<(), DomainError> {
        positive_id("nest", self.nest)
    }
}

impl Validate for GetTechNestIndicators {
    fn validate(&self) -> Result<(), DomainError> {
        positive_id("nest", self.nest)
    }
}

impl Validate for GetDevicesIndicators {
    fn validate(&self) -> Result<(), DomainError> {
        positive_id("nest", self.nest)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_holder_with_valid_identifiers_passes() {
        let request = CreateHolder::new("Acme", "7812003110", Some("783801001".into()));
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn test_twelve_digit_inn_passes() {
        let request = CreateHolder::new("Acme", "500100732259", None);
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn test_inn_of_wrong_length_is_rejected() {
        let request = CreateHolder::new("Acme", "78120031", None);
        assert_eq!(
            request.validate(),
            Err(DomainError::validation("inn must be 10 or 12 digits"))
        );
    }

    #[test]
    fn test_inn_with_letters_is_rejected() {
        let request = CreateHolder::new("Acme", "78120031AB", None);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_short_kpp_is_rejected() {
        let request = CreateHolder::new("Acme", "7812003110", Some("7838".into()));
        assert_eq!(
            request.validate(),
            Err(DomainError::validation("kpp must be 9 characters"))
        );
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let request = CreateHolder::new("  ", "7812003110", None);
        assert_eq!(
            request.validate(),
            Err(DomainError::validation("name must not be empty"))
        );
    }

    #[test]
    fn test_zero_id_is_rejected() {
        let query = GetDevices {
            request_id: Default::default(),
            nest: 0,
        };
        assert_eq!(
            query.validate(),
            Err(DomainError::validation("nest must be greater than 0"))
        );
    }

    #[test]
    fn test_latitude_out_of_range_is_rejected() {
        let command = AddTechNest {
            request_id: Default::default(),
            holder: 1,
            name: "Pump station 1".into(),
            latitude: 91.0,
            longitude: 30.3,
            address: "Palace Square".into(),
        };
        assert!(command.validate().is_err());
    }
}
