use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use strum::AsRefStr;
use strum::EnumIter;

/// Simulated thermostat readings and setpoints.
///
/// Serialized with camelCase keys for the `/status` response. Deserialized
/// with the field names as written here, which is how the `[thermostat]`
/// config section seeds the initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all(serialize = "camelCase"))]
pub struct ThermostatState {
    pub current_temperature: f64,
    pub target_temperature: f64,
    pub target_heating_cooling_state: i64,
    pub current_heating_cooling_state: i64,
    pub cooling_threshold_temperature: f64,
    pub heating_threshold_temperature: f64,
    pub current_relative_humidity: f64,
}

impl Default for ThermostatState {
    fn default() -> Self {
        Self {
            current_temperature: 21.0,
            target_temperature: 22.0,
            target_heating_cooling_state: 1,
            current_heating_cooling_state: 1,
            cooling_threshold_temperature: 25.0,
            heating_threshold_temperature: 19.0,
            current_relative_humidity: 40.0,
        }
    }
}

impl ThermostatState {
    /// Name of the first temperature or humidity field that is inf or nan.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        [
            ("current_temperature", self.current_temperature),
            ("target_temperature", self.target_temperature),
            ("cooling_threshold_temperature", self.cooling_threshold_temperature),
            ("heating_threshold_temperature", self.heating_threshold_temperature),
            ("current_relative_humidity", self.current_relative_humidity),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(name, _)| name)
    }

    /// Apply a parsed update.
    ///
    /// Setting a target also snaps the matching current value, as if the
    /// device reached it instantly. Thresholds only touch themselves.
    pub fn apply(&mut self, update: Update) {
        match update {
            Update::TargetHeatingCoolingState(mode) => {
                self.target_heating_cooling_state = mode;
                self.current_heating_cooling_state = mode;
            }
            Update::TargetTemperature(temp) => {
                self.target_temperature = temp;
                self.current_temperature = temp;
            }
            Update::CoolingThresholdTemperature(temp) => {
                self.cooling_threshold_temperature = temp;
            }
            Update::HeatingThresholdTemperature(temp) => {
                self.heating_threshold_temperature = temp;
            }
        }
    }
}

/// A writable thermostat property.
///
/// The camelCase name doubles as the route path and as the key echoed back
/// in the acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum Characteristic {
    TargetHeatingCoolingState,
    TargetTemperature,
    CoolingThresholdTemperature,
    HeatingThresholdTemperature,
}

impl Characteristic {
    /// Route path for this characteristic, e.g. `/targetTemperature`.
    pub fn path(self) -> String {
        format!("/{}", self.as_ref())
    }
}

/// Raised when a `value` parameter does not parse as the expected number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid value")]
pub struct InvalidValue;

/// A characteristic paired with a value of the type it stores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Update {
    TargetHeatingCoolingState(i64),
    TargetTemperature(f64),
    CoolingThresholdTemperature(f64),
    HeatingThresholdTemperature(f64),
}

impl Update {
    /// Parse a raw query value for `characteristic`.
    pub fn parse(characteristic: Characteristic, raw: &str) -> Result<Self, InvalidValue> {
        let raw = raw.trim();
        Ok(match characteristic {
            Characteristic::TargetHeatingCoolingState => {
                Self::TargetHeatingCoolingState(raw.parse().map_err(|_| InvalidValue)?)
            }
            Characteristic::TargetTemperature => Self::TargetTemperature(parse_temperature(raw)?),
            Characteristic::CoolingThresholdTemperature => {
                Self::CoolingThresholdTemperature(parse_temperature(raw)?)
            }
            Characteristic::HeatingThresholdTemperature => {
                Self::HeatingThresholdTemperature(parse_temperature(raw)?)
            }
        })
    }

    pub fn characteristic(&self) -> Characteristic {
        match self {
            Update::TargetHeatingCoolingState(_) => Characteristic::TargetHeatingCoolingState,
            Update::TargetTemperature(_) => Characteristic::TargetTemperature,
            Update::CoolingThresholdTemperature(_) => Characteristic::CoolingThresholdTemperature,
            Update::HeatingThresholdTemperature(_) => Characteristic::HeatingThresholdTemperature,
        }
    }

    /// The stored value as JSON, integer or float depending on the characteristic.
    pub fn value(&self) -> serde_json::Value {
        match *self {
            Update::TargetHeatingCoolingState(mode) => mode.into(),
            Update::TargetTemperature(temp)
            | Update::CoolingThresholdTemperature(temp)
            | Update::HeatingThresholdTemperature(temp) => temp.into(),
        }
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::TargetHeatingCoolingState(mode) => {
                write!(f, "Target heating/cooling state set to {}", mode)
            }
            Update::TargetTemperature(temp) => write!(f, "Target temperature set to {:?}", temp),
            Update::CoolingThresholdTemperature(temp) => {
                write!(f, "Cooling threshold temperature set to {:?}", temp)
            }
            Update::HeatingThresholdTemperature(temp) => {
                write!(f, "Heating threshold temperature set to {:?}", temp)
            }
        }
    }
}

// JSON has no representation for inf/nan, and a null field would break /status.
fn parse_temperature(raw: &str) -> Result<f64, InvalidValue> {
    match raw.parse::<f64>() {
        Ok(temp) if temp.is_finite() => Ok(temp),
        _ => Err(InvalidValue),
    }
}
