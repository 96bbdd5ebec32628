use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::stepper_motor::MotorSettings;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub motors: BTreeMap<String, MotorConfig>,
}

/// One motor's wiring (BCM GPIO numbers) and mechanics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorConfig {
    pub enable_pin: u8,
    pub direction_pin: u8,
    pub pulse_pin: u8,
    pub steps_per_revolution: u32,
    pub max_rpm: u32,
    #[serde(default)]
    pub hold_position: bool,
    #[serde(default = "default_enable_active_low")]
    pub enable_active_low: bool,
    #[serde(default)]
    pub invert_direction: bool,
}

fn default_enable_active_low() -> bool {
    true
}

impl MotorConfig {
    pub fn settings(&self) -> MotorSettings {
        MotorSettings {
            steps_per_revolution: self.steps_per_revolution,
            max_rpm: self.max_rpm,
            hold_position: self.hold_position,
            enable_active_low: self.enable_active_low,
            invert_direction: self.invert_direction,
        }
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &'static str| ConfigError::Invalid {
            name: name.to_owned(),
            reason,
        };
        if self.steps_per_revolution == 0 {
            return Err(invalid("steps_per_revolution must be positive"));
        }
        if self.max_rpm == 0 {
            return Err(invalid("max_rpm must be positive"));
        }
        if self.enable_pin == self.direction_pin
            || self.enable_pin == self.pulse_pin
            || self.direction_pin == self.pulse_pin
        {
            return Err(invalid("enable, direction and pulse pins must differ"));
        }
        Ok(())
    }
}

impl Config {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml_edit::de::from_str(text)?;
        if config.motors.is_empty() {
            return Err(ConfigError::NoMotors);
        }
        for (name, motor) in &config.motors {
            motor.validate(name)?;
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::parse(&text)?;
        log::debug!("loaded {} motor(s) from {}", config.motors.len(), path.display());
        Ok(config)
    }

    /// The motor called `name`, or the only motor when `name` is `None`.
    pub fn motor(&self, name: Option<&str>) -> Result<(&str, &MotorConfig), ConfigError> {
        match name {
            Some(name) => self
                .motors
                .get_key_value(name)
                .map(|(name, motor)| (name.as_str(), motor))
                .ok_or_else(|| ConfigError::UnknownMotor(name.to_owned())),
            None => {
                let mut motors = self.motors.iter();
                match (motors.next(), motors.next()) {
                    (Some((name, motor)), None) => Ok((name.as_str(), motor)),
                    (None, _) => Err(ConfigError::NoMotors),
                    (Some(_), Some(_)) => {
                        let names: Vec<&str> = self.motors.keys().map(String::as_str).collect();
                        Err(ConfigError::AmbiguousMotor(names.join(", ")))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TURNTABLE: &str = r#"
[motors.turntable]
enable_pin = 22
direction_pin = 27
pulse_pin = 17
steps_per_revolution = 200
max_rpm = 300
"#;

    #[test]
    fn defaults_match_dm542_wiring() {
        let config = Config::parse(TURNTABLE).unwrap();
        let (name, motor) = config.motor(None).unwrap();
        assert_eq!(name, "turntable");
        assert_eq!(motor.settings(), MotorSettings::new(200, 300, false));
    }

    #[test]
    fn explicit_flags() {
        let text = format!("{TURNTABLE}hold_position = true\nenable_active_low = false\ninvert_direction = true\n");
        let config = Config::parse(&text).unwrap();
        let settings = config.motors["turntable"].settings();
        assert!(settings.hold_position);
        assert!(!settings.enable_active_low);
        assert!(settings.invert_direction);
    }

    #[test]
    fn picks_motor_by_name() {
        let text = format!(
            "{TURNTABLE}\n[motors.tilt]\nenable_pin = 4\ndirection_pin = 24\npulse_pin = 18\nsteps_per_revolution = 400\nmax_rpm = 120\n"
        );
        let config = Config::parse(&text).unwrap();
        let (_, tilt) = config.motor(Some("tilt")).unwrap();
        assert_eq!(tilt.steps_per_revolution, 400);
        assert!(matches!(config.motor(None), Err(ConfigError::AmbiguousMotor(names)) if names == "tilt, turntable"));
        assert!(matches!(config.motor(Some("pan")), Err(ConfigError::UnknownMotor(_))));
    }

    #[test]
    fn empty_config_is_rejected() {
        assert!(matches!(Config::parse(""), Err(ConfigError::NoMotors)));
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let text = TURNTABLE.replace("steps_per_revolution = 200", "steps_per_revolution = 0");
        assert!(matches!(Config::parse(&text), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn shared_pins_are_rejected() {
        let text = TURNTABLE.replace("pulse_pin = 17", "pulse_pin = 22");
        assert!(matches!(Config::parse(&text), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn missing_field_is_a_parse_error() {
        let text = TURNTABLE.replace("max_rpm = 300\n", "");
        assert!(matches!(Config::parse(&text), Err(ConfigError::Parse(_))));
    }
}
