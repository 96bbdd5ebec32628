//! Motion commands and programs: sequences of commands read from TOML.
//!
//! ```toml
//! [[commands]]
//! op = "home"
//!
//! [[commands]]
//! op = "go_to"
//! target = 50
//! direction = "ccw"
//! rpm = 30
//! ```

use std::path::Path;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};
use crate::position::Direction;
use crate::stepper_motor::StepperMotor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MotorCommand {
    Home,
    Step {
        steps: u32,
        #[serde(default)]
        direction: Direction,
        rpm: u32,
    },
    OneRotation {
        #[serde(default)]
        direction: Direction,
        rpm: u32,
    },
    Rotate {
        rotations: u32,
        #[serde(default)]
        direction: Direction,
        rpm: u32,
    },
    GoTo {
        target: u32,
        #[serde(default)]
        direction: Direction,
        rpm: u32,
    },
    Dwell {
        ms: u32,
    },
}

impl MotorCommand {
    pub fn apply<EN, DIR, PUL, D>(&self, motor: &mut StepperMotor<EN, DIR, PUL, D>) -> Result<()>
    where
        EN: OutputPin,
        DIR: OutputPin,
        PUL: OutputPin,
        D: DelayNs,
    {
        match *self {
            MotorCommand::Home => {
                motor.set_current_position_as_home();
                Ok(())
            }
            MotorCommand::Step {
                steps,
                direction,
                rpm,
            } => motor.step(steps, direction, rpm),
            MotorCommand::OneRotation { direction, rpm } => motor.do_one_rotation(direction, rpm),
            MotorCommand::Rotate {
                rotations,
                direction,
                rpm,
            } => motor.rotate(rotations, direction, rpm),
            MotorCommand::GoTo {
                target,
                direction,
                rpm,
            } => motor.go_to_position(direction, rpm, target),
            MotorCommand::Dwell { ms } => {
                motor.dwell(ms);
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub executed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub commands: Vec<MotorCommand>,
}

impl Program {
    pub fn new(commands: Vec<MotorCommand>) -> Self {
        Self { commands }
    }

    pub fn parse(text: &str) -> core::result::Result<Self, ConfigError> {
        Ok(toml_edit::de::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> core::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Run every command in order. Refused commands are handed to
    /// `on_error` and skipped; a pin failure stops the run.
    pub fn run<EN, DIR, PUL, D, F>(&self, motor: &mut StepperMotor<EN, DIR, PUL, D>, mut on_error: F) -> Result<RunReport>
    where
        EN: OutputPin,
        DIR: OutputPin,
        PUL: OutputPin,
        D: DelayNs,
        F: FnMut(usize, &MotorCommand, &Error),
    {
        let mut report = RunReport::default();
        for (index, command) in self.commands.iter().enumerate() {
            log::debug!("#{index}: {command:?}");
            report.executed += 1;
            match command.apply(motor) {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    report.failed += 1;
                    on_error(index, command, &e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }
}
