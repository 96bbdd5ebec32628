pub mod command;
pub mod config;
pub mod error;
pub mod position;
pub mod sim;
pub mod stepper_motor;

pub use command::{MotorCommand, Program, RunReport};
pub use config::{Config, MotorConfig};
pub use error::{ConfigError, Error, Line, Result};
pub use position::{Direction, StepPosition};
pub use stepper_motor::{MotorSettings, StepperMotor};
