use std::path::PathBuf;

use embedded_hal::digital::ErrorKind;
use thiserror::Error;

/// One of the three driver lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    Enable,
    Direction,
    Pulse,
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Line::Enable => write!(f, "enable"),
            Line::Direction => write!(f, "direction"),
            Line::Pulse => write!(f, "pulse"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("requested speed of {requested} rpm exceeds the configured maximum of {max} rpm")]
    SpeedExceeded { requested: u32, max: u32 },

    #[error("requested speed must be at least 1 rpm")]
    ZeroSpeed,

    #[error("home position not set")]
    HomeNotSet,

    #[error("target offset {target} is outside 0..={steps_per_revolution}")]
    TargetOutOfRange {
        target: u32,
        steps_per_revolution: u32,
    },

    #[error("{rotations} rotations of {steps_per_revolution} steps do not fit in a single move")]
    StepCountOverflow {
        rotations: u32,
        steps_per_revolution: u32,
    },

    #[error("invalid motor settings: {0}")]
    InvalidSettings(&'static str),

    #[error("failed to drive the {line} line: {kind:?}")]
    Pin { line: Line, kind: ErrorKind },
}

impl Error {
    /// Recoverable errors leave the motor untouched and usable; a pin failure
    /// means the hardware state is unknown.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Pin { .. })
    }
}

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration")]
    Parse(#[from] toml_edit::de::Error),

    #[error("no motors defined")]
    NoMotors,

    #[error("unknown motor '{0}'")]
    UnknownMotor(String),

    #[error("several motors defined ({0}), pick one by name")]
    AmbiguousMotor(String),

    #[error("motor '{name}': {reason}")]
    Invalid { name: String, reason: &'static str },
}
