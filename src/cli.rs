use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use open_pi_stepper::{Direction, MotorCommand, Program};

/// Drive a stepper motor through a step/direction driver
#[derive(Parser, Debug)]
#[command(name = "open-pi-stepper", version, about)]
pub struct Args {
    /// Path to the motor configuration
    #[arg(short = 'c', long = "config", value_name = "PATH", default_value_os = "stepper.toml")]
    pub config: PathBuf,

    /// Motor to drive, required when the configuration defines several
    #[arg(short = 'm', long = "motor")]
    pub motor: Option<String>,

    /// Speed for single moves, in revolutions per minute
    #[arg(long, default_value_t = 60)]
    pub rpm: u32,

    /// Log the line writes instead of driving GPIO
    #[arg(long)]
    pub dry_run: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count
    )]
    pub verbosity_level: u8,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand, Debug)]
pub enum Action {
    /// Emit a number of steps
    Step {
        steps: u32,
        /// Turn counter-clockwise
        #[arg(long)]
        ccw: bool,
    },
    /// Turn one full revolution
    OneRotation {
        #[arg(long)]
        ccw: bool,
    },
    /// Turn a number of full revolutions
    Rotate {
        rotations: u32,
        #[arg(long)]
        ccw: bool,
    },
    /// Go to an offset from the starting position
    GoTo {
        target: u32,
        #[arg(long)]
        ccw: bool,
    },
    /// Run a motion program
    Run {
        #[arg(value_name = "PROGRAM")]
        program: PathBuf,
    },
}

fn direction(ccw: bool) -> Direction {
    if ccw {
        Direction::CounterClockwise
    } else {
        Direction::Clockwise
    }
}

impl Args {
    /// Single moves are relative to wherever the shaft is at start-up, so
    /// they home first.
    pub fn program(&self) -> anyhow::Result<Program> {
        let rpm = self.rpm;
        let command = match self.action {
            Action::Step { steps, ccw } => MotorCommand::Step {
                steps,
                direction: direction(ccw),
                rpm,
            },
            Action::OneRotation { ccw } => MotorCommand::OneRotation {
                direction: direction(ccw),
                rpm,
            },
            Action::Rotate { rotations, ccw } => MotorCommand::Rotate {
                rotations,
                direction: direction(ccw),
                rpm,
            },
            Action::GoTo { target, ccw } => MotorCommand::GoTo {
                target,
                direction: direction(ccw),
                rpm,
            },
            Action::Run { ref program } => {
                return Program::load(program).with_context(|| format!("loading {}", program.display()));
            }
        };
        Ok(Program::new(vec![MotorCommand::Home, command]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_moves_home_first() {
        let args = Args::parse_from(["open-pi-stepper", "--rpm", "30", "go-to", "150", "--ccw"]);
        let program = args.program().unwrap();
        assert_eq!(
            program.commands,
            vec![
                MotorCommand::Home,
                MotorCommand::GoTo {
                    target: 150,
                    direction: Direction::CounterClockwise,
                    rpm: 30
                }
            ]
        );
    }

    #[test]
    fn global_flags() {
        let args = Args::parse_from(["open-pi-stepper", "-vv", "--dry-run", "-m", "tilt", "one-rotation"]);
        assert_eq!(args.verbosity_level, 2);
        assert!(args.dry_run);
        assert_eq!(args.motor.as_deref(), Some("tilt"));
        assert_eq!(args.rpm, 60);
    }
}
