use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, OutputPin, PinState};

use crate::error::{Error, Line, Result};
use crate::position::{Direction, StepPosition};

/// Mechanical and wiring parameters, fixed for the life of a motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorSettings {
    pub steps_per_revolution: u32,
    pub max_rpm: u32,
    /// Keep the driver energized between moves, holding torque.
    pub hold_position: bool,
    /// DM542/DRV8825-style drivers are energized while ENA is low.
    pub enable_active_low: bool,
    pub invert_direction: bool,
}

impl MotorSettings {
    pub fn new(steps_per_revolution: u32, max_rpm: u32, hold_position: bool) -> Self {
        Self {
            steps_per_revolution,
            max_rpm,
            hold_position,
            enable_active_low: true,
            invert_direction: false,
        }
    }
}

fn drive<P: OutputPin>(pin: &mut P, line: Line, high: bool) -> Result<()> {
    pin.set_state(PinState::from(high)).map_err(|e| Error::Pin {
        line,
        kind: e.kind(),
    })
}

/// A stepper behind a step/direction driver, tracking its offset from a
/// user-defined home position.
#[derive(Debug)]
pub struct StepperMotor<EN, DIR, PUL, D> {
    enable: EN,
    direction: DIR,
    pulse: PUL,
    delay: D,
    settings: MotorSettings,
    position: StepPosition,
    home_is_set: bool,
}

impl<EN, DIR, PUL, D> StepperMotor<EN, DIR, PUL, D>
where
    EN: OutputPin,
    DIR: OutputPin,
    PUL: OutputPin,
    D: DelayNs,
{
    /// Takes the three lines, already configured as outputs, and drives the
    /// enable line to its idle level.
    pub fn new(enable: EN, direction: DIR, pulse: PUL, delay: D, settings: MotorSettings) -> Result<Self> {
        if settings.steps_per_revolution == 0 {
            return Err(Error::InvalidSettings("steps_per_revolution must be positive"));
        }
        if settings.max_rpm == 0 {
            return Err(Error::InvalidSettings("max_rpm must be positive"));
        }
        let mut motor = Self {
            enable,
            direction,
            pulse,
            delay,
            settings,
            position: StepPosition::home(settings.steps_per_revolution),
            home_is_set: false,
        };
        if settings.hold_position {
            motor.enable()?;
        } else {
            motor.disable()?;
        }
        Ok(motor)
    }

    /// Energize the driver.
    pub fn enable(&mut self) -> Result<()> {
        let high = !self.settings.enable_active_low;
        drive(&mut self.enable, Line::Enable, high)
    }

    /// De-energize the driver. The shaft is free to turn.
    pub fn disable(&mut self) -> Result<()> {
        let high = self.settings.enable_active_low;
        drive(&mut self.enable, Line::Enable, high)
    }

    pub fn settings(&self) -> &MotorSettings {
        &self.settings
    }

    pub fn steps_per_revolution(&self) -> u32 {
        self.settings.steps_per_revolution
    }

    pub fn is_home_set(&self) -> bool {
        self.home_is_set
    }

    /// Current offset from home. Always 0 until home is set.
    pub fn steps_from_home(&self) -> u32 {
        self.position.offset()
    }

    /// Offset from home, if home has been set.
    pub fn position(&self) -> Option<u32> {
        self.home_is_set.then(|| self.position.offset())
    }

    /// Half-pulse delay in milliseconds for `rpm`, truncated.
    pub fn delay_from_rpm(&self, rpm: u32) -> Result<u32> {
        if rpm == 0 {
            return Err(Error::ZeroSpeed);
        }
        let revolution_ms = 60_000 / rpm;
        let phases = u64::from(self.settings.steps_per_revolution) * 2;
        // quotient <= 60_000, fits
        Ok((u64::from(revolution_ms) / phases) as u32)
    }

    fn check_speed(&self, rpm: u32) -> Result<()> {
        if rpm == 0 {
            return Err(Error::ZeroSpeed);
        }
        if rpm > self.settings.max_rpm {
            return Err(Error::SpeedExceeded {
                requested: rpm,
                max: self.settings.max_rpm,
            });
        }
        Ok(())
    }

    /// Emit `steps` pulses in `direction` at `rpm`, blocking until done.
    ///
    /// Refused before any pin is touched when `rpm` is zero or above the
    /// configured maximum.
    pub fn step(&mut self, steps: u32, direction: Direction, rpm: u32) -> Result<()> {
        self.check_speed(rpm)?;
        let half_pulse_ms = self.delay_from_rpm(rpm)?;
        log::debug!("stepping {steps} steps {direction:?} at {rpm} rpm, {half_pulse_ms} ms per phase");

        let mut emitted = 0;
        let outcome = self.emit_pulses(steps, direction, half_pulse_ms, &mut emitted);
        self.update_position_by(emitted, direction);

        let released = if self.settings.hold_position {
            Ok(())
        } else {
            self.disable()
        };
        outcome.and(released)
    }

    fn emit_pulses(&mut self, steps: u32, direction: Direction, half_pulse_ms: u32, emitted: &mut u32) -> Result<()> {
        let high = direction.is_clockwise() != self.settings.invert_direction;
        drive(&mut self.direction, Line::Direction, high)?;
        self.enable()?;
        for _ in 0..steps {
            self.pulse_step(half_pulse_ms)?;
            *emitted += 1;
        }
        Ok(())
    }

    fn pulse_step(&mut self, half_pulse_ms: u32) -> Result<()> {
        drive(&mut self.pulse, Line::Pulse, true)?;
        self.delay.delay_ms(half_pulse_ms);
        drive(&mut self.pulse, Line::Pulse, false)?;
        self.delay.delay_ms(half_pulse_ms);
        Ok(())
    }

    /// Account for one physical step. Does nothing until home is set.
    pub fn update_position(&mut self, direction: Direction) {
        if self.home_is_set {
            self.position.advance(direction);
        }
    }

    fn update_position_by(&mut self, steps: u32, direction: Direction) {
        if self.home_is_set {
            self.position.advance_by(steps, direction);
        }
    }

    pub fn do_one_rotation(&mut self, direction: Direction, rpm: u32) -> Result<()> {
        self.step(self.settings.steps_per_revolution, direction, rpm)
    }

    pub fn rotate(&mut self, rotations: u32, direction: Direction, rpm: u32) -> Result<()> {
        let steps = rotations
            .checked_mul(self.settings.steps_per_revolution)
            .ok_or(Error::StepCountOverflow {
                rotations,
                steps_per_revolution: self.settings.steps_per_revolution,
            })?;
        self.step(steps, direction, rpm)
    }

    /// The current shaft position becomes offset 0.
    pub fn set_current_position_as_home(&mut self) {
        self.position = StepPosition::home(self.settings.steps_per_revolution);
        self.home_is_set = true;
        log::debug!("home set");
    }

    /// Steps `go_to_position` would emit to reach `target` in `direction`.
    ///
    /// `target == steps_per_revolution` is the same physical spot as 0.
    pub fn distance_to(&self, direction: Direction, target: u32) -> Result<u32> {
        if !self.home_is_set {
            return Err(Error::HomeNotSet);
        }
        let steps_per_revolution = self.settings.steps_per_revolution;
        if target > steps_per_revolution {
            return Err(Error::TargetOutOfRange {
                target,
                steps_per_revolution,
            });
        }
        let target = if target == steps_per_revolution { 0 } else { target };
        Ok(self.position.distance_to(target, direction))
    }

    /// Travel to `target` steps from home, always turning in `direction`.
    pub fn go_to_position(&mut self, direction: Direction, rpm: u32, target: u32) -> Result<()> {
        let distance = self.distance_to(direction, target)?;
        if distance == 0 {
            log::debug!("already at {target}");
            return Ok(());
        }
        log::debug!(
            "going from {} to {target} {direction:?}: {distance} steps",
            self.position.offset()
        );
        self.step(distance, direction, rpm)
    }

    /// Block for `ms` milliseconds without touching the lines.
    pub fn dwell(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
