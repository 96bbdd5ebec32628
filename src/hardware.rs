use anyhow::{Context, Result};
use linux_embedded_hal::Delay;
use open_pi_stepper::{MotorConfig, StepperMotor};
use rppal::gpio::{Gpio, OutputPin as RppalOutputPin};

pub type GpioMotor = StepperMotor<RppalOutputPin, RppalOutputPin, RppalOutputPin, Delay>;

fn output(gpio: &Gpio, pin: u8) -> Result<RppalOutputPin> {
    let output = gpio
        .get(pin)
        .with_context(|| format!("Failed to get GPIO pin {pin}"))?
        .into_output();
    Ok(output)
}

/// Claim the three lines as outputs and build the motor on them.
pub fn gpio_motor(config: &MotorConfig) -> Result<GpioMotor> {
    let gpio = Gpio::new().context("Failed to initialize GPIO")?;
    let enable = output(&gpio, config.enable_pin)?;
    let direction = output(&gpio, config.direction_pin)?;
    let pulse = output(&gpio, config.pulse_pin)?;
    log::info!(
        "GPIO ready: enable {}, direction {}, pulse {}",
        config.enable_pin,
        config.direction_pin,
        config.pulse_pin
    );
    let motor = StepperMotor::new(enable, direction, pulse, Delay, config.settings())?;
    Ok(motor)
}
