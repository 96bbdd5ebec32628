use anyhow::{Context, Result};
use clap::Parser;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{error, info, warn};
use open_pi_stepper::sim::{SimulatedDelay, SimulatedPin, Trace};
use open_pi_stepper::{Config, Line, MotorConfig, Program, RunReport, StepperMotor};
use tokio::{signal, task};

mod cli;
mod hardware;

fn init_logging(verbosity_level: u8) {
    let level = match verbosity_level {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    init_logging(args.verbosity_level);

    let config = Config::load(&args.config).with_context(|| format!("loading {}", args.config.display()))?;
    let (name, motor_config) = config.motor(args.motor.as_deref())?;
    let motor_config = motor_config.clone();
    let program = args.program()?;
    info!(
        "driving '{name}' ({} steps/rev, max {} rpm), {} command(s)",
        motor_config.steps_per_revolution,
        motor_config.max_rpm,
        program.commands.len()
    );

    let dry_run = args.dry_run;
    // stepping busy-waits, keep it off the runtime
    let job = task::spawn_blocking(move || {
        if dry_run {
            run_simulated(&motor_config, &program)
        } else {
            run_on_gpio(&motor_config, &program)
        }
    });

    let report = tokio::select! {
        joined = job => joined.context("motion worker panicked")??,
        _ = signal::ctrl_c() => {
            warn!("interrupted, abandoning the current move");
            std::process::exit(130);
        }
    };

    info!("{} command(s) executed, {} refused", report.executed, report.failed);
    if report.failed > 0 {
        anyhow::bail!("{} command(s) refused", report.failed);
    }
    Ok(())
}

fn run_on_gpio(config: &MotorConfig, program: &Program) -> Result<RunReport> {
    let motor = hardware::gpio_motor(config)?;
    execute(motor, program)
}

fn run_simulated(config: &MotorConfig, program: &Program) -> Result<RunReport> {
    let trace = Trace::new();
    let motor = StepperMotor::new(
        SimulatedPin::new(Line::Enable, &trace),
        SimulatedPin::new(Line::Direction, &trace),
        SimulatedPin::new(Line::Pulse, &trace),
        SimulatedDelay::realtime(&trace),
        config.settings(),
    )?;
    let report = execute(motor, program)?;
    info!(
        "dry run: {} pulses over {:?}",
        trace.pulse_count(),
        trace.total_wait()
    );
    Ok(report)
}

fn execute<EN, DIR, PUL, D>(mut motor: StepperMotor<EN, DIR, PUL, D>, program: &Program) -> Result<RunReport>
where
    EN: OutputPin,
    DIR: OutputPin,
    PUL: OutputPin,
    D: DelayNs,
{
    let report = program.run(&mut motor, |index, command, e| {
        error!("command #{index} {command:?} refused: {e}");
    });
    if let Err(e) = motor.disable() {
        warn!("failed to release the driver: {e}");
    }
    let report = report?;
    match motor.position() {
        Some(offset) => info!("{offset} steps from home"),
        None => info!("home not set"),
    }
    Ok(report)
}
