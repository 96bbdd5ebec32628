//! Simulated Digital I/O: output pins and a delay that record into a shared
//! [`Trace`] instead of touching hardware. Used for `--dry-run` and tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

use crate::error::Line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Write { line: Line, high: bool },
    Wait { ns: u64 },
}

/// Shared, cloneable event log.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: Event) {
        self.lock().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Rising edges on the pulse line.
    pub fn pulse_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::Write {
                        line: Line::Pulse,
                        high: true
                    }
                )
            })
            .count()
    }

    /// Writes to `line`, in order.
    pub fn writes(&self, line: Line) -> Vec<bool> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                Event::Write { line: l, high } if *l == line => Some(*high),
                _ => None,
            })
            .collect()
    }

    /// Last level written to `line`, if any.
    pub fn level(&self, line: Line) -> Option<bool> {
        self.writes(line).last().copied()
    }

    /// Every recorded wait, in nanoseconds.
    pub fn waits(&self) -> Vec<u64> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                Event::Wait { ns } => Some(*ns),
                _ => None,
            })
            .collect()
    }

    pub fn total_wait(&self) -> Duration {
        Duration::from_nanos(self.waits().iter().sum())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedFault;

impl embedded_hal::digital::Error for SimulatedFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// An output line that logs its writes.
#[derive(Debug, Clone)]
pub struct SimulatedPin {
    line: Line,
    trace: Trace,
    writes_left: Option<usize>,
}

impl SimulatedPin {
    pub fn new(line: Line, trace: &Trace) -> Self {
        Self {
            line,
            trace: trace.clone(),
            writes_left: None,
        }
    }

    /// A pin that accepts `writes` writes and fails every one after that.
    pub fn failing_after(line: Line, trace: &Trace, writes: usize) -> Self {
        Self {
            writes_left: Some(writes),
            ..Self::new(line, trace)
        }
    }

    fn write(&mut self, high: bool) -> Result<(), SimulatedFault> {
        if let Some(left) = self.writes_left.as_mut() {
            if *left == 0 {
                return Err(SimulatedFault);
            }
            *left -= 1;
        }
        log::trace!("{} line {}", self.line, if high { "high" } else { "low" });
        self.trace.record(Event::Write {
            line: self.line,
            high,
        });
        Ok(())
    }
}

impl ErrorType for SimulatedPin {
    type Error = SimulatedFault;
}

impl OutputPin for SimulatedPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

/// Delay that records every wait. Returns immediately unless `realtime`.
#[derive(Debug, Clone)]
pub struct SimulatedDelay {
    trace: Trace,
    realtime: bool,
}

impl SimulatedDelay {
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
            realtime: false,
        }
    }

    pub fn realtime(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
            realtime: true,
        }
    }

    fn wait(&mut self, ns: u64) {
        self.trace.record(Event::Wait { ns });
        if self.realtime {
            std::thread::sleep(Duration::from_nanos(ns));
        }
    }
}

impl DelayNs for SimulatedDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.wait(u64::from(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.wait(u64::from(us) * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.wait(u64::from(ms) * 1_000_000);
    }
}

/// Pins and delay for one simulated motor, all recording into `trace`.
pub fn pin_bank(trace: &Trace) -> (SimulatedPin, SimulatedPin, SimulatedPin, SimulatedDelay) {
    (
        SimulatedPin::new(Line::Enable, trace),
        SimulatedPin::new(Line::Direction, trace),
        SimulatedPin::new(Line::Pulse, trace),
        SimulatedDelay::new(trace),
    )
}
