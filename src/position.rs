//! Angular position bookkeeping on a circle of `steps_per_revolution` steps.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    #[serde(alias = "cw")]
    Clockwise,
    #[serde(alias = "ccw")]
    CounterClockwise,
}

impl Direction {
    pub fn is_clockwise(self) -> bool {
        self == Direction::Clockwise
    }
}

/// Offset from home, clockwise-positive, always in `0..steps_per_revolution`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPosition {
    offset: u32,
    steps_per_revolution: u32,
}

impl StepPosition {
    /// Home position on a circle of `steps_per_revolution` steps.
    ///
    /// `steps_per_revolution` must be non-zero.
    pub fn home(steps_per_revolution: u32) -> Self {
        debug_assert!(steps_per_revolution > 0);
        Self {
            offset: 0,
            steps_per_revolution,
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn steps_per_revolution(&self) -> u32 {
        self.steps_per_revolution
    }

    /// Move by a single step.
    pub fn advance(&mut self, direction: Direction) {
        match direction {
            Direction::Clockwise => {
                self.offset += 1;
                if self.offset == self.steps_per_revolution {
                    self.offset = 0;
                }
            }
            Direction::CounterClockwise => {
                if self.offset == 0 {
                    self.offset = self.steps_per_revolution;
                }
                self.offset -= 1;
            }
        }
    }

    /// Net effect of `steps` single steps in `direction`.
    pub fn advance_by(&mut self, steps: u32, direction: Direction) {
        let modulus = u64::from(self.steps_per_revolution);
        let shift = u64::from(steps) % modulus;
        let offset = u64::from(self.offset);
        let next = match direction {
            Direction::Clockwise => (offset + shift) % modulus,
            Direction::CounterClockwise => (offset + modulus - shift) % modulus,
        };
        // next < steps_per_revolution, so it fits
        self.offset = next as u32;
    }

    /// Steps needed to reach `target` travelling only in `direction`.
    ///
    /// `target` must already be normalized into `0..steps_per_revolution`.
    /// Returns 0 when already there; never takes the other, possibly
    /// shorter, way around.
    pub fn distance_to(&self, target: u32, direction: Direction) -> u32 {
        debug_assert!(target < self.steps_per_revolution);
        let current = self.offset;
        if target == current {
            return 0;
        }
        match direction {
            Direction::Clockwise if target > current => target - current,
            Direction::Clockwise => self.steps_per_revolution - current + target,
            Direction::CounterClockwise if target > current => {
                current + (self.steps_per_revolution - target)
            }
            Direction::CounterClockwise => current - target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(offset: u32, steps_per_revolution: u32) -> StepPosition {
        let mut position = StepPosition::home(steps_per_revolution);
        position.advance_by(offset, Direction::Clockwise);
        position
    }

    #[test]
    fn clockwise_wraps_to_zero() {
        let mut position = at(199, 200);
        position.advance(Direction::Clockwise);
        assert_eq!(position.offset(), 0);
    }

    #[test]
    fn counter_clockwise_wraps_to_last_step() {
        let mut position = StepPosition::home(200);
        position.advance(Direction::CounterClockwise);
        assert_eq!(position.offset(), 199);
    }

    #[test]
    fn full_revolution_returns_home() {
        let mut position = StepPosition::home(200);
        for _ in 0..200 {
            position.advance(Direction::Clockwise);
        }
        assert_eq!(position.offset(), 0);
    }

    #[test]
    fn offset_stays_in_range() {
        let mut position = StepPosition::home(7);
        let pattern = [true, true, false, false, false, true, false, false, false, false];
        for clockwise in pattern.iter().cycle().take(500) {
            let direction = if *clockwise {
                Direction::Clockwise
            } else {
                Direction::CounterClockwise
            };
            position.advance(direction);
            assert!(position.offset() < 7);
        }
    }

    #[test]
    fn bulk_advance_matches_single_steps() {
        for start in [0, 1, 57, 199] {
            for steps in [0, 1, 10, 199, 200, 201, 1234] {
                for direction in [Direction::Clockwise, Direction::CounterClockwise] {
                    let mut single = at(start, 200);
                    for _ in 0..steps {
                        single.advance(direction);
                    }
                    let mut bulk = at(start, 200);
                    bulk.advance_by(steps, direction);
                    assert_eq!(
                        bulk, single,
                        "start {start}, {steps} steps {direction:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn bulk_advance_handles_huge_counts() {
        let mut position = at(3, 200);
        position.advance_by(u32::MAX, Direction::CounterClockwise);
        // u32::MAX % 200 == 95
        assert_eq!(position.offset(), 108);
    }

    #[test]
    fn there_and_back_is_identity() {
        for start in [0, 5, 150, 199] {
            let mut position = at(start, 200);
            position.advance_by(321, Direction::Clockwise);
            position.advance_by(321, Direction::CounterClockwise);
            assert_eq!(position.offset(), start);
        }
    }

    #[test]
    fn clockwise_direct() {
        assert_eq!(at(10, 200).distance_to(50, Direction::Clockwise), 40);
        assert_eq!(at(0, 200).distance_to(199, Direction::Clockwise), 199);
    }

    #[test]
    fn clockwise_through_home() {
        assert_eq!(at(10, 200).distance_to(5, Direction::Clockwise), 195);
        assert_eq!(at(199, 200).distance_to(0, Direction::Clockwise), 1);
    }

    #[test]
    fn counter_clockwise_through_home() {
        assert_eq!(at(10, 200).distance_to(50, Direction::CounterClockwise), 160);
        assert_eq!(at(0, 200).distance_to(199, Direction::CounterClockwise), 1);
    }

    #[test]
    fn counter_clockwise_direct() {
        assert_eq!(at(10, 200).distance_to(5, Direction::CounterClockwise), 5);
        assert_eq!(at(199, 200).distance_to(0, Direction::CounterClockwise), 199);
    }

    #[test]
    fn already_there() {
        for direction in [Direction::Clockwise, Direction::CounterClockwise] {
            assert_eq!(at(42, 200).distance_to(42, direction), 0);
        }
    }

    #[test]
    fn travelling_the_distance_lands_on_target() {
        for start in [0, 1, 100, 199] {
            for target in [0, 1, 99, 100, 199] {
                for direction in [Direction::Clockwise, Direction::CounterClockwise] {
                    let mut position = at(start, 200);
                    let distance = position.distance_to(target, direction);
                    assert!(distance < 200);
                    position.advance_by(distance, direction);
                    assert_eq!(position.offset(), target);
                }
            }
        }
    }

    #[test]
    fn direction_aliases_parse() {
        #[derive(Deserialize)]
        struct Wrapper {
            direction: Direction,
        }
        let parsed: Wrapper = toml_edit::de::from_str("direction = \"ccw\"").unwrap();
        assert_eq!(parsed.direction, Direction::CounterClockwise);
        let parsed: Wrapper = toml_edit::de::from_str("direction = \"clockwise\"").unwrap();
        assert_eq!(parsed.direction, Direction::Clockwise);
    }
}
