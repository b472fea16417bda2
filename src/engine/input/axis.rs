// Analog axis digitizing

use super::action::{Action, Axis, TriState};
use super::config::AxisBinding;
use std::collections::HashMap;

/// Reduce a signed axis value to three positions.
///
/// A zero threshold leaves the exact center neutral, so a resting stick
/// never reports a direction.
pub fn digitize(value: i16, threshold: u16) -> TriState {
    let value = i32::from(value);
    let threshold = i32::from(threshold);
    if value < 0 && value <= -threshold {
        TriState::Negative
    } else if value > 0 && value >= threshold {
        TriState::Positive
    } else {
        TriState::Neutral
    }
}

/// Direction edges produced by one axis sample, to be applied in order:
/// the release first, then the press
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisTransition {
    pub release: Option<Action>,
    pub press: Option<Action>,
}

impl AxisTransition {
    pub fn is_empty(&self) -> bool {
        self.release.is_none() && self.press.is_none()
    }
}

fn direction(axis: Axis, position: TriState) -> Option<Action> {
    let (negative, positive) = axis.directions();
    match position {
        TriState::Negative => Some(negative),
        TriState::Positive => Some(positive),
        TriState::Neutral => None,
    }
}

/// Per-axis digitizer state
#[derive(Debug, Default)]
pub struct AxisDigitizer {
    /// Last position of every physical axis seen so far
    positions: HashMap<u8, TriState>,

    /// Physical axis that last changed position, until cleared
    last_axis_moved: Option<u8>,
}

impl AxisDigitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one motion sample.
    ///
    /// Every physical axis is tracked so calibration screens can see it move;
    /// only the two bound axes produce direction edges. A swing straight from
    /// one side to the other yields both a release and a press.
    pub fn update(&mut self, index: u8, value: i16, binding: &AxisBinding) -> AxisTransition {
        let new = digitize(value, binding.threshold());
        let old = self.positions.insert(index, new).unwrap_or_default();

        if old == new {
            return AxisTransition::default();
        }
        self.last_axis_moved = Some(index);

        match binding.axis_for(index) {
            Some(axis) => AxisTransition {
                release: direction(axis, old),
                press: direction(axis, new),
            },
            None => AxisTransition::default(),
        }
    }

    /// Forget a physical axis, returning the release owed for its held
    /// direction when it was acting as `axis`
    pub fn reset_axis(&mut self, index: u8, axis: Axis) -> AxisTransition {
        let old = self.positions.remove(&index).unwrap_or_default();
        AxisTransition {
            release: direction(axis, old),
            press: None,
        }
    }

    /// Current position of a physical axis
    pub fn position(&self, index: u8) -> TriState {
        self.positions.get(&index).copied().unwrap_or_default()
    }

    /// Physical axis that last changed position
    pub fn last_axis_moved(&self) -> Option<u8> {
        self.last_axis_moved
    }

    /// Clear the last-moved latch
    pub fn reset_last_axis_moved(&mut self) {
        self.last_axis_moved = None;
    }

    /// Forget every axis
    pub fn clear(&mut self) {
        self.positions.clear();
        self.last_axis_moved = None;
    }
}
