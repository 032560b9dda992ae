//! Rounding policy for the final invoice value.

use serde::{Deserialize, Serialize};

use millerp_core::ValueObject;
use millerp_formula::functions::{
    round_away_from_zero, round_half_away_from_zero, round_toward_zero,
};

/// How the rounded value is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    /// Round the value in place.
    #[default]
    Forward,
    /// Round, and report the difference as a separate round-off line.
    Reverse,
}

/// Which way a value moves when it is rounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingDirection {
    /// Half away from zero.
    #[default]
    Nearest,
    /// Away from zero.
    Up,
    /// Toward zero.
    Down,
}

/// Decimals kept in a round-off beyond the rounding precision. Enough to
/// reconcile the unrounded value, few enough to drop subtraction noise.
const ROUND_OFF_EXTRA_DIGITS: i32 = 6;

/// Rounding applied to the final value of an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingPolicy {
    #[serde(default)]
    pub mode: RoundingMode,
    #[serde(default)]
    pub direction: RoundingDirection,
    /// Decimal digits to keep; negative values round to tens, hundreds, ...
    #[serde(default)]
    pub digits: i32,
}

impl ValueObject for RoundingPolicy {}

/// A value after rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rounded {
    pub value: f64,
    /// `rounded − unrounded`, present only under [`RoundingMode::Reverse`].
    pub round_off: Option<f64>,
}

impl RoundingPolicy {
    pub fn forward(digits: i32) -> Self {
        Self {
            mode: RoundingMode::Forward,
            direction: RoundingDirection::Nearest,
            digits,
        }
    }

    pub fn reverse(digits: i32) -> Self {
        Self {
            mode: RoundingMode::Reverse,
            direction: RoundingDirection::Nearest,
            digits,
        }
    }

    pub fn with_direction(mut self, direction: RoundingDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn apply(&self, value: f64) -> Rounded {
        let rounded = round_in_direction(value, self.digits, self.direction);
        let round_off = match self.mode {
            RoundingMode::Forward => None,
            RoundingMode::Reverse => Some(round_half_away_from_zero(
                rounded - value,
                self.digits.max(0).saturating_add(ROUND_OFF_EXTRA_DIGITS),
            )),
        };
        Rounded {
            value: rounded,
            round_off,
        }
    }
}

/// Round `value` to `digits` decimals, to the nearest value (half away from zero).
pub fn apply_rounding(value: f64, digits: i32, mode: RoundingMode) -> Rounded {
    RoundingPolicy {
        mode,
        direction: RoundingDirection::Nearest,
        digits,
    }
    .apply(value)
}

fn round_in_direction(value: f64, digits: i32, direction: RoundingDirection) -> f64 {
    match direction {
        RoundingDirection::Nearest => round_half_away_from_zero(value, digits),
        RoundingDirection::Up => round_away_from_zero(value, digits),
        RoundingDirection::Down => round_toward_zero(value, digits),
    }
}
