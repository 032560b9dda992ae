//! Whitelisted functions.
//!
//! Formulas may only call what is listed here. Names are matched
//! case-insensitively (`Round`, `ROUND` and `round` are the same function).

use crate::error::{FormulaError, FormulaResult};

/// Beyond this many decimal digits an `f64` has nothing left to round.
const MAX_ROUNDING_DIGITS: i32 = 15;

/// A function callable from a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    /// `Round(value, digits)`: round half away from zero to `digits` decimals.
    Round,
}

impl Function {
    /// Every function the grammar accepts.
    pub const ALL: &'static [Function] = &[Function::Round];

    /// Look up a whitelisted function by name, ignoring ASCII case.
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|function| function.name().eq_ignore_ascii_case(name))
    }

    /// Canonical (upper-case) name.
    pub fn name(self) -> &'static str {
        match self {
            Function::Round => "ROUND",
        }
    }

    /// Exact number of arguments the function takes.
    pub fn arity(self) -> usize {
        match self {
            Function::Round => 2,
        }
    }

    pub(crate) fn check_arity(self, actual: usize) -> FormulaResult<()> {
        if actual == self.arity() {
            Ok(())
        } else {
            Err(FormulaError::ArgumentCount {
                function: self.name(),
                expected: self.arity(),
                actual,
            })
        }
    }

    /// Apply the function to already evaluated arguments.
    pub fn apply(self, args: &[f64]) -> FormulaResult<f64> {
        self.check_arity(args.len())?;
        match self {
            Function::Round => {
                let digits = digits_argument(args[1])?;
                Ok(round_half_away_from_zero(args[0], digits))
            }
        }
    }
}

/// Truncates a numeric `digits` argument to an integer digit count.
pub fn digits_argument(digits: f64) -> FormulaResult<i32> {
    if !digits.is_finite() {
        return Err(FormulaError::NonFinite);
    }
    // `as` saturates; huge digit counts are clamped in `round_with`.
    Ok(digits.trunc() as i32)
}

/// Round half away from zero: `2.5 → 3`, `-2.5 → -3`, `2.4 → 2`.
///
/// Negative `digits` round to the left of the decimal point (`-2` rounds to
/// hundreds).
pub fn round_half_away_from_zero(value: f64, digits: i32) -> f64 {
    round_with(value, digits, f64::round)
}

/// Round away from zero (`1.21 → 1.3`, `-1.21 → -1.3` at one digit).
pub fn round_away_from_zero(value: f64, digits: i32) -> f64 {
    round_with(value, digits, |scaled| {
        if scaled >= 0.0 {
            scaled.ceil()
        } else {
            scaled.floor()
        }
    })
}

/// Round toward zero, i.e. truncate (`1.29 → 1.2`, `-1.29 → -1.2` at one digit).
pub fn round_toward_zero(value: f64, digits: i32) -> f64 {
    round_with(value, digits, f64::trunc)
}

fn round_with(value: f64, digits: i32, op: impl Fn(f64) -> f64) -> f64 {
    if !value.is_finite() || digits > MAX_ROUNDING_DIGITS {
        return value;
    }

    if digits >= 0 {
        let factor = 10_f64.powi(digits);
        let scaled = value * factor;
        if !scaled.is_finite() {
            return value;
        }
        op(scaled) / factor
    } else {
        // Divide by an exact power of ten rather than multiplying by an inexact 10^-n.
        let factor = 10_f64.powi(digits.saturating_neg());
        if !factor.is_finite() {
            return 0.0;
        }
        op(value / factor) * factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(Function::lookup("Round"), Some(Function::Round));
        assert_eq!(Function::lookup("ROUND"), Some(Function::Round));
        assert_eq!(Function::lookup("round"), Some(Function::Round));
        assert_eq!(Function::lookup("Floor"), None);
        assert_eq!(Function::lookup("eval"), None);
    }

    #[test]
    fn round_half_goes_away_from_zero() {
        assert_eq!(round_half_away_from_zero(2.5, 0), 3.0);
        assert_eq!(round_half_away_from_zero(-2.5, 0), -3.0);
        assert_eq!(round_half_away_from_zero(2.4, 0), 2.0);
        assert_eq!(round_half_away_from_zero(-2.4, 0), -2.0);
        assert_eq!(round_half_away_from_zero(1.25, 1), 1.3);
        assert_eq!(round_half_away_from_zero(62_857.142_857, 0), 62_857.0);
    }

    #[test]
    fn negative_digits_round_left_of_the_point() {
        assert_eq!(round_half_away_from_zero(1_234.0, -1), 1_230.0);
        assert_eq!(round_half_away_from_zero(1_250.0, -2), 1_300.0);
        assert_eq!(round_half_away_from_zero(-1_250.0, -2), -1_300.0);
    }

    #[test]
    fn directional_rounding() {
        assert_eq!(round_away_from_zero(1.21, 1), 1.3);
        assert_eq!(round_away_from_zero(-1.21, 1), -1.3);
        assert_eq!(round_toward_zero(1.29, 1), 1.2);
        assert_eq!(round_toward_zero(-1.29, 1), -1.2);
        assert_eq!(round_away_from_zero(7.0, 0), 7.0);
    }

    #[test]
    fn excessive_digits_leave_value_untouched() {
        assert_eq!(round_half_away_from_zero(0.1, 40), 0.1);
        assert_eq!(round_half_away_from_zero(1e300, 10), 1e300);
        assert_eq!(round_half_away_from_zero(12_345.0, -400), 0.0);
    }

    #[test]
    fn apply_checks_arity_and_digits() {
        assert_eq!(Function::Round.apply(&[2.567, 2.0]), Ok(2.57));
        assert_eq!(Function::Round.apply(&[2.567, 1.9]), Ok(2.6));

        assert_eq!(
            Function::Round.apply(&[2.567]),
            Err(FormulaError::ArgumentCount {
                function: "ROUND",
                expected: 2,
                actual: 1,
            })
        );
        assert_eq!(
            Function::Round.apply(&[2.567, f64::NAN]),
            Err(FormulaError::NonFinite)
        );
    }
}
