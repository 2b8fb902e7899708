//! Numeric tolerance policy applied when comparing tokens.

use bigdecimal::{BigDecimal, One, Zero};
use std::{fmt::Display, str::FromStr};

use crate::error::Error;

/// Number of significant digits retained when computing a relative error.
const ERROR_PRECISION: u64 = 28;

/// Outcome of comparing a single produced token against its expected counterpart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenComparison {
    /// The tokens are byte-for-byte identical.
    Equal,
    /// The tokens differ textually, but their relative error is under the tolerance.
    WithinTolerance(BigDecimal),
    /// The tokens differ beyond what the tolerance allows. Carries the relative error when
    /// one was computed (i.e., when the tolerance is non-zero).
    Exceeds(Option<BigDecimal>),
}

/// The maximum relative numeric error accepted between a produced token and the expected one.
///
/// A zero tolerance demands exact token equality. A positive tolerance additionally accepts
/// numeric tokens whose relative error, `(expected - given) / max(expected, 1)`, is strictly
/// less than the tolerance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tolerance(BigDecimal);

impl Default for Tolerance {
    fn default() -> Self {
        Self::exact()
    }
}

impl Display for Tolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Tolerance {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = BigDecimal::from_str(s.trim())
            .map_err(|e| Error::InvalidTolerance(s.to_owned(), e))?;

        if value < BigDecimal::zero() {
            return Err(Error::NegativeTolerance(s.to_owned()));
        }

        Ok(Self(value))
    }
}

impl Tolerance {
    /// Returns a tolerance requiring exact token equality.
    pub fn exact() -> Self {
        Self(BigDecimal::zero())
    }

    /// Returns whether this tolerance requires exact token equality.
    pub fn is_exact(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns the tolerance as a decimal value.
    pub const fn value(&self) -> &BigDecimal {
        &self.0
    }

    /// Compares a produced token against the expected token.
    ///
    /// # Arguments
    ///
    /// * `given` - The token produced by the command under test.
    /// * `expected` - The token read from the expected-output file.
    ///
    /// # Errors
    ///
    /// Fails when the tolerance is non-zero, the tokens differ, and either one is not a
    /// number.
    pub fn compare(&self, given: &str, expected: &str) -> Result<TokenComparison, Error> {
        if given == expected {
            return Ok(TokenComparison::Equal);
        }

        if self.is_exact() {
            return Ok(TokenComparison::Exceeds(None));
        }

        let given_value = parse_number(given)?;
        let expected_value = parse_number(expected)?;

        let denominator = if expected_value > BigDecimal::one() {
            expected_value.clone()
        } else {
            BigDecimal::one()
        };

        let error = (bounded_difference(expected_value, given_value) / denominator)
            .with_prec(ERROR_PRECISION)
            .normalized();

        if error < self.0 {
            Ok(TokenComparison::WithinTolerance(error))
        } else {
            Ok(TokenComparison::Exceeds(Some(error)))
        }
    }
}

/// Computes `minuend - subtrahend`. When one operand is too small to reach the leading
/// `ERROR_PRECISION` digits of the other, it is dropped rather than aligned; aligning scales
/// of operands like `1e100000000` and `1` would allocate an integer of that many digits.
fn bounded_difference(minuend: BigDecimal, subtrahend: BigDecimal) -> BigDecimal {
    if minuend.is_zero() {
        return -subtrahend;
    }
    if subtrahend.is_zero() {
        return minuend;
    }

    let gap = minuend.order_of_magnitude() - subtrahend.order_of_magnitude();
    let limit = i64::try_from(ERROR_PRECISION).unwrap_or(i64::MAX).saturating_add(2);

    if gap > limit {
        minuend
    } else if gap < -limit {
        -subtrahend
    } else {
        minuend - subtrahend
    }
}

fn parse_number(token: &str) -> Result<BigDecimal, Error> {
    BigDecimal::from_str(token).map_err(|source| Error::NumberParse {
        token: token.to_owned(),
        source,
    })
}
