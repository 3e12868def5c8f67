//! Numeric increments.

use crate::error::StateError;
use crate::value::Scalar;

/// An increment relative to a stored numeric value.
///
/// `base` is the value the writer last observed and `delta` the increment it
/// applied on top; the full value is `base + delta`. Applied onto a stored
/// number only the increment is added, so concurrent writers incrementing
/// the same field do not overwrite each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delta {
    Long { base: i64, delta: i64 },
    Double { base: f64, delta: f64 },
}

impl Delta {
    pub fn long(base: i64, delta: i64) -> Self {
        Delta::Long { base, delta }
    }

    pub fn double(base: f64, delta: f64) -> Self {
        Delta::Double { base, delta }
    }

    /// Value installed when the target field has no prior value.
    pub fn full_value(&self) -> Result<Scalar, StateError> {
        match *self {
            Delta::Long { base, delta } => checked_sum(base, delta).map(Scalar::Long),
            Delta::Double { base, delta } => Ok(Scalar::Double(base + delta)),
        }
    }

    /// `base + delta` as a float, which cannot overflow. Used for ordering
    /// and display only.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Delta::Long { base, delta } => base as f64 + delta as f64,
            Delta::Double { base, delta } => base + delta,
        }
    }

    pub fn delta_value(&self) -> Scalar {
        match *self {
            Delta::Long { delta, .. } => Scalar::Long(delta),
            Delta::Double { delta, .. } => Scalar::Double(delta),
        }
    }

    /// Composes two increments: the base of `self` is kept and the
    /// increments are summed. The numeric kind of `self` wins.
    pub fn add(&self, other: &Delta) -> Result<Delta, StateError> {
        let composed = match (*self, *other) {
            (Delta::Long { base, delta }, Delta::Long { delta: d, .. }) => Delta::Long {
                base,
                delta: checked_sum(delta, d)?,
            },
            (Delta::Long { base, delta }, Delta::Double { delta: d, .. }) => Delta::Long {
                base,
                delta: checked_sum(delta, d as i64)?,
            },
            (Delta::Double { base, delta }, other) => Delta::Double {
                base,
                delta: delta + other.delta_value().as_f64().unwrap_or(0.0),
            },
        };
        Ok(composed)
    }

    /// Adds the increment to `current`, producing a value of this delta's
    /// numeric kind.
    pub fn apply_to(&self, current: &Scalar) -> Result<Scalar, StateError> {
        match (*self, current) {
            (Delta::Long { delta, .. }, Scalar::Long(n)) => checked_sum(*n, delta).map(Scalar::Long),
            (Delta::Long { delta, .. }, Scalar::Double(n)) => checked_sum(*n as i64, delta).map(Scalar::Long),
            (Delta::Double { delta, .. }, Scalar::Long(n)) => Ok(Scalar::Double(*n as f64 + delta)),
            (Delta::Double { delta, .. }, Scalar::Double(n)) => Ok(Scalar::Double(n + delta)),
            (_, other) => Err(StateError::unsupported(format!(
                "cannot apply Delta on non-numeric {}",
                other.type_name()
            ))),
        }
    }
}

fn checked_sum(a: i64, b: i64) -> Result<i64, StateError> {
    a.checked_add(b)
        .ok_or_else(|| StateError::NumericOverflow(format!("{a} + {b}")))
}
