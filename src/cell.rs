use std::fmt::{Display, Formatter};

use crate::config::REAL_STEPS_PER_UNIT;

/// Contents of a single register slot.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Cell {
  /// An integer register. Arithmetic wraps on overflow rather than trapping.
  Int(i64),
  /// A real register, always a multiple of `REAL_QUANTUM`.
  Real(f64),
}

impl Cell {
  /// The value as a real number, used for comparisons across register kinds.
  pub fn as_f64(&self) -> f64 {
    match self {
      Cell::Int(i)  => *i as f64,
      Cell::Real(r) => *r
    }
  }

  /// The value truncated toward zero. Real registers only ever reach this through `floor` or
  /// `round` in practice, so truncation is exact there.
  pub fn as_i64(&self) -> i64 {
    match self {
      Cell::Int(i)  => *i,
      Cell::Real(r) => *r as i64
    }
  }
}

/// Snaps a real value onto the grid the substrate can represent.
pub fn quantize(value: f64) -> f64 {
  if !value.is_finite() {
    return 0.0;
  }
  (value * REAL_STEPS_PER_UNIT).round() / REAL_STEPS_PER_UNIT
}

impl Display for Cell {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Cell::Int(i) => {
        write!(f, "{}", i)
      },
      Cell::Real(r) => {
        write!(f, "{:.3}", r)
      }
    }
  }
}
