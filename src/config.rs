//! Compile-time constants and the single runtime setting of the engine, its bit width.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::ConfigError;

/// Registers of the substrate are 32-bit signed integers, so 31 magnitude bits are available.
pub const MAX_BITS: u32 = 31;
/// Width used by the binary when `--bits` is not given.
pub const DEFAULT_BITS: u32 = MAX_BITS;
/// Real registers hold multiples of `1 / REAL_STEPS_PER_UNIT`.
pub const REAL_STEPS_PER_UNIT: f64 = 1000.0;
/// The smallest representable difference between two real register values.
pub const REAL_QUANTUM: f64 = 1.0 / REAL_STEPS_PER_UNIT;

/**
  The number of bits the bit-serial operations walk, in `0..=MAX_BITS`.

  A width is built from any number: the magnitude is rounded half away from zero, so `-3.6`
  becomes `4`. Anything that is not a finite number is a configuration error, as is a width the
  registers cannot hold.
*/
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct BitWidth(u32);

impl BitWidth {
  pub fn new(bits: f64) -> Result<BitWidth, ConfigError> {
    if !bits.is_finite() {
      return Err(ConfigError::NotANumber(bits.to_string()));
    }
    let rounded = bits.abs().round();
    if rounded > MAX_BITS as f64 {
      return Err(ConfigError::TooWide(rounded as u64));
    }
    Ok(BitWidth(rounded as u32))
  }

  pub fn bits(&self) -> u32 {
    self.0
  }

  /// `2^bits`, the exclusive upper bound of an operand.
  pub fn modulus(&self) -> i64 {
    1i64 << self.0
  }

  /// Weights `2^(bits-1)` down to `2^0`, the order every bit-serial walk uses.
  pub fn weights(&self) -> impl Iterator<Item = i64> {
    (0..self.0).rev().map(|i| 1i64 << i)
  }
}

impl Default for BitWidth {
  fn default() -> Self {
    BitWidth(DEFAULT_BITS)
  }
}

impl FromStr for BitWidth {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().parse::<f64>() {
      Ok(bits) => BitWidth::new(bits),
      Err(_)   => Err(ConfigError::NotANumber(s.to_string()))
    }
  }
}

impl Display for BitWidth {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} bits", self.0)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rounds_magnitude() {
    assert_eq!(BitWidth::new(4.0).unwrap().bits(), 4);
    assert_eq!(BitWidth::new(3.5).unwrap().bits(), 4);
    assert_eq!(BitWidth::new(-3.6).unwrap().bits(), 4);
    assert_eq!(BitWidth::new(0.2).unwrap().bits(), 0);
    assert_eq!(BitWidth::new(31.4).unwrap().bits(), 31);
  }

  #[test]
  fn rejects_too_wide() {
    assert_eq!(BitWidth::new(32.0), Err(ConfigError::TooWide(32)));
    assert_eq!(BitWidth::new(-31.5), Err(ConfigError::TooWide(32)));
  }

  #[test]
  fn rejects_non_numbers() {
    assert!(matches!(BitWidth::new(f64::NAN), Err(ConfigError::NotANumber(_))));
    assert!(matches!(BitWidth::new(f64::INFINITY), Err(ConfigError::NotANumber(_))));
    assert_eq!(
      "eight".parse::<BitWidth>(),
      Err(ConfigError::NotANumber("eight".to_string()))
    );
    assert!(matches!("NaN".parse::<BitWidth>(), Err(ConfigError::NotANumber(_))));
  }

  #[test]
  fn parses_strings() {
    assert_eq!(" 12 ".parse::<BitWidth>().unwrap().bits(), 12);
    assert_eq!("7.5".parse::<BitWidth>().unwrap().bits(), 8);
  }

  #[test]
  fn weights_run_high_to_low() {
    let width = BitWidth::new(4.0).unwrap();
    assert_eq!(width.weights().collect::<Vec<_>>(), vec![8, 4, 2, 1]);
    assert_eq!(width.modulus(), 16);
    assert_eq!(BitWidth::new(0.0).unwrap().weights().count(), 0);
  }
}
