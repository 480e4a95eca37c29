//! The right-hand side of every register mutation and comparison.

use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, IntoStaticStr};

use crate::address::Address;

/// Either a constant or another register, as accepted by every register operation.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Operand {
  Const(i64),
  Register(Address),
}

impl From<i64> for Operand {
  fn from(value: i64) -> Self {
    Operand::Const(value)
  }
}

// Lets untyped integer literals fall back to `i32` at call sites.
impl From<i32> for Operand {
  fn from(value: i32) -> Self {
    Operand::Const(value as i64)
  }
}

impl From<Address> for Operand {
  fn from(address: Address) -> Self {
    Operand::Register(address)
  }
}

impl Display for Operand {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Operand::Const(value)      => write!(f, "{}", value),
      Operand::Register(address) => write!(f, "{}", address)
    }
  }
}

/// Comparison operators understood by conditional dispatch.
#[allow(non_camel_case_types)]
#[derive(StrumDisplay, IntoStaticStr, Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Comparison {
  EQ,
  NOT_EQ,
  GREATER,
  GREATER_OR_EQ,
  LESS,
  LESS_OR_EQ,
}

impl Comparison {
  pub fn holds(&self, lhs: f64, rhs: f64) -> bool {
    match self {
      Comparison::EQ            => lhs == rhs,
      Comparison::NOT_EQ        => lhs != rhs,
      Comparison::GREATER       => lhs > rhs,
      Comparison::GREATER_OR_EQ => lhs >= rhs,
      Comparison::LESS          => lhs < rhs,
      Comparison::LESS_OR_EQ    => lhs <= rhs,
    }
  }
}
