//! Register addresses. An address names a slot of the register bank and carries the kind of
//! arithmetic the slot obeys.

use std::fmt::{Display, Formatter};

// `AddressNumberType` is `usize`, as it is naturally an index into the register bank.
pub type AddressNumberType = usize;

/**
  The address of a register slot. Slot numbers are handed out by a single monotonic allocator
  shared by both kinds of register, so `Integer(3)` and `Real(3)` never both exist. The kind is
  carried in the address so that a caller can tell without asking the bank which arithmetic a
  register obeys.
*/
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum Address {
  /// An integer-valued register.
  Integer(AddressNumberType),
  /// A real-valued register, quantized to `REAL_QUANTUM` on every write.
  Real(AddressNumberType)
}

impl Address {
  /// Converts the address to an index into the register vector.
  pub fn idx(&self) -> AddressNumberType {
    match self {
      | Address::Integer(i)
      | Address::Real(i) => *i
    }
  }

  pub fn is_real(&self) -> bool {
    match self {
      Address::Real(_) => true,
      _ => false
    }
  }

  /// Panics if the address is not an integer register.
  pub fn require_integer(&self) {
    if !self.is_real() {
      return;
    }
    unreachable!(
      "Error: A real register was given when an integer register was required: {}",
      self
    );
  }
}


impl Display for Address {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Address::Integer(i) => {
        write!(f, "I[{}]", i)
      },
      Address::Real(i) => {
        write!(f, "R[{}]", i)
      }
    }
  }
}
