/*!
  The fixed operation set of the engine.

  The mode register of a `bitwise` invocation holds the numeric code of one of these operations,
  and every branch of the bit-serial loop compares against that code. The codes are therefore
  part of the machine's observable state and must not be renumbered.
*/

use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/**
  Operations accepted by `Engine::bitwise`.

  `LSHIFT` and `RSHIFT` go to the shift unit; the other seven are truth tables evaluated one bit
  at a time by the bit-serial ALU. `NOT` ignores its second operand.
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq, PartialEq,  Debug,            Hash
)]
#[repr(u8)]
pub enum BitOp {
  AND    = 1,
  OR     = 2,
  XOR    = 3,
  LSHIFT = 4,
  RSHIFT = 5,
  NAND   = 6,
  NOR    = 7,
  NOT    = 8,
  XNOR   = 9,
}

impl BitOp {
  /// The truth-table operations, in the order the ALU evaluates their branches.
  pub const BOOLEAN: [BitOp; 7] = [
    BitOp::AND,
    BitOp::OR,
    BitOp::XOR,
    BitOp::NAND,
    BitOp::NOR,
    BitOp::NOT,
    BitOp::XNOR,
  ];

  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  pub fn is_shift(&self) -> bool {
    match self {
      BitOp::LSHIFT | BitOp::RSHIFT => true,
      _ => false
    }
  }

  /// Whether the second operand is ignored.
  pub fn is_unary(&self) -> bool {
    *self == BitOp::NOT
  }

  /// Whether the result bit is set for the given operand bits. Shifts have no truth table.
  pub fn truth(&self, bit1: bool, bit2: bool) -> Option<bool> {
    let set = match self {
      BitOp::AND  => bit1 && bit2,
      BitOp::OR   => bit1 || bit2,
      BitOp::XOR  => bit1 != bit2,
      BitOp::NAND => !(bit1 && bit2),
      BitOp::NOR  => !(bit1 || bit2),
      BitOp::NOT  => !bit1,
      BitOp::XNOR => bit1 == bit2,
      BitOp::LSHIFT | BitOp::RSHIFT => return None,
    };
    Some(set)
  }
}
