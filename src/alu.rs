/*!
  The bit-serial ALU evaluates the seven truth-table operations one bit per tick, from the most
  significant bit of the configured width down to bit 0.

  For each weight `w = 2^i`:

   1. Both bit registers are cleared.
   2. Each operand is probed against `w`. If it is at least `w`, `w` is subtracted and the bit
      register set, so the operands are consumed as they are read.
   3. Every truth-table branch is visited, each gated on the mode register holding its code. Only
      the branch for the current mode can touch the result, adding `w` when its table is true.

  Operands are wrapped into `[0, 2^bits)` before the first bit, which gives negative operands
  their two's-complement bits within the width. After the last bit both operand registers read
  zero.
*/

use std::fmt::{Display, Formatter};

use crate::address::Address;
use crate::bitop::BitOp;
use crate::config::BitWidth;
use crate::continuation::{Completion, InvocationContext, Step};
use crate::machine::Machine;
use crate::operand::{Comparison, Operand};
use crate::registers::RegisterBank;

/**
  The registers one `bitwise` invocation works in. Every invocation gets its own set from the
  bank, so invocations whose chains overlap in time cannot disturb each other.
*/
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ScratchSet {
  pub v1     : Address,
  pub v2     : Address,
  pub result : Address,
  pub mode   : Address,
  pub bit1   : Address,
  pub bit2   : Address,
}

impl ScratchSet {
  pub fn allocate(bank: &mut RegisterBank, context: InvocationContext) -> ScratchSet {
    let scratch = ScratchSet {
      v1     : bank.alloc_int(0),
      v2     : bank.alloc_int(0),
      result : bank.alloc_int(0),
      mode   : bank.alloc_int(0),
      bit1   : bank.alloc_int(0),
      bit2   : bank.alloc_int(0),
    };
    for (address, name) in scratch.named().iter() {
      let _ = bank.label(*address, &format!("{}.{}", context, name));
    }
    scratch
  }

  fn named(&self) -> [(Address, &'static str); 6] {
    [
      (self.v1, "v1"),
      (self.v2, "v2"),
      (self.result, "result"),
      (self.mode, "mode"),
      (self.bit1, "bit1"),
      (self.bit2, "bit2"),
    ]
  }

  /// Zeroes every register but the operands and the mode.
  pub fn clear(&self, bank: &mut RegisterBank) {
    bank.reset(&self.result);
    bank.reset(&self.bit1);
    bank.reset(&self.bit2);
  }
}

#[derive(Clone, Debug)]
pub struct BitSerial {
  scratch    : ScratchSet,
  /// Bits still to process. The next bit is `remaining - 1`.
  remaining  : u32,
  completion : Completion,
}

impl BitSerial {
  /// Prepares the scratch set and returns the loop, ready to be scheduled.
  pub fn new(
    machine    : &mut Machine,
    scratch    : ScratchSet,
    width      : BitWidth,
    completion : Completion
  ) -> BitSerial {
    let bank = machine.registers_mut();
    scratch.clear(bank);
    bank.wrap(&scratch.v1, width.modulus());
    bank.wrap(&scratch.v2, width.modulus());
    BitSerial {
      scratch,
      remaining: width.bits(),
      completion,
    }
  }

  pub fn step(&mut self, machine: &mut Machine) -> Step {
    if self.remaining > 0 {
      self.remaining -= 1;
      process_bit(machine.registers_mut(), &self.scratch, 1i64 << self.remaining);
    }

    match self.remaining {
      0 => {
        self.completion.finish(machine, self.scratch.result);
        Step::Done
      }
      _ => Step::Yield(1)
    }
  }
}

/// One iteration of the loop for the bit of weight `weight`.
fn process_bit(bank: &mut RegisterBank, scratch: &ScratchSet, weight: i64) {
  bank.reset(&scratch.bit1);
  bank.reset(&scratch.bit2);

  for (operand, bit) in [(scratch.v1, scratch.bit1), (scratch.v2, scratch.bit2)].iter() {
    if bank.compare(operand, Comparison::GREATER_OR_EQ, Operand::Const(weight)) {
      bank.subtract(operand, Operand::Const(weight));
      bank.set(bit, Operand::Const(1));
    }
  }

  let bit1 = bank.compare(&scratch.bit1, Comparison::EQ, Operand::Const(1));
  let bit2 = bank.compare(&scratch.bit2, Comparison::EQ, Operand::Const(1));

  for op in BitOp::BOOLEAN.iter() {
    if !bank.compare(&scratch.mode, Comparison::EQ, Operand::Const(op.code() as i64)) {
      continue;
    }
    if op.truth(bit1, bit2) == Some(true) {
      bank.add(&scratch.result, Operand::Const(weight));
    }
  }
}

impl Display for BitSerial {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "alu {} [{} bits left, result {}]",
      self.completion.context,
      self.remaining,
      self.scratch.result
    )
  }
}
