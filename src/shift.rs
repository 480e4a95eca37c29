//! LSHIFT and RSHIFT as a multiply or a floored divide by a power of two.
//!
//! Shifts are the one part of `bitwise` that does not walk bits. The shift amount in `v2` is
//! handed to the exponentiation engine; once that chain completes the shift resumes and applies
//! a single mutation. LSHIFT never truncates to the configured width. RSHIFT floors, so a
//! negative operand shifts arithmetically.

use std::fmt::{Display, Formatter};

use crate::address::Address;
use crate::bitop::BitOp;
use crate::alu::ScratchSet;
use crate::continuation::{Completion, Step};
use crate::machine::Machine;
use crate::operand::Operand;
use crate::pow2;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Phase {
  /// The power of two has not been requested yet.
  Start,
  /// Parked on the exponentiation; its result register is known.
  Apply(Address),
}

#[derive(Clone, Debug)]
pub struct Shift {
  scratch    : ScratchSet,
  direction  : BitOp,
  phase      : Phase,
  completion : Completion,
}

impl Shift {
  /// `direction` must be `LSHIFT` or `RSHIFT`.
  pub fn new(scratch: ScratchSet, direction: BitOp, completion: Completion) -> Shift {
    debug_assert!(direction.is_shift());
    Shift {
      scratch,
      direction,
      phase: Phase::Start,
      completion,
    }
  }

  pub fn step(&mut self, machine: &mut Machine) -> Step {
    match self.phase {

      Phase::Start => {
        machine.registers_mut().reset(&self.scratch.result);
        let power = pow2::start(machine, Operand::Register(self.scratch.v2), false);
        self.phase = Phase::Apply(power.output);
        Step::Park(power.context)
      }

      Phase::Apply(power) => {
        let ScratchSet { v1, result, .. } = self.scratch;
        let bank = machine.registers_mut();
        match self.direction {
          BitOp::LSHIFT => {
            bank.set(&result, Operand::Register(v1));
            bank.multiply(&result, Operand::Register(power));
          }
          _ => bank.floor_quotient(&result, Operand::Register(v1), Operand::Register(power)),
        }
        self.completion.finish(machine, result);
        Step::Done
      }

    }
  }
}

impl Display for Shift {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.phase {
      Phase::Start        => write!(f, "{} {} [requesting power]", self.direction, self.completion.context),
      Phase::Apply(power) => write!(f, "{} {} [by {}]", self.direction, self.completion.context, power),
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::continuation::Continuation;

  fn shift(x: i64, direction: BitOp, k: i64) -> (i64, u64) {
    let mut machine = Machine::new();
    let context = machine.new_context();
    let scratch = ScratchSet::allocate(machine.registers_mut(), context);
    machine.registers_mut().set(&scratch.v1, Operand::Const(x));
    machine.registers_mut().set(&scratch.v2, Operand::Const(k));
    let completion = Completion { context, copy_to: None };
    machine.schedule(0, Continuation::Shift(Shift::new(scratch, direction, completion)));
    let ticks = machine.run();
    assert!(machine.is_complete(context));
    (machine.registers().int(&scratch.result), ticks)
  }

  #[test]
  fn left_shift_multiplies() {
    assert_eq!(shift(3, BitOp::LSHIFT, 2).0, 12);
    assert_eq!(shift(5, BitOp::LSHIFT, 0).0, 5);
  }

  #[test]
  fn left_shift_does_not_truncate() {
    assert_eq!(shift(15, BitOp::LSHIFT, 4).0, 240);
    assert_eq!(shift((1 << 31) - 1, BitOp::LSHIFT, 31).0, ((1i64 << 31) - 1) << 31);
  }

  #[test]
  fn right_shift_floors() {
    assert_eq!(shift(13, BitOp::RSHIFT, 2).0, 3);
    assert_eq!(shift(13, BitOp::RSHIFT, 4).0, 0);
    assert_eq!(shift(-13, BitOp::RSHIFT, 2).0, -4);
  }

  #[test]
  fn negative_amounts_shift_by_nothing() {
    assert_eq!(shift(6, BitOp::LSHIFT, -3).0, 6);
    assert_eq!(shift(6, BitOp::RSHIFT, -3).0, 6);
  }

  #[test]
  fn waits_for_the_power() {
    // Request at tick 0, one tick of delay, then three rounds for 2^2. The shift resumes in the
    // tick of the last round.
    let (_, ticks) = shift(3, BitOp::LSHIFT, 2);
    assert_eq!(ticks, 4);
  }
}
