/*!
  Powers of two by square-and-multiply, one round per tick.

  The countdown lives in a real register, and the only way to shrink it is a division followed
  by a floor. Each round reads `e / 2` twice, floored and rounded: the two differ exactly when `e`
  is odd, in which case the current base contributes to the result. The base is then squared and
  the countdown replaced by `floor(e / 2)`. The loop ends on the first round that finds `e <= 0`,
  so an exponent `e` costs `bitlen(e) + 1` ticks, never more than `e + 1`.

  Negative exponents end on the first round and leave the result at 1.
*/

use std::fmt::{Display, Formatter};

use crate::address::Address;
use crate::continuation::{Completion, Continuation, Invocation, InvocationContext, Step};
use crate::machine::Machine;
use crate::operand::{Comparison, Operand};
use crate::registers::{RegisterBank, Rounding};

/// Registers one exponentiation owns for the length of its chain.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ExponentRegisters {
  pub result    : Address,
  pub base      : Address,
  pub countdown : Address,
}

impl ExponentRegisters {
  pub fn allocate(bank: &mut RegisterBank, context: InvocationContext) -> ExponentRegisters {
    let registers = ExponentRegisters {
      result    : bank.alloc_int(1),
      base      : bank.alloc_int(2),
      countdown : bank.alloc_real(0.0),
    };
    // Fresh slots and a fresh context, so the names cannot already be taken.
    let _ = bank.label(registers.result, &format!("{}.pow", context));
    let _ = bank.label(registers.base, &format!("{}.base", context));
    let _ = bank.label(registers.countdown, &format!("{}.e", context));
    registers
  }
}

#[derive(Clone, Debug)]
pub struct Exponentiation {
  registers  : ExponentRegisters,
  completion : Completion,
}

/**
  Starts computing `2^exponent`. The exponent is read now; later changes to an exponent register do
  not affect the chain. With `copy` the answer is delivered in a register of the caller's own,
  otherwise the returned register is the chain's working result register.
*/
pub fn start(machine: &mut Machine, exponent: Operand, copy: bool) -> Invocation {
  let context = machine.new_context();
  let bank = machine.registers_mut();
  let registers = ExponentRegisters::allocate(bank, context);

  bank.set(&registers.result, Operand::Const(1));
  bank.set(&registers.base, Operand::Const(2));
  bank.set(&registers.countdown, exponent);

  let output = match copy {
    true  => bank.alloc_int(0),
    false => registers.result
  };
  let copy_to = if copy { Some(output) } else { None };

  machine.schedule(
    1,
    Continuation::Exponentiation(Exponentiation {
      registers,
      completion: Completion { context, copy_to },
    })
  );

  Invocation { context, output }
}

impl Exponentiation {
  pub fn step(&mut self, machine: &mut Machine) -> Step {
    let ExponentRegisters { result, base, countdown } = self.registers;
    let bank = machine.registers_mut();

    match bank.compare(&countdown, Comparison::GREATER, Operand::Const(0)) {

      true  => {
        let half_floor = bank.scaled(&countdown, 2.0, Rounding::Floor);
        let half_round = bank.scaled(&countdown, 2.0, Rounding::Round);
        if half_floor != half_round {
          bank.multiply(&result, Operand::Register(base));
        }
        bank.multiply(&base, Operand::Register(base));
        bank.divide_floor(&countdown, Operand::Const(2));
        Step::Yield(1)
      }

      false => {
        self.completion.finish(machine, result);
        Step::Done
      }

    }
  }
}

impl Display for Exponentiation {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "pow2 {} [result {}, base {}, e {}]",
      self.completion.context,
      self.registers.result,
      self.registers.base,
      self.registers.countdown
    )
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  fn pow2(exponent: i64) -> (i64, u64) {
    let mut machine = Machine::new();
    let invocation = start(&mut machine, Operand::Const(exponent), true);
    let ticks = machine.run();
    assert!(machine.is_complete(invocation.context));
    (machine.registers().int(&invocation.output), ticks)
  }

  #[test]
  fn zero_exponent_is_one() {
    let (value, ticks) = pow2(0);
    assert_eq!(value, 1);
    // One tick of start-up delay, then a single round that finds the countdown exhausted.
    assert_eq!(ticks, 2);
  }

  #[test]
  fn small_powers() {
    assert_eq!(pow2(1).0, 2);
    assert_eq!(pow2(3).0, 8);
    assert_eq!(pow2(10).0, 1024);
  }

  #[test]
  fn covers_the_full_register_width() {
    for k in 0..=31 {
      assert_eq!(pow2(k).0, 1i64 << k, "2^{}", k);
    }
  }

  #[test]
  fn rounds_stay_within_exponent_plus_one() {
    for k in 1..=31i64 {
      let (_, ticks) = pow2(k);
      let rounds = ticks - 1;
      let bit_length = 64 - k.leading_zeros() as u64;
      assert_eq!(rounds, bit_length + 1);
      assert!(rounds <= k as u64 + 1);
    }
  }

  #[test]
  fn negative_exponent_behaves_as_zero() {
    assert_eq!(pow2(-5).0, 1);
  }

  #[test]
  fn exponent_may_come_from_a_register() {
    let mut machine = Machine::new();
    let e = machine.registers_mut().alloc_int(5);
    let invocation = start(&mut machine, Operand::Register(e), false);
    machine.registers_mut().set(&e, Operand::Const(9));
    assert!(machine.run_until(invocation.context));
    assert_eq!(machine.registers().int(&invocation.output), 32);
  }

  #[test]
  fn concurrent_exponentiations_are_independent() {
    let mut machine = Machine::new();
    let a = start(&mut machine, Operand::Const(4), true);
    let b = start(&mut machine, Operand::Const(7), true);
    machine.run();
    assert_eq!(machine.registers().int(&a.output), 16);
    assert_eq!(machine.registers().int(&b.output), 128);
  }

  #[test]
  fn without_copy_the_working_register_is_returned() {
    let mut machine = Machine::new();
    let invocation = start(&mut machine, Operand::Const(2), false);
    assert_eq!(machine.registers().label_of(&invocation.output).unwrap().to_string(), "ctx0.pow");
    machine.run();
    assert_eq!(machine.registers().int(&invocation.output), 4);
  }
}
