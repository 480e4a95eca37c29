/*!
  Continuations are the only unit of execution the machine knows. There is no call stack and
  nothing returns a value: a continuation is stepped, mutates registers, and tells the scheduler
  what to do with it next.

  Every long-running operation is an explicit state machine stored inside its continuation, bound
  to the register addresses it owns. "Returning" to a caller is done by parking the caller's
  continuation under an `InvocationContext` and completing that context when the callee finishes.
*/

use std::fmt::{Display, Formatter};

use crate::address::Address;
use crate::alu::BitSerial;
use crate::convert::Decomposition;
use crate::engine::Dispatch;
use crate::machine::Machine;
use crate::operand::Operand;
use crate::pow2::Exponentiation;
use crate::shift::Shift;

/// Correlates a chain of continuations with whoever is waiting for it to finish.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct InvocationContext(pub(crate) u32);

impl Display for InvocationContext {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "ctx{}", self.0)
  }
}

/// Index of a caller-supplied handler stored in the machine.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct HandlerId(pub(crate) usize);

/// What an operation hands back to its caller: a context to wait on and the register in which the
/// answer will be found once the context completes.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Invocation {
  pub context : InvocationContext,
  pub output  : Address,
}

/// What the scheduler does with a continuation after stepping it.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Step {
  /// Step this continuation again after the given number of ticks. Zero means later in the
  /// current tick.
  Yield(u64),
  /// Step this continuation again once the context completes.
  Park(InvocationContext),
  /// Drop this continuation.
  Done,
}

/**
  The end of an operation's chain: optionally snapshot the answer into the caller's own register,
  then complete the context so that whatever is parked on it resumes.
*/
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Completion {
  pub context : InvocationContext,
  pub copy_to : Option<Address>,
}

impl Completion {
  pub fn finish(&self, machine: &mut Machine, result: Address) {
    if let Some(copy_to) = self.copy_to {
      machine.registers_mut().set(&copy_to, Operand::Register(result));
    }
    machine.complete(self.context);
  }
}

#[derive(Clone, Debug)]
pub enum Continuation {
  /// Top-level `bitwise` entry: routes on the mode register.
  Dispatch(Dispatch),
  /// One bit per tick of a boolean operation.
  BitSerial(BitSerial),
  /// LSHIFT / RSHIFT waiting on a power of two.
  Shift(Shift),
  /// One square-and-multiply round per tick.
  Exponentiation(Exponentiation),
  /// One bit probe of `convert`.
  Decomposition(Decomposition),
  /// Consume `weight` from `work` and report it to a handler. Only ever scheduled through
  /// conditional dispatch, after `work >= weight` was observed.
  Emit {
    work    : Address,
    weight  : i64,
    handler : HandlerId,
  },
}

impl Continuation {
  pub fn step(&mut self, machine: &mut Machine) -> Step {
    match self {
      Continuation::Dispatch(dispatch)       => dispatch.step(machine),
      Continuation::BitSerial(alu)           => alu.step(machine),
      Continuation::Shift(shift)             => shift.step(machine),
      Continuation::Exponentiation(exponent) => exponent.step(machine),
      Continuation::Decomposition(convert)   => convert.step(machine),
      Continuation::Emit { work, weight, handler } => {
        machine.registers_mut().subtract(work, Operand::Const(*weight));
        machine.call_handler(*handler, *weight);
        Step::Done
      }
    }
  }
}

impl Display for Continuation {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Continuation::Dispatch(dispatch)       => write!(f, "{}", dispatch),
      Continuation::BitSerial(alu)           => write!(f, "{}", alu),
      Continuation::Shift(shift)             => write!(f, "{}", shift),
      Continuation::Exponentiation(exponent) => write!(f, "{}", exponent),
      Continuation::Decomposition(convert)   => write!(f, "{}", convert),
      Continuation::Emit { work, weight, .. } => write!(f, "emit {} from {}", weight, work),
    }
  }
}
