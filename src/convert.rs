//! Bit decomposition: reports each power of two present in a value, highest first.
//!
//! The value is copied into a working register and wrapped into the configured width; the copy is
//! then consumed bit by bit. Each probe goes through conditional dispatch, so the weight is only
//! subtracted and reported when the working register still holds at least that much. With `delay`
//! one tick separates consecutive probes; without it the whole walk happens in one tick.

use std::fmt::{Display, Formatter};

use crate::address::Address;
use crate::config::BitWidth;
use crate::continuation::{Continuation, HandlerId, InvocationContext, Step};
use crate::machine::Machine;
use crate::operand::{Comparison, Operand};

#[derive(Clone, Debug)]
pub struct Decomposition {
  work      : Address,
  handler   : HandlerId,
  /// Probes still to make. The next probe is for bit `remaining - 1`.
  remaining : u32,
  delay     : bool,
  context   : InvocationContext,
}

/// Starts decomposing `value`. The value is read now.
pub fn start(
  machine : &mut Machine,
  width   : BitWidth,
  value   : Operand,
  handler : HandlerId,
  delay   : bool
) -> InvocationContext {
  let context = machine.new_context();
  let bank = machine.registers_mut();
  let work = bank.alloc_copy(value);
  bank.wrap(&work, width.modulus());
  let _ = bank.label(work, &format!("{}.convert", context));

  machine.schedule(
    0,
    Continuation::Decomposition(Decomposition {
      work,
      handler,
      remaining: width.bits(),
      delay,
      context,
    })
  );
  context
}

impl Decomposition {
  pub fn step(&mut self, machine: &mut Machine) -> Step {
    if self.remaining == 0 {
      // Every emit was queued ahead of this step, so nothing can call the handler any more.
      machine.release_handler(self.handler);
      machine.complete(self.context);
      return Step::Done;
    }

    self.remaining -= 1;
    let weight = 1i64 << self.remaining;
    machine.when(
      &self.work,
      Comparison::GREATER_OR_EQ,
      Operand::Const(weight),
      Continuation::Emit {
        work    : self.work,
        weight,
        handler : self.handler,
      }
    );

    // The last emit is queued ahead of the completing step, so it always lands first.
    match self.delay && self.remaining > 0 {
      true  => Step::Yield(1),
      false => Step::Yield(0)
    }
  }
}

impl Display for Decomposition {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "convert {} [{} probes left, work {}]", self.context, self.remaining, self.work)
  }
}
