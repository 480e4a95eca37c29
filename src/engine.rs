/*!
  The public face of the crate: an `Engine` of a fixed bit width over its own `Machine`.

  ```
  use bitwise_vm::{BitOp, Engine};

  let mut engine = Engine::new(4.0).unwrap();
  let and = engine.bitwise(9, BitOp::AND, 5, true, true);
  let shl = engine.bitwise(3, BitOp::LSHIFT, 2, true, true);
  engine.run();
  assert_eq!(engine.value(&and.output), 1);
  assert_eq!(engine.value(&shl.output), 12);
  ```

  Every call allocates the registers its chain needs, so calls may be issued while earlier ones are
  still running. Nothing happens until the machine is ticked.
*/

use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use crate::address::Address;
use crate::alu::{BitSerial, ScratchSet};
use crate::bitop::BitOp;
use crate::config::BitWidth;
use crate::continuation::{Completion, Continuation, Invocation, InvocationContext, Step};
use crate::convert;
use crate::error::ConfigError;
use crate::machine::Machine;
use crate::operand::Operand;
use crate::pow2;
use crate::registers::RegisterBank;
use crate::shift::Shift;

pub struct Engine {
  width   : BitWidth,
  machine : Machine,
}

impl Engine {

  /// Builds an engine from a raw bit width; see `BitWidth::new` for the accepted values.
  pub fn new(bits: f64) -> Result<Engine, ConfigError> {
    Ok(Engine::with_width(BitWidth::new(bits)?))
  }

  pub fn with_width(width: BitWidth) -> Engine {
    Engine {
      width,
      machine: Machine::new(),
    }
  }

  pub fn width(&self) -> BitWidth {
    self.width
  }

  pub fn machine(&self) -> &Machine {
    &self.machine
  }

  pub fn machine_mut(&mut self) -> &mut Machine {
    &mut self.machine
  }

  // region Operations

  /**
    Computes `v1 op v2` into a result register.

    The operands and the mode are loaded now. The chain starts one tick from now with `delay`, or
    later in the current tick without it. With `copy` the answer lands in a register allocated for
    the caller when the chain finishes; otherwise the invocation's working result register is
    returned, which holds partial results while the chain runs.
  */
  pub fn bitwise<A, B>(&mut self, v1: A, op: BitOp, v2: B, copy: bool, delay: bool) -> Invocation
    where A: Into<Operand>,
          B: Into<Operand>
  {
    let context = self.machine.new_context();
    let bank = self.machine.registers_mut();
    let scratch = ScratchSet::allocate(bank, context);

    bank.set(&scratch.v1, v1.into());
    bank.set(&scratch.mode, Operand::Const(op.code() as i64));
    bank.set(&scratch.v2, v2.into());

    let output = match copy {
      true  => {
        let output = bank.alloc_int(0);
        let _ = bank.label(output, &format!("{}.out", context));
        output
      }
      false => scratch.result
    };
    let copy_to = if copy { Some(output) } else { None };

    let dispatch = Dispatch {
      scratch,
      width: self.width,
      completion: Completion { context, copy_to },
    };
    self.machine.schedule(if delay { 1 } else { 0 }, Continuation::Dispatch(dispatch));

    Invocation { context, output }
  }

  /// Computes `2^exponent`. Negative exponents give 1.
  pub fn pow2<E: Into<Operand>>(&mut self, exponent: E, copy: bool) -> Invocation {
    pow2::start(&mut self.machine, exponent.into(), copy)
  }

  /// Calls `handler` with each power of two present in `value`, highest first, starting in the
  /// current tick.
  pub fn convert<V, F>(&mut self, value: V, handler: F, delay: bool) -> InvocationContext
    where V: Into<Operand>,
          F: FnMut(&mut RegisterBank, i64) + 'static
  {
    let handler = self.machine.add_handler(Box::new(handler));
    convert::start(&mut self.machine, self.width, value.into(), handler, delay)
  }

  // endregion

  // region Driving

  /// Ticks until every chain has finished. Returns the ticks elapsed.
  pub fn run(&mut self) -> u64 {
    self.machine.run()
  }

  /// Ticks until `invocation` completes, then reads its answer. `None` if the machine went idle
  /// first, in which case the output register may hold a partial result.
  pub fn resolve(&mut self, invocation: &Invocation) -> Option<i64> {
    match self.machine.run_until(invocation.context) {
      true  => Some(self.value(&invocation.output)),
      false => None
    }
  }

  pub fn is_complete(&self, context: InvocationContext) -> bool {
    self.machine.is_complete(context)
  }

  pub fn value(&self, address: &Address) -> i64 {
    self.machine.registers().int(address)
  }

  // endregion

}

impl Display for Engine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "Width: {}\t{}", self.width, self.machine)
  }
}

/// First continuation of every `bitwise` chain: routes on the mode register to the shift unit or
/// the bit-serial ALU.
#[derive(Clone, Debug)]
pub struct Dispatch {
  scratch    : ScratchSet,
  width      : BitWidth,
  completion : Completion,
}

impl Dispatch {
  pub fn step(&mut self, machine: &mut Machine) -> Step {
    let mode = machine.registers().int(&self.scratch.mode);

    match u8::try_from(mode).ok().and_then(|code| BitOp::try_from(code).ok()) {

      Some(op) if op.is_shift() => {
        let shift = Shift::new(self.scratch, op, self.completion);
        machine.schedule(0, Continuation::Shift(shift));
      }

      Some(_) => {
        let alu = BitSerial::new(machine, self.scratch, self.width, self.completion);
        machine.schedule(0, Continuation::BitSerial(alu));
      }

      None => {
        // No branch matches an unknown mode, so the result stays zero.
        self.scratch.clear(machine.registers_mut());
        self.completion.finish(machine, self.scratch.result);
      }

    }
    Step::Done
  }
}

impl Display for Dispatch {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "bitwise {} [mode {}]", self.completion.context, self.scratch.mode)
  }
}


#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::rc::Rc;

  use proptest::prelude::*;

  use super::*;

  fn evaluate(bits: f64, x: i64, op: BitOp, y: i64) -> i64 {
    let mut engine = Engine::new(bits).unwrap();
    let invocation = engine.bitwise(x, op, y, true, true);
    engine.resolve(&invocation).unwrap()
  }

  fn mask(bits: u32) -> i64 {
    (1i64 << bits) - 1
  }

  #[test]
  fn construction_errors() {
    assert!(matches!(Engine::new(f64::NAN), Err(ConfigError::NotANumber(_))));
    assert_eq!(Engine::new(32.0).err(), Some(ConfigError::TooWide(32)));
    assert_eq!(Engine::new(-4.4).unwrap().width().bits(), 4);
  }

  #[test]
  fn scenarios_at_four_bits() {
    assert_eq!(evaluate(4.0, 9, BitOp::AND, 5), 1);
    assert_eq!(evaluate(4.0, 9, BitOp::OR, 5), 13);
    assert_eq!(evaluate(4.0, 9, BitOp::XOR, 5), 12);
    assert_eq!(evaluate(4.0, 3, BitOp::LSHIFT, 2), 12);
    assert_eq!(evaluate(4.0, 13, BitOp::RSHIFT, 2), 3);

    let mut engine = Engine::new(4.0).unwrap();
    let power = engine.pow2(3, true);
    assert_eq!(engine.resolve(&power), Some(8));

    let weights = Rc::new(RefCell::new(vec![]));
    let sink = weights.clone();
    let context = engine.convert(10, move |_: &mut RegisterBank, w: i64| sink.borrow_mut().push(w), true);
    engine.run();
    assert!(engine.is_complete(context));
    assert_eq!(*weights.borrow(), vec![8, 2]);
  }

  #[test]
  fn not_ignores_the_second_operand() {
    assert_eq!(evaluate(4.0, 9, BitOp::NOT, 0), 6);
    assert_eq!(evaluate(4.0, 9, BitOp::NOT, 7), 6);
  }

  #[test]
  fn delay_controls_the_start_tick() {
    let mut engine = Engine::new(4.0).unwrap();
    engine.bitwise(1, BitOp::OR, 2, true, true);
    assert_eq!(engine.run(), 5);

    let mut engine = Engine::new(4.0).unwrap();
    engine.bitwise(1, BitOp::OR, 2, true, false);
    assert_eq!(engine.run(), 4);
  }

  #[test]
  fn copy_snapshots_into_a_fresh_register() {
    let mut engine = Engine::new(4.0).unwrap();
    let copied = engine.bitwise(6, BitOp::AND, 3, true, false);
    let shared = engine.bitwise(6, BitOp::AND, 3, false, false);
    assert_ne!(copied.output, shared.output);

    let label = engine.machine().registers().label_of(&shared.output).unwrap();
    assert!(label.to_string().ends_with(".result"));

    // The copy only receives the answer when the chain finishes.
    engine.machine_mut().tick();
    assert_eq!(engine.value(&copied.output), 0);
    engine.run();
    assert_eq!(engine.value(&copied.output), 2);
    assert_eq!(engine.value(&shared.output), 2);
  }

  #[test]
  fn overlapping_invocations_do_not_interfere() {
    let mut engine = Engine::new(8.0).unwrap();
    let a = engine.bitwise(200, BitOp::XOR, 55, true, true);
    engine.machine_mut().tick();
    engine.machine_mut().tick();
    let b = engine.bitwise(17, BitOp::AND, 255, true, true);
    let c = engine.bitwise(1, BitOp::LSHIFT, 7, true, false);
    engine.run();
    assert_eq!(engine.value(&a.output), 200 ^ 55);
    assert_eq!(engine.value(&b.output), 17);
    assert_eq!(engine.value(&c.output), 128);
  }

  #[test]
  fn operands_may_be_registers() {
    let mut engine = Engine::new(8.0).unwrap();
    let x = engine.machine_mut().registers_mut().alloc_int(0b1100);
    let y = engine.machine_mut().registers_mut().alloc_int(0b1010);
    let invocation = engine.bitwise(x, BitOp::XOR, y, true, true);
    // Operands are loaded at call time.
    engine.machine_mut().registers_mut().set(&x, Operand::Const(0));
    assert_eq!(engine.resolve(&invocation), Some(0b0110));
    assert_eq!(engine.value(&x), 0);
  }

  #[test]
  fn results_chain_into_later_calls() {
    let mut engine = Engine::new(8.0).unwrap();
    let first = engine.bitwise(0b1111_0000, BitOp::OR, 0b0000_1111, true, true);
    engine.resolve(&first);
    let second = engine.bitwise(first.output, BitOp::RSHIFT, 4, true, true);
    assert_eq!(engine.resolve(&second), Some(0b1111));
  }

  #[test]
  fn zero_width_engine() {
    assert_eq!(evaluate(0.0, 5, BitOp::OR, 3), 0);
    assert_eq!(evaluate(0.0, 5, BitOp::LSHIFT, 1), 10);
  }

  #[test]
  fn unknown_mode_leaves_zero() {
    let mut engine = Engine::new(4.0).unwrap();
    let invocation = engine.bitwise(7, BitOp::OR, 7, false, true);
    let mode = engine.machine().registers().address_of(&format!("{}.mode", invocation.context)).unwrap();
    engine.machine_mut().registers_mut().set(&mode, Operand::Const(42));
    assert_eq!(engine.resolve(&invocation), Some(0));
  }

  #[test]
  fn resolving_an_orphaned_context_gives_nothing() {
    let mut engine = Engine::new(4.0).unwrap();
    let running = engine.bitwise(9, BitOp::AND, 5, true, true);
    let orphan = Invocation {
      context : engine.machine_mut().new_context(),
      output  : running.output,
    };
    assert_eq!(engine.resolve(&orphan), None);
    assert!(engine.machine().is_idle());
    assert_eq!(engine.resolve(&running), Some(1));
  }

  #[test]
  fn convert_handlers_do_not_outlive_their_chains() {
    let mut engine = Engine::new(4.0).unwrap();
    let token = Rc::new(());
    for _ in 0..3 {
      let held = token.clone();
      engine.convert(5, move |_: &mut RegisterBank, _: i64| { let _ = &held; }, false);
    }
    assert_eq!(Rc::strong_count(&token), 4);
    engine.run();
    assert_eq!(Rc::strong_count(&token), 1);
    assert_eq!(engine.machine().live_handlers(), 0);
  }

  fn width_and_operands() -> impl Strategy<Value = (u32, i64, i64)> {
    (1u32..=31).prop_flat_map(|bits| {
      let top = 1i64 << bits;
      (Just(bits), 0..top, 0..top)
    })
  }

  proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_boolean_ops_match_native((bits, x, y) in width_and_operands()) {
      let m = mask(bits);
      let b = bits as f64;
      prop_assert_eq!(evaluate(b, x, BitOp::AND, y), x & y);
      prop_assert_eq!(evaluate(b, x, BitOp::OR, y), x | y);
      prop_assert_eq!(evaluate(b, x, BitOp::XOR, y), x ^ y);
      prop_assert_eq!(evaluate(b, x, BitOp::NAND, y), !(x & y) & m);
      prop_assert_eq!(evaluate(b, x, BitOp::NOR, y), !(x | y) & m);
      prop_assert_eq!(evaluate(b, x, BitOp::XNOR, y), !(x ^ y) & m);
      prop_assert_eq!(evaluate(b, x, BitOp::NOT, y), !x & m);
    }

    #[test]
    fn prop_shifts_match_native((bits, x, _y) in width_and_operands(), k in 0u32..=31) {
      let k = k.min(bits) as i64;
      let b = bits as f64;
      prop_assert_eq!(evaluate(b, x, BitOp::RSHIFT, k), x >> k);
      prop_assert_eq!(evaluate(b, x, BitOp::LSHIFT, k), x << k);
    }

    #[test]
    fn prop_pow2_matches_native(bits in 1u32..=31, k in 0i64..=31) {
      let k = k.min(bits as i64);
      let mut engine = Engine::new(bits as f64).unwrap();
      let power = engine.pow2(k, true);
      prop_assert_eq!(engine.resolve(&power), Some(1i64 << k));
    }

    #[test]
    fn prop_convert_reconstructs((bits, x, _y) in width_and_operands(), delay in any::<bool>()) {
      let mut engine = Engine::new(bits as f64).unwrap();
      let weights = Rc::new(RefCell::new(vec![]));
      let sink = weights.clone();
      engine.convert(x, move |_: &mut RegisterBank, w: i64| sink.borrow_mut().push(w), delay);
      engine.run();
      let weights = weights.borrow();
      prop_assert_eq!(weights.iter().sum::<i64>(), x);
      prop_assert!(weights.len() <= bits as usize);
      prop_assert!(weights.windows(2).all(|pair| pair[0] > pair[1]));
      prop_assert!(weights.iter().all(|w| w.count_ones() == 1));
    }
  }
}
