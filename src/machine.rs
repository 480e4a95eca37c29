/*!
  The substrate: a register bank plus a cooperative, single-threaded, tick-quantized scheduler.

  A tick is the indivisible unit of time. Continuations due in the same tick run in the order
  they were scheduled, including ones scheduled with zero delay while the tick is in progress,
  which run after everything already queued for that tick. Nothing is ever preempted; a
  continuation only gives up control by returning a `Step`.
*/

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt::{Display, Formatter};

use crate::address::Address;
use crate::continuation::{Continuation, HandlerId, InvocationContext, Step};
use crate::operand::{Comparison, Operand};
use crate::registers::RegisterBank;

/// A caller-supplied reaction to a value, e.g. one weight produced by `convert`.
pub type Handler = Box<dyn FnMut(&mut RegisterBank, i64)>;

pub struct Machine {
  registers    : RegisterBank,
  /// The current tick.
  now          : u64,
  /// Continuations keyed by the tick they are due, each tick in scheduling order.
  queue        : BTreeMap<u64, VecDeque<Continuation>>,
  next_context : u32,
  /// Callers waiting for a context to complete, in the order they parked.
  parked       : HashMap<InvocationContext, Vec<Continuation>>,
  completed    : HashSet<InvocationContext>,
  /// Released handlers leave an empty slot so that ids stay stable.
  handlers     : Vec<Option<Handler>>,
}

impl Machine {

  pub fn new() -> Machine {
    Machine {
      registers    : RegisterBank::new(),
      now          : 0,
      queue        : BTreeMap::new(),
      next_context : 0,
      parked       : HashMap::new(),
      completed    : HashSet::new(),
      handlers     : vec![],
    }
  }

  pub fn registers(&self) -> &RegisterBank {
    &self.registers
  }

  pub fn registers_mut(&mut self) -> &mut RegisterBank {
    &mut self.registers
  }

  pub fn now(&self) -> u64 {
    self.now
  }

  // region Scheduling

  /// Runs `continuation` after `delay` ticks.
  pub fn schedule(&mut self, delay: u64, continuation: Continuation) {
    self.queue
        .entry(self.now + delay)
        .or_insert_with(VecDeque::new)
        .push_back(continuation);
  }

  /// Schedules `continuation` in the current tick if `address <comparison> operand` holds right
  /// now. Returns whether it was scheduled.
  pub fn when(
    &mut self,
    address      : &Address,
    comparison   : Comparison,
    operand      : Operand,
    continuation : Continuation
  ) -> bool {
    let holds = self.registers.compare(address, comparison, operand);
    if holds {
      self.schedule(0, continuation);
    }
    holds
  }

  /// Two-armed form of `when`.
  pub fn branch(
    &mut self,
    address    : &Address,
    comparison : Comparison,
    operand    : Operand,
    then       : Continuation,
    otherwise  : Option<Continuation>
  ) -> bool {
    let holds = self.when(address, comparison, operand, then);
    if let (false, Some(otherwise)) = (holds, otherwise) {
      self.schedule(0, otherwise);
    }
    holds
  }

  // endregion

  // region Invocation contexts

  pub fn new_context(&mut self) -> InvocationContext {
    let context = InvocationContext(self.next_context);
    self.next_context += 1;
    context
  }

  /// Holds `continuation` until `context` completes. A context that already completed resumes the
  /// continuation immediately. Any number of continuations may wait on one context.
  pub fn park(&mut self, context: InvocationContext, continuation: Continuation) {
    match self.completed.contains(&context) {
      true  => self.schedule(0, continuation),
      false => {
        self.parked
            .entry(context)
            .or_insert_with(Vec::new)
            .push(continuation);
      }
    }
  }

  /// Marks `context` as finished and resumes everything parked on it, in the order it parked.
  pub fn complete(&mut self, context: InvocationContext) {
    #[cfg(feature = "trace_computation")]
    println!("[tick {}] {} complete", self.now, context);

    self.completed.insert(context);
    for continuation in self.parked.remove(&context).unwrap_or_default() {
      self.schedule(0, continuation);
    }
  }

  pub fn is_complete(&self, context: InvocationContext) -> bool {
    self.completed.contains(&context)
  }

  // endregion

  // region Handlers

  pub fn add_handler(&mut self, handler: Handler) -> HandlerId {
    self.handlers.push(Some(handler));
    HandlerId(self.handlers.len() - 1)
  }

  /// Calls the handler. A released handler ignores the value.
  pub fn call_handler(&mut self, id: HandlerId, value: i64) {
    if let Some(handler) = self.handlers[id.0].as_mut() {
      handler(&mut self.registers, value);
    }
  }

  /// Drops the handler and everything it captured. Its id is never reused.
  pub fn release_handler(&mut self, id: HandlerId) {
    self.handlers[id.0] = None;
  }

  /// Number of handlers that have not been released.
  pub fn live_handlers(&self) -> usize {
    self.handlers.iter().filter(|handler| handler.is_some()).count()
  }

  // endregion

  // region Driving

  fn pop_due(&mut self) -> Option<Continuation> {
    let due = self.queue.get_mut(&self.now)?;
    let continuation = due.pop_front();
    if due.is_empty() {
      self.queue.remove(&self.now);
    }
    continuation
  }

  /// Runs everything due in the current tick, then advances the clock. Returns the number of
  /// continuations stepped.
  pub fn tick(&mut self) -> usize {
    let mut stepped = 0;

    while let Some(mut continuation) = self.pop_due() {
      #[cfg(feature = "trace_computation")]
      println!("[tick {}] {}", self.now, continuation);

      match continuation.step(self) {
        Step::Yield(delay)   => self.schedule(delay, continuation),
        Step::Park(context)  => self.park(context, continuation),
        Step::Done           => {}
      }
      stepped += 1;
    }

    #[cfg(feature = "trace_computation")]
    {
      if stepped > 0 {
        println!("{}", self);
      }
    }

    self.now += 1;
    stepped
  }

  /// Nothing is scheduled. Parked continuations can only be woken by scheduled work, so an idle
  /// machine stays idle.
  pub fn is_idle(&self) -> bool {
    self.queue.is_empty()
  }

  /// Ticks until idle. Returns the number of ticks that elapsed.
  pub fn run(&mut self) -> u64 {
    let start = self.now;
    while !self.is_idle() {
      self.tick();
    }
    self.now - start
  }

  /// Ticks until `context` completes or the machine goes idle. Returns whether it completed.
  pub fn run_until(&mut self, context: InvocationContext) -> bool {
    while !self.is_complete(context) && !self.is_idle() {
      self.tick();
    }
    self.is_complete(context)
  }

  // endregion

}

impl Default for Machine {
  fn default() -> Self {
    Machine::new()
  }
}

impl Display for Machine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let queued: usize = self.queue.values().map(VecDeque::len).sum();
    let parked: usize = self.parked.values().map(Vec::len).sum();
    write!(
      f,
      "Tick: {}\tQueued: {}\tParked: {}\n{}",
      self.now,
      queued,
      parked,
      self.registers
    )
  }
}
