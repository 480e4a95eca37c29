/*!
  Bitwise operations, powers of two and binary decomposition for a restricted register machine.

  The machine this crate models has no native bitwise instructions. Its registers hold 32-bit
  signed integers or reals quantized to a thousandth, and it offers only whole-register arithmetic,
  conditional dispatch, delayed continuations and named handlers. Everything here is built from
  those primitives: `bitwise` walks the bits of its operands one tick at a time, `pow2` squares and
  multiplies, and `convert` peels off one power of two per probe.

  All work is asynchronous. A call returns an `Invocation` at once; the answer appears in its
  output register when the chain completes, which happens only as the `Machine` is ticked.
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod address;
pub mod alu;
pub mod bitop;
pub mod cell;
pub mod config;
pub mod continuation;
pub mod convert;
pub mod engine;
pub mod error;
pub mod machine;
pub mod operand;
pub mod pow2;
pub mod registers;
pub mod script;
pub mod shift;

pub use crate::address::Address;
pub use crate::bitop::BitOp;
pub use crate::cell::Cell;
pub use crate::config::{BitWidth, DEFAULT_BITS, MAX_BITS};
pub use crate::continuation::{Invocation, InvocationContext};
pub use crate::engine::Engine;
pub use crate::error::{ConfigError, ScriptError};
pub use crate::machine::{Handler, Machine};
pub use crate::operand::{Comparison, Operand};
pub use crate::registers::RegisterBank;
