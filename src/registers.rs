//! The register bank: every piece of state the machine has lives in one of these slots.
//!
//! Slots are allocated from a monotonic counter and are never reclaimed. The bank is the arena of
//! a single `Machine`, so its lifetime is that of the machine, typically the whole process.

use std::fmt::{Display, Formatter};

use bimap::BiMap;
use prettytable::{format as TableFormat, Table};
use string_cache::DefaultAtom;

use crate::address::Address;
use crate::cell::{quantize, Cell};
use crate::operand::{Comparison, Operand};

/// How a value read by `RegisterBank::scaled` is rounded after division.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Rounding {
  Exact,
  Floor,
  /// Half away from zero.
  Round,
}

impl Rounding {
  fn apply(&self, value: f64) -> f64 {
    match self {
      Rounding::Exact => value,
      Rounding::Floor => value.floor(),
      Rounding::Round => value.round(),
    }
  }
}

pub struct RegisterBank {
  cells  : Vec<Cell>,
  /// Optional names of slots, for tables and traces.
  labels : BiMap<DefaultAtom, Address>,
}

impl RegisterBank {

  pub fn new() -> RegisterBank {
    RegisterBank {
      cells  : vec![],
      labels : BiMap::new(),
    }
  }

  // region Allocation

  pub fn alloc_int(&mut self, init: i64) -> Address {
    let address = Address::Integer(self.cells.len());
    self.cells.push(Cell::Int(init));
    address
  }

  pub fn alloc_real(&mut self, init: f64) -> Address {
    let address = Address::Real(self.cells.len());
    self.cells.push(Cell::Real(quantize(init)));
    address
  }

  /// Allocates an integer register holding a snapshot of `source`.
  pub fn alloc_copy(&mut self, source: Operand) -> Address {
    let value = self.resolve(source).as_i64();
    self.alloc_int(value)
  }

  /// Number of slots ever allocated.
  pub fn len(&self) -> usize {
    self.cells.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  // endregion

  // region Labels

  /// Names a slot. Fails without overwriting if either the name or the slot is already labelled.
  pub fn label(&mut self, address: Address, name: &str) -> Result<(), (DefaultAtom, Address)> {
    self.labels.insert_no_overwrite(DefaultAtom::from(name), address)
  }

  pub fn label_of(&self, address: &Address) -> Option<DefaultAtom> {
    self.labels.get_by_right(address).cloned()
  }

  pub fn address_of(&self, name: &str) -> Option<Address> {
    self.labels.get_by_left(&DefaultAtom::from(name)).cloned()
  }

  // endregion

  // region Reads

  pub fn value(&self, address: &Address) -> Cell {
    self.cells[address.idx()]
  }

  pub fn int(&self, address: &Address) -> i64 {
    self.value(address).as_i64()
  }

  pub fn real(&self, address: &Address) -> f64 {
    self.value(address).as_f64()
  }

  pub fn resolve(&self, operand: Operand) -> Cell {
    match operand {
      Operand::Const(value)      => Cell::Int(value),
      Operand::Register(address) => self.value(&address)
    }
  }

  /// Reads `address / divisor` rounded as requested, without writing anything. This is how a
  /// comparison inspects a derived value of a register.
  pub fn scaled(&self, address: &Address, divisor: f64, rounding: Rounding) -> f64 {
    rounding.apply(self.real(address) / divisor)
  }

  /// Tests `address <comparison> operand` against the current contents.
  pub fn compare(&self, address: &Address, comparison: Comparison, operand: Operand) -> bool {
    comparison.holds(self.real(address), self.resolve(operand).as_f64())
  }

  // endregion

  // region Mutations

  /// Writes `value` into the slot, converting it to the slot's kind.
  fn store(&mut self, address: &Address, value: Cell) {
    self.cells[address.idx()] = match address {
      Address::Integer(_) => Cell::Int(value.as_i64()),
      Address::Real(_)    => Cell::Real(quantize(value.as_f64()))
    };
  }

  fn apply<I, R>(&mut self, address: &Address, operand: Operand, int_op: I, real_op: R)
    where I: Fn(i64, i64) -> i64,
          R: Fn(f64, f64) -> f64
  {
    let rhs = self.resolve(operand);
    let result = match address {
      Address::Integer(_) => Cell::Int(int_op(self.int(address), rhs.as_i64())),
      Address::Real(_)    => Cell::Real(real_op(self.real(address), rhs.as_f64()))
    };
    self.store(address, result);
  }

  pub fn set(&mut self, address: &Address, operand: Operand) {
    let value = self.resolve(operand);
    self.store(address, value);
  }

  pub fn reset(&mut self, address: &Address) {
    self.store(address, Cell::Int(0));
  }

  pub fn add(&mut self, address: &Address, operand: Operand) {
    self.apply(address, operand, i64::wrapping_add, |a, b| a + b);
  }

  pub fn subtract(&mut self, address: &Address, operand: Operand) {
    self.apply(address, operand, i64::wrapping_sub, |a, b| a - b);
  }

  pub fn multiply(&mut self, address: &Address, operand: Operand) {
    self.apply(address, operand, i64::wrapping_mul, |a, b| a * b);
  }

  /// Divides, truncating toward zero in integer registers. Division by zero yields zero.
  pub fn divide(&mut self, address: &Address, operand: Operand) {
    self.apply(
      address,
      operand,
      |a, b| match b {
        0 => 0,
        _ => a.wrapping_div(b)
      },
      |a, b| if b == 0.0 { 0.0 } else { a / b }
    );
  }

  /// Divides and floors in a single mutation. Division by zero yields zero.
  pub fn divide_floor(&mut self, address: &Address, operand: Operand) {
    self.apply(address, operand, floor_div, |a, b| if b == 0.0 { 0.0 } else { (a / b).floor() });
  }

  /// Writes `floor(numerator / denominator)` as a single mutation. Division by zero yields zero.
  pub fn floor_quotient(&mut self, address: &Address, numerator: Operand, denominator: Operand) {
    let value = match (self.resolve(numerator), self.resolve(denominator)) {
      (Cell::Int(a), Cell::Int(b)) => Cell::Int(floor_div(a, b)),
      (a, b) => {
        let b = b.as_f64();
        Cell::Real(if b == 0.0 { 0.0 } else { (a.as_f64() / b).floor() })
      }
    };
    self.store(address, value);
  }

  /// Reduces an integer register into `[0, modulus)`.
  pub fn wrap(&mut self, address: &Address, modulus: i64) {
    address.require_integer();
    let value = self.int(address);
    let wrapped = match modulus {
      m if m > 0 => value.rem_euclid(m),
      _          => value
    };
    self.store(address, Cell::Int(wrapped));
  }

  // endregion

}

impl Default for RegisterBank {
  fn default() -> Self {
    RegisterBank::new()
  }
}

/// Integer division rounding toward negative infinity.
fn floor_div(a: i64, b: i64) -> i64 {
  if b == 0 {
    return 0;
  }
  let quotient = a.wrapping_div(b);
  match a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
    true  => quotient - 1,
    false => quotient
  }
}


lazy_static! {
  pub(crate) static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl RegisterBank {
  pub fn make_register_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Label", ubl->"Contents"]);

    for (i, cell) in self.cells.iter().enumerate() {
      let address = match cell {
        Cell::Int(_)  => Address::Integer(i),
        Cell::Real(_) => Address::Real(i)
      };
      let label = match self.label_of(&address) {
        Some(name) => name.to_string(),
        None       => String::new()
      };
      table.add_row(row![r->format!("{} =", address), label, format!("{}", cell)]);
    }
    table
  }
}

impl Display for RegisterBank {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.make_register_table())
  }
}
