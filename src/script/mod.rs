//! Call scripts: a textual list of engine calls, and a runner that issues them on an `Engine`.

mod parser;

use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::bitop::BitOp;
use crate::continuation::Invocation;
use crate::engine::Engine;
use crate::registers::RegisterBank;

pub use parser::parse_script;

/// Run by the binary when no script is given.
pub const DEMO_SCRIPT: &str = "\
# Truth-table operations walk the bits of the configured width, one per tick.
bitwise(9, AND, 5)
bitwise(9, OR, 5)
bitwise(9, XOR, 5)
bitwise(9, NAND, 5)
bitwise(9, NOT)

# Shifts wait on an exponentiation, then apply a single multiply or divide.
bitwise(3, LSHIFT, 2)
bitwise(13, RSHIFT, 2)

pow2(3)
pow2(10)
convert(10)
";

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Statement {
  Bitwise {
    v1 : i64,
    op : BitOp,
    v2 : i64,
  },
  Pow2 {
    exponent : i64,
  },
  Convert {
    value : i64,
  },
}

impl Display for Statement {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Statement::Bitwise { v1, op, .. } if op.is_unary() => write!(f, "bitwise({}, {})", v1, op),
      Statement::Bitwise { v1, op, v2 }                  => write!(f, "bitwise({}, {}, {})", v1, op, v2),
      Statement::Pow2 { exponent }                       => write!(f, "pow2({})", exponent),
      Statement::Convert { value }                       => write!(f, "convert({})", value),
    }
  }
}

/// What a statement produced once the machine went idle.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Outcome {
  Value(i64),
  /// The powers of two reported by `convert`, in the order the handler saw them.
  Weights(Vec<i64>),
}

impl Display for Outcome {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Outcome::Value(value)     => write!(f, "{}", value),
      Outcome::Weights(weights) => {
        let terms = weights.iter().map(i64::to_string).collect::<Vec<String>>();
        write!(f, "[{}]", terms.join(", "))
      }
    }
  }
}

/// Every statement of a script with its outcome, plus the ticks the whole run took.
#[derive(Clone, Debug)]
pub struct Report {
  pub outcomes : Vec<(Statement, Outcome)>,
  pub ticks    : u64,
}

impl Display for Report {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    for (statement, outcome) in self.outcomes.iter() {
      writeln!(f, "{} = {}", statement, outcome)?;
    }
    write!(f, "Finished in {} ticks.", self.ticks)
  }
}

enum Pending {
  Register(Invocation),
  Weights(Rc<RefCell<Vec<i64>>>),
}

/**
  Issues every statement in the current tick, in order, then runs the machine until it is idle.
  Each statement gets its own invocation, so their chains interleave freely. Results are copied
  out of the working registers on completion.
*/
pub fn run(engine: &mut Engine, statements: &[Statement], delay: bool) -> Report {
  let pending: Vec<Pending> =
    statements.iter()
              .map(|statement| issue(engine, statement, delay))
              .collect();

  let ticks = engine.run();

  let outcomes = statements.iter()
    .zip(pending.into_iter())
    .map(|(statement, pending)| {
      let outcome = match pending {
        Pending::Register(invocation) => Outcome::Value(engine.value(&invocation.output)),
        Pending::Weights(weights)     => Outcome::Weights(weights.borrow().clone()),
      };
      (*statement, outcome)
    })
    .collect();

  Report { outcomes, ticks }
}

fn issue(engine: &mut Engine, statement: &Statement, delay: bool) -> Pending {
  match *statement {

    Statement::Bitwise { v1, op, v2 } => Pending::Register(engine.bitwise(v1, op, v2, true, delay)),

    Statement::Pow2 { exponent } => Pending::Register(engine.pow2(exponent, true)),

    Statement::Convert { value } => {
      let weights = Rc::new(RefCell::new(vec![]));
      let sink = weights.clone();
      engine.convert(
        value,
        move |_: &mut RegisterBank, weight: i64| sink.borrow_mut().push(weight),
        delay
      );
      Pending::Weights(weights)
    }

  }
}


#[cfg(test)]
mod tests {
  use super::*;

  fn run_text(bits: f64, text: &str, delay: bool) -> Report {
    let statements = parse_script(text).unwrap();
    let mut engine = Engine::new(bits).unwrap();
    run(&mut engine, &statements, delay)
  }

  fn values(report: &Report) -> Vec<Outcome> {
    report.outcomes.iter().map(|(_, outcome)| outcome.clone()).collect()
  }

  #[test]
  fn demo_script_at_four_bits() {
    let report = run_text(4.0, DEMO_SCRIPT, true);
    assert_eq!(
      values(&report),
      vec![
        Outcome::Value(1),
        Outcome::Value(13),
        Outcome::Value(12),
        Outcome::Value(14),
        Outcome::Value(6),
        Outcome::Value(12),
        Outcome::Value(3),
        Outcome::Value(8),
        Outcome::Value(1024),
        Outcome::Weights(vec![8, 2]),
      ]
    );
  }

  #[test]
  fn delay_does_not_change_answers() {
    let delayed = run_text(8.0, DEMO_SCRIPT, true);
    let eager = run_text(8.0, DEMO_SCRIPT, false);
    assert_eq!(values(&delayed), values(&eager));
    assert!(eager.ticks < delayed.ticks);
  }

  #[test]
  fn statements_display_as_written() {
    let text = "bitwise(9, AND, 5)\nbitwise(9, NOT)\npow2(3)\nconvert(10)";
    let shown = parse_script(text)
      .unwrap()
      .iter()
      .map(Statement::to_string)
      .collect::<Vec<String>>()
      .join("\n");
    assert_eq!(shown, text);
  }

  #[test]
  fn report_lists_each_outcome() {
    let report = run_text(4.0, "bitwise(9, AND, 5)\nconvert(0)", false);
    let shown = report.to_string();
    assert!(shown.starts_with("bitwise(9, AND, 5) = 1\nconvert(0) = []\n"));
    assert!(shown.ends_with(&format!("Finished in {} ticks.", report.ticks)));
  }
}
