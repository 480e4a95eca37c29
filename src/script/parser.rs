/*!
  Reads call scripts. One call per line, `#` starts a comment that runs to the end of the line:

  ```text
  bitwise(9, AND, 5)
  bitwise(9, NOT)       # the second operand defaults to 0
  pow2(3)
  convert(-10)
  ```

  Lines are tokenized with `nom`; the operation names are checked against the `strum` derives of
  `BitOp`, so the script accepts exactly the names the enum displays.
*/

use std::str::FromStr;

use nom::{
  branch::alt,
  character::complete::{
    alphanumeric1,
    char as one_char,
    digit1,
    space0
  },
  combinator::{all_consuming, map, map_res, opt, recognize},
  multi::separated_list,
  sequence::{delimited, pair},
  IResult
};

use crate::bitop::BitOp;
use crate::error::ScriptError;
use crate::script::Statement;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Argument<'a> {
  Number(i64),
  Name(&'a str),
}

fn integer(input: &str) -> IResult<&str, i64> {
  map_res(
    recognize(pair(opt(one_char('-')), digit1)),
    |text: &str| text.parse::<i64>()
  )(input)
}

fn argument(input: &str) -> IResult<&str, Argument> {
  delimited(
    space0,
    alt((
      map(integer, Argument::Number),
      map(alphanumeric1, Argument::Name)
    )),
    space0
  )(input)
}

/// `name(arg, arg, ...)` with optional surrounding space, and nothing else on the line.
fn call(input: &str) -> IResult<&str, (&str, Vec<Argument>)> {
  all_consuming(
    delimited(
      space0,
      pair(
        alphanumeric1,
        delimited(
          pair(space0, one_char('(')),
          separated_list(one_char(','), argument),
          one_char(')')
        )
      ),
      space0
    )
  )(input)
}

fn statement(line: usize, text: &str, name: &str, args: &[Argument]) -> Result<Statement, ScriptError> {
  let operation = |op: &str| {
    BitOp::from_str(op).map_err(|_| ScriptError::UnknownOperation { line, name: op.to_string() })
  };

  match (name, args) {

    ("bitwise", [Argument::Number(v1), Argument::Name(op)]) => {
      Ok(Statement::Bitwise { v1: *v1, op: operation(*op)?, v2: 0 })
    }

    ("bitwise", [Argument::Number(v1), Argument::Name(op), Argument::Number(v2)]) => {
      Ok(Statement::Bitwise { v1: *v1, op: operation(*op)?, v2: *v2 })
    }

    ("pow2", [Argument::Number(exponent)]) => Ok(Statement::Pow2 { exponent: *exponent }),

    ("convert", [Argument::Number(value)]) => Ok(Statement::Convert { value: *value }),

    ("bitwise", _) | ("pow2", _) | ("convert", _) => {
      Err(ScriptError::Syntax { line, text: text.to_string() })
    }

    _ => Err(ScriptError::UnknownOperation { line, name: name.to_string() })

  }
}

/// Parses a whole script. Line numbers in errors count from 1.
pub fn parse_script(text: &str) -> Result<Vec<Statement>, ScriptError> {
  let mut statements = vec![];

  for (index, raw) in text.lines().enumerate() {
    let line = index + 1;
    let code = match raw.find('#') {
      Some(start) => &raw[..start],
      None        => raw
    };
    if code.trim().is_empty() {
      continue;
    }

    let (_, (name, args)) = call(code).map_err(
      |_| ScriptError::Syntax { line, text: code.trim().to_string() }
    )?;
    statements.push(statement(line, code.trim(), name, &args)?);
  }

  Ok(statements)
}
