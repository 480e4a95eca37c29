//! Error taxonomy. Only construction and script parsing can fail; once an engine exists every
//! chain it starts runs to completion.

use thiserror::Error;

use crate::config::MAX_BITS;

/// Fatal, non-recoverable errors raised while configuring an engine.
#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum ConfigError {
  #[error("expected a number for the bit width, got `{0}`")]
  NotANumber(String),
  #[error("a {0} bit width was requested, but registers are 32-bit signed integers (at most {} bits)", MAX_BITS)]
  TooWide(u64),
}

/// Errors found while reading a call script.
#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum ScriptError {
  #[error("line {line}: cannot parse `{text}`")]
  Syntax { line: usize, text: String },
  #[error("line {line}: `{name}` is not an operation")]
  UnknownOperation { line: usize, name: String },
}
