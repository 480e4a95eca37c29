//! `bitwise-vm` runs a call script on a fresh engine and prints what every call produced.
//!
//! **Usage:**
//! ```text
//! bitwise-vm [--bits <N>] [--no-delay] [--table] [SCRIPT]
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use bitwise_vm::script::{self, DEMO_SCRIPT};
use bitwise_vm::{BitWidth, Engine};

/// Run bitwise, pow2 and convert calls on a tick-scheduled register machine.
#[derive(Parser)]
#[command(
  name = "bitwise-vm",
  version,
  about = "Run bitwise, pow2 and convert calls on a tick-scheduled register machine"
)]
struct Args {
  /// Number of bits the bit-serial operations walk, at most 31.
  #[arg(long, default_value = "31")]
  bits: BitWidth,

  /// Start every chain in the tick it is issued instead of one tick later.
  #[arg(long)]
  no_delay: bool,

  /// Print the register bank once the machine is idle.
  #[arg(long)]
  table: bool,

  /// Script to run, one call per line. Runs a built-in demo when omitted.
  script: Option<PathBuf>,
}

fn main() -> Result<()> {
  let args = Args::parse();

  #[cfg(feature = "trace_computation")]
  println!("Computation Tracing ENABLED");

  let text = match &args.script {
    Some(path) => {
      fs::read_to_string(path).with_context(|| format!("cannot read script {}", path.display()))?
    }
    None => DEMO_SCRIPT.to_string()
  };
  let statements = script::parse_script(&text)?;

  let mut engine = Engine::with_width(args.bits);
  println!("Running {} calls at {}.", statements.len(), engine.width());

  let report = script::run(&mut engine, &statements, !args.no_delay);
  println!("{}", report);

  if args.table {
    println!("{}", engine.machine().registers());
  }
  Ok(())
}
