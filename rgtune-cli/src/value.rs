//! Value command - print a constant's current value

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use rgtune_core::{format_value, get_current_value, ConstantSpec};

#[derive(Args)]
pub struct ValueArgs {
    /// Name of the constant
    pub constant: String,

    /// Agent source file holding the constant
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

pub fn run(args: ValueArgs) -> Result<()> {
    let spec = ConstantSpec::new(args.constant, args.file);
    let value = get_current_value(&spec)
        .with_context(|| format!("failed to read {}", spec.artifact.display()))?;
    println!("{}", format_value(value));
    Ok(())
}
