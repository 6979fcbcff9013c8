//! `flowctl completion <shell>` - print a shell completion script

use std::io::{self, Write};

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;

pub fn execute(shell: Shell) -> Result<()> {
    let stdout = io::stdout();
    write_completion(shell, &mut stdout.lock())?;
    Ok(())
}

/// Render the completion script for `shell` into `out`
fn write_completion(shell: Shell, out: &mut dyn Write) -> io::Result<()> {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin, out);
    out.flush()
}
