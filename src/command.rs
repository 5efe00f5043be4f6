use crate::env::Environment;
use anyhow::Result;
use std::io::{BufRead, Write};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// What the prompt loop does after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Show the prompt again.
    Continue,
    /// Leave the prompt loop.
    Exit,
    /// A command of the line could not be resolved to a builtin or program.
    Unknown,
}

/// Object-safe trait for any command that runs inside the shell process.
///
/// Implemented by every builtin via a blanket impl.
pub trait ExecutableCommand {
    /// Executes the command.
    ///
    /// `stdin` is where interactive builtins read their answers from, `stdout`
    /// receives everything the command prints, including its error messages.
    fn execute(
        self: Box<Self>,
        stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

/// Factory creating a command from its arguments.
///
/// Factories are registered under [`CommandFactory::name`] and looked up by the
/// first word of a line.
pub trait CommandFactory {
    /// Reserved name the factory answers to.
    fn name(&self) -> &'static str;

    /// Create a command instance for the provided arguments.
    ///
    /// Arguments that don't parse still produce a command, one that reports
    /// the problem when executed.
    fn create(&self, args: &[&str]) -> Box<dyn ExecutableCommand>;
}
