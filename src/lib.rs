//! Core of the `shellfyre` interactive shell.
//!
//! A line typed at the prompt is split into whitespace-delimited words and
//! parsed into a [`parser::Pipeline`]. If the first word names a builtin, the
//! builtin runs inside the shell process; otherwise every stage is started as
//! a program from the configured binary directory, connected by pipes and
//! file redirects.
//!
//! The main entry point is [`Interpreter`]. Builtins share the session state
//! through [`env::Environment`], and `cd` keeps a small on-disk log of visited
//! directories ([`history::DirectoryHistory`]) that `cdh` offers to jump back to.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
mod external;
pub mod history;
mod interpreter;
mod lexer;
pub mod parser;

#[cfg(test)]
mod test_support;

pub use command::Status;
pub use config::Config;
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
