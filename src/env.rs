use crate::config::Config;
use crate::history::DirectoryHistory;
use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Mutable, user-level view of the shell session handed to every builtin.
///
/// The environment contains:
/// - `vars`: environment variables passed to spawned programs.
/// - `current_dir`: the working directory for command execution.
/// - `should_exit`: set by `exit`; the prompt loop stops once it is true.
/// - `config`: the session's static [`Config`].
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
    /// When set to true, indicates that the prompt loop should exit.
    pub should_exit: bool,
    /// Locations and limits fixed at startup.
    pub config: Config,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new(config: Config) -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
            config,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// The directory history configured for this session.
    pub fn history(&self) -> DirectoryHistory {
        DirectoryHistory::new(
            self.config.history_path.clone(),
            self.config.history_capacity,
        )
    }
}
