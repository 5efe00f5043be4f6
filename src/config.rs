use std::path::{Path, PathBuf};

/// Name the shell uses when reporting errors, e.g. `-shellfyre: cd: ...`.
pub const SHELL_NAME: &str = "shellfyre";

/// File name of the directory history, created in the starting directory.
pub const HISTORY_FILE_NAME: &str = "history.txt";

/// Number of directories the history keeps.
pub const HISTORY_CAPACITY: usize = 10;

/// Static configuration of a shell session.
///
/// Built once at startup and handed to the interpreter through
/// [`Environment`](crate::env::Environment), so nothing below the prompt loop
/// reads process-wide state to find its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where `cd` records visited directories and `cdh` reads them back.
    pub history_path: PathBuf,
    /// Maximum number of lines kept in the history file.
    pub history_capacity: usize,
    /// The only directory searched for external programs.
    pub bin_dir: PathBuf,
    /// Program (looked up in `bin_dir`) used by `filesearch -o`.
    pub opener: String,
}

impl Config {
    /// Configuration for a shell started in `start_dir`.
    pub fn for_start_dir(start_dir: &Path) -> Self {
        Self {
            history_path: start_dir.join(HISTORY_FILE_NAME),
            history_capacity: HISTORY_CAPACITY,
            bin_dir: PathBuf::from("/usr/bin"),
            opener: "xdg-open".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let start_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::for_start_dir(&start_dir)
    }
}
