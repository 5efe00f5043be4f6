use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::config::SHELL_NAME;
use crate::env::Environment;
use crate::external;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, Write};
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Reserved name of the command, e.g. "cd" or "cdh".
    fn name() -> &'static str;

    /// Executes the command using provided IO streams and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        match <T as BuiltinCommand>::execute(*self, stdin, stdout, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stdout, "-{}: {}: {:#}", SHELL_NAME, T::name(), e)?;
                Ok(1)
            }
        }
    }
}

/// Stand-in for a builtin whose arguments didn't parse, or that was asked for `--help`.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        _stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.output.trim_end())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

/// Factory allows creating instances of a builtin from its arguments.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn name(&self) -> &'static str {
        T::name()
    }

    fn create(&self, args: &[&str]) -> Box<dyn ExecutableCommand> {
        match T::from_args(&[T::name()], args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        }
    }
}

/// Lookup table from reserved name to the factory of its builtin.
pub struct Builtins {
    table: HashMap<&'static str, Box<dyn CommandFactory>>,
}

impl Builtins {
    /// Build a table from a custom set of factories.
    pub fn new(factories: Vec<Box<dyn CommandFactory>>) -> Self {
        let table = factories
            .into_iter()
            .map(|factory| (factory.name(), factory))
            .collect();
        Self { table }
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn CommandFactory> {
        self.table.get(name).map(|factory| factory.as_ref())
    }
}

impl Default for Builtins {
    /// Every builtin of the shell.
    fn default() -> Self {
        Self::new(vec![
            Box::new(Factory::<Empty>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Cdh>::default()),
            Box::new(Factory::<FileSearch>::default()),
            Box::new(Factory::<FileProperties>::default()),
            Box::new(Factory::<Manual>::default()),
            Box::new(Factory::<BasicCalculator>::default()),
        ])
    }
}

/// Read one answer line, without its line terminator.
fn read_answer(stdin: &mut dyn BufRead) -> Result<String> {
    let mut line = String::new();
    stdin.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Change both the process and the session working directory.
fn change_dir(env: &mut Environment, target: &Path) -> Result<PathBuf> {
    let new_dir = env.current_dir.join(target);
    let canonical =
        fs::canonicalize(&new_dir).with_context(|| format!("{}", target.display()))?;
    std::env::set_current_dir(&canonical)
        .with_context(|| format!("{}", target.display()))?;
    env.current_dir = canonical.clone();
    Ok(canonical)
}

#[derive(FromArgs)]
/// Blank line; does nothing.
pub struct Empty {}

impl BuiltinCommand for Empty {
    fn name() -> &'static str {
        ""
    }

    fn execute(
        self,
        _stdin: &mut dyn BufRead,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(
        self,
        _stdin: &mut dyn BufRead,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory and remember it for cdh.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        _stdin: &mut dyn BufRead,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match env.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => return Err(anyhow::anyhow!("no target and HOME not set")),
            },
        };

        let new_dir = change_dir(env, &target)?;
        if let Err(e) = env.history().record(&new_dir) {
            tracing::warn!("directory history not updated: {:#}", e);
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Jump back to one of the last visited directories.
pub struct Cdh {}

impl Cdh {
    /// Index into the history (oldest first) chosen by a letter or a number.
    fn selection(answer: &str, count: usize) -> Option<usize> {
        let answer = answer.trim();
        let mut chars = answer.chars();
        if let (Some(letter @ 'a'..='z'), None) = (chars.next(), chars.next()) {
            let index = letter as usize - 'a' as usize;
            return (index < count).then_some(index);
        }
        match answer.parse::<usize>() {
            Ok(number) if (1..=count).contains(&number) => Some(number - 1),
            _ => None,
        }
    }
}

impl BuiltinCommand for Cdh {
    fn name() -> &'static str {
        "cdh"
    }

    fn execute(
        self,
        stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let mut entries = env.history().load()?;
        // the file may hold more lines than the history keeps
        let keep_from = entries.len().saturating_sub(env.config.history_capacity);
        entries.drain(..keep_from);
        if entries.is_empty() {
            writeln!(stdout, "-{}: cdh: no directory history", SHELL_NAME)?;
            return Ok(1);
        }

        for (index, dir) in entries.iter().enumerate().rev() {
            let letter = (b'a'..=b'z').nth(index).map(char::from).unwrap_or('?');
            writeln!(stdout, "{}  {})  {}", letter, index + 1, dir)?;
        }
        write!(stdout, "Select directory by letter or number: ")?;
        stdout.flush()?;

        let answer = read_answer(stdin)?;
        match Cdh::selection(&answer, entries.len()) {
            Some(index) => {
                change_dir(env, Path::new(&entries[index]))?;
            }
            None => tracing::debug!(answer = %answer, "no directory selected"),
        }
        Ok(0)
    }
}

/// What `filesearch` does with every match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMode {
    /// Descend into subdirectories and look at the parent directory too.
    pub recursive: bool,
    /// Print the relative path of each match.
    pub print: bool,
    /// Hand each match to the opener.
    pub open: bool,
}

/// Find files whose name contains a pattern.
pub struct FileSearch {
    pub pattern: String,
    pub mode: SearchMode,
}

impl FromArgs for FileSearch {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        let invalid = |output: &str| EarlyExit {
            output: output.to_string(),
            status: Err(()),
        };
        let (flags, pattern) = match args.split_last() {
            Some((pattern, flags)) if flags.len() <= 2 => (flags, pattern.to_string()),
            _ => return Err(invalid("Please enter valid input.")),
        };
        let mode = match flags {
            [] => SearchMode {
                recursive: false,
                print: true,
                open: false,
            },
            ["-r"] => SearchMode {
                recursive: true,
                print: true,
                open: false,
            },
            ["-o"] => SearchMode {
                recursive: true,
                print: false,
                open: true,
            },
            ["-r", "-o"] | ["-o", "-r"] => SearchMode {
                recursive: true,
                print: true,
                open: true,
            },
            _ => return Err(invalid("Command not found.")),
        };
        Ok(FileSearch { pattern, mode })
    }
}

impl FileSearch {
    /// Search below `root` and report every match, as a path relative to
    /// `root`, to `stdout` and/or `open` according to the mode.
    pub fn run(
        &self,
        root: &Path,
        stdout: &mut dyn Write,
        open: &mut dyn FnMut(&Path) -> Result<()>,
    ) -> Result<()> {
        let mut visit = |found: &Path| -> Result<()> {
            if self.mode.print {
                writeln!(stdout, "  {}", found.display())?;
            }
            if self.mode.open {
                open(found)?;
            }
            Ok(())
        };

        self.scan(root, Path::new("."), self.mode.recursive, &mut visit)?;
        if self.mode.recursive {
            // the `..` entry leads one level up, without descending further
            if let Err(e) = self.scan(&root.join(".."), Path::new(".."), false, &mut visit) {
                tracing::debug!("parent directory skipped: {:#}", e);
            }
        }
        Ok(())
    }

    fn scan(
        &self,
        dir: &Path,
        shown: &Path,
        descend: bool,
        visit: &mut dyn FnMut(&Path) -> Result<()>,
    ) -> Result<()> {
        let mut entries: Vec<fs::DirEntry> = fs::read_dir(dir)
            .with_context(|| format!("{}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .collect();
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let name = entry.file_name();
            let shown_path = shown.join(&name);
            if name.to_string_lossy().contains(self.pattern.as_str()) {
                visit(&shown_path)?;
            }
            // symlinked directories are not followed
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if descend && is_dir {
                if let Err(e) = self.scan(&entry.path(), &shown_path, true, visit) {
                    tracing::debug!("{} skipped: {:#}", shown_path.display(), e);
                }
            }
        }
        Ok(())
    }
}

impl BuiltinCommand for FileSearch {
    fn name() -> &'static str {
        "filesearch"
    }

    fn execute(
        self,
        _stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let env: &Environment = env;
        self.run(&env.current_dir, stdout, &mut |found| {
            external::open_file(env, found)
        })?;
        Ok(0)
    }
}

/// `D-M-YYYY, time: H:M:S` in UTC, without zero padding.
fn utc_stamp(secs: i64) -> String {
    match DateTime::<Utc>::from_timestamp(secs, 0) {
        Some(time) => time.format("%-d-%-m-%Y, time: %-H:%-M:%-S").to_string(),
        None => format!("{} seconds since epoch", secs),
    }
}

#[derive(FromArgs)]
/// Ask for a file name and print its permissions, size and timestamps.
pub struct FileProperties {}

impl FileProperties {
    fn describe(path: &Path, stdout: &mut dyn Write) -> Result<bool> {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::debug!(path = %path.display(), "stat failed: {}", e);
                return Ok(false);
            }
        };

        let mode = meta.permissions().mode();
        let flags: Vec<&str> = [(0o400, "read"), (0o200, "write"), (0o100, "execute")]
            .into_iter()
            .filter(|(bit, _)| mode & bit != 0)
            .map(|(_, label)| label)
            .collect();
        let flags = if flags.is_empty() {
            "none".to_string()
        } else {
            flags.join(" ")
        };

        writeln!(stdout, "File access permission: {}", flags)?;
        writeln!(stdout, "File size: {}", meta.len())?;
        writeln!(stdout, "Created date: {}", utc_stamp(meta.ctime()))?;
        writeln!(stdout, "Modified date: {}", utc_stamp(meta.mtime()))?;
        Ok(true)
    }
}

impl BuiltinCommand for FileProperties {
    fn name() -> &'static str {
        "fileproperties"
    }

    fn execute(
        self,
        stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        write!(stdout, "Enter file name: ")?;
        stdout.flush()?;
        let name = read_answer(stdin)?;

        if !name.is_empty() && Self::describe(&env.current_dir.join(&name), stdout)? {
            Ok(0)
        } else {
            writeln!(stdout, "File can not find.")?;
            Ok(1)
        }
    }
}

#[derive(FromArgs)]
/// Print the working directory (pwd) or list it (ls) without running a program.
pub struct Manual {
    #[argh(positional)]
    /// either pwd or ls.
    pub topic: String,
}

impl BuiltinCommand for Manual {
    fn name() -> &'static str {
        "manual"
    }

    fn execute(
        self,
        _stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        match self.topic.as_str() {
            "pwd" => writeln!(stdout, "{}", env.current_dir.to_string_lossy())?,
            "ls" => {
                let mut names: Vec<String> = fs::read_dir(&env.current_dir)?
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .filter(|name| name != "." && name != "..")
                    .collect();
                names.sort();
                for name in names {
                    write!(stdout, "  {}", name)?;
                }
                writeln!(stdout)?;
            }
            _ => {
                writeln!(stdout, "usage: manual <pwd|ls>")?;
                return Ok(1);
            }
        }
        Ok(0)
    }
}

/// Four-function calculator: `basiccalculator <number1> <operator> <number2>`.
pub struct BasicCalculator {
    pub lhs: f64,
    pub op: String,
    pub rhs: f64,
}

const CALCULATOR_USAGE: &str =
    "usage: basiccalculator <number1> <operator> <number2>\noperators: +, -, *, /";

impl FromArgs for BasicCalculator {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        let invalid = |output: String| EarlyExit {
            output,
            status: Err(()),
        };
        let [lhs, op, rhs] = args else {
            return Err(invalid(CALCULATOR_USAGE.to_string()));
        };
        let number = |text: &str| {
            text.parse::<f64>()
                .map_err(|_| invalid(format!("basiccalculator: not a number: {}", text)))
        };
        Ok(BasicCalculator {
            lhs: number(*lhs)?,
            op: op.to_string(),
            rhs: number(*rhs)?,
        })
    }
}

impl BasicCalculator {
    /// Result of the operation, or the message printed instead.
    fn evaluate(&self) -> Result<f64, &'static str> {
        match self.op.as_str() {
            "+" => Ok(self.lhs + self.rhs),
            "-" => Ok(self.lhs - self.rhs),
            "*" => Ok(self.lhs * self.rhs),
            "/" if self.rhs == 0.0 => Err("Error! division by zero"),
            "/" => Ok(self.lhs / self.rhs),
            _ => Err("Error! operator is not correct"),
        }
    }
}

impl BuiltinCommand for BasicCalculator {
    fn name() -> &'static str {
        "basiccalculator"
    }

    fn execute(
        self,
        _stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        match self.evaluate() {
            Ok(value) => {
                writeln!(
                    stdout,
                    "{:.1} {} {:.1} = {:.1}",
                    self.lhs, self.op, self.rhs, value
                )?;
                Ok(0)
            }
            Err(message) => {
                writeln!(stdout, "{}", message)?;
                Ok(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CwdGuard, env_in, lock_current_dir};
    use std::io::Cursor;

    fn run_builtin(line: &[&str], input: &str, env: &mut Environment) -> (ExitCode, String) {
        let builtins = Builtins::default();
        let factory = builtins.lookup(line[0]).expect("builtin registered");
        let mut out = Vec::new();
        let code = factory
            .create(&line[1..])
            .execute(&mut Cursor::new(input.as_bytes().to_vec()), &mut out, env)
            .unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    fn history_lines(env: &Environment) -> Vec<String> {
        env.history().load().unwrap()
    }

    #[test]
    fn test_every_reserved_name_is_registered() {
        let builtins = Builtins::default();
        for name in [
            "",
            "exit",
            "cd",
            "cdh",
            "filesearch",
            "fileproperties",
            "manual",
            "basiccalculator",
        ] {
            assert!(builtins.lookup(name).is_some(), "{:?} missing", name);
        }
        assert!(builtins.lookup("ls").is_none());
        assert!(builtins.lookup("pwd").is_none());
    }

    #[test]
    fn test_empty_and_exit() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = env_in(tmp.path(), tmp.path());

        let (code, out) = run_builtin(&[""], "", &mut env);
        assert_eq!((code, out.as_str()), (0, ""));
        assert!(!env.should_exit);

        let (code, _) = run_builtin(&["exit"], "", &mut env);
        assert_eq!(code, 0);
        assert!(env.should_exit);
    }

    #[test]
    fn test_cd_changes_dir_and_records_it() {
        let _lock = lock_current_dir();
        let _cwd = CwdGuard::new();
        let tmp = tempfile::tempdir().unwrap();
        let start = fs::canonicalize(tmp.path()).unwrap();
        fs::create_dir(start.join("sub")).unwrap();
        let mut env = env_in(&start, &start);

        let res = Cd {
            target: Some("sub".to_string()),
        }
        .execute(&mut Cursor::new(Vec::<u8>::new()), &mut Vec::<u8>::new(), &mut env);

        assert_eq!(res.unwrap(), 0);
        assert_eq!(env.current_dir, start.join("sub"));
        assert_eq!(
            fs::canonicalize(std::env::current_dir().unwrap()).unwrap(),
            start.join("sub")
        );
        assert_eq!(
            history_lines(&env),
            vec![start.join("sub").to_string_lossy().to_string()]
        );
    }

    #[test]
    fn test_cd_to_home_when_none() {
        let _lock = lock_current_dir();
        let _cwd = CwdGuard::new();
        let tmp = tempfile::tempdir().unwrap();
        let home = fs::canonicalize(tmp.path()).unwrap();
        let mut env = env_in(&home, &home);
        env.current_dir = PathBuf::from("/");
        env.set_var("HOME", home.to_string_lossy().to_string());

        let res = Cd { target: None }.execute(
            &mut Cursor::new(Vec::<u8>::new()),
            &mut Vec::<u8>::new(),
            &mut env,
        );

        assert_eq!(res.unwrap(), 0);
        assert_eq!(env.current_dir, home);
    }

    #[test]
    fn test_cd_nonexistent_path_changes_nothing() {
        let _lock = lock_current_dir();
        let _cwd = CwdGuard::new();
        let tmp = tempfile::tempdir().unwrap();
        let start = fs::canonicalize(tmp.path()).unwrap();
        let mut env = env_in(&start, &start);
        let cwd_before = std::env::current_dir().unwrap();

        let (code, out) = run_builtin(&["cd", "does-not-exist"], "", &mut env);

        assert_eq!(code, 1);
        assert!(
            out.starts_with("-shellfyre: cd: does-not-exist: "),
            "got {:?}",
            out
        );
        assert!(out.contains("No such file or directory"));
        assert_eq!(env.current_dir, start);
        assert_eq!(std::env::current_dir().unwrap(), cwd_before);
        assert!(!env.config.history_path.exists());
    }

    #[test]
    fn test_fifteen_cds_keep_the_last_ten() {
        let _lock = lock_current_dir();
        let _cwd = CwdGuard::new();
        let tmp = tempfile::tempdir().unwrap();
        let start = fs::canonicalize(tmp.path()).unwrap();
        let mut env = env_in(&start, &start);

        let dirs: Vec<PathBuf> = (0..15).map(|i| start.join(format!("d{:02}", i))).collect();
        for dir in &dirs {
            fs::create_dir(dir).unwrap();
            let (code, _) = run_builtin(&["cd", dir.to_str().unwrap()], "", &mut env);
            assert_eq!(code, 0);
        }

        let expected: Vec<String> = dirs[5..]
            .iter()
            .map(|d| d.to_string_lossy().to_string())
            .collect();
        assert_eq!(history_lines(&env), expected);
    }

    fn seed_history(env: &Environment, dirs: &[&Path]) {
        for dir in dirs {
            env.history().record(dir).unwrap();
        }
    }

    #[test]
    fn test_cdh_lists_newest_first_with_highest_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = env_in(tmp.path(), tmp.path());
        seed_history(&env, &[Path::new("/a"), Path::new("/b"), Path::new("/c")]);

        let (code, out) = run_builtin(&["cdh"], "\n", &mut env);

        assert_eq!(code, 0);
        assert_eq!(
            out,
            "c  3)  /c\nb  2)  /b\na  1)  /a\nSelect directory by letter or number: "
        );
    }

    #[test]
    fn test_cdh_selects_by_letter_and_number() {
        let _lock = lock_current_dir();
        let _cwd = CwdGuard::new();
        let tmp = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(tmp.path()).unwrap();
        let (a, b, c) = (base.join("a"), base.join("b"), base.join("c"));
        for dir in [&a, &b, &c] {
            fs::create_dir(dir).unwrap();
        }
        let mut env = env_in(&base, &base);
        seed_history(&env, &[a.as_path(), b.as_path(), c.as_path()]);

        run_builtin(&["cdh"], "c\n", &mut env);
        assert_eq!(env.current_dir, c);

        run_builtin(&["cdh"], "1\n", &mut env);
        assert_eq!(env.current_dir, a);

        run_builtin(&["cdh"], "3\n", &mut env);
        assert_eq!(env.current_dir, c);

        // selecting doesn't grow the history
        assert_eq!(history_lines(&env).len(), 3);
    }

    #[test]
    fn test_cdh_out_of_range_does_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = env_in(tmp.path(), tmp.path());
        seed_history(&env, &[Path::new("/a"), Path::new("/b"), Path::new("/c")]);

        for answer in ["d\n", "4\n", "0\n", "zz\n", "\n", ""] {
            let (code, _) = run_builtin(&["cdh"], answer, &mut env);
            assert_eq!(code, 0);
            assert_eq!(env.current_dir, tmp.path());
        }
    }

    #[test]
    fn test_cdh_without_history() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = env_in(tmp.path(), tmp.path());

        let (code, out) = run_builtin(&["cdh"], "a\n", &mut env);

        assert_eq!(code, 1);
        assert_eq!(out, "-shellfyre: cdh: no directory history\n");
    }

    #[test]
    fn test_cdh_lists_only_the_last_ten() {
        let _lock = lock_current_dir();
        let _cwd = CwdGuard::new();
        let tmp = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(tmp.path()).unwrap();
        let dirs: Vec<PathBuf> = (0..12).map(|i| base.join(format!("d{}", i))).collect();
        let mut contents = String::new();
        for dir in &dirs {
            fs::create_dir(dir).unwrap();
            contents.push_str(&format!("{}\n", dir.display()));
        }
        let mut env = env_in(&base, &base);
        fs::write(&env.config.history_path, contents).unwrap();

        let (code, out) = run_builtin(&["cdh"], "a\n", &mut env);

        assert_eq!(code, 0);
        let listed: Vec<&str> = out.lines().filter(|l| l.contains(")  ")).collect();
        assert_eq!(listed.len(), 10);
        assert_eq!(listed[0], format!("j  10)  {}", dirs[11].display()));
        assert_eq!(listed[9], format!("a  1)  {}", dirs[2].display()));
        assert_eq!(env.current_dir, dirs[2]);
    }

    #[test]
    fn test_cdh_selection_keys() {
        assert_eq!(Cdh::selection("a", 3), Some(0));
        assert_eq!(Cdh::selection("c", 3), Some(2));
        assert_eq!(Cdh::selection(" 2 ", 3), Some(1));
        assert_eq!(Cdh::selection("d", 3), None);
        assert_eq!(Cdh::selection("10", 3), None);
        assert_eq!(Cdh::selection("A", 3), None);
    }

    /// base/
    ///   sibling.log
    ///   work/          <- search root
    ///     notes.log
    ///     readme.md
    ///     deep/
    ///       trace.log
    fn search_tree() -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let work = tmp.path().join("work");
        fs::create_dir_all(work.join("deep")).unwrap();
        fs::write(tmp.path().join("sibling.log"), "").unwrap();
        fs::write(work.join("notes.log"), "").unwrap();
        fs::write(work.join("readme.md"), "").unwrap();
        fs::write(work.join("deep").join("trace.log"), "").unwrap();
        (tmp, work)
    }

    fn search(args: &[&str], root: &Path) -> (String, Vec<PathBuf>) {
        let search = match FileSearch::from_args(&["filesearch"], args) {
            Ok(search) => search,
            Err(_) => panic!("arguments rejected: {:?}", args),
        };
        let mut out = Vec::new();
        let mut opened = Vec::new();
        search
            .run(root, &mut out, &mut |found| {
                opened.push(found.to_path_buf());
                Ok(())
            })
            .unwrap();
        (String::from_utf8(out).unwrap(), opened)
    }

    #[test]
    fn test_filesearch_plain_scans_current_dir_only() {
        let (_tmp, work) = search_tree();

        let (out, opened) = search(&[".log"], &work);

        assert_eq!(out, "  ./notes.log\n");
        assert!(opened.is_empty());
    }

    #[test]
    fn test_filesearch_r_prints_relative_paths() {
        let (_tmp, work) = search_tree();

        let (out, opened) = search(&["-r", ".log"], &work);

        assert_eq!(
            out,
            "  ./deep/trace.log\n  ./notes.log\n  ../sibling.log\n"
        );
        assert!(opened.is_empty());
    }

    #[test]
    fn test_filesearch_o_opens_silently() {
        let (_tmp, work) = search_tree();

        let (out, opened) = search(&["-o", "trace"], &work);

        assert_eq!(out, "");
        assert_eq!(opened, vec![PathBuf::from("./deep/trace.log")]);
    }

    #[test]
    fn test_filesearch_both_flags_in_any_order() {
        let (_tmp, work) = search_tree();

        for args in [["-r", "-o", "readme"], ["-o", "-r", "readme"]] {
            let (out, opened) = search(&args, &work);
            assert_eq!(out, "  ./readme.md\n");
            assert_eq!(opened, vec![PathBuf::from("./readme.md")]);
        }
    }

    #[test]
    fn test_filesearch_rejects_bad_flags() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = env_in(tmp.path(), tmp.path());

        let (code, out) = run_builtin(&["filesearch", "-x", "log"], "", &mut env);
        assert_eq!((code, out.as_str()), (1, "Command not found.\n"));

        let (code, out) = run_builtin(&["filesearch", "-r", "-r", "log"], "", &mut env);
        assert_eq!((code, out.as_str()), (1, "Command not found.\n"));

        let (code, out) = run_builtin(&["filesearch"], "", &mut env);
        assert_eq!((code, out.as_str()), (1, "Please enter valid input.\n"));

        let (code, out) = run_builtin(&["filesearch", "-r", "-o", "x", "y"], "", &mut env);
        assert_eq!((code, out.as_str()), (1, "Please enter valid input.\n"));
    }

    #[test]
    fn test_fileproperties_reports_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("data.bin");
        fs::write(&file, b"12345").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o640)).unwrap();
        let mut env = env_in(tmp.path(), tmp.path());

        let (code, out) = run_builtin(&["fileproperties"], "data.bin\n", &mut env);

        assert_eq!(code, 0);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Enter file name: File access permission: read write");
        assert_eq!(lines[1], "File size: 5");
        assert!(lines[2].starts_with("Created date: "));
        assert!(lines[3].starts_with("Modified date: "));
    }

    #[test]
    fn test_fileproperties_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = env_in(tmp.path(), tmp.path());

        let (code, out) = run_builtin(&["fileproperties"], "ghost.txt\n", &mut env);

        assert_eq!(code, 1);
        assert_eq!(out, "Enter file name: File can not find.\n");
    }

    #[test]
    fn test_utc_stamp() {
        assert_eq!(utc_stamp(0), "1-1-1970, time: 0:0:0");
        assert_eq!(utc_stamp(1_700_000_000), "14-11-2023, time: 22:13:20");
        // leap day
        assert_eq!(utc_stamp(951_782_400), "29-2-2000, time: 0:0:0");
        assert_eq!(utc_stamp(-1), "31-12-1969, time: 23:59:59");
    }

    #[test]
    fn test_manual_pwd_and_ls() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("b.txt"), "").unwrap();
        fs::write(tmp.path().join("a.txt"), "").unwrap();
        fs::create_dir(tmp.path().join("c")).unwrap();
        let mut env = env_in(tmp.path(), tmp.path());

        let (_, out) = run_builtin(&["manual", "pwd"], "", &mut env);
        assert_eq!(out, format!("{}\n", tmp.path().to_string_lossy()));

        let (_, out) = run_builtin(&["manual", "ls"], "", &mut env);
        assert_eq!(out, "  a.txt  b.txt  c\n");

        let (code, out) = run_builtin(&["manual", "cat"], "", &mut env);
        assert_eq!((code, out.as_str()), (1, "usage: manual <pwd|ls>\n"));
    }

    #[test]
    fn test_basiccalculator_operations() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = env_in(tmp.path(), tmp.path());

        let (code, out) = run_builtin(&["basiccalculator", "4", "+", "5"], "", &mut env);
        assert_eq!((code, out.as_str()), (0, "4.0 + 5.0 = 9.0\n"));

        let (_, out) = run_builtin(&["basiccalculator", "7", "-", "10"], "", &mut env);
        assert_eq!(out, "7.0 - 10.0 = -3.0\n");

        let (_, out) = run_builtin(&["basiccalculator", "2.5", "*", "-2"], "", &mut env);
        assert_eq!(out, "2.5 * -2.0 = -5.0\n");

        let (_, out) = run_builtin(&["basiccalculator", "1", "/", "3"], "", &mut env);
        assert_eq!(out, "1.0 / 3.0 = 0.3\n");
    }

    #[test]
    fn test_basiccalculator_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = env_in(tmp.path(), tmp.path());

        let (code, out) = run_builtin(&["basiccalculator", "4", "%", "5"], "", &mut env);
        assert_eq!((code, out.as_str()), (1, "Error! operator is not correct\n"));

        let (code, out) = run_builtin(&["basiccalculator", "4", "/", "0"], "", &mut env);
        assert_eq!((code, out.as_str()), (1, "Error! division by zero\n"));

        let (code, out) = run_builtin(&["basiccalculator", "four", "+", "5"], "", &mut env);
        assert_eq!((code, out.as_str()), (1, "basiccalculator: not a number: four\n"));

        let (code, out) = run_builtin(&["basiccalculator", "4", "+"], "", &mut env);
        assert_eq!(code, 1);
        assert!(out.starts_with("usage: basiccalculator"));
    }

    #[test]
    fn test_help_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = env_in(tmp.path(), tmp.path());

        let (code, out) = run_builtin(&["cd", "--help"], "", &mut env);

        assert_eq!(code, 0);
        assert!(out.contains("Usage: cd"));
    }
}
