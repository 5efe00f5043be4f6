use crate::command::Status;
use crate::config::SHELL_NAME;
use crate::env::Environment;
use crate::parser::{Command, Pipeline, RedirectKind};
use anyhow::{Context, Result, anyhow};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, ExitStatus, Stdio};

/// Pipeline stage resolved to a program of the binary directory.
struct ExternalCommand<'a> {
    program: PathBuf,
    stage: &'a Command,
}

impl<'a> ExternalCommand<'a> {
    fn resolve(stage: &'a Command, bin_dir: &Path) -> Option<Self> {
        let program = find_program(bin_dir, &stage.name)?;
        Some(Self { program, stage })
    }

    /// Start the program. `argv[0]` is the name as typed.
    fn spawn(&self, env: &Environment, stdin: Stdio, stdout: Stdio) -> Result<Child> {
        let child = std::process::Command::new(&self.program)
            .arg0(&self.stage.name)
            .args(&self.stage.args)
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir)
            .stdin(stdin)
            .stdout(stdout)
            .spawn()?;
        tracing::debug!(
            pid = child.id(),
            program = %self.program.display(),
            args = self.stage.arg_count(),
            "spawned"
        );
        Ok(child)
    }
}

/// Run every stage of `pipeline` as a child process.
///
/// Adjacent stages are connected by a pipe unless a redirect of the stage
/// claims that stream. All stages are started before the shell waits, and it
/// only waits for the terminal stage, and only in the foreground. Background
/// children are left for the OS to reap once the shell exits.
///
/// Messages about stages that can't be started are written to `out`.
pub fn run_pipeline(pipeline: &Pipeline, env: &Environment, out: &mut dyn Write) -> Result<Status> {
    let mut status = Status::Continue;
    let mut upstream: Option<ChildStdout> = None;
    let mut terminal: Option<Child> = None;

    for (index, stage) in pipeline.stages().iter().enumerate() {
        let piped_in = upstream.take();
        let is_last = pipeline.next(index).is_none();

        let Some(external) = ExternalCommand::resolve(stage, &env.config.bin_dir) else {
            writeln!(out, "-{}: {}: command not found", SHELL_NAME, stage.name)?;
            status = Status::Unknown;
            continue;
        };

        let streams = stdin_for(stage, env, index, piped_in)
            .and_then(|stdin| Ok((stdin, stdout_for(stage, env, is_last)?)));
        let (stdin, stdout) = match streams {
            Ok(streams) => streams,
            Err(e) => {
                writeln!(out, "-{}: {:#}", SHELL_NAME, e)?;
                continue;
            }
        };

        out.flush()?;
        let mut child = match external.spawn(env, stdin, stdout) {
            Ok(child) => child,
            Err(e) => {
                writeln!(out, "-{}: {}: {:#}", SHELL_NAME, stage.name, e)?;
                continue;
            }
        };

        if is_last {
            terminal = Some(child);
        } else {
            upstream = child.stdout.take();
        }
    }

    if let Some(mut child) = terminal {
        if pipeline.is_background() {
            tracing::debug!(pid = child.id(), "running in background");
        } else {
            let exit_status = child.wait()?;
            tracing::debug!(code = exit_code(exit_status), "terminal stage exited");
        }
    }
    Ok(status)
}

/// Input of a stage: its `<` redirect, else the pipe from the previous stage.
///
/// A stage after a stage that never started (or sent its output elsewhere)
/// reads nothing.
fn stdin_for(
    stage: &Command,
    env: &Environment,
    index: usize,
    piped_in: Option<ChildStdout>,
) -> Result<Stdio> {
    if let Some(target) = stage.redirect(RedirectKind::Input) {
        let file = File::open(env.current_dir.join(target)).with_context(|| target.to_string())?;
        return Ok(file.into());
    }
    Ok(match piped_in {
        Some(pipe) => pipe.into(),
        None if index > 0 => Stdio::null(),
        None => Stdio::inherit(),
    })
}

/// Output of a stage: `>` wins over `>>`, both win over the pipe to the next stage.
fn stdout_for(stage: &Command, env: &Environment, is_last: bool) -> Result<Stdio> {
    // created even when `>` takes the stream, the way other shells do
    let append = match stage.redirect(RedirectKind::Append) {
        Some(target) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(env.current_dir.join(target))
                .with_context(|| target.to_string())?,
        ),
        None => None,
    };
    if let Some(target) = stage.redirect(RedirectKind::Output) {
        let file = File::create(env.current_dir.join(target)).with_context(|| target.to_string())?;
        return Ok(file.into());
    }
    Ok(match append {
        Some(file) => file.into(),
        None if is_last => Stdio::inherit(),
        None => Stdio::piped(),
    })
}

/// Run the configured opener on `file` and wait for it.
pub fn open_file(env: &Environment, file: &Path) -> Result<()> {
    let opener = &env.config.opener;
    let program = find_program(&env.config.bin_dir, opener)
        .ok_or_else(|| anyhow!("{}: command not found", opener))?;
    let exit_status = std::process::Command::new(&program)
        .arg0(opener)
        .arg(file)
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir)
        .status()
        .with_context(|| format!("can't run {}", opener))?;
    tracing::debug!(file = %file.display(), code = exit_code(exit_status), "opener exited");
    Ok(())
}

fn exit_code(exit_status: ExitStatus) -> i32 {
    match exit_status.code() {
        Some(x) => x,
        None => terminated_by_signal(exit_status),
    }
}

fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

/// Resolve a command name to an executable file directly inside `bin_dir`.
///
/// Behavior:
/// - Empty names and names containing a path separator never resolve.
/// - The candidate must be a regular file (after following symlinks) with at
///   least one execute bit set.
pub fn find_program(bin_dir: &Path, name: &str) -> Option<PathBuf> {
    if name.is_empty() || name.contains('/') {
        return None;
    }
    let path = bin_dir.join(name);
    if is_executable(&path) { Some(path) } else { None }
}

fn is_executable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}
