use crate::builtin::Builtins;
use crate::command::Status;
use crate::config::{Config, SHELL_NAME};
use crate::env::Environment;
use crate::external;
use crate::parser::{self, Pipeline};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result};
use std::io::{self, BufRead, Write};

/// Interactive command runner.
///
/// Lines are parsed into a [`Pipeline`]; a pipeline whose first word is a
/// builtin runs inside the shell, anything else is handed to the external
/// executor.
pub struct Interpreter {
    env: Environment,
    builtins: Builtins,
}

impl Interpreter {
    /// Create an interpreter with every builtin, working in the current directory.
    pub fn new(config: Config) -> Self {
        Self {
            env: Environment::new(config),
            builtins: Builtins::default(),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Parse and run one line.
    ///
    /// `stdin` feeds the questions interactive builtins ask; everything the
    /// shell itself prints, error messages included, goes to `stdout`.
    pub fn execute_line(
        &mut self,
        line: &str,
        stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
    ) -> Status {
        let pipeline = parser::parse_line(line);
        tracing::debug!(?pipeline, "parsed");

        match self.dispatch(&pipeline, stdin, stdout) {
            Ok(status) => status,
            Err(e) => {
                if let Err(write_err) = writeln!(stdout, "-{}: {:#}", SHELL_NAME, e) {
                    tracing::warn!("can't report {:#}: {}", e, write_err);
                }
                Status::Continue
            }
        }
    }

    fn dispatch(
        &mut self,
        pipeline: &Pipeline,
        stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
    ) -> anyhow::Result<Status> {
        let head = pipeline.head();
        let Some(factory) = self.builtins.lookup(&head.name) else {
            return external::run_pipeline(pipeline, &self.env, stdout);
        };

        if pipeline.len() > 1 || head.declared_redirects().next().is_some() {
            tracing::debug!(builtin = %head.name, "pipes and redirects ignored for builtins");
        }
        let args: Vec<&str> = head.args.iter().map(String::as_str).collect();
        let code = factory
            .create(&args)
            .execute(stdin, stdout, &mut self.env)?;
        tracing::debug!(builtin = %head.name, code, "finished");

        Ok(if self.env.should_exit {
            Status::Exit
        } else {
            Status::Continue
        })
    }

    /// `user@host:cwd shellfyre$ `
    pub fn prompt(&self) -> String {
        let user = self.env.get_var("USER").unwrap_or_default();
        format!(
            "{}@{}:{} {}$ ",
            user,
            host_name(&self.env),
            self.env.current_dir.display(),
            SHELL_NAME
        )
    }

    /// Read-eval-print loop until `exit` or end of input.
    ///
    /// Up arrow recalls the previous line only.
    pub fn repl(&mut self) -> Result<()> {
        let config = rustyline::Config::builder()
            .max_history_size(1)?
            .auto_add_history(true)
            .build();
        let mut rl = DefaultEditor::with_config(config)?;

        loop {
            let readline = rl.readline(&self.prompt());
            match readline {
                Ok(line) => {
                    let status = self.execute_line(
                        &line,
                        &mut io::stdin().lock(),
                        &mut io::stdout().lock(),
                    );
                    if status == Status::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        println!();
        Ok(())
    }
}

fn host_name(env: &Environment) -> String {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| env.get_var("HOSTNAME"))
        .unwrap_or_else(|| "localhost".to_string())
}
