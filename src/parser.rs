use crate::lexer::{self, SPLITTERS, Token};

/// Kind of redirection
///
/// Also the index of the redirect slot in [`Command::redirects`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedirectKind {
    /// Input redirection (`<`): reads standard input from a file.
    Input,
    /// Output redirection (`>`): writes standard output to a file, truncating it.
    Output,
    /// Output redirection with append (`>>`): writes standard output to the end of a file.
    Append,
}

impl RedirectKind {
    const ALL: [RedirectKind; 3] = [Self::Input, Self::Output, Self::Append];

    fn slot(self) -> usize {
        match self {
            Self::Input => 0,
            Self::Output => 1,
            Self::Append => 2,
        }
    }
}

/// One stage of a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    /// The program or builtin name; empty for a blank line.
    pub name: String,
    /// Arguments after the name, in order.
    pub args: Vec<String>,
    /// The line ended in `&`.
    pub background: bool,
    /// The line ended in `?`. Recorded only.
    pub auto_complete: bool,
    /// Redirect targets indexed by [`RedirectKind`]: stdin, stdout, stdout-append.
    pub redirects: [Option<String>; 3],
}

impl Command {
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Target of the given redirect, if the command declared one.
    pub fn redirect(&self, kind: RedirectKind) -> Option<&str> {
        self.redirects[kind.slot()].as_deref()
    }

    /// Set a redirect target; a later redirect of the same kind replaces the earlier one.
    pub fn set_redirect(&mut self, kind: RedirectKind, target: impl Into<String>) {
        self.redirects[kind.slot()] = Some(target.into());
    }

    /// Iterate over the declared redirects.
    pub fn declared_redirects(&self) -> impl Iterator<Item = (RedirectKind, &str)> {
        RedirectKind::ALL
            .into_iter()
            .filter_map(|kind| self.redirect(kind).map(|target| (kind, target)))
    }
}

/// A **pipeline** of commands connected by `|`, in execution order.
///
/// Always holds at least one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Command>,
}

impl Pipeline {
    pub fn stages(&self) -> &[Command] {
        &self.stages
    }

    /// The first stage, whose name decides between builtin and external execution.
    pub fn head(&self) -> &Command {
        &self.stages[0]
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Stage fed by stage `index`, or `None` if `index` is the terminal stage.
    pub fn next(&self, index: usize) -> Option<&Command> {
        self.stages.get(index + 1)
    }

    /// Whether the shell should return to the prompt without waiting.
    pub fn is_background(&self) -> bool {
        self.head().background
    }
}

/// Control markers found at the very end of a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LineFlags {
    background: bool,
    auto_complete: bool,
}

struct PipelineBuilder {
    words: Vec<String>,
    pos: usize,
    flags: LineFlags,
}

impl PipelineBuilder {
    fn from(words: Vec<String>, flags: LineFlags) -> Self {
        PipelineBuilder {
            words,
            pos: 0,
            flags,
        }
    }

    fn build(mut self) -> Pipeline {
        let mut stages = Vec::new();
        loop {
            let (command, piped) = self.parse_command();
            stages.push(command);
            if !piped {
                break;
            }
        }
        Pipeline { stages }
    }

    fn peek(&self) -> Option<&str> {
        self.words.get(self.pos).map(String::as_str)
    }

    fn consume(&mut self) -> Option<String> {
        let word = self.words.get(self.pos).cloned();
        if word.is_some() {
            self.pos += 1;
        }
        word
    }

    /// Parse one stage. The flag tells whether a `|` ended it.
    fn parse_command(&mut self) -> (Command, bool) {
        let mut command = Command {
            // the name is taken verbatim, whatever it looks like
            name: self.consume().unwrap_or_default(),
            background: self.flags.background,
            auto_complete: self.flags.auto_complete,
            ..Command::default()
        };

        while let Some(word) = self.consume() {
            match lexer::classify(&word) {
                Token::PipeOp => return (command, true),
                Token::Background => {}
                Token::Redirect(kind, target) => {
                    let target = if target.is_empty() {
                        self.parse_detached_target()
                    } else {
                        Some(target)
                    };
                    match target {
                        Some(target) => command.set_redirect(kind, target),
                        None => tracing::warn!(
                            command = %command.name,
                            "redirect {:?} without a target ignored",
                            kind
                        ),
                    }
                }
                Token::Word(arg) => command.args.push(arg),
            }
        }
        (command, false)
    }

    /// Target written as the word after a bare `<`, `>` or `>>`.
    fn parse_detached_target(&mut self) -> Option<String> {
        match lexer::classify(self.peek()?) {
            Token::Word(target) => {
                self.pos += 1;
                Some(target)
            }
            _ => None,
        }
    }
}

/// Trim the line and take off a trailing `?` or `&`.
fn strip_line_flags(line: &str) -> (&str, LineFlags) {
    let mut line = line.trim_matches(SPLITTERS);
    let mut flags = LineFlags::default();
    if let Some(rest) = line.strip_suffix('?') {
        flags.auto_complete = true;
        line = rest;
    } else if let Some(rest) = line.strip_suffix('&') {
        flags.background = true;
        line = rest;
    }
    (line.trim_end_matches(SPLITTERS), flags)
}

/// Parse one input line into a [`Pipeline`].
///
/// Parsing never fails: a blank line yields a single stage with an empty
/// name, and malformed redirects are dropped.
pub fn parse_line(line: &str) -> Pipeline {
    let (line, flags) = strip_line_flags(line);
    PipelineBuilder::from(lexer::split_words(line), flags).build()
}
