//! Lexical analysis of one command line.
//!
//! The shell's grammar is whitespace-delimited: every run of spaces or tabs
//! separates two words, and each word is classified on its own. Quotes only
//! matter when they wrap a whole word.

use crate::parser::RedirectKind;

/// Characters that separate words.
pub const SPLITTERS: [char; 2] = [' ', '\t'];

/// Represents a classified word of the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A plain argument, with surrounding quotes already removed.
    Word(String),
    /// The pipe operator, `|`, as a word of its own.
    PipeOp,
    /// A lone `&`.
    Background,
    /// A word starting with `<`, `>` or `>>`. The target is the rest of the
    /// word and is empty when the path was written as a separate word.
    Redirect(RedirectKind, String),
}

/// Split a line into its non-empty words, in order.
pub fn split_words(line: &str) -> Vec<String> {
    line.split(SPLITTERS)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Classify a single word.
pub fn classify(word: &str) -> Token {
    match word {
        "|" => Token::PipeOp,
        "&" => Token::Background,
        _ => {
            if let Some(target) = word.strip_prefix(">>") {
                Token::Redirect(RedirectKind::Append, target.to_string())
            } else if let Some(target) = word.strip_prefix('>') {
                Token::Redirect(RedirectKind::Output, target.to_string())
            } else if let Some(target) = word.strip_prefix('<') {
                Token::Redirect(RedirectKind::Input, target.to_string())
            } else {
                Token::Word(unquote(word).to_string())
            }
        }
    }
}

/// Strip one pair of matching quotes wrapping the whole word.
///
/// `""` and `''` are left alone: the word must be longer than its quotes.
fn unquote(word: &str) -> &str {
    let quoted = word.len() > 2
        && ((word.starts_with('"') && word.ends_with('"'))
            || (word.starts_with('\'') && word.ends_with('\'')));
    if quoted { &word[1..word.len() - 1] } else { word }
}
