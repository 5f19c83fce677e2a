use std::borrow::Cow::{self, Borrowed, Owned};

use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::HistoryHinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Helper, Hinter};

const KEYWORDS: [&str; 11] = ["ADD", "VOICE", "EDIT", "DELETE", "FILTER", "CLEAR", "SHOW", "EXPORT", "HELP", "QUIT", "EXIT"];

/// Line editor helper for the ledger shell.
/// Completes command keywords, and file names once an `EXPORT ... TO` path is being typed.
#[derive(Helper, Hinter)]
pub(crate) struct LedgerHelper {
    file_completer: FilenameCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    colored_prompt: String,
}

impl LedgerHelper {
    pub(crate) fn new(prompt: &str) -> LedgerHelper {
        LedgerHelper {
            file_completer: FilenameCompleter::new(),
            hinter: HistoryHinter::new(),
            colored_prompt: format!("\x1b[1;32m{prompt}\x1b[0m"),
        }
    }
}

impl Completer for LedgerHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let typed = &line[..pos];
        if is_export_path(typed) {
            return self.file_completer.complete(line, pos, ctx);
        }

        // Only the first word is a keyword
        if typed.trim_start().contains(char::is_whitespace) {
            return Ok((pos, vec![]));
        }
        let start = typed.len() - typed.trim_start().len();
        let candidates = keyword_candidates(&typed[start..]).into_iter()
            .map(|keyword| Pair { display: keyword.to_string(), replacement: format!("{keyword} ") })
            .collect();
        Ok((start, candidates))
    }
}

/// Keywords starting with `prefix`, ignoring case
fn keyword_candidates(prefix: &str) -> Vec<&'static str> {
    let prefix = prefix.to_ascii_uppercase();
    KEYWORDS.iter().copied().filter(|k| k.starts_with(prefix.as_str())).collect()
}

fn is_export_path(typed: &str) -> bool {
    let words: Vec<String> = typed.split_whitespace().map(|w| w.to_ascii_uppercase()).collect();
    let ends_in_path = typed.ends_with(char::is_whitespace) || words.len() > 1;
    words.first().map_or(false, |w| w == "EXPORT") && words.iter().any(|w| w == "TO") && ends_in_path
}

/// An EXPORT line whose path has an odd number of single or double quotes.
/// Entry text is free to contain apostrophes.
fn has_unclosed_quote(line: &str) -> bool {
    let is_export = line.split_whitespace().next().map_or(false, |w| w.eq_ignore_ascii_case("EXPORT"));
    is_export && (line.matches('\'').count() % 2 == 1 || line.matches('"').count() % 2 == 1)
}

impl Validator for LedgerHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        if has_unclosed_quote(ctx.input()) {
            Ok(ValidationResult::Invalid(Some("  (unclosed quote)".to_owned())))
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

impl Highlighter for LedgerHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Borrowed(&self.colored_prompt)
        } else {
            Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned("\x1b[2m".to_owned() + hint + "\x1b[m")
    }
}
