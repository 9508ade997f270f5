use rustpython_parser::{parse, Mode};
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Once;
use std::thread;
use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

thread_local! {
    static PARSING: Cell<bool> = const { Cell::new(false) };
}

// ── ValidationFailure ────────────────────────────────────────────────────────

/// Why an extracted script was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The bytes are not UTF-8 text, or contain a NUL byte.
    Decode,
    /// The parser rejected the text.
    Syntax,
    /// The parser faulted internally.
    Unclassified,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Decode => "DecodeError",
            FailureKind::Syntax => "SyntaxError",
            FailureKind::Unclassified => "InternalError",
        })
    }
}

/// A rejected script, with a single human-readable diagnostic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationFailure {
    pub kind: FailureKind,

    /// 1-based line of the syntax error, when the parser reports one.
    pub line: Option<usize>,

    /// `<label>`, kind and detail combined.
    pub message: String,
}

// ── ScriptValidator ──────────────────────────────────────────────────────────

/// Checks that an extracted script is at least syntactically valid Python.
///
/// A script that parses can still be broken in other ways; this only catches
/// extraction cut at the wrong place and binary noise.
pub struct ScriptValidator<'a> {
    source: &'a [u8],
    label: &'a str,
}

impl<'a> ScriptValidator<'a> {
    /// `label` names the script in diagnostics; only its file-name component is
    /// used.
    pub fn new(source: &'a [u8], label: &'a str) -> Self {
        Self { source, label }
    }

    /// Parse the script as a Python module.
    pub fn validate(&self) -> std::result::Result<(), ValidationFailure> {
        let text = self.decode()?;

        let outcome = catch_silently(|| parse(text, Mode::Module, self.base_label()).map(|_| ()));

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => {
                let offset = u32::from(err.offset) as usize;
                let (line, line_text) = line_at(text, offset);
                Err(ValidationFailure {
                    kind: FailureKind::Syntax,
                    line: Some(line),
                    message: format!(
                        "{}, line {line}: {}: {} ({})",
                        self.base_label(),
                        FailureKind::Syntax,
                        line_text.trim_end(),
                        err.error
                    ),
                })
            }
            Err(payload) => {
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "parser aborted".into());
                Err(ValidationFailure {
                    kind: FailureKind::Unclassified,
                    line: None,
                    message: format!(
                        "{} in {}: {detail}",
                        FailureKind::Unclassified,
                        self.base_label()
                    ),
                })
            }
        }
    }

    /// Decode the bytes the way a Python source file is read: UTF-8 with an
    /// optional BOM, no NUL bytes.
    fn decode(&self) -> std::result::Result<&'a str, ValidationFailure> {
        let bytes = self.source.strip_prefix(UTF8_BOM).unwrap_or(self.source);

        let text = std::str::from_utf8(bytes).map_err(|e| self.decode_failure(&e.to_string()))?;
        if memchr::memchr(0, bytes).is_some() {
            return Err(self.decode_failure("source code cannot contain null bytes"));
        }
        Ok(text)
    }

    fn decode_failure(&self, detail: &str) -> ValidationFailure {
        ValidationFailure {
            kind: FailureKind::Decode,
            line: None,
            message: format!("{}: {}: {detail}", self.base_label(), FailureKind::Decode),
        }
    }

    fn base_label(&self) -> &'a str {
        Path::new(self.label)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(self.label)
    }
}

/// Run `f`, turning a panic into `Err` without the panic hook printing it.
///
/// The quiet hook is installed once and wraps the previous one: panics on
/// other threads, or outside `f`, are still reported as usual.
fn catch_silently<T>(f: impl FnOnce() -> T) -> thread::Result<T> {
    static QUIET_HOOK: Once = Once::new();
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !PARSING.with(Cell::get) {
                previous(info);
            }
        }));
    });

    PARSING.with(|p| p.set(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    PARSING.with(|p| p.set(false));
    outcome
}

/// 1-based line number and text of the line holding byte `offset`.
fn line_at(text: &str, offset: usize) -> (usize, &str) {
    let offset = offset.min(text.len());
    let before = &text.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let start = memchr::memrchr(b'\n', before).map_or(0, |p| p + 1);
    let end = memchr::memchr(b'\n', &text.as_bytes()[start..]).map_or(text.len(), |p| start + p);
    (line, &text[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_at_reports_offending_line() {
        let text = "a = 1\nb = (\nc = 3\n";
        assert_eq!(line_at(text, 8), (2, "b = ("));
        assert_eq!(line_at(text, 0), (1, "a = 1"));
    }

    #[test]
    fn line_at_clamps_past_end() {
        let text = "x = 1\ny =";
        assert_eq!(line_at(text, 100), (2, "y ="));
    }

    #[test]
    fn panics_inside_the_parser_are_caught() {
        let payload = catch_silently(|| -> u8 { panic!("parser blew up") }).unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"parser blew up"));
        assert!(!PARSING.with(Cell::get));
        assert_eq!(catch_silently(|| 7).unwrap(), 7);
    }
}
