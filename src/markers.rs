//! Marker primitives locating the start and end of each payload kind.
//!
//! Every finder works on a plain byte slice and reports offsets into it.
//! "Not found" is `None`; the only hard failure is
//! [`ExtractError::MalformedContainer`] from [`script_start`].

use crate::{ExtractError, Result};
use memchr::{memchr, memmem};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// Locates the first byte of a payload inside a buffer.
pub type StartFinder = fn(&[u8]) -> Result<Option<usize>>;

/// Locates the end (exclusive) of a payload, searching from its start.
pub type EndFinder = fn(&[u8], usize) -> Option<usize>;

/// Signature opening the PDF part.
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Terminator closing the PDF part; the part ends after its second occurrence.
pub const PDF_TERMINATOR: &[u8] = b"%%EOF";

/// Cheap literal used to find a candidate script statement.
pub const IMPORT_LITERAL: &[u8] = b"import ";

/// Byte closing the script part.
pub const SCRIPT_TERMINATOR: u8 = 0x01;

/// How far before the `import ` literal the statement pattern is searched.
///
/// Covers the `from <module> ` prefix that precedes the literal.
pub const LOOKBACK_WINDOW: usize = 25;

// `from a.b import` or `import a.b`, ASCII word characters only.
static SCRIPT_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)(from [\w.]+ import)|(import [\w.]+)")
        .expect("script statement pattern is valid")
});

// ── PDF markers ──────────────────────────────────────────────────────────────

/// Offset of the first `%PDF-` signature.
pub fn pdf_start(buf: &[u8]) -> Result<Option<usize>> {
    Ok(memmem::find(buf, PDF_SIGNATURE))
}

/// Offset just past one `%%EOF` found at or after `from`.
fn pdf_terminator_end(buf: &[u8], from: usize) -> Option<usize> {
    let rest = buf.get(from..)?;
    memmem::find(rest, PDF_TERMINATOR).map(|pos| from + pos + PDF_TERMINATOR.len())
}

/// Offset just past the second `%%EOF` found at or after `start`.
///
/// The first terminator closes an inner revision; the PDF part runs up to the
/// outer one.
pub fn pdf_end(buf: &[u8], start: usize) -> Option<usize> {
    let inner = pdf_terminator_end(buf, start)?;
    pdf_terminator_end(buf, inner)
}

// ── Script markers ───────────────────────────────────────────────────────────

/// Offset of the first statement opening the script part.
///
/// A literal scan for `import ` finds the candidate, then the statement
/// pattern is re-matched starting [`LOOKBACK_WINDOW`] bytes earlier so that a
/// leading `from <module>` is included.
///
/// Fails with [`ExtractError::MalformedContainer`] when the literal lies
/// inside the look-back window.
pub fn script_start(buf: &[u8]) -> Result<Option<usize>> {
    let Some(import_pos) = memmem::find(buf, IMPORT_LITERAL) else {
        return Ok(None);
    };
    if import_pos < LOOKBACK_WINDOW {
        return Err(ExtractError::MalformedContainer { offset: import_pos });
    }

    Ok(SCRIPT_STATEMENT
        .find_at(buf, import_pos - LOOKBACK_WINDOW)
        .map(|m| m.start()))
}

/// Offset of the first `0x01` at or after `start`.
pub fn script_end(buf: &[u8], start: usize) -> Option<usize> {
    let rest = buf.get(start..)?;
    memchr(SCRIPT_TERMINATOR, rest).map(|pos| start + pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(prefix_len: usize, rest: &[u8]) -> Vec<u8> {
        let mut buf = vec![b'.'; prefix_len];
        buf.extend_from_slice(rest);
        buf
    }

    #[test]
    fn pdf_start_finds_first_signature() {
        assert_eq!(pdf_start(b"abc%PDF-1.7%PDF-").unwrap(), Some(3));
        assert_eq!(pdf_start(b"no document here").unwrap(), None);
    }

    #[test]
    fn pdf_end_skips_inner_terminator() {
        let buf = b"%PDF-a%%EOFb%%EOFc%%EOF";
        assert_eq!(pdf_end(buf, 0), Some(17));
    }

    #[test]
    fn pdf_end_needs_two_terminators() {
        assert_eq!(pdf_end(b"%PDF-a%%EOF tail", 0), None);
        assert_eq!(pdf_end(b"%PDF-a", 0), None);
    }

    #[test]
    fn pdf_end_ignores_terminators_before_start() {
        let buf = b"%%EOF%%EOF%PDF-x%%EOF";
        assert_eq!(pdf_end(buf, 10), None);
    }

    #[test]
    fn pdf_end_past_buffer_is_not_found() {
        assert_eq!(pdf_end(b"%%EOF", 10), None);
    }

    #[test]
    fn script_start_rejects_import_near_origin() {
        let buf = padded(LOOKBACK_WINDOW - 1, b"import os\n");
        match script_start(&buf) {
            Err(ExtractError::MalformedContainer { offset }) => {
                assert_eq!(offset, LOOKBACK_WINDOW - 1)
            }
            other => panic!("expected MalformedContainer, got {other:?}"),
        }
    }

    #[test]
    fn script_start_accepts_import_at_window_edge() {
        let buf = padded(LOOKBACK_WINDOW, b"import os\n");
        assert_eq!(script_start(&buf).unwrap(), Some(LOOKBACK_WINDOW));
    }

    #[test]
    fn script_start_includes_from_clause() {
        let buf = padded(40, b"from os.path import join\n");
        assert_eq!(script_start(&buf).unwrap(), Some(40));
    }

    #[test]
    fn script_start_without_literal_is_not_found() {
        assert_eq!(script_start(b"plain bytes, nothing to see").unwrap(), None);
    }

    #[test]
    fn script_start_needs_a_module_name() {
        let buf = padded(30, b"import \x00\x02");
        assert_eq!(script_start(&buf).unwrap(), None);
    }

    #[test]
    fn script_end_finds_terminator_after_start() {
        let buf = b"\x01import x\x01rest";
        assert_eq!(script_end(buf, 1), Some(9));
        assert_eq!(script_end(b"import x", 0), None);
    }
}
