//! Head segment outputs: the fixed-stride concatenation and the version
//! buckets.

use crate::Result;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::io::Write;

/// Bucket for heads carrying no usable `Version=<value>,` marker.
pub const UNKNOWN_VERSION: &str = "unknown_version";

/// Longest version value accepted as a directory name.
pub const MAX_VERSION_LEN: usize = 64;

// ASCII word characters, dots and dashes only; anything else, including a
// line break before the comma, is not a version marker.
static VERSION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?-u)Version=([\w.\-]{{1,{MAX_VERSION_LEN}}}),"))
        .expect("version marker pattern is valid")
});

// ── HeadConcat ───────────────────────────────────────────────────────────────

/// Concatenates one fixed-size slot per container into a single sink.
///
/// Slot `i` always starts at `i * slot_size`, so a head can be fetched by
/// file index without any framing.
pub struct HeadConcat<W: Write> {
    sink: W,
    slot_size: usize,
    zeros: Vec<u8>,
    slots: usize,
}

impl<W: Write> HeadConcat<W> {
    pub fn new(sink: W, slot_size: usize) -> Self {
        Self {
            sink,
            slot_size,
            zeros: vec![0; slot_size],
            slots: 0,
        }
    }

    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Number of slots written so far.
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Write `head` truncated or zero-padded to the slot size.
    ///
    /// `None` writes an all-zero slot, for containers that produced no head.
    pub fn write_slot(&mut self, head: Option<&[u8]>) -> Result<()> {
        let head = head.unwrap_or_default();
        let kept = head.len().min(self.slot_size);
        self.sink.write_all(&head[..kept])?;
        self.sink.write_all(&self.zeros[kept..])?;
        self.slots += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

// ── Version buckets ──────────────────────────────────────────────────────────

/// Value of the first well-formed `Version=<value>,` marker in `head`.
///
/// The value is 1 to [`MAX_VERSION_LEN`] bytes of ASCII letters, digits, `_`,
/// `.` or `-`.
pub fn version_token(head: &[u8]) -> Option<String> {
    VERSION_MARKER
        .captures(head)
        .and_then(|c| c.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
}

/// Directory name grouping heads of the same version.
///
/// ```
/// use pkpextract::{version_bucket, UNKNOWN_VERSION};
///
/// assert_eq!(version_bucket(b"..Version=5.1-a,.."), "5.1-a");
/// assert_eq!(version_bucket(b"..Version=5.1/a,.."), UNKNOWN_VERSION);
/// assert_eq!(version_bucket(b"no marker"), UNKNOWN_VERSION);
/// ```
pub fn version_bucket(head: &[u8]) -> String {
    match version_token(head) {
        Some(v) if v != "." && v != ".." => v,
        _ => UNKNOWN_VERSION.to_string(),
    }
}
