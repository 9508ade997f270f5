use crate::markers::{self, EndFinder, StartFinder};
use crate::Result;

// ── Span ─────────────────────────────────────────────────────────────────────

/// A half-open byte range `[start, end)` marking a located payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Signed size of a possibly missing span; a missing span has size 0.
    ///
    /// Callers treat every non-positive size as "payload absent".
    pub fn size_of(span: Option<Span>) -> i64 {
        span.map_or(0, |s| s.end as i64 - s.start as i64)
    }
}

// ── SegmentTriplet ───────────────────────────────────────────────────────────

/// The bytes before, inside, and after a span of one buffer.
///
/// `head`, `body` and `tail` concatenated always give back the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentTriplet<'a> {
    pub head: &'a [u8],
    pub body: &'a [u8],
    pub tail: &'a [u8],
}

impl<'a> SegmentTriplet<'a> {
    /// Cut `buf` around `span`. A missing span leaves everything in `head`.
    pub fn split(buf: &'a [u8], span: Option<Span>) -> Self {
        match span {
            Some(Span { start, end }) => {
                let (head, rest) = buf.split_at(start);
                let (body, tail) = rest.split_at(end - start);
                Self { head, body, tail }
            }
            None => Self {
                head: buf,
                body: &[],
                tail: &[],
            },
        }
    }
}

// ── SplittingFinder ──────────────────────────────────────────────────────────

/// A start finder and an end finder bound together into one splitting step.
#[derive(Clone, Copy)]
pub struct SplittingFinder {
    find_start: StartFinder,
    find_end: EndFinder,
}

impl SplittingFinder {
    pub const fn new(find_start: StartFinder, find_end: EndFinder) -> Self {
        Self {
            find_start,
            find_end,
        }
    }

    /// Locate the range enclosed by the two finders' matches.
    ///
    /// One scan for the start, one for the end from that start; if either
    /// fails the whole span is missing.
    pub fn find_range(&self, buf: &[u8]) -> Result<Option<Span>> {
        let Some(start) = (self.find_start)(buf)? else {
            return Ok(None);
        };
        Ok((self.find_end)(buf, start).map(|end| Span { start, end }))
    }

    /// Return the span size and the triplet the span cuts `buf` into.
    pub fn split<'a>(&self, buf: &'a [u8]) -> Result<(i64, SegmentTriplet<'a>)> {
        let span = self.find_range(buf)?;
        Ok((Span::size_of(span), SegmentTriplet::split(buf, span)))
    }
}

impl std::fmt::Debug for SplittingFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplittingFinder").finish_non_exhaustive()
    }
}

/// Splits a buffer around its PDF part.
pub const PDF_FINDER: SplittingFinder = SplittingFinder::new(markers::pdf_start, markers::pdf_end);

/// Splits a buffer around its script part.
pub const SCRIPT_FINDER: SplittingFinder =
    SplittingFinder::new(markers::script_start, markers::script_end);
