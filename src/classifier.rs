use crate::segmentation::{SegmentTriplet, PDF_FINDER, SCRIPT_FINDER};
use crate::ExtractError;
use std::fmt;

// ── Status ───────────────────────────────────────────────────────────────────

/// Which payload comes first in a container, or `Error` when the container
/// could not be classified or its script failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    PythonFirst,
    PdfFirst,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::PythonFirst => "PythonFirst",
            Status::PdfFirst => "PdfFirst",
            Status::Error => "Error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Parts ────────────────────────────────────────────────────────────────────

/// Five consecutive slices covering a whole container, in buffer order.
///
/// `first` and `second` are the two payloads; which one is the PDF depends on
/// the [`Status`] they were produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parts<'a> {
    pub head: &'a [u8],
    pub first: &'a [u8],
    pub body: &'a [u8],
    pub second: &'a [u8],
    pub tail: &'a [u8],
}

impl<'a> Parts<'a> {
    /// The five slices in buffer order.
    pub fn as_array(&self) -> [&'a [u8]; 5] {
        [self.head, self.first, self.body, self.second, self.tail]
    }
}

// ── Classification ───────────────────────────────────────────────────────────

/// Outcome of scanning one container.
#[derive(Debug)]
pub struct Classification<'a> {
    pub status: Status,

    /// Size of the PDF span; non-positive when no PDF was found.
    pub pdf_size: i64,

    /// Size of the script span; non-positive when no script was found.
    pub script_size: i64,

    /// The buffer cut around the PDF span. Always present, even on `Error`.
    pub pdf: SegmentTriplet<'a>,

    /// The five-way split; `None` when classification failed.
    pub parts: Option<Parts<'a>>,

    /// Why classification failed, when it did.
    pub error: Option<ExtractError>,
}

impl<'a> Classification<'a> {
    /// The PDF payload (empty when absent).
    pub fn pdf_body(&self) -> &'a [u8] {
        self.pdf.body
    }

    /// The script payload, or `None` when classification failed.
    pub fn script_body(&self) -> Option<&'a [u8]> {
        let parts = self.parts.as_ref()?;
        match self.status {
            Status::PythonFirst => Some(parts.first),
            Status::PdfFirst => Some(parts.second),
            Status::Error => None,
        }
    }

    /// Bytes preceding the first payload, or `None` when classification
    /// failed.
    pub fn head(&self) -> Option<&'a [u8]> {
        self.parts.as_ref().map(|p| p.head)
    }
}

/// Decide the payload order of `buf` and split it into five parts.
///
/// The region before the PDF is searched for the script first; only if no
/// script is found there is the region after the PDF searched. A script found
/// in neither place still yields [`Status::PdfFirst`], with a non-positive
/// script size.
pub fn classify(buf: &[u8]) -> Classification<'_> {
    let (pdf_size, pdf) = match PDF_FINDER.split(buf) {
        Ok(found) => found,
        // The PDF finders have no hard failure today.
        Err(e) => return failed(0, SegmentTriplet::split(buf, None), e),
    };

    let (script_size, script) = match SCRIPT_FINDER.split(pdf.head) {
        Ok(found) => found,
        Err(e) => return failed(pdf_size, pdf, e),
    };

    if script_size > 0 {
        log::debug!("script found before the PDF ({script_size} bytes)");
        return Classification {
            status: Status::PythonFirst,
            pdf_size,
            script_size,
            pdf,
            parts: Some(Parts {
                head: script.head,
                first: script.body,
                body: script.tail,
                second: pdf.body,
                tail: pdf.tail,
            }),
            error: None,
        };
    }

    let (script_size, script) = match SCRIPT_FINDER.split(pdf.tail) {
        Ok(found) => found,
        Err(e) => return failed(pdf_size, pdf, e),
    };
    log::debug!("script searched after the PDF ({script_size} bytes)");

    Classification {
        status: Status::PdfFirst,
        pdf_size,
        script_size,
        pdf,
        parts: Some(Parts {
            head: pdf.head,
            first: pdf.body,
            body: script.head,
            second: script.body,
            tail: script.tail,
        }),
        error: None,
    }
}

fn failed<'a>(pdf_size: i64, pdf: SegmentTriplet<'a>, error: ExtractError) -> Classification<'a> {
    Classification {
        status: Status::Error,
        pdf_size,
        script_size: 0,
        pdf,
        parts: None,
        error: Some(error),
    }
}
