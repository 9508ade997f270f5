//! # pkpextract
//!
//! Split the decompressed content of a `.pkp` driver container into the PDF
//! document and the Python script embedded in it.
//!
//! ## What this crate does
//!
//! 1. **Locate payloads**: scan the raw bytes for the PDF markers (`%PDF-` up to
//!    the second `%%EOF`) and the script markers (an `import` statement up to
//!    the first `0x01` byte).
//! 2. **Classify the layout**: decide whether the script precedes the PDF or
//!    follows it, and cut the container into five consecutive parts.
//! 3. **Validate the script**: parse the extracted script as Python source.
//! 4. **Batch processing**: decompress a list of containers, write the parts,
//!    and keep per-file statistics with a summary at the end of the run.
//!
//! ## Quick example
//!
//! ```
//! use pkpextract::{classify, Status};
//!
//! let mut buf = b"x".repeat(30);
//! buf.extend_from_slice(b"import os\nprint(os.name)\n\x01");
//! buf.extend_from_slice(b"%PDF-1.4 ... %%EOF ... %%EOF trailer");
//!
//! let found = classify(&buf);
//! assert_eq!(found.status, Status::PythonFirst);
//! assert!(found.script_size > 0);
//! assert!(found.pdf_size > 0);
//! ```

use std::path::PathBuf;
use thiserror::Error;

mod classifier;
mod container;
mod head;
pub mod markers;
mod output;
mod runner;
mod segmentation;
mod stats;
mod validator;

pub use classifier::{classify, Classification, Parts, Status};
pub use container::read_container;
pub use head::{version_bucket, version_token, HeadConcat, MAX_VERSION_LEN, UNKNOWN_VERSION};
pub use output::{OutputWriter, BROKEN_SCRIPT_EXT};
pub use runner::{BatchRunner, FileOutcome, RunReport};
pub use segmentation::{SegmentTriplet, Span, SplittingFinder, PDF_FINDER, SCRIPT_FINDER};
pub use stats::{RunSummary, StatRow, StatsAggregator, SEPARATOR_WIDTH};
pub use validator::{FailureKind, ScriptValidator, ValidationFailure};

// ── Configuration ────────────────────────────────────────────────────────────

/// Default size of one slot in the head concatenation output.
pub const DEFAULT_HEAD_SIZE: usize = 8 * 1024;

/// Where and how wide the concatenated head output is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadConcatConfig {
    /// File receiving one slot per processed container.
    pub path: PathBuf,

    /// Size of each slot; heads are zero-padded or truncated to it.
    pub slot_size: usize,
}

/// Runtime configuration for [`BatchRunner`].
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Root directory for every file the run writes.
    pub output_directory: PathBuf,

    /// Write the decompressed container as `<stem>.unzipped`.
    pub write_unzipped: bool,

    /// Write the PDF part as `<stem>.pdf`.
    pub write_pdf: bool,

    /// Write the script part as `<stem>.py` once it validates.
    pub write_script: bool,

    /// Validate the script part without writing the valid ones.
    ///
    /// Takes precedence over `write_script`; scripts that fail validation are
    /// still written with [`BROKEN_SCRIPT_EXT`].
    pub check_script: bool,

    /// Write the bytes preceding the first payload as `<stem>.head`.
    pub write_head: bool,

    /// Put each `.head` file under a subdirectory named after the
    /// `Version=<value>,` token found in it.
    pub head_by_version: bool,

    /// Concatenate fixed-size heads of every container into one file.
    pub head_concat: Option<HeadConcatConfig>,

    /// Hide the progress bar and only report errors.
    pub quiet: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("result"),
            write_unzipped: false,
            write_pdf: true,
            write_script: true,
            check_script: false,
            write_head: true,
            head_by_version: false,
            head_concat: None,
            quiet: false,
        }
    }
}

impl ExtractorConfig {
    /// `true` when the script part has to go through [`ScriptValidator`].
    pub fn validates_script(&self) -> bool {
        self.write_script || self.check_script
    }

    /// `true` when valid scripts are written as `<stem>.py`.
    pub fn writes_valid_script(&self) -> bool {
        self.write_script && !self.check_script
    }

    /// Reject settings the runner cannot honour.
    pub fn validate(&self) -> Result<()> {
        if let Some(head) = &self.head_concat {
            if head.slot_size == 0 {
                return Err(ExtractError::InvalidConfig(
                    "head slot size must be greater than zero".into(),
                ));
            }
        }
        Ok(())
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

/// Every error that this crate can produce.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// A filesystem I/O error occurred outside of a single container's scope
    /// (stats sink, head concatenation sink).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The input file could not be read or is not a valid gzip stream.
    #[error("cannot decompress '{}': {source}", .path.display())]
    Decompression {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An `import ` literal sits so close to the start of the scanned region
    /// that the script-start look-back cannot run.
    #[error("malformed container: 'import ' found at offset {offset}, inside the look-back window")]
    MalformedContainer { offset: usize },

    /// Writing one of the output files failed.
    #[error("cannot write '{}': {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration cannot be used for a run.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ExtractError {
    /// `true` for errors that only concern one container and must not stop
    /// the batch.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            ExtractError::Decompression { .. }
                | ExtractError::MalformedContainer { .. }
                | ExtractError::Output { .. }
        )
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ExtractError>;
