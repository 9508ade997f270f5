use crate::head::{version_bucket, HeadConcat};
use crate::output::{OutputWriter, BROKEN_SCRIPT_EXT};
use crate::stats::{write_record, RunSummary, StatRow, StatsAggregator};
use crate::{
    classify, read_container, Classification, ExtractorConfig, HeadConcatConfig, Result, ScriptValidator,
    Status,
};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub status: Status,
    pub row: StatRow,
}

/// Totals returned at the end of [`BatchRunner::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub processed: usize,
    pub errors: usize,
    /// Validation diagnostics, in processing order.
    pub rejected: Vec<String>,
    pub summary: Option<RunSummary>,
}

// Sizes and status of one buffer, before timing is known.
struct BufOutcome {
    status: Status,
    pdf_size: i64,
    script_size: i64,
}

// ── BatchRunner ──────────────────────────────────────────────────────────────

/// Owns everything that lives for a whole run: configuration, output writer,
/// statistics sink and rows, the optional head concatenation, and the
/// diagnostics of rejected scripts.
///
/// Files are processed one at a time, in order. An error that concerns a
/// single container is logged and recorded as [`Status::Error`]; only errors on
/// the run-wide sinks stop the run.
pub struct BatchRunner<S: Write> {
    config: ExtractorConfig,
    writer: OutputWriter,
    stats_sink: S,
    stats: StatsAggregator,
    head_concat: Option<HeadConcat<Box<dyn Write>>>,
    rejected: Vec<String>,
    errors: usize,
}

impl<S: Write> BatchRunner<S> {
    /// Create a runner writing statistics to `stats_sink`.
    ///
    /// When [`ExtractorConfig::head_concat`] is set its file is created here.
    pub fn new(config: ExtractorConfig, stats_sink: S) -> Result<Self> {
        config.validate()?;

        let head_concat = match &config.head_concat {
            Some(HeadConcatConfig { path, slot_size }) => {
                if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    std::fs::create_dir_all(dir)?;
                }
                let sink: Box<dyn Write> = Box::new(BufWriter::new(File::create(path)?));
                Some(HeadConcat::new(sink, *slot_size))
            }
            None => None,
        };

        Ok(Self {
            writer: OutputWriter::new(config.output_directory.clone()),
            config,
            stats_sink,
            stats: StatsAggregator::new(),
            head_concat,
            rejected: Vec::new(),
            errors: 0,
        })
    }

    /// Send the head concatenation to `sink` instead of a file.
    pub fn with_head_sink(mut self, sink: Box<dyn Write>, slot_size: usize) -> Self {
        self.head_concat = Some(HeadConcat::new(sink, slot_size));
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    pub fn into_stats_sink(self) -> S {
        self.stats_sink
    }

    // ── Run ───────────────────────────────────────────────────────────────────

    /// Process every input in order, then write the summary.
    pub fn run<P: AsRef<Path>>(&mut self, inputs: &[P]) -> Result<RunReport> {
        let target = if self.config.quiet {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };
        let style = ProgressStyle::with_template("[{bar:60}] {percent:>3}% {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        let progress =
            ProgressBar::with_draw_target(Some(inputs.len() as u64), target).with_style(style);

        for path in inputs {
            let path = path.as_ref();
            progress.set_message(path.display().to_string());
            let outcome = self.process_file(path)?;
            log::debug!("{}: {} in {:?}", path.display(), outcome.status, outcome.row.elapsed);
            progress.inc(1);
        }
        progress.finish_and_clear();

        self.finish()
    }

    /// Write the summary and flush the run-wide sinks.
    pub fn finish(&mut self) -> Result<RunReport> {
        self.stats.write_summary(&mut self.stats_sink)?;
        self.stats_sink.flush()?;
        if let Some(head) = self.head_concat.as_mut() {
            head.flush()?;
        }

        let summary = self.stats.summary();
        if let Some(s) = &summary {
            log::info!(
                "{} file(s), {} error(s), {} bytes unzipped",
                s.count,
                self.errors,
                s.total_buf_len
            );
        }

        Ok(RunReport {
            processed: self.stats.len(),
            errors: self.errors,
            rejected: self.rejected.clone(),
            summary,
        })
    }

    // ── Per file ──────────────────────────────────────────────────────────────

    /// Decompress and process one container, then record its statistics.
    ///
    /// Returns `Err` only when a run-wide sink fails.
    pub fn process_file(&mut self, path: &Path) -> Result<FileOutcome> {
        let name = path.display().to_string();
        let started = Instant::now();

        let (buf_len, decompressed, found) = match read_container(path) {
            Ok(buf) => (buf.len(), true, self.process_buf(&name, &buf)?),
            Err(e) => {
                log::warn!("{e}");
                self.write_head_slot(None)?;
                let none = BufOutcome {
                    status: Status::Error,
                    pdf_size: 0,
                    script_size: 0,
                };
                (0, false, none)
            }
        };

        let row = StatRow {
            buf_len,
            pdf_size: found.pdf_size,
            script_size: found.script_size,
            elapsed: started.elapsed(),
            decompressed,
        };
        self.record(&name, found.status, row.clone())?;

        Ok(FileOutcome {
            status: found.status,
            row,
        })
    }

    /// Record the statistics of a file processed outside
    /// [`process_file`](Self::process_file).
    pub fn record(&mut self, name: &str, status: Status, row: StatRow) -> Result<()> {
        if status == Status::Error {
            self.errors += 1;
        }
        write_record(&mut self.stats_sink, name, status, &row)?;
        self.stats.push(name, row);
        Ok(())
    }

    /// Classify one decompressed buffer and write its parts.
    fn process_buf(&mut self, name: &str, buf: &[u8]) -> Result<BufOutcome> {
        let found = classify(buf);
        self.write_head_slot(found.head())?;

        let mut outcome = BufOutcome {
            status: found.status,
            pdf_size: found.pdf_size,
            script_size: found.script_size,
        };

        if let Some(e) = &found.error {
            log::warn!("{name}: {e}");
        }

        match self.write_parts(name, buf, &found) {
            Ok(true) => {}
            Ok(false) => outcome.status = Status::Error,
            Err(e) if e.is_per_file() => {
                log::warn!("{name}: {e}");
                outcome.status = Status::Error;
            }
            Err(e) => return Err(e),
        }

        Ok(outcome)
    }

    /// Write the configured outputs.
    ///
    /// `Ok(false)` when the script was rejected or the `.head` file could not
    /// be written; the script step runs either way.
    fn write_parts(
        &mut self,
        name: &str,
        buf: &[u8],
        found: &Classification<'_>,
    ) -> Result<bool> {
        if self.config.write_unzipped {
            self.writer.write(name, ".unzipped", buf)?;
        }
        if self.config.write_pdf && found.pdf_size > 0 {
            self.writer.write(name, ".pdf", found.pdf_body())?;
        }

        let mut complete = true;
        if self.config.write_head {
            if let Some(head) = found.head() {
                match self.write_head(name, head) {
                    Ok(_) => {}
                    Err(e) if e.is_per_file() => {
                        log::warn!("{name}: {e}");
                        complete = false;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(self.check_script(name, found)? && complete)
    }

    fn write_head(&self, name: &str, head: &[u8]) -> Result<PathBuf> {
        if self.config.head_by_version {
            self.writer.write_in(&version_bucket(head), name, ".head", head)
        } else {
            self.writer.write(name, ".head", head)
        }
    }

    /// Validate the script and write it; `Ok(false)` when it was rejected.
    fn check_script(&mut self, name: &str, found: &Classification<'_>) -> Result<bool> {
        let Some(script) = found.script_body() else {
            return Ok(true);
        };
        if found.script_size <= 0 || !self.config.validates_script() {
            return Ok(true);
        }

        let label = format!("{name}.py");
        match ScriptValidator::new(script, &label).validate() {
            Ok(()) => {
                if self.config.writes_valid_script() {
                    self.writer.write(name, ".py", script)?;
                }
                Ok(true)
            }
            Err(failure) => {
                log::warn!("{failure}");
                self.rejected.push(failure.message);
                self.writer.write(name, BROKEN_SCRIPT_EXT, script)?;
                Ok(false)
            }
        }
    }

    fn write_head_slot(&mut self, head: Option<&[u8]>) -> Result<()> {
        match self.head_concat.as_mut() {
            Some(concat) => concat.write_slot(head),
            None => Ok(()),
        }
    }
}
