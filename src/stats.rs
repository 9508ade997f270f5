use crate::Status;
use std::io::{self, Write};
use std::time::Duration;

/// Width of the `=` line separating per-file records from the summary.
pub const SEPARATOR_WIDTH: usize = 60;

// ── StatRow ──────────────────────────────────────────────────────────────────

/// Metrics kept for one processed container.
#[derive(Debug, Clone, PartialEq)]
pub struct StatRow {
    pub buf_len: usize,
    pub pdf_size: i64,
    pub script_size: i64,
    pub elapsed: Duration,

    /// `false` when the file could not be read or decompressed; its `buf_len`
    /// is then 0 and says nothing about the container.
    pub decompressed: bool,
}

// ── RunSummary ───────────────────────────────────────────────────────────────

/// Aggregates over the rows of a run.
///
/// `count` covers every file; the size figures only cover the files that were
/// decompressed, so they are `None` and 0 when none was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub count: usize,
    pub max_buf_len: Option<(usize, String)>,
    pub min_buf_len: Option<(usize, String)>,
    pub total_buf_len: u64,
    pub average_buf_len: u64,
}

// ── StatsAggregator ──────────────────────────────────────────────────────────

/// Append-only list of per-file rows, in processing order.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    rows: Vec<(String, StatRow)>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filename: &str, row: StatRow) {
        self.rows.push((filename.to_string(), row));
    }

    pub fn rows(&self) -> &[(String, StatRow)] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `None` when no file was processed. Ties keep the earliest file.
    pub fn summary(&self) -> Option<RunSummary> {
        if self.rows.is_empty() {
            return None;
        }

        let mut max: Option<(usize, &str)> = None;
        let mut min: Option<(usize, &str)> = None;
        let mut total = 0u64;
        let mut sized = 0u64;
        for (name, row) in self.rows.iter().filter(|(_, r)| r.decompressed) {
            total += row.buf_len as u64;
            sized += 1;
            if max.map_or(true, |(len, _)| row.buf_len > len) {
                max = Some((row.buf_len, name.as_str()));
            }
            if min.map_or(true, |(len, _)| row.buf_len < len) {
                min = Some((row.buf_len, name.as_str()));
            }
        }

        let owned = |(len, name): (usize, &str)| (len, name.to_string());
        Some(RunSummary {
            count: self.rows.len(),
            max_buf_len: max.map(owned),
            min_buf_len: min.map(owned),
            total_buf_len: total,
            average_buf_len: if sized == 0 { 0 } else { total / sized },
        })
    }

    /// Write the separator, then the summary lines if any file was processed.
    ///
    /// The max and min lines are left out when no file could be decompressed.
    pub fn write_summary<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        writeln!(sink, "{}", "=".repeat(SEPARATOR_WIDTH))?;
        let Some(s) = self.summary() else {
            return Ok(());
        };
        writeln!(sink, "number of files = {}", s.count)?;
        if let Some((len, name)) = &s.max_buf_len {
            writeln!(sink, "max bufLen = {} in {name}", group_digits(*len as u64))?;
        }
        if let Some((len, name)) = &s.min_buf_len {
            writeln!(sink, "min bufLen = {} in {name}", group_digits(*len as u64))?;
        }
        writeln!(sink, "total unzipped size = {}", group_digits(s.total_buf_len))?;
        writeln!(sink, "average unzipped size = {}", group_digits(s.average_buf_len))
    }
}

/// One statistics line: `filename,bufLen,status,pdfSize,scriptSize,elapsed`.
pub fn write_record<W: Write>(
    sink: &mut W,
    filename: &str,
    status: Status,
    row: &StatRow,
) -> io::Result<()> {
    writeln!(
        sink,
        "{},{},{},{},{},{:.5}",
        filename,
        row.buf_len,
        status,
        row.pdf_size,
        row.script_size,
        row.elapsed.as_secs_f64()
    )
}

/// `1234567` → `1_234_567`.
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('_');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::group_digits;

    #[test]
    fn groups_thousands_with_underscores() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1_000");
        assert_eq!(group_digits(1234567), "1_234_567");
    }
}
