use crate::{ExtractError, Result};
use std::path::{Path, PathBuf};

/// Suffix of scripts that failed validation, kept for offline inspection.
pub const BROKEN_SCRIPT_EXT: &str = ".with-errors.py";

// ── OutputWriter ─────────────────────────────────────────────────────────────

/// Writes the parts of a container under one output root.
///
/// Every file is named after the input's stem plus a suffix, so
/// `drivers/hp1020.pkp` with suffix `.pdf` becomes `<root>/hp1020.pdf`.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<stem of name><suffix>`.
    pub fn out_path(&self, name: &str, suffix: &str) -> PathBuf {
        self.root.join(file_stem(name) + suffix)
    }

    /// `<root>/<subdir>/<stem of name><suffix>`.
    pub fn out_path_in(&self, subdir: &str, name: &str, suffix: &str) -> PathBuf {
        self.root.join(subdir).join(file_stem(name) + suffix)
    }

    /// Write `data` to [`out_path`](Self::out_path), creating the directories
    /// if necessary.
    ///
    /// ```
    /// # let dir = tempfile::tempdir().unwrap();
    /// use pkpextract::OutputWriter;
    ///
    /// let writer = OutputWriter::new(dir.path().join("out"));
    /// let path = writer.write("in/driver.pkp", ".pdf", b"%PDF-").unwrap();
    /// assert!(path.ends_with("out/driver.pdf"));
    /// ```
    pub fn write(&self, name: &str, suffix: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.out_path(name, suffix);
        write_creating_dirs(&path, data)?;
        Ok(path)
    }

    /// Same as [`write`](Self::write), inside `subdir` of the root.
    pub fn write_in(&self, subdir: &str, name: &str, suffix: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.out_path_in(subdir, name, suffix);
        write_creating_dirs(&path, data)?;
        Ok(path)
    }
}

fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

fn write_creating_dirs(path: &Path, data: &[u8]) -> Result<()> {
    let wrap = |source| ExtractError::Output {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(wrap)?;
    }
    std::fs::write(path, data).map_err(wrap)
}
