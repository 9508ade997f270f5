//! CLI tool splitting `.pkp` driver containers into their PDF and Python parts.
//!
//! For every input `name.pkp` it writes `name.pdf`, `name.py` and `name.head`
//! into the output directory, and one line of statistics per file into the
//! stats file.

use anyhow::{Context, Result};
use clap::Parser;
use pkpextract::{
    BatchRunner, ExtractorConfig, HeadConcatConfig, BROKEN_SCRIPT_EXT, DEFAULT_HEAD_SIZE,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "pkpextract", version)]
#[command(about = "Extract the PDF document and the Python script embedded in .pkp files.")]
struct Cli {
    /// Statistics file: one csv line per input, then a summary.
    #[arg(long, default_value = "pkpextract.stats.txt")]
    stats: PathBuf,

    /// Where to write the results.
    #[arg(long, default_value = "result")]
    outdir: PathBuf,

    /// Suppress the progress bar and everything but errors.
    #[arg(long)]
    quiet: bool,

    /// Write decompressed copies of the inputs.
    #[arg(long)]
    write_unzipped: bool,

    /// Don't generate the pdf file.
    #[arg(long)]
    nopdf: bool,

    /// Don't generate the python file.
    #[arg(long)]
    nopython: bool,

    /// Check the python part; only the failed ones are written, with the
    /// broken-script extension.
    #[arg(long)]
    check_python: bool,

    /// Don't generate the head file.
    #[arg(long)]
    nohead: bool,

    /// Group head files in subdirectories named after their `Version=` value.
    #[arg(long)]
    head_by_version: bool,

    /// Concatenate the first <HEADSIZE> bytes of every head into this file.
    #[arg(long)]
    head: Option<PathBuf>,

    /// Slot size used by --head.
    #[arg(long, default_value_t = DEFAULT_HEAD_SIZE)]
    headsize: usize,

    /// The .pkp files to process.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

impl Cli {
    fn config(&self) -> ExtractorConfig {
        ExtractorConfig {
            output_directory: self.outdir.clone(),
            write_unzipped: self.write_unzipped,
            write_pdf: !self.nopdf,
            write_script: !self.nopython,
            check_script: self.check_python,
            write_head: !self.nohead,
            head_by_version: self.head_by_version,
            head_concat: self.head.clone().map(|path| HeadConcatConfig {
                path,
                slot_size: self.headsize,
            }),
            quiet: self.quiet,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "error" } else { "warn" };
    env_logger::init_from_env(env_logger::Env::default().default_filter_or(default_filter));

    if let Err(e) = run(&cli) {
        log::error!("{e:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let stats_file = File::create(&cli.stats)
        .with_context(|| format!("creating stats file: {}", cli.stats.display()))?;

    let mut runner = BatchRunner::new(cli.config(), BufWriter::new(stats_file))
        .context("setting up the run")?;
    let report = runner.run(&cli.inputs).context("processing inputs")?;

    if !cli.quiet {
        println!(
            "{} file(s) processed, {} error(s), {} script(s) written as *{}",
            report.processed,
            report.errors,
            report.rejected.len(),
            BROKEN_SCRIPT_EXT
        );
        println!("statistics: {}", cli.stats.display());
    }

    Ok(())
}
