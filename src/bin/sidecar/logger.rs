use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use sidecar_dump::{MoveInfo, RelocationReport, SearchStats, SidecarError};

use crate::config::Config;

/// Simple file logger for relocation runs with buffered writes
pub struct FileLogger {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl FileLogger {
    /// Create a new file logger, writing to ~/logs/sidecar-dump/dump_<timestamp>.log
    pub(crate) fn new() -> Result<Self> {
        let log_dir = sidecar_dump::config::LOG_DIR
            .as_deref()
            .context("Failed to get home directory")?;
        Self::in_directory(log_dir)
    }

    /// Create a timestamped log file in the given directory.
    pub(crate) fn in_directory(log_dir: &Path) -> Result<Self> {
        if !log_dir.exists() {
            fs::create_dir_all(log_dir).context("Failed to create log directory")?;
        }

        let path = log_dir.join(format!("dump_{}.log", Local::now().format("%Y-%m-%d_%H-%M-%S")));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;

        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn timestamp() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Log the search parameters and results before moving anything
    pub(crate) fn log_init(&mut self, root: &Path, dump_root: &Path, config: &Config, stats: &SearchStats) {
        let _ = writeln!(self.writer, "[{}] INIT \"{}\"", Self::timestamp(), root.display());
        let _ = writeln!(self.writer, "  dump_root: {}", dump_root.display());
        let _ = writeln!(self.writer, "  raw_suffix: {}", config.raw_suffix);
        let _ = writeln!(self.writer, "  sidecar_suffix: {}", config.sidecar_suffix);
        let _ = writeln!(self.writer, "  check_time: {}", config.check_time);
        let _ = writeln!(self.writer, "  hidden: {}", config.hidden);
        let _ = writeln!(self.writer, "  raw_files: {}", stats.raw_files);
        let _ = writeln!(self.writer, "  sidecar_files: {}", stats.sidecar_files);
        let _ = writeln!(self.writer, "  total_size: {}", stats.total_size);
        let _ = self.writer.flush();
    }

    pub(crate) fn log_move(&mut self, info: &MoveInfo) {
        let _ = writeln!(
            self.writer,
            "[{}] MOVE \"{}\" -> \"{}\"",
            Self::timestamp(),
            info.source.display(),
            info.target.display()
        );
    }

    pub(crate) fn log_error(&mut self, error: &SidecarError) {
        let _ = writeln!(self.writer, "[{}] ERROR {error}", Self::timestamp());
        let _ = self.writer.flush();
    }

    pub(crate) fn log_summary(&mut self, report: &RelocationReport) {
        let _ = writeln!(
            self.writer,
            "[{}] DONE moved {} file(s) from {} directories to \"{}\"",
            Self::timestamp(),
            report.moved_files,
            report.directories,
            report.dump_root.display()
        );
        let _ = self.writer.flush();
    }
}

impl Drop for FileLogger {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
