// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Output destinations for the JSON sink.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Target for standard stream output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdTarget {
    /// Write to standard output (stdout).
    Out,
    /// Write to standard error (stderr).
    Err,
}

/// Configuration for file-based output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfig {
    /// Path where log files will be written.
    pub path: PathBuf,
    /// Maximum size in bytes for each log file.
    /// Set to 0 to disable size-based rotation.
    pub max_size_bytes: u64,
    /// Maximum total number of files (current + rotated) to keep on disk.
    /// Set to 0 to disable file cleanup.
    pub max_files: u64,
}

/// Appends to a file, rotating it once it grows past a size limit.
///
/// Rotated files keep the stem and extension of the original path with the
/// rotation timestamp inserted in between (`app_2024-05-01_10-00-00.log`).
pub struct RotatingFileWriter {
    path: PathBuf,
    current_size: u64,
    max_size: u64,
    max_files: u64,
    current_file: fs::File,
}

impl RotatingFileWriter {
    /// Opens `config.path` in append mode, creating missing parent
    /// directories.
    pub fn new(config: &FileConfig) -> io::Result<Self> {
        let path = config.path.clone();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = Self::open(&path)?;
        let current_size = file.metadata()?.len();

        Ok(Self {
            path,
            current_size,
            max_size: config.max_size_bytes,
            max_files: config.max_files,
            current_file: file,
        })
    }

    fn open(path: &Path) -> io::Result<fs::File> {
        fs::OpenOptions::new().create(true).append(true).open(path)
    }

    fn timestamp() -> String {
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S%.3f").to_string()
    }

    fn stem_and_extension(&self) -> Option<(String, Option<String>)> {
        let stem = self.path.file_stem()?.to_string_lossy().into_owned();
        let ext = self
            .path
            .extension()
            .map(|e| e.to_string_lossy().into_owned());
        Some((stem, ext))
    }

    fn rotated_path(&self, timestamp: &str) -> PathBuf {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        match self.stem_and_extension() {
            Some((stem, Some(ext))) => parent.join(format!("{stem}_{timestamp}.{ext}")),
            Some((stem, None)) => parent.join(format!("{stem}_{timestamp}")),
            None => PathBuf::from(format!("{}_{timestamp}", self.path.display())),
        }
    }

    fn rotate_if_needed(&mut self) -> io::Result<()> {
        if self.max_size == 0 || self.current_size < self.max_size {
            return Ok(());
        }
        self.current_file.flush()?;
        fs::rename(&self.path, self.rotated_path(&Self::timestamp()))?;
        self.current_file = Self::open(&self.path)?;
        self.current_size = 0;
        if self.max_files > 0 {
            self.cleanup_old_files()?;
        }
        Ok(())
    }

    /// Deletes the oldest rotated files so that at most `max_files` files,
    /// the current one included, remain.
    fn cleanup_old_files(&self) -> io::Result<()> {
        let Some((stem, ext)) = self.stem_and_extension() else {
            return Ok(());
        };
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let prefix = format!("{stem}_");
        let suffix = ext.map(|e| format!(".{e}")).unwrap_or_default();

        let mut rotated: Vec<(PathBuf, String)> = fs::read_dir(parent)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let timestamp = name.strip_prefix(&prefix)?.strip_suffix(suffix.as_str())?;
                Some((entry.path(), timestamp.to_owned()))
            })
            .collect();

        // Newest first.
        rotated.sort_by(|(_, a), (_, b)| b.cmp(a));

        let keep = usize::try_from(self.max_files.saturating_sub(1)).unwrap_or(usize::MAX);
        let failures: Vec<String> = rotated
            .iter()
            .skip(keep)
            .filter_map(|(path, _)| {
                fs::remove_file(path)
                    .err()
                    .map(|e| format!("{}: {e}", path.display()))
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "Failed to remove old log files: {}",
                failures.join(", ")
            )))
        }
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.rotate_if_needed()?;
        let written = self.current_file.write(buf)?;
        self.current_size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.current_file.flush()
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.rotate_if_needed()?;
        self.current_file.write_all(buf)?;
        self.current_size += buf.len() as u64;
        Ok(())
    }
}

/// A writer that writes log output to standard output or standard error.
pub struct StdWriter {
    target: StdTarget,
}

impl StdWriter {
    /// A writer for `target`.
    pub fn new(target: StdTarget) -> Self {
        Self { target }
    }
}

impl Write for StdWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.target {
            StdTarget::Out => io::stdout().write(buf),
            StdTarget::Err => io::stderr().write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        // Lock once so a line is never interleaved with other writers.
        match self.target {
            StdTarget::Out => io::stdout().lock().write_all(buf),
            StdTarget::Err => io::stderr().lock().write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.target {
            StdTarget::Out => io::stdout().flush(),
            StdTarget::Err => io::stderr().flush(),
        }
    }
}
