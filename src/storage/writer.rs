//! Delimited result files
//!
//! Every output gets a distinct, deterministic name, so concurrent writers
//! sharing one directory never touch the same file.

use crate::core::database::Database;
use crate::core::frame::Frame;
use crate::core::merger::MergeResult;
use crate::error::{WriteError, WriteErrorKind};
use chrono::{DateTime, TimeZone};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_OUTPUT_DELIMITER: u8 = b';';
pub const DEFAULT_EXTENSION: &str = "txt";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const COMBINED_STEM: &str = "BioRemPP_Combined_Results";

/// Decides output file names: `{stem}[_{timestamp}][_{suffix}].{ext}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPolicy {
    pub timestamp: Option<String>,
    pub suffix: Option<String>,
    pub extension: String,
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self {
            timestamp: None,
            suffix: None,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl NamingPolicy {
    pub fn new(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            extension: extension.trim_start_matches('.').to_string(),
            ..Self::default()
        }
    }

    /// Stamp every file of the run with the same moment.
    pub fn with_timestamp<Tz: TimeZone>(mut self, at: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        self.timestamp = Some(at.format(TIMESTAMP_FORMAT).to_string());
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.suffix = if suffix.is_empty() { None } else { Some(suffix) };
        self
    }

    pub fn file_name(&self, stem: &str) -> String {
        let mut name = stem.to_string();
        if let Some(ts) = &self.timestamp {
            name.push('_');
            name.push_str(ts);
        }
        if let Some(suffix) = &self.suffix {
            name.push('_');
            name.push_str(suffix);
        }
        if !self.extension.is_empty() {
            name.push('.');
            name.push_str(&self.extension);
        }
        name
    }

    pub fn database_file_name(&self, database: Database) -> String {
        self.file_name(&format!("{}_Results", database.display_name()))
    }

    pub fn combined_file_name(&self) -> String {
        self.file_name(COMBINED_STEM)
    }

    /// Caller-supplied parts must not smuggle in directories.
    fn check(&self, output_dir: &Path) -> Result<(), WriteError> {
        let parts = self.suffix.iter().chain(std::iter::once(&self.extension));
        for part in parts {
            if part.contains(|c| matches!(c, '/' | '\\' | '\0')) || part == ".." {
                return Err(WriteError::new(
                    WriteErrorKind::PathInvalid,
                    output_dir,
                    format!("file name component {:?} is not allowed", part),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ResultWriter {
    delimiter: u8,
}

impl Default for ResultWriter {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DELIMITER)
    }
}

impl ResultWriter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Write one database's result and record where it went.
    pub fn write(
        &self,
        result: &mut MergeResult,
        output_dir: &Path,
        naming: &NamingPolicy,
    ) -> Result<PathBuf, WriteError> {
        naming.check(output_dir)?;
        let path = output_dir.join(naming.database_file_name(result.database));
        self.write_to(&result.frame, output_dir, &path)?;
        result.output_path = Some(path.clone());
        Ok(path)
    }

    pub fn write_combined(
        &self,
        frame: &Frame,
        output_dir: &Path,
        naming: &NamingPolicy,
    ) -> Result<PathBuf, WriteError> {
        naming.check(output_dir)?;
        let path = output_dir.join(naming.combined_file_name());
        self.write_to(frame, output_dir, &path)?;
        Ok(path)
    }

    fn write_to(&self, frame: &Frame, output_dir: &Path, path: &Path) -> Result<(), WriteError> {
        if output_dir.exists() && !output_dir.is_dir() {
            return Err(WriteError::new(
                WriteErrorKind::PathInvalid,
                output_dir,
                "output location exists and is not a directory",
            ));
        }
        fs::create_dir_all(output_dir).map_err(|e| WriteError::from_io(output_dir, &e))?;

        // Rows go to a sibling file first; the result name only ever holds a
        // complete file.
        let partial = partial_path(path);
        let written = self.write_frame(frame, &partial).and_then(|()| {
            fs::rename(&partial, path).map_err(|e| WriteError::from_io(path, &e))
        });
        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_file(&partial) {
                debug!(path = %partial.display(), error = %cleanup, "partial file not removed");
            }
            return Err(err);
        }

        debug!(path = %path.display(), rows = frame.height(), "wrote result file");
        Ok(())
    }

    /// Header row of column names, then one line per row.
    pub fn write_frame(&self, frame: &Frame, path: &Path) -> Result<(), WriteError> {
        let file = File::create(path).map_err(|e| WriteError::from_io(path, &e))?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(BufWriter::new(file));

        writer
            .write_record(frame.names())
            .map_err(|e| WriteError::from_csv(path, e))?;
        for row in frame.rows() {
            writer
                .write_record(row.iter().map(|cell| cell.as_bytes()))
                .map_err(|e| WriteError::from_csv(path, e))?;
        }

        let mut inner = writer
            .into_inner()
            .map_err(|e| WriteError::from_io(path, e.error()))?;
        inner.flush().map_err(|e| WriteError::from_io(path, &e))?;
        Ok(())
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.partial", name))
}
