use super::MetricsSink;
use crate::error::SinkError;
use crate::io;
use crate::row::{DateFormat, MetricsRow, HEADER};
use std::path::{Path, PathBuf};

/// Appends rows to a flat CSV file, writing the 14-column header once when
/// the file is new or empty.
#[derive(Debug, Clone)]
pub struct LocalFileSink {
    path: PathBuf,
    date_format: DateFormat,
}

impl LocalFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            date_format: DateFormat::default(),
        }
    }

    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.date_format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetricsSink for LocalFileSink {
    fn name(&self) -> &'static str {
        "local"
    }

    fn date_format(&self) -> DateFormat {
        self.date_format
    }

    fn try_append(&self, row: &MetricsRow) -> Result<(), SinkError> {
        let (file, fresh) = io::open_append(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);
        if fresh {
            tracing::debug!(path = %self.path.display(), "writing metrics header");
            writer.write_record(HEADER)?;
        }
        writer.write_record(row.to_strings(self.date_format))?;
        writer.flush()?;
        Ok(())
    }
}
