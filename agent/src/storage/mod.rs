//! Result sinks
//!
//! A sink writes one record per destination, replacing whatever the file
//! held before. The collector picks the files up after the run.

use crate::config::ResultFormat;
use records::ResultRecord;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Durable destination for a test's record
pub trait ResultSink {
    /// Overwrite `path` with `record`
    fn write(&self, path: &Path, record: &ResultRecord) -> Result<(), SinkError>;
}

/// Sink for the configured result format
pub fn sink_for(format: ResultFormat) -> Box<dyn ResultSink> {
    match format {
        ResultFormat::Json => Box::new(JsonFileSink),
        ResultFormat::Csv => Box::new(CsvFileSink),
    }
}

/// One JSON object keyed by field name, keys in column order
#[derive(Debug, Default)]
pub struct JsonFileSink;

impl ResultSink for JsonFileSink {
    fn write(&self, path: &Path, record: &ResultRecord) -> Result<(), SinkError> {
        let contents = serde_json::to_vec(record.values())?;

        std::fs::write(path, contents).map_err(|source| SinkError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Header row plus a single data row
#[derive(Debug, Default)]
pub struct CsvFileSink;

impl ResultSink for CsvFileSink {
    fn write(&self, path: &Path, record: &ResultRecord) -> Result<(), SinkError> {
        // Build in memory so a failure never leaves a half-written file
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(record.fields())?;
        writer.write_record(record.fields().iter().map(|f| cell(record.get(f))))?;

        let contents = writer
            .into_inner()
            .map_err(|e| SinkError::Io {
                path: path.display().to_string(),
                source: e.into_error(),
            })?;

        std::fs::write(path, contents).map_err(|source| SinkError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
