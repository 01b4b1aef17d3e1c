// Result persistence. Only the pipeline's writer thread holds a sink.
//
// Every write is flushed and synced before returning, so a checkpoint written
// after it never refers to a transcript that could be lost.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::ReportFormat;
use crate::error::SinkError;
use crate::transcript::TranscriptRecord;

pub trait ResultSink: Send {
    fn write(&mut self, record: &TranscriptRecord) -> Result<(), SinkError>;
}

/// Open the report at `path` in the requested format, creating parent dirs.
pub fn open_sink(path: &Path, format: ReportFormat) -> Result<Box<dyn ResultSink>, SinkError> {
    let file = open_append(path)?;
    let path = path.to_path_buf();
    Ok(match format {
        ReportFormat::Jsonl => Box::new(JsonlSink { path, file }),
        ReportFormat::Text => Box::new(TextReportSink { path, file }),
    })
}

fn open_append(path: &Path) -> Result<File, SinkError> {
    let io_err = |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)
}

fn write_synced(file: &mut File, path: &Path, content: &[u8]) -> Result<(), SinkError> {
    let io_err = |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    };
    file.write_all(content).map_err(io_err)?;
    file.flush().map_err(io_err)?;
    file.sync_data().map_err(io_err)
}

/// One JSON object per line.
pub struct JsonlSink {
    path: PathBuf,
    file: File,
}

impl ResultSink for JsonlSink {
    fn write(&mut self, record: &TranscriptRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        write_synced(&mut self.file, &self.path, line.as_bytes())
    }
}

/// Plain-text report: a header per video, one transcript line per line, and
/// a blank separator.
pub struct TextReportSink {
    path: PathBuf,
    file: File,
}

impl ResultSink for TextReportSink {
    fn write(&mut self, record: &TranscriptRecord) -> Result<(), SinkError> {
        let mut block = format!("Results for {}:\n", record.video);
        for line in &record.lines {
            block.push_str(line);
            block.push('\n');
        }
        block.push('\n');
        write_synced(&mut self.file, &self.path, block.as_bytes())
    }
}
