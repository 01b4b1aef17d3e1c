// Error taxonomy for the extraction pipeline.
//
// Frame-level errors (`OcrError`, `RecognitionUnavailable`) never abort a video.
// Video-level errors (`VideoError`) never abort a run. `CheckpointError` and
// `SinkError` stop the run.

use std::path::PathBuf;

use thiserror::Error;

/// A video could not be fingerprinted or sampled.
#[derive(Error, Debug)]
pub enum VideoError {
    /// The container could not be opened, decoded, or yielded no frames.
    #[error("unreadable video {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VideoError {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Unreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// One failed attempt against the OCR service. Always retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OcrError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("service returned HTTP {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Every attempt for one frame failed. The frame is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("recognition unavailable after {attempts} attempt(s): {last}")]
pub struct RecognitionUnavailable {
    pub attempts: u32,
    pub last: OcrError,
}

/// The checkpoint file could not be read or appended. Fatal to the run.
#[derive(Error, Debug)]
#[error("checkpoint write failure on {path}: {source}")]
pub struct CheckpointError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// A transcript could not be persisted. Fatal to the run, since the
/// checkpoint must never be written for an unpersisted transcript.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode transcript record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Fatal errors that stop a run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("result writer thread panicked")]
    WriterPanicked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_message_includes_cause() {
        let err = RecognitionUnavailable {
            attempts: 3,
            last: OcrError::Status(503),
        };
        let msg = err.to_string();
        assert!(msg.contains("3 attempt"));
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn test_unreadable_message_includes_path() {
        let err = VideoError::unreadable("/videos/a.mp4", "ffmpeg exited with status 1");
        let msg = err.to_string();
        assert!(msg.contains("/videos/a.mp4"));
        assert!(msg.contains("status 1"));
    }
}
