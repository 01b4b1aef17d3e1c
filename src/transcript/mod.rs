pub mod dedup;
pub mod sink;

use serde::{Deserialize, Serialize};

/// Deduplicated, ordered lines recognized in one video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub lines: Vec<String>,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

/// One report entry, written once per completed video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub video: String,
    pub folder: String,
    pub path: String,
    pub fingerprint: String,
    pub lines: Vec<String>,
    pub frames_sampled: u64,
    pub frames_unavailable: u64,
    pub completed_at: String,
}
