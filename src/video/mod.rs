pub mod discover;
pub mod fingerprint;
pub mod sampler;

use std::path::{Path, PathBuf};
use std::time::Duration;

/// A video file found by a folder scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    pub path: PathBuf,
}

impl Video {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name used to key report entries.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.to_string_lossy().to_string())
    }

    /// Name of the folder the video was found in.
    pub fn folder(&self) -> String {
        self.path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// One sampled still image. Dropped as soon as its OCR call finishes.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub timestamp: Duration,
    pub image: Vec<u8>,
}

impl Frame {
    pub fn new(index: u64, fps: f64, image: Vec<u8>) -> Self {
        Self {
            index,
            // Saturates for rates so small the timestamp overflows.
            timestamp: Duration::try_from_secs_f64(index as f64 / fps).unwrap_or(Duration::MAX),
            image,
        }
    }
}
