use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Current state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Videos are still being processed.
    Running,
    /// Every discovered video was attempted.
    Finished,
    /// The run was interrupted (Ctrl-C) before all videos were attempted.
    Interrupted,
    /// The run stopped on a fatal error (checkpoint or report write failure).
    Aborted,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Finished => write!(f, "Finished"),
            Self::Interrupted => write!(f, "Interrupted"),
            Self::Aborted => write!(f, "Aborted"),
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub discovered: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub frames_sampled: u64,
    pub frames_unavailable: u64,
    pub lines: u64,
}

impl RunSummary {
    pub fn attempted(&self) -> usize {
        self.completed + self.skipped + self.failed
    }
}

/// Status snapshot written beside the checkpoint file after every video and
/// read by `vidtext status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatus {
    pub state: RunState,
    pub summary: RunSummary,
    /// Last video the writer handled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_video: Option<String>,
    pub started_at: String,
    /// ISO-8601 timestamp of the last status update.
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

const STATUS_FILE_NAME: &str = ".vidtext-status.json";

/// Status file location for a given checkpoint file.
pub fn status_path(checkpoint: &Path) -> PathBuf {
    checkpoint
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.join(STATUS_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(STATUS_FILE_NAME))
}

impl RunStatus {
    pub fn new(discovered: usize) -> Self {
        let now = chrono::Local::now().to_rfc3339();
        Self {
            state: RunState::Running,
            summary: RunSummary {
                discovered,
                ..RunSummary::default()
            },
            last_video: None,
            started_at: now.clone(),
            updated_at: now,
            error_message: None,
        }
    }

    /// Write atomically: temp file then rename, so readers never see a
    /// half-written file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &content)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Returns `None` if the file doesn't exist or can't be parsed.
    pub fn read(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Local::now().to_rfc3339();
    }

    /// One-line summary for logs and `vidtext status`.
    pub fn summary_line(&self) -> String {
        let s = &self.summary;
        let base = format!(
            "{}: {}/{} attempted ({} completed, {} skipped, {} failed), {} frame(s) unavailable",
            self.state,
            s.attempted(),
            s.discovered,
            s.completed,
            s.skipped,
            s.failed,
            s.frames_unavailable
        );
        match (&self.state, &self.error_message) {
            (RunState::Aborted, Some(msg)) => format!("{} | error: {}", base, msg),
            _ => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_status_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(STATUS_FILE_NAME);
        let mut status = RunStatus::new(7);
        status.summary.completed = 3;
        status.summary.skipped = 2;
        status.summary.frames_unavailable = 4;
        status.last_video = Some("clip.mp4".to_string());

        status.write(&path).unwrap();
        let loaded = RunStatus::read(&path).unwrap();

        assert_eq!(loaded.state, RunState::Running);
        assert_eq!(loaded.summary, status.summary);
        assert_eq!(loaded.last_video.as_deref(), Some("clip.mp4"));
        assert!(!tmp.path().join(".vidtext-status.json.tmp").exists());
    }

    #[test]
    fn test_status_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        assert!(RunStatus::read(&tmp.path().join(STATUS_FILE_NAME)).is_none());
    }

    #[test]
    fn test_status_read_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(STATUS_FILE_NAME);
        std::fs::write(&path, "{\"state\": \"runn").unwrap();
        assert!(RunStatus::read(&path).is_none());
    }

    #[test]
    fn test_status_path_beside_checkpoint() {
        assert_eq!(
            status_path(Path::new("/var/lib/vidtext/done.txt")),
            PathBuf::from("/var/lib/vidtext/.vidtext-status.json")
        );
        assert_eq!(status_path(Path::new("done.txt")), PathBuf::from(".vidtext-status.json"));
    }

    #[test]
    fn test_summary_line() {
        let mut status = RunStatus::new(10);
        status.state = RunState::Aborted;
        status.summary.completed = 4;
        status.summary.failed = 1;
        status.error_message = Some("disk full".to_string());
        let line = status.summary_line();
        assert!(line.starts_with("Aborted: 5/10 attempted"));
        assert!(line.contains("1 failed"));
        assert!(line.contains("disk full"));
    }

    #[test]
    fn test_serde_state_values() {
        let json = serde_json::to_string(&RunState::Interrupted).unwrap();
        assert_eq!(json, "\"interrupted\"");
    }
}
