// Extraction pipeline: bounded worker pool, one video per worker end-to-end,
// and a single writer thread owning the report and the checkpoint appends.
//
// Per-video states:
//   Discovered -> Fingerprinted -> (SkippedAlreadyDone | Processing) -> (Completed | Failed)

pub mod checkpoint;
pub mod runner;
pub mod status;
pub mod worker;
pub mod writer;

use crate::transcript::Transcript;
use crate::video::Video;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoState {
    Discovered,
    Fingerprinted,
    SkippedAlreadyDone,
    Processing,
    Completed,
    Failed,
}

impl VideoState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::SkippedAlreadyDone | Self::Completed | Self::Failed
        )
    }
}

/// What a worker hands to the writer for one video.
#[derive(Debug)]
pub enum VideoOutcome {
    Skipped {
        video: Video,
        fingerprint: String,
    },
    Transcribed {
        video: Video,
        fingerprint: String,
        transcript: Transcript,
        frames_sampled: u64,
        frames_unavailable: u64,
    },
    Failed {
        video: Video,
        error: String,
    },
}

impl VideoOutcome {
    pub fn video(&self) -> &Video {
        match self {
            Self::Skipped { video, .. }
            | Self::Transcribed { video, .. }
            | Self::Failed { video, .. } => video,
        }
    }

    /// Terminal state once the writer has handled this outcome.
    pub fn final_state(&self) -> VideoState {
        match self {
            Self::Skipped { .. } => VideoState::SkippedAlreadyDone,
            Self::Transcribed { .. } => VideoState::Completed,
            Self::Failed { .. } => VideoState::Failed,
        }
    }
}
