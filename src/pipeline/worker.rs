use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::VideoError;
use crate::ocr::client::OcrClient;
use crate::pipeline::checkpoint::CheckpointStore;
use crate::pipeline::{VideoOutcome, VideoState};
use crate::transcript::dedup::Deduplicator;
use crate::video::fingerprint::fingerprint_file;
use crate::video::sampler::FrameSource;
use crate::video::Video;

/// Everything a worker needs, shared read-only across the pool.
pub struct WorkerContext {
    pub sampler: Arc<dyn FrameSource>,
    pub ocr: Arc<OcrClient>,
    pub checkpoint: Arc<RwLock<CheckpointStore>>,
    pub fps: f64,
    pub similarity_threshold: f64,
}

impl WorkerContext {
    fn is_done(&self, fingerprint: &str) -> bool {
        self.checkpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_done(fingerprint)
    }
}

/// Run one video through fingerprint -> sample -> OCR -> dedup. Never fails:
/// errors become `VideoOutcome::Failed`.
pub fn process_video(video: Video, ctx: &WorkerContext) -> VideoOutcome {
    let mut state = VideoState::Discovered;
    tracing::trace!("{}: {:?}", video.path.display(), state);

    let fingerprint = match fingerprint_file(&video.path) {
        Ok(fp) => fp,
        Err(e) => return failed(video, state, e),
    };
    state = VideoState::Fingerprinted;
    tracing::trace!("{}: {:?} {}", video.path.display(), state, fingerprint);

    if ctx.is_done(&fingerprint) {
        tracing::debug!("Skipping already processed video: {}", video.path.display());
        return VideoOutcome::Skipped { video, fingerprint };
    }

    state = VideoState::Processing;
    tracing::info!("Processing: {}", video.path.display());

    let frames = match ctx.sampler.frames(&video.path, ctx.fps) {
        Ok(frames) => frames,
        Err(e) => return failed(video, state, e),
    };

    let name = video.name();
    let mut dedup = Deduplicator::new(ctx.similarity_threshold);
    let mut frames_sampled = 0u64;
    let mut frames_unavailable = 0u64;

    for frame in frames {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => return failed(video, state, e),
        };
        frames_sampled += 1;

        let recognition = ctx.ocr.recognize_frame(&name, &frame);
        if recognition.unavailable.is_some() {
            frames_unavailable += 1;
        }
        dedup.offer_all(&recognition.candidates);
    }

    let transcript = dedup.finish();
    tracing::info!(
        "Extracted {} line(s) from {} ({} frame(s), {} unavailable)",
        transcript.len(),
        name,
        frames_sampled,
        frames_unavailable
    );

    VideoOutcome::Transcribed {
        video,
        fingerprint,
        transcript,
        frames_sampled,
        frames_unavailable,
    }
}

/// `process_video`, with a panic in the sampler or OCR backend turned into
/// `VideoOutcome::Failed` so the worker keeps pulling videos.
pub fn process_video_guarded(video: Video, ctx: &WorkerContext) -> VideoOutcome {
    let path = video.path.clone();
    match std::panic::catch_unwind(AssertUnwindSafe(|| process_video(video, ctx))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("Failed to process {}: worker panicked: {}", path.display(), detail);
            VideoOutcome::Failed {
                video: Video::new(path),
                error: format!("worker panicked: {}", detail),
            }
        }
    }
}

fn failed(video: Video, state: VideoState, error: VideoError) -> VideoOutcome {
    tracing::error!(
        "Failed to process {} (while {:?}): {}",
        video.path.display(),
        state,
        error
    );
    VideoOutcome::Failed {
        video,
        error: error.to_string(),
    }
}
