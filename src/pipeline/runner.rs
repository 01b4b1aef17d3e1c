use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};

use crate::config::Config;
use crate::error::RunError;
use crate::ocr::client::{OcrClient, RetryPolicy};
use crate::ocr::umi::UmiOcrBackend;
use crate::pipeline::checkpoint::CheckpointStore;
use crate::pipeline::status::{status_path, RunState, RunStatus, RunSummary};
use crate::pipeline::worker::{process_video_guarded, WorkerContext};
use crate::pipeline::writer::ResultWriter;
use crate::pipeline::VideoOutcome;
use crate::transcript::sink::{open_sink, ResultSink};
use crate::video::discover::discover_videos;
use crate::video::sampler::{FfmpegSampler, FrameSource};
use crate::video::Video;

/// A fully wired pipeline, ready to run over a list of videos.
pub struct Pipeline {
    pub sampler: Arc<dyn FrameSource>,
    pub ocr: Arc<OcrClient>,
    pub checkpoint: CheckpointStore,
    pub sink: Box<dyn ResultSink>,
    pub fps: f64,
    pub similarity_threshold: f64,
    pub workers: usize,
    pub status_path: Option<PathBuf>,
    /// Set externally (Ctrl-C) to stop dispatching new videos.
    pub shutdown: Arc<AtomicBool>,
}

impl Pipeline {
    /// Process every video on a pool of `workers` threads. Each worker owns
    /// one video at a time from fingerprint to transcript; a single writer
    /// thread persists results and checkpoints.
    pub fn run(self, videos: Vec<Video>) -> Result<RunStatus, RunError> {
        let total = videos.len();
        let workers = self.workers.max(1).min(total.max(1));
        tracing::info!("Processing {} video(s) with {} worker(s)", total, workers);

        let checkpoint = Arc::new(RwLock::new(self.checkpoint));
        let abort = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::channel::<VideoOutcome>();

        let writer = ResultWriter {
            sink: self.sink,
            checkpoint: checkpoint.clone(),
            status: RunStatus::new(total),
            status_path: self.status_path.clone(),
            abort: abort.clone(),
        };
        let writer_handle = std::thread::Builder::new()
            .name("result-writer".into())
            .spawn(move || writer.run(receiver))
            .map_err(|e| RunError::Spawn {
                name: "result-writer".into(),
                source: e,
            })?;

        let ctx = Arc::new(WorkerContext {
            sampler: self.sampler,
            ocr: self.ocr,
            checkpoint,
            fps: self.fps,
            similarity_threshold: self.similarity_threshold,
        });
        let queue = Arc::new(videos);
        let next = Arc::new(AtomicUsize::new(0));

        let mut worker_handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let ctx = ctx.clone();
            let queue = queue.clone();
            let next = next.clone();
            let sender = sender.clone();
            let shutdown = self.shutdown.clone();
            let worker_abort = abort.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || loop {
                    if shutdown.load(Ordering::SeqCst) || worker_abort.load(Ordering::SeqCst) {
                        break;
                    }
                    let i = next.fetch_add(1, Ordering::SeqCst);
                    let Some(video) = queue.get(i) else {
                        break;
                    };
                    let outcome = process_video_guarded(video.clone(), &ctx);
                    if sender.send(outcome).is_err() {
                        // Writer has stopped.
                        break;
                    }
                });
            match spawned {
                Ok(handle) => worker_handles.push(handle),
                Err(e) => {
                    abort.store(true, Ordering::SeqCst);
                    tracing::error!("Failed to spawn worker-{}: {}", id, e);
                    break;
                }
            }
        }
        // Writer exits once every worker's sender is gone.
        drop(sender);

        for handle in worker_handles {
            if handle.join().is_err() {
                tracing::error!("A worker thread panicked; its video stays unprocessed");
            }
        }

        let mut status = writer_handle
            .join()
            .map_err(|_| RunError::WriterPanicked)??;

        status.state = if status.summary.attempted() < total {
            RunState::Interrupted
        } else {
            RunState::Finished
        };
        status.touch();
        if let Some(path) = &self.status_path {
            if let Err(e) = status.write(path) {
                tracing::warn!("Failed to write status file {}: {:?}", path.display(), e);
            }
        }
        Ok(status)
    }
}

/// Build the production pipeline (ffmpeg sampler, HTTP OCR backend, report
/// and checkpoint files from config) and run it over every discovered video.
pub fn run_from_config(config: &Config, shutdown: Arc<AtomicBool>) -> Result<RunSummary> {
    config.validate()?;

    if config.input.folders.is_empty() {
        anyhow::bail!(
            "No input folders configured. Pass folders to `vidtext run` or set [input] folders"
        );
    }

    let videos = discover_videos(&config.input)?;
    tracing::info!(
        "Discovered {} video(s) in {} input folder(s)",
        videos.len(),
        config.input.folders.len()
    );

    let checkpoint = CheckpointStore::open(&config.output.checkpoint)
        .context("Failed to open checkpoint file")?;
    tracing::info!(
        "Checkpoint {} holds {} processed video(s)",
        checkpoint.path().display(),
        checkpoint.len()
    );

    let sink = open_sink(&config.output.report, config.output.format)
        .context("Failed to open report")?;

    let backend = UmiOcrBackend::new(&config.ocr)?;
    let policy = RetryPolicy::from_config(&config.ocr);
    tracing::info!(
        "OCR endpoint {} (up to {} attempt(s), worst case {:?} per frame)",
        config.ocr.endpoint,
        policy.max_attempts,
        policy.worst_case(std::time::Duration::from_secs(config.ocr.timeout_secs))
    );
    let ocr = OcrClient::new(
        Box::new(backend),
        policy,
        config.language_hint().map(str::to_string),
    );

    let pipeline = Pipeline {
        sampler: Arc::new(FfmpegSampler::new(&config.sampling)),
        ocr: Arc::new(ocr),
        checkpoint,
        sink,
        fps: config.sampling.fps,
        similarity_threshold: config.dedup.similarity_threshold,
        workers: config.pipeline.workers,
        status_path: Some(status_path(&config.output.checkpoint)),
        shutdown,
    };

    let status = pipeline.run(videos)?;
    tracing::info!("{}", status.summary_line());
    Ok(status.summary)
}
