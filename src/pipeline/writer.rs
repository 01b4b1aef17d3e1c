// Result writer: the only code that appends to the report and the checkpoint.
//
// For each completed video the transcript is persisted first and the
// fingerprint second, so a crash in between leads to reprocessing, never to a
// checkpointed video with no transcript.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::RunError;
use crate::pipeline::checkpoint::CheckpointStore;
use crate::pipeline::status::{RunState, RunStatus};
use crate::pipeline::VideoOutcome;
use crate::transcript::sink::ResultSink;
use crate::transcript::TranscriptRecord;

pub struct ResultWriter {
    pub sink: Box<dyn ResultSink>,
    pub checkpoint: Arc<RwLock<CheckpointStore>>,
    pub status: RunStatus,
    pub status_path: Option<PathBuf>,
    /// Raised on a fatal write error so workers stop taking new videos.
    pub abort: Arc<AtomicBool>,
}

impl ResultWriter {
    /// Runs until every sender is dropped or a write fails. Call on a
    /// dedicated thread.
    pub fn run(mut self, receiver: Receiver<VideoOutcome>) -> Result<RunStatus, RunError> {
        for outcome in receiver {
            if let Err(e) = self.handle(outcome) {
                tracing::error!("Stopping run: {}", e);
                self.abort.store(true, Ordering::SeqCst);
                self.status.state = RunState::Aborted;
                self.status.error_message = Some(e.to_string());
                self.write_status();
                return Err(e);
            }
            self.write_status();
        }
        Ok(self.status)
    }

    fn handle(&mut self, outcome: VideoOutcome) -> Result<(), RunError> {
        self.status.last_video = Some(outcome.video().name());
        match outcome {
            VideoOutcome::Skipped { .. } => {
                self.status.summary.skipped += 1;
            }
            VideoOutcome::Failed { .. } => {
                self.status.summary.failed += 1;
            }
            VideoOutcome::Transcribed {
                video,
                fingerprint,
                transcript,
                frames_sampled,
                frames_unavailable,
            } => {
                if self.already_done(&fingerprint) {
                    // Same content under another name finished earlier in this run.
                    tracing::info!(
                        "Duplicate content, not reporting twice: {}",
                        video.path.display()
                    );
                    self.status.summary.skipped += 1;
                    return Ok(());
                }

                let record = TranscriptRecord {
                    video: video.name(),
                    folder: video.folder(),
                    path: video.path.to_string_lossy().to_string(),
                    fingerprint,
                    lines: transcript.lines,
                    frames_sampled,
                    frames_unavailable,
                    completed_at: chrono::Local::now().to_rfc3339(),
                };
                self.sink.write(&record)?;
                self.mark_done(&record.fingerprint)?;

                let summary = &mut self.status.summary;
                summary.completed += 1;
                summary.frames_sampled += frames_sampled;
                summary.frames_unavailable += frames_unavailable;
                summary.lines += record.lines.len() as u64;
                tracing::info!(
                    "Completed {} ({}/{})",
                    record.video,
                    self.status.summary.attempted(),
                    self.status.summary.discovered
                );
            }
        }
        Ok(())
    }

    // The store's set is only updated after a successful append, so a guard
    // recovered from a poisoned lock is still consistent with the file.
    fn already_done(&self, fingerprint: &str) -> bool {
        self.checkpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_done(fingerprint)
    }

    fn mark_done(&self, fingerprint: &str) -> Result<(), RunError> {
        self.checkpoint
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .mark_done(fingerprint)?;
        Ok(())
    }

    fn write_status(&mut self) {
        let Some(path) = &self.status_path else {
            return;
        };
        self.status.touch();
        if let Err(e) = self.status.write(path) {
            tracing::warn!("Failed to write status file {}: {:?}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    use crate::error::SinkError;
    use crate::transcript::Transcript;
    use crate::video::Video;
    use tempfile::TempDir;

    /// Sink keeping records in memory, optionally failing every write.
    struct MemorySink {
        records: Arc<std::sync::Mutex<Vec<TranscriptRecord>>>,
        fail: bool,
    }

    impl ResultSink for MemorySink {
        fn write(&mut self, record: &TranscriptRecord) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Io {
                    path: PathBuf::from("report.jsonl"),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn transcribed(name: &str, fp: &str, lines: &[&str]) -> VideoOutcome {
        VideoOutcome::Transcribed {
            video: Video::new(format!("/data/batch/{}", name)),
            fingerprint: fp.to_string(),
            transcript: Transcript {
                lines: lines.iter().map(|s| s.to_string()).collect(),
            },
            frames_sampled: 3,
            frames_unavailable: 1,
        }
    }

    fn writer(
        tmp: &TempDir,
        fail: bool,
    ) -> (
        ResultWriter,
        Arc<std::sync::Mutex<Vec<TranscriptRecord>>>,
        Arc<RwLock<CheckpointStore>>,
    ) {
        let records = Arc::new(std::sync::Mutex::new(Vec::new()));
        let store = CheckpointStore::open(&tmp.path().join("done.txt")).unwrap();
        let checkpoint = Arc::new(RwLock::new(store));
        let writer = ResultWriter {
            sink: Box::new(MemorySink {
                records: records.clone(),
                fail,
            }),
            checkpoint: checkpoint.clone(),
            status: RunStatus::new(4),
            status_path: Some(tmp.path().join(".vidtext-status.json")),
            abort: Arc::new(AtomicBool::new(false)),
        };
        (writer, records, checkpoint)
    }

    #[test]
    fn test_persists_then_checkpoints() {
        let tmp = TempDir::new().unwrap();
        let (writer, records, checkpoint) = writer(&tmp, false);
        let (tx, rx) = mpsc::channel();
        tx.send(transcribed("a.mp4", "fa", &["HELLO"])).unwrap();
        tx.send(VideoOutcome::Skipped {
            video: Video::new("/data/batch/b.mp4"),
            fingerprint: "fb".into(),
        })
        .unwrap();
        tx.send(VideoOutcome::Failed {
            video: Video::new("/data/batch/c.mp4"),
            error: "unreadable".into(),
        })
        .unwrap();
        drop(tx);

        let status = writer.run(rx).unwrap();
        assert_eq!(status.summary.completed, 1);
        assert_eq!(status.summary.skipped, 1);
        assert_eq!(status.summary.failed, 1);
        assert_eq!(status.summary.lines, 1);
        assert_eq!(status.summary.frames_unavailable, 1);

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].video, "a.mp4");
        assert_eq!(records[0].folder, "batch");
        assert!(checkpoint.read().unwrap().is_done("fa"));
        assert!(!checkpoint.read().unwrap().is_done("fc"));

        let on_disk = RunStatus::read(&tmp.path().join(".vidtext-status.json")).unwrap();
        assert_eq!(on_disk.summary.attempted(), 3);
    }

    #[test]
    fn test_duplicate_content_reported_once() {
        let tmp = TempDir::new().unwrap();
        let (writer, records, _) = writer(&tmp, false);
        let (tx, rx) = mpsc::channel();
        tx.send(transcribed("a.mp4", "same", &["HELLO"])).unwrap();
        tx.send(transcribed("copy-of-a.mp4", "same", &["HELLO"])).unwrap();
        drop(tx);

        let status = writer.run(rx).unwrap();
        assert_eq!(status.summary.completed, 1);
        assert_eq!(status.summary.skipped, 1);
        assert_eq!(records.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_sink_failure_aborts_without_checkpoint() {
        let tmp = TempDir::new().unwrap();
        let (writer, _, checkpoint) = writer(&tmp, true);
        let abort = writer.abort.clone();
        let (tx, rx) = mpsc::channel();
        tx.send(transcribed("a.mp4", "fa", &["HELLO"])).unwrap();
        drop(tx);

        let err = writer.run(rx).unwrap_err();
        assert!(matches!(err, RunError::Sink(_)));
        assert!(abort.load(Ordering::SeqCst));
        assert!(!checkpoint.read().unwrap().is_done("fa"));

        let on_disk = RunStatus::read(&tmp.path().join(".vidtext-status.json")).unwrap();
        assert_eq!(on_disk.state, RunState::Aborted);
        assert!(on_disk.error_message.unwrap().contains("disk full"));
    }

    #[test]
    fn test_poisoned_checkpoint_lock_still_records() {
        let tmp = TempDir::new().unwrap();
        let (writer, records, checkpoint) = writer(&tmp, false);

        let poisoner = checkpoint.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.write().unwrap();
            panic!("poison the checkpoint lock");
        })
        .join();
        assert!(checkpoint.is_poisoned());

        let (tx, rx) = mpsc::channel();
        tx.send(transcribed("a.mp4", "fa", &["HELLO"])).unwrap();
        drop(tx);

        let status = writer.run(rx).unwrap();
        assert_eq!(status.summary.completed, 1);
        assert_eq!(records.lock().unwrap().len(), 1);
        let content = std::fs::read_to_string(tmp.path().join("done.txt")).unwrap();
        assert_eq!(content, "fa\n");
    }
}
