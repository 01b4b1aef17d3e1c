// OCR client: applies a bounded retry policy around a single-attempt backend.
//
// A frame whose attempts are all exhausted yields no candidates; the caller
// moves on to the next frame.

use std::sync::Arc;
use std::time::Duration;

use crate::config::OcrConfig;
use crate::error::{OcrError, RecognitionUnavailable};
use crate::ocr::response::OcrResponse;
use crate::ocr::{OcrBackend, TextCandidate};
use crate::video::Frame;

/// Blocks the calling worker between attempts. Injected so tests run without
/// real delays.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    /// Longest time one frame can block its worker.
    pub fn worst_case(&self, timeout: Duration) -> Duration {
        (timeout + self.backoff) * self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

pub struct OcrClient {
    backend: Box<dyn OcrBackend>,
    policy: RetryPolicy,
    language: Option<String>,
    sleeper: Arc<dyn Sleeper>,
}

impl OcrClient {
    pub fn new(backend: Box<dyn OcrBackend>, policy: RetryPolicy, language: Option<String>) -> Self {
        Self {
            backend,
            policy,
            language,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Recognize one image, retrying transport, status and malformed-response
    /// failures. `NoText` is a success with no lines.
    pub fn try_recognize(&self, image: &[u8]) -> Result<Vec<String>, RecognitionUnavailable> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = match self.backend.recognize(image, self.language.as_deref()) {
                Ok(OcrResponse::Items(texts)) => return Ok(texts),
                Ok(OcrResponse::NoText) => return Ok(Vec::new()),
                Ok(OcrResponse::Malformed(detail)) => OcrError::Malformed(detail),
                Err(e) => e,
            };

            if attempt >= self.policy.max_attempts {
                return Err(RecognitionUnavailable {
                    attempts: attempt,
                    last: outcome,
                });
            }

            tracing::debug!(
                "{} attempt {}/{} failed: {}, retrying in {:?}",
                self.backend.name(),
                attempt,
                self.policy.max_attempts,
                outcome,
                self.policy.backoff
            );
            self.sleeper.sleep(self.policy.backoff);
        }
    }

    /// Recognize one frame. Never fails: an unavailable service yields no
    /// candidates and a warning naming the video and frame.
    pub fn recognize_frame(&self, video: &str, frame: &Frame) -> FrameRecognition {
        match self.try_recognize(&frame.image) {
            Ok(texts) => {
                if texts.is_empty() {
                    tracing::debug!("{} frame {}: no text found", video, frame.index);
                }
                FrameRecognition {
                    candidates: texts
                        .into_iter()
                        .map(|text| TextCandidate {
                            frame_index: frame.index,
                            text,
                        })
                        .collect(),
                    unavailable: None,
                }
            }
            Err(e) => {
                tracing::warn!("{} frame {}: {}", video, frame.index, e);
                FrameRecognition {
                    candidates: Vec::new(),
                    unavailable: Some(e),
                }
            }
        }
    }
}

/// Result of recognizing one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecognition {
    pub candidates: Vec<TextCandidate>,
    pub unavailable: Option<RecognitionUnavailable>,
}
