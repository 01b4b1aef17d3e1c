// Frame sampling: turns one video into an ordered, lazily-read sequence of
// JPEG frames at a fixed rate.
//
// `FfmpegSampler` extracts into a per-video temp directory which is owned by
// the returned iterator and removed when the iterator is dropped.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;

use crate::config::SamplingConfig;
use crate::error::VideoError;
use crate::video::Frame;

pub type Frames = Box<dyn Iterator<Item = Result<Frame, VideoError>>>;

/// Source of frames for a video. Each call to `frames` starts a fresh
/// sequence at index 0 in increasing timestamp order.
pub trait FrameSource: Send + Sync {
    fn frames(&self, video: &Path, fps: f64) -> Result<Frames, VideoError>;
}

pub struct FfmpegSampler {
    ffmpeg_path: PathBuf,
    jpeg_quality: u8,
    timeout: Duration,
}

impl FfmpegSampler {
    pub fn new(config: &SamplingConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            jpeg_quality: config.jpeg_quality.clamp(2, 31),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn extract(&self, video: &Path, fps: f64, out_dir: &Path) -> Result<(), VideoError> {
        let log_path = out_dir.join("ffmpeg.log");
        let log_file = std::fs::File::create(&log_path).map_err(|e| VideoError::Io {
            path: log_path.clone(),
            source: e,
        })?;

        // round=near picks the nearest source frame when the native rate is not
        // a multiple of the sampling rate.
        let mut child = Command::new(&self.ffmpeg_path)
            .arg("-hide_banner")
            .args(["-loglevel", "error"])
            .arg("-i")
            .arg(video)
            .arg("-vf")
            .arg(format!("fps={}:round=near", fps))
            .arg("-q:v")
            .arg(self.jpeg_quality.to_string())
            .arg(out_dir.join("frame_%06d.jpg"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log_file))
            .spawn()
            .map_err(|e| {
                VideoError::unreadable(
                    video,
                    format!("failed to spawn {}: {}", self.ffmpeg_path.display(), e),
                )
            })?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(VideoError::unreadable(
                        video,
                        format!("ffmpeg timed out after {:?}", self.timeout),
                    ));
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(50)),
                Err(e) => {
                    let _ = child.kill();
                    return Err(VideoError::unreadable(
                        video,
                        format!("failed to wait on ffmpeg: {}", e),
                    ));
                }
            }
        };

        if !status.success() {
            let log = std::fs::read_to_string(&log_path).unwrap_or_default();
            let detail: String = log.trim().chars().take(300).collect();
            return Err(VideoError::unreadable(
                video,
                format!("ffmpeg exited with {}: {}", status, detail),
            ));
        }
        Ok(())
    }
}

impl FrameSource for FfmpegSampler {
    fn frames(&self, video: &Path, fps: f64) -> Result<Frames, VideoError> {
        if !video.is_file() {
            return Err(VideoError::unreadable(video, "not a file"));
        }

        let tmp = tempfile::Builder::new()
            .prefix("vidtext-frames-")
            .tempdir()
            .map_err(|e| VideoError::Io {
                path: std::env::temp_dir(),
                source: e,
            })?;

        self.extract(video, fps, tmp.path())?;

        let files = list_frame_files(tmp.path()).map_err(|e| VideoError::Io {
            path: tmp.path().to_path_buf(),
            source: e,
        })?;
        if files.is_empty() {
            return Err(VideoError::unreadable(video, "no frames decoded"));
        }

        tracing::debug!("{}: extracted {} frame(s)", video.display(), files.len());
        Ok(Box::new(FrameFiles {
            _dir: tmp,
            files: files.into_iter(),
            fps,
            next_index: 0,
        }))
    }
}

/// Extracted frame files, sorted by their sequence number.
pub fn list_frame_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_frame = path
            .file_name()
            .map(|n| {
                let n = n.to_string_lossy();
                n.starts_with("frame_") && n.ends_with(".jpg")
            })
            .unwrap_or(false);
        if is_frame {
            files.push(path);
        }
    }
    // Zero-padded names sort in sequence order.
    files.sort();
    Ok(files)
}

/// Lazy iterator over extracted frames. Image bytes are read on demand.
struct FrameFiles {
    _dir: TempDir,
    files: std::vec::IntoIter<PathBuf>,
    fps: f64,
    next_index: u64,
}

impl Iterator for FrameFiles {
    type Item = Result<Frame, VideoError>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files.next()?;
        let index = self.next_index;
        self.next_index += 1;
        Some(
            std::fs::read(&path)
                .map(|image| Frame::new(index, self.fps, image))
                .map_err(|e| VideoError::Io { path, source: e }),
        )
    }
}
