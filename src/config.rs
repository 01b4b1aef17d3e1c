use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub sampling: SamplingConfig,
    pub ocr: OcrConfig,
    pub dedup: DedupConfig,
    pub output: OutputConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub folders: Vec<PathBuf>,
    /// Also scan the immediate subfolders of each input folder.
    pub include_subfolders: bool,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Frames sampled per second of playback.
    pub fps: f64,
    pub ffmpeg_path: PathBuf,
    /// ffmpeg `-q:v` value for the extracted JPEGs (2 = best, 31 = worst).
    pub jpeg_quality: u8,
    /// Upper bound on a single ffmpeg extraction.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub endpoint: String,
    /// Language hint sent with every request. Empty means no hint.
    pub language: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub similarity_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Jsonl,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report: PathBuf,
    pub format: ReportFormat,
    pub checkpoint: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub workers: usize,
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            sampling: SamplingConfig::default(),
            ocr: OcrConfig::default(),
            dedup: DedupConfig::default(),
            output: OutputConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            include_subfolders: true,
            extensions: vec!["mp4".to_string()],
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            fps: 1.0,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            jpeg_quality: 2,
            timeout_secs: 600,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9999/api/ocr".to_string(),
            language: "eng".to_string(),
            timeout_secs: 10,
            max_attempts: 3,
            backoff_ms: 1000,
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vidtext")
}

impl Default for OutputConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            report: data_dir.join("transcripts.jsonl"),
            format: ReportFormat::Jsonl,
            checkpoint: data_dir.join("processed_videos.txt"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { workers: 10 }
    }
}

// --- Config loading ---

impl Config {
    /// Load config and return the resolved file path (if any).
    pub fn load_with_path(path: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        // 1. Check explicit path
        if let Some(p) = path {
            let content = std::fs::read_to_string(p).map_err(|e| {
                anyhow::anyhow!("Failed to read config file {}: {}", p.display(), e)
            })?;
            let config: Config = toml::from_str(&content)?;
            return Ok((config, Some(p.to_path_buf())));
        }

        // 2. Check beside the executable
        if let Ok(exe_path) = std::env::current_exe() {
            let beside_exe = exe_path.parent().map(|p| p.join("vidtext.toml"));
            if let Some(p) = beside_exe {
                if p.exists() {
                    let content = std::fs::read_to_string(&p)?;
                    let config: Config = toml::from_str(&content)?;
                    return Ok((config, Some(p)));
                }
            }
        }

        // 3. Check platform config directory (e.g. ~/.config/vidtext/config.toml)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_config = config_dir.join("vidtext").join("config.toml");
            if platform_config.exists() {
                let content = std::fs::read_to_string(&platform_config)?;
                let config: Config = toml::from_str(&content)?;
                return Ok((config, Some(platform_config)));
            }
        }

        // 4. Fall back to defaults
        tracing::info!("No config file found, using defaults");
        Ok((Config::default(), None))
    }

    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_path(path).map(|(config, _)| config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.sampling.fps > 0.0 && self.sampling.fps.is_finite()) {
            anyhow::bail!("sampling.fps must be a positive number, got {}", self.sampling.fps);
        }
        let threshold = self.dedup.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!(
                "dedup.similarity_threshold must be within [0, 1], got {}",
                threshold
            );
        }
        if self.ocr.max_attempts == 0 {
            anyhow::bail!("ocr.max_attempts must be at least 1");
        }
        if self.pipeline.workers == 0 {
            anyhow::bail!("pipeline.workers must be at least 1");
        }
        url::Url::parse(&self.ocr.endpoint).map_err(|e| {
            anyhow::anyhow!("ocr.endpoint is not a valid URL ({}): {}", self.ocr.endpoint, e)
        })?;
        Ok(())
    }

    /// The language hint to send, if any.
    pub fn language_hint(&self) -> Option<&str> {
        let lang = self.ocr.language.trim();
        if lang.is_empty() {
            None
        } else {
            Some(lang)
        }
    }

    /// Generate a default config file with all fields and inline documentation.
    pub fn generate_default_commented() -> String {
        let defaults = OutputConfig::default();
        let report = defaults.report.to_string_lossy().replace('\\', "\\\\");
        let checkpoint = defaults.checkpoint.to_string_lossy().replace('\\', "\\\\");

        format!(
r#"# vidtext configuration
# Edit this file to customize frame sampling, OCR, and output settings.

[input]
# Folders containing the videos to process. Scanning is not recursive.
# folders = ["/data/videos/en"]
folders = []
# Also scan each input folder's immediate subfolders.
include_subfolders = true
# File extensions treated as videos (case-insensitive).
extensions = ["mp4"]

[sampling]
# Frames sampled per second of playback. 1.0 = one frame per second.
fps = 1.0
# ffmpeg binary used to extract frames.
ffmpeg_path = "ffmpeg"
# JPEG quality for extracted frames (2 = best, 31 = worst).
jpeg_quality = 2
# Maximum seconds a single frame extraction may take before the video fails.
timeout_secs = 600

[ocr]
# OCR service endpoint. Receives {{"base64": ..., "lang": ...}} as JSON.
endpoint = "http://localhost:9999/api/ocr"
# Language hint for the service. Leave empty to send none.
language = "eng"
# Per-request timeout in seconds.
timeout_secs = 10
# Attempts per frame before the frame is skipped.
max_attempts = 3
# Delay between attempts in milliseconds.
backoff_ms = 1000

[dedup]
# Lines more similar than this (0.0 to 1.0) to an already accepted line are dropped.
similarity_threshold = 0.8

[output]
# Report receiving one entry per completed video.
report = "{report}"
# Report format: "jsonl" or "text".
format = "jsonl"
# Append-only list of fingerprints of fully processed videos.
checkpoint = "{checkpoint}"

[pipeline]
# Number of videos processed in parallel.
workers = 10
"#,
            report = report,
            checkpoint = checkpoint
        )
    }
}
