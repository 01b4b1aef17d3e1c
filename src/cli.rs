use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, ReportFormat};

#[derive(Parser, Debug)]
#[command(
    name = "vidtext",
    version,
    about = "Resumable bulk extraction of on-screen text from video files"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract text from every unprocessed video (default if no subcommand)
    Run(RunArgs),

    /// Show checkpoint size and the last run's progress
    Status,

    /// Write a commented default config file
    InitConfig {
        /// Destination (defaults to the platform config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Input folders (replace [input] folders from config)
    pub folders: Vec<PathBuf>,

    /// Do not scan the immediate subfolders of each input folder
    #[arg(long)]
    pub no_subfolders: bool,

    /// Frames sampled per second of playback
    #[arg(long)]
    pub fps: Option<f64>,

    /// Similarity above which a line counts as a near-duplicate (0.0 to 1.0)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Videos processed in parallel
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// OCR attempts per frame
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// OCR service endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Language hint sent to the OCR service
    #[arg(long)]
    pub lang: Option<String>,

    /// Report file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(long)]
    pub format: Option<FormatArg>,

    /// Checkpoint file
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Jsonl,
    Text,
}

impl From<FormatArg> for ReportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Jsonl => ReportFormat::Jsonl,
            FormatArg::Text => ReportFormat::Text,
        }
    }
}

impl RunArgs {
    /// Layer command-line values over the loaded config.
    pub fn apply(&self, config: &mut Config) {
        if !self.folders.is_empty() {
            config.input.folders = self.folders.clone();
        }
        if self.no_subfolders {
            config.input.include_subfolders = false;
        }
        if let Some(fps) = self.fps {
            config.sampling.fps = fps;
        }
        if let Some(threshold) = self.threshold {
            config.dedup.similarity_threshold = threshold;
        }
        if let Some(workers) = self.workers {
            config.pipeline.workers = workers;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.ocr.max_attempts = max_attempts;
        }
        if let Some(endpoint) = &self.endpoint {
            config.ocr.endpoint = endpoint.clone();
        }
        if let Some(lang) = &self.lang {
            config.ocr.language = lang.clone();
        }
        if let Some(output) = &self.output {
            config.output.report = output.clone();
        }
        if let Some(format) = self.format {
            config.output.format = format.into();
        }
        if let Some(checkpoint) = &self.checkpoint {
            config.output.checkpoint = checkpoint.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["vidtext"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_run_args_override_config() {
        let cli = Cli::try_parse_from([
            "vidtext",
            "--config",
            "/etc/vidtext.toml",
            "run",
            "/data/en",
            "/data/fr",
            "--fps",
            "2",
            "--threshold",
            "0.9",
            "-w",
            "4",
            "--format",
            "text",
            "--checkpoint",
            "/tmp/done.txt",
            "--no-subfolders",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/vidtext.toml")));

        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run subcommand");
        };
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(
            config.input.folders,
            vec![PathBuf::from("/data/en"), PathBuf::from("/data/fr")]
        );
        assert!(!config.input.include_subfolders);
        assert_eq!(config.sampling.fps, 2.0);
        assert_eq!(config.dedup.similarity_threshold, 0.9);
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(config.output.format, ReportFormat::Text);
        assert_eq!(config.output.checkpoint, PathBuf::from("/tmp/done.txt"));
        // Untouched values keep their config defaults.
        assert_eq!(config.ocr.max_attempts, 3);
    }

    #[test]
    fn test_empty_run_args_leave_config_alone() {
        let mut config = Config::default();
        config.input.folders = vec![PathBuf::from("/from/config")];
        RunArgs::default().apply(&mut config);
        assert_eq!(config.input.folders, vec![PathBuf::from("/from/config")]);
        assert!(config.input.include_subfolders);
    }

    #[test]
    fn test_init_config_parses() {
        let cli = Cli::try_parse_from(["vidtext", "init-config", "--force", "out.toml"]).unwrap();
        match cli.command {
            Some(Commands::InitConfig { path, force }) => {
                assert_eq!(path, Some(PathBuf::from("out.toml")));
                assert!(force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
