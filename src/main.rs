use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use vidtext::cli::{Cli, Commands, RunArgs};
use vidtext::config::Config;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vidtext=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            args.apply(&mut config);

            let shutdown = Arc::new(AtomicBool::new(false));
            let shutdown_ctrlc = shutdown.clone();
            ctrlc::set_handler(move || {
                tracing::info!("Shutdown requested, finishing videos in progress");
                shutdown_ctrlc.store(true, Ordering::SeqCst);
            })?;

            let summary = vidtext::pipeline::runner::run_from_config(&config, shutdown)?;
            println!(
                "Done: {} completed, {} skipped, {} failed of {} discovered",
                summary.completed, summary.skipped, summary.failed, summary.discovered
            );
            if summary.failed > 0 {
                println!("Failed videos are retried on the next run; see the log for causes.");
            }
            Ok(())
        }
        Commands::Status => vidtext::commands::show_status(&config),
        Commands::InitConfig { path, force } => {
            let path = match path {
                Some(p) => p,
                None => vidtext::commands::default_config_path()?,
            };
            vidtext::commands::init_config(&path, force)
        }
    }
}
