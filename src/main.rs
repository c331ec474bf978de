use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use tafsir_processor::nlp::HeuristicService;
use tafsir_processor::output::JsonPersister;
use tafsir_processor::pipeline;
use tafsir_processor::settings::{Overrides, Settings};

#[derive(Parser)]
#[command(
    name = "tafsir_processor",
    about = "Turn a tafsir XML corpus into one enriched JSON file per sura"
)]
struct Cli {
    /// Tafsir XML source (default: data/maududi-tafsir.xml, env TAFSIR_INPUT)
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Directory for sura_<index>.json files (default: output, env TAFSIR_OUTPUT_DIR)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Append logs to this file instead of stderr (env TAFSIR_LOG_FILE).
    /// No log file is written unless one is given.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(Overrides {
        input: cli.input,
        output_dir: cli.output_dir,
        log_file: cli.log_file,
    })
    .context("Failed to load settings")?;
    init_tracing(settings.log_file.as_deref())?;
    info!(settings = ?settings, "Starting tafsir processor");

    let mut persister = JsonPersister::new(&settings.output_dir);
    persister.ensure_dir()?;

    // Built once and shared by every chapter.
    let service = HeuristicService::new();

    let summary = pipeline::process_file(&settings.input, &service, &mut persister)?;

    println!(
        "Done: {} suras processed ({} written, {} failed to save) into {}",
        summary.chapters,
        summary.written,
        summary.skipped,
        persister.dir().display(),
    );
    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("Finished in {}", format_duration(elapsed));
    }
    info!("Processing complete.");
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
