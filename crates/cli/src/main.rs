//! CLI tool for adding generated speaker notes to every deck in a folder.

use anyhow::{Context, Result};
use clap::Parser;
use notes_cli::BatchDriver;
use notes_core::{BatchConfig, BatchReport, PromptBuilder};
use notes_openai::{NotesRequester, OpenAiConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use std::fs::File;
use std::io::BufWriter;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Generate speaker notes for PowerPoint decks with a chat-completion model.
#[derive(Parser)]
#[command(name = "slide-notes")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// API key for the completion endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Folder containing the .pptx decks
    #[arg(short, long, env = "SLIDE_NOTES_INPUT_DIR")]
    input_dir: PathBuf,

    /// Folder receiving the annotated decks (created if missing)
    #[arg(short, long, env = "SLIDE_NOTES_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Slides per request (default: 5)
    #[arg(short, long, env = "SLIDE_NOTES_CHUNK_SIZE")]
    chunk_size: Option<NonZeroUsize>,

    /// Model name sent with every request
    #[arg(long, env = "SLIDE_NOTES_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Chat completions URL
    #[arg(long, env = "SLIDE_NOTES_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Request timeout in seconds (default: wait indefinitely)
    #[arg(long, env = "SLIDE_NOTES_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Subject of the decks, used in the prompt
    #[arg(long)]
    topic: Option<String>,

    /// Who the notes are written for, used in the prompt
    #[arg(long)]
    audience: Option<String>,

    /// Stop at the first deck that cannot be processed
    #[arg(long)]
    fail_fast: bool,

    /// Write a JSON report of the run to this file
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn batch_config(&self) -> BatchConfig {
        let config =
            BatchConfig::new(&self.input_dir, &self.output_dir).with_fail_fast(self.fail_fast);
        match self.chunk_size {
            Some(size) => config.with_chunk_size(size),
            None => config,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let report = run(&args)?;

    if let Some(path) = &args.report_json {
        write_report(path, &report)?;
        log::info!("Report written to {}", path.display());
    }

    if report.has_failures() {
        anyhow::bail!(
            "{} of {} decks could not be processed",
            report.failures.len(),
            report.failures.len() + report.files.len()
        );
    }

    Ok(())
}

/// Build the pipeline from the arguments and run it.
fn run(args: &Args) -> Result<BatchReport> {
    let mut openai = OpenAiConfig::new(args.api_key.as_str())
        .with_model(args.model.as_str())
        .with_endpoint(args.endpoint.as_str());
    if let Some(secs) = args.timeout_secs {
        openai = openai.with_timeout(Duration::from_secs(secs));
    }

    let mut prompt = PromptBuilder::new();
    if let Some(topic) = &args.topic {
        prompt = prompt.with_topic(topic.as_str());
    }
    if let Some(audience) = &args.audience {
        prompt = prompt.with_audience(audience.as_str());
    }

    let requester = NotesRequester::from_config(&openai)
        .context("Failed to set up the completion client")?
        .with_prompt(prompt);

    let config = args.batch_config();
    log::debug!(
        "Using model {} at {}, {} slides per request",
        openai.model,
        openai.endpoint,
        config.chunk_size
    );

    BatchDriver::new(config, requester)
        .run()
        .with_context(|| format!("Batch over {} failed", args.input_dir.display()))
}

/// Write the run report as pretty-printed JSON.
fn write_report(path: &Path, report: &BatchReport) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
