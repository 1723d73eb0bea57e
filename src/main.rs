use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sdprompt::{
    Config, ConfigError, Direction, InputError, MetadataReport, MetadataScanner, PromptTranscoder,
    PromptTranscoderBuilder, ScanOptions,
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// sdprompt - convert prompts between NovelAI and Stable Diffusion notation
#[derive(Parser)]
#[command(name = "sdprompt")]
#[command(about = "Convert image-generation prompts and read prompt metadata from images")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Convert a NovelAI prompt to Stable Diffusion notation
    ToSd(ConvertCommand),
    /// Convert a Stable Diffusion prompt to NovelAI notation
    ToNai(ConvertCommand),
    /// Print the prompt metadata embedded in images as JSON
    Inspect(InspectCommand),
}

/// Convert a prompt
#[derive(Parser)]
struct ConvertCommand {
    /// The prompt to convert; read from stdin when omitted
    #[arg(value_name = "PROMPT")]
    prompt: Option<String>,

    /// CSV file listing artist names to prefix with `artist:`
    #[arg(long, value_name = "CSV")]
    triggers: Option<PathBuf>,

    /// Also split tags at commas inside brackets
    #[arg(long)]
    split_nested_commas: bool,

    /// Print tolerated anomalies to stderr
    #[arg(long)]
    diagnostics: bool,
}

/// Inspect image files
#[derive(Parser)]
struct InspectCommand {
    /// Image files to read (PNG, JPEG or WEBP)
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// Skip PNG chunks whose CRC does not match
    #[arg(long)]
    verify_crc: bool,

    /// Include text chunks with unrecognised keywords
    #[arg(long)]
    all_chunks: bool,
}

fn main() {
    init_tracing();
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result = Config::from_env()
        .map_err(anyhow::Error::from)
        .and_then(|config| match &cli.command {
            Commands::ToSd(cmd) => handle_convert(cmd, Direction::NaiToSd, &config),
            Commands::ToNai(cmd) => handle_convert(cmd, Direction::SdToNai, &config),
            Commands::Inspect(cmd) => handle_inspect(cmd, &config),
        });

    if let Err(e) = result {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Logs go to stderr so converted prompts and JSON on stdout stay clean.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "sdprompt=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are bad input: an empty prompt, unreadable stdin or invalid
/// configuration values. Everything else is internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.downcast_ref::<InputError>().is_some() || error.downcast_ref::<ConfigError>().is_some()
}

/// Handles `to-sd` and `to-nai`.
fn handle_convert(cmd: &ConvertCommand, direction: Direction, config: &Config) -> Result<()> {
    let prompt = match &cmd.prompt {
        Some(prompt) => prompt.clone(),
        None => read_prompt(io::stdin().lock())?,
    };

    let transcoder = build_transcoder(cmd, config)?;
    let stdout = io::stdout();
    execute_convert(&prompt, direction, &transcoder, cmd.diagnostics, &mut stdout.lock())
}

fn build_transcoder(cmd: &ConvertCommand, config: &Config) -> Result<PromptTranscoder> {
    let working_dir = std::env::current_dir().context("Failed to determine working directory")?;
    let triggers = cmd.triggers.as_deref().or(config.triggers.as_deref());

    Ok(PromptTranscoderBuilder::new()
        .resolver(sdprompt::utils::resolver_for(triggers, &working_dir))
        .split_nested_commas(cmd.split_nested_commas || config.split_nested_commas)
        .build())
}

/// Reads the whole prompt from `reader`.
fn read_prompt(mut reader: impl Read) -> Result<String> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(InputError::from)?;
    Ok(String::from_utf8(bytes).map_err(|_| InputError::InvalidUtf8)?)
}

/// Executes a conversion and writes the result to `out`.
///
/// Separated from `handle_convert` so it can be tested without stdin.
fn execute_convert(
    prompt: &str,
    direction: Direction,
    transcoder: &PromptTranscoder,
    show_diagnostics: bool,
    out: &mut impl Write,
) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(InputError::EmptyPrompt.into());
    }

    let converted = transcoder.convert_with_diagnostics(prompt, direction);
    if show_diagnostics {
        for diagnostic in &converted.diagnostics {
            eprintln!("warning ({direction}): {diagnostic}");
        }
    }

    writeln!(out, "{}", converted.value).context("Failed to write output")?;
    Ok(())
}

/// One inspected file in the JSON output.
#[derive(Serialize)]
struct InspectEntry<'a> {
    path: String,
    #[serde(flatten)]
    report: &'a MetadataReport,
}

/// Handles `inspect`.
fn handle_inspect(cmd: &InspectCommand, config: &Config) -> Result<()> {
    let scanner = MetadataScanner::new(ScanOptions {
        verify_crc: cmd.verify_crc || config.verify_crc,
        include_auxiliary: cmd.all_chunks,
    });
    let stdout = io::stdout();
    execute_inspect(&cmd.images, &scanner, &mut stdout.lock())
}

/// Extracts metadata from every image and writes a pretty JSON array.
fn execute_inspect(images: &[PathBuf], scanner: &MetadataScanner, out: &mut impl Write) -> Result<()> {
    let reports: Vec<MetadataReport> = images.iter().map(|path| scanner.extract(path)).collect();
    let entries: Vec<InspectEntry<'_>> = images
        .iter()
        .zip(&reports)
        .map(|(path, report)| InspectEntry {
            path: path.display().to_string(),
            report,
        })
        .collect();

    let json = serde_json::to_string_pretty(&entries).context("Failed to serialize report")?;
    writeln!(out, "{json}").context("Failed to write output")?;
    Ok(())
}
