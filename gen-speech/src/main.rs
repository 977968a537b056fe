//! gen-speech - Turn documents into narrated audio with pluggable TTS backends

mod audio;
mod batch;
mod config;
mod document;
mod pipeline;
mod text;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::GenSpeechConfig;
use indicatif::{ProgressBar, ProgressStyle};
use pipeline::{Job, JobOptions, JobState, Orchestrator, OrchestratorSettings, PipelineError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use text::Language;
use tts_client::{BackendRegistry, SynthesisBackend};

#[derive(Parser, Debug)]
#[command(name = "gen-speech")]
#[command(about = "Convert text and .docx documents to speech", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the input document (.txt or .docx)
    input: Option<PathBuf>,

    /// Output file path (default: <input-name>.wav)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to voice reference audio for voice cloning
    #[arg(long)]
    voice: Option<PathBuf>,

    /// Language tag for normalization and synthesis (e.g. vi-vn, en-us)
    #[arg(long, global = true)]
    lang: Option<String>,

    /// Backend preset from tts.toml
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Preset speaker name
    #[arg(long, global = true)]
    speaker: Option<String>,

    /// Maximum chunk length in characters
    #[arg(long, global = true)]
    max_chunk: Option<usize>,

    /// Apply the noise gate to the merged audio
    #[arg(long)]
    denoise: bool,

    /// Apply the compressor to the merged audio
    #[arg(long)]
    compress: bool,

    /// Apply reverb to the merged audio
    #[arg(long)]
    reverb: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false, global = true)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print text with numbers, dates and amounts spelled out
    Normalize {
        /// Text to normalize
        text: String,
    },
    /// Print the chunks a document would be synthesized in
    Chunks {
        /// Path to the input document
        input: PathBuf,
    },
    /// Validate a voice reference recording
    Voice {
        /// Path to a WAV file
        path: PathBuf,
    },
    /// Synthesize every row of a CSV (id,text,voice) into a ZIP of WAV files
    Batch {
        /// Path to the CSV file
        csv: PathBuf,

        /// Output archive (default: <csv-name>.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Synthesis backend presets
    Backends {
        #[command(subcommand)]
        action: BackendsAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default language
    SetLanguage {
        /// Language tag (vi-vn, en-us)
        tag: String,
    },
    /// Set default voice reference
    SetVoice {
        /// Path to voice reference audio
        path: PathBuf,
    },
    /// Set default backend preset
    SetBackend {
        /// Preset name from tts.toml
        name: String,
    },
    /// Set default maximum chunk length
    SetChunkLength {
        /// Characters
        value: usize,
    },
}

#[derive(Subcommand, Debug)]
enum BackendsAction {
    /// List configured backend presets
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    // Handle subcommands
    match &args.command {
        Some(Commands::Config { action }) => return handle_config_command(action),
        Some(Commands::Backends { action }) => return handle_backends_command(action),
        Some(Commands::Normalize { text }) => {
            let config = GenSpeechConfig::load().context("Failed to load configuration")?;
            let language = resolve_language(&args, &config)?;
            println!("{}", text::normalize(text, language));
            return Ok(());
        }
        Some(Commands::Chunks { input }) => return print_chunks(&args, input),
        Some(Commands::Voice { path }) => return check_voice(path),
        Some(Commands::Batch { csv, output }) => {
            let config = effective_config(&args)?;
            let registry = backend_registry(&config)?;
            return run_batch(&args, &config, &registry, csv, output.as_deref()).await;
        }
        None => {}
    }

    // Require an input document for synthesis
    let input_path = args
        .input
        .clone()
        .ok_or_else(|| anyhow::anyhow!("Input file path is required. Run 'gen-speech --help' for usage."))?;

    if !input_path.exists() {
        anyhow::bail!("Input file not found: {}", input_path.display());
    }

    let config = effective_config(&args)?;
    let language = resolve_language(&args, &config)?;

    let output_path = args.output.clone().unwrap_or_else(|| {
        let stem = input_path.file_stem().unwrap_or_default();
        input_path.with_file_name(format!("{}.wav", stem.to_string_lossy()))
    });

    if args.debug {
        eprintln!("Input: {}", input_path.display());
        eprintln!("Output: {}", output_path.display());
        eprintln!("Language: {}", language);
        eprintln!("Voice ref: {:?}", config.voice_ref);
        eprintln!("Max chunk: {}", config.max_chunk_length);
    }

    let registry = backend_registry(&config)?;
    let backend = load_backend(&registry, &config).await?;
    eprintln!("Backend: {}", backend.name());

    let orchestrator = Orchestrator::new(backend, OrchestratorSettings::from(&config));
    let options = JobOptions::from_config(&config, language);

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut job = Job::new(&orchestrator, options).with_observer(|state| match state {
        JobState::Synthesizing { current, total } => {
            pb.set_length(*total as u64);
            pb.set_position(*current as u64);
        }
        s if s.is_terminal() => {}
        other => pb.set_message(other.to_string()),
    });

    let result = job.run(&input_path, &output_path).await;
    drop(job);

    match result {
        Ok(path) => {
            pb.finish_with_message("done");
            let metadata = std::fs::metadata(&path)?;
            let size_mb = metadata.len() as f64 / (1024.0 * 1024.0);
            eprintln!("Output: {} ({:.1} MB)", path.display(), size_mb);
            Ok(())
        }
        Err(e) => {
            pb.abandon();
            Err(e).context("Synthesis failed")
        }
    }
}

/// Stored config with command-line overrides applied.
fn effective_config(args: &Args) -> Result<GenSpeechConfig> {
    let mut config = GenSpeechConfig::load().context("Failed to load configuration")?;

    if let Some(max_chunk) = args.max_chunk {
        config.max_chunk_length = max_chunk;
    }
    if args.backend.is_some() {
        config.backend = args.backend.clone();
    }
    if args.speaker.is_some() {
        config.speaker = args.speaker.clone();
    }
    if args.voice.is_some() {
        config.voice_ref = args.voice.clone();
    }
    if args.denoise {
        config.enhance.noise_gate.get_or_insert_with(Default::default);
    }
    if args.compress {
        config.enhance.compressor.get_or_insert_with(Default::default);
    }
    if args.reverb {
        config.enhance.reverb.get_or_insert_with(Default::default);
    }

    Ok(config)
}

fn resolve_language(args: &Args, config: &GenSpeechConfig) -> Result<Language> {
    let tag = args.lang.as_deref().unwrap_or(&config.language);
    tag.parse::<Language>().map_err(anyhow::Error::msg)
}

/// Registry over the presets in tts.toml, shared by every backend lookup of
/// this run.
fn backend_registry(config: &GenSpeechConfig) -> Result<BackendRegistry> {
    let presets = tts_client::Config::load().context("Failed to load backend presets")?;
    Ok(BackendRegistry::new(presets)
        .with_load_timeout(Duration::from_secs(config.load_timeout_secs)))
}

/// Load the configured backend through the registry.
async fn load_backend(
    registry: &BackendRegistry,
    config: &GenSpeechConfig,
) -> Result<Arc<dyn SynthesisBackend>> {
    let name = registry
        .config()
        .resolve_name(config.backend.as_deref())
        .to_string();
    log::debug!("Using backend preset '{}'", name);

    let backend = registry
        .get(&name)
        .await
        .map_err(PipelineError::BackendUnavailable)?;
    Ok(backend)
}

fn print_chunks(args: &Args, input: &Path) -> Result<()> {
    let config = effective_config(args)?;
    let language = resolve_language(args, &config)?;
    let text = document::extract(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let chunks = JobOptions::from_config(&config, language).chunks(&text);
    for chunk in &chunks {
        println!("[{}] ({} chars) {}", chunk.index, chunk.text.chars().count(), chunk.text);
    }
    eprintln!("Total chunks: {}", chunks.len());
    Ok(())
}

fn check_voice(path: &Path) -> Result<()> {
    let config = GenSpeechConfig::load().context("Failed to load configuration")?;
    let voice = audio::voice::validate(path, config.voice_bounds())?;
    println!(
        "{}: {:.2}s, {} Hz, {} channel(s) - OK",
        voice.path.display(),
        voice.duration_secs,
        voice.sample_rate,
        voice.channels
    );
    Ok(())
}

async fn run_batch(
    args: &Args,
    config: &GenSpeechConfig,
    registry: &BackendRegistry,
    csv: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let language = resolve_language(args, config)?;

    let zip_path = output.map(Path::to_path_buf).unwrap_or_else(|| {
        let stem = csv.file_stem().unwrap_or_default();
        csv.with_file_name(format!("{}.zip", stem.to_string_lossy()))
    });

    let backend = load_backend(registry, config).await?;
    let orchestrator = Orchestrator::new(backend, OrchestratorSettings::from(config));
    let options = JobOptions::from_config(config, language);

    eprintln!("Processing {}...", csv.display());
    let summary = batch::run_batch(csv, &zip_path, &orchestrator, &options)
        .await
        .context("Batch failed")?;

    eprintln!(
        "Completed: {}, Skipped: {}",
        summary.written.len(),
        summary.skipped
    );
    eprintln!("Output: {}", zip_path.display());
    Ok(())
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = GenSpeechConfig::load()?;
            println!("Configuration file: {:?}", GenSpeechConfig::config_path()?);
            println!();
            println!("language = \"{}\"", config.language);
            println!("max_chunk_length = {}", config.max_chunk_length);
            println!("max_input_chars = {}", config.max_input_chars);
            println!("inter_chunk_silence_secs = {}", config.inter_chunk_silence_secs);
            println!("target_sample_rate = {}", config.target_sample_rate);
            println!(
                "voice bounds = {}s - {}s",
                config.voice_min_secs, config.voice_max_secs
            );
            match &config.voice_ref {
                Some(voice) => println!("voice_ref = \"{}\"", voice.display()),
                None => println!("voice_ref = (none)"),
            }
            match &config.backend {
                Some(backend) => println!("backend = \"{}\"", backend),
                None => println!("backend = (tts.toml default)"),
            }
            match &config.speaker {
                Some(speaker) => println!("speaker = \"{}\"", speaker),
                None => println!("speaker = (backend default)"),
            }
            println!("load_timeout_secs = {}", config.load_timeout_secs);
            println!("max_retries = {}", config.max_retries);
            let effects: Vec<&str> = [
                config.enhance.noise_gate.as_ref().map(|_| "noise_gate"),
                config.enhance.compressor.as_ref().map(|_| "compressor"),
                config.enhance.reverb.as_ref().map(|_| "reverb"),
            ]
            .into_iter()
            .flatten()
            .collect();
            if effects.is_empty() {
                println!("enhance = (none)");
            } else {
                println!("enhance = {}", effects.join(", "));
            }
        }
        ConfigAction::SetLanguage { tag } => {
            let language: Language = tag.parse().map_err(anyhow::Error::msg)?;
            let mut config = GenSpeechConfig::load()?;
            config.language = language.tag().to_string();
            config.save()?;
            println!("Default language set to: {}", config.language);
        }
        ConfigAction::SetVoice { path } => {
            let mut config = GenSpeechConfig::load()?;
            config.voice_ref = Some(path.clone());
            config.save()?;
            println!("Default voice reference set to: {}", path.display());
        }
        ConfigAction::SetBackend { name } => {
            let presets = tts_client::Config::load()?;
            presets.get_backend(name)?;
            let mut config = GenSpeechConfig::load()?;
            config.backend = Some(name.clone());
            config.save()?;
            println!("Default backend set to: {}", name);
        }
        ConfigAction::SetChunkLength { value } => {
            if *value == 0 {
                anyhow::bail!("Chunk length must be positive");
            }
            let mut config = GenSpeechConfig::load()?;
            config.max_chunk_length = *value;
            config.save()?;
            println!("Default chunk length set to: {}", value);
        }
    }
    Ok(())
}

fn handle_backends_command(action: &BackendsAction) -> Result<()> {
    match action {
        BackendsAction::List => {
            let presets = tts_client::Config::load()?;
            println!("Presets file: {:?}", tts_client::Config::config_path()?);
            println!();

            let mut names: Vec<&String> = presets.backends.keys().collect();
            names.sort();
            for name in names {
                let preset = &presets.backends[name];
                let marker = if *name == presets.default_backend { "*" } else { " " };
                println!(
                    "{} {:<12} {:<10} speaker: {}",
                    marker,
                    name,
                    preset.kind,
                    preset.speaker.as_deref().unwrap_or("(default)")
                );
            }
        }
    }
    Ok(())
}
