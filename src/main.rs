// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Voice-line organizer CLI
//!
//! Stage one (`organize`) builds the category tree from a corpus; stages
//! two and three (`metadata`, `transcribe`) enrich its leaves; `status`
//! and `diff` work with release manifests.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use voiceline_organizer::classify::rules::builtin_specs;
use voiceline_organizer::classify::Classifier;
use voiceline_organizer::config::AppConfig;
use voiceline_organizer::manifest::{diff_manifests, load_status_overlay, Snapshot, VOICE_LINE_PREFIX};
use voiceline_organizer::metadata::{attach_metadata, default_output_path, MetadataOptions};
use voiceline_organizer::organize::Organizer;
use voiceline_organizer::phase_log::PhaseLog;
use voiceline_organizer::transcribe::store::load_custom_vocabulary;
use voiceline_organizer::transcribe::whisper::{default_key_path, load_api_key, WhisperClient};
use voiceline_organizer::transcribe::{transcribe_tree, TranscribeOptions};
use voiceline_organizer::tree::status::apply_overlay;
use voiceline_organizer::tree::CategoryTree;
use voiceline_organizer::{OrganizerError, Result};

/// Voice-line organizer - classify, enrich and track game voice lines
#[derive(Parser, Debug)]
#[command(name = "voiceline-organizer")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Sorts extracted voice-line files into a category tree", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level, includes phase diagnostics)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify every audio file under a folder into a category tree
    Organize {
        /// Folder holding the extracted voice lines
        source: PathBuf,

        /// Where to write the tree
        #[arg(short, long, default_value = "voicelines.json")]
        output: PathBuf,

        /// Drop ping lines (pre/post-game lines are kept)
        #[arg(long)]
        exclude_regular_pings: bool,

        /// Keep lines whose speaker is not in the alias table
        #[arg(long)]
        keep_unknown_speakers: bool,

        /// Drop lines whose subject is not in the alias table
        #[arg(long)]
        disregard_unknown_subjects: bool,
    },

    /// Classify filenames and print the result
    Classify {
        /// Filenames to classify
        #[arg(required = true)]
        filenames: Vec<String>,
    },

    /// Attach file dates to every leaf of a tree
    Metadata {
        /// Tree produced by `organize`
        input: PathBuf,

        /// Folder the tree's paths are relative to
        #[arg(short, long)]
        source: PathBuf,

        /// Output tree (default: <input stem>_flat.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Copy every referenced file once into this folder
        #[arg(long)]
        copy_to: Option<PathBuf>,
    },

    /// Transcribe every file referenced by a tree
    Transcribe {
        /// Tree produced by `organize` or `metadata`
        input: PathBuf,

        /// Folder the tree's entries are relative to
        #[arg(short, long)]
        source: PathBuf,

        /// Output tree (default: overwrite input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Folder for per-file transcript caches (default: source)
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Re-transcribe files that already have a cache
        #[arg(long)]
        force: bool,

        /// Parallel workers (overrides config)
        #[arg(short, long)]
        workers: Option<usize>,

        /// JSON list or map of terms used as the transcription prompt
        #[arg(long)]
        custom_vocab: Option<PathBuf>,
    },

    /// Attach ADDED/UPDATED status from an overlay file to a tree
    Status {
        /// Tree to annotate
        input: PathBuf,

        /// Status overlay (`<path> CRC:<hex> [size:<n>] <STATUS>` per line)
        #[arg(long)]
        overlay: PathBuf,

        /// Output tree (default: overwrite input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare two release manifests and list new or changed voice lines
    Diff {
        /// Baseline manifest
        before: PathBuf,

        /// Newer manifest
        after: PathBuf,

        /// Only lines starting with this prefix are compared
        #[arg(long, default_value = VOICE_LINE_PREFIX)]
        prefix: String,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,

        /// Also write the built-in pattern rules here
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Validate configuration file and the tables it names
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Organize {
            source,
            output,
            exclude_regular_pings,
            keep_unknown_speakers,
            disregard_unknown_subjects,
        } => {
            let mut config = config;
            config.organize.exclude_regular_pings |= exclude_regular_pings;
            config.organize.disregard_unknown_speakers &= !keep_unknown_speakers;
            config.organize.disregard_unknown_subjects |= disregard_unknown_subjects;
            run_organize(config, &source, &output, &cli.format)
        }
        Commands::Classify { filenames } => run_classify(config, &filenames, &cli.format),
        Commands::Metadata {
            input,
            source,
            output,
            copy_to,
        } => {
            let output = output.unwrap_or_else(|| default_output_path(&input));
            let options = MetadataOptions { source, copy_to };
            run_metadata(&input, &output, &options, &cli.format)
        }
        Commands::Transcribe {
            input,
            source,
            output,
            cache_dir,
            force,
            workers,
            custom_vocab,
        } => {
            let mut config = config;
            if let Some(workers) = workers {
                config.transcription.workers = workers;
            }
            if custom_vocab.is_some() {
                config.transcription.custom_vocabulary = custom_vocab;
            }
            config.validate()?;
            let options = TranscribeOptions {
                source,
                cache_dir,
                force,
                workers: config.transcription.workers,
            };
            let output = output.unwrap_or_else(|| input.clone());
            run_transcribe(config, &input, &output, &options, &cli.format).await
        }
        Commands::Status {
            input,
            overlay,
            output,
        } => {
            let output = output.unwrap_or_else(|| input.clone());
            run_status(&input, &overlay, &output, &cli.format)
        }
        Commands::Diff {
            before,
            after,
            prefix,
            output,
        } => run_diff(&before, &after, &prefix, output.as_deref()),
        Commands::Config { action } => run_config_command(config, action, &cli.config),
    }
}

/// Print `value` as JSON, or run `text` for the text format
fn emit<T: Serialize>(format: &str, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text(value);
    }
    Ok(())
}

fn run_organize(config: AppConfig, source: &Path, output: &Path, format: &str) -> Result<()> {
    config.validate()?;
    let classifier = Classifier::from_config(&config)?;
    let mut organized = Organizer::new(&classifier, &config.organize).organize_dir(source)?;

    organized.classification_log.flush();
    organized.sorting_log.flush();
    organized.tree.save(output)?;
    info!("Tree written to {:?}", output);

    emit(format, &organized.report, |report| {
        println!("Processed: {}", report.processed);
        println!("Placed:    {}", report.placed);
        println!("Disregarded: {}", report.disregarded);
        if report.excluded_pings > 0 {
            println!("Excluded pings: {}", report.excluded_pings);
        }
        println!("Coverage:  {:.1}%", report.coverage() * 100.0);
        if !report.unknown_speakers.is_empty() {
            println!("\nUnknown speakers ({}):", report.unknown_speakers.len());
            for name in &report.unknown_speakers {
                println!("  {}", name);
            }
        }
        if !report.unknown_subjects.is_empty() {
            println!("\nUnknown subjects ({}):", report.unknown_subjects.len());
            for name in &report.unknown_subjects {
                println!("  {}", name);
            }
        }
        println!("\nTopics ({}):", report.topics.len());
        for topic in &report.topics {
            println!("  {}", topic);
        }
    })
}

fn run_classify(config: AppConfig, filenames: &[String], format: &str) -> Result<()> {
    let classifier = Classifier::from_config(&config)?;
    let mut log = PhaseLog::new("classification");
    let records: Vec<_> = filenames
        .iter()
        .map(|name| classifier.classify(name, &mut log))
        .collect();
    log.flush();

    emit(format, &records, |records| {
        for (name, r) in filenames.iter().zip(records) {
            println!(
                "{}: {} / {} / {}{}{}",
                name,
                r.speaker,
                r.subject_display(),
                r.category.as_deref().map(|c| format!("{} / ", c)).unwrap_or_default(),
                r.topic_display(),
                if r.is_ping { " (ping)" } else { "" }
            );
        }
    })
}

fn run_metadata(input: &Path, output: &Path, options: &MetadataOptions, format: &str) -> Result<()> {
    let tree = CategoryTree::load(input)?;
    let (tree, report) = attach_metadata(tree, options)?;
    tree.save(output)?;
    info!("Tree written to {:?}", output);

    emit(format, &report, |report| {
        println!("Entries: {}", report.entries);
        println!("Dated:   {}", report.dated);
        if options.copy_to.is_some() {
            println!("Copied:  {} ({} failed)", report.copied, report.copy_failures);
        }
        if !report.missing.is_empty() {
            println!("\nMissing files ({}):", report.missing.len());
            for id in &report.missing {
                println!("  {}", id);
            }
        }
    })
}

async fn run_transcribe(
    config: AppConfig,
    input: &Path,
    output: &Path,
    options: &TranscribeOptions,
    format: &str,
) -> Result<()> {
    let settings = &config.transcription;
    let api_key = load_api_key(settings.api_key_file.as_deref())?;
    let prompt = match &settings.custom_vocabulary {
        Some(path) => load_custom_vocabulary(path)?,
        None => None,
    };
    if let Some(prompt) = &prompt {
        info!("Loaded custom vocabulary prompt: {}", prompt.chars().take(100).collect::<String>());
    }

    let tree = CategoryTree::load(input)?;
    let (tree, stats) = transcribe_tree(tree, options, || {
        WhisperClient::new(settings, api_key.clone(), prompt.clone())
    })
    .await?;
    tree.save(output)?;
    info!("Tree written to {:?}", output);

    emit(format, &stats, |stats| {
        println!("Transcription complete:");
        println!("  - Successfully transcribed: {}", stats.successful);
        println!("  - Failed: {}", stats.failed);
        println!("  - Skipped (already transcribed): {}", stats.skipped);
        println!("  - Total: {}", stats.total);
    })
}

fn run_status(input: &Path, overlay: &Path, output: &Path, format: &str) -> Result<()> {
    let mut tree = CategoryTree::load(input)?;
    let records = load_status_overlay(overlay)?;
    let report = apply_overlay(&mut tree, &records);
    tree.save(output)?;
    info!("Tree written to {:?}", output);

    emit(format, &report, |report| {
        println!("Groups updated: {}", report.groups_updated);
        println!("Overlay entries matched: {}", report.matched);
        if !report.unmatched.is_empty() {
            println!("\nUnmatched overlay entries ({}):", report.unmatched.len());
            for path in &report.unmatched {
                println!("  {}", path);
            }
        }
    })
}

fn run_diff(before: &Path, after: &Path, prefix: &str, output: Option<&Path>) -> Result<()> {
    let baseline = Snapshot::load(before, prefix)?;
    let newer = std::fs::read_to_string(after).map_err(|e| OrganizerError::io(after, e))?;
    let changes = diff_manifests(&baseline, &newer, prefix);
    info!("{} new or changed lines", changes.len());

    let report: String = changes.iter().map(|c| format!("{}\n", c)).collect();
    match output {
        Some(path) => {
            std::fs::write(path, report).map_err(|e| OrganizerError::io(path, e))?;
            info!("Diff written to {:?}", path);
        }
        None => print!("{}", report),
    }
    Ok(())
}

fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output, rules } => {
            let mut default_config = AppConfig::default();
            if let Some(rules_path) = &rules {
                let json = serde_json::to_string_pretty(&builtin_specs())?;
                std::fs::write(rules_path, json).map_err(|e| OrganizerError::io(rules_path, e))?;
                println!("Generated pattern rules at {:?}", rules_path);
                default_config.tables.pattern_rules = Some(rules_path.clone());
            }
            default_config.save(&output)?;
            println!("Generated config at {:?}", output);
            if let Some(key_path) = default_key_path() {
                println!("Put your transcription API key in {:?} or OPENAI_API_KEY", key_path);
            }
        }
        ConfigCommands::Validate => {
            config.validate()?;
            let classifier = Classifier::from_config(&config)?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Speakers: {}", classifier.speakers().len());
            println!(
                "  Pattern rules: {}",
                config
                    .tables
                    .pattern_rules
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "built-in".to_string())
            );
            println!("  Transcription workers: {}", config.transcription.workers);
            if load_api_key(config.transcription.api_key_file.as_deref()).is_err() {
                warn!("No transcription API key found; `transcribe` will fail");
            }
        }
    }

    Ok(())
}
