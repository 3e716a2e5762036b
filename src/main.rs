// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use app_controller::Controller;

mod app_config;
mod app_controller;
mod audio_extractor;
mod errors;
mod file_utils;
mod job_orchestrator;
mod providers;
mod segment_builder;
mod srt_formatter;
mod storage;
mod transcript;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an .srt subtitle file from a video/audio source (default command)
    #[command(alias = "generate")]
    Generate(GenerateArgs),

    /// Generate shell completions for srtgen
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Input video or audio file to transcribe
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Location to save the generated .srt file. If none is specified it is
    /// printed to stdout
    #[arg(short = 'o', long)]
    srt_output: Option<PathBuf>,

    /// Force overwrite of an existing output file
    #[arg(short, long)]
    force_overwrite: bool,

    /// Bitrate in bps used to extract the audio from the source
    #[arg(short, long)]
    bitrate: Option<u32>,

    /// Location to save the extracted mp3 audio to; a temporary file is used
    /// and deleted when not specified
    #[arg(short = 'm', long)]
    mp3_output: Option<PathBuf>,

    /// Storage locator of already-uploaded audio; skips extraction and upload
    #[arg(long, conflicts_with_all = ["bitrate", "mp3_output"])]
    media_uri: Option<String>,

    /// Output language hint (e.g. "en-US")
    #[arg(short = 's', long)]
    language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// srtGen - Automatic subtitle generation
///
/// Extracts the audio track from a video/audio source, runs a transcription
/// job against a speech-to-text service, and writes the result as a .srt
/// subtitle file.
#[derive(Parser, Debug)]
#[command(name = "srtgen")]
#[command(version = "0.1.0")]
#[command(about = "Generate .srt subtitles from video/audio via a transcription service")]
#[command(long_about = "srtGen extracts audio from a source file, submits it to a managed
speech-to-text service, and converts the recognized words into a correctly
timed SubRip subtitle file.

EXAMPLES:
    srtgen movie.mov -o movie.srt               # Transcribe and save subtitles
    srtgen movie.mov                            # Print subtitles to stdout
    srtgen -b 64000 -m movie.mp3 movie.mov      # Keep the extracted audio
    srtgen --media-uri s3://bucket/audio.mp3 -o out.srt  # Audio already uploaded
    srtgen --log-level debug movie.mov          # Verbose progress output
    srtgen completions bash > srtgen.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    generate: GenerateArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "srtgen", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Generate(args)) => run_generate(args).await,
        None => run_generate(cli.generate).await,
    }
}

async fn run_generate(options: GenerateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&config_log_level));
    }

    // Load or create configuration
    let config_path = &options.config_path;
    let config = if Path::new(config_path).exists() {
        let mut config = Config::from_file(config_path)?;

        // Override config with CLI options if provided
        if let Some(bitrate) = options.bitrate {
            config.audio.bitrate = bitrate;
        }
        if let Some(language) = &options.language {
            config.language_code = language.clone();
        }
        if let Some(log_level) = &options.log_level {
            config.log_level = log_level.clone().into();
        }

        config
    } else {
        // Create default configuration if not exists
        warn!(
            "Config file not found at '{}', creating default config.",
            config_path
        );

        let mut config = Config::default();

        if let Some(bitrate) = options.bitrate {
            config.audio.bitrate = bitrate;
        }
        if let Some(language) = &options.language {
            config.language_code = language.clone();
        }
        if let Some(log_level) = &options.log_level {
            config.log_level = log_level.clone().into();
        }

        config.save_to_file(config_path)?;
        config
    };

    // Validate the configuration after loading and overriding
    config.validate()?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    let controller = Controller::with_config(config)?;

    if let Some(media_uri) = &options.media_uri {
        // Audio is already uploaded, go straight to transcription
        return controller
            .run_remote(
                media_uri,
                "mp3",
                options.srt_output.as_deref(),
                options.force_overwrite,
            )
            .await;
    }

    let input_path = options
        .input_path
        .ok_or_else(|| anyhow!("INPUT_PATH is required unless --media-uri is given"))?;

    controller
        .run(
            &input_path,
            options.srt_output.as_deref(),
            options.force_overwrite,
            options.mp3_output.as_deref(),
        )
        .await
}
