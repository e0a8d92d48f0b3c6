#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug};
use serde_json::{Value, json};

use inscriptor::app_config::{Config, LogLevel};
use inscriptor::errors::AppError;
use inscriptor::registry::Credentials;
use inscriptor::service::PipelineService;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store an inscription image and create its upload record
    Upload {
        /// Image file (PNG, JPG, ... up to 10MB)
        #[arg(value_name = "IMAGE")]
        path: PathBuf,
    },

    /// Extract the text of an upload and translate it
    #[command(alias = "translate")]
    Process {
        /// Upload id returned by `upload`
        upload_id: String,

        /// Target language code (e.g., 'es', 'hi', 'fr')
        #[arg(short, long, default_value = "en")]
        target_language: String,
    },

    /// Generate speech for a translation and attach the audio
    Synthesize {
        /// Translation id returned by `process`
        translation_id: String,
    },

    /// List your translations, newest first
    History,

    /// List the languages offered for translation
    Languages,

    /// Generate shell completions for inscriptor
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Inscriptor - heritage inscription reader
///
/// Reads the text of inscription photographs, translates it and reads the
/// translation aloud, falling back to secondary providers when one fails.
#[derive(Parser, Debug)]
#[command(name = "inscriptor")]
#[command(version)]
#[command(about = "Heritage inscription OCR, translation and speech")]
#[command(long_about = "Inscriptor extracts text from photographs of inscriptions, translates it and
synthesizes speech for the translation.

EXAMPLES:
    inscriptor --user u1 upload stone.jpg             # Register an image
    inscriptor --user u1 process <UPLOAD_ID> -t es    # OCR and translate to Spanish
    inscriptor --user u1 synthesize <TRANSLATION_ID>  # Generate audio
    inscriptor --user u1 history                      # Past translations
    inscriptor completions bash > inscriptor.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created. Provider keys are read from the environment:
    GOOGLE_API_KEY (Vision, Translate, TTS) and LIBRETRANSLATE_API_KEY.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Caller's user id; every record is scoped to it
    #[arg(short, long, env = "INSCRIPTOR_USER", default_value = "")]
    user: String,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
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

    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "❌ "),
            Level::Warn => ("\x1B[1;33m", "🚧 "),
            Level::Info => ("\x1B[1;32m", " "),
            Level::Debug => ("\x1B[1;36m", "🔍 "),
            Level::Trace => ("\x1B[1;35m", "📋 "),
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
            let (colour, emoji) = Self::style_for_level(record.level());

            // stdout carries the JSON envelope, logs go to stderr
            let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", colour, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The logger accepts every level; `log::set_max_level` does the filtering
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "inscriptor", &mut std::io::stdout());
        return Ok(());
    }

    let (envelope, succeeded) = match run(cli).await {
        Ok(payload) => (success_envelope(payload), true),
        Err(e) => (failure_envelope(&e), false),
    };

    println!("{}", serde_json::to_string_pretty(&envelope)?);
    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: CommandLineOptions) -> Result<Value, AppError> {
    let config = load_config(&cli.config_path, cli.log_level)?;

    if let Commands::Languages = cli.command {
        return Ok(json!({ "languages": inscriptor::language_utils::supported_languages() }));
    }

    let service = PipelineService::from_config(&config, &Credentials::from_env())?;
    let user = cli.user.as_str();

    let payload = match cli.command {
        Commands::Upload { path } => {
            let bytes = read_image(&path).await?;
            let filename = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            let upload = service.register_upload(user, &filename, bytes).await?;
            json!({ "upload": upload })
        }
        Commands::Process {
            upload_id,
            target_language,
        } => {
            let translation = service.process(user, &upload_id, &target_language).await?;
            json!({ "translation": translation })
        }
        Commands::Synthesize { translation_id } => {
            let outcome = service.synthesize(user, &translation_id).await?;
            json!({
                "audio_url": outcome.audio_reference,
                "provider": outcome.provider,
                "translation": outcome.translation,
            })
        }
        Commands::History => {
            let history = service.history(user).await?;
            json!({ "translations": history })
        }
        Commands::Languages | Commands::Completions { .. } => Value::Null,
    };

    Ok(payload)
}

fn load_config(path: &Path, cli_level: Option<CliLogLevel>) -> Result<Config, AppError> {
    if let Some(level) = cli_level {
        log::set_max_level(LogLevel::from(level).into());
    }

    let mut config = Config::load_or_create(path).map_err(|e| AppError::Config(format!("{:#}", e)))?;
    if let Some(level) = cli_level {
        config.log_level = level.into();
    }
    config
        .validate()
        .map_err(|e| AppError::Config(format!("Configuration validation failed: {:#}", e)))?;

    log::set_max_level(config.log_level.into());
    debug!("Loaded configuration from {:?}", path);
    Ok(config)
}

async fn read_image(path: &Path) -> Result<Bytes, AppError> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image file: {:?}", path))
        .map_err(|e| AppError::File(format!("{:#}", e)))?;
    Ok(Bytes::from(content))
}

fn success_envelope(payload: Value) -> Value {
    let mut envelope = json!({ "success": true });
    if let (Some(target), Value::Object(fields)) = (envelope.as_object_mut(), payload) {
        target.extend(fields);
    }
    envelope
}

fn failure_envelope(error: &AppError) -> Value {
    match error {
        AppError::Pipeline(failure) => json!({
            "success": false,
            "error": failure.to_string(),
            "stage": failure.stage,
        }),
        other => json!({ "success": false, "error": other.to_string() }),
    }
}
