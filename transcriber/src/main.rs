//! The transcriber binary extracts text from batches of images with Gemini.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use vlm_transcriber::commands::{self, ProcessOptions};
use vlm_transcriber::errors::AppError;
use vlm_transcriber::logging::{self, LogOptions};
use vlm_transcriber::settings::{
    default_config_path, resolve_config_source, Settings, SettingsOverrides, CONFIG_ENV_VAR,
};
use vlm_transcriber::setup::{run_init, InitConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (default: $VLM_TRANSCRIBER_CONFIG, then the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from images and print or export the results
    Process {
        /// Image files or directories of images
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Write results as CSV to this file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write results as XLSX to this file
        #[arg(long)]
        xlsx: Option<PathBuf>,
        /// Write both exports into this directory with timestamped names
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Do not print the result table
        #[arg(long)]
        no_table: bool,
        /// API key (default: $GOOGLE_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
        /// Gemini model name
        #[arg(long)]
        model: Option<String>,
        /// Attempts per image, first call included
        #[arg(long)]
        max_attempts: Option<usize>,
        /// Seconds to wait between attempts
        #[arg(long)]
        retry_delay: Option<f64>,
    },
    /// Validate images without calling the API
    Check {
        /// Image files or directories of images
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Write a commented default settings file
    Init {
        /// Target file (default: the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
        /// Show what would be done without modifying files
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_options = LogOptions {
        level: cli.log_level.clone(),
        json: cli.json_logs,
        file: cli.log_file.clone(),
    };
    if let Err(err) = logging::init(&log_options) {
        eprintln!("Error: {err}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_settings(
    config: Option<&PathBuf>,
    overrides: SettingsOverrides,
) -> Result<Settings, AppError> {
    let source = resolve_config_source(
        config.map(PathBuf::as_path),
        std::env::var_os(CONFIG_ENV_VAR),
        default_config_path(),
    );
    let settings = Settings::load(source.as_ref())?.with_overrides(overrides);
    settings.validate()?;
    Ok(settings)
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    match cli.command {
        Commands::Process {
            paths,
            csv,
            xlsx,
            out_dir,
            no_table,
            api_key,
            model,
            max_attempts,
            retry_delay,
        } => {
            let settings = load_settings(
                cli.config.as_ref(),
                SettingsOverrides {
                    model,
                    retry_max_attempts: max_attempts,
                    retry_delay_seconds: retry_delay,
                },
            )?;
            let options = ProcessOptions {
                csv,
                xlsx,
                out_dir,
                show_table: !no_table,
            };
            commands::process(
                &settings,
                api_key,
                &paths,
                &options,
                &mut stdout,
                &mut stderr,
            )
            .await?;
        }
        Commands::Check { paths } => {
            let settings = load_settings(cli.config.as_ref(), SettingsOverrides::default())?;
            commands::check(&settings, &paths, &mut stdout).await?;
        }
        Commands::Init {
            path,
            force,
            dry_run,
        } => {
            run_init(&InitConfig {
                path: path.or(cli.config),
                force,
                dry_run,
            })?;
        }
    }

    Ok(())
}
