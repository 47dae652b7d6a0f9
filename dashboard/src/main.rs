//! `faceless`: terminal dashboard for the Faceless Video job API.

mod commands;
mod events;
mod state;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use faceless::config::loader::validate_settings;
use faceless::{load_settings, FacelessError};

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "faceless")]
#[command(about = "Create, watch and manage faceless videos from the terminal")]
#[command(version)]
struct Cli {
    /// JSON settings file (defaults to $FACELESS_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Print results as JSON envelopes
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a new video and watch it until it finishes
    Create {
        /// What the video should be about
        topic: String,
        /// Target length in seconds
        #[arg(short, long)]
        duration: Option<u32>,
        /// Return right after submission
        #[arg(long)]
        no_wait: bool,
    },
    /// Watch an existing video until it finishes
    Watch { id: String },
    /// Show the current status of a video
    Status { id: String },
    /// List all videos known to the backend
    List,
    /// Delete a video
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Download a finished video
    Download {
        id: String,
        /// Destination file (defaults to <id>.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Resolve a media path against the API base URL
    Url { path: String },
    /// Manage the local library of finished videos
    Library {
        #[command(subcommand)]
        command: LibraryCommand,
    },
}

#[derive(Subcommand, Debug)]
enum LibraryCommand {
    /// List saved videos
    List,
    /// Forget a saved video
    Remove { id: String },
}

fn init_logging(level: &str, format: LogFormat) {
    // Route `log` records from dependencies into tracing
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to bridge log records: {}", e);
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Text => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        ),
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            ),
        ),
    };
    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

async fn run(cli: Cli) -> Result<(), FacelessError> {
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        settings.api_base_url = url;
        validate_settings(&settings)?;
    }
    debug!("Using API at {}", settings.api_base_url);

    let state = AppState::new(settings)?;
    let json = cli.json;

    match cli.command {
        Command::Create {
            topic,
            duration,
            no_wait,
        } => commands::videos::create(&state, &topic, duration, no_wait, json).await,
        Command::Watch { id } => commands::videos::watch(&state, &id, json).await,
        Command::Status { id } => commands::videos::status(&state, &id, json).await,
        Command::List => commands::videos::list(&state, json).await,
        Command::Delete { id, yes } => commands::videos::delete(&state, &id, yes, json).await,
        Command::Download { id, output } => {
            commands::videos::download(&state, &id, output, json).await
        }
        Command::Url { path } => commands::videos::url(&state, &path, json),
        Command::Library { command } => match command {
            LibraryCommand::List => commands::library::list(&state, json),
            LibraryCommand::Remove { id } => commands::library::remove(&state, &id, json),
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);
    info!("Starting faceless v{}", env!("CARGO_PKG_VERSION"));

    let json = cli.json;
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                commands::print_json(&commands::ApiResponse::<()>::err(e.to_string()));
            } else {
                eprintln!("Error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}
