use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use langarbiter::cli::OutputFormat;
use langarbiter::cli::commands;
use langarbiter::config::{Config, ConfigLoader};

#[derive(Parser)]
#[command(name = "langarbiter")]
#[command(
    version,
    about = "Detect the language of text by arbitrating local and remote detectors"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Load this config file instead of the global/project chain
    #[arg(long, short, global = true, env = "LANGARBITER_CONFIG_FILE")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the language of TEXT ('-' reads stdin)
    Detect {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(long, help = "Use the local detector only")]
        no_remote: bool,
    },

    /// List supported languages and provider codes
    Languages {
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show configuration file paths
    Path,
    /// Write a default configuration file
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mlangarbiter encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> langarbiter::Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Detect {
            text,
            format,
            no_remote,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let rt = Runtime::new()?;
            rt.block_on(commands::detect::run(&config, &text, format, no_remote))?;
        }
        Commands::Languages { format } => {
            let config = load_config(cli.config.as_ref())?;
            commands::languages::run(&config.preferences(), format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                let config = load_config(cli.config.as_ref())?;
                commands::config::show(&config, format)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
