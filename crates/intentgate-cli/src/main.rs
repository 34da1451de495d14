use clap::{Parser, Subcommand};
use intentgate_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "intentgate", version, about = "Ask for an intent before opening distracting sites")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Active site management
    Site {
        #[command(subcommand)]
        action: commands::site::SiteAction,
    },
    /// Evaluate gating for a page
    Check(commands::check::CheckArgs),
    /// Submit an intent for a page
    Intent(commands::intent::IntentArgs),
    /// Show the remaining whitelist time for a page
    Badge(commands::badge::BadgeArgs),
    /// Recent intent history
    Log(commands::log::LogArgs),
    /// First-run defaults or legacy migration
    Setup(commands::setup::SetupArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_env("INTENTGATE_LOG")
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config);

    let result = match cli.command {
        Commands::Site { action } => commands::site::run(action, config),
        Commands::Check(args) => commands::check::run(args, config),
        Commands::Intent(args) => commands::intent::run(args, config),
        Commands::Badge(args) => commands::badge::run(args, config),
        Commands::Log(args) => commands::log::run(args, config),
        Commands::Setup(args) => commands::setup::run(args, config),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
