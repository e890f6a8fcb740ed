use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "studytime-cli", version, about = "Study time tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Study session control
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Drive the tracker in the foreground, printing events as they fire
    Watch(commands::watch::WatchArgs),
    /// Study time statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Learning progress
    Progress {
        #[command(subcommand)]
        action: commands::progress::ProgressAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("STUDYTIME_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action),
        Commands::Watch(args) => commands::watch::run(args),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Progress { action } => commands::progress::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
