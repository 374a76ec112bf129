use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "gazetteer")]
#[command(version, about = "Gazetteer address resolution engine CLI", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the database with reference data and a synthetic address corpus
    Seed(commands::seed::SeedArgs),

    /// Run one full resolution pass over the configured database
    Run(commands::run::RunArgs),

    /// Evaluate the scorer against labeled pairs, and grid-search for a better one
    Evaluate(commands::evaluate::EvaluateArgs),

    /// Start the `/compare` HTTP server
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gazetteer={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Seed(args) => commands::seed::execute(args).await,
        Commands::Run(args) => commands::run::execute(args).await,
        Commands::Evaluate(args) => commands::evaluate::execute(args).await,
        Commands::Serve(args) => commands::serve::execute(args).await,
    }
}
