use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
use cli::{Cli, Commands};

fn main() {
    // Parse CLI arguments first to get verbosity level
    let cli = Cli::parse();

    // Initialize tracing with appropriate verbosity
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        2.. => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    if let Err(err) = run(cli) {
        eprintln!("[apiforge] {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let workspace = cli.workspace.clone();
    match cli.command {
        Commands::Generate(args) => {
            info!("Generate command: {:?}", args);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::generate::execute(args, workspace))?;
        }
        Commands::Hash(args) => {
            info!("Hash command: {:?}", args);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::hash::execute(args, workspace))?;
        }
        Commands::Generators => {
            info!("Generators command");
            cli::commands::generators::execute(&workspace)?;
        }
        Commands::Discover(args) => {
            info!("Discover command: {:?}", args);
            cli::commands::discover::execute(args, &workspace)?;
        }
    }
    Ok(())
}
