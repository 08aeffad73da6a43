use clap::Parser;
use hnpscan::{cli, config, errors};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize logging
    let log_level = match (cli.quiet, cli.verbose) {
        (true, 0) => "warn",
        (_, 0) => "info",
        (_, 1) => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        console::set_colors_enabled(false);
    }

    let result = match cli.command {
        cli::Commands::Scan(args) => cli::scan::handle_scan(args, cli.quiet).await,
        cli::Commands::Triage(args) => cli::triage::handle_triage(args, cli.quiet).await,
        cli::Commands::Validate(args) => handle_validate(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn handle_validate(args: cli::commands::ValidateArgs) -> Result<(), errors::HnpError> {
    let path = std::path::PathBuf::from(&args.config);
    let _config = config::parse_config(&path).await?;
    println!("Configuration is valid: {}", args.config);
    Ok(())
}
