use clap::Parser;
use tracing_subscriber::EnvFilter;

use flow_metrics::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("flow_metrics=debug,info")
    } else {
        EnvFilter::new("flow_metrics=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Collect(args) => {
            cli::collect::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::FlowLength(args) => {
            cli::scan::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
