//! metal-dash entry point

use clap::Parser;
use metal_dash::cli::{cmd_backtest, cmd_forecast, cmd_history, cmd_rolling, Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metal_forecast=info,metal_dash=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let context = cli.context()?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::History(args) => cmd_history(&context, &args, &mut out)?,
        Commands::Forecast(args) => cmd_forecast(&context, &args, &mut out)?,
        Commands::Backtest(args) => cmd_backtest(&context, &args, &mut out)?,
        Commands::Rolling(args) => cmd_rolling(&context, &args, &mut out)?,
    }

    Ok(())
}
