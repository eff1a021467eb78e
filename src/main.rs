use anyhow::Context;
use clap::Parser;
use station_charts::cli::{run, Cli};
use station_charts::utils::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref()).context("failed to initialize logging")?;

    run(cli).await.context("station-charts failed")
}
