use clap::Parser;
use outage_notify::cli::Cli;
use outage_notify::commands;
use outage_notify::logging::init_logging;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    let cli = Cli::parse();
    init_logging(cli.debug)?;
    dotenv::dotenv().ok();
    //
    log::debug!("#Start main() {:?}", cli.command);

    if let Err(e) = commands::run(cli).await {
        log::error!("{e}");
        std::process::exit(1);
    }

    Ok(())
}
