use std::process::ExitCode;

use clap::Parser;
use color_eyre::Result;

use drivetime::cli::Cli;
use drivetime::driver::Driver;
use drivetime::player::rodio_backend::RodioBackend;

#[tokio::main(flavor = "local")]
async fn main() -> ExitCode {
    color_eyre::install().unwrap();
    setup_tracing();

    let options = Cli::parse();

    match run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(options: Cli) -> Result<()> {
    let mut driver = Driver::load(
        options.config,
        Box::new(RodioBackend::default()),
        Box::new(RodioBackend::default()),
    )?;
    driver.run().await
}

pub fn setup_tracing() {
    use tracing_subscriber::filter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = filter::EnvFilter::builder().from_env().unwrap();
    let fmt = fmt::layer().pretty().with_line_number(true);

    let _ignore_err = tracing_subscriber::registry()
        .with(fmt)
        .with(filter)
        .try_init();
}
