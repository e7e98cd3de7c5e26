use std::{io, process::exit};

use tracing_subscriber::EnvFilter;

use libinterrupt::{err::InterruptResult, InterruptHandler};

mod config;
use config::SuiteConfig;

mod runner;
use runner::SuiteRunner;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run() {
        Ok(true) => exit(1),
        Ok(false) => exit(0),
        Err(err) => {
            eprintln!("error: {}", err);
            exit(1);
        }
    }
}

/// Run the suite and return whether it was interrupted.
fn run() -> InterruptResult<bool> {
    let config = SuiteConfig::from_env()?;
    let handler = InterruptHandler::new()?;
    let summary = SuiteRunner::new(&handler, config, io::stdout()).main_loop()?;
    Ok(summary.was_interrupted())
}
