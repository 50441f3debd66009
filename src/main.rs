mod cli;
mod driver;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, RunRequest};

fn main() -> Result<()> {
    env_logger::init();

    let request = RunRequest::try_from(Cli::parse())?;
    driver::run(&request)?;
    Ok(())
}
