use anyhow::Result;
use clap::Parser;
use hsctl::{cli::Cli, logging::init_tracing};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    cli.run()
}
