use anyhow::Result;
use clap::Parser;

use taskpool::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
