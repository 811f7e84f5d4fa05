use anyhow::Result;
use ec_history::cli::cli;

fn main() -> Result<()> {
    cli()
}
