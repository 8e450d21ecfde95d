use clap::Parser;
use layercut::cli::{self, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    layercut::init_logging(cli.verbose, cli.log_json)?;
    cli::run(cli)
}
