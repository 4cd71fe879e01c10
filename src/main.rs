use clap::Parser;
use modlock::cli::Cli;
use modlock::commands::execute;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    execute(cli)
}
