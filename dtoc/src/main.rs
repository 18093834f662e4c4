mod cli;
mod error;
mod pipeline;

use clap::Parser;

fn main() {
    let cli = cli::Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    if let Err(err) = pipeline::run(&cli) {
        log::error!("{err}");
        std::process::exit(1);
    }
}
