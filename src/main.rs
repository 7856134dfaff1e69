use clap::Parser;
use setup_sccache::cli::cmd_enums::{Cli, Commands};
use setup_sccache::commands::{now, stats};
use setup_sccache::{log_debug, log_error, logger};

fn main() {
    let cli = Cli::parse();
    logger::init(cli.debug);
    log_debug!("Parsed command line: {:?}", cli);

    let result = match cli.command.unwrap_or(Commands::Now) {
        Commands::Now => now::run(cli.settings.as_deref(), &cli.pipeline),
        Commands::Stats => stats::run(),
    };

    if let Err(e) = result {
        log_error!("{:#}", e);
        std::process::exit(1);
    }
}
