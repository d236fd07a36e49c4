//! Entry point for the boardsync CLI.

use clap::Parser;

use boardsync::cli::Cli;
use boardsync::config::Settings;
use boardsync::error::ExitCode;
use boardsync::logging::init_logging;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    };

    match boardsync::run_app(&cli, &settings) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            log::error!("{:#}", err);
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    }
}
