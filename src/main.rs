use clap::Parser;
use tabdo::cli::commands::Cli;
use tabdo::cli::handlers;
use tabdo::logging;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(cli.verbose, cli.quiet) {
        eprintln!("error: invalid RUST_LOG / log filter: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
