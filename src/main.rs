use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use lectio_board::cli;
use lectio_board::cli::commands::{Cli, Commands};

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("lectio_board=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli_args = Cli::parse();
    init_logging(cli_args.verbose);

    let json_output = cli_args.json;
    let user_flag = cli_args.user.clone();

    let exit_code = match cli_args.command {
        Commands::Init => cli::init::run(json_output),
        Commands::Board { filters, column } => {
            cli::board::run(&filters, column.as_deref(), json_output, user_flag.as_deref())
        }
        Commands::Status => cli::status::run(json_output),
        Commands::Task(cmd) => cli::task::run(cmd, json_output, user_flag.as_deref()),
        Commands::Config(cmd) => cli::config::run(cmd, json_output, user_flag.as_deref()),
    };

    process::exit(exit_code);
}
