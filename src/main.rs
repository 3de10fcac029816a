mod assemble;
mod cli;
mod commands;
mod extract;
mod layout;
mod model;
mod normalize;
mod util;
mod vocab;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli) {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Remittance(args) => commands::remittance::run(args, cli.debug),
        Commands::RemittanceSummary(args) => commands::remittance_summary::run(args),
        Commands::RemDetail(args) => commands::rem_detail::run(args),
        Commands::Statement(args) => commands::statement::run(args),
        Commands::Invoice(args) => commands::invoice::run(args),
        Commands::PoCsv(args) => commands::po_csv::run(args),
        Commands::SaleReport(args) => commands::sale_report::run(args),
        Commands::Supplier(args) => commands::supplier::run(args),
        Commands::Profile(args) => commands::profile::run(args),
        Commands::Post(args) => commands::post::run(args),
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
