//! FMEA CLI: the `fmea` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Validate {
            rows,
            ontology,
            config,
            json,
        } => commands::validate::run(rows, ontology, config, json),

        Commands::Plan { rows, config, json } => commands::plan::run(rows, config, json),

        Commands::CheckField {
            kind,
            value,
            ontology,
            json,
        } => commands::check_field::run(kind, value, ontology, json),

        Commands::CheckPair {
            relation,
            a,
            b,
            ontology,
            json,
        } => commands::check_pair::run(relation, a, b, ontology, json),

        Commands::Ontology { ontology, json } => commands::ontology::run(ontology, json),

        Commands::Normalize { rows } => commands::normalize::run(rows),
    }
}
