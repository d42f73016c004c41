use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, info};
use pomprune_exclude::Config;
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "pomprune")]
#[command(about = "Trim projects out of multi-project builds without reformatting descriptors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Exclude projects and rewrite the descriptors that reference them
    Exclude(Config),
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    match cli.command {
        Commands::Exclude(mut cfg) => {
            cfg.initialize()?;
            debug!("Config: root={:?}, excludes={:?}, pom={:?}", cfg.root, cfg.excludes, cfg.pom);

            let outcome = pomprune_exclude::run_exclusion(cfg.clone())?;
            let elapsed_ms = start.elapsed().as_millis();

            if cfg.json {
                pomprune_exclude::print_json(&mut stdout, &outcome)?;
            } else if outcome.selectors.is_empty() {
                info!("No exclusions applied");
                pomprune_exclude::print_no_exclusions_message(&mut stdout, &cfg)?;
            } else {
                pomprune_exclude::print_outcome_tree(&mut stdout, &outcome, &cfg)?;
                writeln!(
                    stdout,
                    "\n{} Finished in {}ms on {} projects.",
                    "●".bright_blue(),
                    elapsed_ms.to_string().cyan(),
                    (outcome.reactor.len() + outcome.excluded.len()).to_string().cyan()
                )?;
            }
            stdout.flush()?;

            // Non-zero exit when some descriptors could not be rewritten
            if !outcome.failed.is_empty() {
                std::process::exit(1);
            }

            Ok(())
        }
    }
}
