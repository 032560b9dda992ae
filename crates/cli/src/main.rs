//! `invoice-calc`: check invoice-type formulas and compute invoices from JSON.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use millerp_observability::LogFormat;

#[derive(Parser)]
#[command(name = "invoice-calc")]
#[command(author, version, about = "Invoice formula checks and computation")]
struct Cli {
    /// Log output format (json or pretty); defaults to MILLERP_LOG_FORMAT, then json
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute an invoice: run the invoice-type pipeline against a context
    Compute {
        /// Invoice-type configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Base variables as a JSON object of name → number
        #[arg(short = 'x', long)]
        context: PathBuf,

        /// Extra or overriding variables, as NAME=VALUE
        #[arg(long = "var", value_parser = commands::parse_assignment)]
        vars: Vec<(String, f64)>,
    },

    /// Validate an invoice-type configuration and list the inputs it needs
    Check {
        /// Invoice-type configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Evaluate a single formula
    Eval {
        /// Formula text, e.g. "[Rate / Kg]*[Total Kgs]"
        formula: String,

        /// Variables as a JSON object of name → number
        #[arg(short = 'x', long)]
        context: Option<PathBuf>,

        /// Variables as NAME=VALUE
        #[arg(long = "var", value_parser = commands::parse_assignment)]
        vars: Vec<(String, f64)>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.log_format {
        Some(format) => millerp_observability::init_with(format),
        None => millerp_observability::init(),
    }

    let output = match cli.command {
        Commands::Compute {
            config,
            context,
            vars,
        } => commands::compute(&config, &context, vars)?,
        Commands::Check { config } => commands::check(&config)?,
        Commands::Eval {
            formula,
            context,
            vars,
        } => commands::eval(&formula, context.as_deref(), vars)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
