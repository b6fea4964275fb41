//! Ronda CLI binary.
//!
//! Provides the command-line interface for the ronda CLTV pipeline.

mod cmd;
mod data;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;

#[derive(Parser)]
#[command(name = "ronda")]
#[command(about = "Customer lifetime value estimation for retail customer bases", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full CLTV pipeline on a customer snapshot
    Run {
        /// Path to the customer snapshot CSV
        snapshot: String,

        /// Write the full per-customer CLTV table to this CSV path
        #[arg(short, long)]
        output: Option<String>,

        /// CLTV projection horizon in months
        #[arg(short = 'H', long, default_value = "6")]
        horizon: u32,

        /// Monthly discount rate
        #[arg(short, long, default_value = "0.01")]
        discount: f64,

        /// Days between the latest order and the analysis cutoff
        #[arg(long, default_value = "2")]
        cutoff_lag: i64,

        /// Horizons (months) for the expected-sales forecast columns
        #[arg(long, value_delimiter = ',', default_value = "3,6")]
        sales_horizons: Vec<u32>,

        /// Number of top customers to display
        #[arg(short, long, default_value = "10")]
        top: usize,

        /// Summary output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Check model fit quality on a customer snapshot
    Diagnose {
        /// Path to the customer snapshot CSV
        snapshot: String,

        /// Highest repeat-purchase level in the fit comparison
        #[arg(long, default_value = "9")]
        max_purchases: usize,

        /// Render the fit comparison to this PNG path
        #[arg(long)]
        plot: Option<String>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            snapshot,
            output,
            horizon,
            discount,
            cutoff_lag,
            sales_horizons,
            top,
            format,
        } => {
            cmd::run::execute(&cmd::run::RunArgs {
                snapshot,
                output,
                horizon,
                discount,
                cutoff_lag,
                sales_horizons,
                top,
                format,
            })?;
        }
        Commands::Diagnose {
            snapshot,
            max_purchases,
            plot,
        } => {
            cmd::diagnose::execute(&snapshot, max_purchases, plot.as_deref())?;
        }
    }

    Ok(())
}
