//! The `run` subcommand: full pipeline execution and reporting.

use anyhow::Result;
use polars::prelude::*;
use ronda::{LtvConfig, Pipeline, PipelineConfig};
use ronda_prep::RfmConfig;
use serde_json::json;

use crate::data;

/// Arguments for the `run` subcommand.
pub(crate) struct RunArgs {
    pub(crate) snapshot: String,
    pub(crate) output: Option<String>,
    pub(crate) horizon: u32,
    pub(crate) discount: f64,
    pub(crate) cutoff_lag: i64,
    pub(crate) sales_horizons: Vec<u32>,
    pub(crate) top: usize,
    pub(crate) format: String,
}

pub(crate) fn execute(args: &RunArgs) -> Result<()> {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Customer Lifetime Value                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Snapshot: {}", args.snapshot);
    println!("Horizon:  {} months", args.horizon);
    println!("Discount: {:.2}% per month", args.discount * 100.0);
    println!();

    let snapshot = data::load_snapshot(&args.snapshot)?;
    println!(
        "Loaded {} customers with {} columns",
        snapshot.height(),
        snapshot.width()
    );
    println!();

    let config = PipelineConfig {
        rfm: RfmConfig {
            cutoff_lag_days: args.cutoff_lag,
        },
        sales_horizons_months: args.sales_horizons.clone(),
        ltv: LtvConfig {
            horizon_months: args.horizon,
            discount_rate: args.discount,
        },
        ..PipelineConfig::default()
    };
    let labels = config.segment_labels.clone();

    println!("Fitting purchase and spend models...");
    let mut table = Pipeline::new(config).run(snapshot)?;
    println!("Scored {} repeat customers", table.height());
    println!();

    if let Some(ref path) = args.output {
        data::write_csv(&mut table, path)?;
        println!("Wrote CLTV table to {}", path);
        println!();
    }

    let cltv = f64_column(&table, "cltv")?;
    let segments = str_column(&table, "cltv_segment")?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("SEGMENT SUMMARY");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    let summary = segment_summary(&labels, &segments, &cltv);
    if args.format == "json" {
        let payload = json!({
            "total_customers": table.height(),
            "segments": summary
                .iter()
                .map(|row| json!({
                    "segment": row.label,
                    "customers": row.count,
                    "mean_cltv": row.mean,
                    "min_cltv": row.min,
                    "max_cltv": row.max,
                    "total_cltv": row.total,
                }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "{:<8} {:>10} {:>12} {:>12} {:>12} {:>14}",
            "Segment", "Customers", "Mean CLTV", "Min CLTV", "Max CLTV", "Total CLTV"
        );
        println!("{}", "─".repeat(72));
        for row in &summary {
            println!(
                "{:<8} {:>10} {:>12.2} {:>12.2} {:>12.2} {:>14.2}",
                row.label, row.count, row.mean, row.min, row.max, row.total
            );
        }
        println!();

        print_top_customers(&table, &cltv, args.top)?;
    }

    Ok(())
}

struct SegmentRow<'a> {
    label: &'a str,
    count: usize,
    mean: f64,
    min: f64,
    max: f64,
    total: f64,
}

/// Per-segment counts and CLTV statistics, highest tier first.
fn segment_summary<'a>(
    labels: &'a [String],
    segments: &[String],
    cltv: &[f64],
) -> Vec<SegmentRow<'a>> {
    labels
        .iter()
        .rev()
        .map(|label| {
            let values: Vec<f64> = segments
                .iter()
                .zip(cltv.iter())
                .filter(|(s, _)| *s == label)
                .map(|(_, &v)| v)
                .collect();
            let total: f64 = values.iter().sum();
            let count = values.len();
            SegmentRow {
                label,
                count,
                mean: if count > 0 { total / count as f64 } else { 0.0 },
                min: if count > 0 {
                    values.iter().copied().fold(f64::INFINITY, f64::min)
                } else {
                    0.0
                },
                max: values.iter().copied().fold(0.0, f64::max),
                total,
            }
        })
        .collect()
}

fn print_top_customers(table: &DataFrame, cltv: &[f64], top: usize) -> Result<()> {
    let ids = str_column(table, "master_id")?;
    let frequency = f64_column(table, "frequency")?;
    let monetary_avg = f64_column(table, "monetary_cltv_avg")?;
    let segments = str_column(table, "cltv_segment")?;

    let mut order: Vec<usize> = (0..cltv.len()).collect();
    order.sort_by(|&a, &b| cltv[b].total_cmp(&cltv[a]));

    println!("Top {} customers by CLTV:", top.min(order.len()));
    println!(
        "{:<40} {:>10} {:>12} {:>12} {:>8}",
        "Customer", "Frequency", "Avg Value", "CLTV", "Segment"
    );
    println!("{}", "─".repeat(86));
    for &i in order.iter().take(top) {
        println!(
            "{:<40} {:>10.0} {:>12.2} {:>12.2} {:>8}",
            ids[i], frequency[i], monetary_avg[i], cltv[i], segments[i]
        );
    }
    println!();
    Ok(())
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?
        .f64()?
        .into_no_null_iter()
        .collect())
}

fn str_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .str()?
        .into_no_null_iter()
        .map(str::to_string)
        .collect())
}
