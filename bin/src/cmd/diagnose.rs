//! The `diagnose` subcommand: model fit quality checks.

use anyhow::Result;
use polars::prelude::*;
use ronda_ltv::diagnostics::{
    frequency_monetary_correlation, period_transactions, plot_period_transactions,
};
use ronda_models::{BetaGeoConfig, BetaGeoModel};
use ronda_prep::{derive_totals, retype_dates, OutlierSuppressor, RfmBuilder};
use ronda_traits::columns;

use crate::data;

pub(crate) fn execute(snapshot_path: &str, max_purchases: usize, plot: Option<&str>) -> Result<()> {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Model Fit Diagnostics                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Snapshot: {}", snapshot_path);
    println!();

    let mut df = data::load_snapshot(snapshot_path)?;
    println!("Loaded {} customers", df.height());
    println!();

    // Same preparation the pipeline applies before fitting.
    OutlierSuppressor::default().suppress_all(&mut df, &columns::SUPPRESSED)?;
    derive_totals(&mut df)?;
    retype_dates(&mut df)?;

    let builder = RfmBuilder::default();
    let cutoff = builder.analysis_cutoff(&df)?;
    let rfm = builder.build(&df, cutoff)?;

    let frequency = f64_column(&rfm, "frequency")?;
    let recency = f64_column(&rfm, "recency_cltv_weekly")?;
    let tenure = f64_column(&rfm, "T_weekly")?;
    let monetary_avg = f64_column(&rfm, "monetary_cltv_avg")?;

    println!("Fitting purchase-frequency model...");
    let model = BetaGeoModel::fit(&frequency, &recency, &tenure, &BetaGeoConfig::default())?;
    println!(
        "  r = {:.4}, alpha = {:.4}, a = {:.4}, b = {:.4}  ({} iterations)",
        model.r, model.alpha, model.a, model.b, model.iterations
    );
    println!();

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("FREQUENCY / MONETARY INDEPENDENCE");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    match frequency_monetary_correlation(&frequency, &monetary_avg) {
        Some(r) => {
            println!("Pearson correlation: {:>8.4}", r);
            if r.abs() < 0.1 {
                println!("  - Weak dependence; the spend model's assumption holds well");
            } else if r.abs() < 0.3 {
                println!("  - Mild dependence; spend estimates remain usable");
            } else {
                println!("  - Strong dependence; treat spend estimates with caution");
            }
        }
        None => println!("Pearson correlation: N/A (degenerate input)"),
    }
    println!();

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("REPEAT TRANSACTIONS: OBSERVED VS MODEL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    let comparison = period_transactions(&model, &frequency, &tenure, max_purchases)?;
    let levels = u32_column(&comparison, "n_purchases")?;
    let observed = u32_column(&comparison, "observed")?;
    let expected = f64_column(&comparison, "model")?;

    println!("{:>12} {:>10} {:>10}", "Purchases", "Observed", "Model");
    println!("{}", "─".repeat(34));
    for ((level, obs), exp) in levels.iter().zip(observed.iter()).zip(expected.iter()) {
        println!("{:>12} {:>10} {:>10.1}", level, obs, exp);
    }
    println!();

    if let Some(path) = plot {
        plot_period_transactions(&comparison, path)?;
        println!("Wrote fit comparison chart to {}", path);
        println!();
    }

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

fn u32_column(df: &DataFrame, name: &str) -> Result<Vec<u32>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .u32()?
        .into_no_null_iter()
        .collect())
}
