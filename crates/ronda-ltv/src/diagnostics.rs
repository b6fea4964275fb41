//! Model fit diagnostics.
//!
//! Two qualitative checks on the fitted models, neither of which is part
//! of the output data contract:
//!
//! - the period-transactions comparison: observed customer counts per
//!   repeat-purchase level against the counts the fitted BG/NBD implies,
//! - the Pearson correlation between purchase frequency and average
//!   monetary value, which should be near zero for the Gamma-Gamma
//!   independence assumption to hold.

use plotters::prelude::*;
use polars::prelude::*;

use ronda_models::BetaGeoModel;
use ronda_traits::stats::pearson;
use ronda_traits::{Result, RondaError};

/// Pearson correlation between frequency and average monetary value.
///
/// Returns `None` for degenerate input (fewer than two customers or zero
/// variance on either side).
pub fn frequency_monetary_correlation(frequency: &[f64], monetary_avg: &[f64]) -> Option<f64> {
    pearson(frequency, monetary_avg)
}

/// Observed vs model-expected customer counts per repeat-purchase level.
///
/// For each purchase count `k` in `0..=max_purchases`, the observed column
/// counts customers whose frequency is exactly `k`; the model column sums
/// each customer's probability of making `k` repeat purchases over their
/// own tenure. Close agreement indicates the frequency model captures the
/// purchase-count distribution.
///
/// # Errors
///
/// Returns [`RondaError::InvalidData`] if the slices differ in length.
pub fn period_transactions(
    model: &BetaGeoModel,
    frequency: &[f64],
    tenure: &[f64],
    max_purchases: usize,
) -> Result<DataFrame> {
    if frequency.len() != tenure.len() {
        return Err(RondaError::InvalidData(format!(
            "mismatched input lengths: frequency {}, tenure {}",
            frequency.len(),
            tenure.len()
        )));
    }

    let levels: Vec<u32> = (0..=max_purchases as u32).collect();
    let mut observed = vec![0u32; max_purchases + 1];
    for &x in frequency {
        let k = x as usize;
        if k <= max_purchases {
            observed[k] += 1;
        }
    }

    let expected: Vec<f64> = levels
        .iter()
        .map(|&k| {
            tenure
                .iter()
                .map(|&big_t| model.probability_of_purchases(big_t, u64::from(k)))
                .sum()
        })
        .collect();

    Ok(df! {
        "n_purchases" => levels,
        "observed" => observed,
        "model" => expected,
    }?)
}

/// Render the period-transactions comparison as a grouped bar chart.
///
/// Purely diagnostic; failures to render are reported but carry no data
/// significance.
pub fn plot_period_transactions(diagnostic: &DataFrame, output_path: &str) -> Result<()> {
    let levels: Vec<u32> = diagnostic
        .column("n_purchases")?
        .as_materialized_series()
        .u32()?
        .into_no_null_iter()
        .collect();
    let observed: Vec<f64> = diagnostic
        .column("observed")?
        .as_materialized_series()
        .cast(&DataType::Float64)?
        .f64()?
        .into_no_null_iter()
        .collect();
    let expected: Vec<f64> = diagnostic
        .column("model")?
        .as_materialized_series()
        .f64()?
        .into_no_null_iter()
        .collect();

    let y_max = observed
        .iter()
        .chain(expected.iter())
        .fold(0.0f64, |a, &b| a.max(b))
        * 1.1
        + 1.0;
    let x_max = levels.last().copied().unwrap_or(0) + 1;

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| RondaError::Other(format!("chart render failed: {e}")))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Frequency of Repeat Transactions: Observed vs Model",
            ("sans-serif", 24),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..f64::from(x_max), 0.0..y_max)
        .map_err(|e| RondaError::Other(format!("chart render failed: {e}")))?;

    chart
        .configure_mesh()
        .x_desc("Repeat purchases")
        .y_desc("Customers")
        .draw()
        .map_err(|e| RondaError::Other(format!("chart render failed: {e}")))?;

    let bar_width = 0.35;
    chart
        .draw_series(levels.iter().zip(observed.iter()).map(|(&k, &count)| {
            let x0 = f64::from(k);
            Rectangle::new([(x0, 0.0), (x0 + bar_width, count)], BLUE.filled())
        }))
        .map_err(|e| RondaError::Other(format!("chart render failed: {e}")))?
        .label("Observed")
        .legend(|(x, y)| Rectangle::new([(x, y - 4), (x + 12, y + 4)], BLUE.filled()));

    chart
        .draw_series(levels.iter().zip(expected.iter()).map(|(&k, &count)| {
            let x0 = f64::from(k) + bar_width;
            Rectangle::new([(x0, 0.0), (x0 + bar_width, count)], RED.filled())
        }))
        .map_err(|e| RondaError::Other(format!("chart render failed: {e}")))?
        .label("Model")
        .legend(|(x, y)| Rectangle::new([(x, y - 4), (x + 12, y + 4)], RED.filled()));

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(|e| RondaError::Other(format!("chart render failed: {e}")))?;

    root.present()
        .map_err(|e| RondaError::Other(format!("chart render failed: {e}")))?;
    Ok(())
}
