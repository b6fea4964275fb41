//! End-to-end CLTV pipeline.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use ronda_ltv::{customer_lifetime_value, segment, LtvConfig};
use ronda_models::{BetaGeoConfig, BetaGeoModel, GammaGammaConfig, GammaGammaModel};
use ronda_prep::{derive_totals, retype_dates, OutlierConfig, OutlierSuppressor, RfmBuilder, RfmConfig};
use ronda_traits::{columns, CustomerData, Result};

/// Configuration for a full pipeline run.
///
/// Every stage's knobs in one place; [`Default`] reproduces the reference
/// analysis (1%/99% thresholds, 2-day cutoff lag, 0.001/0.01 penalizers,
/// 3- and 6-month sales forecasts, 6-month CLTV at 1% monthly discount,
/// D/C/B/A quartile tiers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Outlier suppression thresholds.
    pub outlier: OutlierConfig,

    /// RFM construction settings (analysis-cutoff lag).
    pub rfm: RfmConfig,

    /// Frequency model fit settings.
    pub frequency: BetaGeoConfig,

    /// Monetary model fit settings.
    pub monetary: GammaGammaConfig,

    /// Horizons (in months) for the expected-sales forecast columns.
    pub sales_horizons_months: Vec<u32>,

    /// Lifetime-value composition settings.
    pub ltv: LtvConfig,

    /// Segment labels, lowest tier first.
    pub segment_labels: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            outlier: OutlierConfig::default(),
            rfm: RfmConfig::default(),
            frequency: BetaGeoConfig::default(),
            monetary: GammaGammaConfig::default(),
            sales_horizons_months: vec![3, 6],
            ltv: LtvConfig::default(),
            segment_labels: ronda_ltv::DEFAULT_SEGMENT_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// The end-to-end CLTV estimation pipeline.
///
/// Consumes one static snapshot, produces one static output table; no
/// hidden state survives between runs, so rerunning on the same snapshot
/// yields a bit-identical result.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline with the given configuration.
    #[must_use]
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The pipeline's configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline on a raw customer snapshot.
    ///
    /// Output columns: `master_id`, `frequency`, `monetary`,
    /// `recency_cltv_weekly`, `T_weekly`, `monetary_cltv_avg`, one
    /// `exp_sales_<h>_month` per configured horizon, `exp_average_value`,
    /// `cltv`, `cltv_segment`.
    ///
    /// # Errors
    ///
    /// Data-contract violations (missing columns, unparseable dates) and
    /// model-fit failures propagate as their distinct [`RondaError`]
    /// variants; nothing is retried.
    ///
    /// [`RondaError`]: ronda_traits::RondaError
    pub fn run(&self, snapshot: DataFrame) -> Result<DataFrame> {
        let data = CustomerData::new(snapshot);
        data.validate_columns(&columns::REQUIRED)?;
        let mut df = data.into_inner();

        // Stage 1: cap extreme count/spend values, each column
        // independently.
        let suppressor = OutlierSuppressor::new(self.config.outlier.clone());
        suppressor.suppress_all(&mut df, &columns::SUPPRESSED)?;

        // Stage 2: omni-channel totals and temporal typing.
        derive_totals(&mut df)?;
        retype_dates(&mut df)?;

        // Stage 3: RFM table; the analysis cutoff is computed once here
        // and passed down explicitly.
        let builder = RfmBuilder::new(self.config.rfm.clone());
        let cutoff = builder.analysis_cutoff(&df)?;
        let mut rfm = builder.build(&df, cutoff)?;

        let frequency = float_column(&rfm, "frequency")?;
        let recency = float_column(&rfm, "recency_cltv_weekly")?;
        let tenure = float_column(&rfm, "T_weekly")?;
        let monetary_avg = float_column(&rfm, "monetary_cltv_avg")?;

        // Stage 4: frequency model and per-horizon sales forecasts.
        let freq_model = BetaGeoModel::fit(&frequency, &recency, &tenure, &self.config.frequency)?;
        for &months in &self.config.sales_horizons_months {
            let weeks = f64::from(4 * months);
            let forecast = freq_model.expected_purchases_batch(weeks, &frequency, &recency, &tenure);
            let name = format!("exp_sales_{months}_month");
            rfm.with_column(Column::new(name.as_str().into(), forecast.to_vec()))?;
        }

        // Stage 5: monetary model.
        let value_model = GammaGammaModel::fit(&frequency, &monetary_avg, &self.config.monetary)?;
        let exp_average: Vec<f64> = value_model
            .expected_average_profit_batch(&frequency, &monetary_avg)
            .to_vec();
        rfm.with_column(Column::new("exp_average_value".into(), exp_average))?;

        // Stage 6: discounted present value.
        let cltv = customer_lifetime_value(
            &freq_model,
            &value_model,
            &frequency,
            &recency,
            &tenure,
            &monetary_avg,
            &self.config.ltv,
        )?;
        let cltv_values = cltv.to_vec();
        rfm.with_column(Column::new("cltv".into(), cltv_values.clone()))?;

        // Stage 7: quantile tiers.
        let labels: Vec<&str> = self.config.segment_labels.iter().map(String::as_str).collect();
        let segments = segment(&cltv_values, &labels)?;
        rfm.with_column(Column::new("cltv_segment".into(), segments))?;

        Ok(rfm)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?
        .f64()?
        .into_no_null_iter()
        .collect())
}
