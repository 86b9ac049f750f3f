//! Correlation & statistics engine.
//!
//! For one filtered period and one metric, builds a series of
//! (parameter value, metric value, strategy id) points per parameter and
//! summarizes each series with min / max / mean and the parameter value of
//! the best performer.
//!
//! Everything here is a pure function of its inputs. Missing values are NaN
//! and, under the default [`MissingPolicy::Propagate`], poison min/max/avg
//! exactly as an untyped reduction would.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metric::Metric;
use crate::record::{PeriodKey, StrategyRecord};

/// One (parameter, strategy) observation within the active period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationPoint {
    pub param_value: f64,
    pub metric_value: f64,
    pub strategy_id: String,
}

/// All observations for one parameter, in filtered record order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSeries {
    pub parameter: String,
    pub data: Vec<CorrelationPoint>,
}

/// Summary of one parameter's series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterStatistics {
    pub parameter: String,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    /// Parameter value of the strategy with the greatest metric value.
    pub best_param_value: f64,
}

/// Which parameter keys get a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterSchema {
    /// Keys of the first filtered record, in its key order.
    #[default]
    FirstRecord,
    /// Every key seen in the filtered set, in first-appearance order.
    Union,
}

/// How min / max / avg treat NaN parameter values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// A single NaN makes the aggregate NaN.
    #[default]
    Propagate,
    /// NaN values are left out; an all-NaN series aggregates to NaN.
    Skip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    #[serde(default)]
    pub schema: ParameterSchema,
    #[serde(default)]
    pub missing: MissingPolicy,
}

/// Engine output for one (period, metric) selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub period: Option<PeriodKey>,
    pub metric: Metric,
    pub series: Vec<ParameterSeries>,
    pub statistics: Vec<ParameterStatistics>,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn statistics_for(&self, parameter: &str) -> Option<&ParameterStatistics> {
        self.statistics.iter().find(|s| s.parameter == parameter)
    }

    pub fn series_for(&self, parameter: &str) -> Option<&ParameterSeries> {
        self.series.iter().find(|s| s.parameter == parameter)
    }
}

/// Parameter keys that get a series under `schema`.
pub fn parameter_universe(records: &[&StrategyRecord], schema: ParameterSchema) -> Vec<String> {
    match schema {
        ParameterSchema::FirstRecord => records
            .first()
            .map(|r| r.params.keys().cloned().collect())
            .unwrap_or_default(),
        ParameterSchema::Union => {
            let mut keys: IndexSet<&str> = IndexSet::new();
            for record in records {
                keys.extend(record.params.keys().map(String::as_str));
            }
            keys.into_iter().map(str::to_string).collect()
        }
    }
}

/// One series per parameter, one point per filtered record.
pub fn build_series(
    records: &[&StrategyRecord],
    metric: Metric,
    schema: ParameterSchema,
) -> Vec<ParameterSeries> {
    parameter_universe(records, schema)
        .into_iter()
        .map(|parameter| {
            let data = records
                .iter()
                .map(|r| CorrelationPoint {
                    param_value: r.param(&parameter),
                    metric_value: metric.extract(r),
                    strategy_id: r.id.clone(),
                })
                .collect();
            ParameterSeries { parameter, data }
        })
        .collect()
}

/// Summaries for each series, in series order.
pub fn compute_statistics(
    series: &[ParameterSeries],
    missing: MissingPolicy,
) -> Vec<ParameterStatistics> {
    series.iter().map(|s| summarize(s, missing)).collect()
}

/// Summary of a single series. An empty series summarizes to NaN throughout.
pub fn summarize(series: &ParameterSeries, missing: MissingPolicy) -> ParameterStatistics {
    let values: Vec<f64> = match missing {
        MissingPolicy::Propagate => series.data.iter().map(|p| p.param_value).collect(),
        MissingPolicy::Skip => series
            .data
            .iter()
            .map(|p| p.param_value)
            .filter(|v| !v.is_nan())
            .collect(),
    };

    let (min, max, avg) = if values.is_empty() {
        (f64::NAN, f64::NAN, f64::NAN)
    } else {
        (
            nan_propagating_min(&values),
            nan_propagating_max(&values),
            values.iter().sum::<f64>() / values.len() as f64,
        )
    };

    ParameterStatistics {
        parameter: series.parameter.clone(),
        min,
        max,
        avg,
        best_param_value: best_point(&series.data).map_or(f64::NAN, |p| p.param_value),
    }
}

/// Point with the strictly greatest metric value, scanning left to right.
///
/// Starts from the first point, so ties keep the earliest and NaN metric
/// values never displace a current best.
pub fn best_point(data: &[CorrelationPoint]) -> Option<&CorrelationPoint> {
    let (first, rest) = data.split_first()?;
    Some(rest.iter().fold(first, |best, p| {
        if p.metric_value > best.metric_value {
            p
        } else {
            best
        }
    }))
}

/// Series and statistics for the filtered records of one period.
///
/// An empty filtered set produces an empty analysis.
pub fn analyze(
    records: &[&StrategyRecord],
    period: Option<PeriodKey>,
    metric: Metric,
    options: AnalysisOptions,
) -> Analysis {
    let series = build_series(records, metric, options.schema);
    let statistics = compute_statistics(&series, options.missing);
    debug!(
        period = period.as_ref().map(PeriodKey::as_str).unwrap_or("<none>"),
        metric = metric.id(),
        records = records.len(),
        parameters = series.len(),
        "computed parameter correlation"
    );
    Analysis {
        period,
        metric,
        series,
        statistics,
    }
}

// f64::min/max skip NaN; these must not.
fn nan_propagating_min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, |acc, v| {
        if acc.is_nan() || v.is_nan() {
            f64::NAN
        } else {
            acc.min(v)
        }
    })
}

fn nan_propagating_max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, |acc, v| {
        if acc.is_nan() || v.is_nan() {
            f64::NAN
        } else {
            acc.max(v)
        }
    })
}

// ─── Tests ───────────────────────────────────────────────────────────
