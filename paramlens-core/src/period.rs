//! Period grouping and filtering.
//!
//! Periods are identified by their [`PeriodKey`] text alone. Listing order is
//! first appearance in the input, never sorted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::record::{PeriodKey, StrategyRecord};

/// A distinct period and how many records fall in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub key: PeriodKey,
    pub record_count: usize,
}

/// Distinct period keys in order of first appearance.
pub fn list_periods(records: &[StrategyRecord]) -> Vec<PeriodKey> {
    period_summaries(records).into_iter().map(|s| s.key).collect()
}

/// Distinct periods with record counts, in order of first appearance.
pub fn period_summaries(records: &[StrategyRecord]) -> Vec<PeriodSummary> {
    let mut counts: IndexMap<PeriodKey, usize> = IndexMap::new();
    for record in records {
        *counts.entry(record.period_key()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(key, record_count)| PeriodSummary { key, record_count })
        .collect()
}

/// Records whose period key equals `key`, in input order.
///
/// An unset key or a key that matches nothing yields an empty vector.
pub fn filter_by_period<'a>(
    records: &'a [StrategyRecord],
    key: Option<&PeriodKey>,
) -> Vec<&'a StrategyRecord> {
    let Some(key) = key else {
        return Vec::new();
    };
    records
        .iter()
        .filter(|r| r.test_period.key() == *key)
        .collect()
}

/// Period selected right after a load: the first record's, not the first sorted.
pub fn default_period(records: &[StrategyRecord]) -> Option<PeriodKey> {
    records.first().map(StrategyRecord::period_key)
}
