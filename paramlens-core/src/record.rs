//! Domain types for one uploaded backtest record.
//!
//! Numeric fields are parsed best-effort: JSON numbers and numeric strings
//! are accepted, anything else becomes NaN so missing data degrades the
//! downstream aggregates instead of aborting the load. Text fields (`id`,
//! the period dates) also accept numbers, rendered as their JSON text.

use std::fmt;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Grouping key for a test period: `"<start_date> to <end_date>"`.
///
/// Equality is exact string equality; dates are never parsed or normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodKey(String);

impl PeriodKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeriodKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PeriodKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for PeriodKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PeriodKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Date range a backtest was run over, kept as the raw uploaded strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPeriod {
    #[serde(deserialize_with = "required_text")]
    pub start_date: String,
    #[serde(deserialize_with = "required_text")]
    pub end_date: String,
}

impl TestPeriod {
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }

    pub fn key(&self) -> PeriodKey {
        PeriodKey(format!("{} to {}", self.start_date, self.end_date))
    }
}

/// One strategy backtest: its parameters and the metrics it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecord {
    /// Empty when the upload carries no usable id; the loader fills in a
    /// positional one.
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,
    pub test_period: TestPeriod,
    #[serde(default, deserialize_with = "lenient_numbers")]
    pub params: IndexMap<String, f64>,
    #[serde(default, deserialize_with = "lenient_numbers")]
    pub results: IndexMap<String, f64>,
}

impl StrategyRecord {
    pub fn period_key(&self) -> PeriodKey {
        self.test_period.key()
    }

    /// Parameter value, or NaN when the record does not carry it.
    pub fn param(&self, name: &str) -> f64 {
        self.params.get(name).copied().unwrap_or(f64::NAN)
    }

    /// Result value, or NaN when the record does not carry it.
    pub fn result(&self, name: &str) -> f64 {
        self.results.get(name).copied().unwrap_or(f64::NAN)
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(into_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    into_text(Value::deserialize(deserializer)?)
        .ok_or_else(|| D::Error::custom("expected a date string or number"))
}

fn into_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_numbers<'de, D>(deserializer: D) -> Result<IndexMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let Value::Object(map) = raw else {
        return Ok(IndexMap::new());
    };
    Ok(map
        .into_iter()
        .map(|(key, value)| (key, number_or_nan(&value)))
        .collect())
}

fn number_or_nan(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}
