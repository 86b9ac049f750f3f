//! Export — JSON and CSV renditions of an [`Analysis`].
//!
//! - **JSON**: the whole analysis, NaN written as `null`
//! - **CSV**: one file of per-parameter statistics, one of correlation points
//!   (NaN written as an empty cell)

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::correlation::Analysis;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("json export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pretty JSON of the full analysis.
pub fn export_json(analysis: &Analysis) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(analysis)?)
}

/// Columns: parameter, min, max, avg, best_param_value
pub fn export_statistics_csv(analysis: &Analysis) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["parameter", "min", "max", "avg", "best_param_value"])?;

    for s in &analysis.statistics {
        wtr.write_record([
            s.parameter.clone(),
            cell(s.min),
            cell(s.max),
            cell(s.avg),
            cell(s.best_param_value),
        ])?;
    }

    into_string(wtr)
}

/// Columns: parameter, strategy_id, param_value, metric_value
pub fn export_series_csv(analysis: &Analysis) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["parameter", "strategy_id", "param_value", analysis.metric.id()])?;

    for series in &analysis.series {
        for p in &series.data {
            wtr.write_record([
                series.parameter.clone(),
                p.strategy_id.clone(),
                cell(p.param_value),
                cell(p.metric_value),
            ])?;
        }
    }

    into_string(wtr)
}

/// Write `analysis.json`, `statistics.csv` and `series.csv` into `dir`.
pub fn save_analysis(analysis: &Analysis, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let files = [
        ("analysis.json", export_json(analysis)?),
        ("statistics.csv", export_statistics_csv(analysis)?),
        ("series.csv", export_series_csv(analysis)?),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, content) in files {
        let path = dir.join(name);
        std::fs::write(&path, content).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }

    info!(dir = %dir.display(), files = written.len(), "saved analysis");
    Ok(written)
}

fn cell(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

fn into_string(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
