//! ParamLens Core — parameter/metric correlation over batches of backtest records.
//!
//! Pipeline, each stage depending only on the one before it:
//! - Loader: uploaded JSON text → strategy records
//! - Period grouping: distinct test periods, records of the active period
//! - Correlation engine: per-parameter series and summary statistics
//!
//! Around the pipeline: a versioned session that arbitrates competing
//! loads, a background load worker, TOML configuration and CSV/JSON export.

pub mod config;
pub mod correlation;
pub mod export;
pub mod loader;
pub mod metric;
pub mod period;
pub mod record;
pub mod session;
pub mod worker;

pub use config::{AnalysisConfig, ConfigError, ExplorerConfig, OutputConfig, OutputFormat};
pub use correlation::{
    analyze, best_point, build_series, compute_statistics, parameter_universe, summarize,
    Analysis, AnalysisOptions, CorrelationPoint, MissingPolicy, ParameterSchema, ParameterSeries,
    ParameterStatistics,
};
pub use export::{export_json, export_series_csv, export_statistics_csv, save_analysis, ExportError};
pub use loader::{load_file, parse_records, Dataset, LoadError, ParseError};
pub use metric::{Metric, UnknownMetric};
pub use period::{default_period, filter_by_period, list_periods, period_summaries, PeriodSummary};
pub use record::{PeriodKey, StrategyRecord, TestPeriod};
pub use session::{ExplorerState, LoadOutcome, LoadTicket, Session};
pub use worker::{LoadCommand, LoadResponse, LoadWorker};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn records_are_send_sync() {
        assert_send::<StrategyRecord>();
        assert_sync::<StrategyRecord>();
        assert_send::<Dataset>();
        assert_sync::<Dataset>();
    }

    #[test]
    fn analysis_is_send_sync() {
        assert_send::<Analysis>();
        assert_sync::<Analysis>();
    }

    #[test]
    fn session_state_is_send_sync() {
        assert_send::<ExplorerState>();
        assert_sync::<ExplorerState>();
        assert_send::<Session>();
        assert_sync::<Session>();
    }

    #[test]
    fn load_messages_are_send() {
        assert_send::<LoadCommand>();
        assert_send::<LoadResponse>();
    }
}
