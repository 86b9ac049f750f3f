//! Explorer session — the current (dataset, period, metric) triple.
//!
//! State is an immutable, versioned [`ExplorerState`] snapshot. Every user
//! action replaces the whole snapshot, so readers never observe a dataset
//! paired with a period from a different upload.
//!
//! Loads are tagged with a monotonic [`LoadTicket`]. Only a completion for
//! the most recently issued ticket is applied; anything older is discarded
//! as stale, whatever order the completions arrive in.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::correlation::{analyze, Analysis, AnalysisOptions};
use crate::loader::Dataset;
use crate::metric::Metric;
use crate::period::{
    default_period, filter_by_period, list_periods, period_summaries, PeriodSummary,
};
use crate::record::{PeriodKey, StrategyRecord};

/// Sequence number identifying one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoadTicket(pub u64);

impl fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What happened to a load completion handed to [`Session::complete_load`].
#[derive(Debug)]
pub enum LoadOutcome<E> {
    /// The dataset replaced the previous one.
    Applied {
        records: usize,
        period: Option<PeriodKey>,
    },
    /// A newer load was issued (or this one was already applied); ignored.
    Stale,
    /// The load failed; the previous dataset stays active.
    Rejected(E),
}

/// Immutable snapshot of what the user is looking at.
#[derive(Debug, Clone)]
pub struct ExplorerState {
    version: u64,
    dataset: Arc<Dataset>,
    period: Option<PeriodKey>,
    metric: Metric,
}

impl ExplorerState {
    pub fn new(metric: Metric) -> Self {
        Self {
            version: 0,
            dataset: Arc::new(Dataset::empty()),
            period: None,
            metric,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn records(&self) -> &[StrategyRecord] {
        &self.dataset.records
    }

    pub fn period(&self) -> Option<&PeriodKey> {
        self.period.as_ref()
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn periods(&self) -> Vec<PeriodKey> {
        list_periods(self.records())
    }

    pub fn period_summaries(&self) -> Vec<PeriodSummary> {
        period_summaries(self.records())
    }

    /// Records in the active period.
    pub fn filtered(&self) -> Vec<&StrategyRecord> {
        filter_by_period(self.records(), self.period.as_ref())
    }

    pub fn analysis(&self, options: AnalysisOptions) -> Analysis {
        analyze(&self.filtered(), self.period.clone(), self.metric, options)
    }

    fn next(&self, dataset: Arc<Dataset>, period: Option<PeriodKey>, metric: Metric) -> Self {
        Self {
            version: self.version + 1,
            dataset,
            period,
            metric,
        }
    }
}

/// Owns the current snapshot and arbitrates competing loads.
#[derive(Debug)]
pub struct Session {
    state: ExplorerState,
    options: AnalysisOptions,
    issued: u64,
    completed: Option<LoadTicket>,
}

impl Session {
    pub fn new(metric: Metric, options: AnalysisOptions) -> Self {
        Self {
            state: ExplorerState::new(metric),
            options,
            issued: 0,
            completed: None,
        }
    }

    pub fn state(&self) -> &ExplorerState {
        &self.state
    }

    pub fn options(&self) -> AnalysisOptions {
        self.options
    }

    pub fn set_options(&mut self, options: AnalysisOptions) {
        self.options = options;
    }

    /// Issue a ticket for a new load. Any earlier ticket becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        LoadTicket(self.issued)
    }

    /// The most recently issued ticket, if any.
    pub fn latest_ticket(&self) -> Option<LoadTicket> {
        (self.issued > 0).then_some(LoadTicket(self.issued))
    }

    /// Apply a finished load if it is still the latest one.
    ///
    /// A successful load replaces the dataset and selects the first record's
    /// period; the metric selection carries over.
    pub fn complete_load<E: fmt::Display>(
        &mut self,
        ticket: LoadTicket,
        result: Result<Dataset, E>,
    ) -> LoadOutcome<E> {
        if ticket.0 != self.issued || self.completed == Some(ticket) {
            warn!(%ticket, latest = self.issued, "discarding stale load completion");
            return LoadOutcome::Stale;
        }
        self.completed = Some(ticket);

        match result {
            Ok(dataset) => {
                let period = default_period(&dataset.records);
                let records = dataset.len();
                self.state = self
                    .state
                    .next(Arc::new(dataset), period.clone(), self.state.metric);
                info!(
                    %ticket,
                    records,
                    period = period.as_ref().map(PeriodKey::as_str).unwrap_or("<none>"),
                    version = self.state.version,
                    "applied load"
                );
                LoadOutcome::Applied { records, period }
            }
            Err(e) => {
                warn!(%ticket, error = %e, "load failed, keeping previous dataset");
                LoadOutcome::Rejected(e)
            }
        }
    }

    /// Select a period. `None` clears the selection.
    pub fn select_period(&mut self, period: Option<PeriodKey>) {
        self.state = self
            .state
            .next(self.state.dataset.clone(), period, self.state.metric);
    }

    pub fn select_metric(&mut self, metric: Metric) {
        self.state = self
            .state
            .next(self.state.dataset.clone(), self.state.period.clone(), metric);
    }

    pub fn periods(&self) -> Vec<PeriodKey> {
        self.state.periods()
    }

    /// Recompute the analysis for the current snapshot.
    pub fn analysis(&self) -> Analysis {
        self.state.analysis(self.options)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Metric::default(), AnalysisOptions::default())
    }
}
