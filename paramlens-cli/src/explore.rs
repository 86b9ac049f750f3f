//! Interactive explore session over stdin.
//!
//! Loads run on the background [`LoadWorker`]; finished loads are applied
//! before each command through [`Session::complete_load`], so a superseded
//! load never overwrites a newer one and a failed load leaves the previous
//! dataset active.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use paramlens_core::{
    ExplorerConfig, LoadOutcome, LoadResponse, LoadTicket, LoadWorker, Metric, Session,
};

use crate::render;
use crate::resolve_period;

const WAIT_TIMEOUT: Duration = Duration::from_secs(30);

const HELP: &str = "\
Commands:
  load <path>       load a strategies file in the background
  wait              block until the latest load has finished
  periods           list test periods (* = active)
  period <n|key>    select a period by index or exact key
  metric <id>       select the metric (see `metrics`)
  metrics           list selectable metrics
  stats             per-parameter statistics for the active period
  series            per-parameter correlation points
  status            current file, period, metric
  help              this text
  quit              leave
";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load(PathBuf),
    Wait,
    Periods,
    Period(String),
    Metric(String),
    Metrics,
    Stats,
    Series,
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };
        match (word, rest.is_empty()) {
            ("", _) => Self::Empty,
            ("load", false) => Self::Load(PathBuf::from(rest)),
            ("wait", true) => Self::Wait,
            ("periods", true) => Self::Periods,
            ("period", false) => Self::Period(rest.to_string()),
            ("metric", false) => Self::Metric(rest.to_string()),
            ("metrics", true) => Self::Metrics,
            ("stats", true) => Self::Stats,
            ("series", true) => Self::Series,
            ("status", true) => Self::Status,
            ("help" | "?", true) => Self::Help,
            ("quit" | "exit" | "q", true) => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Session plus the bookkeeping the prompt needs.
pub struct Explorer {
    session: Session,
    precision: usize,
    pending: Option<(LoadTicket, PathBuf)>,
    current_file: Option<PathBuf>,
}

impl Explorer {
    pub fn new(config: &ExplorerConfig) -> Self {
        Self {
            session: Session::new(config.analysis.metric, config.analysis.options()),
            precision: config.output.precision,
            pending: None,
            current_file: None,
        }
    }

    pub fn start_load(&mut self, worker: &LoadWorker, path: PathBuf) -> String {
        let ticket = self.session.begin_load();
        if !worker.load(ticket, path.clone()) {
            // the new ticket supersedes whatever was pending
            self.pending = None;
            return "load worker is not running\n".to_string();
        }
        let message = format!("loading {} ({ticket})\n", path.display());
        self.pending = Some((ticket, path));
        message
    }

    /// Apply one finished load and describe what happened.
    pub fn apply(&mut self, resp: LoadResponse) -> String {
        let path = match &self.pending {
            Some((ticket, path)) if *ticket == resp.ticket => Some(path.clone()),
            _ => None,
        };
        match self.session.complete_load(resp.ticket, resp.result) {
            LoadOutcome::Applied { records, period } => {
                self.pending = None;
                self.current_file = path.clone();
                let name = path.map(|p| p.display().to_string()).unwrap_or_default();
                let period = period.map_or("(none)".to_string(), |p| p.to_string());
                format!("loaded {name}: {records} strategies, period {period}\n")
            }
            LoadOutcome::Stale => {
                self.forget_superseded();
                format!("ignored superseded load {}\n", resp.ticket)
            }
            LoadOutcome::Rejected(e) => {
                self.pending = None;
                format!("load failed: {e} (keeping previous data)\n")
            }
        }
    }

    /// Apply every load that has finished so far.
    pub fn drain(&mut self, worker: &LoadWorker) -> String {
        worker
            .try_responses()
            .into_iter()
            .map(|resp| self.apply(resp))
            .collect()
    }

    /// Drop the pending load once a newer ticket has been issued; its
    /// completion can only come back stale.
    fn forget_superseded(&mut self) {
        if let Some((ticket, _)) = &self.pending {
            if Some(*ticket) != self.session.latest_ticket() {
                self.pending = None;
            }
        }
    }

    /// Block until the pending load (if any) has been applied or rejected.
    pub fn wait(&mut self, worker: &LoadWorker) -> String {
        let mut out = String::new();
        self.forget_superseded();
        while self.pending.is_some() {
            match worker.recv_timeout(WAIT_TIMEOUT) {
                Some(resp) => out.push_str(&self.apply(resp)),
                None => {
                    out.push_str("timed out waiting for load\n");
                    break;
                }
            }
        }
        out
    }

    /// Run one command. Returns the text to show and whether to keep going.
    pub fn execute(&mut self, command: Command, worker: &LoadWorker) -> (String, bool) {
        let state = self.session.state();
        let text = match command {
            Command::Empty => String::new(),
            Command::Quit => return (String::new(), false),
            Command::Help => HELP.to_string(),
            Command::Load(path) => self.start_load(worker, path),
            Command::Wait => self.wait(worker),
            Command::Metrics => render::metrics_table(state.metric()),
            Command::Periods => {
                let summaries = state.period_summaries();
                if summaries.is_empty() {
                    "no periods loaded\n".to_string()
                } else {
                    render::periods_table(&summaries, state.period())
                }
            }
            Command::Period(input) => match resolve_period(&state.periods(), &input) {
                Ok(key) => {
                    let message = format!("period: {key}\n");
                    self.session.select_period(Some(key));
                    message
                }
                Err(e) => format!("{e}\n"),
            },
            Command::Metric(id) => match id.parse::<Metric>() {
                Ok(metric) => {
                    self.session.select_metric(metric);
                    format!("metric: {} ({})\n", metric.label(), metric.id())
                }
                Err(e) => format!("{e}\n"),
            },
            Command::Stats => render::statistics_table(&self.session.analysis(), self.precision),
            Command::Series => {
                let analysis = self.session.analysis();
                if analysis.is_empty() {
                    "no series for this period\n".to_string()
                } else {
                    render::series_table(&analysis, self.precision)
                }
            }
            Command::Status => self.status(),
            Command::Unknown(line) => format!("unknown command '{line}' (try `help`)\n"),
        };
        (text, true)
    }

    fn status(&self) -> String {
        let state = self.session.state();
        let file = self
            .current_file
            .as_ref()
            .map_or("(none)".to_string(), |p| p.display().to_string());
        let period = state.period().map_or("(none)".to_string(), |p| p.to_string());
        let mut out = format!(
            "file: {file}\nstrategies: {}\nperiod: {period}\nmetric: {} ({})\nversion: {}\n",
            state.records().len(),
            state.metric().label(),
            state.metric().id(),
            state.version(),
        );
        if let Some((ticket, path)) = &self.pending {
            out.push_str(&format!("pending: {} ({ticket})\n", path.display()));
        }
        out
    }
}

/// Run the session until `quit` or end of input.
pub fn run(config: &ExplorerConfig, file: Option<PathBuf>) -> Result<()> {
    let worker = LoadWorker::spawn().context("failed to start load worker")?;
    let mut explorer = Explorer::new(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(path) = file {
        write!(out, "{}", explorer.start_load(&worker, path))?;
        write!(out, "{}", explorer.wait(&worker))?;
    } else {
        write!(out, "{HELP}")?;
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        write!(out, "paramlens> ")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line.context("failed to read input")?;

        write!(out, "{}", explorer.drain(&worker))?;
        let (text, keep_going) = explorer.execute(Command::parse(&line), &worker);
        write!(out, "{text}")?;
        if !keep_going {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = r#"{"strategies": [
        {"id": "s1", "test_period": {"start_date": "2024-01-01", "end_date": "2024-01-31"},
         "params": {"x": 1}, "results": {"total_profit_percent": 5, "trades": 30}},
        {"id": "s2", "test_period": {"start_date": "2024-01-01", "end_date": "2024-01-31"},
         "params": {"x": 3}, "results": {"total_profit_percent": 9, "trades": 10}},
        {"id": "s3", "test_period": {"start_date": "2024-02-01", "end_date": "2024-02-29"},
         "params": {"x": 7}, "results": {"total_profit_percent": 2, "trades": 5}}
    ]}"#;

    fn loaded_explorer(dir: &std::path::Path) -> (Explorer, LoadWorker) {
        let path = dir.join("batch.json");
        std::fs::write(&path, BATCH).unwrap();
        let worker = LoadWorker::spawn().unwrap();
        let mut explorer = Explorer::new(&ExplorerConfig::default());
        explorer.start_load(&worker, path);
        let out = explorer.wait(&worker);
        assert!(out.contains("3 strategies"), "{out}");
        (explorer, worker)
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("  load  data/a.json "), Command::Load("data/a.json".into()));
        assert_eq!(
            Command::parse("period 2024-01-01 to 2024-01-31"),
            Command::Period("2024-01-01 to 2024-01-31".into())
        );
        assert_eq!(Command::parse("metric win_rate"), Command::Metric("win_rate".into()));
        assert_eq!(Command::parse("stats"), Command::Stats);
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("q"), Command::Quit);
        assert_eq!(Command::parse("load"), Command::Unknown("load".into()));
        assert_eq!(Command::parse("stats now"), Command::Unknown("stats now".into()));
    }

    #[test]
    fn stats_after_load() {
        let dir = tempfile::tempdir().unwrap();
        let (mut explorer, worker) = loaded_explorer(dir.path());

        let (text, keep_going) = explorer.execute(Command::Stats, &worker);
        assert!(keep_going);
        assert!(text.contains("Period: 2024-01-01 to 2024-01-31"));
        let row = text.lines().last().unwrap();
        let cells: Vec<&str> = row.split_whitespace().collect();
        assert_eq!(cells, vec!["x", "1", "3", "2", "3"]);
    }

    #[test]
    fn switching_period_and_metric() {
        let dir = tempfile::tempdir().unwrap();
        let (mut explorer, worker) = loaded_explorer(dir.path());

        let (text, _) = explorer.execute(Command::Metric("trades".into()), &worker);
        assert!(text.contains("Total Trades"));
        let (text, _) = explorer.execute(Command::Stats, &worker);
        let cells: Vec<&str> = text.lines().last().unwrap().split_whitespace().collect();
        assert_eq!(cells[4], "1");

        explorer.execute(Command::Period("2".into()), &worker);
        let (text, _) = explorer.execute(Command::Stats, &worker);
        assert!(text.contains("Period: 2024-02-01 to 2024-02-29"));
    }

    #[test]
    fn bad_input_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (mut explorer, worker) = loaded_explorer(dir.path());

        let (text, keep_going) = explorer.execute(Command::Metric("sharpe".into()), &worker);
        assert!(keep_going);
        assert!(text.contains("unknown metric"));

        let (text, _) = explorer.execute(Command::Period("9".into()), &worker);
        assert!(text.contains("out of range"));
    }

    #[test]
    fn failed_load_keeps_previous_data() {
        let dir = tempfile::tempdir().unwrap();
        let (mut explorer, worker) = loaded_explorer(dir.path());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ broken").unwrap();
        explorer.execute(Command::Load(bad), &worker);
        let out = explorer.wait(&worker);
        assert!(out.contains("load failed"), "{out}");

        let (status, _) = explorer.execute(Command::Status, &worker);
        assert!(status.contains("strategies: 3"));
        assert!(status.contains("batch.json"));
    }

    #[test]
    fn wait_returns_at_once_when_pending_load_is_superseded() {
        let dir = tempfile::tempdir().unwrap();
        let (mut explorer, worker) = loaded_explorer(dir.path());

        let next = dir.path().join("next.json");
        std::fs::write(&next, BATCH).unwrap();
        explorer.start_load(&worker, next);
        // a ticket issued with nothing sent, as when the worker has gone away
        explorer.session.begin_load();

        let started = std::time::Instant::now();
        let out = explorer.wait(&worker);
        assert!(started.elapsed() < WAIT_TIMEOUT, "wait blocked: {out}");
        assert!(!out.contains("timed out"), "{out}");
        assert!(explorer.pending.is_none());

        let (status, _) = explorer.execute(Command::Status, &worker);
        assert!(!status.contains("pending"), "{status}");
        assert!(status.contains("batch.json"));
    }

    #[test]
    fn quit_stops_loop() {
        let worker = LoadWorker::spawn().unwrap();
        let mut explorer = Explorer::new(&ExplorerConfig::default());
        let (_, keep_going) = explorer.execute(Command::Quit, &worker);
        assert!(!keep_going);
    }
}
