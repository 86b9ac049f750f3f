//! Plain-text tables for the terminal. Each function returns the full text,
//! newline-terminated, so callers decide where it goes.

use paramlens_core::{Analysis, Metric, PeriodKey, PeriodSummary};

pub fn metrics_table(default: Metric) -> String {
    let mut lines = vec![
        format!("{:<22} {}", "Metric", "Label"),
        "-".repeat(46),
    ];
    for metric in Metric::ALL {
        let marker = if metric == default { " (default)" } else { "" };
        lines.push(format!("{:<22} {}{marker}", metric.id(), metric.label()));
    }
    finish(lines)
}

pub fn periods_table(summaries: &[PeriodSummary], active: Option<&PeriodKey>) -> String {
    let mut lines = vec![
        format!("{:>3}  {:<32} {:>8}", "#", "Period", "Records"),
        "-".repeat(46),
    ];
    for (i, s) in summaries.iter().enumerate() {
        let marker = if Some(&s.key) == active { " *" } else { "" };
        lines.push(format!(
            "{:>3}  {:<32} {:>8}{marker}",
            i + 1,
            s.key.as_str(),
            s.record_count
        ));
    }
    finish(lines)
}

pub fn statistics_table(analysis: &Analysis, precision: usize) -> String {
    let period = analysis.period.as_ref().map_or("(none)", PeriodKey::as_str);
    let mut lines = vec![
        format!("Period: {period}"),
        format!("Metric: {} ({})", analysis.metric.label(), analysis.metric.id()),
    ];

    if analysis.statistics.is_empty() {
        lines.push("No strategies in this period.".to_string());
        return finish(lines);
    }

    let name_width = analysis
        .statistics
        .iter()
        .map(|s| s.parameter.len())
        .max()
        .unwrap_or(0)
        .max("Parameter".len());

    lines.push(String::new());
    lines.push(format!(
        "{:<name_width$}  {:>14} {:>14} {:>14} {:>14}",
        "Parameter", "Min", "Max", "Avg", "Best"
    ));
    lines.push("-".repeat(name_width + 2 + 15 * 4));
    for s in &analysis.statistics {
        lines.push(format!(
            "{:<name_width$}  {:>14} {:>14} {:>14} {:>14}",
            s.parameter,
            number(s.min, precision),
            number(s.max, precision),
            number(s.avg, precision),
            number(s.best_param_value, precision),
        ));
    }
    finish(lines)
}

pub fn series_table(analysis: &Analysis, precision: usize) -> String {
    let mut lines = Vec::new();
    for series in &analysis.series {
        lines.push(String::new());
        lines.push(format!("{} vs {}", series.parameter, analysis.metric.label()));
        lines.push(format!("{:<24} {:>14} {:>14}", "Strategy", "Value", "Metric"));
        for p in &series.data {
            lines.push(format!(
                "{:<24} {:>14} {:>14}",
                p.strategy_id,
                number(p.param_value, precision),
                number(p.metric_value, precision),
            ));
        }
    }
    finish(lines)
}

/// Fixed precision, trailing zeros trimmed; NaN shows as `-`.
pub fn number(v: f64, precision: usize) -> String {
    if v.is_nan() {
        return "-".to_string();
    }
    let s = format!("{v:.precision$}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

fn finish(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramlens_core::{ParameterStatistics, PeriodSummary};

    #[test]
    fn number_trims_trailing_zeros() {
        assert_eq!(number(2.0, 4), "2");
        assert_eq!(number(2.5, 4), "2.5");
        assert_eq!(number(1.0 / 3.0, 3), "0.333");
        assert_eq!(number(-0.126, 2), "-0.13");
    }

    #[test]
    fn number_shows_nan_as_dash() {
        assert_eq!(number(f64::NAN, 4), "-");
    }

    #[test]
    fn number_zero_precision() {
        assert_eq!(number(10.0, 0), "10");
    }

    #[test]
    fn metrics_table_marks_default() {
        let table = metrics_table(Metric::WinRate);
        let line = table.lines().find(|l| l.starts_with("win_rate")).unwrap();
        assert!(line.ends_with("(default)"));
        assert_eq!(table.lines().count(), 2 + Metric::ALL.len());
    }

    #[test]
    fn periods_table_marks_active() {
        let summaries = vec![
            PeriodSummary {
                key: PeriodKey::from("a to b"),
                record_count: 3,
            },
            PeriodSummary {
                key: PeriodKey::from("c to d"),
                record_count: 1,
            },
        ];
        let active = PeriodKey::from("c to d");
        let table = periods_table(&summaries, Some(&active));
        let lines: Vec<&str> = table.lines().collect();
        assert!(!lines[2].ends_with('*'));
        assert!(lines[3].ends_with('*'));
    }

    #[test]
    fn statistics_table_lists_parameters() {
        let analysis = Analysis {
            period: Some(PeriodKey::from("a to b")),
            metric: Metric::Trades,
            series: Vec::new(),
            statistics: vec![ParameterStatistics {
                parameter: "lookback_window".into(),
                min: 1.0,
                max: 3.0,
                avg: 2.0,
                best_param_value: f64::NAN,
            }],
        };
        let table = statistics_table(&analysis, 4);
        assert!(table.starts_with("Period: a to b\nMetric: Total Trades (trades)\n"));
        let row = table.lines().last().unwrap();
        assert!(row.starts_with("lookback_window"));
        assert!(row.trim_end().ends_with('-'));
    }

    #[test]
    fn empty_analysis_says_so() {
        let analysis = Analysis {
            period: None,
            metric: Metric::Trades,
            series: Vec::new(),
            statistics: Vec::new(),
        };
        assert!(statistics_table(&analysis, 2).contains("No strategies in this period."));
        assert_eq!(series_table(&analysis, 2), "");
    }
}
