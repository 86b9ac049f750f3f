//! End-to-end pipeline scenarios: load → group → filter → analyze.

use paramlens_core::{
    analyze, filter_by_period, list_periods, parse_records, AnalysisOptions, Dataset, LoadOutcome,
    Metric, ParseError, PeriodKey, Session,
};

const SCENARIO_A: &str = r#"{
    "strategies": [
        {"id": "s1", "test_period": {"start_date": "2024-01-01", "end_date": "2024-01-31"},
         "params": {"x": 1}, "results": {"total_profit_percent": 5}},
        {"id": "s2", "test_period": {"start_date": "2024-01-01", "end_date": "2024-01-31"},
         "params": {"x": 3}, "results": {"total_profit_percent": 9}}
    ]
}"#;

const SCENARIO_B: &str = r#"{
    "strategies": [
        {"id": "s1", "test_period": {"start_date": "2024-01-01", "end_date": "2024-01-31"},
         "params": {"x": 1, "y": 10}, "results": {"total_profit_percent": 5, "trades": 40}},
        {"id": "odd", "test_period": {"start_date": "2024-02-01", "end_date": "2024-02-29"},
         "params": {"x": 100, "y": 1000}, "results": {"total_profit_percent": 99, "trades": 1}},
        {"id": "s2", "test_period": {"start_date": "2024-01-01", "end_date": "2024-01-31"},
         "params": {"x": 3, "y": 30}, "results": {"total_profit_percent": 9, "trades": 20}}
    ]
}"#;

#[test]
fn scenario_a_single_period_statistics() {
    let records = parse_records(SCENARIO_A).unwrap();

    let periods = list_periods(&records);
    assert_eq!(periods, vec![PeriodKey::from("2024-01-01 to 2024-01-31")]);

    let filtered = filter_by_period(&records, periods.first());
    assert_eq!(filtered.len(), 2);

    let analysis = analyze(
        &filtered,
        periods.first().cloned(),
        Metric::TotalProfitPercent,
        AnalysisOptions::default(),
    );
    let x = analysis.statistics_for("x").unwrap();
    assert_eq!((x.min, x.max, x.avg, x.best_param_value), (1.0, 3.0, 2.0, 3.0));

    let series = analysis.series_for("x").unwrap();
    assert_eq!(series.data.len(), 2);
    assert_eq!(series.data[1].strategy_id, "s2");
    assert_eq!(series.data[1].metric_value, 9.0);
}

#[test]
fn scenario_b_other_period_is_excluded() {
    let records = parse_records(SCENARIO_B).unwrap();
    let first = records[0].period_key();

    let filtered = filter_by_period(&records, Some(&first));
    let ids: Vec<&str> = filtered.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["s1", "s2"]);

    let analysis = analyze(&filtered, Some(first), Metric::Trades, AnalysisOptions::default());
    let y = analysis.statistics_for("y").unwrap();
    assert_eq!(y.max, 30.0);
    // s1 has more trades
    assert_eq!(y.best_param_value, 10.0);
}

#[test]
fn scenario_c_empty_batch() {
    let records = parse_records(r#"{"strategies": []}"#).unwrap();
    assert!(list_periods(&records).is_empty());

    let filtered = filter_by_period(&records, None);
    let analysis = analyze(&filtered, None, Metric::default(), AnalysisOptions::default());
    assert!(analysis.series.is_empty());
    assert!(analysis.statistics.is_empty());
}

#[test]
fn scenario_d_malformed_json_keeps_prior_records() {
    let mut session = Session::default();
    let first = session.begin_load();
    session.complete_load(first, Dataset::from_text(SCENARIO_B));

    let second = session.begin_load();
    let outcome = session.complete_load(second, Dataset::from_text(r#"{"strategies": [}"#));
    assert!(matches!(outcome, LoadOutcome::Rejected(ParseError::Syntax { .. })));

    // previous periods are still selectable
    let periods = session.periods();
    assert_eq!(periods.len(), 2);
    session.select_period(Some(periods[1].clone()));
    let analysis = session.analysis();
    assert_eq!(analysis.statistics_for("x").unwrap().best_param_value, 100.0);
}

#[test]
fn engine_is_idempotent() {
    let records = parse_records(SCENARIO_B).unwrap();
    let key = records[0].period_key();
    let filtered = filter_by_period(&records, Some(&key));

    let a = analyze(
        &filtered,
        Some(key.clone()),
        Metric::TotalProfitPercent,
        AnalysisOptions::default(),
    );
    let b = analyze(&filtered, Some(key), Metric::TotalProfitPercent, AnalysisOptions::default());
    assert_eq!(a, b);
}

#[test]
fn switching_metric_changes_best_performer_only() {
    let mut session = Session::default();
    let ticket = session.begin_load();
    session.complete_load(ticket, Dataset::from_text(SCENARIO_B));

    let by_profit = session.analysis();
    session.select_metric(Metric::Trades);
    let by_trades = session.analysis();

    let p = by_profit.statistics_for("x").unwrap();
    let t = by_trades.statistics_for("x").unwrap();
    assert_eq!((p.min, p.max, p.avg), (t.min, t.max, t.avg));
    assert_eq!(p.best_param_value, 3.0);
    assert_eq!(t.best_param_value, 1.0);
}
