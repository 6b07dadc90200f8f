//! End-to-end batch pipeline tests: fault isolation, stage ordering,
//! implicit target dependencies and preprocessing.

use chrono::NaiveDate;

use options_screener::config::{
    DataConfig, FeaturesConfig, PipelineConfig, PreprocessingConfig, TargetConfig, TargetParams,
};
use options_screener::data::{OptionContract, StaticSource};
use options_screener::{
    ChainSnapshot, Error, OptionChain, Pipeline, Preprocessor, TickerOutcome, UnderlyingSeries,
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn contract(strike: f64, last_price: f64, open_interest: u64, volume: u64) -> OptionContract {
    OptionContract {
        strike,
        last_price,
        open_interest,
        volume,
        last_trade_date: date("2024-05-01"),
    }
}

/// A chain with one clearly profitable and one clearly unprofitable contract
/// against a spot of 100.
fn sample_chain() -> OptionChain {
    OptionChain::from_contracts(&[
        contract(80.0, 5.0, 150, 40), // payoff 20, premium 5 -> pct 3.0
        contract(120.0, 2.0, 0, 0),   // out of the money -> pct -1.0
    ])
}

/// `n` observations ending exactly at close 100.0 on 2024-05-03.
fn sample_underlying(n: usize) -> UnderlyingSeries {
    let end = date("2024-05-03");
    let dates: Vec<NaiveDate> = (0..n)
        .map(|i| end - chrono::Duration::days((n - 1 - i) as i64))
        .collect();
    let mut closes: Vec<f64> = (0..n)
        .map(|i| 100.0 + (i as f64 * 0.4).sin() * 3.0)
        .collect();
    *closes.last_mut().unwrap() = 100.0;
    UnderlyingSeries::new(dates, closes)
}

fn snapshot(n_history: usize) -> ChainSnapshot {
    ChainSnapshot::new(sample_chain(), sample_underlying(n_history), "2024-06-21")
        .as_of(date("2024-05-03"))
}

fn config(types: &[&str], target_kind: &str) -> PipelineConfig {
    PipelineConfig {
        data: DataConfig {
            tickers: vec!["AAA".into(), "BBB".into(), "CCC".into()],
            start_date: Some("2023-09-01".into()),
            end_date: Some("auto".into()),
        },
        features: FeaturesConfig {
            types: types.iter().map(|t| t.to_string()).collect(),
            basic: vec![
                "moneyness_ratio".into(),
                "time_to_expiry".into(),
                "historical_volatility_30d".into(),
                "volume_oi_ratio".into(),
            ],
            technical: vec!["rsi".into(), "macd".into(), "moving_average_50".into()],
            advanced: vec![
                "implied_volatility".into(),
                "delta".into(),
                "gamma".into(),
                "theta".into(),
                "vega".into(),
                "iv_to_hv_ratio".into(),
            ],
            fundamental: vec!["market_cap".into()],
            risk_free_rate: 0.05,
            next_earnings_date: None,
        },
        target: TargetConfig {
            kind: target_kind.into(),
            params: TargetParams::default(),
        },
        preprocessing: PreprocessingConfig::default(),
    }
}

fn three_ticker_source() -> StaticSource {
    let mut source = StaticSource::new();
    source.insert("AAA", snapshot(220));
    source.insert("BBB", snapshot(220));
    source.insert("CCC", snapshot(220));
    source
}

#[test]
fn test_batch_combines_all_healthy_tickers() {
    let pipeline = Pipeline::new(config(&["basic", "advanced"], "profit")).unwrap();
    let report = pipeline.run(&three_ticker_source()).unwrap();

    assert_eq!(report.processed(), 3);
    assert_eq!(report.skipped(), 0);
    assert_eq!(report.data.len(), 6);
    assert_eq!(report.data.tickers().len(), 6);
    assert_eq!(report.data.tickers()[0], "AAA");
    assert_eq!(report.data.tickers()[5], "CCC");
}

#[test]
fn test_one_bad_ticker_is_isolated() {
    let mut source = StaticSource::new();
    source.insert("AAA", snapshot(220));
    // Empty underlying: no spot price can be computed.
    source.insert(
        "BBB",
        ChainSnapshot::new(sample_chain(), UnderlyingSeries::default(), "2024-06-21")
            .as_of(date("2024-05-03")),
    );
    source.insert("CCC", snapshot(220));

    let pipeline = Pipeline::new(config(&["basic"], "profit")).unwrap();
    let report = pipeline.run(&source).unwrap();

    assert_eq!(report.processed(), 2);
    assert_eq!(report.data.len(), 4);
    let bbb = report
        .outcomes
        .iter()
        .find(|(t, _)| t == "BBB")
        .map(|(_, o)| o)
        .unwrap();
    assert!(matches!(bbb, TickerOutcome::Skipped { .. }));
}

#[test]
fn test_all_tickers_failing_is_aggregate_failure() {
    let mut source = StaticSource::new();
    for ticker in ["AAA", "BBB", "CCC"] {
        source.insert(
            ticker,
            ChainSnapshot::new(OptionChain::default(), sample_underlying(220), "2024-06-21")
                .as_of(date("2024-05-03")),
        );
    }

    let pipeline = Pipeline::new(config(&["basic"], "profit")).unwrap();
    let err = pipeline.run(&source).unwrap_err();
    assert!(matches!(err, Error::NoValidData));
}

#[test]
fn test_unknown_feature_type_fails_fast() {
    let err = Pipeline::new(config(&["basic", "quantum"], "profit")).unwrap_err();
    assert!(matches!(err, Error::UnknownFeatureType(ref t) if t == "quantum"));
    assert!(err.is_configuration());
}

#[test]
fn test_unknown_target_type_fails_fast() {
    let err = Pipeline::new(config(&["basic"], "sharpe")).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_misordered_stages_rejected_at_construction() {
    let err = Pipeline::new(config(&["advanced"], "profit")).unwrap_err();
    match err {
        Error::InvalidStageOrder { stage, column } => {
            assert_eq!(stage, "advanced");
            assert_eq!(column, "time_to_expiry");
        }
        other => panic!("expected InvalidStageOrder, got {other:?}"),
    }
}

#[test]
fn test_delta_target_injects_advanced_stage() {
    // Only the basic stage is configured, but the delta-profit target needs
    // the delta column; the orchestrator runs the advanced stage implicitly.
    let pipeline = Pipeline::new(config(&["basic"], "delta_profit")).unwrap();
    let report = pipeline.run(&three_ticker_source()).unwrap();

    assert!(report.data.has_column("delta"));
    assert!(report.data.has_column("implied_volatility"));
    assert_eq!(report.data.target().unwrap().len(), report.data.len());
}

#[test]
fn test_profit_labels_follow_strict_rule() {
    let pipeline = Pipeline::new(config(&["basic"], "profit")).unwrap();
    let report = pipeline.run(&three_ticker_source()).unwrap();

    let pct = report.data.feature("profit_percentage").unwrap();
    let target = report.data.target().unwrap();
    for (p, t) in pct.iter().zip(target) {
        assert_eq!(*t, *p > 0.005, "pct {p} mislabeled");
    }
    // Per sample_chain: ITM contract labeled true, OTM false, per ticker.
    assert_eq!(target, &[true, false, true, false, true, false]);
}

#[test]
fn test_unparseable_expiration_skips_only_that_ticker() {
    let mut source = StaticSource::new();
    source.insert("AAA", snapshot(220));
    source.insert(
        "BBB",
        ChainSnapshot::new(sample_chain(), sample_underlying(220), "06/21/2024")
            .as_of(date("2024-05-03")),
    );
    source.insert("CCC", snapshot(220));

    let pipeline = Pipeline::new(config(&["basic"], "profit")).unwrap();
    let report = pipeline.run(&source).unwrap();

    assert_eq!(report.processed(), 2);
    let (_, outcome) = report.outcomes.iter().find(|(t, _)| t == "BBB").unwrap();
    match outcome {
        TickerOutcome::Skipped { reason } => assert!(reason.contains("expiration")),
        other => panic!("expected skip, got {other:?}"),
    }
}

#[test]
fn test_end_to_end_dataset() {
    let config = config(&["basic", "technical", "advanced"], "profit");
    let pipeline = Pipeline::new(config).unwrap();
    let report = pipeline.run(&three_ticker_source()).unwrap();

    let preprocessor = Preprocessor::from_config(pipeline.config()).unwrap();
    let dataset = preprocessor.transform(&report.data).unwrap();

    // Row count preserved; the absent fundamental column was skipped.
    assert_eq!(dataset.x.nrows(), report.data.len());
    assert_eq!(dataset.y.len(), report.data.len());
    assert!(!dataset.columns.contains(&"market_cap".to_string()));
    assert!(dataset.columns.contains(&"delta".to_string()));

    // Fully numeric output: imputation removed every NaN.
    assert!(dataset.x.iter().all(|v| v.is_finite()));

    // Standardized: each column has zero mean and unit variance (or is a
    // zero-variance column centered at zero).
    let n = dataset.x.nrows() as f64;
    for column in dataset.x.columns() {
        let mean = column.sum() / n;
        let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 1e-9, "column mean {mean}");
        assert!(var.abs() < 1e-9 || (var - 1.0).abs() < 1e-9, "variance {var}");
    }

    // Labels carried through unchanged.
    let expected: Vec<f64> = report
        .data
        .target()
        .unwrap()
        .iter()
        .map(|t| if *t { 1.0 } else { 0.0 })
        .collect();
    assert_eq!(dataset.y.to_vec(), expected);
}
