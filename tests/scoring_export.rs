use std::sync::Once;

use _core::scoring::ScoringOp;
use _core::{
    HolidayFlagger, HolidayFlaggerConfig, InputKind, Jurisdiction, RecipeError, ScoringPipeline,
};
use chrono::NaiveDate;
use polars::prelude::*;
use pretty_assertions::assert_eq;

static INIT: Once = Once::new();

fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn text_dates() -> Vec<Option<&'static str>> {
    vec![
        Some("2022-12-31"),
        Some("2023-01-01"),
        Some("2023-06-24"),
        Some("2023-07-01 08:30:00"),
        None,
        Some("None"),
        Some(""),
        Some("garbage"),
        Some("2024-02-19"),
        Some("2024-08-05"),
        Some("2024-11-11"),
        Some("2025-12-26"),
    ]
}

fn fitted_on(df: &DataFrame) -> HolidayFlagger {
    let mut flagger = HolidayFlagger::new(HolidayFlaggerConfig::new("date"));
    flagger.fit(df).unwrap();
    flagger
}

#[test]
fn export_requires_a_fitted_flagger() {
    init_logger();
    let flagger = HolidayFlagger::new(HolidayFlaggerConfig::new("date"));
    assert!(matches!(
        flagger.export_scoring_pipeline(InputKind::Str),
        Err(RecipeError::NotFitted(_))
    ));
}

#[test]
fn pipeline_matches_transform_for_text_input() {
    init_logger();
    let dates = text_dates();
    let df = df!("date" => &dates).unwrap();
    let flagger = fitted_on(&df);

    let expected = flagger.transform(&df).unwrap();
    let pipeline = flagger.export_scoring_pipeline(InputKind::Str).unwrap();
    let actual = pipeline.evaluate(&df).unwrap();

    assert_eq!(actual.get_column_names(), expected.get_column_names());
    assert!(actual.equals(&expected));
}

#[test]
fn pipeline_matches_transform_for_integer_input() {
    init_logger();
    let dates = vec![Some(20230701i64), Some(20231225), None, Some(123), Some(20240916)];
    let df = df!("date" => &dates).unwrap();
    let flagger = fitted_on(&df);

    let expected = flagger.transform(&df).unwrap();
    let pipeline = flagger.export_scoring_pipeline(InputKind::Int).unwrap();
    assert!(pipeline.evaluate(&df).unwrap().equals(&expected));
}

#[test]
fn pipeline_matches_transform_for_date_input() {
    init_logger();
    let dates: Vec<Option<NaiveDate>> = vec![
        NaiveDate::from_ymd_opt(2024, 7, 1),
        None,
        NaiveDate::from_ymd_opt(2024, 6, 10),
        NaiveDate::from_ymd_opt(2025, 3, 1),
    ];
    let df = DataFrame::new(vec![Column::new("date".into(), &dates)]).unwrap();
    let flagger = fitted_on(&df);

    let expected = flagger.transform(&df).unwrap();
    let pipeline = flagger.export_scoring_pipeline(InputKind::Date).unwrap();
    assert!(pipeline.evaluate(&df).unwrap().equals(&expected));
}

#[test]
fn pipeline_matches_transform_for_float_input() {
    init_logger();
    let df = df!("date" => [Some(20240701.0f64), None, Some(f64::NAN), Some(20251225.0)]).unwrap();
    let flagger = fitted_on(&df);

    let expected = flagger.transform(&df).unwrap();
    let pipeline = flagger.export_scoring_pipeline(InputKind::Float).unwrap();
    assert!(matches!(
        &pipeline.ops[..2],
        [ScoringOp::AsType { .. }, ScoringOp::AsType { .. }]
    ));
    let actual = pipeline.evaluate(&df).unwrap();
    assert!(actual.equals(&expected));
    assert_eq!(
        actual.column("is_CA_holiday_country").unwrap().i32().unwrap().into_iter().collect::<Vec<_>>(),
        vec![Some(1), Some(0), Some(0), Some(1)]
    );
}

#[test]
fn evaluate_requires_the_input_column() {
    init_logger();
    let df = df!("date" => [Some("2024-07-01")]).unwrap();
    let pipeline = fitted_on(&df)
        .export_scoring_pipeline(InputKind::Str)
        .unwrap();
    let other = df!("when" => [Some("2024-07-01")]).unwrap();
    assert!(matches!(
        pipeline.evaluate(&other),
        Err(RecipeError::MissingColumn(c)) if c == "date"
    ));
}

#[test]
fn pipeline_survives_json() {
    init_logger();
    let df = df!("date" => [Some("2024-01-01"), Some("2024-12-31")]).unwrap();
    let pipeline = fitted_on(&df)
        .export_scoring_pipeline(InputKind::Str)
        .unwrap();

    let json = pipeline.to_json().unwrap();
    assert!(json.contains("\"op\":\"merge\""));
    assert!(json.contains("is_CA_holiday_QC"));
    assert_eq!(ScoringPipeline::from_json(&json).unwrap(), pipeline);
}

#[test]
fn pipeline_shape() {
    init_logger();
    let df = df!("date" => [Some("2024-01-01")]).unwrap();
    let pipeline = fitted_on(&df)
        .export_scoring_pipeline(InputKind::Str)
        .unwrap();

    assert_eq!(pipeline.input, "date");
    assert_eq!(pipeline.outputs.len(), Jurisdiction::COUNT);
    let merges = pipeline
        .ops
        .iter()
        .filter(|op| matches!(op, ScoringOp::Merge { .. }))
        .count();
    assert_eq!(merges, Jurisdiction::COUNT);
    assert!(matches!(pipeline.ops[0], ScoringOp::Replace { .. }));
}
