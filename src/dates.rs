//! Date extraction from host frames.
//!
//! Missing or unparseable values become null; they never raise.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use crate::error::RecipeError;

/// Formats tried, in order, when no explicit format is configured.
const FALLBACK_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d",
    "%Y%m%d",
    "%m/%d/%Y",
];

/// Text values treated as missing before parsing.
pub const MISSING_TOKENS: [&str; 2] = ["None", ""];

/// `(year, day_of_year)` lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey {
    pub year: i32,
    pub day_of_year: u32,
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            day_of_year: date.ordinal(),
        }
    }
}

pub fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(chrono::TimeDelta::try_days(days as i64)?)
}

/// Expression reading `column` (of type `dtype`) as a `Date` column with the
/// same name.
///
/// Text is trimmed, [`MISSING_TOKENS`] become null, and each candidate format
/// is tried with a non-strict `strptime`; the first match wins. Integers are
/// read as their decimal text (`20240701`). Floats are truncated to integers
/// first, so a `yyyymmdd` column with NaN gaps behaves like the integer one.
pub fn date_expr(column: &str, dtype: &DataType, format: Option<&str>) -> Result<Expr, RecipeError> {
    let source = col(column);
    let expr = match dtype {
        DataType::Null | DataType::Date => source.cast(DataType::Date),
        DataType::Datetime(_, _) => source.dt().date(),
        DataType::String => parse_text(source, format),
        dt if dt.is_integer() || dt.is_float() => {
            parse_text(source.cast(DataType::Int64).cast(DataType::String), format)
        }
        other => {
            return Err(RecipeError::InvalidData(format!(
                "Column '{column}' has unsupported date dtype {other}"
            )))
        }
    };
    Ok(expr.alias(column))
}

fn parse_text(text: Expr, format: Option<&str>) -> Expr {
    let text = text.str().strip_chars(lit(" \t\r\n"));
    let missing = MISSING_TOKENS
        .iter()
        .map(|token| text.clone().eq(lit(*token)))
        .reduce(|a, b| a.or(b))
        .unwrap_or(lit(false));
    let text = when(missing)
        .then(lit(NULL).cast(DataType::String))
        .otherwise(text);

    let formats = match format {
        Some(fmt) => vec![fmt],
        None => FALLBACK_FORMATS.to_vec(),
    };
    let attempts: Vec<Expr> = formats
        .into_iter()
        .map(|fmt| {
            text.clone()
                .str()
                .to_datetime(
                    Some(TimeUnit::Microseconds),
                    None,
                    StrptimeOptions {
                        format: Some(fmt.into()),
                        strict: false,
                        ..Default::default()
                    },
                    lit("raise"),
                )
                .dt()
                .date()
        })
        .collect();
    coalesce(&attempts)
}

/// Parse the time column of `df` into a single `Date` column.
pub fn parse_column(
    df: &DataFrame,
    column: &str,
    format: Option<&str>,
) -> Result<Column, RecipeError> {
    let values = df
        .column(column)
        .map_err(|_| RecipeError::MissingColumn(column.to_string()))?;
    let expr = date_expr(column, values.dtype(), format)?;
    let parsed = DataFrame::new(vec![values.clone()])?
        .lazy()
        .select([expr])
        .collect()?;
    let dates = parsed.column(column)?.clone();

    let unparsed = dates.null_count().saturating_sub(values.null_count());
    if unparsed > 0 {
        log::warn!(
            "{unparsed} of {} values in '{column}' could not be parsed as dates",
            values.len(),
        );
    }
    Ok(dates)
}

/// [`parse_column`], materialized as chrono dates.
pub fn extract_dates(
    df: &DataFrame,
    column: &str,
    format: Option<&str>,
) -> Result<Vec<Option<NaiveDate>>, RecipeError> {
    let dates = parse_column(df, column, format)?;
    Ok(dates
        .cast(&DataType::Int32)?
        .i32()?
        .into_iter()
        .map(|v| v.and_then(date_from_epoch_days))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn text(values: &[&str], format: Option<&str>) -> Vec<Option<NaiveDate>> {
        let df = df!("t" => values).unwrap();
        extract_dates(&df, "t", format).unwrap()
    }

    #[test]
    fn parses_common_formats() {
        assert_eq!(
            text(&["2024-07-01", " 2024-07-01 13:45:00 ", "20240701", "07/01/2024"], None),
            vec![Some(d(2024, 7, 1)); 4]
        );
    }

    #[test]
    fn explicit_format_wins() {
        assert_eq!(
            text(&["01.07.2024", "2024-07-01"], Some("%d.%m.%Y")),
            vec![Some(d(2024, 7, 1)), None]
        );
    }

    #[test]
    fn missing_tokens_and_garbage_are_none() {
        assert_eq!(text(&["", "None", " None ", "not a date"], None), vec![None; 4]);
    }

    #[test]
    fn day_key_uses_ordinal() {
        let key = DayKey::from(d(2024, 12, 31));
        assert_eq!(key, DayKey { year: 2024, day_of_year: 366 });
    }

    #[test]
    fn epoch_days_round_trip() {
        assert_eq!(date_from_epoch_days(0), Some(d(1970, 1, 1)));
        assert_eq!(date_from_epoch_days(19905), Some(d(2024, 7, 1)));
    }

    #[test]
    fn reads_numeric_columns_as_yyyymmdd() {
        let df = df!(
            "ints" => [Some(20240701i64), None, Some(123)],
            "floats" => [Some(20240701.0f64), None, Some(f64::NAN)],
        )
        .unwrap();
        assert_eq!(
            extract_dates(&df, "ints", None).unwrap(),
            vec![Some(d(2024, 7, 1)), None, None]
        );
        assert_eq!(
            extract_dates(&df, "floats", None).unwrap(),
            vec![Some(d(2024, 7, 1)), None, None]
        );
    }

    #[test]
    fn missing_and_unsupported_columns_are_errors() {
        let df = df!("flag" => [true, false]).unwrap();
        assert!(matches!(
            extract_dates(&df, "missing", None),
            Err(RecipeError::MissingColumn(_))
        ));
        assert!(matches!(
            extract_dates(&df, "flag", None),
            Err(RecipeError::InvalidData(_))
        ));
    }
}
