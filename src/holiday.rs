use std::collections::BTreeSet;
use std::ops::Index;

use chrono::{Datelike, Days, NaiveDate};
use log::{debug, info};
use polars::prelude::*;
use serde::Deserialize;

use crate::calendar::{CalendarOptions, CanadaCalendar, HolidayCalendar};
use crate::dates::{self, DayKey};
use crate::error::RecipeError;
use crate::jurisdiction::Jurisdiction;
use crate::schema::{display, keys};
use crate::scoring::{InputKind, ScoringPipeline};

pub const DEFAULT_LOOKBACK_DAYS: u32 = 14;

fn default_lookback_days() -> u32 {
    DEFAULT_LOOKBACK_DAYS
}

/// Host-supplied settings for [`HolidayFlagger`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HolidayFlaggerConfig {
    /// Designated date column in host frames.
    pub time_column: String,
    /// Days before each holiday that are flagged as well.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    /// chrono format for text or integer date columns.
    #[serde(default)]
    pub datetime_format: Option<String>,
    /// Shift weekend holidays to their observed weekday.
    #[serde(default)]
    pub observed: bool,
}

impl HolidayFlaggerConfig {
    pub fn new(time_column: impl Into<String>) -> Self {
        Self {
            time_column: time_column.into(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            datetime_format: None,
            observed: false,
        }
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = Some(format.into());
        self
    }

    pub fn with_observed(mut self, observed: bool) -> Self {
        self.observed = observed;
        self
    }
}

// ── Year range ──────────────────────────────────────────────────────────────

/// Inclusive span of years covered by the fitted tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    bounds: Option<(i32, i32)>,
}

impl YearRange {
    pub fn empty() -> Self {
        Self { bounds: None }
    }

    /// `[min, 2 * max - min + 1]`: one more full observed span past the
    /// latest year, plus one.
    pub fn extended(min_year: i32, max_year: i32) -> Self {
        Self {
            bounds: Some((min_year, 2 * max_year - min_year + 1)),
        }
    }

    pub fn from_dates(dates: &[Option<NaiveDate>]) -> Self {
        let years = dates.iter().flatten().map(|d| d.year());
        let (min, max) = years.fold((None, None), |(lo, hi): (Option<i32>, Option<i32>), y| {
            (
                Some(lo.map_or(y, |lo| lo.min(y))),
                Some(hi.map_or(y, |hi| hi.max(y))),
            )
        });
        match (min, max) {
            (Some(min), Some(max)) => Self::extended(min, max),
            _ => Self::empty(),
        }
    }

    pub fn bounds(&self) -> Option<(i32, i32)> {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        let (start, end) = self.bounds.unwrap_or((1, 0));
        start..=end
    }
}

// ── Tables ──────────────────────────────────────────────────────────────────

/// Day keys of one jurisdiction's holidays and their lookback windows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayTable {
    keys: BTreeSet<DayKey>,
}

impl HolidayTable {
    pub fn build<C: HolidayCalendar>(
        calendar: &C,
        jurisdiction: Jurisdiction,
        years: &YearRange,
        lookback_days: u32,
        options: CalendarOptions,
    ) -> Self {
        let keys = years
            .years()
            .flat_map(|year| calendar.holidays(jurisdiction, year, options))
            .flat_map(|holiday| {
                (0..=lookback_days)
                    .filter_map(move |back| holiday.date.checked_sub_days(Days::new(back as u64)))
            })
            .map(DayKey::from)
            .collect();
        Self { keys }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.keys.contains(&DayKey::from(date))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in ascending `(year, day_of_year)` order.
    pub fn keys(&self) -> impl Iterator<Item = &DayKey> {
        self.keys.iter()
    }

    /// Two `Int32` columns, `year` and `doy`.
    pub fn to_frame(&self) -> Result<DataFrame, RecipeError> {
        let years: Vec<i32> = self.keys.iter().map(|k| k.year).collect();
        let doys: Vec<i32> = self.keys.iter().map(|k| k.day_of_year as i32).collect();
        Ok(DataFrame::new(vec![
            Column::new(keys::YEAR.into(), years),
            Column::new(keys::DAY_OF_YEAR.into(), doys),
        ])?)
    }
}

/// One table per jurisdiction, indexed by [`Jurisdiction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JurisdictionTables {
    tables: [HolidayTable; Jurisdiction::COUNT],
}

impl JurisdictionTables {
    pub fn build<C: HolidayCalendar>(
        calendar: &C,
        years: &YearRange,
        lookback_days: u32,
        options: CalendarOptions,
    ) -> Self {
        Self {
            tables: std::array::from_fn(|i| {
                HolidayTable::build(calendar, Jurisdiction::ALL[i], years, lookback_days, options)
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Jurisdiction, &HolidayTable)> {
        Jurisdiction::ALL.into_iter().zip(self.tables.iter())
    }
}

impl Index<Jurisdiction> for JurisdictionTables {
    type Output = HolidayTable;

    fn index(&self, jurisdiction: Jurisdiction) -> &HolidayTable {
        &self.tables[jurisdiction.index()]
    }
}

// ── Transformer ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Fitted {
    years: YearRange,
    tables: JurisdictionTables,
}

/// Flags dates that fall on, or within the lookback window before, a
/// Canadian public holiday. One indicator column per jurisdiction.
#[derive(Debug, Clone)]
pub struct HolidayFlagger<C: HolidayCalendar = CanadaCalendar> {
    config: HolidayFlaggerConfig,
    calendar: C,
    fitted: Option<Fitted>,
}

impl HolidayFlagger<CanadaCalendar> {
    pub fn new(config: HolidayFlaggerConfig) -> Self {
        Self::with_calendar(config, CanadaCalendar)
    }
}

impl<C: HolidayCalendar> HolidayFlagger<C> {
    pub const DISPLAY_NAME: &'static str = display::HOLIDAYS;

    pub fn with_calendar(config: HolidayFlaggerConfig, calendar: C) -> Self {
        Self {
            config,
            calendar,
            fitted: None,
        }
    }

    pub fn output_feature_names(&self) -> Vec<String> {
        Jurisdiction::ALL
            .iter()
            .map(|j| j.feature_name().to_string())
            .collect()
    }

    // ── Lifecycle ───────────────────────────────────────────────────────────

    /// Build the per-jurisdiction tables from the frame's time column.
    pub fn fit(&mut self, df: &DataFrame) -> Result<(), RecipeError> {
        let dates = self.read_dates(df)?;
        self.fit_dates(&dates);
        Ok(())
    }

    pub fn fit_dates(&mut self, dates: &[Option<NaiveDate>]) {
        let years = YearRange::from_dates(dates);
        debug!("Holiday year range: {:?}", years.bounds());

        let options = CalendarOptions {
            observed: self.config.observed,
        };
        let tables =
            JurisdictionTables::build(&self.calendar, &years, self.config.lookback_days, options);
        for (jurisdiction, table) in tables.iter() {
            debug!("{jurisdiction}: {} flagged days", table.len());
        }

        info!(
            "Fitted holiday tables for {} jurisdictions, lookback {} days",
            Jurisdiction::COUNT,
            self.config.lookback_days
        );
        self.fitted = Some(Fitted { years, tables });
    }

    /// One `Int32` indicator column per jurisdiction, row-aligned with `df`.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame, RecipeError> {
        let dates = dates::parse_column(
            df,
            &self.config.time_column,
            self.config.datetime_format.as_deref(),
        )?;
        self.flag(dates)
    }

    pub fn transform_dates(&self, dates: &[Option<NaiveDate>]) -> Result<DataFrame, RecipeError> {
        self.flag(Column::new(keys::DATE.into(), dates))
    }

    fn flag(&self, dates: Column) -> Result<DataFrame, RecipeError> {
        let fitted = self.fitted()?;
        debug!("Flagging {} rows", dates.len());

        let date = dates.name().clone();
        let mut lazy = DataFrame::new(vec![dates])?
            .lazy()
            .with_row_index(keys::ROW_INDEX, None)
            .with_columns([
                col(date.clone()).dt().year().alias(keys::YEAR),
                col(date)
                    .dt()
                    .ordinal_day()
                    .cast(DataType::Int32)
                    .alias(keys::DAY_OF_YEAR),
            ]);
        for (jurisdiction, table) in fitted.tables.iter() {
            let lookup = table
                .to_frame()?
                .lazy()
                .with_column(lit(1i32).alias(jurisdiction.feature_name()));
            lazy = lazy.join(
                lookup,
                [col(keys::YEAR), col(keys::DAY_OF_YEAR)],
                [col(keys::YEAR), col(keys::DAY_OF_YEAR)],
                JoinArgs::new(JoinType::Left),
            );
        }

        let flags: Vec<Expr> = Jurisdiction::ALL
            .iter()
            .map(|j| {
                col(j.feature_name())
                    .fill_null(lit(0i32))
                    .cast(DataType::Int32)
            })
            .collect();

        Ok(lazy
            .sort([keys::ROW_INDEX], SortMultipleOptions::default())
            .select(flags)
            .collect()?)
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame, RecipeError> {
        self.fit(df)?;
        self.transform(df)
    }

    // ── Export ──────────────────────────────────────────────────────────────

    /// Restate `transform` as a portable scoring pipeline.
    pub fn export_scoring_pipeline(&self, input: InputKind) -> Result<ScoringPipeline, RecipeError> {
        let fitted = self.fitted()?;
        Ok(ScoringPipeline::for_holidays(
            &self.config.time_column,
            self.config.datetime_format.as_deref(),
            input,
            &fitted.tables,
        ))
    }

    // ── Inspection ──────────────────────────────────────────────────────────

    pub fn year_range(&self) -> Option<YearRange> {
        self.fitted.as_ref().map(|f| f.years)
    }

    pub fn table(&self, jurisdiction: Jurisdiction) -> Option<&HolidayTable> {
        self.fitted.as_ref().map(|f| &f.tables[jurisdiction])
    }

    pub fn is_flagged(&self, jurisdiction: Jurisdiction, date: NaiveDate) -> bool {
        self.table(jurisdiction)
            .is_some_and(|table| table.contains(date))
    }

    fn fitted(&self) -> Result<&Fitted, RecipeError> {
        self.fitted
            .as_ref()
            .ok_or_else(|| RecipeError::NotFitted(Self::DISPLAY_NAME.to_string()))
    }

    fn read_dates(&self, df: &DataFrame) -> Result<Vec<Option<NaiveDate>>, RecipeError> {
        dates::extract_dates(
            df,
            &self.config.time_column,
            self.config.datetime_format.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn year_range_extends_by_observed_span() {
        let range = YearRange::from_dates(&[Some(d(2016, 3, 1)), None, Some(d(2018, 5, 1))]);
        assert_eq!(range.bounds(), Some((2016, 2021)));
        assert_eq!(range.years().collect::<Vec<_>>(), (2016..=2021).collect::<Vec<_>>());
    }

    #[test]
    fn year_range_single_year() {
        let range = YearRange::from_dates(&[Some(d(2024, 1, 5))]);
        assert_eq!(range.bounds(), Some((2024, 2025)));
    }

    #[test]
    fn year_range_without_dates_is_empty() {
        let range = YearRange::from_dates(&[None, None]);
        assert!(range.is_empty());
        assert_eq!(range.years().count(), 0);
    }

    #[test]
    fn table_frame_is_sorted_and_unique() {
        let table = HolidayTable::build(
            &CanadaCalendar,
            Jurisdiction::Country,
            &YearRange::extended(2024, 2024),
            14,
            CalendarOptions::default(),
        );
        let frame = table.to_frame().unwrap();
        assert_eq!(frame.height(), table.len());
        let keys: Vec<&DayKey> = table.keys().collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn transform_before_fit_fails() {
        let flagger = HolidayFlagger::new(HolidayFlaggerConfig::new("date"));
        assert!(matches!(
            flagger.transform_dates(&[Some(d(2024, 7, 1))]),
            Err(RecipeError::NotFitted(_))
        ));
    }
}
