//! Canadian public holiday rules.
//!
//! Rules and the first year each applies follow the widely used
//! `holidays` package for Canada. `Jurisdiction::Country` applies every rule
//! that is not restricted to a province, which yields the federal set.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::jurisdiction::Jurisdiction;

/// Options passed with every enumeration request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalendarOptions {
    /// Add weekday "(Observed)" entries for weekend holidays.
    pub observed: bool,
}

impl CalendarOptions {
    pub fn observed() -> Self {
        Self { observed: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
}

/// Source of holiday dates for a jurisdiction and year.
pub trait HolidayCalendar {
    /// All holidays in `year`, sorted by date, one entry per date.
    fn holidays(&self, jurisdiction: Jurisdiction, year: i32, options: CalendarOptions)
        -> Vec<Holiday>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CanadaCalendar;

impl HolidayCalendar for CanadaCalendar {
    fn holidays(
        &self,
        jurisdiction: Jurisdiction,
        year: i32,
        options: CalendarOptions,
    ) -> Vec<Holiday> {
        let mut days = HolidayDays::default();
        populate(&mut days, jurisdiction, year, options.observed);
        days.into_sorted()
    }
}

// ── Collection ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct HolidayDays {
    by_date: BTreeMap<NaiveDate, String>,
}

impl HolidayDays {
    /// Same-date entries are merged as "A, B".
    fn add(&mut self, date: Option<NaiveDate>, name: &str) {
        let Some(date) = date else {
            return;
        };
        self.by_date
            .entry(date)
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(name);
            })
            .or_insert_with(|| name.to_string());
    }

    fn into_sorted(self) -> Vec<Holiday> {
        self.by_date
            .into_iter()
            .map(|(date, name)| Holiday { date, name })
            .collect()
    }
}

// ── Date helpers ────────────────────────────────────────────────────────────

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// The given weekday on or before `date`.
fn on_or_before(date: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let back = (date.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
    shift(date, -(back as i64))
}

/// The given weekday on or after `date`.
fn on_or_after(date: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let ahead = (weekday.num_days_from_monday() + 7 - date.weekday().num_days_from_monday()) % 7;
    shift(date, ahead as i64)
}

/// The `n`th (1-based) occurrence of `weekday` in a month.
fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
    let first = on_or_after(ymd(year, month, 1)?, weekday)?;
    shift(first, 7 * (n as i64 - 1))
}

/// Monday nearest to `date`. `prefer_later` breaks an equal-distance tie
/// towards the following Monday.
fn nearest_monday(date: NaiveDate, prefer_later: bool) -> Option<NaiveDate> {
    let before = on_or_before(date, Weekday::Mon)?;
    let after = on_or_after(date, Weekday::Mon)?;
    let to_after = after - date;
    let to_before = date - before;
    if to_after < to_before || (prefer_later && to_after == to_before) {
        Some(after)
    } else {
        Some(before)
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Gregorian Easter Sunday (anonymous computus).
pub fn easter(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    ymd(year, month as u32, day as u32)
}

// ── Rules ───────────────────────────────────────────────────────────────────

fn populate(days: &mut HolidayDays, j: Jurisdiction, year: i32, observed: bool) {
    use Jurisdiction::*;

    // Confederation
    if year < 1867 {
        return;
    }

    // New Year's Day
    let new_year = ymd(year, 1, 1);
    days.add(new_year, "New Year's Day");
    if observed {
        if new_year.is_some_and(|d| d.weekday() == Weekday::Sun) {
            days.add(ymd(year, 1, 2), "New Year's Day (Observed)");
        }
        // Next year's New Year falls on a Saturday
        if ymd(year, 12, 31).is_some_and(|d| d.weekday() == Weekday::Fri) {
            days.add(ymd(year, 12, 31), "New Year's Day (Observed)");
        }
    }

    // Family Day and its provincial variants
    match j {
        Ontario if year >= 2008 => days.add(nth_weekday(year, 2, Weekday::Mon, 3), "Family Day"),
        Saskatchewan if year >= 2007 => {
            days.add(nth_weekday(year, 2, Weekday::Mon, 3), "Family Day")
        }
        Alberta if year >= 1990 => days.add(nth_weekday(year, 2, Weekday::Mon, 3), "Family Day"),
        NewBrunswick if year >= 2018 => {
            days.add(nth_weekday(year, 2, Weekday::Mon, 3), "Family Day")
        }
        BritishColumbia if (2013..=2018).contains(&year) => {
            days.add(nth_weekday(year, 2, Weekday::Mon, 2), "Family Day")
        }
        BritishColumbia if year > 2018 => {
            days.add(nth_weekday(year, 2, Weekday::Mon, 3), "Family Day")
        }
        Manitoba if year >= 2008 => {
            days.add(nth_weekday(year, 2, Weekday::Mon, 3), "Louis Riel Day")
        }
        PrinceEdwardIsland if year >= 2010 => {
            days.add(nth_weekday(year, 2, Weekday::Mon, 3), "Islander Day")
        }
        PrinceEdwardIsland if year == 2009 => {
            days.add(nth_weekday(year, 2, Weekday::Mon, 2), "Islander Day")
        }
        NovaScotia if year >= 2015 => {
            days.add(nth_weekday(year, 2, Weekday::Mon, 3), "Heritage Day")
        }
        Yukon => {
            // Friday before the last Sunday in February
            let last_sunday = ymd(year, 3, 1).and_then(|d| on_or_before(d, Weekday::Sun));
            let friday = last_sunday.and_then(|d| on_or_before(d, Weekday::Fri));
            days.add(friday, "Heritage Day");
        }
        _ => {}
    }

    // St. Patrick's Day
    if j == NewfoundlandAndLabrador && year >= 1900 {
        days.add(
            ymd(year, 3, 17).and_then(|d| nearest_monday(d, true)),
            "St. Patrick's Day",
        );
    }

    // Good Friday / Easter Monday
    let easter_sunday = easter(year);
    if j != Quebec {
        days.add(easter_sunday.and_then(|d| shift(d, -2)), "Good Friday");
    } else {
        days.add(easter_sunday.and_then(|d| shift(d, 1)), "Easter Monday");
    }

    // St. George's Day
    if j == NewfoundlandAndLabrador && year == 2010 {
        days.add(ymd(2010, 4, 19), "St. George's Day");
    } else if j == NewfoundlandAndLabrador && year >= 1990 {
        days.add(
            ymd(year, 4, 23).and_then(|d| nearest_monday(d, false)),
            "St. George's Day",
        );
    }

    // Victoria Day / National Patriots' Day
    let victoria = ymd(year, 5, 24).and_then(|d| on_or_before(d, Weekday::Mon));
    if year >= 1953 {
        match j {
            NewBrunswick | NovaScotia | PrinceEdwardIsland | NewfoundlandAndLabrador => {}
            Quebec => days.add(victoria, "National Patriots' Day"),
            _ => days.add(victoria, "Victoria Day"),
        }
    }

    // National Aboriginal Day
    if j == NorthwestTerritories && year >= 1996 {
        days.add(ymd(year, 6, 21), "National Aboriginal Day");
    }

    // St. Jean Baptiste Day
    if j == Quebec && year >= 1925 {
        let st_jean = ymd(year, 6, 24);
        days.add(st_jean, "St. Jean Baptiste Day");
        if observed && st_jean.is_some_and(|d| d.weekday() == Weekday::Sun) {
            days.add(ymd(year, 6, 25), "St. Jean Baptiste Day (Observed)");
        }
    }

    // Discovery Day
    if j == NewfoundlandAndLabrador && year >= 1997 {
        days.add(
            ymd(year, 6, 24).and_then(|d| nearest_monday(d, true)),
            "Discovery Day",
        );
    } else if j == Yukon && year >= 1912 {
        days.add(nth_weekday(year, 8, Weekday::Mon, 3), "Discovery Day");
    }

    // Canada Day / Dominion Day / Memorial Day
    let july_first = ymd(year, 7, 1);
    let name = match (j, year >= 1983) {
        (_, false) => "Dominion Day",
        (NewfoundlandAndLabrador, true) => "Memorial Day",
        (_, true) => "Canada Day",
    };
    days.add(july_first, name);
    if observed && year >= 1879 && july_first.is_some_and(is_weekend) {
        days.add(
            july_first.and_then(|d| on_or_after(d, Weekday::Mon)),
            &format!("{name} (Observed)"),
        );
    }

    // Nunavut Day
    if j == Nunavut && year >= 2001 {
        let nunavut_day = ymd(year, 7, 9);
        days.add(nunavut_day, "Nunavut Day");
        if observed && nunavut_day.is_some_and(|d| d.weekday() == Weekday::Sun) {
            days.add(ymd(year, 7, 10), "Nunavut Day (Observed)");
        }
    } else if j == Nunavut && year == 2000 {
        days.add(ymd(2000, 4, 1), "Nunavut Day");
    }

    // Civic Holiday and its provincial names
    let first_august_monday = nth_weekday(year, 8, Weekday::Mon, 1);
    match j {
        Ontario | Manitoba | NorthwestTerritories if year >= 1900 => {
            days.add(first_august_monday, "Civic Holiday")
        }
        Alberta if year >= 1974 => days.add(first_august_monday, "Heritage Day"),
        BritishColumbia if year >= 1974 => days.add(first_august_monday, "British Columbia Day"),
        NewBrunswick if year >= 1900 => days.add(first_august_monday, "New Brunswick Day"),
        Saskatchewan if year >= 1900 => days.add(first_august_monday, "Saskatchewan Day"),
        _ => {}
    }

    // Labour Day
    if year >= 1894 {
        days.add(nth_weekday(year, 9, Weekday::Mon, 1), "Labour Day");
    }

    // Thanksgiving
    let no_thanksgiving = matches!(
        j,
        NewBrunswick | NovaScotia | PrinceEdwardIsland | NewfoundlandAndLabrador
    );
    if !no_thanksgiving && year >= 1931 {
        if year == 1935 {
            // Moved for the general election
            days.add(ymd(1935, 10, 25), "Thanksgiving");
        } else {
            days.add(nth_weekday(year, 10, Weekday::Mon, 2), "Thanksgiving");
        }
    }

    // Remembrance Day
    if year >= 1931 {
        let remembrance = ymd(year, 11, 11);
        match j {
            Ontario | Quebec => {}
            NovaScotia | NewfoundlandAndLabrador | NorthwestTerritories | PrinceEdwardIsland
            | Saskatchewan => {
                days.add(remembrance, "Remembrance Day");
                if observed && remembrance.is_some_and(|d| d.weekday() == Weekday::Sun) {
                    days.add(ymd(year, 11, 12), "Remembrance Day (Observed)");
                }
            }
            _ => days.add(remembrance, "Remembrance Day"),
        }
    }

    // Christmas Day
    let christmas = ymd(year, 12, 25);
    days.add(christmas, "Christmas Day");
    if observed {
        match christmas.map(|d| d.weekday()) {
            Some(Weekday::Sat) => days.add(ymd(year, 12, 24), "Christmas Day (Observed)"),
            Some(Weekday::Sun) => days.add(ymd(year, 12, 26), "Christmas Day (Observed)"),
            _ => {}
        }
    }

    // Boxing Day
    let boxing = ymd(year, 12, 26);
    match boxing.map(|d| d.weekday()) {
        Some(Weekday::Sat | Weekday::Sun) if observed => {
            days.add(boxing.and_then(|d| on_or_after(d, Weekday::Mon)), "Boxing Day (Observed)")
        }
        Some(Weekday::Mon) if observed => {
            // Christmas on Sunday already took the 26th
            days.add(ymd(year, 12, 27), "Boxing Day (Observed)")
        }
        _ => days.add(boxing, "Boxing Day"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(j: Jurisdiction, year: i32) -> Vec<NaiveDate> {
        CanadaCalendar
            .holidays(j, year, CalendarOptions::default())
            .into_iter()
            .map(|h| h.date)
            .collect()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn easter_known_years() {
        assert_eq!(easter(2019), Some(d(2019, 4, 21)));
        assert_eq!(easter(2024), Some(d(2024, 3, 31)));
        assert_eq!(easter(2025), Some(d(2025, 4, 20)));
    }

    #[test]
    fn federal_holidays_2024() {
        assert_eq!(
            dates(Jurisdiction::Country, 2024),
            vec![
                d(2024, 1, 1),
                d(2024, 3, 29),
                d(2024, 5, 20),
                d(2024, 7, 1),
                d(2024, 9, 2),
                d(2024, 10, 14),
                d(2024, 11, 11),
                d(2024, 12, 25),
                d(2024, 12, 26),
            ]
        );
    }

    #[test]
    fn quebec_has_st_jean_and_easter_monday() {
        let qc = dates(Jurisdiction::Quebec, 2024);
        assert!(qc.contains(&d(2024, 6, 24)));
        assert!(qc.contains(&d(2024, 4, 1)));
        assert!(!qc.contains(&d(2024, 3, 29)));
        assert!(!qc.contains(&d(2024, 11, 11)));
    }

    #[test]
    fn family_day_variants() {
        assert!(dates(Jurisdiction::Ontario, 2024).contains(&d(2024, 2, 19)));
        assert!(dates(Jurisdiction::BritishColumbia, 2015).contains(&d(2015, 2, 9)));
        assert!(dates(Jurisdiction::Yukon, 2024).contains(&d(2024, 2, 23)));
        assert!(!dates(Jurisdiction::Country, 2024).contains(&d(2024, 2, 19)));
    }

    #[test]
    fn nearest_monday_rules_in_newfoundland() {
        let nl = dates(Jurisdiction::NewfoundlandAndLabrador, 2024);
        // March 17 2024 is a Sunday
        assert!(nl.contains(&d(2024, 3, 18)));
        // April 23 2024 is a Tuesday
        assert!(nl.contains(&d(2024, 4, 22)));
        // June 24 2024 is a Monday
        assert!(nl.contains(&d(2024, 6, 24)));
        assert!(!nl.contains(&d(2024, 5, 20)));
    }

    #[test]
    fn observed_entries_only_when_requested() {
        // Canada Day 2023 is a Saturday
        let literal = dates(Jurisdiction::Country, 2023);
        assert!(!literal.contains(&d(2023, 7, 3)));

        let observed: Vec<NaiveDate> = CanadaCalendar
            .holidays(Jurisdiction::Country, 2023, CalendarOptions::observed())
            .into_iter()
            .map(|h| h.date)
            .collect();
        assert!(observed.contains(&d(2023, 7, 1)));
        assert!(observed.contains(&d(2023, 7, 3)));
    }

    #[test]
    fn same_date_names_are_merged() {
        let mut days = HolidayDays::default();
        days.add(Some(d(2024, 1, 1)), "A");
        days.add(Some(d(2024, 1, 1)), "B");
        let sorted = days.into_sorted();
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].name, "A, B");
    }

    #[test]
    fn nothing_before_confederation() {
        assert!(dates(Jurisdiction::Country, 1800).is_empty());
    }
}
