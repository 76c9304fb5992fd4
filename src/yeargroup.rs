//! Year-group eligibility for the English school system
//!
//! A pupil in year group `y` during the academic year starting in
//! September of `start_year` was born between 1 September of
//! `start_year - (y + 5)` and 31 August of the following year.

use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::error::{MatchError, Result};
use crate::table::Value;

/// Text forms that mean Reception (year group 0), compared lowercased.
pub const RECEPTION_ALIASES: [&str; 7] = [
    "reception",
    "r",
    "year r",
    "rec",
    "year group r",
    "y0",
    "year 0",
];

/// Highest school year group.
pub const MAX_YEAR_GROUP: u8 = 13;

/// Inclusive date-of-birth window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DobWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DobWindow {
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// School year group derived from a date of birth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearGroup {
    Reception,
    Year(u8),
    /// Not yet of school age in the given academic year
    TooYoung,
}

impl fmt::Display for YearGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearGroup::Reception => f.write_str("Reception"),
            YearGroup::Year(n) => write!(f, "Year {n}"),
            YearGroup::TooYoung => f.write_str("Student too young for school"),
        }
    }
}

/// Maps a year-group value and an academic year to the date-of-birth
/// window of eligible pupils.
///
/// Any `Fn(&Value, i32) -> Result<DobWindow>` closure is an eligibility
/// window, which is how tests and other school systems plug in.
pub trait EligibilityWindow: Send + Sync {
    fn window(&self, group: &Value, academic_year: i32) -> Result<DobWindow>;
}

impl<F> EligibilityWindow for F
where
    F: Fn(&Value, i32) -> Result<DobWindow> + Send + Sync,
{
    fn window(&self, group: &Value, academic_year: i32) -> Result<DobWindow> {
        self(group, academic_year)
    }
}

/// Eligibility rules of the English school system.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishSchoolYear;

impl EligibilityWindow for EnglishSchoolYear {
    fn window(&self, group: &Value, academic_year: i32) -> Result<DobWindow> {
        dob_range_from_year_group(parse_year_group(group)?, academic_year)
    }
}

/// Parse a year-group cell into `0..=13`, where 0 is Reception.
///
/// Integers are taken as is; text is matched against
/// [`RECEPTION_ALIASES`] and otherwise read from its first run of digits
/// ("Year 10", "Y10", "10").
pub fn parse_year_group(value: &Value) -> Result<u8> {
    let number = match value {
        Value::Int(_) | Value::Float(_) => value.as_int(),
        Value::Text(text) => {
            if text.contains("Level") {
                return Err(MatchError::FeLevel(text.clone()));
            }
            let clean = text.trim().to_lowercase();
            if RECEPTION_ALIASES.contains(&clean.as_str()) {
                return Ok(0);
            }
            first_number(&clean)
        }
        _ => None,
    };

    number
        .filter(|n| (0..=i64::from(MAX_YEAR_GROUP)).contains(n))
        .and_then(|n| u8::try_from(n).ok())
        .ok_or_else(|| MatchError::InvalidYearGroup(value.to_string()))
}

fn first_number(text: &str) -> Option<i64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Date-of-birth window (1 Sep to 31 Aug) for a year group in the academic
/// year starting in `start_year`.
pub fn dob_range_from_year_group(year_group: u8, start_year: i32) -> Result<DobWindow> {
    let invalid = || MatchError::InvalidYearGroup(year_group.to_string());
    if year_group > MAX_YEAR_GROUP {
        return Err(invalid());
    }
    let dob_start_year = start_year - (i32::from(year_group) + 5);
    let start = NaiveDate::from_ymd_opt(dob_start_year, 9, 1).ok_or_else(invalid)?;
    let end = NaiveDate::from_ymd_opt(dob_start_year + 1, 8, 31).ok_or_else(invalid)?;
    Ok(DobWindow { start, end })
}

/// Year group of a pupil born on `dob` during the academic year starting
/// in `start_year`.
///
/// Births in September to November use an offset of 5, all other months 4.
pub fn year_group_from_date(dob: NaiveDate, start_year: i32) -> YearGroup {
    let offset = if matches!(dob.month(), 9..=11) { 5 } else { 4 };
    let year_group = start_year - dob.year() - offset;
    match year_group {
        0 => YearGroup::Reception,
        n if n < 0 => YearGroup::TooYoung,
        n => YearGroup::Year(u8::try_from(n).unwrap_or(u8::MAX)),
    }
}

/// Clean a year-group cell to `Reception` or `Year N`.
pub fn clean_year_group(value: &Value) -> Result<String> {
    Ok(match parse_year_group(value)? {
        0 => YearGroup::Reception.to_string(),
        n => YearGroup::Year(n).to_string(),
    })
}
