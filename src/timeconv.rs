//! Conversion of absolute inventory timestamps into values relative to a
//! `"<unit> since <epoch>"` time axis, for the calendars climate files
//! commonly declare.

use crate::utils::error::{Result, ScanError};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

const SECONDS_PER_DAY: f64 = 86_400.0;

// Cumulative days before each month for the fixed-length calendars.
const CUM_DAYS_NOLEAP: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
const CUM_DAYS_ALLLEAP: [i64; 12] = [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335];
const MONTH_LEN_NOLEAP: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const MONTH_LEN_ALLLEAP: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => Some(TimeUnit::Seconds),
            "minutes" | "minute" | "mins" | "min" => Some(TimeUnit::Minutes),
            "hours" | "hour" | "hrs" | "hr" | "h" => Some(TimeUnit::Hours),
            "days" | "day" | "d" => Some(TimeUnit::Days),
            _ => None,
        }
    }

    fn seconds_per_unit(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3_600.0,
            TimeUnit::Days => SECONDS_PER_DAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Calendar {
    #[default]
    Standard,
    NoLeap,
    AllLeap,
    Day360,
}

impl Calendar {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "standard" | "gregorian" | "proleptic_gregorian" => Ok(Calendar::Standard),
            "noleap" | "365_day" => Ok(Calendar::NoLeap),
            "all_leap" | "366_day" => Ok(Calendar::AllLeap),
            "360_day" => Ok(Calendar::Day360),
            _ => Err(ScanError::TimeError {
                value: name.to_string(),
                reason: "unsupported calendar".to_string(),
            }),
        }
    }
}

/// Component time parsed from the permissive `Y-M-D[ H:M:S[.f]]` grammar the
/// inventory and CF epoch strings use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: f64,
}

#[derive(Debug, Clone)]
pub struct TimeUnits {
    pub unit: TimeUnit,
    pub epoch: ComponentTime,
    epoch_raw: String,
}

impl TimeUnits {
    /// Parse a CF units string such as `days since 1979-1-1`.
    pub fn parse(units: &str) -> Result<Self> {
        static UNITS_RE: OnceLock<Regex> = OnceLock::new();
        let re = UNITS_RE.get_or_init(|| {
            Regex::new(r"^\s*([A-Za-z]+)\s+since\s+(.+?)\s*$").expect("units pattern is valid")
        });

        let captures = re.captures(units).ok_or_else(|| ScanError::TimeError {
            value: units.to_string(),
            reason: "expected '<unit> since <epoch>'".to_string(),
        })?;

        let unit_name = &captures[1];
        let unit = TimeUnit::parse(unit_name).ok_or_else(|| ScanError::TimeError {
            value: units.to_string(),
            reason: match unit_name.to_ascii_lowercase().as_str() {
                "months" | "month" | "years" | "year" => {
                    "month and year units are not supported".to_string()
                }
                other => format!("unsupported time unit '{}'", other),
            },
        })?;

        let epoch_raw = captures[2].to_string();
        let epoch = parse_timestamp(&epoch_raw)?;

        Ok(TimeUnits {
            unit,
            epoch,
            epoch_raw,
        })
    }
}

/// Parse a timestamp with unpadded components, e.g. `1979-1-16 12:0:0.0`.
pub fn parse_timestamp(value: &str) -> Result<ComponentTime> {
    static TIMESTAMP_RE: OnceLock<Regex> = OnceLock::new();
    let re = TIMESTAMP_RE.get_or_init(|| {
        Regex::new(r"^\s*(-?\d{1,4})-(\d{1,2})-(\d{1,2})(?:[ T](\d{1,2}):(\d{1,2}):(\d{1,2}(?:\.\d+)?))?\s*$")
            .expect("timestamp pattern is valid")
    });

    let captures = re.captures(value).ok_or_else(|| ScanError::TimeError {
        value: value.to_string(),
        reason: "expected 'Y-M-D[ H:M:S[.f]]'".to_string(),
    })?;

    let component = |index: usize| -> f64 {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0.0)
    };

    let time = ComponentTime {
        year: component(1) as i32,
        month: component(2) as u32,
        day: component(3) as u32,
        hour: component(4) as u32,
        minute: component(5) as u32,
        second: component(6),
    };

    if !(1..=12).contains(&time.month) {
        return Err(time_error(value, "month out of range"));
    }
    if !(1..=31).contains(&time.day) {
        return Err(time_error(value, "day out of range"));
    }
    if time.hour > 23 || time.minute > 59 || time.second >= 60.0 {
        return Err(time_error(value, "time of day out of range"));
    }

    Ok(time)
}

/// Convert an absolute timestamp into the axis-relative value.
pub fn to_relative(timestamp: &str, units: &TimeUnits, calendar: Calendar) -> Result<f64> {
    let target = parse_timestamp(timestamp)?;
    let target_seconds = absolute_seconds(&target, calendar, timestamp)?;
    let epoch_seconds = absolute_seconds(&units.epoch, calendar, &units.epoch_raw)?;
    Ok((target_seconds - epoch_seconds) / units.unit.seconds_per_unit())
}

fn absolute_seconds(time: &ComponentTime, calendar: Calendar, raw: &str) -> Result<f64> {
    let days: i64 = match calendar {
        Calendar::Standard => {
            let date = NaiveDate::from_ymd_opt(time.year, time.month, time.day)
                .ok_or_else(|| time_error(raw, "invalid date for the standard calendar"))?;
            i64::from(date.num_days_from_ce())
        }
        Calendar::NoLeap => fixed_year_days(time, &CUM_DAYS_NOLEAP, &MONTH_LEN_NOLEAP, 365, raw)?,
        Calendar::AllLeap => fixed_year_days(time, &CUM_DAYS_ALLLEAP, &MONTH_LEN_ALLLEAP, 366, raw)?,
        Calendar::Day360 => {
            if time.day > 30 {
                return Err(time_error(raw, "day out of range for the 360_day calendar"));
            }
            i64::from(time.year) * 360 + i64::from(time.month - 1) * 30 + i64::from(time.day - 1)
        }
    };

    Ok(days as f64 * SECONDS_PER_DAY
        + f64::from(time.hour) * 3_600.0
        + f64::from(time.minute) * 60.0
        + time.second)
}

fn fixed_year_days(
    time: &ComponentTime,
    cumulative: &[i64; 12],
    month_lengths: &[u32; 12],
    year_length: i64,
    raw: &str,
) -> Result<i64> {
    let month = (time.month - 1) as usize;
    if time.day > month_lengths[month] {
        return Err(time_error(raw, "day out of range for the calendar month"));
    }
    Ok(i64::from(time.year) * year_length + cumulative[month] + i64::from(time.day - 1))
}

fn time_error(value: &str, reason: &str) -> ScanError {
    ScanError::TimeError {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
