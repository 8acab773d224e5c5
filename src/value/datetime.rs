// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use std::hash::{Hash, Hasher};

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{Result, ValueError};

/// A calendar date, a time of day, or a full instant.
///
/// Times and instants carry an explicit UTC offset which takes part in
/// equality: two instants denoting the same moment through different
/// offsets print differently, so they must compare unequal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DateTimeValue {
    /// A calendar date.
    Date(NaiveDate),
    /// A time of day with millisecond precision and a UTC offset.
    Time {
        /// The wall-clock time.
        time: NaiveTime,
        /// Offset from UTC.
        offset: FixedOffset,
    },
    /// A date and time of day with a UTC offset.
    Instant {
        /// The wall-clock date and time.
        local: NaiveDateTime,
        /// Offset from UTC.
        offset: FixedOffset,
    },
}

fn domain(what: &'static str, value: impl ToString) -> ValueError {
    ValueError::Domain {
        what,
        value: value.to_string(),
    }
}

fn make_offset(offset_minutes: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(offset_minutes * 60)
        .ok_or_else(|| domain("UTC offset minutes", offset_minutes))
}

fn make_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| domain("calendar date", format!("{}-{}-{}", year, month, day)))
}

fn make_time(hour: u32, minute: u32, second: u32, millisecond: u32) -> Result<NaiveTime> {
    NaiveTime::from_hms_milli_opt(hour, minute, second, millisecond).ok_or_else(|| {
        domain(
            "time of day",
            format!("{}:{}:{}.{}", hour, minute, second, millisecond),
        )
    })
}

impl DateTimeValue {
    /// A calendar date.
    pub fn date(year: i32, month: u32, day: u32) -> Result<Self> {
        Ok(DateTimeValue::Date(make_date(year, month, day)?))
    }

    /// A time of day; `offset_minutes` is the signed total offset from
    /// UTC in minutes.
    pub fn time(
        hour: u32,
        minute: u32,
        second: u32,
        millisecond: u32,
        offset_minutes: i32,
    ) -> Result<Self> {
        Ok(DateTimeValue::Time {
            time: make_time(hour, minute, second, millisecond)?,
            offset: make_offset(offset_minutes)?,
        })
    }

    /// A full instant.
    #[allow(clippy::too_many_arguments)]
    pub fn instant(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        millisecond: u32,
        offset_minutes: i32,
    ) -> Result<Self> {
        let date = make_date(year, month, day)?;
        let time = make_time(hour, minute, second, millisecond)?;
        Ok(DateTimeValue::Instant {
            local: date.and_time(time),
            offset: make_offset(offset_minutes)?,
        })
    }

    /// Whether this is a date without a time of day.
    pub fn is_date_only(&self) -> bool {
        matches!(self, DateTimeValue::Date(_))
    }

    /// Whether this is a time of day without a date.
    pub fn is_time_only(&self) -> bool {
        matches!(self, DateTimeValue::Time { .. })
    }
}

impl Hash for DateTimeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            DateTimeValue::Date(date) => {
                state.write_u8(0);
                date.hash(state);
            }
            DateTimeValue::Time { time, offset } => {
                state.write_u8(1);
                time.hash(state);
                state.write_i32(offset.local_minus_utc());
            }
            DateTimeValue::Instant { local, offset } => {
                state.write_u8(2);
                local.hash(state);
                state.write_i32(offset.local_minus_utc());
            }
        }
    }
}

/// Formatting helpers shared by the canonical writer.
impl DateTimeValue {
    pub(crate) fn write_canonical(&self, out: &mut impl std::fmt::Write) -> std::fmt::Result {
        out.write_char('$')?;
        match self {
            DateTimeValue::Date(date) => write_date(out, date)?,
            DateTimeValue::Time { time, offset } => write_time(out, time, offset)?,
            DateTimeValue::Instant { local, offset } => {
                write_date(out, &local.date())?;
                write_time(out, &local.time(), offset)?;
            }
        }
        out.write_char('$')
    }
}

fn write_date(out: &mut impl std::fmt::Write, date: &NaiveDate) -> std::fmt::Result {
    write!(
        out,
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month(),
        date.day()
    )
}

fn write_time(
    out: &mut impl std::fmt::Write,
    time: &NaiveTime,
    offset: &FixedOffset,
) -> std::fmt::Result {
    let millis = time.nanosecond() / 1_000_000;
    let total = offset.local_minus_utc() / 60;
    let sign = if total < 0 { '-' } else { '+' };
    write!(
        out,
        "T{:02}:{:02}:{:02}.{:03}{}{:02}:{:02}",
        time.hour(),
        time.minute(),
        time.second(),
        millis,
        sign,
        total.abs() / 60,
        total.abs() % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_components_are_domain_errors() {
        assert!(DateTimeValue::date(2020, 2, 30).is_err());
        assert!(DateTimeValue::date(2020, 13, 1).is_err());
        assert!(DateTimeValue::time(24, 0, 0, 0, 0).is_err());
        assert!(DateTimeValue::time(10, 61, 0, 0, 0).is_err());
        assert!(DateTimeValue::time(10, 0, 0, 0, 24 * 60).is_err());
        assert!(DateTimeValue::instant(2020, 1, 1, 10, 0, 0, 0, -30).is_ok());
    }

    #[test]
    fn offset_participates_in_equality_and_hash() {
        let a = DateTimeValue::time(18, 36, 56, 342, 0).unwrap();
        let b = DateTimeValue::time(18, 36, 56, 342, 60).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, DateTimeValue::time(18, 36, 56, 342, 0).unwrap());
    }

    #[test]
    fn canonical_forms() {
        let mut out = String::new();
        DateTimeValue::date(2020, 10, 26)
            .unwrap()
            .write_canonical(&mut out)
            .unwrap();
        assert_eq!(out, "$2020-10-26$");

        let mut out = String::new();
        DateTimeValue::instant(2020, 10, 26, 18, 36, 56, 342, 0)
            .unwrap()
            .write_canonical(&mut out)
            .unwrap();
        assert_eq!(out, "$2020-10-26T18:36:56.342+00:00$");

        let mut out = String::new();
        DateTimeValue::time(1, 25, 19, 36, -330)
            .unwrap()
            .write_canonical(&mut out)
            .unwrap();
        assert_eq!(out, "$T01:25:19.036-05:30$");
    }
}
