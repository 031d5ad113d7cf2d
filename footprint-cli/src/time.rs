//! Observation timestamps
//!
//! Half-hourly flux files label the last interval of a day `2400`. Such
//! stamps are read as 00:00 of the following day.

use anyhow::{bail, Context, Result};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

/// Parse `YYYYMMDDHHMM` or `YYYY-MM-DD HH:MM` (a `T` separator is accepted).
pub fn parse_timestamp(stamp: &str) -> Result<NaiveDateTime> {
    let stamp = stamp.trim();
    let (date, time) = if stamp.len() == 12 && stamp.bytes().all(|b| b.is_ascii_digit()) {
        let date = NaiveDate::parse_from_str(&stamp[..8], "%Y%m%d");
        (date, &stamp[8..])
    } else {
        let Some((date, time)) = stamp.split_once([' ', 'T']) else {
            bail!("timestamp '{stamp}' has no time of day");
        };
        (NaiveDate::parse_from_str(date, "%Y-%m-%d"), time)
    };
    let date = date.with_context(|| format!("invalid date in timestamp '{stamp}'"))?;

    if time == "2400" || time == "24:00" {
        let next = date
            .checked_add_days(Days::new(1))
            .with_context(|| format!("timestamp '{stamp}' is out of range"))?;
        return Ok(next.and_time(NaiveTime::MIN));
    }

    let time = NaiveTime::parse_from_str(time, "%H%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .with_context(|| format!("invalid time of day in timestamp '{stamp}'"))?;
    Ok(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn compact_and_dashed_forms() {
        assert_eq!(parse_timestamp("202106151330").unwrap(), at(2021, 6, 15, 13, 30));
        assert_eq!(parse_timestamp("2021-06-15 13:30").unwrap(), at(2021, 6, 15, 13, 30));
        assert_eq!(parse_timestamp("2021-06-15T13:30").unwrap(), at(2021, 6, 15, 13, 30));
    }

    #[test]
    fn end_of_day_rolls_over() {
        assert_eq!(parse_timestamp("202106152400").unwrap(), at(2021, 6, 16, 0, 0));
        assert_eq!(parse_timestamp("2021-12-31 24:00").unwrap(), at(2022, 1, 1, 0, 0));
        // Leap day
        assert_eq!(parse_timestamp("202402282400").unwrap(), at(2024, 2, 29, 0, 0));
    }

    #[test]
    fn malformed_stamps_are_rejected() {
        assert!(parse_timestamp("20210615").is_err());
        assert!(parse_timestamp("202113151330").is_err());
        assert!(parse_timestamp("2021-06-15 25:00").is_err());
        assert!(parse_timestamp("202106152430").is_err());
    }
}
