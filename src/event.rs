//! Pulls the start time, end time and location out of an entry's content text.
//!
//! The feed embeds them as free text:
//! `Event Time: 3/23/2015 12:00:00 AM - 3/27/2015 11:59:00 PM  Location:  Spring Break`

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone};
use chrono_tz::Tz;
use log::debug;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const PREFIX_TIME:     &str = "Event Time: ";
const DELIM_LOCATION:  &str = "Location: ";
const DELIM_RANGE:     &str = " - ";

#[derive(Clone, Debug, PartialEq)]
pub struct ParsedEvent {
    /// `None` is the zero instant left behind by a token that failed to parse.
    pub start:    Option<DateTime<Tz>>,
    pub end:      Option<DateTime<Tz>>,
    pub location: String,
}

impl ParsedEvent {
    /// Stand-in for an entry whose content could not be split.
    pub fn degraded() -> Self {
        Self { start: None, end: None, location: String::new() }
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("content has no \"Location: \" marker")]
    MissingLocation,
    #[error("event time has no \" - \" separator")]
    MissingRange,
}

pub fn extract(content: &str, tz: &Tz, debug: bool) -> Result<ParsedEvent, ExtractError> {
    let stripped = content.replace('\n', "").replace('\r', "");
    let stripped = stripped.replacen(PREFIX_TIME, "", 1);
    let stripped = stripped.trim_start_matches(' ');
    if debug { debug!("After removal: '{}'", stripped); }

    let (range, location) = stripped.split_once(DELIM_LOCATION).ok_or(ExtractError::MissingLocation)?;
    let (start, end) = range.split_once(DELIM_RANGE).ok_or(ExtractError::MissingRange)?;
    let end = end.trim_end_matches(' ');
    if debug { debug!("Start: '{}' End: '{}'", start, end); }

    Ok(ParsedEvent {
        start:    parse_time(start, tz),
        end:      parse_time(end, tz),
        location: location.trim_matches(' ').to_string(),
    })
}

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<month>\d{1,2})/(?P<day>\d{1,2})/(?P<year>\d{4}) ",
        r"(?P<hour>\d{1,2}):(?P<minute>\d{2}):(?P<second>\d{2}) (?P<meridiem>AM|PM)$",
    ))
    .expect("valid event time regex")
});

/// Parses `M/D/YYYY h:mm:ss AM|PM` as wall-clock time in `tz`.
///
/// Anything that does not match, or names a date or time that does not exist, is `None`.
pub fn parse_time(token: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let captures = TIME_PATTERN.captures(token)?;
    let number = |key: &str| captures[key].parse::<u32>().ok();
    let mut hour = number("hour")?;
    if hour > 12 { return None; }
    hour %= 12;
    if &captures["meridiem"] == "PM" { hour += 12; }
    let year = captures["year"].parse::<i32>().ok()?;
    let date = NaiveDate::from_ymd_opt(year, number("month")?, number("day")?)?;
    let time = NaiveTime::from_hms_opt(hour, number("minute")?, number("second")?)?;
    localize(&date.and_time(time), tz)
}

// Ambiguous wall-clock times take the earlier offset. A time skipped by a
// forward DST jump keeps its clock reading and gets the offset in force
// after the jump, so 2:30 AM on a spring-forward night is 1:30 AM standard time.
fn localize(naive: &NaiveDateTime, tz: &Tz) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(instant) => Some(instant),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let guess = tz.offset_from_utc_datetime(naive).fix();
            let after = tz.offset_from_utc_datetime(&(*naive - guess)).fix();
            Some(tz.from_utc_datetime(&(*naive - after)))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, Utc};
    use chrono_tz::America::Los_Angeles;

    fn utc(instant: Option<DateTime<Tz>>) -> String {
        instant.unwrap().with_timezone(&Utc).format("%Y-%m-%d %H:%M:%S").to_string()
    }

    #[test]
    fn extracts_all_day_closure() {
        let content = "Event Time: 3/23/2015 12:00:00 AM - 3/27/2015 11:59:00 PM  Location:  Spring Break - Schools closed";
        let event = extract(content, &Los_Angeles, false).unwrap();
        assert_eq!(event.location, "Spring Break - Schools closed");
        let start = event.start.unwrap();
        let end = event.end.unwrap();
        assert_eq!((start.hour(), start.minute()), (0, 0));
        assert_eq!((end.hour(), end.minute()), (23, 59));
        assert_eq!(utc(event.start), "2015-03-23 07:00:00");
    }

    #[test]
    fn strips_line_breaks_and_leading_spaces() {
        let content = "\r\nEvent Time:   6/1/2015 9:00:00 AM - \n6/1/2015 10:30:00 AM  Location:  Room 12  \r\n";
        let event = extract(content, &Los_Angeles, false).unwrap();
        assert_eq!(utc(event.start), "2015-06-01 16:00:00");
        assert_eq!(utc(event.end), "2015-06-01 17:30:00");
        assert_eq!(event.location, "Room 12");
    }

    #[test]
    fn missing_location_is_an_error() {
        let content = "Event Time: 6/1/2015 9:00:00 AM - 6/1/2015 10:30:00 AM";
        assert_eq!(extract(content, &Los_Angeles, false), Err(ExtractError::MissingLocation));
    }

    #[test]
    fn range_separator_after_location_does_not_count() {
        let content = "Event Time: 6/1/2015 9:00:00 AM  Location:  Gym - North";
        assert_eq!(extract(content, &Los_Angeles, false), Err(ExtractError::MissingRange));
    }

    #[test]
    fn unparsable_times_become_zero_instants() {
        let content = "Event Time: soon - later  Location:  Library";
        let event = extract(content, &Los_Angeles, false).unwrap();
        assert_eq!(event.start, None);
        assert_eq!(event.end, None);
        assert_eq!(event.location, "Library");
    }

    #[test]
    fn time_tokens_follow_the_feed_format() {
        assert!(parse_time("1/2/2015 3:04:05 PM", &Los_Angeles).is_some());
        assert!(parse_time("01/02/2015 03:04:05 AM", &Los_Angeles).is_some());
        assert!(parse_time("1/2/15 3:04:05 PM", &Los_Angeles).is_none());
        assert!(parse_time("1/2/2015 3:4:05 PM", &Los_Angeles).is_none());
        assert!(parse_time("1/2/2015 13:04:05 PM", &Los_Angeles).is_none());
        assert!(parse_time("2/30/2015 3:04:05 PM", &Los_Angeles).is_none());
        assert!(parse_time("1/2/2015 3:04:05 PM ", &Los_Angeles).is_none());
    }

    #[test]
    fn twelve_oclock_maps_to_midnight_and_noon() {
        let midnight = parse_time("6/1/2015 12:00:00 AM", &Los_Angeles).unwrap();
        let noon = parse_time("6/1/2015 12:00:00 PM", &Los_Angeles).unwrap();
        assert_eq!(midnight.hour(), 0);
        assert_eq!(noon.hour(), 12);
    }

    #[test]
    fn dst_gap_uses_the_offset_after_the_jump() {
        let instant = parse_time("3/8/2015 2:30:00 AM", &Los_Angeles).unwrap();
        assert_eq!(utc(Some(instant)), "2015-03-08 09:30:00");
        assert_eq!(instant.hour(), 1);
    }

    #[test]
    fn repeated_hour_takes_daylight_time() {
        let instant = parse_time("11/1/2015 1:30:00 AM", &Los_Angeles);
        assert_eq!(utc(instant), "2015-11-01 08:30:00");
    }

    #[test]
    fn timezone_is_injectable() {
        let instant = parse_time("6/1/2015 9:00:00 AM", &chrono_tz::UTC);
        assert_eq!(utc(instant), "2015-06-01 09:00:00");
    }
}
