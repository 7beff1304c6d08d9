use crate::event::{self, ParsedEvent};
use crate::feed::{Entry, Feed};
use crate::{Error, Options};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use log::warn;
use std::fmt;
use std::io::Write;

pub const PRODID: &str = "-//BSDATOMTOICS v1.0//EN";

/// A DTSTART/DTEND value, rendered together with its parameter prefix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IcsTime {
    Utc(NaiveDateTime),
    Date(NaiveDate),
}

impl fmt::Display for IcsTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Utc(instant) => write!(f, ":{}", instant.format("%Y%m%dT%H%M%SZ")),
            Self::Date(date) => write!(f, ";VALUE=DATE:{}", date.format("%Y%m%d")),
        }
    }
}

// The zero instant: 0001-01-01 00:00:00, already in UTC.
fn zero() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or_default().and_time(NaiveTime::MIN)
}

fn local(instant: Option<DateTime<Tz>>) -> NaiveDateTime {
    instant.map(|instant| instant.naive_local()).unwrap_or_else(zero)
}

fn utc(instant: Option<DateTime<Tz>>) -> NaiveDateTime {
    instant.map(|instant| instant.with_timezone(&Utc).naive_utc()).unwrap_or_else(zero)
}

/// Midnight to 23:59:00 in local time is the feed's way of saying "all day".
pub fn is_all_day(event: &ParsedEvent) -> bool {
    let start = local(event.start);
    let end = local(event.end);
    (start.hour(), start.minute(), start.second()) == (0, 0, 0)
        && (end.hour(), end.minute(), end.second()) == (23, 59, 0)
}

pub fn format_times(event: &ParsedEvent) -> (IcsTime, IcsTime) {
    if !is_all_day(event) {
        return (IcsTime::Utc(utc(event.start)), IcsTime::Utc(utc(event.end)));
    }
    // DTEND of an all-day event is exclusive, so 23:59 rolls over into the next day.
    let end = (local(event.end) + Duration::minutes(1)).date();
    (IcsTime::Date(local(event.start).date()), IcsTime::Date(end))
}

pub fn write_header<W: Write>(writer: &mut W) -> Result<(), Error> {
    write!(writer, "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:{}\r\n", PRODID)?;
    Ok(())
}

pub fn write_footer<W: Write>(writer: &mut W) -> Result<(), Error> {
    write!(writer, "END:VCALENDAR\r\n")?;
    Ok(())
}

pub fn write_event<W: Write>(writer: &mut W, summary: &str, event: &ParsedEvent) -> Result<(), Error> {
    let (start, end) = format_times(event);
    write!(writer, "BEGIN:VEVENT\r\n")?;
    write!(writer, "SUMMARY:{}\r\n", summary)?;
    write!(writer, "DTSTART{}\r\n", start)?;
    write!(writer, "DTEND{}\r\n", end)?;
    write!(writer, "LOCATION:{}\r\n", event.location)?;
    write!(writer, "END:VEVENT\r\n")?;
    Ok(())
}

fn parse_entry(entry: &Entry, options: &Options) -> ParsedEvent {
    match event::extract(&entry.content, &options.timezone, options.debug) {
        Ok(event) => event,
        Err(e) => {
            warn!("entry '{}' ({}): {}; writing it without times or location", entry.title, entry.id, e);
            ParsedEvent::degraded()
        },
    }
}

/// Streams the whole calendar and returns how many events went out.
pub fn write_calendar<W: Write>(feed: &Feed, writer: &mut W, options: &Options) -> Result<usize, Error> {
    write_header(writer)?;
    for entry in &feed.entries {
        write_event(writer, &entry.title, &parse_entry(entry, options))?;
    }
    write_footer(writer)?;
    Ok(feed.entries.len())
}
