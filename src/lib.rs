pub mod event;
pub mod feed;
pub mod fetch;
pub mod ics;

use chrono_tz::Tz;
use clap::{App, Arg, ArgMatches};
use log::{debug, info};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use thiserror::Error;

pub use crate::feed::{Entry, Feed, Link};

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;

/// Knobs for a single conversion.
#[derive(Clone, Debug)]
pub struct Options {
    /// Zone the feed's wall-clock times are read in.
    pub timezone: Tz,
    /// Report feed metadata and intermediate extraction strings through `log::debug!`.
    ///
    /// The lines only show up if the installed logger also lets the debug level through.
    pub debug:    bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { timezone: DEFAULT_TIMEZONE, debug: false }
    }
}

/// Converts raw Atom bytes into an ICS stream on `writer` and returns the number of events written.
///
/// The feed is parsed completely before the first byte is written, so a parse
/// failure never leaves a partial calendar behind.
pub fn atom_to_ics<W: Write>(bytes: &[u8], writer: &mut W, options: &Options) -> Result<usize, Error> {
    let feed = Feed::parse(bytes)?;
    if options.debug {
        debug!("Title: {}", feed.title);
        debug!("Id: {}", feed.id);
        debug!("Last updated: {}", feed.updated.len());
        debug!("Entry count after unmarshal: {}", feed.entries.len());
    }
    ics::write_calendar(&feed, writer, options)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mode {
    /// Convert the feed to ICS.
    Ics,
    /// Write the raw feed bytes untouched.
    Dump,
}

#[derive(Debug)]
pub struct Config {
    pub debug:    bool,
    pub input:    Option<String>,
    pub mode:     Mode,
    pub output:   Option<String>,
    pub school:   Option<String>,
    pub timezone: Tz,
}

pub fn app() -> App<'static, 'static> {
    App::new("atom2ics")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Converts the Beaverton School District Atom calendar feed to iCalendar")
        .arg(Arg::with_name("mode")
            .help("ics converts the feed, dump prints it as fetched")
            .possible_values(&["ics", "dump"])
            .default_value("ics"))
        .arg(Arg::with_name("school")
            .short("s")
            .long("school")
            .takes_value(true)
            .value_name("NAME")
            .help("School slug, e.g. jacob-wismer; the district calendar when absent"))
        .arg(Arg::with_name("input")
            .short("i")
            .long("input")
            .takes_value(true)
            .value_name("FILE")
            .help("Read the feed from FILE instead of fetching it"))
        .arg(Arg::with_name("output")
            .short("o")
            .long("output")
            .takes_value(true)
            .value_name("FILE")
            .help("Write to FILE instead of stdout"))
        .arg(Arg::with_name("timezone")
            .short("z")
            .long("timezone")
            .takes_value(true)
            .value_name("TZ")
            .help("IANA zone of the feed's times [default: America/Los_Angeles]"))
        .arg(Arg::with_name("debug")
            .short("d")
            .long("debug")
            .help("Print feed details and extraction steps to stderr"))
}

impl Config {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, Error> {
        let mode = match matches.value_of("mode") {
            Some("dump") => Mode::Dump,
            _ => Mode::Ics,
        };
        let timezone = match matches.value_of("timezone") {
            Some(name) => name.parse::<Tz>().map_err(|_| Error::UnknownTimezone(name.to_string()))?,
            None => DEFAULT_TIMEZONE,
        };
        Ok(Self {
            debug:  matches.is_present("debug"),
            input:  matches.value_of("input").map(String::from),
            mode,
            output: matches.value_of("output").map(String::from),
            school: matches.value_of("school").map(String::from),
            timezone,
        })
    }

    pub fn options(&self) -> Options {
        Options { timezone: self.timezone, debug: self.debug }
    }

    /// Reads the feed, renders it in memory and only then touches the output,
    /// so a bad download leaves an existing `-o` file as it was.
    pub fn run(&self) -> Result<(), Error> {
        let bytes = self.read_feed()?;
        let rendered = match self.mode {
            Mode::Ics => {
                let mut buffer = Vec::new();
                let count = atom_to_ics(&bytes, &mut buffer, &self.options())?;
                info!("wrote {} events", count);
                buffer
            },
            Mode::Dump => bytes,
        };
        let mut writer: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(BufWriter::new(io::stdout())),
        };
        writer.write_all(&rendered)?;
        writer.flush()?;
        Ok(())
    }

    fn read_feed(&self) -> Result<Vec<u8>, Error> {
        match &self.input {
            Some(path) => Ok(fs::read(path)?),
            None => fetch::fetch_bytes(&Client::new(), self.school.as_deref()),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("no bytes received in input")]
    EmptyInput,
    #[error("unexpected HTTP status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("root element is {0}, expected an Atom feed")]
    UnexpectedRoot(String),
    #[error("unknown timezone {0}")]
    UnknownTimezone(String),
    #[error("unable to parse the Atom feed ({0})")]
    Xml(#[from] xml::reader::Error),
}
