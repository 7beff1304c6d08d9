use crate::Error;
use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;

const QUERY_START: &str = "https://www.beaverton.k12.or.us/";
const QUERY_END:   &str = "_vti_bin/BSD.Extranet/Syndication.svc/";

/// District-wide calendar when `school` is `None`, otherwise that school's event feed.
pub fn feed_url(school: Option<&str>) -> String {
    match school {
        Some(school) => format!("{}schools/{}/{}GetSchoolEventsFeed?format=atom", QUERY_START, school, QUERY_END),
        None => format!("{}{}GetDistrictCalendarFeed?format=atom", QUERY_START, QUERY_END),
    }
}

pub fn fetch_bytes(client: &Client, school: Option<&str>) -> Result<Vec<u8>, Error> {
    let url = feed_url(school);
    debug!("fetching {}", url);
    let response = client.get(&url).send()?;
    if response.status() != StatusCode::OK {
        return Err(Error::HttpStatus(response.status()));
    }
    Ok(response.bytes()?.to_vec())
}
