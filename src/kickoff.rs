use chrono::{NaiveDate, NaiveTime};

use crate::table::Cell;

const DATE_FORMATS: [&str; 4] = ["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Chronological sort key for a fixture. Unparsable parts sort first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct KickoffKey {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl KickoffKey {
    pub fn parse(date: &str, time: &str) -> Self {
        Self {
            date: parse_date(date),
            time: parse_time(time),
        }
    }

    pub fn from_cells(date: Option<&Cell>, time: Option<&Cell>) -> Self {
        let date = date.map(Cell::render).unwrap_or_default();
        let time = time.map(Cell::render).unwrap_or_default();
        Self::parse(&date, &time)
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    // Scraped timestamps sometimes carry the kickoff time after the date.
    let s = s.split_whitespace().next().unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}
