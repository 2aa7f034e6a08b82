//! ISO-8601 datetime string parser (`datetime_iso`, deprecated `iso_datetime`).

use crate::base_parser::{ParseContext, Parser};
use crate::descriptor::{ParserInfo, Tag};
use crate::types::{JcError, ParserData};
use crate::utils::has_data;
use crate::value::{Map, ParseValue};
use crate::record;
use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike};

const DOCS: &str = r#"
Parses ISO-8601 datetime strings. Naive strings (no offset) are
interpreted in the local timezone when computing `timestamp`.

Usage (cli):

    $ echo "2022-07-20T14:52:45Z" | jc --datetime-iso

Schema:

    {
      "year":           integer,
      "month":          string,
      "month_num":      integer,
      "day":            integer,
      "weekday":        string,
      "weekday_num":    integer,
      "hour":           integer,
      "hour_24":        integer,
      "minute":         integer,
      "second":         integer,
      "microsecond":    integer,
      "period":         string,
      "utc_offset":     string/null,
      "day_of_year":    integer,
      "week_of_year":   integer,
      "iso":            string,
      "timestamp":      integer/null
    }
"#;

pub struct DatetimeIsoParser;

impl Parser for DatetimeIsoParser {
    fn info(&self) -> ParserInfo {
        ParserInfo::new("datetime_iso", "ISO 8601 Datetime string parser")
            .version("1.1")
            .tags(&[Tag::Standard, Tag::String])
            .docs(DOCS)
    }

    fn parse(&self, data: ParserData, _ctx: &ParseContext<'_>) -> Result<ParseValue, JcError> {
        parse_datetime(&data.text())
    }
}

/// Older name kept for compatibility.
pub struct IsoDatetimeParser;

impl Parser for IsoDatetimeParser {
    fn info(&self) -> ParserInfo {
        ParserInfo::new("iso_datetime", "Deprecated - please use datetime-iso")
            .version("1.1")
            .tags(&[Tag::Standard, Tag::String])
            .deprecated()
            .docs("Deprecated: use `datetime_iso`, which produces the same output.")
    }

    fn parse(&self, data: ParserData, _ctx: &ParseContext<'_>) -> Result<ParseValue, JcError> {
        parse_datetime(&data.text())
    }
}

enum Parsed {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y%m%dT%H%M%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y%m%dT%H%M%S%.f",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

fn parse_iso(input: &str) -> Option<Parsed> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(Parsed::Aware(dt));
    }
    let zulu = input
        .strip_suffix('Z')
        .or_else(|| input.strip_suffix('z'))
        .map(|s| format!("{s}+00:00"));
    let candidate = zulu.as_deref().unwrap_or(input);

    AWARE_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(candidate, f).ok())
        .map(Parsed::Aware)
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(input, f).ok())
                .map(Parsed::Naive)
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(input, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(Parsed::Naive)
        })
}

pub(crate) fn parse_datetime(text: &str) -> Result<ParseValue, JcError> {
    if !has_data(text) {
        return Ok(Map::new().into());
    }
    let input = text.trim();
    let parsed = parse_iso(input)
        .ok_or_else(|| JcError::parse(format!("Unable to parse ISO-8601 datetime: {input}")))?;

    let (naive, offset, timestamp) = match &parsed {
        Parsed::Aware(dt) => (
            dt.naive_local(),
            Some(dt.offset().to_string().replace(':', "")),
            Some(dt.timestamp()),
        ),
        Parsed::Naive(n) => (
            *n,
            None,
            Local.from_local_datetime(n).earliest().map(|dt| dt.timestamp()),
        ),
    };
    Ok(calendar_fields(&naive, offset, timestamp).into())
}

fn calendar_fields(dt: &NaiveDateTime, utc_offset: Option<String>, timestamp: Option<i64>) -> Map {
    let micro = dt.nanosecond() / 1_000;
    let mut iso = dt.format("%Y-%m-%dT%H:%M:%S").to_string();
    if micro > 0 {
        iso.push_str(&format!(".{micro:06}"));
    }
    if let Some(off) = &utc_offset {
        iso.push_str(&format!("{}:{}", &off[..3], &off[3..]));
    }
    let (pm, hour12) = dt.hour12();

    record! {
        "year" => dt.year(),
        "month" => dt.format("%b").to_string(),
        "month_num" => dt.month(),
        "day" => dt.day(),
        "weekday" => dt.format("%a").to_string(),
        "weekday_num" => dt.weekday().number_from_monday(),
        "hour" => hour12,
        "hour_24" => dt.hour(),
        "minute" => dt.minute(),
        "second" => dt.second(),
        "microsecond" => micro,
        "period" => if pm { "PM" } else { "AM" },
        "utc_offset" => utc_offset,
        "day_of_year" => dt.ordinal(),
        "week_of_year" => dt.format("%W").to_string().parse::<i64>().unwrap_or(0),
        "iso" => iso,
        "timestamp" => timestamp,
    }
}
