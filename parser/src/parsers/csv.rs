//! `csv` and `csv_s` parsers: delimited files with a header row.
//!
//! Backed by the `csv` crate. When the crate is compiled out (feature
//! `csv` disabled) both parsers still register and dispatch reports
//! `LibraryNotInstalled`.

use crate::base_parser::{ParseContext, Parser, RecordIter, StreamingParser};
use crate::descriptor::{ParserInfo, Tag};
use crate::types::{JcError, LineIter, ParserData};
use crate::value::{Map, ParseValue};

const DOCS: &str = r#"
Parses CSV files. The delimiter is sniffed from the header row (one of
`,` `;` tab `|`) and the header row supplies the keys. Values are strings.

Usage (cli):

    $ cat file.csv | jc --csv

Schema:

    [
      {
        "column_name1":     string,
        "column_name2":     string
      }
    ]
"#;

const STREAM_DOCS: &str = r#"
Streaming CSV parser: the first non-blank line is the header, each later
line produces one record.

Usage (cli):

    $ cat file.csv | jc --csv-s

Schema:

    {
      "column_name1":     string,
      "column_name2":     string,
      "_jc_meta": {
        "success":    boolean,
        "error":      string,
        "line":       string
      }
    }
"#;

const AVAILABLE: bool = cfg!(feature = "csv");

const CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Most frequent candidate delimiter in the sample, comma by default.
fn sniff_delimiter(sample: &str) -> u8 {
    CANDIDATES
        .iter()
        .map(|&d| (d, sample.bytes().filter(|&b| b == d).count()))
        .filter(|&(_, n)| n > 0)
        .max_by_key(|&(_, n)| n)
        .map_or(b',', |(d, _)| d)
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

pub struct CsvParser;

impl Parser for CsvParser {
    fn info(&self) -> ParserInfo {
        ParserInfo::new("csv", "CSV file parser")
            .version("1.6")
            .tags(&[Tag::Standard, Tag::File, Tag::String])
            .requires("csv", AVAILABLE)
            .docs(DOCS)
    }

    fn parse(&self, data: ParserData, ctx: &ParseContext<'_>) -> Result<ParseValue, JcError> {
        parse_document(&data.text(), ctx)
    }
}

pub struct CsvStreamParser;

impl StreamingParser for CsvStreamParser {
    fn info(&self) -> ParserInfo {
        ParserInfo::new("csv_s", "CSV file streaming parser")
            .version("1.4")
            .tags(&[Tag::Standard, Tag::File, Tag::String])
            .requires("csv", AVAILABLE)
            .docs(STREAM_DOCS)
    }

    fn parse_lines<'a>(
        &self,
        lines: LineIter<'a>,
        ctx: &ParseContext<'_>,
    ) -> Result<RecordIter<'a>, JcError> {
        stream_records(lines, ctx)
    }
}

#[cfg(feature = "csv")]
fn reader(text: &str, delimiter: u8, has_headers: bool) -> ::csv::Reader<&[u8]> {
    ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(text.as_bytes())
}

#[cfg(feature = "csv")]
fn row_map(headers: &[String], record: &::csv::StringRecord) -> Map {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), record.get(i).map_or(ParseValue::Null, ParseValue::from)))
        .collect()
}

#[cfg(feature = "csv")]
fn parse_document(text: &str, _ctx: &ParseContext<'_>) -> Result<ParseValue, JcError> {
    let text = strip_bom(text);
    if !crate::utils::has_data(text) {
        return Ok(ParseValue::List(Vec::new()));
    }
    let sample = text.lines().find(|l| !l.trim().is_empty()).unwrap_or_default();
    let mut rdr = reader(text.trim_start(), sniff_delimiter(sample), true);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(ParseValue::Map(row_map(&headers, &record)));
    }
    Ok(ParseValue::List(rows))
}

#[cfg(feature = "csv")]
struct StreamState {
    headers: Option<Vec<String>>,
    delimiter: u8,
}

#[cfg(feature = "csv")]
fn stream_step(state: &mut StreamState, line: &str) -> Result<Option<Map>, JcError> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    if state.headers.is_none() {
        let line = strip_bom(line);
        state.delimiter = sniff_delimiter(line);
        let mut rdr = reader(line, state.delimiter, false);
        let header = rdr
            .records()
            .next()
            .transpose()?
            .ok_or_else(|| JcError::parse("Missing CSV header"))?;
        state.headers = Some(header.iter().map(str::to_string).collect());
        return Ok(None);
    }
    let headers = state.headers.as_deref().unwrap_or_default();
    let mut rdr = reader(line, state.delimiter, false);
    let record = rdr
        .records()
        .next()
        .transpose()?
        .ok_or_else(|| JcError::parse("Could not parse line"))?;
    if record.len() > headers.len() {
        return Err(JcError::parse(format!(
            "Row has {} fields, header has {}",
            record.len(),
            headers.len()
        )));
    }
    Ok(Some(row_map(headers, &record)))
}

#[cfg(feature = "csv")]
fn stream_records<'a>(lines: LineIter<'a>, _ctx: &ParseContext<'_>) -> Result<RecordIter<'a>, JcError> {
    use crate::streaming::{no_finish, LineDriver};
    let state = StreamState {
        headers: None,
        delimiter: b',',
    };
    Ok(Box::new(LineDriver::new(lines, state, stream_step, no_finish)))
}

#[cfg(not(feature = "csv"))]
fn parse_document(_text: &str, _ctx: &ParseContext<'_>) -> Result<ParseValue, JcError> {
    Err(JcError::LibraryNotInstalled {
        parser: "csv".to_string(),
        library: "csv".to_string(),
    })
}

#[cfg(not(feature = "csv"))]
fn stream_records<'a>(_lines: LineIter<'a>, _ctx: &ParseContext<'_>) -> Result<RecordIter<'a>, JcError> {
    Err(JcError::LibraryNotInstalled {
        parser: "csv_s".to_string(),
        library: "csv".to_string(),
    })
}
