//! `free` command output parser.

use crate::base_parser::{ParseContext, Parser};
use crate::descriptor::{ParserInfo, Platform, Tag};
use crate::table::simple_table;
use crate::types::{JcError, ParserData};
use crate::utils::{convert_size_to_int, convert_to_int, data_lines, normalize_header};
use crate::value::{Map, ParseValue};

const DOCS: &str = r#"
Values are converted to integers. Human-readable sizes (`free -h`) are
converted to bytes.

Usage (cli):

    $ free | jc --free

    or

    $ jc free

Schema:

    [
      {
        "type":         string,
        "total":        integer,
        "used":         integer,
        "free":         integer,
        "shared":       integer,
        "buff_cache":   integer,
        "available":    integer
      }
    ]
"#;

pub struct FreeParser;

impl Parser for FreeParser {
    fn info(&self) -> ParserInfo {
        ParserInfo::new("free", "`free` command parser")
            .version("1.8")
            .compatible(&[Platform::Linux])
            .tags(&[Tag::Command])
            .magic("free")
            .docs(DOCS)
    }

    fn parse(&self, data: ParserData, ctx: &ParseContext<'_>) -> Result<ParseValue, JcError> {
        let text = data.text();
        let raw = parse_raw(&text);
        if ctx.raw() {
            return Ok(raw.into());
        }
        Ok(process(raw).into())
    }
}

fn parse_raw(text: &str) -> Vec<Map> {
    let mut lines: Vec<String> = data_lines(text).into_iter().map(str::to_string).collect();
    let Some(header) = lines.first_mut() else {
        return Vec::new();
    };
    *header = normalize_header(&format!("type {header}"));

    let mut rows = simple_table(&lines);
    for row in &mut rows {
        row.update("type", |v| match v.as_str() {
            Some(s) => ParseValue::from(s.trim_end_matches(':')),
            None => v.clone(),
        });
    }
    rows
}

/// Plain numbers or `free -h` sizes such as `3.7Gi`.
pub(crate) fn size_or_int(value: &str) -> Option<i64> {
    if value.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        convert_to_int(value)
    } else {
        convert_size_to_int(value, true)
    }
}

fn process(mut rows: Vec<Map>) -> Vec<Map> {
    for row in &mut rows {
        for (key, value) in row.iter_mut() {
            if key == "type" {
                continue;
            }
            if let Some(s) = value.as_str() {
                *value = size_or_int(s).into();
            }
        }
    }
    rows
}
