//! `swapon` command output parser.

use crate::base_parser::{ParseContext, Parser};
use crate::descriptor::{ParserInfo, Platform, Tag};
use crate::table::simple_table;
use crate::types::{JcError, ParserData};
use crate::utils::{convert_size_to_int, data_lines, int_fields, normalize_header};
use crate::value::{Map, ParseValue};

const DOCS: &str = r#"
Sizes are converted to bytes (binary units); `--bytes` output is used as is.

Usage (cli):

    $ swapon | jc --swapon

    or

    $ jc swapon

Schema:

    [
      {
        "name":       string,
        "type":       string,
        "size":       integer,
        "used":       integer,
        "priority":   integer,
        "uuid":       string,
        "label":      string
      }
    ]
"#;

pub struct SwaponParser;

impl Parser for SwaponParser {
    fn info(&self) -> ParserInfo {
        ParserInfo::new("swapon", "`swapon` command parser")
            .version("1.0")
            .compatible(&[Platform::Linux, Platform::Freebsd])
            .tags(&[Tag::Command])
            .magic("swapon")
            .docs(DOCS)
    }

    fn parse(&self, data: ParserData, ctx: &ParseContext<'_>) -> Result<ParseValue, JcError> {
        let text = data.text();
        let mut rows = parse_raw(&text);
        if !ctx.raw() {
            for row in &mut rows {
                process(row);
            }
        }
        Ok(rows.into())
    }
}

fn parse_raw(text: &str) -> Vec<Map> {
    let mut lines: Vec<String> = data_lines(text).into_iter().map(str::to_string).collect();
    let Some(header) = lines.first_mut() else {
        return Vec::new();
    };
    *header = normalize_header(header);

    let mut rows = simple_table(&lines);
    for row in &mut rows {
        row.rename("prio", "priority");
    }
    rows
}

fn process(row: &mut Map) {
    for key in ["size", "used"] {
        row.update(key, |v| match v.as_str() {
            Some(s) => convert_size_to_int(s, true).into(),
            None => v.clone(),
        });
    }
    int_fields(row, &["priority"]);
}
