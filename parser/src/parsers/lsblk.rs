//! `lsblk` command output parser.

use crate::base_parser::{ParseContext, Parser};
use crate::descriptor::{ParserInfo, Platform, Tag};
use crate::table::sparse_table;
use crate::types::{JcError, ParserData};
use crate::utils::{bool_fields, data_lines, int_fields, normalize_header};
use crate::value::{Map, ParseValue};

const DOCS: &str = r#"
Columns are taken from the header, so any `-o` column selection works.
Tree drawing characters are removed from `name`.

Usage (cli):

    $ lsblk | jc --lsblk

    or

    $ jc lsblk

Schema:

    [
      {
        "name":         string,
        "maj_min":      string,
        "rm":           boolean,
        "size":         string,
        "ro":           boolean,
        "type":         string,
        "mountpoint":   string,
        "rota":         boolean,
        "ra":           integer,
        "alignment":    integer,
        "min_io":       integer,
        "opt_io":       integer,
        "phy_sec":      integer,
        "log_sec":      integer,
        "rq_size":      integer,
        "disc_aln":     integer
      }
    ]
"#;

const BOOLS: &[&str] = &["rm", "ro", "rota", "rand", "hotplug", "disc_zero"];

const INTS: &[&str] = &[
    "ra", "alignment", "min_io", "opt_io", "phy_sec", "log_sec", "rq_size", "disc_aln",
];

const TREE: &[char] = &['├', '└', '─', '│', '`', '|', '-', ' '];

pub struct LsblkParser;

impl Parser for LsblkParser {
    fn info(&self) -> ParserInfo {
        ParserInfo::new("lsblk", "`lsblk` command parser")
            .version("1.9")
            .compatible(&[Platform::Linux])
            .tags(&[Tag::Command])
            .magic("lsblk")
            .docs(DOCS)
    }

    fn parse(&self, data: ParserData, ctx: &ParseContext<'_>) -> Result<ParseValue, JcError> {
        let text = data.text();
        let mut rows = parse_raw(&text);
        if !ctx.raw() {
            for row in &mut rows {
                bool_fields(row, BOOLS);
                int_fields(row, INTS);
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
    *header = normalize_header(header).replace(':', "_");

    let mut rows = sparse_table(&lines);
    for row in &mut rows {
        row.update("name", |v| match v.as_str() {
            Some(name) => ParseValue::non_empty(name.trim_start_matches(TREE)),
            None => v.clone(),
        });
    }
    rows
}
