//! `asciitable` parser: ASCII and Unicode box tables with single-line cells.
//!
//! Bordered tables are split on their vertical separators; borderless
//! tables (e.g. `tabulate` "simple" output) fall back to [`sparse_table`].

use crate::base_parser::{ParseContext, Parser};
use crate::descriptor::{ParserInfo, Tag};
use crate::table::sparse_table;
use crate::types::{JcError, ParserData};
use crate::utils::normalize_key;
use crate::value::{Map, ParseValue};

const DOCS: &str = r#"
Parses ASCII and Unicode tables. Headers are lowercased and non-word
characters are collapsed to `_`. Blank cells become null.

Usage (cli):

    $ cat table.txt | jc --asciitable

Schema:

    [
      {
        "column_name1":     string,
        "column_name2":     string
      }
    ]
"#;

const VERTICAL: [char; 4] = ['|', '│', '┃', '║'];

fn is_box_char(c: char) -> bool {
    ('\u{2500}'..='\u{257F}').contains(&c)
}

/// Separator lines: only border characters, with at least one horizontal stroke.
pub(crate) fn is_border_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_whitespace() || "+-=_:|".contains(c) || is_box_char(c))
        && trimmed
            .chars()
            .any(|c| "-=_".contains(c) || (is_box_char(c) && !VERTICAL.contains(&c)))
}

pub(crate) fn has_vertical(line: &str) -> bool {
    line.contains(VERTICAL)
}

/// Cells of a bordered line, with the outer borders removed and each cell trimmed.
pub(crate) fn split_cells(line: &str) -> Vec<String> {
    let mut body = line.trim();
    if let Some(rest) = body.strip_prefix(VERTICAL) {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix(VERTICAL) {
        body = rest;
    }
    body.split(VERTICAL).map(|c| c.trim().to_string()).collect()
}

/// Normalised header keys; blank headings get a positional name.
pub(crate) fn header_keys<S: AsRef<str>>(headings: &[S]) -> Vec<String> {
    headings
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let key = normalize_key(h.as_ref());
            if key.is_empty() {
                format!("column_{}", i + 1)
            } else {
                key
            }
        })
        .collect()
}

pub struct AsciiTableParser;

impl Parser for AsciiTableParser {
    fn info(&self) -> ParserInfo {
        ParserInfo::new("asciitable", "ASCII and Unicode table parser")
            .version("1.2")
            .tags(&[Tag::Generic, Tag::String])
            .docs(DOCS)
    }

    /// Cells are always strings or null, so raw and processed output match.
    fn parse(&self, data: ParserData, ctx: &ParseContext<'_>) -> Result<ParseValue, JcError> {
        let text = data.text();
        let lines: Vec<&str> = text
            .lines()
            .filter(|l| !l.trim().is_empty() && !is_border_line(l))
            .collect();
        let Some(header) = lines.first() else {
            return Ok(ParseValue::List(Vec::new()));
        };

        let records = if has_vertical(header) {
            bordered(&lines, ctx)
        } else {
            borderless(&lines)
        };
        Ok(records.into())
    }
}

fn bordered(lines: &[&str], ctx: &ParseContext<'_>) -> Vec<Map> {
    let keys = header_keys(&split_cells(lines[0]));
    lines[1..]
        .iter()
        .map(|line| {
            let mut cells = split_cells(line);
            if cells.len() > keys.len() {
                ctx.warn(&format!(
                    "Row has {} cells, expected {}: {}",
                    cells.len(),
                    keys.len(),
                    line.trim()
                ));
                let extra = cells.split_off(keys.len());
                if let Some(last) = cells.last_mut() {
                    last.push(' ');
                    last.push_str(&extra.join(" "));
                }
            }
            keys.iter()
                .enumerate()
                .map(|(i, k)| {
                    let cell = cells.get(i).map_or(ParseValue::Null, |c| ParseValue::non_empty(c));
                    (k.as_str(), cell)
                })
                .collect::<Map>()
        })
        .collect()
}

fn borderless(lines: &[&str]) -> Vec<Map> {
    let keys = header_keys(&lines[0].split_whitespace().collect::<Vec<_>>());
    sparse_table(lines)
        .into_iter()
        .map(|row| {
            row.iter()
                .zip(&keys)
                .map(|((_, v), k)| (k.as_str(), v.clone()))
                .collect::<Map>()
        })
        .collect()
}
