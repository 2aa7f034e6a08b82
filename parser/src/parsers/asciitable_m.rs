//! `asciitable_m` parser: bordered tables whose cells span several lines.
//!
//! Rows are delimited by separator lines. The content lines between two
//! separators form one row; each column's pieces are joined with `\n`.

use super::asciitable::{has_vertical, header_keys, is_border_line, split_cells};
use crate::base_parser::{ParseContext, Parser};
use crate::descriptor::{ParserInfo, Tag};
use crate::types::{JcError, ParserData};
use crate::utils::has_data;
use crate::value::{Map, ParseValue};

const DOCS: &str = r#"
Parses bordered ASCII and Unicode tables with multi-line cells. Every row,
including the header, must be separated by a border line; cell lines
within a row are joined with a newline.

Usage (cli):

    $ cat table.txt | jc --asciitable-m

Schema:

    [
      {
        "column_name1":     string,
        "column_name2":     string
      }
    ]
"#;

pub struct AsciiTableMultiParser;

impl Parser for AsciiTableMultiParser {
    fn info(&self) -> ParserInfo {
        ParserInfo::new("asciitable_m", "multi-line ASCII and Unicode table parser")
            .version("1.2")
            .tags(&[Tag::Generic, Tag::String])
            .docs(DOCS)
    }

    fn parse(&self, data: ParserData, ctx: &ParseContext<'_>) -> Result<ParseValue, JcError> {
        let text = data.text();
        if !has_data(&text) {
            return Ok(ParseValue::List(Vec::new()));
        }
        let header_line = text
            .lines()
            .find(|l| !l.trim().is_empty() && !is_border_line(l))
            .unwrap_or_default();
        if !has_vertical(header_line) {
            return Err(JcError::parse(
                "Table is not bordered with vertical separators; use the asciitable parser",
            ));
        }
        Ok(Builder::new(ctx).run(&text).into())
    }
}

/// One content line, remembered with its 1-based input line number.
struct Line {
    number: usize,
    cells: Vec<String>,
}

struct Builder<'c, 'r> {
    ctx: &'c ParseContext<'r>,
    keys: Option<Vec<String>>,
    group: Vec<Line>,
    rows: Vec<Map>,
}

impl<'c, 'r> Builder<'c, 'r> {
    fn new(ctx: &'c ParseContext<'r>) -> Self {
        Self {
            ctx,
            keys: None,
            group: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn run(mut self, text: &str) -> Vec<Map> {
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            if is_border_line(line) {
                self.flush();
                continue;
            }
            let cells = split_cells(line);
            let number = idx + 1;
            self.group.push(Line { number, cells });
        }

        // Tables without any separator under the header: one row per line.
        if self.keys.is_none() && self.group.len() > 1 {
            let rest = self.group.split_off(1);
            self.flush();
            for line in rest {
                self.group.push(line);
                self.flush();
            }
        }
        self.flush();
        self.rows
    }

    fn flush(&mut self) {
        if self.group.is_empty() {
            return;
        }
        let group = std::mem::take(&mut self.group);
        match self.keys.take() {
            None => self.keys = Some(header_from(&group)),
            Some(keys) => {
                let row = merge(self.ctx, &keys, group);
                self.rows.push(row);
                self.keys = Some(keys);
            }
        }
    }
}

fn header_from(group: &[Line]) -> Vec<String> {
    let width = group.iter().map(|l| l.cells.len()).max().unwrap_or(0);
    let headings: Vec<String> = (0..width)
        .map(|i| {
            group
                .iter()
                .filter_map(|l| l.cells.get(i))
                .filter(|c| !c.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    header_keys(&headings)
}

fn merge(ctx: &ParseContext<'_>, keys: &[String], group: Vec<Line>) -> Map {
    let mut columns: Vec<Vec<String>> = vec![Vec::new(); keys.len()];
    for Line { number, mut cells } in group {
        if cells.len() > keys.len() {
            ctx.warn(&format!(
                "Row {} has {} cells, expected {}; extra cells merged into the last column",
                number,
                cells.len(),
                keys.len()
            ));
            let extra = cells.split_off(keys.len());
            if let Some(last) = cells.last_mut() {
                last.push(' ');
                last.push_str(&extra.join(" "));
            }
        }
        for (i, cell) in cells.into_iter().enumerate() {
            if !cell.is_empty() {
                columns[i].push(cell);
            }
        }
    }
    keys.iter()
        .zip(columns)
        .map(|(k, parts)| {
            let value = if parts.is_empty() {
                ParseValue::Null
            } else {
                ParseValue::String(parts.join("\n"))
            };
            (k.as_str(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry_parser::ParserRegistry;
    use crate::types::ParseOptions;

    fn parse(text: &str) -> Result<ParseValue, JcError> {
        let registry = ParserRegistry::new();
        let ctx = ParseContext::new(&registry, ParseOptions::quiet());
        AsciiTableMultiParser.parse(ParserData::Text(text.to_string()), &ctx)
    }

    #[test]
    fn test_multiline_cells_are_joined() {
        let table = "╒══════════╤═════════╕\n\
                     │ foo      │ bar     │\n\
                     ╞══════════╪═════════╡\n\
                     │ line one │ 1       │\n\
                     │ line two │         │\n\
                     ├──────────┼─────────┤\n\
                     │ single   │ 2       │\n\
                     ╘══════════╧═════════╛";
        let out = parse(table).unwrap();
        let rows = out.as_list().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("foo"), Some(&ParseValue::from("line one\nline two")));
        assert_eq!(rows[0].get("bar"), Some(&ParseValue::from("1")));
        assert_eq!(rows[1].get("foo"), Some(&ParseValue::from("single")));
    }

    #[test]
    fn test_multiline_header() {
        let table = "+--------+-------+\n\
                     | disk   | size  |\n\
                     | name   | (GB)  |\n\
                     +========+=======+\n\
                     | sda    | 20    |\n\
                     +--------+-------+";
        let out = parse(table).unwrap();
        let rows = out.as_list().unwrap();
        assert_eq!(rows[0].get("disk_name"), Some(&ParseValue::from("sda")));
        assert_eq!(rows[0].get("size_gb"), Some(&ParseValue::from("20")));
    }

    #[test]
    fn test_extra_cells_merge_into_last_column() {
        let table = "+---+---+\n| a | b |\n+---+---+\n| 1 | 2 | 3 |\n+---+---+";
        let out = parse(table).unwrap();
        assert_eq!(out.as_list().unwrap()[0].get("b"), Some(&ParseValue::from("2 3")));
    }

    #[test]
    fn test_unbordered_table_is_rejected() {
        let err = parse("a  b\n1  2").unwrap_err();
        assert_eq!(err.kind(), "ParseError");
        assert_eq!(parse("").unwrap(), ParseValue::List(Vec::new()));
    }
}
