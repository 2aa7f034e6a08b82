use anyhow::Result;
use jc::{JcError, Output, ParseValue, ParserInfo, StreamMeta, StreamRecord};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::io::Write;

/// Run metadata added by `-M`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMeta {
    pub parser: String,
    pub timestamp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magic_command: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magic_command_exit: Option<i32>,
}

impl RunMeta {
    pub fn new(parser: &str) -> Self {
        let now = chrono::Utc::now();
        Self {
            parser: parser.to_string(),
            timestamp: now.timestamp_micros() as f64 / 1_000_000.0,
            magic_command: None,
            magic_command_exit: None,
        }
    }

    pub fn with_magic(mut self, command: &[String], exit_code: i32) -> Self {
        self.magic_command = Some(command.to_vec());
        self.magic_command_exit = Some(exit_code);
        self
    }
}

#[derive(Serialize)]
struct MetaBlock<'a> {
    #[serde(flatten)]
    stream: Option<&'a StreamMeta>,
    #[serde(flatten)]
    run: Option<&'a RunMeta>,
}

/// A value with `_jc_meta` merged into each top-level object. Lists get
/// the block on every element; scalars are written unchanged.
#[derive(Clone, Copy)]
pub struct Annotated<'a> {
    value: &'a ParseValue,
    stream: Option<&'a StreamMeta>,
    run: Option<&'a RunMeta>,
}

impl<'a> Annotated<'a> {
    pub fn new(value: &'a ParseValue, stream: Option<&'a StreamMeta>, run: Option<&'a RunMeta>) -> Self {
        Self { value, stream, run }
    }
}

impl Serialize for Annotated<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.stream.is_none() && self.run.is_none() {
            return self.value.serialize(serializer);
        }
        match self.value {
            ParseValue::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len() + 1))?;
                for (k, v) in map.iter().filter(|(k, _)| k.as_str() != "_jc_meta") {
                    out.serialize_entry(k, v)?;
                }
                let block = MetaBlock {
                    stream: self.stream,
                    run: self.run,
                };
                out.serialize_entry("_jc_meta", &block)?;
                out.end()
            }
            ParseValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&Annotated { value: item, ..*self })?;
                }
                seq.end()
            }
            other => other.serialize(serializer),
        }
    }
}

/// JSON writer: one document per line, or indented with `-p`.
pub struct Printer<W: Write> {
    out: W,
    pretty: bool,
    unbuffer: bool,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, pretty: bool, unbuffer: bool) -> Self {
        Self { out, pretty, unbuffer }
    }

    pub fn print<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, value)?;
        } else {
            serde_json::to_writer(&mut self.out, value)?;
        }
        self.out.write_all(b"\n")?;
        if self.unbuffer {
            self.out.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Write a parse result. Streams are written record by record; a strict
/// stream error stops output after everything before it was flushed.
pub fn emit<W: Write>(output: Output<'_>, printer: &mut Printer<W>, run: Option<&RunMeta>) -> Result<()> {
    match output {
        Output::Value(value) => {
            printer.print(&Annotated::new(&value, None, run))?;
        }
        Output::Stream(records) => {
            for record in records {
                match record {
                    Ok(record) => print_record(printer, record, run)?,
                    Err(e) => {
                        printer.flush()?;
                        return Err(stream_error(e));
                    }
                }
            }
        }
    }
    printer.flush()
}

fn print_record<W: Write>(printer: &mut Printer<W>, record: StreamRecord, run: Option<&RunMeta>) -> Result<()> {
    let StreamRecord { payload, meta } = record;
    let value = ParseValue::Map(payload);
    printer.print(&Annotated::new(&value, meta.as_ref(), run))
}

fn stream_error(e: JcError) -> anyhow::Error {
    if e.is_parse_error() {
        anyhow::anyhow!("{e}. Use -qq to ignore streaming parser errors")
    } else {
        e.into()
    }
}

/// Payload for `jc -a`.
#[derive(Debug, Serialize)]
pub struct About {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub license: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_dir: Option<String>,
    pub parser_count: usize,
    pub standard_parser_count: usize,
    pub streaming_parser_count: usize,
    pub plugin_parser_count: usize,
    pub parsers: Vec<ParserInfo>,
}

impl About {
    pub fn collect() -> Self {
        let parsers = jc::all_parser_info(false);
        Self {
            name: "jc",
            version: env!("CARGO_PKG_VERSION"),
            description: "JSON Convert",
            license: "MIT License",
            plugin_dir: jc::plugin::plugin_dir().map(|p| p.display().to_string()),
            parser_count: parsers.len(),
            standard_parser_count: jc::standard_parser_mod_list().len(),
            streaming_parser_count: jc::streaming_parser_mod_list().len(),
            plugin_parser_count: jc::plugin_parser_mod_list().len(),
            parsers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jc::{record, Map};

    fn render<T: Serialize>(value: &T) -> String {
        let mut printer = Printer::new(Vec::new(), false, false);
        printer.print(value).unwrap();
        String::from_utf8(printer.into_inner()).unwrap()
    }

    fn run_meta() -> RunMeta {
        RunMeta {
            parser: "free".to_string(),
            timestamp: 1.5,
            magic_command: None,
            magic_command_exit: None,
        }
    }

    #[test]
    fn test_plain_value_is_unchanged() {
        let value = ParseValue::Map(record! { "a" => 1i64 });
        assert_eq!(render(&Annotated::new(&value, None, None)), "{\"a\":1}\n");
    }

    #[test]
    fn test_meta_goes_on_every_list_element() {
        let value = ParseValue::List(vec![
            ParseValue::Map(record! { "a" => 1i64 }),
            ParseValue::Map(record! { "a" => 2i64 }),
        ]);
        let meta = run_meta();
        let text = render(&Annotated::new(&value, None, Some(&meta)));
        assert_eq!(
            text,
            "[{\"a\":1,\"_jc_meta\":{\"parser\":\"free\",\"timestamp\":1.5}},\
             {\"a\":2,\"_jc_meta\":{\"parser\":\"free\",\"timestamp\":1.5}}]\n"
        );
    }

    #[test]
    fn test_stream_and_run_meta_share_one_block() {
        let value = ParseValue::Map(Map::new());
        let stream = StreamMeta {
            success: false,
            error: Some("ParseError: bad".to_string()),
            line: Some("junk".to_string()),
        };
        let meta = run_meta().with_magic(&["ping".to_string()], 0);
        let text = render(&Annotated::new(&value, Some(&stream), Some(&meta)));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let block = &parsed["_jc_meta"];
        assert_eq!(block["success"], false);
        assert_eq!(block["line"], "junk");
        assert_eq!(block["parser"], "free");
        assert_eq!(block["magic_command"][0], "ping");
        assert_eq!(block["magic_command_exit"], 0);
    }

    #[test]
    fn test_pretty_output_is_indented() {
        let mut printer = Printer::new(Vec::new(), true, false);
        printer.print(&ParseValue::Map(record! { "a" => 1i64 })).unwrap();
        let text = String::from_utf8(printer.into_inner()).unwrap();
        assert_eq!(text, "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn test_strict_stream_error_keeps_earlier_records() {
        let records: Vec<Result<StreamRecord, JcError>> = vec![
            Ok(StreamRecord::new(record! { "n" => 1i64 })),
            Err(JcError::parse("bad line")),
            Ok(StreamRecord::new(record! { "n" => 2i64 })),
        ];
        let output = Output::Stream(Box::new(records.into_iter()));
        let mut printer = Printer::new(Vec::new(), false, true);
        let err = emit(output, &mut printer, None).unwrap_err();
        assert!(err.to_string().contains("-qq"));
        assert_eq!(String::from_utf8(printer.into_inner()).unwrap(), "{\"n\":1}\n");
    }
}
