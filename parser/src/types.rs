use crate::value::{Map, ParseValue};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::io::{self, BufRead};

#[derive(Debug, thiserror::Error)]
pub enum JcError {
    #[error("Parser not found: {0}")]
    ParserNotFound(String),
    #[error("{0}")]
    InputType(String),
    #[error("The {parser} parser requires the {library} library, which is not installed")]
    LibraryNotInstalled { parser: String, library: String },
    #[error("{0}")]
    Parse(String),
    #[error("Could not load plugin {path}: {reason}")]
    PluginLoad { path: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "csv")]
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
}

impl JcError {
    pub fn parse(msg: impl Into<String>) -> Self {
        JcError::Parse(msg.into())
    }

    pub fn input_type(msg: impl Into<String>) -> Self {
        JcError::InputType(msg.into())
    }

    /// Stable kind name, used in streaming metadata as `"<Kind>: <message>"`.
    pub fn kind(&self) -> &'static str {
        match self {
            JcError::ParserNotFound(_) => "ParserNotFound",
            JcError::InputType(_) => "InputTypeError",
            JcError::LibraryNotInstalled { .. } => "LibraryNotInstalled",
            JcError::Parse(_) => "ParseError",
            JcError::PluginLoad { .. } => "PluginLoadError",
            JcError::Io(_) => "IoError",
            #[cfg(feature = "csv")]
            JcError::Csv(_) => "CsvError",
        }
    }

    /// Errors a parser raises for input that does not match its grammar.
    /// Only these are trapped by ignore-exceptions mode.
    pub fn is_parse_error(&self) -> bool {
        match self {
            JcError::Parse(_) => true,
            #[cfg(feature = "csv")]
            JcError::Csv(_) => true,
            _ => false,
        }
    }
}

impl From<String> for JcError {
    fn from(msg: String) -> Self {
        JcError::Parse(msg)
    }
}

impl From<&str> for JcError {
    fn from(msg: &str) -> Self {
        JcError::Parse(msg.to_string())
    }
}

/// Per-call flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Skip per-parser post-processing and keep raw field strings.
    pub raw: bool,
    /// Suppress warnings.
    pub quiet: bool,
    /// Streaming only: turn per-record errors into metadata records.
    pub ignore_exceptions: bool,
}

impl ParseOptions {
    pub fn raw() -> Self {
        Self {
            raw: true,
            ..Self::default()
        }
    }

    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    pub fn with_raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_ignore_exceptions(mut self, v: bool) -> Self {
        self.ignore_exceptions = v;
        self
    }
}

/// Lazy line source handed to streaming parsers.
pub type LineIter<'a> = Box<dyn Iterator<Item = io::Result<String>> + 'a>;

/// Raw input accepted by dispatch.
pub enum Input<'a> {
    Text(String),
    Bytes(Vec<u8>),
    Lines(LineIter<'a>),
}

impl<'a> Input<'a> {
    /// Line iterator over an in-memory string.
    pub fn lines_of(text: &'a str) -> Self {
        Input::Lines(Box::new(text.lines().map(|l| Ok(l.to_string()))))
    }

    /// Line iterator over any buffered reader (e.g. locked stdin).
    pub fn from_reader<R: BufRead + 'a>(reader: R) -> Self {
        Input::Lines(Box::new(reader.lines()))
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Input::Text(_) => "string",
            Input::Bytes(_) => "bytes",
            Input::Lines(_) => "line iterator",
        }
    }
}

impl From<&str> for Input<'_> {
    fn from(s: &str) -> Self {
        Input::Text(s.to_string())
    }
}

impl From<String> for Input<'_> {
    fn from(s: String) -> Self {
        Input::Text(s)
    }
}

impl From<Vec<u8>> for Input<'_> {
    fn from(b: Vec<u8>) -> Self {
        Input::Bytes(b)
    }
}

/// Data handed to a batch parser after dispatch validated its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserData {
    Text(String),
    Bytes(Vec<u8>),
}

impl ParserData {
    /// Text view; binary data is decoded lossily.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        match self {
            ParserData::Text(s) => std::borrow::Cow::Borrowed(s),
            ParserData::Bytes(b) => String::from_utf8_lossy(b),
        }
    }
}

/// Metadata attached to a streaming record in ignore-exceptions mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamMeta {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
}

/// One item yielded by a streaming parser.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRecord {
    pub payload: Map,
    pub meta: Option<StreamMeta>,
}

impl StreamRecord {
    pub fn new(payload: Map) -> Self {
        Self { payload, meta: None }
    }

    pub fn success(payload: Map) -> Self {
        Self {
            payload,
            meta: Some(StreamMeta {
                success: true,
                error: None,
                line: None,
            }),
        }
    }

    pub fn failure(error: &JcError, line: &str) -> Self {
        Self {
            payload: Map::new(),
            meta: Some(StreamMeta {
                success: false,
                error: Some(format!("{}: {}", error.kind(), error)),
                line: Some(line.trim().to_string()),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.meta.as_ref().map_or(true, |m| m.success)
    }

    pub fn get(&self, key: &str) -> Option<&ParseValue> {
        self.payload.get(key)
    }
}

impl Serialize for StreamRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(self.meta.is_some());
        let mut map = serializer.serialize_map(Some(self.payload.len() + extra))?;
        for (k, v) in self.payload.iter() {
            map.serialize_entry(k, v)?;
        }
        if let Some(meta) = &self.meta {
            map.serialize_entry("_jc_meta", meta)?;
        }
        map.end()
    }
}

/// Lazy record stream returned for streaming parsers.
pub type RecordStream<'a> = Box<dyn Iterator<Item = Result<StreamRecord, JcError>> + 'a>;

/// Result of dispatch: a value for batch parsers, a stream otherwise.
pub enum Output<'a> {
    Value(ParseValue),
    Stream(RecordStream<'a>),
}

impl<'a> Output<'a> {
    pub fn into_value(self) -> Option<ParseValue> {
        match self {
            Output::Value(v) => Some(v),
            Output::Stream(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<RecordStream<'a>> {
        match self {
            Output::Value(_) => None,
            Output::Stream(s) => Some(s),
        }
    }
}

impl std::fmt::Debug for Output<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Output::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Output::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}
