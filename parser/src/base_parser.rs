use crate::descriptor::ParserInfo;
use crate::registry_parser::ParserRegistry;
use crate::types::{JcError, LineIter, ParseOptions, ParserData};
use crate::value::{Map, ParseValue};

/// Call-local state handed to every parser invocation.
///
/// Carries the caller's options and the registry so meta-parsers such as
/// `proc` can re-enter dispatch. There is no process-wide state.
#[derive(Clone, Copy)]
pub struct ParseContext<'r> {
    pub options: ParseOptions,
    pub registry: &'r ParserRegistry,
}

impl<'r> ParseContext<'r> {
    pub fn new(registry: &'r ParserRegistry, options: ParseOptions) -> Self {
        Self { options, registry }
    }

    pub fn raw(&self) -> bool {
        self.options.raw
    }

    pub fn quiet(&self) -> bool {
        self.options.quiet
    }

    /// Emit a user-visible warning unless the call is quiet.
    pub fn warn(&self, message: &str) {
        crate::utils::warning_message(self.options.quiet, &[message]);
    }
}

/// Batch parser: complete input in, one value out.
pub trait Parser: Send + Sync {
    /// Static metadata, turned into a descriptor at registration.
    fn info(&self) -> ParserInfo;

    /// Parse the data. Raw mode is this parser's responsibility: when
    /// `ctx.raw()` is set the raw value is returned without post-processing.
    fn parse(&self, data: ParserData, ctx: &ParseContext<'_>) -> Result<ParseValue, JcError>;
}

/// Error raised while producing one streaming record, with the line that caused it.
#[derive(Debug)]
pub struct StreamError {
    pub error: JcError,
    pub line: String,
}

impl StreamError {
    pub fn new(error: JcError, line: impl Into<String>) -> Self {
        Self {
            error,
            line: line.into(),
        }
    }

    pub fn parse(message: impl Into<String>, line: impl Into<String>) -> Self {
        Self::new(JcError::Parse(message.into()), line)
    }
}

/// Inner record iterator produced by a streaming parser.
pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<Map, StreamError>> + 'a>;

/// Streaming parser: lazy lines in, lazy records out.
pub trait StreamingParser: Send + Sync {
    fn info(&self) -> ParserInfo;

    /// Set up the record iterator. Errors returned here are setup errors and
    /// always propagate, even in ignore-exceptions mode.
    fn parse_lines<'a>(
        &self,
        lines: LineIter<'a>,
        ctx: &ParseContext<'_>,
    ) -> Result<RecordIter<'a>, JcError>;
}

/// The one entrypoint shape a descriptor exposes.
pub enum Entrypoint {
    Batch(Box<dyn Parser>),
    Streaming(Box<dyn StreamingParser>),
}

impl Entrypoint {
    pub fn info(&self) -> ParserInfo {
        match self {
            Entrypoint::Batch(p) => p.info(),
            Entrypoint::Streaming(p) => p.info(),
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, Entrypoint::Streaming(_))
    }
}

impl<P: Parser + 'static> From<P> for Entrypoint {
    fn from(parser: P) -> Self {
        Entrypoint::Batch(Box::new(parser))
    }
}

/// Wrap a streaming parser as an entrypoint.
pub fn streaming<P: StreamingParser + 'static>(parser: P) -> Entrypoint {
    Entrypoint::Streaming(Box::new(parser))
}
