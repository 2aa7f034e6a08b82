//! Dispatch pipeline: resolve, validate the input shape, warn, invoke.

use crate::base_parser::{Entrypoint, ParseContext};
use crate::registry_parser::{ParserDescriptor, ParserRegistry};
use crate::streaming::wrap_records;
use crate::types::{Input, JcError, LineIter, Output, ParseOptions, ParserData};
use crate::utils;
use std::io;
use tracing::debug;

impl ParserRegistry {
    /// Parse `input` with the parser called `name`.
    ///
    /// Batch parsers return [`Output::Value`]; streaming parsers return a lazy
    /// [`Output::Stream`]. Parse errors raised by a batch parser propagate
    /// unchanged.
    pub fn parse<'a>(
        &self,
        name: &str,
        input: Input<'a>,
        options: ParseOptions,
    ) -> Result<Output<'a>, JcError> {
        let descriptor = self
            .lookup(name)
            .ok_or_else(|| JcError::ParserNotFound(name.to_string()))?;
        self.invoke(descriptor, input, options)
    }

    pub(crate) fn invoke<'a>(
        &self,
        descriptor: &ParserDescriptor,
        input: Input<'a>,
        options: ParseOptions,
    ) -> Result<Output<'a>, JcError> {
        let info = &descriptor.info;
        debug!("Dispatching {} input to parser {}", input.shape(), info.name);
        descriptor.warn_if_deprecated(options.quiet);

        if let Some(library) = info.missing_library() {
            return Err(JcError::LibraryNotInstalled {
                parser: info.name.clone(),
                library: library.to_string(),
            });
        }

        let ctx = ParseContext::new(self, options);
        match &descriptor.entrypoint {
            Entrypoint::Batch(parser) => {
                let data = batch_data(&info.name, info.slurpable, info.binary_input_allowed, input)?;
                utils::compatibility(info, options.quiet);
                parser.parse(data, &ctx).map(Output::Value)
            }
            Entrypoint::Streaming(parser) => {
                let lines = stream_lines(&info.name, info.binary_input_allowed, input)?;
                utils::compatibility(info, options.quiet);
                let inner = parser.parse_lines(lines, &ctx)?;
                Ok(Output::Stream(wrap_records(inner, options.ignore_exceptions)))
            }
        }
    }
}

fn batch_data(
    name: &str,
    slurpable: bool,
    binary_allowed: bool,
    input: Input<'_>,
) -> Result<ParserData, JcError> {
    match input {
        Input::Text(text) => Ok(ParserData::Text(text)),
        Input::Bytes(bytes) if binary_allowed => Ok(ParserData::Bytes(bytes)),
        Input::Bytes(_) => Err(JcError::input_type(format!(
            "Input data to the {name} parser must be a string, not bytes."
        ))),
        Input::Lines(lines) if slurpable => {
            let lines = lines.collect::<io::Result<Vec<String>>>()?;
            Ok(ParserData::Text(lines.join("\n")))
        }
        Input::Lines(_) => Err(JcError::input_type(format!(
            "Input data to the {name} parser must be a string, not a line iterator."
        ))),
    }
}

fn stream_lines<'a>(name: &str, binary_allowed: bool, input: Input<'a>) -> Result<LineIter<'a>, JcError> {
    match input {
        Input::Lines(lines) => Ok(lines),
        Input::Bytes(bytes) if binary_allowed => {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            let lines: Vec<io::Result<String>> = text.lines().map(|l| Ok(l.to_string())).collect();
            Ok(Box::new(lines.into_iter()))
        }
        Input::Text(_) => Err(JcError::input_type(format!(
            "Input data to the {name} streaming parser must be an iterable of lines, not a string."
        ))),
        Input::Bytes(_) => Err(JcError::input_type(format!(
            "Input data to the {name} streaming parser must be an iterable of lines, not bytes."
        ))),
    }
}
