//! Streaming framework: adapts a parser's `Result`-shaped record iterator to
//! the public record stream, in strict or ignore-exceptions mode.

use crate::base_parser::{RecordIter, StreamError};
use crate::types::{JcError, LineIter, RecordStream, StreamRecord};
use crate::value::Map;

/// Wrap a parser's inner iterator.
///
/// * strict (`ignore_exceptions == false`): records pass through without
///   metadata; the first error is yielded and the stream ends.
/// * ignore-exceptions: records get `success: true` metadata, parse errors
///   become failure records and iteration continues. Other errors (I/O)
///   still end the stream.
pub fn wrap_records<'a>(inner: RecordIter<'a>, ignore_exceptions: bool) -> RecordStream<'a> {
    Box::new(MetaAdapter {
        inner,
        ignore_exceptions,
        done: false,
    })
}

struct MetaAdapter<'a> {
    inner: RecordIter<'a>,
    ignore_exceptions: bool,
    done: bool,
}

impl Iterator for MetaAdapter<'_> {
    type Item = Result<StreamRecord, JcError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.inner.next()? {
            Ok(payload) if self.ignore_exceptions => Some(Ok(StreamRecord::success(payload))),
            Ok(payload) => Some(Ok(StreamRecord::new(payload))),
            Err(StreamError { error, line }) if self.ignore_exceptions && error.is_parse_error() => {
                Some(Ok(StreamRecord::failure(&error, &line)))
            }
            Err(StreamError { error, .. }) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}

/// Line-at-a-time driver most streaming parsers are built on.
///
/// `step` sees each line and may return a record, nothing (blank, header or
/// continuation lines) or an error; `finish` runs once at end of input to
/// flush deferred aggregate records.
pub struct LineDriver<'a, S> {
    lines: LineIter<'a>,
    state: S,
    step: fn(&mut S, &str) -> Result<Option<Map>, JcError>,
    finish: fn(&mut S) -> Option<Map>,
    finished: bool,
}

impl<'a, S> LineDriver<'a, S> {
    pub fn new(
        lines: LineIter<'a>,
        state: S,
        step: fn(&mut S, &str) -> Result<Option<Map>, JcError>,
        finish: fn(&mut S) -> Option<Map>,
    ) -> Self {
        Self {
            lines,
            state,
            step,
            finish,
            finished: false,
        }
    }
}

impl<S> Iterator for LineDriver<'_, S> {
    type Item = Result<Map, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            match self.lines.next() {
                Some(Ok(line)) => match (self.step)(&mut self.state, &line) {
                    Ok(Some(record)) => return Some(Ok(record)),
                    Ok(None) => continue,
                    Err(e) => return Some(Err(StreamError::new(e, line))),
                },
                Some(Err(e)) => return Some(Err(StreamError::new(JcError::Io(e), String::new()))),
                None => {
                    self.finished = true;
                    return (self.finish)(&mut self.state).map(Ok);
                }
            }
        }
    }
}

/// No deferred record at end of input.
pub fn no_finish<S>(_: &mut S) -> Option<Map> {
    None
}
