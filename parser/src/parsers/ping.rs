//! `ping` and `ping6` parsers, batch and streaming.
//!
//! Both parsers share one line classifier. The batch parser collects the
//! responses and the statistics footer into one object; the streaming
//! parser yields each response as it arrives and flushes the footer as a
//! `summary` record at end of input.

use crate::base_parser::{ParseContext, Parser, RecordIter, StreamingParser};
use crate::descriptor::{ParserInfo, Platform, Tag};
use crate::record;
use crate::streaming::LineDriver;
use crate::types::{JcError, LineIter, ParserData};
use crate::utils::{float_fields, has_data, int_fields};
use crate::value::{Map, ParseValue};
use regex::{Captures, Regex};
use std::sync::LazyLock;

const DOCS: &str = r#"
Supports Linux and BSD/macOS `ping` and `ping6` output, including
timestamps (`-D`), timeouts (`-O`) and unreachable replies.

Usage (cli):

    $ ping -c 3 127.0.0.1 | jc --ping

    or

    $ jc ping -c 3 127.0.0.1

Schema:

    {
      "destination_ip":           string,
      "data_bytes":               integer,
      "pattern":                  string,
      "destination":              string,
      "packets_transmitted":      integer,
      "packets_received":         integer,
      "packet_loss_percent":      float,
      "duplicates":               integer,
      "errors":                   integer,
      "time_ms":                  float,
      "round_trip_ms_min":        float,
      "round_trip_ms_avg":        float,
      "round_trip_ms_max":        float,
      "round_trip_ms_stddev":     float,
      "responses": [
        {
          "type":                 string,   # 'reply', 'timeout', 'unreachable'
          "timestamp":            float,
          "response_bytes":       integer,
          "response_ip":          string,
          "icmp_seq":             integer,
          "ttl":                  integer,
          "time_ms":              float,
          "duplicate":            boolean,
          "error_message":        string
        }
      ]
    }
"#;

const STREAM_DOCS: &str = r#"
Streaming `ping` parser. Yields one record per reply, timeout or
unreachable line, then a `summary` record once the input ends.

Usage (cli):

    $ ping 127.0.0.1 | jc --ping-s

Schema:

    {
      "type":                     string,   # 'reply', 'timeout', 'unreachable', 'summary'
      "destination_ip":           string,
      "sent_bytes":               integer,
      "pattern":                  string,
      "timestamp":                float,
      "response_bytes":           integer,
      "response_ip":              string,
      "icmp_seq":                 integer,
      "ttl":                      integer,
      "time_ms":                  float,
      "duplicate":                boolean,
      "packets_transmitted":      integer,
      "packets_received":         integer,
      "packet_loss_percent":      float,
      "round_trip_ms_min":        float,
      "round_trip_ms_avg":        float,
      "round_trip_ms_max":        float,
      "round_trip_ms_stddev":     float,
      "_jc_meta": {
        "success":                boolean,
        "error":                  string,
        "line":                   string
      }
    }
"#;

const COMPATIBLE: &[Platform] = &[Platform::Linux, Platform::Darwin, Platform::Freebsd];

const INTS: &[&str] = &[
    "data_bytes",
    "sent_bytes",
    "response_bytes",
    "icmp_seq",
    "ttl",
    "packets_transmitted",
    "packets_received",
    "duplicates",
    "errors",
];

const FLOATS: &[&str] = &[
    "timestamp",
    "time_ms",
    "packet_loss_percent",
    "round_trip_ms_min",
    "round_trip_ms_avg",
    "round_trip_ms_max",
    "round_trip_ms_stddev",
];

macro_rules! regex {
    ($re:expr) => {
        LazyLock::new(|| Regex::new($re).expect("static regex must compile"))
    };
}

static HEADER: LazyLock<Regex> = regex!(
    r"^PING\s+(?P<dest>[^\s(]+)\s*\((?P<ip>[^)]+)\)(?::)?\s+(?P<bytes>\d+)(?:\((?P<total>\d+)\))?\s+(?:bytes of data|data bytes)"
);
static HEADER6: LazyLock<Regex> =
    regex!(r"^PING6\(\d+=\d+\+\d+\+(?P<bytes>\d+) bytes\) \S+ --> (?P<dest>\S+)");
static REPLY: LazyLock<Regex> = regex!(
    r"^(?:\[(?P<ts>[\d.]+)\]\s*)?(?P<bytes>\d+) bytes from (?P<name>\S+?)(?: \((?P<ip>[^)]+)\))?[:,] icmp_seq=(?P<seq>\d+) (?:ttl|hlim)=(?P<ttl>\d+) time=(?P<time>[\d.]+) ms(?P<dup> \(DUP!\))?"
);
static TIMEOUT: LazyLock<Regex> = regex!(
    r"^(?:\[(?P<ts>[\d.]+)\]\s*)?(?:no answer yet for icmp_seq=|Request timeout for icmp_seq )(?P<seq>\d+)"
);
static UNREACHABLE: LazyLock<Regex> = regex!(
    r"^(?:\[(?P<ts>[\d.]+)\]\s*)?From (?P<name>\S+)(?: \((?P<ip>[^)]+)\))? icmp_seq=(?P<seq>\d+) (?P<msg>.+)$"
);
static BSD_UNREACHABLE: LazyLock<Regex> =
    regex!(r"^\d+ bytes from (?P<ip>[^:\s]+): (?P<msg>[A-Za-z].*)$");
static STATS: LazyLock<Regex> = regex!(
    r"^(?P<tx>\d+) packets transmitted, (?P<rx>\d+)(?: packets)? received,(?: \+(?P<dup>\d+) duplicates,)?(?: \+(?P<err>\d+) errors,)? (?P<loss>[\d.]+)% packet loss(?:, time (?P<time>\d+)\s*ms)?"
);
static RTT: LazyLock<Regex> = regex!(
    r"^(?:rtt|round-trip) min/avg/max/(?:mdev|stddev) = (?P<min>[\d.]+)/(?P<avg>[\d.]+)/(?P<max>[\d.]+)/(?P<dev>[\d.]+) ms"
);

fn group<'t>(caps: &Captures<'t>, name: &str) -> Option<&'t str> {
    caps.name(name).map(|m| m.as_str())
}

/// Line classifier shared by both parsers. Header and footer lines update
/// the state; response lines come back as raw (string-valued) maps.
#[derive(Debug, Clone)]
struct Ping {
    header: Map,
    stats: Option<Map>,
}

impl Ping {
    fn new() -> Self {
        Self {
            header: record! {
                "destination_ip" => ParseValue::Null,
                "data_bytes" => ParseValue::Null,
                "pattern" => ParseValue::Null,
                "destination" => ParseValue::Null,
            },
            stats: None,
        }
    }

    fn empty_stats() -> Map {
        [
            "packets_transmitted",
            "packets_received",
            "packet_loss_percent",
            "duplicates",
            "errors",
            "time_ms",
            "round_trip_ms_min",
            "round_trip_ms_avg",
            "round_trip_ms_max",
            "round_trip_ms_stddev",
        ]
        .into_iter()
        .map(|k| (k, ParseValue::Null))
        .collect()
    }

    fn feed(&mut self, line: &str) -> Result<Option<Map>, JcError> {
        let trimmed = line.trim_end();
        if trimmed.trim().is_empty()
            || trimmed.starts_with(char::is_whitespace)
            || trimmed.starts_with("---")
            || trimmed.starts_with("Vr HL TOS")
            || trimmed.starts_with("WARNING:")
        {
            return Ok(None);
        }

        if let Some(pattern) = trimmed.strip_prefix("PATTERN:") {
            self.header.insert("pattern", pattern.trim());
            return Ok(None);
        }
        if let Some(c) = HEADER.captures(trimmed) {
            self.header.insert("destination_ip", &c["ip"]);
            self.header.insert("data_bytes", &c["bytes"]);
            self.header.insert("destination", &c["dest"]);
            return Ok(None);
        }
        if let Some(c) = HEADER6.captures(trimmed) {
            self.header.insert("destination_ip", &c["dest"]);
            self.header.insert("data_bytes", &c["bytes"]);
            self.header.insert("destination", &c["dest"]);
            return Ok(None);
        }

        if let Some(c) = REPLY.captures(trimmed) {
            return Ok(Some(record! {
                "type" => "reply",
                "timestamp" => group(&c, "ts"),
                "response_bytes" => &c["bytes"],
                "response_ip" => group(&c, "ip").or_else(|| group(&c, "name")),
                "icmp_seq" => &c["seq"],
                "ttl" => &c["ttl"],
                "time_ms" => &c["time"],
                "duplicate" => c.name("dup").is_some(),
            }));
        }
        if let Some(c) = TIMEOUT.captures(trimmed) {
            return Ok(Some(record! {
                "type" => "timeout",
                "timestamp" => group(&c, "ts"),
                "icmp_seq" => &c["seq"],
            }));
        }
        if let Some(c) = UNREACHABLE.captures(trimmed) {
            return Ok(Some(record! {
                "type" => "unreachable",
                "timestamp" => group(&c, "ts"),
                "response_ip" => group(&c, "ip").or_else(|| group(&c, "name")),
                "icmp_seq" => &c["seq"],
                "error_message" => c["msg"].trim(),
            }));
        }
        if let Some(c) = BSD_UNREACHABLE.captures(trimmed) {
            return Ok(Some(record! {
                "type" => "unreachable",
                "timestamp" => ParseValue::Null,
                "response_ip" => &c["ip"],
                "icmp_seq" => ParseValue::Null,
                "error_message" => c["msg"].trim(),
            }));
        }

        if let Some(c) = STATS.captures(trimmed) {
            let mut stats = Self::empty_stats();
            stats.insert("packets_transmitted", &c["tx"]);
            stats.insert("packets_received", &c["rx"]);
            stats.insert("packet_loss_percent", &c["loss"]);
            stats.insert("duplicates", group(&c, "dup").unwrap_or("0"));
            stats.insert("errors", group(&c, "err"));
            stats.insert("time_ms", group(&c, "time"));
            self.stats = Some(stats);
            return Ok(None);
        }
        if let Some(c) = RTT.captures(trimmed) {
            let stats = self.stats.get_or_insert_with(Self::empty_stats);
            stats.insert("round_trip_ms_min", &c["min"]);
            stats.insert("round_trip_ms_avg", &c["avg"]);
            stats.insert("round_trip_ms_max", &c["max"]);
            stats.insert("round_trip_ms_stddev", &c["dev"]);
            return Ok(None);
        }

        Err(JcError::parse(format!("Could not parse ping line: {trimmed}")))
    }
}

fn process(map: &mut Map) {
    int_fields(map, INTS);
    float_fields(map, FLOATS);
}

pub struct PingParser;

impl Parser for PingParser {
    fn info(&self) -> ParserInfo {
        ParserInfo::new("ping", "`ping` and `ping6` command parser")
            .version("1.10")
            .compatible(COMPATIBLE)
            .tags(&[Tag::Command])
            .magic("ping")
            .magic("ping6")
            .docs(DOCS)
    }

    fn parse(&self, data: ParserData, ctx: &ParseContext<'_>) -> Result<ParseValue, JcError> {
        let text = data.text();
        if !has_data(&text) {
            return Ok(Map::new().into());
        }

        let mut ping = Ping::new();
        let mut responses = Vec::new();
        for line in text.lines() {
            if let Some(response) = ping.feed(line)? {
                responses.push(response);
            }
        }

        let mut out = ping.header;
        for (k, v) in ping.stats.unwrap_or_else(Ping::empty_stats).iter() {
            out.insert(k.as_str(), v.clone());
        }
        if !ctx.raw() {
            process(&mut out);
            responses.iter_mut().for_each(process);
        }
        out.insert("responses", responses);
        Ok(out.into())
    }
}

pub struct PingStreamParser;

impl StreamingParser for PingStreamParser {
    fn info(&self) -> ParserInfo {
        ParserInfo::new("ping_s", "`ping` and `ping6` command streaming parser")
            .version("1.6")
            .compatible(COMPATIBLE)
            .tags(&[Tag::Command])
            .docs(STREAM_DOCS)
    }

    fn parse_lines<'a>(
        &self,
        lines: LineIter<'a>,
        ctx: &ParseContext<'_>,
    ) -> Result<RecordIter<'a>, JcError> {
        let state = StreamState {
            ping: Ping::new(),
            raw: ctx.raw(),
        };
        Ok(Box::new(LineDriver::new(lines, state, stream_step, stream_finish)))
    }
}

struct StreamState {
    ping: Ping,
    raw: bool,
}

impl StreamState {
    /// `type`, then the destination fields, then the rest of `fields`.
    fn record(&self, kind: ParseValue, fields: &Map) -> Map {
        let header = &self.ping.header;
        let mut record = record! {
            "type" => kind,
            "destination_ip" => header.get("destination_ip").cloned(),
            "sent_bytes" => header.get("data_bytes").cloned(),
            "pattern" => header.get("pattern").cloned(),
        };
        for (k, v) in fields.iter().filter(|(k, _)| k.as_str() != "type") {
            record.insert(k.as_str(), v.clone());
        }
        if !self.raw {
            process(&mut record);
        }
        record
    }
}

fn stream_step(state: &mut StreamState, line: &str) -> Result<Option<Map>, JcError> {
    let Some(response) = state.ping.feed(line)? else {
        return Ok(None);
    };
    let kind = response.get("type").cloned().unwrap_or_default();
    Ok(Some(state.record(kind, &response)))
}

fn stream_finish(state: &mut StreamState) -> Option<Map> {
    let mut stats = state.ping.stats.take()?;
    stats.remove("errors");
    stats.remove("time_ms");
    Some(state.record("summary".into(), &stats))
}
