//! `ip route` command output parser.
//!
//! Each route line is `[type] destination` followed by keyword/value pairs
//! and bare flags. Indented `nexthop` lines belong to the route above them.

use crate::base_parser::{ParseContext, Parser};
use crate::descriptor::{ParserInfo, Platform, Tag};
use crate::types::{JcError, ParserData};
use crate::utils::{data_lines, int_fields};
use crate::value::{Map, ParseValue};

const DOCS: &str = r#"
Typed routes (`blackhole`, `unreachable`, `prohibit`, ...) carry their type
in `type`. Bare flags such as `linkdown` or `onlink` are collected in
`flags`; multipath routes list their `nexthops`.

Usage (cli):

    $ ip route | jc --ip-route

    or

    $ jc ip route

Schema:

    [
      {
        "type":       string,
        "ip":         string,
        "via":        string,
        "dev":        string,
        "proto":      string,
        "scope":      string,
        "src":        string,
        "metric":     integer,
        "flags": [
                      string
        ],
        "nexthops": [
          {
            "via":    string,
            "dev":    string,
            "weight": integer
          }
        ]
      }
    ]
"#;

const ROUTE_TYPES: &[&str] = &[
    "unicast",
    "local",
    "broadcast",
    "multicast",
    "throw",
    "unreachable",
    "prohibit",
    "blackhole",
    "nat",
    "anycast",
];

const FLAGS: &[&str] = &[
    "onlink",
    "linkdown",
    "dead",
    "pervasive",
    "offload",
    "trap",
    "notify",
    "rt_offload",
    "rt_trap",
];

const INTS: &[&str] = &["metric", "mtu", "weight", "expires"];

pub struct IpRouteParser;

impl Parser for IpRouteParser {
    fn info(&self) -> ParserInfo {
        ParserInfo::new("ip_route", "`ip route` command parser")
            .version("1.1")
            .compatible(&[Platform::Linux])
            .tags(&[Tag::Command])
            .magic("ip route")
            .docs(DOCS)
    }

    fn parse(&self, data: ParserData, ctx: &ParseContext<'_>) -> Result<ParseValue, JcError> {
        let text = data.text();
        let mut routes = parse_raw(&text)?;
        if !ctx.raw() {
            for route in &mut routes {
                process(route);
            }
        }
        Ok(routes.into())
    }
}

/// Keyword/value pairs and bare flags from a token list.
fn attributes<'t>(mut tokens: impl Iterator<Item = &'t str>, map: &mut Map) {
    let mut flags = Vec::new();
    while let Some(token) = tokens.next() {
        if FLAGS.contains(&token) {
            flags.push(ParseValue::from(token));
            continue;
        }
        match tokens.next() {
            Some(value) => {
                map.insert(token, value);
            }
            None => flags.push(ParseValue::from(token)),
        }
    }
    if !flags.is_empty() {
        map.insert("flags", flags);
    }
}

fn parse_raw(text: &str) -> Result<Vec<Map>, JcError> {
    let mut routes: Vec<Map> = Vec::new();
    let mut nexthops: Vec<ParseValue> = Vec::new();

    for line in data_lines(text) {
        let mut tokens = line.split_whitespace();
        let first = tokens.next().unwrap_or_default();

        if line.starts_with(char::is_whitespace) && first == "nexthop" {
            if routes.is_empty() {
                return Err(JcError::parse(format!("nexthop without a route: {}", line.trim())));
            }
            let mut hop = Map::new();
            attributes(tokens, &mut hop);
            nexthops.push(hop.into());
            continue;
        }

        if let Some(route) = routes.last_mut() {
            if !nexthops.is_empty() {
                route.insert("nexthops", std::mem::take(&mut nexthops));
            }
        }

        let mut route = Map::new();
        if ROUTE_TYPES.contains(&first) {
            route.insert("type", first);
            let ip = tokens
                .next()
                .ok_or_else(|| JcError::parse(format!("{first} route without a destination")))?;
            route.insert("ip", ip);
        } else {
            route.insert("ip", first);
        }
        attributes(tokens, &mut route);
        routes.push(route);
    }

    if let Some(route) = routes.last_mut() {
        if !nexthops.is_empty() {
            route.insert("nexthops", nexthops);
        }
    }
    Ok(routes)
}

fn process(route: &mut Map) {
    int_fields(route, INTS);
    if let Some(ParseValue::List(hops)) = route.get_mut("nexthops") {
        for hop in hops {
            if let Some(hop) = hop.as_map_mut() {
                int_fields(hop, INTS);
            }
        }
    }
}
