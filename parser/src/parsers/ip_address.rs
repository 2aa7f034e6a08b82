//! `ip_address` parser: network facts for an IPv4 or IPv6 address.
//!
//! Accepts dotted / colon notation, a bare integer, an optional `%scope`
//! (IPv6) and an optional `/prefix` or dotted `/netmask`.

use crate::base_parser::{ParseContext, Parser};
use crate::descriptor::{ParserInfo, Tag};
use crate::types::{JcError, ParserData};
use crate::utils::has_data;
use crate::value::{colon_hex, Map, ParseValue};
use crate::record;
use std::net::{Ipv4Addr, Ipv6Addr};

const DOCS: &str = r#"
Usage (cli):

    $ echo 192.168.2.10/24 | jc --ip-address

Usage (module):

    jc::parse("ip_address", "192.168.2.10/24".into(), Default::default())

Schema:

    {
      "version":              integer,
      "max_prefix_length":    integer,
      "ip":                   string,
      "ip_compressed":        string,
      "ip_exploded":          string,
      "ip_split":             [string],
      "scope_id":             string/null,
      "ipv4_mapped":          string/null,
      "six_to_four":          string/null,
      "teredo_client":        string/null,
      "teredo_server":        string/null,
      "dns_ptr":              string,
      "network":              string,
      "broadcast":            string,
      "hostmask":             string,
      "netmask":              string,
      "cidr_netmask":         integer,
      "hosts":                integer,
      "first_host":           string,
      "last_host":            string,
      "is_multicast":         boolean,
      "is_private":           boolean,
      "is_global":            boolean,
      "is_link_local":        boolean,
      "is_loopback":          boolean,
      "is_reserved":          boolean,
      "is_unspecified":       boolean,
      "int":                  {"ip": integer, "network": integer, ...},
      "hex":                  {"ip": string, "network": string, ...},
      "bin":                  {"ip": string, "network": string, ...}
    }
"#;

pub struct IpAddressParser;

impl Parser for IpAddressParser {
    fn info(&self) -> ParserInfo {
        ParserInfo::new("ip_address", "IPv4 and IPv6 Address string parser")
            .version("1.4")
            .tags(&[Tag::Standard, Tag::String, Tag::Slurpable])
            .docs(DOCS)
    }

    /// There is nothing to coerce after parsing: integers are computed, not
    /// scraped, so raw and processed output are identical.
    fn parse(&self, data: ParserData, _ctx: &ParseContext<'_>) -> Result<ParseValue, JcError> {
        let text = data.text();
        if !has_data(&text) {
            return Ok(Map::new().into());
        }
        let iface = Interface::parse(text.trim())?;
        Ok(iface.describe().into())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Interface {
    addr: u128,
    /// 32 or 128.
    bits: u32,
    prefix: u32,
    scope_id: Option<String>,
}

fn invalid(input: &str) -> JcError {
    JcError::parse(format!("'{input}' does not appear to be an IPv4 or IPv6 interface"))
}

impl Interface {
    fn parse(input: &str) -> Result<Self, JcError> {
        let (addr_part, prefix_part) = match input.split_once('/') {
            Some((a, p)) => (a, Some(p)),
            None => (input, None),
        };
        let (addr_part, scope_id) = match addr_part.split_once('%') {
            Some((a, s)) if !s.is_empty() => (a, Some(s.to_string())),
            Some(_) => return Err(invalid(input)),
            None => (addr_part, None),
        };

        let (addr, bits) = if !addr_part.is_empty() && addr_part.bytes().all(|b| b.is_ascii_digit()) {
            let n: u128 = addr_part.parse().map_err(|_| invalid(input))?;
            if n <= u128::from(u32::MAX) {
                (n, 32)
            } else {
                (n, 128)
            }
        } else if let Ok(v4) = addr_part.parse::<Ipv4Addr>() {
            (u128::from(u32::from(v4)), 32)
        } else if let Ok(v6) = addr_part.parse::<Ipv6Addr>() {
            (u128::from(v6), 128)
        } else {
            return Err(invalid(input));
        };

        if bits == 32 && scope_id.is_some() {
            return Err(invalid(input));
        }

        let prefix = match prefix_part {
            None => bits,
            Some(p) if !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) => {
                let prefix: u32 = p.parse().map_err(|_| invalid(input))?;
                if prefix > bits {
                    return Err(invalid(input));
                }
                prefix
            }
            Some(p) if bits == 32 => {
                let mask = u32::from(p.parse::<Ipv4Addr>().map_err(|_| invalid(input))?);
                let prefix = mask.leading_ones();
                if mask.checked_shl(prefix).unwrap_or(0) != 0 {
                    return Err(invalid(input));
                }
                prefix
            }
            Some(_) => return Err(invalid(input)),
        };

        Ok(Self {
            addr,
            bits,
            prefix,
            scope_id,
        })
    }

    fn hostmask(&self) -> u128 {
        low_bits(self.bits - self.prefix)
    }

    fn netmask(&self) -> u128 {
        low_bits(self.bits) ^ self.hostmask()
    }

    fn network(&self) -> u128 {
        self.addr & self.netmask()
    }

    fn broadcast(&self) -> u128 {
        self.network() | self.hostmask()
    }

    /// (host count, first host, last host)
    fn host_range(&self) -> (u128, u128, u128) {
        match self.bits - self.prefix {
            0 => (1, self.addr, self.addr),
            1 => (2, self.network(), self.broadcast()),
            _ => (self.hostmask() - 1, self.network() + 1, self.broadcast() - 1),
        }
    }

    fn is_v4(&self) -> bool {
        self.bits == 32
    }

    fn within(&self, base: u128, prefix: u32) -> bool {
        let host_bits = self.bits - prefix;
        host_bits >= 128 || (self.addr >> host_bits) == (base >> host_bits)
    }

    fn any_within(&self, nets: &[(u128, u32)]) -> bool {
        nets.iter().any(|&(base, prefix)| self.within(base, prefix))
    }

    fn is_private(&self) -> bool {
        if self.is_v4() {
            self.any_within(V4_PRIVATE)
        } else {
            self.any_within(V6_PRIVATE)
        }
    }

    fn is_global(&self) -> bool {
        if self.is_v4() {
            !self.within(v4(100, 64, 0, 0), 10) && !self.is_private()
        } else {
            !self.is_private()
        }
    }

    fn is_multicast(&self) -> bool {
        if self.is_v4() {
            self.within(v4(224, 0, 0, 0), 4)
        } else {
            self.within(v6(0xff00, 0), 8)
        }
    }

    fn is_link_local(&self) -> bool {
        if self.is_v4() {
            self.within(v4(169, 254, 0, 0), 16)
        } else {
            self.within(v6(0xfe80, 0), 10)
        }
    }

    fn is_loopback(&self) -> bool {
        if self.is_v4() {
            self.within(v4(127, 0, 0, 0), 8)
        } else {
            self.addr == 1
        }
    }

    fn is_reserved(&self) -> bool {
        if self.is_v4() {
            self.within(v4(240, 0, 0, 0), 4)
        } else {
            self.any_within(V6_RESERVED)
        }
    }

    fn format(&self, value: u128) -> String {
        if self.is_v4() {
            Ipv4Addr::from(value as u32).to_string()
        } else {
            Ipv6Addr::from(value).to_string()
        }
    }

    fn exploded(&self) -> String {
        if self.is_v4() {
            self.format(self.addr)
        } else {
            Ipv6Addr::from(self.addr)
                .segments()
                .iter()
                .map(|s| format!("{s:04x}"))
                .collect::<Vec<_>>()
                .join(":")
        }
    }

    fn bytes(&self, value: u128) -> Vec<u8> {
        if self.is_v4() {
            (value as u32).to_be_bytes().to_vec()
        } else {
            value.to_be_bytes().to_vec()
        }
    }

    fn binary(&self, value: u128) -> String {
        if self.is_v4() {
            format!("{:032b}", value as u32)
        } else {
            format!("{value:0128b}")
        }
    }

    fn dns_ptr(&self) -> String {
        if self.is_v4() {
            let mut octets = self.bytes(self.addr);
            octets.reverse();
            let parts: Vec<String> = octets.iter().map(u8::to_string).collect();
            format!("{}.in-addr.arpa", parts.join("."))
        } else {
            let nibbles: Vec<String> = format!("{:032x}", self.addr)
                .chars()
                .rev()
                .map(String::from)
                .collect();
            format!("{}.ip6.arpa", nibbles.join("."))
        }
    }

    fn ipv4_mapped(&self) -> Option<String> {
        (!self.is_v4() && self.addr >> 32 == 0xffff)
            .then(|| Ipv4Addr::from(self.addr as u32).to_string())
    }

    fn six_to_four(&self) -> Option<String> {
        (!self.is_v4() && self.addr >> 112 == 0x2002)
            .then(|| Ipv4Addr::from((self.addr >> 80) as u32).to_string())
    }

    /// (client, server)
    fn teredo(&self) -> Option<(String, String)> {
        (!self.is_v4() && self.addr >> 96 == 0x2001_0000).then(|| {
            let server = Ipv4Addr::from((self.addr >> 64) as u32);
            let client = Ipv4Addr::from(!(self.addr as u32));
            (client.to_string(), server.to_string())
        })
    }

    fn describe(&self) -> Map {
        let (hosts, first, last) = self.host_range();
        let network = self.network();
        let broadcast = self.broadcast();
        let teredo = self.teredo();
        let exploded = self.exploded();
        let split: Vec<&str> = if self.is_v4() {
            exploded.split('.').collect()
        } else {
            exploded.split(':').collect()
        };

        let points = [
            ("ip", self.addr),
            ("network", network),
            ("broadcast", broadcast),
            ("first_host", first),
            ("last_host", last),
        ];
        let ints: Map = points
            .iter()
            .map(|&(k, v)| (k, ParseValue::from_u128(v)))
            .collect();
        let hexes: Map = points
            .iter()
            .map(|&(k, v)| (k, colon_hex(&self.bytes(v))))
            .collect();
        let bins: Map = points.iter().map(|&(k, v)| (k, self.binary(v))).collect();

        record! {
            "version" => if self.is_v4() { 4i64 } else { 6i64 },
            "max_prefix_length" => self.bits,
            "ip" => self.format(self.addr),
            "ip_compressed" => self.format(self.addr),
            "ip_exploded" => exploded.as_str(),
            "ip_split" => split,
            "scope_id" => self.scope_id.clone(),
            "ipv4_mapped" => self.ipv4_mapped(),
            "six_to_four" => self.six_to_four(),
            "teredo_client" => teredo.as_ref().map(|t| t.0.clone()),
            "teredo_server" => teredo.as_ref().map(|t| t.1.clone()),
            "dns_ptr" => self.dns_ptr(),
            "network" => self.format(network),
            "broadcast" => self.format(broadcast),
            "hostmask" => self.format(self.hostmask()),
            "netmask" => self.format(self.netmask()),
            "cidr_netmask" => self.prefix,
            "hosts" => ParseValue::from_u128(hosts),
            "first_host" => self.format(first),
            "last_host" => self.format(last),
            "is_multicast" => self.is_multicast(),
            "is_private" => self.is_private(),
            "is_global" => self.is_global(),
            "is_link_local" => self.is_link_local(),
            "is_loopback" => self.is_loopback(),
            "is_reserved" => self.is_reserved(),
            "is_unspecified" => self.addr == 0,
            "int" => ints,
            "hex" => hexes,
            "bin" => bins,
        }
    }
}

fn low_bits(n: u32) -> u128 {
    if n >= 128 {
        u128::MAX
    } else {
        (1u128 << n) - 1
    }
}

const fn v4(a: u8, b: u8, c: u8, d: u8) -> u128 {
    ((a as u128) << 24) | ((b as u128) << 16) | ((c as u128) << 8) | d as u128
}

/// First two segments of an IPv6 address, the rest zero.
const fn v6(a: u16, b: u16) -> u128 {
    ((a as u128) << 112) | ((b as u128) << 96)
}

const V4_PRIVATE: &[(u128, u32)] = &[
    (v4(0, 0, 0, 0), 8),
    (v4(10, 0, 0, 0), 8),
    (v4(127, 0, 0, 0), 8),
    (v4(169, 254, 0, 0), 16),
    (v4(172, 16, 0, 0), 12),
    (v4(192, 0, 0, 0), 29),
    (v4(192, 0, 0, 170), 31),
    (v4(192, 0, 2, 0), 24),
    (v4(192, 168, 0, 0), 16),
    (v4(198, 18, 0, 0), 15),
    (v4(198, 51, 100, 0), 24),
    (v4(203, 0, 113, 0), 24),
    (v4(240, 0, 0, 0), 4),
    (v4(255, 255, 255, 255), 32),
];

const V6_PRIVATE: &[(u128, u32)] = &[
    (1, 128),
    (0, 128),
    (0xffff_0000_0000, 96),
    (v6(0x0100, 0), 64),
    (v6(0x2001, 0), 23),
    (v6(0x2001, 0x0002), 48),
    (v6(0x2001, 0x0db8), 32),
    (v6(0x2001, 0x0010), 28),
    (v6(0xfc00, 0), 7),
    (v6(0xfe80, 0), 10),
];

const V6_RESERVED: &[(u128, u32)] = &[
    (v6(0x0000, 0), 8),
    (v6(0x0100, 0), 8),
    (v6(0x0200, 0), 7),
    (v6(0x0400, 0), 6),
    (v6(0x0800, 0), 5),
    (v6(0x1000, 0), 4),
    (v6(0x4000, 0), 3),
    (v6(0x6000, 0), 3),
    (v6(0x8000, 0), 3),
    (v6(0xa000, 0), 3),
    (v6(0xc000, 0), 3),
    (v6(0xe000, 0), 4),
    (v6(0xf000, 0), 5),
    (v6(0xf800, 0), 6),
    (v6(0xfe00, 0), 9),
];
