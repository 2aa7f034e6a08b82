//! `/proc/net/*` files.

use super::{flag, header_table, list, scalar, to_values};
use crate::record;
use crate::types::JcError;
use crate::utils::{data_lines, int_fields};
use crate::value::{Map, ParseValue};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Rows after `skip` header lines, split on whitespace and zipped with `keys`.
/// The last key absorbs any remaining tokens.
fn fixed_columns(text: &str, skip: usize, keys: &[&str]) -> Vec<Map> {
    data_lines(text)
        .into_iter()
        .skip(skip)
        .map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let mut row = Map::with_capacity(keys.len());
            for (i, key) in keys.iter().enumerate() {
                let value = if i + 1 == keys.len() && tokens.len() > keys.len() {
                    ParseValue::from(tokens[i..].join(" "))
                } else {
                    tokens.get(i).copied().into()
                };
                row.insert(*key, value);
            }
            row
        })
        .collect()
}

fn with_ints(mut rows: Vec<Map>, raw: bool, keys: &[&str]) -> ParseValue {
    if !raw {
        for row in &mut rows {
            int_fields(row, keys);
        }
    }
    to_values(rows)
}

proc_file!(
    ArpParser,
    "proc_net_arp",
    "/proc/net/arp",
    list(),
    r#"
    [
      {
        "ip_address":       string,
        "hw_type":          string,
        "flags":            string,
        "hw_address":       string,
        "mask":             string,
        "device":           string
      }
    ]
"#,
    arp
);

fn arp(text: &str, _raw: bool) -> Result<ParseValue, JcError> {
    let keys = ["ip_address", "hw_type", "flags", "hw_address", "mask", "device"];
    Ok(to_values(fixed_columns(text, 1, &keys)))
}

proc_file!(
    DevParser,
    "proc_net_dev",
    "/proc/net/dev",
    list(),
    r#"
    [
      {
        "interface":        string,
        "r_bytes":          integer,
        "r_packets":        integer,
        "r_errs":           integer,
        "r_drop":           integer,
        "r_fifo":           integer,
        "r_frame":          integer,
        "r_compressed":     integer,
        "r_multicast":      integer,
        "t_bytes":          integer,
        "t_packets":        integer,
        "t_errs":           integer,
        "t_drop":           integer,
        "t_fifo":           integer,
        "t_colls":          integer,
        "t_carrier":        integer,
        "t_compressed":     integer
      }
    ]
"#,
    dev
);

const DEV_FIELDS: &[&str] = &[
    "r_bytes",
    "r_packets",
    "r_errs",
    "r_drop",
    "r_fifo",
    "r_frame",
    "r_compressed",
    "r_multicast",
    "t_bytes",
    "t_packets",
    "t_errs",
    "t_drop",
    "t_fifo",
    "t_colls",
    "t_carrier",
    "t_compressed",
];

fn dev(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows = Vec::new();
    for line in data_lines(text).into_iter().skip(2) {
        let (interface, counters) = line
            .split_once(':')
            .ok_or_else(|| JcError::parse(format!("Unexpected interface line: {line}")))?;
        let mut row = record! { "interface" => interface.trim() };
        for (key, value) in DEV_FIELDS.iter().zip(counters.split_whitespace()) {
            row.insert(*key, scalar(value, raw));
        }
        rows.push(row);
    }
    Ok(to_values(rows))
}

proc_file!(
    IfInet6Parser,
    "proc_net_if_inet6",
    "/proc/net/if_inet6",
    list(),
    r#"
    [
      {
        "address":          string,
        "index":            string,
        "prefix":           string,
        "scope":            string,
        "flags":            string,
        "name":             string
      }
    ]
"#,
    if_inet6
);

fn if_inet6(text: &str, _raw: bool) -> Result<ParseValue, JcError> {
    let keys = ["address", "index", "prefix", "scope", "flags", "name"];
    Ok(to_values(fixed_columns(text, 0, &keys)))
}

proc_file!(
    IgmpParser,
    "proc_net_igmp",
    "/proc/net/igmp",
    list(),
    r#"
    [
      {
        "index":            integer,
        "device":           string,
        "count":            integer,
        "querier":          string,
        "groups": [
          {
            "address":      string,
            "users":        integer,
            "timer":        string,
            "reporter":     integer
          }
        ]
      }
    ]
"#,
    igmp
);

fn igmp(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows: Vec<Map> = Vec::new();
    for line in data_lines(text).into_iter().skip(1) {
        let tokens: Vec<&str> = line.split_whitespace().filter(|t| *t != ":").collect();
        if line.starts_with(char::is_whitespace) {
            let device = rows
                .last_mut()
                .ok_or_else(|| JcError::parse(format!("Group without a device: {}", line.trim())))?;
            let [address, users, timer, reporter] = tokens[..] else {
                return Err(JcError::parse(format!("Unexpected group line: {}", line.trim())));
            };
            let group = record! {
                "address" => address,
                "users" => scalar(users, raw),
                "timer" => timer,
                "reporter" => scalar(reporter, raw),
            };
            if let Some(ParseValue::List(groups)) = device.get_mut("groups") {
                groups.push(group.into());
            }
            continue;
        }
        let [index, device, count, querier] = tokens[..] else {
            return Err(JcError::parse(format!("Unexpected device line: {line}")));
        };
        rows.push(record! {
            "index" => scalar(index, raw),
            "device" => device,
            "count" => scalar(count, raw),
            "querier" => querier,
            "groups" => list(),
        });
    }
    Ok(to_values(rows))
}

proc_file!(
    Igmp6Parser,
    "proc_net_igmp6",
    "/proc/net/igmp6",
    list(),
    r#"
    [
      {
        "index":            integer,
        "name":             string,
        "address":          string,
        "users":            integer,
        "group":            string,
        "reporters":        integer
      }
    ]
"#,
    igmp6
);

fn igmp6(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let keys = ["index", "name", "address", "users", "group", "reporters"];
    Ok(with_ints(fixed_columns(text, 0, &keys), raw, &["index", "users", "reporters"]))
}

proc_file!(
    Ipv6RouteParser,
    "proc_net_ipv6_route",
    "/proc/net/ipv6_route",
    list(),
    r#"
    [
      {
        "dest_net":         string,
        "dest_prefix":      string,
        "source_net":       string,
        "source_prefix":    string,
        "next_hop":         string,
        "metric":           string,
        "ref_count":        string,
        "use_count":        string,
        "flags":            string,
        "device":           string
      }
    ]
"#,
    ipv6_route
);

fn ipv6_route(text: &str, _raw: bool) -> Result<ParseValue, JcError> {
    let keys = [
        "dest_net",
        "dest_prefix",
        "source_net",
        "source_prefix",
        "next_hop",
        "metric",
        "ref_count",
        "use_count",
        "flags",
        "device",
    ];
    Ok(to_values(fixed_columns(text, 0, &keys)))
}

proc_file!(
    NetlinkParser,
    "proc_net_netlink",
    "/proc/net/netlink",
    list(),
    r#"
    [
      {
        "sk":               string,
        "eth":              integer,
        "pid":              integer,
        "groups":           string,
        "rmem":             integer,
        "wmem":             integer,
        "dump":             integer,
        "locks":            integer,
        "drops":            integer,
        "inode":            integer
      }
    ]
"#,
    netlink
);

fn netlink(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let ints = ["eth", "pid", "rmem", "wmem", "dump", "locks", "drops", "inode"];
    Ok(with_ints(header_table(text), raw, &ints))
}

proc_file!(
    NetstatParser,
    "proc_net_netstat",
    "/proc/net/netstat",
    list(),
    r#"
    [
      {
        "protocol":         string,
        "<counter>":        integer
      }
    ]
"#,
    netstat
);

fn netstat(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let lines = data_lines(text);
    let mut rows = Vec::new();
    for pair in lines.chunks(2) {
        let [names, values] = pair else {
            return Err(JcError::parse("Counter names without values"));
        };
        let (protocol, names) = names
            .split_once(':')
            .ok_or_else(|| JcError::parse(format!("Unexpected counter line: {names}")))?;
        let values = values.split_once(':').map_or("", |(_, v)| v);
        let mut row = record! { "protocol" => protocol };
        for (name, value) in names.split_whitespace().zip(values.split_whitespace()) {
            row.insert(name, scalar(value, raw));
        }
        rows.push(row);
    }
    Ok(to_values(rows))
}

proc_file!(
    PacketParser,
    "proc_net_packet",
    "/proc/net/packet",
    list(),
    r#"
    [
      {
        "sk":               string,
        "refcnt":           integer,
        "type":             integer,
        "proto":            string,
        "iface":            integer,
        "r":                integer,
        "rmem":             integer,
        "user":             integer,
        "inode":            integer
      }
    ]
"#,
    packet
);

fn packet(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let ints = ["refcnt", "type", "iface", "r", "rmem", "user", "inode"];
    Ok(with_ints(header_table(text), raw, &ints))
}

proc_file!(
    ProtocolsParser,
    "proc_net_protocols",
    "/proc/net/protocols",
    list(),
    r#"
    [
      {
        "protocol":         string,
        "size":             integer,
        "sockets":          integer,
        "memory":           integer,
        "press":            string,
        "maxhdr":           integer,
        "slab":             boolean,
        "module":           string,
        "cl":               boolean,
        "co":               boolean,
        "<method>":         boolean
      }
    ]
"#,
    protocols
);

fn protocols(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows = header_table(text);
    if !raw {
        for row in &mut rows {
            int_fields(row, &["size", "sockets", "memory", "maxhdr"]);
            for (_, v) in row.iter_mut() {
                if let Some(s @ ("y" | "n" | "yes" | "no")) = v.as_str() {
                    *v = flag(s, false);
                }
            }
        }
    }
    Ok(to_values(rows))
}

proc_file!(
    RouteParser,
    "proc_net_route",
    "/proc/net/route",
    list(),
    r#"
    [
      {
        "iface":            string,
        "destination":      string,
        "gateway":          string,
        "flags":            string,
        "refcnt":           integer,
        "use":              integer,
        "metric":           integer,
        "mask":             string,
        "mtu":              integer,
        "window":           integer,
        "irtt":             integer
      }
    ]
"#,
    route
);

fn route(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let ints = ["refcnt", "use", "metric", "mtu", "window", "irtt"];
    Ok(with_ints(header_table(text), raw, &ints))
}

proc_file!(
    UnixParser,
    "proc_net_unix",
    "/proc/net/unix",
    list(),
    r#"
    [
      {
        "num":              string,
        "refcount":         string,
        "protocol":         string,
        "flags":            string,
        "type":             string,
        "st":               string,
        "inode":            integer,
        "path":             string
      }
    ]
"#,
    unix
);

fn unix(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows = header_table(text);
    for row in &mut rows {
        row.update("num", |v| v.as_str().map_or_else(|| v.clone(), |s| s.trim_end_matches(':').into()));
    }
    Ok(with_ints(rows, raw, &["inode"]))
}

proc_file!(
    DevMcastParser,
    "proc_net_dev_mcast",
    "/proc/net/dev_mcast",
    list(),
    r#"
    [
      {
        "index":            integer,
        "interface":        string,
        "dmi_u":            integer,
        "dmi_g":            integer,
        "dmi_address":      string
      }
    ]
"#,
    dev_mcast
);

fn dev_mcast(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let keys = ["index", "interface", "dmi_u", "dmi_g", "dmi_address"];
    Ok(with_ints(fixed_columns(text, 0, &keys), raw, &["index", "dmi_u", "dmi_g"]))
}

proc_file!(
    TcpParser,
    "proc_net_tcp",
    "/proc/net/tcp",
    list(),
    r#"
    [
      {
        "entry":                        string,
        "local_address":                string,
        "local_port":                   integer,
        "remote_address":               string,
        "remote_port":                  integer,
        "state":                        string,
        "tx_queue":                     string,
        "rx_queue":                     string,
        "timer_active":                 integer,
        "jiffies_until_timer_expires":  string,
        "unrecovered_rto_timeouts":     string,
        "uid":                          integer,
        "unanswered_0_window_probes":   integer,
        "inode":                        integer,
        "sock_ref_count":               integer,
        "sock_mem_loc":                 string,
        "retransmit_timeout":           integer,
        "soft_clock_tick":              integer,
        "ack_quick_pingpong":           integer,
        "sending_congestion_window":    integer,
        "slow_start_size_threshold":    integer
      }
    ]
"#,
    tcp
);

const TCP_TAIL: &[&str] = &[
    "uid",
    "unanswered_0_window_probes",
    "inode",
    "sock_ref_count",
    "sock_mem_loc",
    "retransmit_timeout",
    "soft_clock_tick",
    "ack_quick_pingpong",
    "sending_congestion_window",
    "slow_start_size_threshold",
];

const TCP_INTS: &[&str] = &[
    "timer_active",
    "uid",
    "unanswered_0_window_probes",
    "inode",
    "sock_ref_count",
    "retransmit_timeout",
    "soft_clock_tick",
    "ack_quick_pingpong",
    "sending_congestion_window",
    "slow_start_size_threshold",
];

/// Kernel socket address: each 32-bit word is hex in host (little-endian) order.
fn socket_address(hex: &str) -> Option<String> {
    if !hex.is_ascii() || hex.len() % 8 != 0 {
        return None;
    }
    let words = (0..hex.len())
        .step_by(8)
        .map(|i| u32::from_str_radix(&hex[i..i + 8], 16).map(u32::swap_bytes))
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    match words.as_slice() {
        [word] => Some(Ipv4Addr::from(*word).to_string()),
        [_, _, _, _] => {
            let mut octets = [0u8; 16];
            for (chunk, word) in octets.chunks_exact_mut(4).zip(&words) {
                chunk.copy_from_slice(&word.to_be_bytes());
            }
            Some(Ipv6Addr::from(octets).to_string())
        }
        _ => None,
    }
}

fn endpoint(row: &mut Map, prefix: &str, token: &str, raw: bool) -> Result<(), JcError> {
    let (address, port) = token
        .split_once(':')
        .ok_or_else(|| JcError::parse(format!("Unexpected socket address: {token}")))?;
    let (address, port) = if raw {
        (ParseValue::from(address), ParseValue::from(port))
    } else {
        (
            socket_address(address).map_or_else(|| ParseValue::from(address), ParseValue::from),
            i64::from_str_radix(port, 16).map_or_else(|_| ParseValue::from(port), ParseValue::from),
        )
    };
    row.insert(format!("{prefix}_address"), address);
    row.insert(format!("{prefix}_port"), port);
    Ok(())
}

fn tcp(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows = Vec::new();
    for line in data_lines(text).into_iter().skip(1) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [entry, local, remote, state, queues, timer, rto, rest @ ..] = tokens.as_slice() else {
            return Err(JcError::parse(format!("Unexpected tcp line: {line}")));
        };
        let (tx_queue, rx_queue) = queues.split_once(':').unwrap_or((*queues, ""));
        let (timer_active, jiffies) = timer.split_once(':').unwrap_or((*timer, ""));

        let mut row = record! { "entry" => entry.trim_end_matches(':') };
        endpoint(&mut row, "local", local, raw)?;
        endpoint(&mut row, "remote", remote, raw)?;
        row.insert("state", *state);
        row.insert("tx_queue", tx_queue);
        row.insert("rx_queue", rx_queue);
        row.insert("timer_active", timer_active);
        row.insert("jiffies_until_timer_expires", jiffies);
        row.insert("unrecovered_rto_timeouts", *rto);
        for (key, value) in TCP_TAIL.iter().zip(rest) {
            row.insert(*key, *value);
        }
        rows.push(row);
    }
    Ok(with_ints(rows, raw, TCP_INTS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::proc::tests::sample;

    #[test]
    fn test_arp_columns() {
        let out = arp(sample("proc_net_arp"), false).unwrap();
        let row = &out.as_list().unwrap()[0];
        assert_eq!(row.get("ip_address"), Some(&ParseValue::from("192.168.71.2")));
        assert_eq!(row.get("hw_address"), Some(&ParseValue::from("00:50:56:f3:2f:ad")));
        assert_eq!(row.get("device"), Some(&ParseValue::from("ens33")));
    }

    #[test]
    fn test_dev_counters() {
        let out = dev(sample("proc_net_dev"), false).unwrap();
        let lo = &out.as_list().unwrap()[0];
        assert_eq!(lo.get("interface"), Some(&ParseValue::from("lo")));
        assert_eq!(lo.get("r_bytes"), Some(&ParseValue::Int(13_796)));
        assert_eq!(lo.get("t_packets"), Some(&ParseValue::Int(172)));
        assert_eq!(lo.as_map().unwrap().len(), 17);
    }

    #[test]
    fn test_igmp_groups() {
        let out = igmp(sample("proc_net_igmp"), false).unwrap();
        let rows = out.as_list().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("device"), Some(&ParseValue::from("enp0s3")));
        assert_eq!(rows[1].get("querier"), Some(&ParseValue::from("V3")));
        let groups = rows[1].get("groups").unwrap().as_list().unwrap();
        assert_eq!(groups[0].get("address"), Some(&ParseValue::from("010000E0")));
        assert_eq!(groups[0].get("timer"), Some(&ParseValue::from("0:00000000")));
    }

    #[test]
    fn test_netstat_pairs_lines() {
        let out = netstat(sample("proc_net_netstat"), false).unwrap();
        let rows = out.as_list().unwrap();
        assert_eq!(rows[0].get("protocol"), Some(&ParseValue::from("TcpExt")));
        assert_eq!(rows[0].get("EmbryonicRsts"), Some(&ParseValue::Int(1)));
        assert_eq!(rows[1].get("InTruncatedPkts"), Some(&ParseValue::Int(0)));
    }

    #[test]
    fn test_protocols_flags() {
        let out = protocols(sample("proc_net_protocols"), false).unwrap();
        let udp = &out.as_list().unwrap()[1];
        assert_eq!(udp.get("memory"), Some(&ParseValue::Int(1)));
        assert_eq!(udp.get("slab"), Some(&ParseValue::Bool(true)));
        assert_eq!(udp.get("cl"), Some(&ParseValue::Bool(true)));
        assert_eq!(udp.get("press"), Some(&ParseValue::from("NI")));
    }

    #[test]
    fn test_route_keeps_hex_columns() {
        let out = route(sample("proc_net_route"), false).unwrap();
        let row = &out.as_list().unwrap()[0];
        assert_eq!(row.get("destination"), Some(&ParseValue::from("00000000")));
        assert_eq!(row.get("gateway"), Some(&ParseValue::from("0247A8C0")));
        assert_eq!(row.get("metric"), Some(&ParseValue::Int(100)));
    }

    #[test]
    fn test_unix_missing_path() {
        let out = unix(sample("proc_net_unix"), false).unwrap();
        let rows = out.as_list().unwrap();
        assert_eq!(rows[0].get("num"), Some(&ParseValue::from("ffff8fca0ad7fc00")));
        assert_eq!(rows[0].get("path"), Some(&ParseValue::from("/run/systemd/notify")));
        assert_eq!(rows[1].get("path"), Some(&ParseValue::Null));
        assert_eq!(rows[1].get("inode"), Some(&ParseValue::Int(34_357)));
    }

    #[test]
    fn test_dev_mcast_counts() {
        let out = dev_mcast(sample("proc_net_dev_mcast"), false).unwrap();
        let rows = out.as_list().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("index"), Some(&ParseValue::Int(2)));
        assert_eq!(rows[0].get("interface"), Some(&ParseValue::from("enp0s3")));
        assert_eq!(rows[0].get("dmi_u"), Some(&ParseValue::Int(1)));
        assert_eq!(rows[2].get("dmi_address"), Some(&ParseValue::from("3333ff5a1ba3")));
    }

    #[test]
    fn test_tcp_addresses_and_ports() {
        let out = tcp(sample("proc_net_tcp"), false).unwrap();
        let rows = out.as_list().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("entry"), Some(&ParseValue::from("0")));
        assert_eq!(rows[0].get("local_address"), Some(&ParseValue::from("127.0.0.53")));
        assert_eq!(rows[0].get("local_port"), Some(&ParseValue::Int(53)));
        assert_eq!(rows[0].get("uid"), Some(&ParseValue::Int(102)));
        assert_eq!(rows[1].get("local_address"), Some(&ParseValue::from("10.0.2.15")));
        assert_eq!(rows[1].get("local_port"), Some(&ParseValue::Int(22)));
        assert_eq!(rows[1].get("remote_address"), Some(&ParseValue::from("10.0.2.2")));
        assert_eq!(rows[1].get("remote_port"), Some(&ParseValue::Int(35_667)));
        assert_eq!(rows[1].get("state"), Some(&ParseValue::from("01")));
        assert_eq!(rows[1].get("timer_active"), Some(&ParseValue::Int(2)));
        assert_eq!(rows[1].get("jiffies_until_timer_expires"), Some(&ParseValue::from("000AC99F")));
        assert_eq!(rows[1].get("inode"), Some(&ParseValue::Int(2388)));
        assert_eq!(rows[1].get("sock_mem_loc"), Some(&ParseValue::from("0000000000000000")));
        assert_eq!(rows[1].get("slow_start_size_threshold"), Some(&ParseValue::Int(-1)));
    }

    #[test]
    fn test_tcp6_addresses() {
        assert_eq!(socket_address("00000000000000000000000001000000").as_deref(), Some("::1"));
        assert_eq!(socket_address("0000000000000000FFFF00000F02000A").as_deref(), Some("::ffff:10.0.2.15"));
        assert_eq!(socket_address("0F02000"), None);
    }

    #[test]
    fn test_raw_tcp_keeps_hex() {
        let out = tcp(sample("proc_net_tcp"), true).unwrap();
        let row = &out.as_list().unwrap()[0];
        assert_eq!(row.get("local_address"), Some(&ParseValue::from("3500007F")));
        assert_eq!(row.get("local_port"), Some(&ParseValue::from("0035")));
        assert_eq!(row.get("uid"), Some(&ParseValue::from("102")));
    }

    #[test]
    fn test_raw_igmp6_keeps_text() {
        let out = igmp6(sample("proc_net_igmp6"), true).unwrap();
        let row = &out.as_list().unwrap()[1];
        assert_eq!(row.get("users"), Some(&ParseValue::from("1")));
        assert_eq!(row.get("group"), Some(&ParseValue::from("00000004")));
    }
}
