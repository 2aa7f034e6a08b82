//! System-wide `/proc` files: memory, scheduler, kernel and module state.

use super::{blocks, flag, header_table, int_or_keep, list, map, pairs, scalar, to_values};
use crate::record;
use crate::types::JcError;
use crate::utils::{convert_to_int, data_lines, normalize_key};
use crate::value::{Map, ParseValue};
use regex::Regex;
use std::sync::LazyLock;

proc_file!(
    BuddyinfoParser,
    "proc_buddyinfo",
    "/proc/buddyinfo",
    list(),
    r#"
    [
      {
        "node":             integer,
        "zone":             string,
        "free_chunks": [
                            integer     # [0] = 2^0 * PAGE_SIZE, [1] = 2^1 ...
        ]
      }
    ]
"#,
    buddyinfo
);

fn buddyinfo(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows = Vec::new();
    for line in data_lines(text) {
        let (node, rest) = line
            .split_once(',')
            .ok_or_else(|| JcError::parse(format!("Unexpected buddyinfo line: {line}")))?;
        let mut tokens = rest.split_whitespace().skip(1);
        let zone = tokens.next().unwrap_or_default();
        let chunks: Vec<ParseValue> = tokens.map(|t| scalar(t, raw)).collect();
        rows.push(record! {
            "node" => scalar(node.trim_start_matches("Node"), raw),
            "zone" => zone,
            "free_chunks" => chunks,
        });
    }
    Ok(to_values(rows))
}

proc_file!(
    CpuinfoParser,
    "proc_cpuinfo",
    "/proc/cpuinfo",
    list(),
    r#"
    [
      {
        "processor":        integer,
        "vendor_id":        string,
        "cpu family":       integer,
        "model name":       string,
        "cpu MHz":          float,
        "fpu":              boolean,
        "flags": [
                            string
        ],
        "bogomips":         float,
        "<key>":            string/integer/float/boolean
      }
    ]
"#,
    cpuinfo
);

const LIST_KEYS: &[&str] = &["flags", "bugs", "Features"];

fn cpuinfo(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let rows = blocks(text)
        .into_iter()
        .map(|block| {
            block
                .iter()
                .filter_map(|line| line.split_once(':'))
                .map(|(k, v)| {
                    let key = k.trim();
                    let value = if LIST_KEYS.contains(&key) {
                        ParseValue::from(v.split_whitespace().collect::<Vec<_>>())
                    } else if matches!(v.trim(), "yes" | "no") {
                        flag(v, raw)
                    } else {
                        scalar(v, raw)
                    };
                    (key, value)
                })
                .collect::<Map>()
        })
        .collect();
    Ok(to_values(rows))
}

proc_file!(
    CryptoParser,
    "proc_crypto",
    "/proc/crypto",
    list(),
    r#"
    [
      {
        "name":             string,
        "driver":           string,
        "module":           string,
        "priority":         integer,
        "refcnt":           integer,
        "selftest":         string,
        "internal":         boolean,
        "type":             string,
        "blocksize":        integer,
        "digestsize":       integer,
        "min_keysize":      integer,
        "max_keysize":      integer,
        "ivsize":           integer
      }
    ]
"#,
    crypto
);

fn crypto(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let rows = blocks(text)
        .into_iter()
        .map(|block| {
            block
                .iter()
                .filter_map(|line| line.split_once(':'))
                .map(|(k, v)| {
                    let key = normalize_key(k);
                    let value = if key == "internal" { flag(v, raw) } else { scalar(v, raw) };
                    (key, value)
                })
                .collect::<Map>()
        })
        .collect();
    Ok(to_values(rows))
}

proc_file!(
    FilesystemsParser,
    "proc_filesystems",
    "/proc/filesystems",
    list(),
    r#"
    [
      {
        "filesystem":       string,
        "nodev":            boolean
      }
    ]
"#,
    filesystems
);

fn filesystems(text: &str, _raw: bool) -> Result<ParseValue, JcError> {
    let rows = data_lines(text)
        .into_iter()
        .map(|line| {
            let (nodev, fs) = match line.strip_prefix("nodev") {
                Some(rest) => (true, rest),
                None => (false, line),
            };
            record! { "filesystem" => fs.trim(), "nodev" => nodev }
        })
        .collect();
    Ok(to_values(rows))
}

proc_file!(
    LoadavgParser,
    "proc_loadavg",
    "/proc/loadavg",
    map(),
    r#"
    {
      "load_1m":            float,
      "load_5m":            float,
      "load_15m":           float,
      "running":            integer,
      "available":          integer,
      "last_pid":           integer
    }
"#,
    loadavg
);

fn loadavg(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [l1, l5, l15, tasks, last_pid] = tokens[..] else {
        return Err(JcError::parse("Expected five loadavg fields"));
    };
    let (running, available) = tasks
        .split_once('/')
        .ok_or_else(|| JcError::parse(format!("Unexpected task counts: {tasks}")))?;
    Ok(record! {
        "load_1m" => scalar(l1, raw),
        "load_5m" => scalar(l5, raw),
        "load_15m" => scalar(l15, raw),
        "running" => scalar(running, raw),
        "available" => scalar(available, raw),
        "last_pid" => scalar(last_pid, raw),
    }
    .into())
}

proc_file!(
    LocksParser,
    "proc_locks",
    "/proc/locks",
    list(),
    r#"
    [
      {
        "id":               integer,
        "class":            string,
        "type":             string,
        "access":           string,
        "pid":              integer,
        "maj":              string,
        "min":              string,
        "inode":            integer,
        "start":            string,
        "end":              string
      }
    ]
"#,
    locks
);

fn locks(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows = Vec::new();
    for line in data_lines(text) {
        let tokens: Vec<&str> = line.split_whitespace().filter(|t| *t != "->").collect();
        let [id, class, kind, access, pid, device, start, end] = tokens[..] else {
            return Err(JcError::parse(format!("Unexpected lock line: {line}")));
        };
        let mut dev = device.splitn(3, ':');
        let (maj, min, inode) = (dev.next(), dev.next(), dev.next());
        rows.push(record! {
            "id" => scalar(id.trim_end_matches(':'), raw),
            "class" => class,
            "type" => kind,
            "access" => access,
            "pid" => scalar(pid, raw),
            "maj" => maj,
            "min" => min,
            "inode" => inode.map(|i| scalar(i, raw)),
            "start" => scalar(start, raw),
            "end" => scalar(end, raw),
        });
    }
    Ok(to_values(rows))
}

proc_file!(
    MeminfoParser,
    "proc_meminfo",
    "/proc/meminfo",
    map(),
    r#"
    {
      "MemTotal":           integer,    # kB unless the key says otherwise
      "MemFree":            integer,
      "MemAvailable":       integer,
      "<key>":              integer
    }
"#,
    meminfo
);

fn meminfo(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut out = pairs(text, ':');
    if !raw {
        for (_, v) in out.iter_mut() {
            if let Some(s) = v.as_str() {
                *v = convert_to_int(s).into();
            }
        }
    }
    Ok(out.into())
}

proc_file!(
    ModulesParser,
    "proc_modules",
    "/proc/modules",
    list(),
    r#"
    [
      {
        "module":           string,
        "size":             integer,
        "used":             integer,
        "used_by": [
                            string
        ],
        "status":           string,
        "location":         string
      }
    ]
"#,
    modules
);

fn modules(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows = Vec::new();
    for line in data_lines(text) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 5 {
            return Err(JcError::parse(format!("Unexpected module line: {line}")));
        }
        let used_by: Vec<&str> = tokens[3].split(',').filter(|m| !m.is_empty() && *m != "-").collect();
        rows.push(record! {
            "module" => tokens[0],
            "size" => scalar(tokens[1], raw),
            "used" => scalar(tokens[2], raw),
            "used_by" => used_by,
            "status" => tokens[4],
            "location" => tokens.get(5).copied(),
        });
    }
    Ok(to_values(rows))
}

proc_file!(
    PagetypeinfoParser,
    "proc_pagetypeinfo",
    "/proc/pagetypeinfo",
    map(),
    r#"
    {
      "page_block_order":           integer,
      "pages_per_block":            integer,
      "free_pages": [
        {
          "node":                   integer,
          "zone":                   string,
          "type":                   string,
          "free": [
                                    integer
          ]
        }
      ],
      "num_blocks_type": [
        {
          "node":                   integer,
          "zone":                   string,
          "unmovable":              integer,
          "movable":                integer,
          "reclaimable":            integer,
          "highatomic":             integer,
          "isolate":                integer
        }
      ]
    }
"#,
    pagetypeinfo
);

fn pagetypeinfo(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut out = Map::new();
    let mut free_pages = Vec::new();
    let mut num_blocks = Vec::new();
    let mut block_types: Vec<String> = Vec::new();

    for line in data_lines(text) {
        if let Some(v) = line.strip_prefix("Page block order:") {
            out.insert("page_block_order", scalar(v, raw));
        } else if let Some(v) = line.strip_prefix("Pages per block:") {
            out.insert("pages_per_block", scalar(v, raw));
        } else if let Some(rest) = line.strip_prefix("Number of blocks type") {
            block_types = rest.split_whitespace().map(normalize_key).collect();
        } else if let Some(rest) = line.strip_prefix("Node") {
            let parts: Vec<&str> = rest.split(',').map(str::trim).collect();
            let node = scalar(parts[0], raw);
            let mut zone = parts.get(1).copied().unwrap_or_default().split_whitespace().skip(1);
            if let Some(kind) = parts.get(2) {
                let mut tokens = kind.split_whitespace().skip(1);
                let name = tokens.next().unwrap_or_default();
                let free: Vec<ParseValue> = tokens.map(|t| scalar(t, raw)).collect();
                free_pages.push(record! {
                    "node" => node,
                    "zone" => zone.next(),
                    "type" => name,
                    "free" => free,
                });
            } else {
                let mut row = record! { "node" => node, "zone" => zone.next() };
                for (key, count) in block_types.iter().zip(zone) {
                    row.insert(key.as_str(), scalar(count, raw));
                }
                num_blocks.push(row);
            }
        }
    }
    out.insert("free_pages", free_pages);
    out.insert("num_blocks_type", num_blocks);
    Ok(out.into())
}

proc_file!(
    SlabinfoParser,
    "proc_slabinfo",
    "/proc/slabinfo",
    list(),
    r#"
    [
      {
        "name":             string,
        "active_objs":      integer,
        "num_objs":         integer,
        "obj_size":         integer,
        "obj_per_slab":     integer,
        "pages_per_slab":   integer,
        "tunables": {
          "limit":          integer,
          "batch_count":    integer,
          "shared_factor":  integer
        },
        "slabdata": {
          "active_slabs":   integer,
          "num_slabs":      integer,
          "shared_avail":   integer
        }
      }
    ]
"#,
    slabinfo
);

fn slabinfo(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let named = |keys: &[&str], section: &str| -> Map {
        keys.iter()
            .zip(section.split_whitespace().skip(1))
            .map(|(k, v)| (*k, scalar(v, raw)))
            .collect()
    };
    let mut rows = Vec::new();
    for line in data_lines(text) {
        if line.starts_with("slabinfo") || line.starts_with('#') {
            continue;
        }
        let sections: Vec<&str> = line.split(':').collect();
        let [main, tunables, slabdata] = sections[..] else {
            return Err(JcError::parse(format!("Unexpected slabinfo line: {line}")));
        };
        let mut main = main.split_whitespace();
        let mut row = record! { "name" => main.next() };
        for (k, v) in ["active_objs", "num_objs", "obj_size", "obj_per_slab", "pages_per_slab"]
            .into_iter()
            .zip(main)
        {
            row.insert(k, scalar(v, raw));
        }
        row.insert("tunables", named(&["limit", "batch_count", "shared_factor"], tunables));
        row.insert("slabdata", named(&["active_slabs", "num_slabs", "shared_avail"], slabdata));
        rows.push(row);
    }
    Ok(to_values(rows))
}

proc_file!(
    StatParser,
    "proc_stat",
    "/proc/stat",
    map(),
    r#"
    {
      "cpu": {
        "user":             integer,
        "nice":             integer,
        "system":           integer,
        "idle":             integer,
        "iowait":           integer,
        "irq":              integer,
        "softirq":          integer,
        "steal":            integer,
        "guest":            integer,
        "guest_nice":       integer
      },
      "cpu<n>":             object,     # same keys as "cpu"
      "interrupts": [
                            integer
      ],
      "context_switches":   integer,
      "boot_time":          integer,
      "processes":          integer,
      "processes_running":  integer,
      "processes_blocked":  integer,
      "softirq": {
        "total":            integer,
        "hi":               integer,
        "timer":            integer,
        "net_tx":           integer,
        "net_rx":           integer,
        "block":            integer,
        "irq_poll":         integer,
        "tasklet":          integer,
        "sched":            integer,
        "hrtimer":          integer,
        "rcu":              integer
      }
    }
"#,
    stat
);

const CPU_FIELDS: &[&str] = &[
    "user", "nice", "system", "idle", "iowait", "irq", "softirq", "steal", "guest", "guest_nice",
];

const SOFTIRQ_FIELDS: &[&str] = &[
    "total", "hi", "timer", "net_tx", "net_rx", "block", "irq_poll", "tasklet", "sched", "hrtimer",
    "rcu",
];

fn stat(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut out = Map::new();
    for line in data_lines(text) {
        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else { continue };
        let values: Vec<&str> = tokens.collect();
        let named = |fields: &[&str]| -> Map {
            fields.iter().zip(&values).map(|(k, v)| (*k, scalar(v, raw))).collect()
        };
        match key {
            k if k.starts_with("cpu") => {
                out.insert(k, named(CPU_FIELDS));
            }
            "softirq" => {
                out.insert("softirq", named(SOFTIRQ_FIELDS));
            }
            "intr" => {
                let all: Vec<ParseValue> = values.iter().map(|v| scalar(v, raw)).collect();
                out.insert("interrupts", all);
            }
            _ => {
                let name = match key {
                    "ctxt" => "context_switches",
                    "btime" => "boot_time",
                    "procs_running" => "processes_running",
                    "procs_blocked" => "processes_blocked",
                    other => other,
                };
                let value = match values[..] {
                    [single] => scalar(single, raw),
                    _ => values.iter().map(|v| scalar(v, raw)).collect::<Vec<_>>().into(),
                };
                out.insert(name, value);
            }
        }
    }
    Ok(out.into())
}

proc_file!(
    SwapsParser,
    "proc_swaps",
    "/proc/swaps",
    list(),
    r#"
    [
      {
        "filename":         string,
        "type":             string,
        "size":             integer,
        "used":             integer,
        "priority":         integer
      }
    ]
"#,
    swaps
);

fn swaps(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows = header_table(text);
    if !raw {
        for row in &mut rows {
            for (_, v) in row.iter_mut() {
                *v = int_or_keep(v);
            }
        }
    }
    Ok(to_values(rows))
}

proc_file!(
    UptimeParser,
    "proc_uptime",
    "/proc/uptime",
    map(),
    r#"
    {
      "up_time":                float,
      "idle_time":              float,
      "up_time_days":           integer,
      "up_time_hours":          integer,
      "up_time_minutes":        integer,
      "up_time_total_seconds":  integer,
      "idle_time_days":         integer,
      "idle_time_hours":        integer,
      "idle_time_minutes":      integer,
      "idle_time_total_seconds": integer
    }
"#,
    uptime
);

fn uptime(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [up, idle] = tokens[..] else {
        return Err(JcError::parse("Expected two uptime fields"));
    };
    let mut out = record! { "up_time" => scalar(up, raw), "idle_time" => scalar(idle, raw) };
    if !raw {
        for (prefix, field) in [("up_time", up), ("idle_time", idle)] {
            let seconds = field
                .parse::<f64>()
                .map_err(|_| JcError::parse(format!("Invalid uptime value: {field}")))?
                as i64;
            out.insert(format!("{prefix}_days"), seconds / 86_400);
            out.insert(format!("{prefix}_hours"), seconds % 86_400 / 3_600);
            out.insert(format!("{prefix}_minutes"), seconds % 3_600 / 60);
            out.insert(format!("{prefix}_total_seconds"), seconds);
        }
    }
    Ok(out.into())
}

proc_file!(
    VersionParser,
    "proc_version",
    "/proc/version",
    map(),
    r#"
    {
      "version":            string,
      "email":              string,
      "gcc":                string,
      "build":              string,
      "flags":              string/null,
      "date":               string
    }
"#,
    version
);

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^Linux version (?P<version>\S+)\s\((?P<email>\S+?)\)\s\((?P<gcc>.+)\)\s(?P<build>#\d+\S*)\s(?P<flags>.*?)\s*(?P<date>(?:Sun|Mon|Tue|Wed|Thu|Fri|Sat)\s.+)$",
    )
    .expect("static regex must compile")
});

fn version(text: &str, _raw: bool) -> Result<ParseValue, JcError> {
    let line = text.trim();
    let caps = VERSION
        .captures(line)
        .ok_or_else(|| JcError::parse("Version string could not be parsed"))?;
    Ok(record! {
        "version" => &caps["version"],
        "email" => &caps["email"],
        "gcc" => &caps["gcc"],
        "build" => &caps["build"],
        "flags" => ParseValue::non_empty(&caps["flags"]),
        "date" => &caps["date"],
    }
    .into())
}

proc_file!(
    VmallocinfoParser,
    "proc_vmallocinfo",
    "/proc/vmallocinfo",
    list(),
    r#"
    [
      {
        "start":            string,
        "end":              string,
        "size":             integer,
        "caller":           string,
        "options": [
                            string
        ],
        "phys":             string,
        "pages":            integer,
        "N<id>":            integer
      }
    ]
"#,
    vmallocinfo
);

fn vmallocinfo(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows = Vec::new();
    for line in data_lines(text) {
        let mut tokens = line.split_whitespace();
        let range = tokens.next().unwrap_or_default();
        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| JcError::parse(format!("Unexpected vmallocinfo line: {line}")))?;
        let size = tokens.next().map(|s| scalar(s, raw));

        let mut caller = None;
        let mut options = Vec::new();
        let mut extra = Map::new();
        for token in tokens {
            if let Some((k, v)) = token.split_once('=') {
                let value = if k == "phys" { ParseValue::from(v) } else { scalar(v, raw) };
                extra.insert(k, value);
            } else if caller.is_none() && token.contains('+') {
                caller = Some(token);
            } else {
                options.push(token);
            }
        }

        let mut row = record! {
            "start" => start,
            "end" => end,
            "size" => size,
            "caller" => caller,
            "options" => options,
        };
        for (k, v) in extra.iter() {
            row.insert(k.as_str(), v.clone());
        }
        rows.push(row);
    }
    Ok(to_values(rows))
}

proc_file!(
    VmstatParser,
    "proc_vmstat",
    "/proc/vmstat",
    map(),
    r#"
    {
      "nr_free_pages":      integer,
      "<key>":              integer
    }
"#,
    vmstat
);

fn vmstat(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut out = pairs(text, ' ');
    if !raw {
        for (_, v) in out.iter_mut() {
            *v = int_or_keep(v);
        }
    }
    Ok(out.into())
}

proc_file!(
    ZoneinfoParser,
    "proc_zoneinfo",
    "/proc/zoneinfo",
    list(),
    r#"
    [
      {
        "node":                 integer,
        "zone":                 string,
        "per_node_stats": {
          "<key>":              integer
        },
        "pages": {
          "free":               integer,
          "min":                integer,
          "low":                integer,
          "high":               integer,
          "spanned":            integer,
          "present":            integer,
          "managed":            integer,
          "protection": [
                                integer
          ]
        },
        "stats": {
          "<key>":              integer
        },
        "pagesets": [
          {
            "cpu":              integer,
            "count":            integer,
            "high":             integer,
            "batch":            integer,
            "vm_stats_threshold": integer
          }
        ],
        "node_unreclaimable":   integer,
        "start_pfn":            integer
      }
    ]
"#,
    zoneinfo
);

const PAGE_KEYS: &[&str] = &["min", "low", "high", "spanned", "present", "managed", "cma"];

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Zone,
    PerNode,
    Pages,
    Pagesets,
}

#[derive(Default)]
struct Zone {
    head: Map,
    per_node: Map,
    pages: Map,
    stats: Map,
    pagesets: Vec<Map>,
    tail: Map,
}

impl Zone {
    fn into_map(self) -> Map {
        let mut out = self.head;
        if !self.per_node.is_empty() {
            out.insert("per_node_stats", self.per_node);
        }
        out.insert("pages", self.pages);
        out.insert("stats", self.stats);
        out.insert("pagesets", self.pagesets);
        for (k, v) in self.tail.iter() {
            out.insert(k.as_str(), v.clone());
        }
        out
    }
}

fn key_value(line: &str) -> Option<(&str, &str)> {
    match line.split_once(':') {
        Some((k, v)) => Some((k.trim(), v.trim())),
        None => line.rsplit_once(char::is_whitespace).map(|(k, v)| (k.trim(), v.trim())),
    }
}

fn zoneinfo(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut zones = Vec::new();
    let mut current: Option<Zone> = None;
    let mut section = Section::Zone;

    for line in data_lines(text) {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Node ") {
            if let Some(zone) = current.take() {
                zones.push(zone.into_map());
            }
            let (node, zone) = rest
                .split_once(',')
                .ok_or_else(|| JcError::parse(format!("Unexpected zone header: {line}")))?;
            let name = zone.split_whitespace().nth(1);
            current = Some(Zone {
                head: record! { "node" => scalar(node, raw), "zone" => name },
                ..Zone::default()
            });
            section = Section::Zone;
            continue;
        }
        let zone = current
            .as_mut()
            .ok_or_else(|| JcError::parse(format!("Line outside of a zone: {line}")))?;

        if line == "per-node stats" {
            section = Section::PerNode;
        } else if line == "pagesets" {
            section = Section::Pagesets;
        } else if let Some(free) = line.strip_prefix("pages free") {
            section = Section::Pages;
            zone.pages.insert("free", scalar(free, raw));
        } else if let Some(levels) = line.strip_prefix("protection:") {
            let levels: Vec<ParseValue> = levels
                .trim()
                .trim_start_matches('(')
                .trim_end_matches(')')
                .split(',')
                .map(|v| scalar(v, raw))
                .collect();
            zone.pages.insert("protection", levels);
        } else if let Some(cpu) = line.strip_prefix("cpu:") {
            zone.pagesets.push(record! { "cpu" => scalar(cpu, raw) });
        } else if let Some((key, value)) = key_value(line) {
            let key = normalize_key(key);
            let value = scalar(value, raw);
            let pageset = zone.pagesets.last_mut();
            match (section, pageset) {
                (_, _) if key == "node_unreclaimable" || key == "start_pfn" => {
                    zone.tail.insert(key, value);
                }
                (Section::Pagesets, Some(set)) => {
                    set.insert(key, value);
                }
                (Section::Pages, _) if PAGE_KEYS.contains(&key.as_str()) => {
                    zone.pages.insert(key, value);
                }
                (Section::PerNode, _) => {
                    zone.per_node.insert(key, value);
                }
                _ => {
                    zone.stats.insert(key, value);
                }
            }
        }
    }
    if let Some(zone) = current {
        zones.push(zone.into_map());
    }
    Ok(to_values(zones))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::proc::tests::sample;

    #[test]
    fn test_loadavg() {
        let out = loadavg(sample("proc_loadavg"), false).unwrap();
        let expected = record! {
            "load_1m" => 0.0,
            "load_5m" => 0.01,
            "load_15m" => 0.03,
            "running" => 2i64,
            "available" => 111i64,
            "last_pid" => 2039i64,
        };
        assert_eq!(out, ParseValue::Map(expected));
    }

    #[test]
    fn test_version() {
        let out = version(sample("proc_version"), false).unwrap();
        assert_eq!(out.get("version"), Some(&ParseValue::from("5.8.0-63-generic")));
        assert_eq!(out.get("email"), Some(&ParseValue::from("buildd@lcy01-amd64-028")));
        assert_eq!(out.get("build"), Some(&ParseValue::from("#71-Ubuntu")));
        assert_eq!(out.get("flags"), Some(&ParseValue::from("SMP")));
        assert_eq!(out.get("date"), Some(&ParseValue::from("Tue Jul 13 15:59:12 UTC 2021")));
    }

    #[test]
    fn test_meminfo_and_raw() {
        let out = meminfo(sample("proc_meminfo"), false).unwrap();
        assert_eq!(out.get("MemTotal"), Some(&ParseValue::Int(3_997_272)));
        assert_eq!(out.get("HugePages_Total"), Some(&ParseValue::Int(0)));
        let raw = meminfo(sample("proc_meminfo"), true).unwrap();
        assert_eq!(raw.get("MemFree"), Some(&ParseValue::from("2760316 kB")));
    }

    #[test]
    fn test_cpuinfo_blocks() {
        let out = cpuinfo(sample("proc_cpuinfo"), false).unwrap();
        let cpus = out.as_list().unwrap();
        assert_eq!(cpus.len(), 2);
        assert_eq!(cpus[0].get("cpu MHz"), Some(&ParseValue::Float(2592.0)));
        assert_eq!(cpus[0].get("fpu"), Some(&ParseValue::Bool(true)));
        assert_eq!(cpus[1].get("processor"), Some(&ParseValue::Int(1)));
        assert_eq!(
            cpus[1].get("flags"),
            Some(&ParseValue::List(vec!["fpu".into(), "vme".into()]))
        );
    }

    #[test]
    fn test_stat() {
        let out = stat(sample("proc_stat"), false).unwrap();
        let cpu = out.get("cpu").unwrap();
        assert_eq!(cpu.get("idle"), Some(&ParseValue::Int(3_444_436)));
        assert_eq!(out.get("boot_time"), Some(&ParseValue::Int(1_650_637_346)));
        assert_eq!(out.get("interrupts").unwrap().as_list().unwrap().len(), 4);
        assert_eq!(out.get("softirq").unwrap().get("rcu"), Some(&ParseValue::Int(1_917_764)));
    }

    #[test]
    fn test_modules_used_by() {
        let out = modules(sample("proc_modules"), false).unwrap();
        let rows = out.as_list().unwrap();
        assert_eq!(rows[0].get("used_by"), Some(&ParseValue::List(Vec::new())));
        assert_eq!(
            rows[2].get("used_by"),
            Some(&ParseValue::List(vec!["vsock_loopback".into()]))
        );
        assert_eq!(rows[2].get("size"), Some(&ParseValue::Int(36_864)));
    }

    #[test]
    fn test_slabinfo_sections() {
        let out = slabinfo(sample("proc_slabinfo"), false).unwrap();
        let row = &out.as_list().unwrap()[0];
        assert_eq!(row.get("obj_size"), Some(&ParseValue::Int(144)));
        assert_eq!(row.get("slabdata").unwrap().get("num_slabs"), Some(&ParseValue::Int(8)));
    }

    #[test]
    fn test_pagetypeinfo() {
        let out = pagetypeinfo(sample("proc_pagetypeinfo"), false).unwrap();
        assert_eq!(out.get("pages_per_block"), Some(&ParseValue::Int(512)));
        let free = out.get("free_pages").unwrap().as_list().unwrap();
        assert_eq!(free[1].get("type"), Some(&ParseValue::from("Movable")));
        assert_eq!(free[1].get("free").unwrap().as_list().unwrap()[2], ParseValue::Int(1));
        let blocks = out.get("num_blocks_type").unwrap().as_list().unwrap();
        assert_eq!(blocks[0].get("zone"), Some(&ParseValue::from("DMA")));
        assert_eq!(blocks[0].get("movable"), Some(&ParseValue::Int(7)));
    }

    #[test]
    fn test_zoneinfo_sections() {
        let out = zoneinfo(sample("proc_zoneinfo"), false).unwrap();
        let zone = &out.as_list().unwrap()[0];
        assert_eq!(zone.get("zone"), Some(&ParseValue::from("DMA")));
        let pages = zone.get("pages").unwrap();
        assert_eq!(pages.get("free"), Some(&ParseValue::Int(3832)));
        assert_eq!(pages.get("high"), Some(&ParseValue::Int(102)));
        assert_eq!(pages.get("protection").unwrap().as_list().unwrap().len(), 3);
        assert_eq!(
            zone.get("per_node_stats").unwrap().get("nr_active_anon"),
            Some(&ParseValue::Int(34838))
        );
        assert_eq!(zone.get("stats").unwrap().get("nr_free_pages"), Some(&ParseValue::Int(3832)));
        let sets = zone.get("pagesets").unwrap().as_list().unwrap();
        assert_eq!(sets[0].get("batch"), Some(&ParseValue::Int(1)));
        assert_eq!(sets[0].get("vm_stats_threshold"), Some(&ParseValue::Int(4)));
        assert_eq!(zone.get("start_pfn"), Some(&ParseValue::Int(1)));
    }

    #[test]
    fn test_uptime_breakdown() {
        let out = uptime(sample("proc_uptime"), false).unwrap();
        assert_eq!(out.get("up_time"), Some(&ParseValue::Float(46901.13)));
        assert_eq!(out.get("up_time_hours"), Some(&ParseValue::Int(13)));
        assert_eq!(out.get("up_time_minutes"), Some(&ParseValue::Int(1)));
        let raw = uptime(sample("proc_uptime"), true).unwrap();
        assert_eq!(raw.as_map().unwrap().len(), 2);
    }

    #[test]
    fn test_vmallocinfo_options() {
        let out = vmallocinfo(sample("proc_vmallocinfo"), false).unwrap();
        let rows = out.as_list().unwrap();
        assert_eq!(rows[0].get("caller"), Some(&ParseValue::from("map_irq_stack+0x93/0xe0")));
        assert_eq!(rows[0].get("pages"), Some(&ParseValue::Int(4)));
        assert_eq!(rows[0].get("N0"), Some(&ParseValue::Int(4)));
        assert_eq!(rows[1].get("phys"), Some(&ParseValue::from("0x00000000bfeff000")));
        assert_eq!(rows[1].get("options"), Some(&ParseValue::List(vec!["ioremap".into()])));
    }

    #[test]
    fn test_locks_and_filesystems() {
        let out = locks(sample("proc_locks"), false).unwrap();
        let rows = out.as_list().unwrap();
        assert_eq!(rows[0].get("inode"), Some(&ParseValue::Int(487)));
        assert_eq!(rows[1].get("class"), Some(&ParseValue::from("FLOCK")));

        let out = filesystems(sample("proc_filesystems"), false).unwrap();
        let rows = out.as_list().unwrap();
        assert_eq!(rows[0].get("nodev"), Some(&ParseValue::Bool(true)));
        assert_eq!(rows[4].get("filesystem"), Some(&ParseValue::from("ext4")));
    }
}
