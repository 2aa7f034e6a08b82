//! Device, bus and interrupt `/proc` files.

use super::{header_table, list, map, pairs, scalar, flag, to_values};
use crate::record;
use crate::types::JcError;
use crate::utils::data_lines;
use crate::value::{Map, ParseValue};
use regex::Regex;
use std::sync::LazyLock;

proc_file!(
    ConsolesParser,
    "proc_consoles",
    "/proc/consoles",
    list(),
    r#"
    [
      {
        "device":               string,
        "operations":           string,
        "operations_list": [
                                string  # read, write, unblank
        ],
        "flags":                string,
        "flags_list": [
                                string  # enabled, preferred, primary_boot,
                                        # printk_buffer, not_tty,
                                        # safe_when_cpu_offline
        ],
        "major":                integer,
        "minor":                integer
      }
    ]
"#,
    consoles
);

static CONSOLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<device>\S+)\s+(?P<ops>\S{3}) \((?P<flags>[^)]*)\)\s+(?P<major>\d+):(?P<minor>\d+)")
        .expect("static regex must compile")
});

fn console_operation(c: char) -> Option<&'static str> {
    match c {
        'R' => Some("read"),
        'W' => Some("write"),
        'U' => Some("unblank"),
        _ => None,
    }
}

fn console_flag(c: char) -> Option<&'static str> {
    match c {
        'E' => Some("enabled"),
        'C' => Some("preferred"),
        'B' => Some("primary_boot"),
        'p' => Some("printk_buffer"),
        'b' => Some("not_tty"),
        'a' => Some("safe_when_cpu_offline"),
        _ => None,
    }
}

fn consoles(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows = Vec::new();
    for line in data_lines(text) {
        let caps = CONSOLE
            .captures(line)
            .ok_or_else(|| JcError::parse(format!("Unexpected console line: {line}")))?;
        let ops: Vec<&str> = caps["ops"].chars().filter_map(console_operation).collect();
        let flags: Vec<&str> = caps["flags"].chars().filter_map(console_flag).collect();
        rows.push(record! {
            "device" => &caps["device"],
            "operations" => &caps["ops"],
            "operations_list" => ops,
            "flags" => caps["flags"].trim(),
            "flags_list" => flags,
            "major" => scalar(&caps["major"], raw),
            "minor" => scalar(&caps["minor"], raw),
        });
    }
    Ok(to_values(rows))
}

proc_file!(
    DevicesParser,
    "proc_devices",
    "/proc/devices",
    map(),
    r#"
    {
      "character": {
        "<device number>": [
                            string
        ]
      },
      "block": {
        "<device number>": [
                            string
        ]
      }
    }
"#,
    devices
);

fn devices(text: &str, _raw: bool) -> Result<ParseValue, JcError> {
    let mut out = Map::new();
    let mut section: Option<String> = None;
    let mut current = Map::new();

    for line in data_lines(text) {
        if let Some(name) = line.strip_suffix(" devices:") {
            if let Some(done) = section.replace(name.to_lowercase()) {
                out.insert(done, std::mem::take(&mut current));
            }
            continue;
        }
        let (num, name) = line
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(|| JcError::parse(format!("Unexpected device line: {line}")))?;
        let name = ParseValue::from(name.trim());
        match current.get_mut(num) {
            Some(ParseValue::List(names)) => names.push(name),
            _ => {
                current.insert(num, vec![name]);
            }
        }
    }
    if let Some(done) = section {
        out.insert(done, current);
    }
    Ok(out.into())
}

proc_file!(
    DiskstatsParser,
    "proc_diskstats",
    "/proc/diskstats",
    list(),
    r#"
    [
      {
        "maj":                                    integer,
        "min":                                    integer,
        "device":                                 string,
        "reads_completed":                        integer,
        "reads_merged":                           integer,
        "sectors_read":                           integer,
        "read_time_ms":                           integer,
        "writes_completed":                       integer,
        "writes_merged":                          integer,
        "sectors_written":                        integer,
        "write_time_ms":                          integer,
        "io_in_progress":                         integer,
        "io_time_ms":                             integer,
        "weighted_io_time_ms":                    integer,
        "discards_completed_successfully":        integer,
        "discards_merged":                        integer,
        "sectors_discarded":                      integer,
        "discarding_time_ms":                     integer,
        "flush_requests_completed_successfully":  integer,
        "flushing_time_ms":                       integer
      }
    ]
"#,
    diskstats
);

const DISK_FIELDS: &[&str] = &[
    "maj",
    "min",
    "device",
    "reads_completed",
    "reads_merged",
    "sectors_read",
    "read_time_ms",
    "writes_completed",
    "writes_merged",
    "sectors_written",
    "write_time_ms",
    "io_in_progress",
    "io_time_ms",
    "weighted_io_time_ms",
    "discards_completed_successfully",
    "discards_merged",
    "sectors_discarded",
    "discarding_time_ms",
    "flush_requests_completed_successfully",
    "flushing_time_ms",
];

fn diskstats(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let rows = data_lines(text)
        .into_iter()
        .map(|line| {
            DISK_FIELDS
                .iter()
                .zip(line.split_whitespace())
                .map(|(k, v)| {
                    let value = if *k == "device" { ParseValue::from(v) } else { scalar(v, raw) };
                    (*k, value)
                })
                .collect::<Map>()
        })
        .collect();
    Ok(to_values(rows))
}

proc_file!(
    InterruptsParser,
    "proc_interrupts",
    "/proc/interrupts",
    list(),
    r#"
    [
      {
        "irq":                  string,
        "cpu_num":              integer,
        "interrupts": [
                                integer
        ],
        "type":                 string,
        "device": [
                                string
        ]
      }
    ]

Numbered interrupts carry the chip name and hardware IRQ in `type` and
the list of handlers in `device`. Named interrupts (`NMI`, `LOC`, ...)
carry their description in `type` and a null `device`.
"#,
    interrupts
);

fn interrupts(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let lines = data_lines(text);
    let Some((header, body)) = lines.split_first() else {
        return Ok(list());
    };
    let cpu_num = header.split_whitespace().filter(|t| t.starts_with("CPU")).count();

    let mut rows = Vec::new();
    for line in body {
        let (irq, rest) = line
            .split_once(':')
            .ok_or_else(|| JcError::parse(format!("Unexpected interrupt line: {line}")))?;
        let irq = irq.trim();
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        let counts = tokens
            .iter()
            .take(cpu_num)
            .take_while(|t| t.chars().all(|c| c.is_ascii_digit()))
            .count();
        let values: Vec<ParseValue> = tokens[..counts].iter().map(|t| scalar(t, raw)).collect();
        let rest = &tokens[counts..];

        let (kind, device) = if irq.chars().all(|c| c.is_ascii_digit()) {
            let split = rest.len().min(2);
            let handlers = rest[split..].join(" ");
            let device: Vec<&str> = handlers.split(", ").filter(|d| !d.is_empty()).map(str::trim).collect();
            let device = if device.is_empty() { ParseValue::Null } else { device.into() };
            (rest[..split].join(" "), device)
        } else {
            (rest.join(" "), ParseValue::Null)
        };

        rows.push(record! {
            "irq" => irq,
            "cpu_num" => cpu_num,
            "interrupts" => values,
            "type" => ParseValue::non_empty(&kind),
            "device" => device,
        });
    }
    Ok(to_values(rows))
}

/// `start-end : device` lines shared by `iomem` and `ioports`.
fn address_ranges(text: &str, _raw: bool) -> Result<ParseValue, JcError> {
    let mut rows = Vec::new();
    for line in data_lines(text) {
        let (range, device) = line
            .split_once(" : ")
            .ok_or_else(|| JcError::parse(format!("Unexpected address range: {line}")))?;
        let (start, end) = range
            .trim()
            .split_once('-')
            .ok_or_else(|| JcError::parse(format!("Unexpected address range: {line}")))?;
        rows.push(record! { "start" => start, "end" => end, "device" => device.trim() });
    }
    Ok(to_values(rows))
}

const RANGE_SCHEMA: &str = r#"
    [
      {
        "start":            string,
        "end":              string,
        "device":           string
      }
    ]
"#;

proc_file!(IomemParser, "proc_iomem", "/proc/iomem", list(), RANGE_SCHEMA, address_ranges);

proc_file!(IoportsParser, "proc_ioports", "/proc/ioports", list(), RANGE_SCHEMA, address_ranges);

proc_file!(
    MtrrParser,
    "proc_mtrr",
    "/proc/mtrr",
    list(),
    r#"
    [
      {
        "register":         string,
        "base":             string,
        "base_mb":          integer,
        "size":             integer,    # MB
        "count":            integer,
        "type":             string
      }
    ]
"#,
    mtrr
);

static MTRR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<register>reg\d+): base=(?P<base>\S+) \(\s*(?P<base_mb>\d+)MB\), size=\s*(?P<size>\d+)MB, count=(?P<count>\d+): (?P<type>.+)$",
    )
    .expect("static regex must compile")
});

fn mtrr(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows = Vec::new();
    for line in data_lines(text) {
        let caps = MTRR
            .captures(line.trim())
            .ok_or_else(|| JcError::parse(format!("Unexpected mtrr line: {line}")))?;
        rows.push(record! {
            "register" => &caps["register"],
            "base" => &caps["base"],
            "base_mb" => scalar(&caps["base_mb"], raw),
            "size" => scalar(&caps["size"], raw),
            "count" => scalar(&caps["count"], raw),
            "type" => &caps["type"],
        });
    }
    Ok(to_values(rows))
}

proc_file!(
    PartitionsParser,
    "proc_partitions",
    "/proc/partitions",
    list(),
    r#"
    [
      {
        "major":            integer,
        "minor":            integer,
        "num_blocks":       integer,
        "name":             string
      }
    ]
"#,
    partitions
);

fn partitions(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows = header_table(&text.replacen("#blocks", "num_blocks", 1));
    if !raw {
        for row in &mut rows {
            for key in ["major", "minor", "num_blocks"] {
                row.update(key, |v| v.as_str().map_or_else(|| v.clone(), |s| scalar(s, false)));
            }
        }
    }
    Ok(to_values(rows))
}

proc_file!(
    SoftirqsParser,
    "proc_softirqs",
    "/proc/softirqs",
    list(),
    r#"
    [
      {
        "counter":          string,
        "CPU<number>":      integer
      }
    ]
"#,
    softirqs
);

fn softirqs(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let lines = data_lines(text);
    let Some((header, body)) = lines.split_first() else {
        return Ok(list());
    };
    let cpus: Vec<&str> = header.split_whitespace().collect();

    let mut rows = Vec::new();
    for line in body {
        let (counter, counts) = line
            .split_once(':')
            .ok_or_else(|| JcError::parse(format!("Unexpected softirq line: {line}")))?;
        let mut row = record! { "counter" => counter.trim() };
        for (cpu, count) in cpus.iter().zip(counts.split_whitespace()) {
            row.insert(*cpu, scalar(count, raw));
        }
        rows.push(row);
    }
    Ok(to_values(rows))
}

proc_file!(
    DriverRtcParser,
    "proc_driver_rtc",
    "/proc/driver/rtc",
    map(),
    r#"
    {
      "rtc_time":                   string,
      "rtc_date":                   string,
      "alrm_time":                  string,
      "alrm_date":                  string,
      "alarm_IRQ":                  boolean,
      "alrm_pending":               boolean,
      "update IRQ enabled":         boolean,
      "periodic IRQ enabled":       boolean,
      "periodic IRQ frequency":     integer,
      "max user IRQ frequency":     integer,
      "24hr":                       boolean,
      "periodic_IRQ":               boolean,
      "update_IRQ":                 boolean,
      "HPET_emulated":              boolean,
      "BCD":                        boolean,
      "DST_enable":                 boolean,
      "periodic_freq":              integer,
      "batt_status":                string
    }
"#,
    driver_rtc
);

fn driver_rtc(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut out = pairs(text, ':');
    if !raw {
        for (_, v) in out.iter_mut() {
            if let Some(s) = v.as_str() {
                *v = match s {
                    "yes" | "no" => flag(s, false),
                    _ => scalar(s, false),
                };
            }
        }
    }
    Ok(out.into())
}
