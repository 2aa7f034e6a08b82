//! Per-process `/proc/<pid>/*` files.

use super::{int_or_keep, list, map, pairs, scalar, to_values};
use crate::record;
use crate::types::JcError;
use crate::utils::{convert_to_int, data_lines};
use crate::value::{Map, ParseValue};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Integer, or a wide unsigned integer for values past `i64::MAX`.
fn number(s: &str, raw: bool) -> ParseValue {
    match scalar(s, raw) {
        ParseValue::String(text) if !raw => match text.parse::<u128>() {
            Ok(n) => ParseValue::from(n),
            Err(_) => ParseValue::String(text),
        },
        other => other,
    }
}

/// `key:value` tokens into a map; a bare `key:` takes the next token as its value.
fn token_pairs(text: &str, raw: bool) -> Map {
    let mut out = Map::new();
    let mut tokens = text.split_whitespace();
    while let Some(token) = tokens.next() {
        let (key, value) = match token.split_once(':') {
            Some((key, "")) => (key, tokens.next().unwrap_or_default()),
            Some(pair) => pair,
            None => continue,
        };
        out.insert(key, scalar(value, raw));
    }
    out
}

proc_file!(
    FdinfoParser,
    "proc_pid_fdinfo",
    "/proc/<pid>/fdinfo/<fd>",
    map(),
    r#"
    {
      "pos":                integer,
      "flags":              string,
      "mnt_id":             integer,
      "ino":                integer,
      "lock":               string,
      "eventfd-count":      integer,
      "tfd": [
        {
          "tfd":            integer,
          "events":         string,
          "data":           string
        }
      ],
      "inotify": [
        {
          "wd":             integer,
          "ino":            string,
          "sdev":           string,
          "mask":           string,
          "ignored_mask":   string
        }
      ],
      "fanotify": [
        {
          "flags":          string,
          "event-flags":    string
        }
      ]
    }
"#,
    fdinfo
);

const FD_LISTS: &[&str] = &["inotify", "fanotify", "tfd"];

fn fdinfo(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut out = Map::new();
    for line in data_lines(text) {
        let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let list_key = FD_LISTS
            .iter()
            .find(|k| head == **k || head.strip_suffix(':') == Some(**k));

        if let Some(key) = list_key {
            let entry = token_pairs(if head.ends_with(':') { line } else { rest }, raw);
            match out.get_mut(key) {
                Some(ParseValue::List(entries)) => entries.push(entry.into()),
                _ => {
                    out.insert(*key, vec![entry]);
                }
            }
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            let value = value.trim();
            let value = if raw || key == "flags" {
                ParseValue::from(value)
            } else {
                scalar(value, false)
            };
            out.insert(key.trim(), value);
        }
    }
    Ok(out.into())
}

proc_file!(
    IoParser,
    "proc_pid_io",
    "/proc/<pid>/io",
    map(),
    r#"
    {
      "rchar":                  integer,
      "wchar":                  integer,
      "syscr":                  integer,
      "syscw":                  integer,
      "read_bytes":             integer,
      "write_bytes":            integer,
      "cancelled_write_bytes":  integer
    }
"#,
    io
);

fn io(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut out = pairs(text, ':');
    if !raw {
        for (_, v) in out.iter_mut() {
            *v = int_or_keep(v);
        }
    }
    Ok(out.into())
}

proc_file!(
    MountinfoParser,
    "proc_pid_mountinfo",
    "/proc/<pid>/mountinfo",
    list(),
    r#"
    [
      {
        "mount_id":             integer,
        "parent_id":            integer,
        "maj":                  integer,
        "min":                  integer,
        "root":                 string,
        "mount_point":          string,
        "mount_options": [
                                string
        ],
        "optional_fields": {
          "shared":             integer,
          "master":             integer,
          "propagate_from":     integer,
          "unbindable":         boolean
        },
        "fs_type":              string,
        "mount_source":         string,
        "super_options": [
                                string
        ],
        "super_options_fields": {
          "<key>":              string
        }
      }
    ]
"#,
    mountinfo
);

fn mountinfo(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows = Vec::new();
    for line in data_lines(text) {
        let (mount, fs) = line
            .split_once(" - ")
            .ok_or_else(|| JcError::parse(format!("Unexpected mountinfo line: {line}")))?;
        let mount: Vec<&str> = mount.split_whitespace().collect();
        let fs: Vec<&str> = fs.split_whitespace().collect();
        if mount.len() < 6 || fs.len() < 2 {
            return Err(JcError::parse(format!("Unexpected mountinfo line: {line}")));
        }
        let (maj, min) = mount[2].split_once(':').unwrap_or((mount[2], ""));

        let optional: Map = mount[6..]
            .iter()
            .map(|field| match field.split_once(':') {
                Some((k, v)) => (k, scalar(v, raw)),
                None => (*field, ParseValue::Bool(true)),
            })
            .collect();

        let mut super_options = Vec::new();
        let mut super_fields = Map::new();
        for option in fs.get(2).copied().unwrap_or_default().split(',').filter(|o| !o.is_empty()) {
            match option.split_once('=') {
                Some((k, v)) => {
                    super_fields.insert(k, v);
                }
                None => super_options.push(option),
            }
        }

        let mut row = record! {
            "mount_id" => scalar(mount[0], raw),
            "parent_id" => scalar(mount[1], raw),
            "maj" => scalar(maj, raw),
            "min" => scalar(min, raw),
            "root" => mount[3],
            "mount_point" => mount[4],
            "mount_options" => mount[5].split(',').collect::<Vec<_>>(),
            "optional_fields" => optional,
            "fs_type" => fs[0],
            "mount_source" => fs[1],
            "super_options" => super_options,
        };
        if !super_fields.is_empty() {
            row.insert("super_options_fields", super_fields);
        }
        rows.push(row);
    }
    Ok(to_values(rows))
}

proc_file!(
    NumaMapsParser,
    "proc_pid_numa_maps",
    "/proc/<pid>/numa_maps",
    list(),
    r#"
    [
      {
        "address":              string,
        "policy":               string,
        "<key>":                string/integer,
        "N<node>":              integer,
        "options": [
                                string  # words that are not key=value pairs
        ]
      }
    ]
"#,
    numa_maps
);

fn numa_maps(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows = Vec::new();
    for line in data_lines(text) {
        let mut tokens = line.split_whitespace();
        let mut row = record! { "address" => tokens.next(), "policy" => tokens.next() };
        let mut options = Vec::new();
        for token in tokens {
            match token.split_once('=') {
                Some(("file", path)) => {
                    row.insert("file", path);
                }
                Some((k, v)) => {
                    row.insert(k, scalar(v, raw));
                }
                None => options.push(token),
            }
        }
        if !options.is_empty() {
            row.insert("options", options);
        }
        rows.push(row);
    }
    Ok(to_values(rows))
}

proc_file!(
    SmapsParser,
    "proc_pid_smaps",
    "/proc/<pid>/smaps",
    list(),
    r#"
    [
      {
        "start":                string,
        "end":                  string,
        "perms": [
                                string  # read, write, execute, shared, private
        ],
        "offset":               string,
        "maj":                  string,
        "min":                  string,
        "inode":                integer,
        "pathname":             string,
        "Size":                 integer,    # kB
        "<key>":                integer,    # kB
        "VmFlags": [
                                string
        ]
      }
    ]
"#,
    smaps
);

static MAPPING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<start>[0-9a-f]+)-(?P<end>[0-9a-f]+) (?P<perms>[rwxsp\-]{4}) (?P<offset>[0-9a-f]+) (?P<maj>[0-9a-f]+):(?P<min>[0-9a-f]+) (?P<inode>\d+)\s*(?P<pathname>.*)$",
    )
    .expect("static regex must compile")
});

fn permission(c: char) -> Option<&'static str> {
    match c {
        'r' => Some("read"),
        'w' => Some("write"),
        'x' => Some("execute"),
        's' => Some("shared"),
        'p' => Some("private"),
        _ => None,
    }
}

/// The address range line shared by `maps` and `smaps`.
fn mapping_record(caps: &Captures<'_>, raw: bool) -> Map {
    let perms = if raw {
        ParseValue::from(&caps["perms"])
    } else {
        caps["perms"].chars().filter_map(permission).collect::<Vec<_>>().into()
    };
    record! {
        "start" => &caps["start"],
        "end" => &caps["end"],
        "perms" => perms,
        "offset" => &caps["offset"],
        "maj" => &caps["maj"],
        "min" => &caps["min"],
        "inode" => scalar(&caps["inode"], raw),
        "pathname" => ParseValue::non_empty(&caps["pathname"]),
    }
}

proc_file!(
    MapsParser,
    "proc_pid_maps",
    "/proc/<pid>/maps",
    list(),
    r#"
    [
      {
        "start":                string,
        "end":                  string,
        "perms": [
                                string  # read, write, execute, shared, private
        ],
        "offset":               string,
        "maj":                  string,
        "min":                  string,
        "inode":                integer,
        "pathname":             string
      }
    ]
"#,
    maps
);

fn maps(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let rows = data_lines(text)
        .into_iter()
        .map(|line| {
            MAPPING
                .captures(line)
                .map(|caps| mapping_record(&caps, raw))
                .ok_or_else(|| JcError::parse(format!("Unexpected maps line: {line}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(to_values(rows))
}

fn smaps(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut rows: Vec<Map> = Vec::new();
    for line in data_lines(text) {
        if let Some(caps) = MAPPING.captures(line) {
            rows.push(mapping_record(&caps, raw));
            continue;
        }

        let row = rows
            .last_mut()
            .ok_or_else(|| JcError::parse(format!("Attribute outside of a mapping: {line}")))?;
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| JcError::parse(format!("Unexpected smaps line: {line}")))?;
        let value = if key == "VmFlags" {
            ParseValue::from(value.split_whitespace().collect::<Vec<_>>())
        } else if raw {
            ParseValue::from(value.trim())
        } else {
            convert_to_int(value).into()
        };
        row.insert(key, value);
    }
    Ok(to_values(rows))
}

proc_file!(
    StatParser,
    "proc_pid_stat",
    "/proc/<pid>/stat",
    map(),
    r#"
    {
      "pid":                    integer,
      "comm":                   string,
      "state":                  string,
      "state_pretty":           string,
      "ppid":                   integer,
      "pgrp":                   integer,
      "session":                integer,
      "tty_nr":                 integer,
      "tpg_id":                 integer,
      "flags":                  integer,
      "minflt":                 integer,
      "cminflt":                integer,
      "majflt":                 integer,
      "cmajflt":                integer,
      "utime":                  integer,
      "stime":                  integer,
      "cutime":                 integer,
      "cstime":                 integer,
      "priority":               integer,
      "nice":                   integer,
      "num_threads":            integer,
      "itrealvalue":            integer,
      "starttime":              integer,
      "vsize":                  integer,
      "rss":                    integer,
      "rsslim":                 integer,
      "startcode":              integer,
      "endcode":                integer,
      "startstack":             integer,
      "kstkeep":                integer,
      "kstkeip":                integer,
      "signal":                 integer,
      "blocked":                integer,
      "sigignore":              integer,
      "sigcatch":               integer,
      "wchan":                  integer,
      "nswap":                  integer,
      "cnswap":                 integer,
      "exit_signal":            integer,
      "processor":              integer,
      "rt_priority":            integer,
      "policy":                 integer,
      "delayacct_blkio_ticks":  integer,
      "guest_time":             integer,
      "cguest_time":            integer,
      "start_data":             integer,
      "end_data":               integer,
      "start_brk":              integer,
      "arg_start":              integer,
      "arg_end":                integer,
      "env_start":              integer,
      "env_end":                integer,
      "exit_code":              integer
    }

`state_pretty` is only present in processed output.
"#,
    stat
);

const STAT_FIELDS: &[&str] = &[
    "ppid",
    "pgrp",
    "session",
    "tty_nr",
    "tpg_id",
    "flags",
    "minflt",
    "cminflt",
    "majflt",
    "cmajflt",
    "utime",
    "stime",
    "cutime",
    "cstime",
    "priority",
    "nice",
    "num_threads",
    "itrealvalue",
    "starttime",
    "vsize",
    "rss",
    "rsslim",
    "startcode",
    "endcode",
    "startstack",
    "kstkeep",
    "kstkeip",
    "signal",
    "blocked",
    "sigignore",
    "sigcatch",
    "wchan",
    "nswap",
    "cnswap",
    "exit_signal",
    "processor",
    "rt_priority",
    "policy",
    "delayacct_blkio_ticks",
    "guest_time",
    "cguest_time",
    "start_data",
    "end_data",
    "start_brk",
    "arg_start",
    "arg_end",
    "env_start",
    "env_end",
    "exit_code",
];

fn state_pretty(state: &str) -> Option<&'static str> {
    Some(match state {
        "R" => "Running",
        "S" => "Sleeping in an interruptible wait",
        "D" => "Waiting in uninterruptible disk sleep",
        "Z" => "Zombie",
        "T" => "Stopped (on a signal)",
        "t" => "Tracing stop",
        "W" => "Paging",
        "X" | "x" => "Dead",
        "K" => "Wakekill",
        "P" => "Parked",
        "I" => "Idle",
        _ => return None,
    })
}

fn stat(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let text = text.trim();
    let (open, close) = text
        .find('(')
        .zip(text.rfind(')'))
        .filter(|(open, close)| open < close)
        .ok_or_else(|| JcError::parse("Process name not found"))?;
    let pid = &text[..open];
    let comm = &text[open + 1..close];
    let mut tokens = text[close + 1..].split_whitespace();
    let state = tokens
        .next()
        .ok_or_else(|| JcError::parse("Process state not found"))?;

    let mut out = record! { "pid" => scalar(pid, raw), "comm" => comm, "state" => state };
    if !raw {
        out.insert("state_pretty", state_pretty(state));
    }
    for (key, value) in STAT_FIELDS.iter().zip(tokens) {
        out.insert(*key, number(value, raw));
    }
    Ok(out.into())
}

proc_file!(
    StatmParser,
    "proc_pid_statm",
    "/proc/<pid>/statm",
    map(),
    r#"
    {
      "size":               integer,
      "resident":           integer,
      "shared":             integer,
      "text":               integer,
      "lib":                integer,
      "data":               integer,
      "dt":                 integer
    }
"#,
    statm
);

fn statm(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let keys = ["size", "resident", "shared", "text", "lib", "data", "dt"];
    let out: Map = keys
        .into_iter()
        .zip(text.split_whitespace())
        .map(|(k, v)| (k, scalar(v, raw)))
        .collect();
    Ok(out.into())
}

proc_file!(
    StatusParser,
    "proc_pid_status",
    "/proc/<pid>/status",
    map(),
    r#"
    {
      "name":                       string,
      "umask":                      string,
      "state":                      string,
      "state_pretty":               string,
      "tgid":                       integer,
      "ngid":                       integer,
      "pid":                        integer,
      "ppid":                       integer,
      "tracerpid":                  integer,
      "uid": [
                                    integer
      ],
      "gid": [
                                    integer
      ],
      "fdsize":                     integer,
      "groups": [
                                    integer
      ],
      "vmpeak":                     integer,    # kB
      "<key>":                      string/integer
    }
"#,
    status
);

const ID_LISTS: &[&str] = &["uid", "gid", "groups", "nstgid", "nspid", "nspgid", "nssid"];

fn status(text: &str, raw: bool) -> Result<ParseValue, JcError> {
    let mut out = Map::new();
    for line in data_lines(text) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        if key == "state" {
            let (code, pretty) = value.split_once(' ').unwrap_or((value, ""));
            out.insert("state", code);
            out.insert(
                "state_pretty",
                ParseValue::non_empty(pretty.trim_start_matches('(').trim_end_matches(')')),
            );
        } else if ID_LISTS.contains(&key.as_str()) {
            let ids: Vec<ParseValue> = value.split_whitespace().map(|id| scalar(id, raw)).collect();
            out.insert(key, ids);
        } else if raw || key == "umask" {
            out.insert(key, value);
        } else if let Some(kb) = value.strip_suffix(" kB") {
            out.insert(key, scalar(kb, false));
        } else {
            out.insert(key, scalar(value, false));
        }
    }
    Ok(out.into())
}
