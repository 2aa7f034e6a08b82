//! `/proc` file parsers.
//!
//! `proc` identifies a `/proc` file by its content and re-enters dispatch
//! with the matching hidden `proc_*` parser. Signatures are tried in order;
//! a more specific signature must precede any less specific one that would
//! also match its files.

use crate::base_parser::{Entrypoint, ParseContext, Parser};
use crate::descriptor::{ParserInfo, Platform, Tag};
use crate::table::simple_table;
use crate::types::{Input, JcError, ParserData};
use crate::utils::{data_lines, has_data};
use crate::value::{Map, ParseValue};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Declare a hidden `/proc` file parser backed by `$parse(text, raw)`.
///
/// `$empty` is the value returned for blank input.
macro_rules! proc_file {
    ($ty:ident, $name:literal, $file:literal, $empty:expr, $schema:expr, $parse:path) => {
        pub struct $ty;

        impl $crate::base_parser::Parser for $ty {
            fn info(&self) -> $crate::descriptor::ParserInfo {
                super::file_info($name, $file, $schema)
            }

            fn parse(
                &self,
                data: $crate::types::ParserData,
                ctx: &$crate::base_parser::ParseContext<'_>,
            ) -> Result<$crate::value::ParseValue, $crate::types::JcError> {
                let text = data.text();
                if !$crate::utils::has_data(&text) {
                    return Ok($empty);
                }
                $parse(&text, ctx.raw())
            }
        }
    };
}

pub mod devices;
pub mod kernel;
pub mod net;
pub mod pid;

const DOCS: &str = r#"
Identifies the `/proc` file from its content and hands it to the matching
`proc_*` parser. Every `proc_*` parser can also be selected directly.

Usage (cli):

    $ cat /proc/meminfo | jc --proc

    or

    $ jc /proc/meminfo

    or

    $ cat /proc/meminfo | jc --proc-meminfo

The schema depends on the detected file; see the individual `proc_*`
parser documentation.
"#;

/// Info shared by the `proc_*` parsers; the usage block is generated.
fn file_info(name: &str, file: &str, schema: &str) -> ParserInfo {
    let argument = crate::descriptor::argument_for(name);
    let docs = format!(
        "Usage (cli):\n\n    $ cat {file} | jc --proc\n\n    or\n\n    $ jc {file}\n\n    or\n\n    $ cat {file} | jc {argument}\n\nSchema:\n{schema}"
    );
    ParserInfo::new(name, &format!("`{file}` file parser"))
        .version("1.0")
        .compatible(&[Platform::Linux])
        .tags(&[Tag::File])
        .hidden()
        .docs(&docs)
}

fn list() -> ParseValue {
    ParseValue::List(Vec::new())
}

fn map() -> ParseValue {
    ParseValue::Map(Map::new())
}

macro_rules! sig {
    ($re:expr, $name:literal) => {
        (
            Regex::new($re).expect("static regex must compile"),
            $name,
        )
    };
}

/// Detection signatures in priority order.
static SIGNATURES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        sig!(r"^Node \d+, zone\s+\w+\s+(?:\d+\s+){11}", "proc_buddyinfo"),
        sig!(r"^\w+\s+[\-WUR]{3} \([ECBpba ]+\)\s+\d+:\d+", "proc_consoles"),
        sig!(r"(?s)^processor\s*: \d+.*(?i:bogomips)\s*: \d+\.\d\d", "proc_cpuinfo"),
        sig!(r"^name\s+:.*\ndriver\s+:.*\nmodule\s+:.*\n", "proc_crypto"),
        sig!(r"^Character devices:\n\s+\d+ .*\n", "proc_devices"),
        sig!(r"^\s*\d+\s+\d+\s\w+\s(?:\d+\s){10,16}\d+(?:\n|\z)", "proc_diskstats"),
        sig!(r"^(?:(?:nodev\t|\t)\w+\n){3}", "proc_filesystems"),
        sig!(r"^\s+(?:CPU\d+[ \t]*)+\n\s*\d+:\s+\d+", "proc_interrupts"),
        sig!(r"^00000000-[0-9a-f]{8} : .*\n\s*[0-9a-f]{8}-[0-9a-f]{8} : ", "proc_iomem"),
        sig!(r"^0000-[0-9a-f]{4} : .*\n\s*0000-[0-9a-f]{4} : ", "proc_ioports"),
        sig!(r"^\d+\.\d\d \d+\.\d\d \d+\.\d\d \d+/\d+ \d+\n?\z", "proc_loadavg"),
        sig!(r"^\d+: (?:POSIX|FLOCK|OFDLCK)\s+(?:ADVISORY|MANDATORY)\s+(?:READ|WRITE) ", "proc_locks"),
        sig!(r"^MemTotal:.*\nMemFree:.*\nMemAvailable:.*\n", "proc_meminfo"),
        sig!(r"^\w+ \d+ \d+ (?:-|\w+,).*0x[0-9a-f]{16}(?:\n|\z)", "proc_modules"),
        sig!(r"^reg\d+: base=0x[0-9a-f]+ \(", "proc_mtrr"),
        sig!(r"^Page block order:\s+\d+\nPages per block:\s+\d+\n\n", "proc_pagetypeinfo"),
        sig!(r"^major minor\s+#blocks\s+name\n\n\s+\d+\s+\d+\s+\d+ \w+", "proc_partitions"),
        sig!(r"^slabinfo - version: \d+\.\d+\n", "proc_slabinfo"),
        sig!(r"^\s+(?:CPU\d+\s+)+\n\s+HI:\s+\d", "proc_softirqs"),
        sig!(r"(?s)^cpu\s+(?: \d+){7,10}.*intr ", "proc_stat"),
        sig!(r"^Filename\s+Type\s+Size\s+Used\s+Priority\n", "proc_swaps"),
        sig!(r"^\d+\.\d\d \d+\.\d\d\n?\z", "proc_uptime"),
        sig!(r"^.+\sversion\s[^\n]+\n?\z", "proc_version"),
        sig!(r"^0x[0-9a-f]{16}-0x[0-9a-f]{16}\s+\d+ \w+\+\w+/\w+ ", "proc_vmallocinfo"),
        sig!(r"^nr_free_pages \d+\n", "proc_vmstat"),
        sig!(r"^Node \d+, zone\s+\w+\n", "proc_zoneinfo"),
        sig!(r"^rtc_time\s*: .*\nrtc_date\s*: .*\nalrm_time\s*: .*\n", "proc_driver_rtc"),
        sig!(r"^IP address\s+HW type\s+Flags\s+HW address\s+Mask\s+Device\n", "proc_net_arp"),
        sig!(r"^Inter-\|\s+Receive\s+\|\s+Transmit\n", "proc_net_dev"),
        sig!(r"^[0-9a-f]{32} [0-9a-f]{2} [0-9a-f]{2} [0-9a-f]{2} [0-9a-f]{2}\s+\w+", "proc_net_if_inet6"),
        sig!(r"^Idx\s+Device\s+:\s+Count\s+Querier\s+Group\s+Users\s+Timer\s+Reporter\n", "proc_net_igmp"),
        sig!(r"^\d+\s+\w+\s+[0-9a-f]{32}\s+\d+\s+[0-9A-F]{8}\s+\d+", "proc_net_igmp6"),
        sig!(
            r"^[0-9a-f]{32} [0-9a-f]{2} [0-9a-f]{32} [0-9a-f]{2} [0-9a-f]{32} (?:[0-9a-f]{8} ){4}\s+\w+",
            "proc_net_ipv6_route"
        ),
        sig!(r"^sk\s+Eth Pid\s+Groups\s+Rmem\s+Wmem", "proc_net_netlink"),
        sig!(r"^TcpExt: SyncookiesSent SyncookiesRecv SyncookiesFailed", "proc_net_netstat"),
        sig!(r"^sk\s+RefCnt Type Proto\s+Iface R Rmem\s+User\s+Inode\n", "proc_net_packet"),
        sig!(r"^protocol\s+size\s+sockets\s+memory\s+press\s+maxhdr\s+slab\s+module\s+cl co di", "proc_net_protocols"),
        sig!(
            r"^Iface\s+Destination\s+Gateway\s+Flags\s+RefCnt\s+Use\s+Metric\s+Mask\s+MTU\s+Window\s+IRTT",
            "proc_net_route"
        ),
        sig!(r"^Num\s+RefCount\s+Protocol\s+Flags\s+Type\s+St\s+Inode\s+Path", "proc_net_unix"),
        sig!(r"^pos:\s+\d+\nflags:\s+\d+\nmnt_id:\s+\d+\n", "proc_pid_fdinfo"),
        sig!(r"^rchar: \d+\nwchar: \d+\nsyscr: \d+\n", "proc_pid_io"),
        sig!(r"^\d+ \d+ \d+:\d+ /.+\n", "proc_pid_mountinfo"),
        sig!(r"^[a-f0-9]{12} default [^\n]+\n", "proc_pid_numa_maps"),
        sig!(
            r"^[0-9a-f]{12}-[0-9a-f]{12} [rwxsp\-]{4} [0-9a-f]{8} [0-9a-f]{2}:[0-9a-f]{2} \d+ [^\n]+\nSize:\s+\d+ \wB\n",
            "proc_pid_smaps"
        ),
        sig!(r"(?s)^\d+ \(.+\) \S -?\d+ -?\d+ -?\d+ -?\d+ -?\d+ (?:-?\d+ ){43}-?\d+\n?\z", "proc_pid_stat"),
        sig!(r"^\d+ \d+ \d+\s\d+\s\d+\s\d+\s\d+\n?\z", "proc_pid_statm"),
        sig!(r"^Name:\t.+\nUmask:\t\d+\nState:\t.+\nTgid:\t\d+\n", "proc_pid_status"),
        sig!(r"^(?:\d+\s+\S+\s+\d+\s+\d+\s+[0-9a-f]{12}[ \t]*(?:\n|\z))+\z", "proc_net_dev_mcast"),
        sig!(
            r"^\s*sl\s+local_address\s+rem(?:ote)?_address\s+st\s+tx_queue\s+rx_queue\s+tr\s+tm->when\s+retrnsmt\s+uid\s+timeout\s+inode",
            "proc_net_tcp"
        ),
        sig!(
            r"^[0-9a-f]{8,16}-[0-9a-f]{8,16} [rwxsp\-]{4} [0-9a-f]{8} [0-9a-f]{2,3}:[0-9a-f]{2} \d+[^\n]*(?:\n[0-9a-f]{8,16}-[0-9a-f]{8,16} |\n?\z)",
            "proc_pid_maps"
        ),
    ]
});

/// Name of the `proc_*` parser whose signature matches `text` first.
pub fn detect(text: &str) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, name)| *name)
}

pub struct ProcParser;

impl Parser for ProcParser {
    fn info(&self) -> ParserInfo {
        ParserInfo::new("proc", "`/proc/` file parser")
            .version("1.1")
            .compatible(&[Platform::Linux])
            .tags(&[Tag::File])
            .magic("/proc/")
            .docs(DOCS)
    }

    fn parse(&self, data: ParserData, ctx: &ParseContext<'_>) -> Result<ParseValue, JcError> {
        let text = data.text();
        if !has_data(&text) {
            return Ok(map());
        }
        let name = detect(&text).ok_or_else(|| JcError::parse("Proc file could not be identified."))?;
        debug!("Detected {} content", name);

        let output = ctx.registry.parse(name, Input::Text(text.into_owned()), ctx.options)?;
        output
            .into_value()
            .ok_or_else(|| JcError::parse(format!("{name} did not produce a value")))
    }
}

/// Every hidden `proc_*` parser, in signature order.
pub fn sub_parsers() -> Vec<Entrypoint> {
    crate::register_parsers![
        kernel::BuddyinfoParser,
        devices::ConsolesParser,
        kernel::CpuinfoParser,
        kernel::CryptoParser,
        devices::DevicesParser,
        devices::DiskstatsParser,
        kernel::FilesystemsParser,
        devices::InterruptsParser,
        devices::IomemParser,
        devices::IoportsParser,
        kernel::LoadavgParser,
        kernel::LocksParser,
        kernel::MeminfoParser,
        kernel::ModulesParser,
        devices::MtrrParser,
        kernel::PagetypeinfoParser,
        devices::PartitionsParser,
        kernel::SlabinfoParser,
        devices::SoftirqsParser,
        kernel::StatParser,
        kernel::SwapsParser,
        kernel::UptimeParser,
        kernel::VersionParser,
        kernel::VmallocinfoParser,
        kernel::VmstatParser,
        kernel::ZoneinfoParser,
        devices::DriverRtcParser,
        net::ArpParser,
        net::DevParser,
        net::IfInet6Parser,
        net::IgmpParser,
        net::Igmp6Parser,
        net::Ipv6RouteParser,
        net::NetlinkParser,
        net::NetstatParser,
        net::PacketParser,
        net::ProtocolsParser,
        net::RouteParser,
        net::UnixParser,
        pid::FdinfoParser,
        pid::IoParser,
        pid::MountinfoParser,
        pid::NumaMapsParser,
        pid::SmapsParser,
        pid::StatParser,
        pid::StatmParser,
        pid::StatusParser,
        net::DevMcastParser,
        net::TcpParser,
        pid::MapsParser,
    ]
}

/// `key<sep>value` lines into a map; lines without the separator are skipped.
fn pairs(text: &str, sep: char) -> Map {
    data_lines(text)
        .into_iter()
        .filter_map(|line| line.split_once(sep))
        .map(|(k, v)| (k.trim(), ParseValue::from(v.trim())))
        .collect()
}

/// Header line lowercased (with `tab`-separated headers split on whitespace)
/// then parsed with [`simple_table`].
fn header_table(text: &str) -> Vec<Map> {
    let mut lines: Vec<String> = data_lines(text).into_iter().map(str::to_string).collect();
    if let Some(header) = lines.first_mut() {
        *header = header.to_lowercase();
    }
    simple_table(&lines)
}

/// Blank-line separated blocks of non-blank lines.
fn blocks(text: &str) -> Vec<Vec<&str>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// String value converted to an integer when it is one, else kept.
fn int_or_keep(value: &ParseValue) -> ParseValue {
    match value.as_str().map(|s| s.trim().parse::<i64>()) {
        Some(Ok(n)) => ParseValue::Int(n),
        _ => value.clone(),
    }
}

/// Raw string, or an integer / float when processing and the text is one.
fn scalar(s: &str, raw: bool) -> ParseValue {
    let s = s.trim();
    if !raw {
        if let Ok(n) = s.parse::<i64>() {
            return ParseValue::Int(n);
        }
        if s.contains('.') {
            if let Ok(f) = s.parse::<f64>() {
                return ParseValue::Float(f);
            }
        }
    }
    ParseValue::String(s.to_string())
}

/// `yes`/`no` style flag, kept as text in raw mode.
fn flag(s: &str, raw: bool) -> ParseValue {
    let s = s.trim();
    match (raw, s) {
        (false, "yes" | "y") => ParseValue::Bool(true),
        (false, "no" | "n") => ParseValue::Bool(false),
        _ => ParseValue::String(s.to_string()),
    }
}

fn to_values(rows: Vec<Map>) -> ParseValue {
    ParseValue::List(rows.into_iter().map(ParseValue::Map).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry_parser::ParserRegistry;
    use crate::types::ParseOptions;

    /// One representative file per signature, in signature order.
    pub(super) const SAMPLES: &[(&str, &str)] = &[
        (
            "proc_buddyinfo",
            "Node 0, zone      DMA      0      0      0      1      1      1      1      0      1      1      3 \n\
             Node 0, zone    DMA32    107     71     27     41     21     10      6      4      7      5    545 \n",
        ),
        ("proc_consoles", "tty0                 -WU (EC p  )    4:7\nttyS0                -W- (E  p  )    4:64\n"),
        (
            "proc_cpuinfo",
            "processor\t: 0\nvendor_id\t: GenuineIntel\ncpu family\t: 6\nmodel name\t: Intel(R) Core(TM) i7\n\
             cpu MHz\t\t: 2592.000\nfpu\t\t: yes\nflags\t\t: fpu vme de\nbogomips\t: 5184.00\n\n\
             processor\t: 1\nvendor_id\t: GenuineIntel\ncpu MHz\t\t: 2592.000\nfpu\t\t: yes\nflags\t\t: fpu vme\nbogomips\t: 5184.00\n",
        ),
        (
            "proc_crypto",
            "name         : ecdh\ndriver       : ecdh-generic\nmodule       : ecdh_generic\npriority     : 100\n\
             refcnt       : 1\nselftest     : passed\ninternal     : no\ntype         : kpp\n\n\
             name         : blake2b-512\ndriver       : blake2b-512-generic\nmodule       : blake2b_generic\n\
             priority     : 100\nrefcnt       : 1\nselftest     : passed\ninternal     : no\ntype         : shash\n\
             blocksize    : 128\ndigestsize   : 64\n",
        ),
        (
            "proc_devices",
            "Character devices:\n  1 mem\n  4 /dev/vc/0\n  4 tty\n  5 /dev/tty\n\nBlock devices:\n  7 loop\n  8 sd\n",
        ),
        (
            "proc_diskstats",
            "   7       0 loop0 48 0 718 19 0 0 0 0 0 28 19 0 0 0 0 0 0\n   8       0 sda 4857 1744 419736 3178 2413 2622 112840 2282 0 6172 6197 0 0 0 0 471 736\n",
        ),
        ("proc_filesystems", "nodev\tsysfs\nnodev\ttmpfs\nnodev\tproc\n\text3\n\text4\n"),
        (
            "proc_interrupts",
            "           CPU0       CPU1       \n  0:         18          0   IO-APIC    2-edge      timer\n\
             \x20 1:          0          9   IO-APIC    1-edge      i8042\nNMI:          0          0   Non-maskable interrupts\n",
        ),
        (
            "proc_iomem",
            "00000000-00000fff : Reserved\n00001000-0009fbff : System RAM\n  000a0000-000bffff : PCI Bus 0000:00\n",
        ),
        ("proc_ioports", "0000-0cf7 : PCI Bus 0000:00\n  0000-001f : dma1\n  0020-0021 : pic1\n"),
        ("proc_loadavg", "0.00 0.01 0.03 2/111 2039\n"),
        (
            "proc_locks",
            "1: POSIX  ADVISORY  WRITE 836 00:19:487 0 EOF\n2: FLOCK  ADVISORY  WRITE 652 00:19:543 0 EOF\n",
        ),
        ("proc_meminfo", "MemTotal:        3997272 kB\nMemFree:         2760316 kB\nMemAvailable:    3386876 kB\nHugePages_Total:       0\n"),
        (
            "proc_modules",
            "binfmt_misc 24576 1 - Live 0x0000000000000000\nvsock_loopback 16384 0 - Live 0x0000000000000000\n\
             vmw_vsock_virtio_transport_common 36864 1 vsock_loopback, Live 0x0000000000000000\n",
        ),
        ("proc_mtrr", "reg00: base=0x000000000 (    0MB), size= 2048MB, count=1: write-back\nreg01: base=0x080000000 ( 2048MB), size= 1024MB, count=1: write-back\n"),
        (
            "proc_pagetypeinfo",
            "Page block order: 9\nPages per block:  512\n\n\
             Free pages count per migrate type at order       0      1      2\n\
             Node    0, zone      DMA, type    Unmovable      0      0      0\n\
             Node    0, zone      DMA, type      Movable      0      0      1\n\n\
             Number of blocks type     Unmovable      Movable  Reclaimable\n\
             Node 0, zone      DMA            1            7            0\n",
        ),
        ("proc_partitions", "major minor  #blocks  name\n\n   7        0      56896 loop0\n   8        0   20971520 sda\n"),
        (
            "proc_slabinfo",
            "slabinfo - version: 2.1\n\
             # name            <active_objs> <num_objs> <objsize> <objperslab> <pagesperslab> : tunables <limit> <batchcount> <sharedfactor> : slabdata <active_slabs> <num_slabs> <sharedavail>\n\
             ext4_groupinfo_4k    224    224    144   28    1 : tunables    0    0    0 : slabdata      8      8      0\n",
        ),
        (
            "proc_softirqs",
            "                    CPU0       CPU1       \n          HI:          1          0\n       TIMER:     114542      96232\n",
        ),
        (
            "proc_stat",
            "cpu  6002 152 8398 3444436 448 0 1174 0 0 0\ncpu0 2784 137 4367 1732802 225 0 221 0 0 0\n\
             intr 2496709 18 73 0\nctxt 20379016\nbtime 1650637346\nprocesses 29539\nprocs_running 1\n\
             procs_blocked 0\nsoftirq 3112327 0 1193519 2 41 54 0 41 906 0 1917764\n",
        ),
        (
            "proc_swaps",
            "Filename\t\t\t\tType\t\tSize\t\tUsed\t\tPriority\n/swap.img                               file\t\t2097148\t\t0\t\t-2\n",
        ),
        ("proc_uptime", "46901.13 354862.43\n"),
        (
            "proc_version",
            "Linux version 5.8.0-63-generic (buildd@lcy01-amd64-028) (gcc (Ubuntu 10.3.0-1ubuntu1~20.10) 10.3.0, GNU ld (GNU Binutils for Ubuntu) 2.35.1) #71-Ubuntu SMP Tue Jul 13 15:59:12 UTC 2021\n",
        ),
        (
            "proc_vmallocinfo",
            "0xffffb3c1c0000000-0xffffb3c1c0005000   20480 map_irq_stack+0x93/0xe0 pages=4 vmalloc N0=4\n\
             0xffffb3c1c0005000-0xffffb3c1c0007000    8192 acpi_os_map_iomem+0x1ac/0x1c0 phys=0x00000000bfeff000 ioremap\n",
        ),
        ("proc_vmstat", "nr_free_pages 615337\nnr_zone_inactive_anon 39\nnr_zone_active_anon 34838\n"),
        (
            "proc_zoneinfo",
            "Node 0, zone      DMA\n  per-node stats\n      nr_inactive_anon 39\n      nr_active_anon 34838\n\
             \x20 pages free     3832\n        min      68\n        low      85\n        high     102\n\
             \x20       spanned  4095\n        present  3997\n        managed  3976\n\
             \x20       protection: (0, 2871, 3795)\n      nr_free_pages 3832\n      nr_zone_inactive_anon 0\n\
             \x20 pagesets\n    cpu: 0\n              count: 0\n              high:  0\n              batch: 1\n\
             \x20 vm stats threshold: 4\n  node_unreclaimable:  0\n  start_pfn:           1\n",
        ),
        (
            "proc_driver_rtc",
            "rtc_time\t: 16:09:21\nrtc_date\t: 2022-09-03\nalrm_time\t: 00:00:00\nalrm_date\t: 2022-09-03\n\
             alarm_IRQ\t: no\nperiodic_IRQ\t: no\nperiodic_IRQ_frequency\t: 1024\nmax_user_IRQ_frequency\t: 64\n24hr\t\t: yes\n",
        ),
        (
            "proc_net_arp",
            "IP address       HW type     Flags       HW address            Mask     Device\n\
             192.168.71.2     0x1         0x2         00:50:56:f3:2f:ad     *        ens33\n",
        ),
        (
            "proc_net_dev",
            "Inter-|   Receive                                                |  Transmit\n \
             face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n\
             \x20   lo:    13796     172    0    0    0     0          0         0    13796     172    0    0    0     0       0          0\n",
        ),
        (
            "proc_net_if_inet6",
            "00000000000000000000000000000001 01 80 10 80       lo\nfe800000000000000a0027fffe3c5e5e 02 40 20 80   enp0s3\n",
        ),
        (
            "proc_net_igmp",
            "Idx\tDevice    :  Count Querier\tGroup    Users Timer\tReporter\n\
             1\tlo        :     1      V3\n\t\t\t\t010000E0     1 0:00000000\t\t0\n\
             2\tenp0s3    :     1      V3\n\t\t\t\t010000E0     1 0:00000000\t\t0\n",
        ),
        (
            "proc_net_igmp6",
            "1    lo              ff020000000000000000000000000001     1 0000000C 0\n\
             2    enp0s3          ff0200000000000000000001ff3c5e5e     1 00000004 1\n",
        ),
        (
            "proc_net_ipv6_route",
            "00000000000000000000000000000001 80 00000000000000000000000000000000 00 00000000000000000000000000000000 00000100 00000001 00000000 00000001       lo\n",
        ),
        (
            "proc_net_netlink",
            "sk               Eth Pid        Groups   Rmem     Wmem     Dump  Locks    Drops    Inode\n\
             ffff88814d063800 0   0          00000000 0        0        0     2        0        7\n",
        ),
        (
            "proc_net_netstat",
            "TcpExt: SyncookiesSent SyncookiesRecv SyncookiesFailed EmbryonicRsts\nTcpExt: 0 0 0 1\n\
             IpExt: InNoRoutes InTruncatedPkts\nIpExt: 0 0\n",
        ),
        (
            "proc_net_packet",
            "sk       RefCnt Type Proto  Iface R Rmem   User   Inode\n\
             ffff9b61b56c1800 3      3    88cc   2     1 0      101    34754\n",
        ),
        (
            "proc_net_protocols",
            "protocol  size sockets  memory press maxhdr  slab module     cl co di ac io in de sh ss gs se re sp bi br ha uh gp em\n\
             PACKET    1344      2      -1   NI       0   no   kernel      n  n  n  n  n  n  n  n  n  n  n  n  n  n  n  n  n  n  n\n\
             UDPv6     1344      1       1   NI       0   yes  kernel      y  y  y  n  y  y  y  n  y  y  y  y  n  n  n  y  y  y  n\n",
        ),
        (
            "proc_net_route",
            "Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT                                                       \n\
             ens33\t00000000\t0247A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0                                                                               \n",
        ),
        (
            "proc_net_unix",
            "Num       RefCount Protocol Flags    Type St Inode Path\n\
             ffff8fca0ad7fc00: 00000002 00000000 00010000 0001 01 34302 /run/systemd/notify\n\
             ffff8fca0ad79000: 00000003 00000000 00000000 0001 03 34357\n",
        ),
        ("proc_pid_fdinfo", "pos:\t0\nflags:\t02004002\nmnt_id:\t9\nino:\t63107\n"),
        (
            "proc_pid_io",
            "rchar: 4699288382\nwchar: 2931802997\nsyscr: 661897\nsyscw: 890910\nread_bytes: 168468480\n\
             write_bytes: 27357184\ncancelled_write_bytes: 16883712\n",
        ),
        (
            "proc_pid_mountinfo",
            "24 30 0:22 / /sys rw,nosuid,nodev,noexec,relatime shared:7 - sysfs sysfs rw\n\
             25 30 0:23 / /proc rw,nosuid,nodev,noexec,relatime shared:14 - proc proc rw\n",
        ),
        (
            "proc_pid_numa_maps",
            "7f53b8d06000 default file=/usr/lib/libc.so.6 mapped=8 mapmax=2 N0=8 kernelpagesize_kB=4\n\
             7ffd1b23e000 default stack anon=3 dirty=3 N0=3 kernelpagesize_kB=4\n",
        ),
        (
            "proc_pid_smaps",
            "55a9e753c000-55a9e7570000 r--p 00000000 fd:00 798126                     /usr/lib/systemd/systemd\n\
             Size:                208 kB\nKernelPageSize:        4 kB\nRss:                 208 kB\n\
             VmFlags: rd mr mw me dw sd\n\
             7ffc9a9e5000-7ffc9a9e7000 r-xp 00000000 00:00 0                          [vdso]\n\
             Size:                  8 kB\nRss:                   4 kB\nVmFlags: rd ex mr mw me de sd\n",
        ),
        (
            "proc_pid_stat",
            "1 (systemd) S 0 1 1 0 -1 4194560 23478 350218 99 472 437 1195 5596 1553 20 0 1 0 8 \
             170385408 2842 18446744073709551615 94256479989760 94256481012689 140733993443920 0 0 0 \
             671173123 4096 1260 1 0 0 17 0 0 0 18 0 0 94256481414288 94256481616912 94256510763008 \
             140733993448201 140733993448212 140733993448212 140733993451495 0\n",
        ),
        ("proc_pid_statm", "42 30 25 1 0 11 0\n"),
        (
            "proc_pid_status",
            "Name:\tsystemd\nUmask:\t0000\nState:\tS (sleeping)\nTgid:\t1\nNgid:\t0\nPid:\t1\nPPid:\t0\n\
             Uid:\t0\t0\t0\t0\nGid:\t0\t0\t0\t0\nGroups:\t\nVmPeak:\t  167032 kB\nThreads:\t1\n",
        ),
        (
            "proc_net_dev_mcast",
            "2    enp0s3          1     0     01005e000001\n\
             2    enp0s3          1     0     333300000001\n\
             2    enp0s3          1     0     3333ff5a1ba3\n",
        ),
        (
            "proc_net_tcp",
            "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode\n   \
             0: 3500007F:0035 00000000:0000 0A 00000000:00000000 00:00000000 00000000   102        0 20170 1 0000000000000000 100 0 0 10 0\n   \
             1: 0F02000A:0016 0202000A:8B53 01 00000000:00000000 02:000AC99F 00000000     0        0 2388 4 0000000000000000 20 4 31 10 -1\n",
        ),
        (
            "proc_pid_maps",
            "55a9e753c000-55a9e7570000 r--p 00000000 fd:00 798126                     /usr/lib/systemd/systemd\n\
             55a9e7570000-55a9e763a000 r-xp 00034000 fd:00 798126                     /usr/lib/systemd/systemd\n\
             7ffc9a9c8000-7ffc9a9e9000 rw-p 00000000 00:00 0                          [stack]\n\
             7ffc9a9e5000-7ffc9a9e7000 r-xp 00000000 00:00 0\n",
        ),
    ];

    pub(super) fn sample(name: &str) -> &'static str {
        SAMPLES.iter().find(|(n, _)| *n == name).map(|(_, s)| *s).unwrap()
    }

    #[test]
    fn test_every_signature_routes_to_its_parser() {
        let order: Vec<&str> = SIGNATURES.iter().map(|(_, name)| *name).collect();
        let sampled: Vec<&str> = SAMPLES.iter().map(|(name, _)| *name).collect();
        assert_eq!(order, sampled);
        for (name, sample) in SAMPLES {
            assert_eq!(detect(sample), Some(*name), "sample for {name}");
        }
    }

    #[test]
    fn test_sub_parsers_follow_signature_order() {
        let names: Vec<String> = sub_parsers().iter().map(|e| e.info().name).collect();
        let order: Vec<&str> = SIGNATURES.iter().map(|(_, name)| *name).collect();
        assert_eq!(names, order);
    }

    #[test]
    fn test_every_sample_parses_through_proc() {
        let registry = ParserRegistry::new();
        for (name, sample) in SAMPLES {
            for options in [ParseOptions::quiet(), ParseOptions::raw().with_quiet(true)] {
                let value = registry
                    .parse("proc", Input::from(*sample), options)
                    .unwrap_or_else(|e| panic!("{name}: {e}"))
                    .into_value()
                    .unwrap();
                assert!(!value.is_empty_container(), "{name} produced no data");
            }
        }
    }

    #[test]
    fn test_version_routes_through_dispatch() {
        let registry = ParserRegistry::new();
        let value = registry
            .parse("proc", Input::from(sample("proc_version")), ParseOptions::quiet())
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(value.get("version"), Some(&ParseValue::from("5.8.0-63-generic")));
    }

    #[test]
    fn test_version_signature_wants_a_single_line() {
        assert_eq!(detect("Linux version 5.8.0 (gcc 10.3.0) #71 SMP\n"), Some("proc_version"));
        assert_eq!(detect("Linux version 5.8.0 (gcc 10.3.0) #71 SMP\nsecond line\n"), None);
    }

    #[test]
    fn test_unknown_and_empty_files() {
        let registry = ParserRegistry::new();
        let err = registry
            .parse("proc", Input::from("nothing to see here"), ParseOptions::quiet())
            .unwrap_err();
        assert!(err.is_parse_error());
        let empty = registry
            .parse("proc", Input::from(""), ParseOptions::quiet())
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(empty, ParseValue::Map(Map::new()));
    }

    #[test]
    fn test_hidden_parsers_return_empty_values() {
        let registry = ParserRegistry::new();
        for (name, _) in SAMPLES {
            let value = registry
                .parse(name, Input::from("  \n"), ParseOptions::quiet())
                .unwrap()
                .into_value()
                .unwrap();
            assert!(value.is_empty_container(), "{name}");
        }
    }
}
