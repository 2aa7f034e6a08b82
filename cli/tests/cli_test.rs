//! Drives the built `jc` binary end to end.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

const PING: &str = "PING 127.0.0.1 (127.0.0.1) 56(84) bytes of data.
64 bytes from 127.0.0.1: icmp_seq=1 ttl=64 time=0.037 ms
64 bytes from 127.0.0.1: icmp_seq=2 ttl=64 time=0.050 ms
64 bytes from 127.0.0.1: icmp_seq=3 ttl=64 time=0.049 ms

--- 127.0.0.1 ping statistics ---
3 packets transmitted, 3 received, 0% packet loss, time 2049ms
rtt min/avg/max/mdev = 0.037/0.045/0.050/0.005 ms
";

const BROKEN_PING: &str = "PING 127.0.0.1 (127.0.0.1) 56(84) bytes of data.
64 bytes from 127.0.0.1: icmp_seq=1 ttl=64 time=0.037 ms
not a ping line
64 bytes from 127.0.0.1: icmp_seq=2 ttl=64 time=0.050 ms
";

const FREE: &str = "              total        used        free      shared  buff/cache   available
Mem:        3861340      222708     3042512        1208      596120     3398688
Swap:       2097148           0     2097148
";

/// The binary with user plugins pointed at an empty location.
fn jc() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_jc"));
    cmd.env("JC_PLUGIN_DIR", "/nonexistent/jc-test-plugins");
    cmd
}

fn json_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_pipe_mode_converts_stdin() {
    jc().arg("--proc-loadavg")
        .write_stdin("0.00 0.01 0.03 2/111 2039\n")
        .assert()
        .success()
        .stdout("{\"load_1m\":0.0,\"load_5m\":0.01,\"load_15m\":0.03,\"running\":2,\"available\":111,\"last_pid\":2039}\n");
}

#[test]
fn test_raw_output_keeps_strings() {
    let out = jc().args(["-r", "--free"]).write_stdin(FREE).output().unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value[0]["total"], "3861340");

    let out = jc().arg("--free").write_stdin(FREE).output().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value[0]["total"], 3861340);
}

#[test]
fn test_pretty_output() {
    jc().args(["-p", "--proc-loadavg"])
        .write_stdin("0.00 0.01 0.03 2/111 2039\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{\n  \"load_1m\": 0.0,"));
}

#[test]
fn test_meta_out_tags_each_row() {
    let out = jc().args(["-M", "--free"]).write_stdin(FREE).output().unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    for row in value.as_array().unwrap() {
        assert_eq!(row["_jc_meta"]["parser"], "free");
        assert!(row["_jc_meta"]["timestamp"].as_f64().unwrap() > 0.0);
        assert!(row["_jc_meta"].get("magic_command").is_none());
    }
}

#[test]
fn test_streaming_parser_writes_json_lines() {
    let out = jc().args(["-u", "--ping-s"]).write_stdin(PING).output().unwrap();
    assert!(out.status.success());
    let records = json_lines(&out.stdout);
    assert_eq!(records.len(), 4);
    assert_eq!(records[0]["type"], "reply");
    assert_eq!(records[3]["type"], "summary");
}

#[test]
fn test_streaming_error_stops_output() {
    let out = jc().arg("--ping-s").write_stdin(BROKEN_PING).output().unwrap();
    assert_eq!(out.status.code(), Some(100));
    assert_eq!(json_lines(&out.stdout).len(), 1);
    assert!(String::from_utf8_lossy(&out.stderr).contains("-qq"));
}

#[test]
fn test_double_quiet_turns_errors_into_records() {
    let out = jc().args(["-qq", "--ping-s"]).write_stdin(BROKEN_PING).output().unwrap();
    assert!(out.status.success());
    let records = json_lines(&out.stdout);
    assert_eq!(records.len(), 3);
    assert_eq!(records[1]["_jc_meta"]["success"], false);
    assert_eq!(records[1]["_jc_meta"]["line"], "not a ping line");
    assert_eq!(records[2]["_jc_meta"]["success"], true);
}

#[test]
fn test_deprecated_parser_warns_once_on_stderr() {
    let out = jc().arg("--iso-datetime").write_stdin("2022-07-20T14:52:45Z").output().unwrap();
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert_eq!(stderr.matches("deprecated").count(), 1, "{stderr}");
    assert!(!stderr.contains('\u{1b}'), "{stderr}");
}

#[test]
fn test_quiet_silences_deprecation_warning() {
    let out = jc()
        .args(["-q", "--iso-datetime"])
        .write_stdin("2022-07-20T14:52:45Z")
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(!String::from_utf8_lossy(&out.stderr).contains("deprecated"));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["year"], 2022);
}

#[test]
fn test_missing_parser_is_an_error() {
    jc().write_stdin("anything")
        .assert()
        .code(100)
        .stderr(predicate::str::contains("Missing or incorrect arguments"));
}

#[test]
fn test_unknown_flag_exits_with_error_code() {
    jc().arg("--not-a-parser").write_stdin("anything").assert().code(100);
}

#[test]
fn test_parse_failure_exits_with_error_code() {
    jc().arg("--proc")
        .write_stdin("this is not a proc file\n")
        .assert()
        .code(100)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_version_and_about() {
    jc().arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));

    let out = jc().arg("-a").output().unwrap();
    assert!(out.status.success());
    let about: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(about["name"], "jc");
    let parsers = about["parsers"].as_array().unwrap();
    assert_eq!(about["parser_count"].as_u64().unwrap() as usize, parsers.len());
    assert!(parsers.iter().any(|p| p["name"] == "ping_s"));
    assert!(parsers.iter().all(|p| p.get("documentation").is_none()));
}

#[test]
fn test_parser_help_prints_documentation() {
    jc().args(["--free", "-h"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Help on --free").and(predicate::str::contains("buff_cache")));

    jc().arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("--ip-route"));
}

#[test]
fn test_unknown_magic_command() {
    jc().args(["definitely-not-a-jc-command", "--flag"])
        .assert()
        .code(100)
        .stderr(predicate::str::contains("cannot be used with magic syntax"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_magic_reads_proc_files() {
    let out = jc().args(["-M", "/proc/loadavg"]).output().unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(value["load_1m"].is_number());
    assert_eq!(value["_jc_meta"]["parser"], "proc");
    assert_eq!(value["_jc_meta"]["magic_command"][0], "/proc/loadavg");
    assert_eq!(value["_jc_meta"]["magic_command_exit"], 0);
}

#[test]
fn test_plugin_directory_adds_a_parser_flag() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("settings.json"),
        r#"{
            "description": "key=value settings",
            "format": {"type": "key_value"},
            "integers": ["port"]
        }"#,
    )
    .unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_jc"))
        .env("JC_PLUGIN_DIR", dir.path())
        .arg("--settings")
        .write_stdin("host=example.org\nport=8080\n")
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["host"], "example.org");
    assert_eq!(value["port"], 8080);
}
