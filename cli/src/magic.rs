//! Magic syntax: `jc <command> [args...]` runs the command and parses its
//! output, `jc /proc/<path>` reads the file directly.

use anyhow::{bail, Context, Result};
use jc::ParserRegistry;
use std::fs;
use std::process::{Command, Stdio};
use tracing::debug;

const PROC_PREFIX: &str = "/proc/";

/// Captured output of a magic invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicRun {
    pub parser: String,
    pub command: Vec<String>,
    pub stdout: String,
    pub exit_code: i32,
}

/// Pick the parser for `argv`: an explicit parser flag wins, `/proc` paths
/// go to the `proc` dispatcher, anything else is matched by magic command.
pub fn resolve(registry: &ParserRegistry, argv: &[String], explicit: Option<&str>) -> Result<String> {
    if let Some(name) = explicit {
        return Ok(name.to_string());
    }
    if let Some(handle) = registry.resolve_by_magic(argv) {
        return Ok(handle.name().to_string());
    }
    bail!(
        "\"{}\" cannot be used with magic syntax. Use \"jc -h\" for help.",
        argv.join(" ")
    )
}

pub fn run(registry: &ParserRegistry, argv: &[String], explicit: Option<&str>) -> Result<MagicRun> {
    let Some(program) = argv.first() else {
        bail!("No command given");
    };
    let parser = resolve(registry, argv, explicit)?;

    if program.starts_with(PROC_PREFIX) {
        debug!("Reading {} directly", program);
        let stdout = read_proc_files(argv)?;
        return Ok(MagicRun {
            parser,
            command: argv.to_vec(),
            stdout,
            exit_code: 0,
        });
    }

    debug!("Running magic command: {}", argv.join(" "));
    let output = Command::new(program)
        .args(&argv[1..])
        .stdin(Stdio::inherit())
        .stderr(Stdio::inherit())
        .output()
        .with_context(|| format!("\"{program}\" command could not be run"))?;

    Ok(MagicRun {
        parser,
        command: argv.to_vec(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        // Killed by a signal
        exit_code: output.status.code().unwrap_or(1),
    })
}

/// Several `/proc` paths are concatenated in order.
fn read_proc_files(paths: &[String]) -> Result<String> {
    let mut text = String::new();
    for path in paths {
        let content =
            fs::read_to_string(path).with_context(|| format!("\"{path}\" file could not be opened"))?;
        text.push_str(&content);
    }
    Ok(text)
}
