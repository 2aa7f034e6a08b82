mod args;
mod magic;
mod output;

use anyhow::{bail, Result};
use args::Options;
use jc::{Input, ParserInfo, ParserRegistry};
use output::{About, Printer, RunMeta};
use std::io::{self, BufWriter, IsTerminal, Read};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit status for library and usage errors; a failed magic run adds the
/// command's own exit code.
const ERROR_EXIT: i32 = 100;

const LOG_ENV: &str = "JC_LOG";

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(io::stderr().is_terminal())
                .with_target(false)
                .without_time(),
        )
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => fail(&e, 0),
    }
}

fn run() -> Result<ExitCode> {
    let registry = jc::registry();
    let infos: Vec<ParserInfo> = registry.descriptors().cloned().collect();
    let mut cmd = args::command(&infos);
    let matches = match cmd.try_get_matches_from_mut(std::env::args_os()) {
        Ok(matches) => matches,
        Err(e) => {
            eprint!("{}", e.render());
            return Ok(status(ERROR_EXIT));
        }
    };
    let opts = Options::from_matches(&matches, &infos);
    debug!(?opts, "Parsed command line");

    if opts.version {
        println!("jc version {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }
    if opts.about {
        let mut printer = Printer::new(io::stdout().lock(), opts.pretty, false);
        printer.print(&About::collect())?;
        return Ok(ExitCode::SUCCESS);
    }
    if opts.help {
        match &opts.parser {
            Some(name) => print_parser_help(name)?,
            None => println!("{}", cmd.render_help()),
        }
        return Ok(ExitCode::SUCCESS);
    }

    if !opts.command.is_empty() {
        return magic_mode(registry, &opts);
    }
    pipe_mode(&opts)?;
    Ok(ExitCode::SUCCESS)
}

fn print_parser_help(name: &str) -> Result<()> {
    let info = jc::parser_info(name, true)?;
    println!("Help on {}: {}", info.argument, info.description);
    if let Some(docs) = &info.documentation {
        println!("{docs}");
    }
    Ok(())
}

fn pipe_mode(opts: &Options) -> Result<()> {
    let Some(name) = &opts.parser else {
        bail!("Missing or incorrect arguments. Use \"jc -h\" for help.");
    };
    let stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("Missing piped data. Use \"jc -h\" for help.");
    }

    let handle = jc::get_parser(name)?;
    let input = if handle.is_streaming() {
        Input::from_reader(stdin.lock())
    } else {
        let mut data = Vec::new();
        stdin.lock().read_to_end(&mut data)?;
        if handle.info().binary_input_allowed {
            Input::Bytes(data)
        } else {
            Input::Text(String::from_utf8_lossy(&data).into_owned())
        }
    };

    let output = handle.parse(input, opts.parse_options())?;
    let meta = opts.meta_out.then(|| RunMeta::new(handle.name()));
    let mut printer = Printer::new(BufWriter::new(io::stdout().lock()), opts.pretty, opts.unbuffer);
    output::emit(output, &mut printer, meta.as_ref())
}

fn magic_mode(registry: &ParserRegistry, opts: &Options) -> Result<ExitCode> {
    let run = magic::run(registry, &opts.command, opts.parser.as_deref())?;
    let handle = registry.resolve(&run.parser)?;

    let input = if handle.is_streaming() {
        Input::lines_of(&run.stdout)
    } else {
        Input::from(run.stdout.as_str())
    };
    let meta = opts
        .meta_out
        .then(|| RunMeta::new(handle.name()).with_magic(&run.command, run.exit_code));

    let result = handle
        .parse(input, opts.parse_options())
        .map_err(anyhow::Error::from)
        .and_then(|output| {
            let mut printer = Printer::new(BufWriter::new(io::stdout().lock()), opts.pretty, opts.unbuffer);
            output::emit(output, &mut printer, meta.as_ref())
        });
    match result {
        Ok(()) => Ok(status(run.exit_code)),
        Err(e) => Ok(fail(&e, run.exit_code)),
    }
}

fn fail(e: &anyhow::Error, command_exit: i32) -> ExitCode {
    eprintln!("jc:  Error - {e:#}");
    status(ERROR_EXIT + command_exit)
}

fn status(code: i32) -> ExitCode {
    ExitCode::from(exit_value(code))
}

fn exit_value(code: i32) -> u8 {
    code.clamp(0, 255) as u8
}
