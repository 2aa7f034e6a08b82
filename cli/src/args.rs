use clap::{Arg, ArgAction, ArgMatches, Command};
use jc::{ParseOptions, ParserInfo};
use tracing::debug;

/// Ids and long flags owned by the front-end itself. A plugin that picks
/// one of these names is still usable through the library, just not as a
/// CLI flag.
const RESERVED: &[&str] = &[
    "about", "help", "version", "raw", "quiet", "pretty", "unbuffer", "meta-out", "meta_out",
    "command",
];

/// Parsers that get a `--<argument>` flag.
pub fn flag_parsers(infos: &[ParserInfo]) -> impl Iterator<Item = &ParserInfo> {
    infos.iter().filter(|info| {
        let long = long_flag(info);
        let usable = !RESERVED.contains(&info.name.as_str()) && !RESERVED.contains(&long);
        if !usable {
            debug!("No CLI flag for parser {}: name is reserved", info.name);
        }
        usable
    })
}

fn long_flag(info: &ParserInfo) -> &str {
    info.argument.trim_start_matches("--")
}

pub fn command(infos: &[ParserInfo]) -> Command {
    let mut cmd = Command::new("jc")
        .about("JSON Convert: turns the output of CLI tools, file types and /proc files into JSON")
        .override_usage(
            "COMMAND | jc [OPTIONS] --PARSER\n       jc [OPTIONS] COMMAND [ARGS]...\n       jc [OPTIONS] /proc/<path>",
        )
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("about")
                .short('a')
                .long("about")
                .action(ArgAction::SetTrue)
                .help("Print library and parser metadata as JSON"),
        )
        .arg(
            Arg::new("help")
                .short('h')
                .long("help")
                .action(ArgAction::SetTrue)
                .help("Help (combine with a parser flag for parser documentation)"),
        )
        .arg(
            Arg::new("meta_out")
                .short('M')
                .long("meta-out")
                .action(ArgAction::SetTrue)
                .help("Add run metadata under _jc_meta"),
        )
        .arg(
            Arg::new("pretty")
                .short('p')
                .long("pretty")
                .action(ArgAction::SetTrue)
                .help("Pretty-print JSON output"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::Count)
                .help("Suppress warnings (-qq also ignores streaming parse errors)"),
        )
        .arg(
            Arg::new("raw")
                .short('r')
                .long("raw")
                .action(ArgAction::SetTrue)
                .help("Raw output, skipping type conversion"),
        )
        .arg(
            Arg::new("unbuffer")
                .short('u')
                .long("unbuffer")
                .action(ArgAction::SetTrue)
                .help("Flush output after every record"),
        )
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .action(ArgAction::SetTrue)
                .help("Print version"),
        );

    for info in flag_parsers(infos) {
        cmd = cmd.arg(
            Arg::new(info.name.clone())
                .long(long_flag(info).to_string())
                .action(ArgAction::SetTrue)
                .help(info.description.clone())
                .help_heading("Parsers")
                .hide(info.hidden),
        );
    }

    cmd.arg(
        Arg::new("command")
            .value_name("COMMAND")
            .num_args(1..)
            .trailing_var_arg(true)
            .help("Command to run (magic syntax) or /proc file to read"),
    )
}

/// Everything the front-end needs from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub parser: Option<String>,
    pub about: bool,
    pub help: bool,
    pub version: bool,
    pub meta_out: bool,
    pub pretty: bool,
    pub quiet: u8,
    pub raw: bool,
    pub unbuffer: bool,
    pub command: Vec<String>,
}

impl Options {
    /// The first parser flag wins when several are given.
    pub fn from_matches(matches: &ArgMatches, infos: &[ParserInfo]) -> Self {
        let parser = flag_parsers(infos)
            .find(|info| matches.get_flag(&info.name))
            .map(|info| info.name.clone());

        Self {
            parser,
            about: matches.get_flag("about"),
            help: matches.get_flag("help"),
            version: matches.get_flag("version"),
            meta_out: matches.get_flag("meta_out"),
            pretty: matches.get_flag("pretty"),
            quiet: matches.get_count("quiet"),
            raw: matches.get_flag("raw"),
            unbuffer: matches.get_flag("unbuffer"),
            command: matches
                .get_many::<String>("command")
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
        }
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::default()
            .with_raw(self.raw)
            .with_quiet(self.quiet > 0)
            .with_ignore_exceptions(self.quiet > 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infos() -> Vec<ParserInfo> {
        vec![
            ParserInfo::new("ip_route", "`ip route` command parser"),
            ParserInfo::new("ping_s", "`ping` streaming parser"),
            ParserInfo::new("raw", "plugin that collides with -r"),
        ]
    }

    fn options(argv: &[&str]) -> Options {
        let infos = infos();
        let matches = command(&infos).try_get_matches_from(argv).unwrap();
        Options::from_matches(&matches, &infos)
    }

    #[test]
    fn test_pipe_mode_flags() {
        let opts = options(&["jc", "-p", "-r", "--ip-route"]);
        assert_eq!(opts.parser.as_deref(), Some("ip_route"));
        assert!(opts.pretty && opts.raw);
        assert!(opts.command.is_empty());
        assert!(!opts.parse_options().quiet);
    }

    #[test]
    fn test_quiet_counts() {
        let opts = options(&["jc", "-qq", "--ping-s"]);
        assert_eq!(opts.quiet, 2);
        let parse = opts.parse_options();
        assert!(parse.quiet && parse.ignore_exceptions);
        assert!(!options(&["jc", "-q", "--ping-s"]).parse_options().ignore_exceptions);
    }

    #[test]
    fn test_magic_command_keeps_its_own_flags() {
        let opts = options(&["jc", "-p", "ip", "-4", "route", "-h"]);
        assert_eq!(opts.parser, None);
        assert!(opts.pretty);
        assert!(!opts.help);
        assert_eq!(opts.command, ["ip", "-4", "route", "-h"]);
    }

    #[test]
    fn test_reserved_plugin_names_get_no_flag() {
        let infos = infos();
        let names: Vec<&str> = flag_parsers(&infos).map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["ip_route", "ping_s"]);
        assert!(options(&["jc", "--raw"]).raw);
    }

    #[test]
    fn test_unknown_flag_is_an_error() {
        let infos = infos();
        assert!(command(&infos).try_get_matches_from(["jc", "--nope"]).is_err());
    }
}
