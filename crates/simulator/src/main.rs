//! CLI entry point for the rotor cipher simulator.

use std::env;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use enigma_core as _;
#[cfg(test)]
use rstest as _;
use simulator::config::MachineConfig;
use simulator::session::{Session, SessionError, SessionEvent, SessionSink};
#[cfg(test)]
use tempfile as _;

const USAGE_TEXT: &str = "\
Usage: enigma <config> [input] [output] [options]

Arguments:
  <config>  Machine description: alphabet, slot and pawl counts, rotors
  [input]   Setting lines and messages (default: stdin)
  [output]  Converted messages (default: stdout)

Options:
  -v, --verbose  Report each applied setting line to stderr
  -h, --help     Show this help message

Examples:
  enigma default.conf message.in
  enigma default.conf message.in message.out --verbose
";

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    config: PathBuf,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    verbose: bool,
}

#[derive(Debug)]
enum ParseResult {
    Run(RunArgs),
    Help,
}

fn parse_args(args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut verbose = false;

    for arg in args {
        if arg == "--help" || arg == "-h" {
            return Ok(ParseResult::Help);
        }

        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') && arg != "-" {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if paths.len() == 3 {
            return Err("too many paths provided".to_string());
        }
        paths.push(PathBuf::from(arg));
    }

    let mut paths = paths.into_iter();
    let config = paths
        .next()
        .ok_or_else(|| "missing config path".to_string())?;
    let stdio = |path: PathBuf| (path != Path::new("-")).then_some(path);
    Ok(ParseResult::Run(RunArgs {
        config,
        input: paths.next().and_then(stdio),
        output: paths.next().and_then(stdio),
        verbose,
    }))
}

/// Writes session events to stderr.
struct StderrSink {
    verbose: bool,
}

impl SessionSink for StderrSink {
    fn on_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::SettingApplied {
                line,
                rotors,
                settings,
                plugboard,
            } if self.verbose => {
                eprintln!(
                    "line {line}: rotors {} at {settings}, plugboard {}",
                    rotors.join(" "),
                    plugboard.as_deref().unwrap_or("none")
                );
            }
            SessionEvent::PlugboardNotInvolution { line, plugboard } => {
                eprintln!("warning: line {line}: plugboard {plugboard} does not only swap pairs");
            }
            _ => {}
        }
    }
}

fn display_input(args: &RunArgs) -> String {
    args.input
        .as_deref()
        .map_or_else(|| "<stdin>".to_string(), |path| path.display().to_string())
}

fn run(args: &RunArgs) -> Result<(), i32> {
    let text = fs::read_to_string(&args.config).map_err(|e| {
        eprintln!("error: failed to read {}: {e}", args.config.display());
        1
    })?;
    let config = MachineConfig::parse(&text).map_err(|e| {
        eprintln!("{}:{}: error: {}", args.config.display(), e.line, e.kind);
        1
    })?;

    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path).map_err(|e| {
            eprintln!("error: failed to open {}: {e}", path.display());
            1
        })?)),
        None => Box::new(io::stdin().lock()),
    };
    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).map_err(|e| {
            eprintln!("error: failed to create {}: {e}", path.display());
            1
        })?)),
        None => Box::new(io::stdout().lock()),
    };

    let mut sink = StderrSink {
        verbose: args.verbose,
    };
    Session::new(&config)
        .run(input, output, &mut sink)
        .map_err(|e| {
            report_session_error(&display_input(args), &e);
            1
        })
}

fn report_session_error(input: &str, e: &SessionError) {
    if e.line == 0 {
        eprintln!("error: {}", e.kind);
    } else {
        eprintln!("{input}:{}: error: {}", e.line, e.kind);
    }
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Run(args)) => match run(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{USAGE_TEXT}");
            1
        }
    };

    std::process::exit(exit_code);
}
