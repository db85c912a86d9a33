//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of email-parse.
//
// email-parse is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// email-parse is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for
// more details.
//
// You should have received a copy of the GNU General Public License along with
// email-parse. If not, see <http://www.gnu.org/licenses/>.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use structopt::StructOpt;

use crate::encode::{
    CborEncoder, DebugEncoder, Encoder, JsonEncoder, MsgPackEncoder,
};
use crate::parser::{ParseOutcome, Parser};
use crate::support::config::ParserConfig;
use crate::support::exit::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Debug,
    Json,
    MsgPack,
    Cbor,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "debug" => Ok(OutputFormat::Debug),
            "json" => Ok(OutputFormat::Json),
            "msgpack" => Ok(OutputFormat::MsgPack),
            "cbor" => Ok(OutputFormat::Cbor),
            _ => Err(format!("Unknown format '{}'", s)),
        }
    }
}

/// Parse an RFC 5322 email message and print what was found in it.
#[derive(StructOpt, Debug)]
#[structopt(name = "parse-email", max_term_width = 80)]
struct Options {
    /// The message to parse.
    #[structopt(short, long, parse(from_os_str))]
    file: PathBuf,

    /// The output format.
    #[structopt(
        short = "m",
        long,
        default_value = "debug",
        possible_values = &["debug", "json", "msgpack", "cbor"]
    )]
    format: OutputFormat,

    /// Write output to this file instead of standard output.
    #[structopt(short, long, parse(from_os_str))]
    outfile: Option<PathBuf>,

    /// Print the diagnostic log of the parse to standard error.
    #[structopt(short, long)]
    verbose: bool,

    /// A TOML file of parser settings.
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// A log4rs configuration file. By default, warnings and errors are
    /// written to standard error.
    #[structopt(long, parse(from_os_str))]
    log_config: Option<PathBuf>,
}

pub fn main() {
    // Clap exits with status 1 for help if we use the more concise API
    let options = Options::from_clap(&match Options::clap().get_matches_safe()
    {
        Ok(matches) => matches,
        Err(
            e @ clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            },
        )
        | Err(
            e @ clap::Error {
                kind: clap::ErrorKind::VersionDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            EX_OK.exit()
        }
        Err(e) => {
            eprintln!("{}", e.message);
            EX_USAGE.exit()
        }
    });

    if let Err(e) = init_logging(options.log_config.as_deref()) {
        eprintln!("Failed to initialise logging: {}", e);
        EX_USAGE.exit();
    }

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    run(&options, &mut stdout).exit();
}

fn init_logging(log_config: Option<&Path>) -> Result<(), String> {
    if let Some(log_config) = log_config {
        return log4rs::init_file(
            log_config,
            log4rs::file::Deserializers::new(),
        )
        .map_err(|e| e.to_string());
    }

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(
            "{d(%H:%M:%S%.3f)} [{l}][{t}] {m}{n}",
        )))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn))
        .map_err(|e| e.to_string())?;
    log4rs::init_config(config)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

fn run(options: &Options, stdout: &mut dyn Write) -> Exit {
    if !options.file.is_file() {
        eprintln!("'{}' is not a regular file", options.file.display());
        return EX_USAGE;
    }

    let config = match options.config {
        None => ParserConfig::default(),
        Some(ref path) => {
            match fs::read(path)
                .map_err(|e| e.to_string())
                .and_then(|data| {
                    ParserConfig::from_toml(&data).map_err(|e| e.to_string())
                }) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error in config file '{}': {}", path.display(), e);
                    return EX_USAGE;
                }
            }
        }
    };

    let outcome = match fs::File::open(&options.file) {
        Ok(file) => Parser::new(config).parse_to_outcome(io::BufReader::new(file)),
        Err(e) => {
            eprintln!("Error opening '{}': {}", options.file.display(), e);
            return EX_USAGE;
        }
    };

    if options.verbose {
        for line in &outcome.diagnostic_log {
            eprintln!("{}", line);
        }
    }

    match write_outcome(options, &outcome, stdout) {
        Ok(exit) => exit,
        Err(e) => {
            eprintln!("Error writing output: {}", e);
            EX_PARSE_FAILED
        }
    }
}

fn write_outcome(
    options: &Options,
    outcome: &ParseOutcome,
    stdout: &mut dyn Write,
) -> Result<Exit, crate::support::error::Error> {
    let message = match outcome.result {
        Ok(ref message) => message,
        Err(ref e) => {
            writeln!(stdout, "There was a problem parsing the message")?;
            writeln!(stdout, "Context: {}", outcome.context_id)?;
            for line in &outcome.diagnostic_log {
                writeln!(stdout, "{}", line)?;
            }
            writeln!(stdout, "Error: {}", e)?;
            return Ok(EX_PARSE_FAILED);
        }
    };

    let encoder: &dyn Encoder = match options.format {
        OutputFormat::Debug => &DebugEncoder,
        OutputFormat::Json => &JsonEncoder,
        OutputFormat::MsgPack => &MsgPackEncoder,
        OutputFormat::Cbor => &CborEncoder,
    };

    match options.outfile {
        Some(ref path) => {
            let mut file = io::BufWriter::new(fs::File::create(path)?);
            encoder.encode(message, &mut file)?;
            file.flush()?;
        }
        None => {
            encoder.encode(message, stdout)?;
            stdout.flush()?;
        }
    }

    Ok(EX_OK)
}
