//! Measurement daemon: u-blox receiver events in, measurement messages out,
//! both as JSON lines.
#[macro_use]
extern crate log;

use std::{
    fs::File,
    io::{stdin, stdout, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use clap::{Arg, ArgAction, ColorChoice, Command};
use env_logger::{Builder, Target};

use gnss_measurements::prelude::{
    Config, Dispatcher, Driver, Error, JsonLinesPublisher, JsonLinesTransport,
};

fn cli() -> Command {
    Command::new("gnss-measd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("u-blox measurement dispatch and correction daemon")
        .arg_required_else_help(false)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("cfg")
                .short('c')
                .long("cfg")
                .action(ArgAction::Set)
                .required(false)
                .help("Load JSON configuration file (Optional)"),
        )
        .arg(
            Arg::new("correct")
                .long("correct")
                .action(ArgAction::SetTrue)
                .help("Enable coarse fix and measurement corrections"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .action(ArgAction::Set)
                .help("Read receiver events from this file, instead of stdin"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .action(ArgAction::Set)
                .help("Write measurement messages to this file, instead of stdout"),
        )
}

pub fn main() -> Result<(), Error> {
    // logs go to stderr, stdout is the data stream
    let mut builder = Builder::from_default_env();
    builder
        .target(Target::Stderr)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let matches = cli().get_matches();

    let mut cfg = match matches.get_one::<String>("cfg") {
        Some(path) => Config::from_file(Path::new(path))?,
        None => Config::default(),
    };

    if matches.get_flag("correct") {
        cfg.correct = true;
    }

    info!("{:#?}", cfg);

    let reader: Box<dyn BufRead> = match matches.get_one::<String>("input") {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(stdin())),
    };

    let writer: Box<dyn Write> = match matches.get_one::<String>("output") {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(stdout()),
    };

    let mut driver = Driver::new(
        Dispatcher::new(cfg),
        JsonLinesTransport::new(reader),
        JsonLinesPublisher::new(writer),
    );

    let published = driver.run()?;
    info!("{} messages published", published);
    Ok(())
}
