use std::{
    fs::File,
    io::{self, Write},
    path::Path,
};

use chrono::Local;
use env_logger::{Builder, Target, WriteStyle};
use log::{Level, LevelFilter};

/// Writes every byte to both sinks.
pub struct Tee<A: Write, B: Write> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> Tee<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.first.write_all(buf)?;
        self.second.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        self.second.flush()
    }
}

pub struct Logger;

impl Logger {
    /// Installs the global logger. The log file is truncated; every record
    /// also goes to stdout.
    pub fn init(level: LevelFilter, file: impl AsRef<Path>) -> io::Result<()> {
        let file = File::create(file)?;

        Builder::new()
            .filter(None, LevelFilter::Warn)
            .filter(Some("commandbot"), level)
            .filter(Some("serenity"), LevelFilter::Warn)
            .filter(Some("tracing"), LevelFilter::Warn)
            .parse_default_env()
            .target(Target::Pipe(Box::new(Tee::new(file, io::stdout()))))
            .write_style(WriteStyle::Never)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    line(&Local::now(), record.level(), record.args())
                )
            })
            .try_init()
            .map_err(io::Error::other)
    }
}

fn line(at: &chrono::DateTime<Local>, level: Level, message: impl std::fmt::Display) -> String {
    format!(
        "{} - {} - {message}",
        at.format("%Y-%m-%d %H:%M:%S,%3f"),
        level
    )
}
