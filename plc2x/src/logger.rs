//! Configures logging for the command line.
use std::{fs::File, io::Write, path::PathBuf};

use env_logger::Builder;
use log::{trace, LevelFilter};
use time::OffsetDateTime;

/// Maps the count of `-v` flags onto a level.
pub fn level_for(verbosity: u8) -> Result<LevelFilter, String> {
    match verbosity {
        0 => Ok(LevelFilter::Error),
        1 => Ok(LevelFilter::Warn),
        2 => Ok(LevelFilter::Info),
        3 => Ok(LevelFilter::Debug),
        4 => Ok(LevelFilter::Trace),
        _ => Err(format!(
            "Verbosity can be given at most 4 times, got {}",
            verbosity
        )),
    }
}

/// Configures the log with the specified verbosity, writing to the log file
/// when one is given and to stderr otherwise.
pub fn configure(verbosity: u8, log_file: Option<PathBuf>) -> Result<(), String> {
    let log_level = level_for(verbosity)?;

    let mut builder = Builder::new();

    if let Some(log_location) = log_file {
        let file = File::create(&log_location).map_err(|e| {
            format!(
                "Unable to create log file {}. {}",
                log_location.display(),
                e
            )
        })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{} {:?}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                OffsetDateTime::now_utc(),
                record.args()
            )
        })
        .filter_level(log_level)
        .try_init()
        .map_err(|e| format!("Unable to configure logging. {}", e))?;

    trace!("Logger verbosity {log_level}");
    Ok(())
}
