//! # Error Types
//!
//! Resource failures that abort the operation that hit them. Malformed chart
//! lines are not errors: the parser reports them as [`Warning`]s and keeps going.
//!
//! - `ChartError` - a chart file could not be read or written
//! - `SinkError` - the output device could not be opened or talked to
//!
//! [`Warning`]: crate::parser::Warning

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    /// The chart file could not be opened or read.
    ///
    /// ```
    /// # use padchart::ChartError;
    /// let err = ChartError::Read {
    ///     path: "song.sht".into(),
    ///     source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
    /// };
    /// assert_eq!(err.to_string(), "reading song.sht: not found");
    /// ```
    #[error("reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The chart file could not be created or written.
    #[error("writing {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("no output device available")]
    NoDevice,

    #[error("device error: {0}")]
    Device(String),

    /// The device side hung up (audio thread gone, terminal closed).
    #[error("output device disconnected")]
    Disconnected,

    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}
