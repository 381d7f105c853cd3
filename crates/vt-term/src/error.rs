// SPDX-License-Identifier: MIT
//
// Error types.
//
// Only acquisition failures are errors. Lookup misses (unknown command,
// unknown attribute name, out-of-bounds coordinates) and read timeouts are
// absorbed where they happen so a render loop never dies on them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the terminal core.
#[derive(Error, Debug)]
pub enum Error {
    /// The terminal device could not be opened.
    #[error("cannot open terminal device {}: {source}", path.display())]
    Device {
        /// Device path that was tried.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Reading or changing the termios settings failed.
    #[error("cannot switch terminal to raw mode: {0}")]
    RawMode(#[source] io::Error),

    /// The resize signal listener could not be installed.
    #[error("cannot listen for terminal resize: {0}")]
    Signal(#[source] io::Error),

    /// I/O error while writing to the terminal.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for terminal operations.
pub type Result<T> = std::result::Result<T, Error>;
