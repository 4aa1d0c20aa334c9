//! Error types for the filtering readers.
//!
//! The filtering layer never invents error conditions of its own: a hostile
//! entry is silently dropped, not reported. Everything in this module is a
//! pass-through from the host decoders.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced unchanged from the host decoders.
#[derive(Error, Debug)]
pub enum Error {
    /// The tar decoder (or the underlying byte source) failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The zip decoder failed (bad central directory, unsupported method, ...).
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
