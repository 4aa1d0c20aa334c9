//! Filtering layer over tar and zip readers that neutralizes hostile
//! archive content before it reaches an extraction step.
//!
//! Crafted archives attack extractors through their entry metadata:
//! `../`-laden and absolute names, symbolic links that later entries are
//! written through, setuid bits, device nodes, Windows reserved device
//! names and 8.3 short names, NTFS Alternate Data Streams. The readers in
//! [`formats`] wrap the `tar` and `zip` decoder crates and, entry by
//! entry, either rewrite the header into a safe form or silently drop the
//! entry, according to a [`SecurityMode`] bitmask.
//!
//! Everything here is purely lexical. No path is resolved against a real
//! filesystem, no syscall is made; the output contract is simply that a
//! sanitized name, lexically joined under any base directory, stays inside
//! that directory (given a base that starts without symlinks).
//!
//! Two features are enabled on every new reader, as they are compatible
//! with all known legitimate archives:
//!
//! - [`SecurityMode::SANITIZE_FILENAMES`]
//! - [`SecurityMode::PREVENT_SYMLINK_TRAVERSAL`]
//!
//! Enable more features individually:
//!
//! ```no_run
//! use arcsift_core::SecurityMode;
//! use arcsift_core::formats::tar;
//! use std::fs::File;
//!
//! let mut reader = tar::Reader::new(File::open("archive.tar")?);
//! let mode = reader.security_mode() | SecurityMode::SANITIZE_FILE_MODE;
//! reader.set_security_mode(mode);
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! or opt out of one:
//!
//! ```no_run
//! # use arcsift_core::SecurityMode;
//! # use arcsift_core::formats::tar;
//! # use std::fs::File;
//! # let mut reader = tar::Reader::new(File::open("archive.tar")?);
//! reader.set_security_mode(reader.security_mode() & !SecurityMode::SANITIZE_FILENAMES);
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! Filtered entries vanish from iteration with no error and no status:
//! the contract is safe extraction, not strict rejection. Callers that
//! need to detect tampering can compare the emitted entries against the
//! raw decoder's list, or subscribe to the `tracing` debug events emitted
//! on every drop.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod formats;
pub mod header;
pub mod mode;
pub mod sanitize;
pub mod test_utils;
mod traversal;

pub use error::{Error, Result};
pub use header::{EntryHeader, EntryKind};
pub use mode::SecurityMode;
pub use sanitize::{has_windows_short_filenames, sanitize_path};
