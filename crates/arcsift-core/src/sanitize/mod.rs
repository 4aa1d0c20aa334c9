//! Lexical path sanitization.
//!
//! [`sanitize_path`] maps an arbitrary archive entry name to a relative,
//! `..`-free path that is safe to join under an extraction base directory
//! (assuming the base starts out empty of symlinks). The processing is
//! purely lexical; nothing here touches the filesystem.
//!
//! Both platform variants are always compiled: [`posix`] emits
//! `/`-separated paths, [`windows`] emits `\`-separated paths and
//! additionally defuses NTFS/Win32 quirks (drive letters, Alternate Data
//! Streams, NT device prefixes, reserved device names). The crate-level
//! [`sanitize_path`] picks the variant matching the build target, which is
//! what the filtering readers use.

use std::sync::LazyLock;

use regex::Regex;

mod clean;
pub mod posix;
pub mod windows;

/// Sanitizes a path for the build target's filesystem semantics.
///
/// See [`posix::sanitize_path`] and [`windows::sanitize_path`] for the
/// variant-specific rules and examples.
#[must_use]
pub fn sanitize_path(input: &str) -> String {
    #[cfg(windows)]
    {
        windows::sanitize_path(input)
    }
    #[cfg(not(windows))]
    {
        posix::sanitize_path(input)
    }
}

// Short filenames look like DOWNLO~1 or FOOOOO~1.JPG: a tilde, digits,
// optionally a dot right after.
static SHORT_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~\d+\.?").expect("short filename pattern compiles"));

/// Reports whether any path component looks like a Windows 8.3 short
/// filename.
///
/// Short names may address the same object as the long name they were
/// generated from, so archives aimed at Windows hosts can use them to
/// smuggle a second path to an already-filtered file.
///
/// ```
/// use arcsift_core::sanitize::has_windows_short_filenames;
///
/// assert!(has_windows_short_filenames("FOOOOO~1.JPG"));
/// assert!(has_windows_short_filenames(r"foo\ANDROI~2\bar"));
/// assert!(!has_windows_short_filenames("Some~Stuff"));
/// ```
#[must_use]
pub fn has_windows_short_filenames(input: &str) -> bool {
    let normalized = input.replace('\\', "/");
    normalized
        .split('/')
        .any(|component| SHORT_FILENAME.is_match(component))
}

/// Reports whether the raw input ended in a path separator of either
/// flavor, which the sanitizers preserve on non-empty output.
fn ends_with_separator(input: &str) -> bool {
    matches!(input.as_bytes().last(), Some(b'/' | b'\\'))
}
