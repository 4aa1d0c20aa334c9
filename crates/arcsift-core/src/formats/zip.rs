//! Filtering reader for zip archives.
//!
//! Unlike tar, zip presents its full index up front (the central
//! directory), so [`Reader`] materializes a filtered file list at
//! construction and again on every [`Reader::set_security_mode`] call.
//! The unfiltered index is kept immutably, which makes mode changes
//! reversible: relaxing the mode re-admits entries from the original
//! archive metadata, untouched by any earlier sanitization.
//!
//! Symbolic links in zip archives are regular-looking entries whose unix
//! mode carries the link file type, so the traversal filter here tests
//! mode bits rather than a link-name field.
//!
//! # Examples
//!
//! ```no_run
//! use arcsift_core::SecurityMode;
//! use arcsift_core::formats::zip::Reader;
//! use std::fs::File;
//! use std::io::Read;
//!
//! let file = File::open("archive.zip")?;
//! let mut reader = Reader::new(file)?;
//! reader.set_security_mode(SecurityMode::MAXIMUM);
//!
//! for index in 0..reader.files().len() {
//!     let name = reader.files()[index].name().to_owned();
//!     let mut contents = Vec::new();
//!     reader.open(index)?.read_to_end(&mut contents)?;
//!     println!("{name}: {} bytes", contents.len());
//! }
//! # Ok::<(), arcsift_core::Error>(())
//! ```

use std::io::{Read, Seek};

use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::mode::SecurityMode;
use crate::sanitize;
use crate::traversal::TraversalGuard;
use crate::Result;

const S_IFMT: u32 = 0o170_000;
const S_IFIFO: u32 = 0o010_000;
const S_IFCHR: u32 = 0o020_000;
const S_IFDIR: u32 = 0o040_000;
const S_IFBLK: u32 = 0o060_000;
const S_IFREG: u32 = 0o100_000;
const S_IFLNK: u32 = 0o120_000;
const S_IFSOCK: u32 = 0o140_000;

// setuid, setgid, sticky
const SPECIAL_PERMISSION_BITS: u32 = 0o7_000;

/// Immutable per-entry metadata captured from the central directory.
#[derive(Debug, Clone)]
struct RawEntry {
    name: String,
    mode: u32,
    size: u64,
    compressed_size: u64,
}

/// A zip entry that passed the filter.
///
/// Name and mode reflect the active security mode; size fields are the
/// decoder's own values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    name: String,
    mode: u32,
    size: u64,
    compressed_size: u64,
    index: usize,
}

impl FileEntry {
    /// Entry path, possibly sanitized.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unix mode bits, possibly with the special permission bits cleared.
    ///
    /// For archives that carry no unix metadata a mode is synthesized from
    /// the directory flag.
    #[must_use]
    pub fn unix_mode(&self) -> u32 {
        self.mode
    }

    /// Uncompressed size in bytes as declared by the central directory.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Compressed size in bytes.
    #[must_use]
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Returns `true` if this entry is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }

    /// Returns `true` if this entry is a symbolic link.
    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.mode & S_IFMT == S_IFLNK
    }
}

/// Filtering reader over a random-access zip source.
///
/// Construction parses the central directory through [`zip::ZipArchive`]
/// and applies [`SecurityMode::DEFAULT`].
pub struct Reader<R: Read + Seek> {
    archive: ZipArchive<R>,
    original: Vec<RawEntry>,
    files: Vec<FileEntry>,
    mode: SecurityMode,
}

impl<R: Read + Seek> Reader<R> {
    /// Creates a filtering reader from a seekable zip source.
    ///
    /// # Errors
    ///
    /// Fails if the host decoder rejects the archive (bad central
    /// directory, not a zip file, ...).
    pub fn new(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        let mut original = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive.by_index_raw(index)?;
            // Not every writer stores unix metadata, and some store bare
            // permission bits. Synthesize the file type from the directory
            // flag so the mode-based checks below stay meaningful.
            let mut mode = file.unix_mode().unwrap_or(if file.is_dir() {
                S_IFDIR | 0o755
            } else {
                S_IFREG | 0o644
            });
            if mode & S_IFMT == 0 {
                mode |= if file.is_dir() { S_IFDIR } else { S_IFREG };
            }
            original.push(RawEntry {
                name: file.name().to_owned(),
                mode,
                size: file.size(),
                compressed_size: file.compressed_size(),
            });
        }

        let mut reader = Self {
            archive,
            original,
            files: Vec::new(),
            mode: SecurityMode::DEFAULT,
        };
        reader.set_security_mode(SecurityMode::DEFAULT);
        Ok(reader)
    }

    /// Returns the currently enabled security features.
    #[must_use]
    pub fn security_mode(&self) -> SecurityMode {
        self.mode
    }

    /// Replaces the set of enabled security features and re-filters the
    /// file list from the original archive metadata.
    ///
    /// Re-filtering always starts from the unmodified central directory,
    /// so toggling a feature off restores exactly what the archive
    /// declared. Calling this with the current mode is a no-op in effect.
    pub fn set_security_mode(&mut self, mode: SecurityMode) {
        self.files = apply_filters(&self.original, mode);
        self.mode = mode;
    }

    /// The entries that pass the current security mode, in archive order.
    #[must_use]
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Opens the filtered entry at `index` (an index into [`Self::files`])
    /// and returns a reader over its decompressed bytes.
    ///
    /// # Errors
    ///
    /// Fails if `index` is out of bounds for the filtered list or the host
    /// decoder cannot decompress the entry.
    pub fn open(&mut self, index: usize) -> Result<impl Read + '_> {
        let raw_index = self
            .files
            .get(index)
            .ok_or(ZipError::FileNotFound)?
            .index;
        Ok(self.archive.by_index(raw_index)?)
    }
}

fn is_special_mode(mode: u32) -> bool {
    matches!(mode & S_IFMT, S_IFIFO | S_IFCHR | S_IFBLK | S_IFSOCK)
}

/// Runs the per-entry security pipeline over the original file list.
fn apply_filters(original: &[RawEntry], mode: SecurityMode) -> Vec<FileEntry> {
    let mut guard = TraversalGuard::new();
    let case_insensitive =
        mode.contains(SecurityMode::PREVENT_CASE_INSENSITIVE_SYMLINK_TRAVERSAL);

    let mut files = Vec::with_capacity(original.len());
    for (index, raw) in original.iter().enumerate() {
        let mut name = raw.name.clone();
        let mut file_mode = raw.mode;

        if mode.contains(SecurityMode::SANITIZE_FILENAMES) {
            name = sanitize::sanitize_path(&name);
        }

        if mode.contains(SecurityMode::SKIP_WINDOWS_SHORT_FILENAMES)
            && sanitize::has_windows_short_filenames(&name)
        {
            debug!(name = %name, "skipping Windows short filename");
            continue;
        }

        if mode.contains(SecurityMode::PREVENT_SYMLINK_TRAVERSAL)
            && !guard.admit(&name, file_mode & S_IFMT == S_IFLNK, case_insensitive)
        {
            debug!(name = %name, "skipping entry extracted through a link");
            continue;
        }

        if mode.contains(SecurityMode::SKIP_SPECIAL_FILES) && is_special_mode(file_mode) {
            debug!(name = %name, mode = file_mode, "skipping special file");
            continue;
        }

        if mode.contains(SecurityMode::SANITIZE_FILE_MODE) {
            // Clears setuid/setgid/sticky while keeping the file type, so
            // directories stay directories.
            file_mode &= !SPECIAL_PERMISSION_BITS;
        }

        files.push(FileEntry {
            name,
            mode: file_mode,
            size: raw.size,
            compressed_size: raw.compressed_size,
            index,
        });
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, mode: u32) -> RawEntry {
        RawEntry {
            name: name.to_owned(),
            mode,
            size: 0,
            compressed_size: 0,
        }
    }

    #[test]
    fn special_mode_detection() {
        assert!(is_special_mode(S_IFIFO | 0o644));
        assert!(is_special_mode(S_IFCHR | 0o644));
        assert!(is_special_mode(S_IFBLK | 0o644));
        assert!(is_special_mode(S_IFSOCK | 0o644));
        assert!(!is_special_mode(S_IFREG | 0o644));
        assert!(!is_special_mode(S_IFDIR | 0o755));
        assert!(!is_special_mode(S_IFLNK | 0o777));
    }

    #[test]
    fn sanitize_file_mode_preserves_directory_bit() {
        let original = vec![raw("dir/", S_IFDIR | 0o4000 | 0o2000 | 0o1000 | 0o755)];
        let files = apply_filters(&original, SecurityMode::SANITIZE_FILE_MODE);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].unix_mode(), S_IFDIR | 0o755);
        assert!(files[0].is_dir());
    }

    #[test]
    fn setuid_and_sticky_cleared() {
        let original = vec![raw("bin", S_IFREG | 0o4000 | 0o1000 | 0o640)];
        let files = apply_filters(&original, SecurityMode::SANITIZE_FILE_MODE);
        assert_eq!(files[0].unix_mode() & 0o7777, 0o640);
    }

    #[test]
    fn traversal_filter_uses_mode_bits() {
        let original = vec![
            raw("linktoroot", S_IFLNK | 0o777),
            raw("linktoroot/root/.bashrc", S_IFREG | 0o644),
            raw("safe.txt", S_IFREG | 0o644),
        ];
        let files = apply_filters(&original, SecurityMode::PREVENT_SYMLINK_TRAVERSAL);
        let names: Vec<_> = files.iter().map(FileEntry::name).collect();
        assert_eq!(names, ["linktoroot", "safe.txt"]);
    }

    #[test]
    fn refiltering_restores_original_names() {
        let original = vec![raw("../traverse", S_IFREG | 0o644)];

        let sanitized = apply_filters(&original, SecurityMode::SANITIZE_FILENAMES);
        assert_eq!(sanitized[0].name(), "traverse");

        let untouched = apply_filters(&original, SecurityMode::NONE);
        assert_eq!(untouched[0].name(), "../traverse");
    }

    #[test]
    fn filtered_indices_point_at_original_positions() {
        let original = vec![
            raw("FOOOOO~1.JPG", S_IFREG | 0o644),
            raw("keep.txt", S_IFREG | 0o644),
        ];
        let files = apply_filters(&original, SecurityMode::SKIP_WINDOWS_SHORT_FILENAMES);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].index, 1);
    }
}
