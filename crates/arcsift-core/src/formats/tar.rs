//! Filtering reader for tar archives.
//!
//! [`Reader`] wraps [`tar::Archive`] and yields only the entries that pass
//! the configured [`SecurityMode`]. Hostile entries are dropped silently:
//! the stream a consumer sees is a deterministic subsequence of the raw
//! archive, never an error.
//!
//! Per entry, depending on the mode, the reader:
//!
//! - skips special file types (fifos, device nodes, sparse files, ...)
//! - masks the file mode down to the permission bits
//! - rewrites the name with the path sanitizer
//! - skips names containing Windows 8.3 short-filename components
//! - skips entries that would be extracted through an earlier link entry
//! - strips extended attributes and non-allow-listed PAX records
//!
//! Consider an archive crafted like this:
//!
//! ```text
//! lrwxrwxrwx user/group 0 2023-03-08 09:43 linktoroot -> /
//! -rw-rw-r-- user/group 5 2023-03-08 09:44 linktoroot/root/.bashrc
//! ```
//!
//! Extracted blindly, the second entry overwrites root's `.bashrc`. The
//! reader tracks link locations and never emits an entry whose path passes
//! through one, so only the symlink itself comes out of the iterator.
//!
//! Decompression is not this module's concern: the reader is generic over
//! any [`Read`] source, so a gzip or zstd decoder stacks in front of it
//! exactly like it would in front of [`tar::Archive`] itself.
//!
//! # Examples
//!
//! ```no_run
//! use arcsift_core::SecurityMode;
//! use arcsift_core::formats::tar::Reader;
//! use std::fs::File;
//! use std::io::Read;
//!
//! let file = File::open("archive.tar")?;
//! let mut reader = Reader::new(file);
//! reader.set_security_mode(SecurityMode::DEFAULT | SecurityMode::DROP_XATTRS);
//!
//! for entry in reader.entries()? {
//!     let mut entry = entry?;
//!     println!("{} ({} bytes)", entry.header().name, entry.header().size);
//!     let mut contents = Vec::new();
//!     entry.read_to_end(&mut contents)?;
//! }
//! # Ok::<(), arcsift_core::Error>(())
//! ```

use std::io::Read;

use tracing::debug;

use crate::header::{EntryHeader, EntryKind};
use crate::mode::SecurityMode;
use crate::sanitize;
use crate::traversal::TraversalGuard;
use crate::Result;

/// PAX record keys that survive [`SecurityMode::DROP_XATTRS`].
const ALLOWLISTED_PAX_KEYS: [&str; 3] = ["ctime", "mtime", "atime"];

const PAX_XATTR_PREFIX: &str = "SCHILY.xattr.";

/// Filtering reader over a streaming tar source.
///
/// Construction applies [`SecurityMode::DEFAULT`]; adjust with
/// [`Reader::set_security_mode`] before (or during, via
/// [`Entries::set_security_mode`]) iteration. Because tar is sequential,
/// a mode change affects subsequent entries only; entries already emitted
/// are not revisited.
pub struct Reader<R: Read> {
    archive: tar::Archive<R>,
    mode: SecurityMode,
    guard: TraversalGuard,
}

impl<R: Read> Reader<R> {
    /// Creates a filtering reader from a raw (already decompressed) tar
    /// byte source.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            archive: tar::Archive::new(reader),
            mode: SecurityMode::DEFAULT,
            guard: TraversalGuard::new(),
        }
    }

    /// Returns the currently enabled security features.
    #[must_use]
    pub fn security_mode(&self) -> SecurityMode {
        self.mode
    }

    /// Replaces the set of enabled security features.
    pub fn set_security_mode(&mut self, mode: SecurityMode) {
        self.mode = mode;
    }

    /// Returns an iterator over the entries that pass the filter.
    ///
    /// Like the underlying decoder, the stream can only be traversed once;
    /// reading an entry's bytes after advancing past it yields nothing.
    ///
    /// # Errors
    ///
    /// Fails if the underlying decoder has already been consumed.
    pub fn entries(&mut self) -> Result<Entries<'_, R>> {
        let inner = self.archive.entries()?;
        Ok(Entries {
            inner,
            mode: &mut self.mode,
            guard: &mut self.guard,
        })
    }
}

/// Iterator over filtered tar entries; the `Next` operation.
///
/// Decoder errors are yielded as items; filtered entries are not
/// observable at all.
pub struct Entries<'a, R: 'a + Read> {
    inner: tar::Entries<'a, R>,
    mode: &'a mut SecurityMode,
    guard: &'a mut TraversalGuard,
}

impl<R: Read> Entries<'_, R> {
    /// Returns the currently enabled security features.
    #[must_use]
    pub fn security_mode(&self) -> SecurityMode {
        *self.mode
    }

    /// Replaces the set of enabled security features for subsequent
    /// entries. Link locations recorded so far stay recorded.
    pub fn set_security_mode(&mut self, mode: SecurityMode) {
        *self.mode = mode;
    }
}

impl<'a, R: Read> Iterator for Entries<'a, R> {
    type Item = Result<Entry<'a, R>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut raw = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err.into())),
            };
            let mut header = match read_header(&mut raw) {
                Ok(header) => header,
                Err(err) => return Some(Err(err)),
            };
            let mode = *self.mode;

            if mode.contains(SecurityMode::SKIP_SPECIAL_FILES) && header.kind.is_special() {
                debug!(name = %header.name, kind = ?header.kind, "skipping special file");
                continue;
            }

            if mode.contains(SecurityMode::SANITIZE_FILE_MODE) {
                header.mode &= 0o777;
            }

            if mode.contains(SecurityMode::SANITIZE_FILENAMES) {
                header.name = sanitize::sanitize_path(&header.name);
            }

            if mode.contains(SecurityMode::SKIP_WINDOWS_SHORT_FILENAMES)
                && sanitize::has_windows_short_filenames(&header.name)
            {
                debug!(name = %header.name, "skipping Windows short filename");
                continue;
            }

            if mode.contains(SecurityMode::PREVENT_SYMLINK_TRAVERSAL) {
                // The guard key is always sanitized, even when the emitted
                // name is not, so raw `../` spellings cannot dodge the set.
                let key = sanitize::sanitize_path(&header.name);
                let case_insensitive =
                    mode.contains(SecurityMode::PREVENT_CASE_INSENSITIVE_SYMLINK_TRAVERSAL);
                if !self.guard.admit(&key, header.is_link(), case_insensitive) {
                    debug!(name = %header.name, "skipping entry extracted through a link");
                    continue;
                }
            }

            if mode.contains(SecurityMode::DROP_XATTRS) {
                header.xattrs.clear();
                header
                    .pax_records
                    .retain(|key, _| ALLOWLISTED_PAX_KEYS.contains(&key.as_str()));
            }

            return Some(Ok(Entry { header, inner: raw }));
        }
    }
}

/// A single tar entry that passed the filter.
///
/// The header is an owned, possibly rewritten copy; the entry's bytes are
/// read straight from the host decoder via the [`Read`] impl.
pub struct Entry<'a, R: 'a + Read> {
    header: EntryHeader,
    inner: tar::Entry<'a, R>,
}

impl<R: Read> Entry<'_, R> {
    /// Returns the filtered header for this entry.
    #[must_use]
    pub fn header(&self) -> &EntryHeader {
        &self.header
    }

    /// Consumes the entry, returning just the header.
    #[must_use]
    pub fn into_header(self) -> EntryHeader {
        self.header
    }
}

impl<R: Read> Read for Entry<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

fn read_header<R: Read>(entry: &mut tar::Entry<'_, R>) -> Result<EntryHeader> {
    let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
    let link_name = entry
        .link_name_bytes()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
    let kind = entry_kind(entry.header().entry_type());
    let mode = entry.header().mode()?;
    let size = entry.size();
    let mtime = entry.header().mtime()?;

    let mut pax_records = std::collections::BTreeMap::new();
    let mut xattrs = std::collections::BTreeMap::new();
    if let Some(extensions) = entry.pax_extensions()? {
        for extension in extensions {
            let extension = extension?;
            // Records with non-UTF-8 keys have no portable meaning here.
            let Ok(key) = extension.key() else { continue };
            if let Some(attr) = key.strip_prefix(PAX_XATTR_PREFIX) {
                xattrs.insert(attr.to_owned(), extension.value_bytes().to_vec());
            } else {
                pax_records.insert(
                    key.to_owned(),
                    String::from_utf8_lossy(extension.value_bytes()).into_owned(),
                );
            }
        }
    }

    Ok(EntryHeader {
        name,
        link_name,
        kind,
        mode,
        size,
        mtime,
        pax_records,
        xattrs,
    })
}

fn entry_kind(entry_type: tar::EntryType) -> EntryKind {
    use tar::EntryType;

    match entry_type {
        EntryType::Regular => EntryKind::Regular,
        EntryType::Directory => EntryKind::Directory,
        EntryType::Symlink => EntryKind::Symlink,
        EntryType::Link => EntryKind::Hardlink,
        EntryType::Char => EntryKind::CharDevice,
        EntryType::Block => EntryKind::BlockDevice,
        EntryType::Fifo => EntryKind::Fifo,
        _ => EntryKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_kind_mapping() {
        assert_eq!(entry_kind(tar::EntryType::Regular), EntryKind::Regular);
        assert_eq!(entry_kind(tar::EntryType::Directory), EntryKind::Directory);
        assert_eq!(entry_kind(tar::EntryType::Symlink), EntryKind::Symlink);
        assert_eq!(entry_kind(tar::EntryType::Link), EntryKind::Hardlink);
        assert_eq!(entry_kind(tar::EntryType::Char), EntryKind::CharDevice);
        assert_eq!(entry_kind(tar::EntryType::Block), EntryKind::BlockDevice);
        assert_eq!(entry_kind(tar::EntryType::Fifo), EntryKind::Fifo);
        assert_eq!(entry_kind(tar::EntryType::GNUSparse), EntryKind::Other);
        assert_eq!(entry_kind(tar::EntryType::Continuous), EntryKind::Other);
    }
}
