//! In-memory archive builders for tests.
//!
//! The filtering readers are exercised against archives crafted to be
//! hostile (traversal names, link tricks, special files), which the
//! well-behaved writer APIs refuse to produce. The tar builder therefore
//! writes entry names straight into the raw header block, bypassing the
//! writer's own path validation.
//!
//! # Panics
//!
//! Everything here panics on I/O errors or over-long names; it is meant
//! for test code only.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::{Cursor, Write};

/// Builder for tar test archives with arbitrary entry names and types.
///
/// Names are limited to 100 bytes (the classic header field); hostile
/// spellings like `../escape` or `/etc/passwd` are written verbatim.
///
/// ```
/// use arcsift_core::test_utils::TarArchiveBuilder;
///
/// let data = TarArchiveBuilder::new()
///     .file("file.txt", b"content")
///     .directory("dir/")
///     .symlink("link", "file.txt")
///     .build();
/// ```
pub struct TarArchiveBuilder {
    builder: tar::Builder<Vec<u8>>,
}

impl TarArchiveBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    fn append(&mut self, path: &str, entry_type: tar::EntryType, mode: u32, data: &[u8]) {
        assert!(path.len() <= 100, "test entry name too long: {path}");
        let mut header = tar::Header::new_gnu();
        header.as_old_mut().name[..path.len()].copy_from_slice(path.as_bytes());
        header.set_entry_type(entry_type);
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_cksum();
        self.builder.append(&header, data).unwrap();
    }

    /// Appends a regular file with mode 0o644.
    #[must_use]
    pub fn file(self, path: &str, data: &[u8]) -> Self {
        self.file_with_mode(path, data, 0o644)
    }

    /// Appends a regular file with the given mode.
    #[must_use]
    pub fn file_with_mode(mut self, path: &str, data: &[u8], mode: u32) -> Self {
        self.append(path, tar::EntryType::Regular, mode, data);
        self
    }

    /// Appends a regular file preceded by a PAX extended header carrying
    /// the given records.
    #[must_use]
    pub fn file_with_pax_records(
        mut self,
        path: &str,
        data: &[u8],
        records: &[(&str, &str)],
    ) -> Self {
        self.builder
            .append_pax_extensions(records.iter().map(|(key, value)| (*key, value.as_bytes())))
            .unwrap();
        self.append(path, tar::EntryType::Regular, 0o644, data);
        self
    }

    /// Appends a directory entry.
    #[must_use]
    pub fn directory(mut self, path: &str) -> Self {
        self.append(path, tar::EntryType::Directory, 0o755, b"");
        self
    }

    /// Appends a symbolic link entry.
    #[must_use]
    pub fn symlink(mut self, path: &str, target: &str) -> Self {
        assert!(path.len() <= 100, "test entry name too long: {path}");
        let mut header = tar::Header::new_gnu();
        header.as_old_mut().name[..path.len()].copy_from_slice(path.as_bytes());
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        header.set_link_name_literal(target).unwrap();
        header.set_cksum();
        self.builder.append(&header, &b""[..]).unwrap();
        self
    }

    /// Appends a hard link entry.
    #[must_use]
    pub fn hardlink(mut self, path: &str, target: &str) -> Self {
        assert!(path.len() <= 100, "test entry name too long: {path}");
        let mut header = tar::Header::new_gnu();
        header.as_old_mut().name[..path.len()].copy_from_slice(path.as_bytes());
        header.set_entry_type(tar::EntryType::Link);
        header.set_size(0);
        header.set_mode(0o644);
        header.set_link_name_literal(target).unwrap();
        header.set_cksum();
        self.builder.append(&header, &b""[..]).unwrap();
        self
    }

    /// Appends a header-only entry of an arbitrary type (fifo, device
    /// node, ...).
    #[must_use]
    pub fn special(mut self, path: &str, entry_type: tar::EntryType) -> Self {
        self.append(path, entry_type, 0o644, b"");
        self
    }

    /// Finishes the archive and returns its bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }
}

impl Default for TarArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for zip test archives.
///
/// ```
/// use arcsift_core::test_utils::ZipArchiveBuilder;
///
/// let data = ZipArchiveBuilder::new()
///     .file("file.txt", b"content")
///     .directory("dir/")
///     .build();
/// ```
pub struct ZipArchiveBuilder {
    writer: zip::ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipArchiveBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: zip::ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Appends a regular file with mode 0o644, stored uncompressed.
    #[must_use]
    pub fn file(self, path: &str, data: &[u8]) -> Self {
        self.file_with_mode(path, data, 0o644)
    }

    /// Appends a regular file with the given unix permissions.
    #[must_use]
    pub fn file_with_mode(mut self, path: &str, data: &[u8], mode: u32) -> Self {
        use zip::write::SimpleFileOptions;

        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .unix_permissions(mode);
        self.writer.start_file(path, options).unwrap();
        self.writer.write_all(data).unwrap();
        self
    }

    /// Appends a directory entry.
    #[must_use]
    pub fn directory(mut self, path: &str) -> Self {
        use zip::write::SimpleFileOptions;

        let options = SimpleFileOptions::default().unix_permissions(0o755);
        self.writer.add_directory(path, options).unwrap();
        self
    }

    /// Appends a symbolic link entry.
    ///
    /// Zip stores symlinks as entries whose unix mode carries the link
    /// file type and whose content is the target path; the writer's
    /// symlink API produces exactly that shape.
    #[must_use]
    pub fn symlink(mut self, path: &str, target: &str) -> Self {
        use zip::write::SimpleFileOptions;

        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        self.writer.add_symlink(path, target, options).unwrap();
        self
    }

    /// Finishes the archive and returns its bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.writer.finish().unwrap().into_inner()
    }
}

impl Default for ZipArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tar_builder_accepts_hostile_names() {
        let data = TarArchiveBuilder::new()
            .file("../escape.txt", b"content")
            .file("/etc/passwd", b"root::0:0::/:/bin/sh")
            .symlink("link/", "/")
            .build();
        assert!(!data.is_empty());
    }

    #[test]
    fn zip_builder_produces_bytes() {
        let data = ZipArchiveBuilder::new()
            .file("file.txt", b"content")
            .directory("dir/")
            .symlink("link", "target")
            .build();
        assert!(!data.is_empty());
    }
}
