//! Security mode bitmask controlling which filters a reader applies.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// A set of independently toggleable security policies.
///
/// Both the tar and the zip reader consult the same flag set. Combine flags
/// with `|`, clear one with `mode & !FLAG`, and test membership with
/// [`SecurityMode::contains`].
///
/// ```
/// use arcsift_core::SecurityMode;
///
/// let mode = SecurityMode::DEFAULT | SecurityMode::DROP_XATTRS;
/// assert!(mode.contains(SecurityMode::SANITIZE_FILENAMES));
///
/// let relaxed = mode & !SecurityMode::SANITIZE_FILENAMES;
/// assert!(!relaxed.contains(SecurityMode::SANITIZE_FILENAMES));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SecurityMode(u32);

impl SecurityMode {
    /// No security features at all. Entries pass through unmodified.
    pub const NONE: Self = Self(0);

    /// Drop entries that are not a regular file, a directory, or a
    /// symbolic link (fifos, device nodes, sockets, sparse files, ...).
    pub const SKIP_SPECIAL_FILES: Self = Self(1);

    /// Clear special mode bits (setuid, setgid, sticky and friends),
    /// keeping only the low nine permission bits for tar entries and the
    /// permission-plus-filetype bits for zip entries.
    pub const SANITIZE_FILE_MODE: Self = Self(2);

    /// Rewrite each entry name with the path sanitizer, dropping `..`
    /// components and turning absolute names into relative ones.
    pub const SANITIZE_FILENAMES: Self = Self(4);

    /// Remove extended attributes from headers; keep only the allow-listed
    /// extension records (`ctime`, `mtime`, `atime`).
    pub const DROP_XATTRS: Self = Self(16);

    /// Drop entries that would be extracted through a previously seen
    /// symbolic link.
    pub const PREVENT_SYMLINK_TRAVERSAL: Self = Self(32);

    /// Compare paths case-insensitively in the symlink traversal filter.
    /// Only meaningful together with [`Self::PREVENT_SYMLINK_TRAVERSAL`];
    /// inert on its own.
    pub const PREVENT_CASE_INSENSITIVE_SYMLINK_TRAVERSAL: Self = Self(64);

    /// Drop entries with a path component that looks like a Windows 8.3
    /// short filename (e.g. `GIT~1`).
    pub const SKIP_WINDOWS_SHORT_FILENAMES: Self = Self(128);

    /// The features enabled on a freshly constructed reader.
    ///
    /// Filename sanitization and symlink traversal prevention are safe for
    /// all known legitimate archives and are always part of the default.
    /// Windows targets additionally enable case-insensitive traversal
    /// detection and short-filename skipping; macOS targets enable the
    /// case-insensitive detection. Extracting onto a case-insensitive
    /// filesystem from another platform warrants enabling those explicitly.
    #[cfg(windows)]
    pub const DEFAULT: Self = Self(
        Self::SANITIZE_FILENAMES.0
            | Self::PREVENT_SYMLINK_TRAVERSAL.0
            | Self::PREVENT_CASE_INSENSITIVE_SYMLINK_TRAVERSAL.0
            | Self::SKIP_WINDOWS_SHORT_FILENAMES.0,
    );

    /// The features enabled on a freshly constructed reader.
    ///
    /// Filename sanitization and symlink traversal prevention are safe for
    /// all known legitimate archives and are always part of the default.
    /// macOS builds additionally enable case-insensitive traversal detection
    /// to match the host filesystem's semantics.
    #[cfg(target_os = "macos")]
    pub const DEFAULT: Self = Self(
        Self::SANITIZE_FILENAMES.0
            | Self::PREVENT_SYMLINK_TRAVERSAL.0
            | Self::PREVENT_CASE_INSENSITIVE_SYMLINK_TRAVERSAL.0,
    );

    /// The features enabled on a freshly constructed reader.
    ///
    /// Filename sanitization and symlink traversal prevention are safe for
    /// all known legitimate archives. When extracting onto a Windows or
    /// otherwise case-insensitive filesystem from this platform, enable
    /// [`Self::PREVENT_CASE_INSENSITIVE_SYMLINK_TRAVERSAL`] and
    /// [`Self::SKIP_WINDOWS_SHORT_FILENAMES`] explicitly.
    #[cfg(not(any(windows, target_os = "macos")))]
    pub const DEFAULT: Self =
        Self(Self::SANITIZE_FILENAMES.0 | Self::PREVENT_SYMLINK_TRAVERSAL.0);

    /// Every security feature at once. Recommended for integrations that
    /// only care about file contents and nothing unix specific.
    pub const MAXIMUM: Self = Self(
        Self::SKIP_SPECIAL_FILES.0
            | Self::SANITIZE_FILE_MODE.0
            | Self::SANITIZE_FILENAMES.0
            | Self::DROP_XATTRS.0
            | Self::PREVENT_SYMLINK_TRAVERSAL.0
            | Self::PREVENT_CASE_INSENSITIVE_SYMLINK_TRAVERSAL.0
            | Self::SKIP_WINDOWS_SHORT_FILENAMES.0,
    );

    /// Returns `true` if every flag in `other` is also set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for SecurityMode {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BitOr for SecurityMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SecurityMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for SecurityMode {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for SecurityMode {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for SecurityMode {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(SecurityMode, &str); 7] = [
            (SecurityMode::SKIP_SPECIAL_FILES, "SKIP_SPECIAL_FILES"),
            (SecurityMode::SANITIZE_FILE_MODE, "SANITIZE_FILE_MODE"),
            (SecurityMode::SANITIZE_FILENAMES, "SANITIZE_FILENAMES"),
            (SecurityMode::DROP_XATTRS, "DROP_XATTRS"),
            (
                SecurityMode::PREVENT_SYMLINK_TRAVERSAL,
                "PREVENT_SYMLINK_TRAVERSAL",
            ),
            (
                SecurityMode::PREVENT_CASE_INSENSITIVE_SYMLINK_TRAVERSAL,
                "PREVENT_CASE_INSENSITIVE_SYMLINK_TRAVERSAL",
            ),
            (
                SecurityMode::SKIP_WINDOWS_SHORT_FILENAMES,
                "SKIP_WINDOWS_SHORT_FILENAMES",
            ),
        ];

        if self.is_empty() {
            return f.write_str("SecurityMode(NONE)");
        }
        f.write_str("SecurityMode(")?;
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_core_features() {
        let mode = SecurityMode::default();
        assert!(mode.contains(SecurityMode::SANITIZE_FILENAMES));
        assert!(mode.contains(SecurityMode::PREVENT_SYMLINK_TRAVERSAL));
        assert!(!mode.contains(SecurityMode::DROP_XATTRS));
        assert!(!mode.contains(SecurityMode::SKIP_SPECIAL_FILES));
    }

    #[test]
    fn maximum_is_union_of_all_flags() {
        let all = SecurityMode::SKIP_SPECIAL_FILES
            | SecurityMode::SANITIZE_FILE_MODE
            | SecurityMode::SANITIZE_FILENAMES
            | SecurityMode::DROP_XATTRS
            | SecurityMode::PREVENT_SYMLINK_TRAVERSAL
            | SecurityMode::PREVENT_CASE_INSENSITIVE_SYMLINK_TRAVERSAL
            | SecurityMode::SKIP_WINDOWS_SHORT_FILENAMES;
        assert_eq!(SecurityMode::MAXIMUM, all);
        assert!(SecurityMode::MAXIMUM.contains(SecurityMode::DEFAULT));
    }

    #[test]
    fn opt_out_clears_a_single_flag() {
        let mode = SecurityMode::DEFAULT & !SecurityMode::SANITIZE_FILENAMES;
        assert!(!mode.contains(SecurityMode::SANITIZE_FILENAMES));
        assert!(mode.contains(SecurityMode::PREVENT_SYMLINK_TRAVERSAL));
    }

    #[test]
    fn contains_requires_all_flags() {
        let mode = SecurityMode::SANITIZE_FILENAMES;
        assert!(!mode.contains(SecurityMode::SANITIZE_FILENAMES | SecurityMode::DROP_XATTRS));
        assert!(SecurityMode::NONE.is_empty());
        assert!(mode.contains(SecurityMode::NONE));
    }

    #[test]
    fn debug_lists_flag_names() {
        let mode = SecurityMode::SANITIZE_FILENAMES | SecurityMode::DROP_XATTRS;
        let rendered = format!("{mode:?}");
        assert!(rendered.contains("SANITIZE_FILENAMES"));
        assert!(rendered.contains("DROP_XATTRS"));
        assert_eq!(format!("{:?}", SecurityMode::NONE), "SecurityMode(NONE)");
    }
}
