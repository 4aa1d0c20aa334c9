//! POSIX path sanitizer.

use super::clean::clean;
use super::ends_with_separator;

/// Sanitizes `input` into a relative, `..`-free, `/`-separated path.
///
/// Backslashes are treated as separators too, so archives built on Windows
/// sanitize the same way. A trailing separator on the input is preserved on
/// a non-empty result, keeping directory entries recognizable.
///
/// ```
/// use arcsift_core::sanitize::posix;
///
/// assert_eq!(posix::sanitize_path("../../some/thing"), "some/thing");
/// assert_eq!(posix::sanitize_path("/some/thing"), "some/thing");
/// assert_eq!(posix::sanitize_path("some/path/"), "some/path/");
/// ```
#[must_use]
pub fn sanitize_path(input: &str) -> String {
    let normalized = input.replace('\\', "/");

    // Rooting the path before cleaning means `..` elements can only
    // collapse inside it; stripping the root afterwards leaves a relative
    // path that joins safely under any base directory.
    let cleaned = clean(&format!("/{normalized}"), b'/');
    let mut sanitized = cleaned
        .strip_prefix('/')
        .unwrap_or(cleaned.as_str())
        .to_owned();

    if ends_with_separator(input) && !sanitized.is_empty() {
        sanitized.push('/');
    }

    sanitized
}
