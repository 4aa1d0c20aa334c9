//! Windows path sanitizer targeting NTFS and Win32 naming semantics.

use super::clean::clean;
use super::ends_with_separator;

const SEP: char = '\\';

/// Sanitizes `input` into a relative, `..`-free, `\`-separated path.
///
/// On top of the lexical normalization shared with the POSIX variant, this
/// neutralizes drive-letter prefixes, Alternate Data Stream markers and NT
/// device prefixes by rewriting `:`, `/` and `?` to path separators, and
/// defuses reserved device names (`CON`, `LPT1`, ...) by suffixing the
/// component base with `-safe`.
///
/// ```
/// use arcsift_core::sanitize::windows;
///
/// assert_eq!(windows::sanitize_path(r"C:\some\thing"), r"C\some\thing");
/// assert_eq!(windows::sanitize_path("something.txt:alternate"), r"something.txt\alternate");
/// assert_eq!(windows::sanitize_path(r"somedir\LPT1"), r"somedir\LPT1-safe");
/// ```
#[must_use]
pub fn sanitize_path(input: &str) -> String {
    // ':' covers drive letters and ADS markers, '?' the NT wildcard prefix.
    let normalized = input.replace([':', '/', '?'], r"\");

    // Clean twice: the first rooted pass can leave a leading separator
    // pattern behind (e.g. from `\\.\` device prefixes), which only the
    // trim-then-clean second pass fully normalizes.
    let first = clean(&format!("{SEP}{normalized}"), b'\\');
    let cleaned = clean(first.trim_start_matches(SEP), b'\\');

    let mut sanitized = String::with_capacity(cleaned.len());
    let mut first_part = true;
    for part in cleaned.split(SEP) {
        if first_part {
            first_part = false;
        } else {
            sanitized.push(SEP);
        }
        // Reserved names are matched on the portion before the first dot;
        // the extension is carried over untouched.
        let (base, ext) = match part.split_once('.') {
            Some((base, ext)) => (base, Some(ext)),
            None => (part, None),
        };
        sanitized.push_str(base);
        if is_reserved_name(base) {
            sanitized.push_str("-safe");
        }
        if let Some(ext) = ext {
            if !ext.is_empty() {
                sanitized.push('.');
                sanitized.push_str(ext);
            }
        }
    }

    if ends_with_separator(input) && !sanitized.is_empty() {
        sanitized.push(SEP);
    }

    sanitized
}

// First bytes of the UTF-8 encodings of U+00B9, U+00B2, U+00B3; Windows
// matches COM/LPT followed by a superscript digit as well as an ASCII one.
const SUPERSCRIPT_LEAD: u8 = 0xC2;
const SUPERSCRIPT_ONE: u8 = 0xB9;
const SUPERSCRIPT_TWO: u8 = 0xB2;
const SUPERSCRIPT_THREE: u8 = 0xB3;

/// Reports whether `name` is a Windows reserved device name or console
/// handle, ignoring any whitespace-only tail.
///
/// Matching happens on the pre-extension base only, and only on the portion
/// before the first dot. Reserved names carrying several extensions
/// (`CON.txt.txt`), which some Windows versions also reserve, are therefore
/// not detected.
fn is_reserved_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.len() < 3 {
        return false;
    }

    let mut reserved_len = 0;
    let prefix = &bytes[0..3];
    if prefix.eq_ignore_ascii_case(b"CON") {
        reserved_len = 3;

        // CONIN$ and CONOUT$ open console handles just like CON does, even
        // through a relative path such as ./CONIN$.
        if bytes.len() >= 6 && bytes[5] == b'$' && bytes[3..6].eq_ignore_ascii_case(b"IN$") {
            reserved_len += 3;
        }
        if bytes.len() >= 7 && bytes[6] == b'$' && bytes[3..7].eq_ignore_ascii_case(b"OUT$") {
            reserved_len += 4;
        }
    } else if prefix.eq_ignore_ascii_case(b"PRN")
        || prefix.eq_ignore_ascii_case(b"AUX")
        || prefix.eq_ignore_ascii_case(b"NUL")
    {
        reserved_len = 3;
    } else if prefix.eq_ignore_ascii_case(b"COM") || prefix.eq_ignore_ascii_case(b"LPT") {
        if bytes.len() >= 4 {
            match bytes[3] {
                b'1'..=b'9' => reserved_len = 4,
                SUPERSCRIPT_LEAD => {
                    if bytes.len() >= 5
                        && matches!(
                            bytes[4],
                            SUPERSCRIPT_ONE | SUPERSCRIPT_TWO | SUPERSCRIPT_THREE
                        )
                    {
                        reserved_len = 5;
                    }
                }
                _ => {}
            }
        }
    }

    reserved_len != 0 && name[reserved_len..].trim().is_empty()
}
