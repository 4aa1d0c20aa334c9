//! Lexical path normalization.

/// Lexically normalizes `path` using `sep` as the path separator.
///
/// Applies the classic cleaning rules: duplicate separators collapse,
/// `.` elements disappear, `..` elements consume the preceding element
/// where one exists, and a rooted path never climbs above its root. The
/// empty path normalizes to `.`.
///
/// Callers are expected to have already rewritten every foreign separator
/// to `sep`; only `sep` itself is treated as a separator here.
pub(crate) fn clean(path: &str, sep: u8) -> String {
    if path.is_empty() {
        return ".".to_owned();
    }

    let bytes = path.as_bytes();
    let n = bytes.len();
    let rooted = bytes[0] == sep;
    let mut out = String::with_capacity(n);
    let mut r = 0;
    // Barrier below which `..` may not pop: just past the root separator
    // for rooted paths, past any leading `..` run otherwise.
    let mut dotdot = 0;

    if rooted {
        out.push(sep as char);
        r = 1;
        dotdot = 1;
    }

    while r < n {
        if bytes[r] == sep {
            r += 1;
        } else if bytes[r] == b'.' && (r + 1 == n || bytes[r + 1] == sep) {
            r += 1;
        } else if bytes[r] == b'.'
            && bytes[r + 1] == b'.'
            && (r + 2 == n || bytes[r + 2] == sep)
        {
            r += 2;
            if out.len() > dotdot {
                // Backtrack to the previous separator, or the barrier.
                let w = {
                    let written = out.as_bytes();
                    let mut w = out.len() - 1;
                    while w > dotdot && written[w] != sep {
                        w -= 1;
                    }
                    w
                };
                out.truncate(w);
            } else if !rooted {
                if !out.is_empty() {
                    out.push(sep as char);
                }
                out.push_str("..");
                dotdot = out.len();
            }
        } else {
            if (rooted && out.len() != 1) || (!rooted && !out.is_empty()) {
                out.push(sep as char);
            }
            let start = r;
            while r < n && bytes[r] != sep {
                r += 1;
            }
            out.push_str(&path[start..r]);
        }
    }

    if out.is_empty() {
        return ".".to_owned();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_posix(path: &str) -> String {
        clean(path, b'/')
    }

    #[test]
    fn already_clean_paths() {
        assert_eq!(clean_posix("abc"), "abc");
        assert_eq!(clean_posix("abc/def"), "abc/def");
        assert_eq!(clean_posix("/abc"), "/abc");
        assert_eq!(clean_posix("."), ".");
        assert_eq!(clean_posix(".."), "..");
        assert_eq!(clean_posix("/"), "/");
    }

    #[test]
    fn empty_path_is_dot() {
        assert_eq!(clean_posix(""), ".");
    }

    #[test]
    fn duplicate_separators_collapse() {
        assert_eq!(clean_posix("abc//def//ghi"), "abc/def/ghi");
        assert_eq!(clean_posix("//abc"), "/abc");
        assert_eq!(clean_posix("abc//"), "abc");
    }

    #[test]
    fn dot_elements_disappear() {
        assert_eq!(clean_posix("abc/./def"), "abc/def");
        assert_eq!(clean_posix("/./abc/def"), "/abc/def");
        assert_eq!(clean_posix("abc/."), "abc");
    }

    #[test]
    fn dotdot_pops_preceding_element() {
        assert_eq!(clean_posix("abc/def/ghi/../jkl"), "abc/def/jkl");
        assert_eq!(clean_posix("abc/def/../ghi/../jkl"), "abc/jkl");
        assert_eq!(clean_posix("abc/def/.."), "abc");
        assert_eq!(clean_posix("abc/def/../.."), ".");
        assert_eq!(clean_posix("/abc/def/../.."), "/");
    }

    #[test]
    fn rooted_dotdot_cannot_escape() {
        assert_eq!(clean_posix("/.."), "/");
        assert_eq!(clean_posix("/../abc"), "/abc");
        assert_eq!(clean_posix("/../../x"), "/x");
        assert_eq!(clean_posix("/abc/def/../../.."), "/");
    }

    #[test]
    fn relative_dotdot_is_preserved() {
        assert_eq!(clean_posix("abc/../../def"), "../def");
        assert_eq!(clean_posix("../abc"), "../abc");
        assert_eq!(clean_posix("../../.."), "../../..");
    }

    #[test]
    fn backslash_separator_variant() {
        assert_eq!(clean(r"\a\b\..\c", b'\\'), r"\a\c");
        assert_eq!(clean(r"\\\a\\b", b'\\'), r"\a\b");
        assert_eq!(clean(r"\..\x", b'\\'), r"\x");
        assert_eq!(clean(r"\", b'\\'), r"\");
    }

    #[test]
    fn multibyte_components_survive() {
        assert_eq!(clean_posix("héllo/./wörld"), "héllo/wörld");
        assert_eq!(clean_posix("日本/../語"), "語");
    }
}
