/// Path assembly for walker output.
///
/// Walkers build child paths by string concatenation rather than through
/// `PathBuf`, because report lines must reproduce the exact path text and
/// the canonical separator of the platform.

/// Canonical separator for emitted paths.
pub const SEPARATOR: char = std::path::MAIN_SEPARATOR;

#[inline]
fn is_separator(c: char, sep: char) -> bool {
    // Windows accepts both slashes; elsewhere a backslash is a filename byte.
    c == sep || (sep == '\\' && c == '/')
}

/// Normalize a scan root: alternate separators become the canonical one and
/// runs of separators collapse to one. A trailing separator is kept only when
/// the root is a bare drive (`C:\`) or the filesystem root (`/`).
pub fn normalize_root(root: &str) -> String {
    normalize_with(root, SEPARATOR)
}

/// Join a directory path and an entry name with exactly one separator.
pub fn join_entry(dir: &str, name: &str) -> String {
    join_with(dir, name, SEPARATOR)
}

pub(crate) fn normalize_with(root: &str, sep: char) -> String {
    let mut out = String::with_capacity(root.len());
    let mut chars = root.chars().peekable();

    // Keep a leading `\\` on Windows (`\\?\` verbatim prefixes).
    if sep == '\\' {
        let mut lead = root.chars().take(2);
        if lead.next().is_some_and(|c| is_separator(c, sep))
            && lead.next().is_some_and(|c| is_separator(c, sep))
        {
            out.push(sep);
            out.push(sep);
            chars.next();
            chars.next();
            while chars.peek().is_some_and(|&c| is_separator(c, sep)) {
                chars.next();
            }
        }
    }

    let mut last_was_sep = false;
    for c in chars {
        if is_separator(c, sep) {
            if !last_was_sep {
                out.push(sep);
            }
            last_was_sep = true;
        } else {
            out.push(c);
            last_was_sep = false;
        }
    }

    if out.len() > 1 && out.ends_with(sep) && !is_drive_root(&out, sep) {
        out.pop();
    }
    out
}

pub(crate) fn join_with(dir: &str, name: &str, sep: char) -> String {
    let mut out = String::with_capacity(dir.len() + name.len() + 1);
    out.push_str(dir);
    if !dir.ends_with(|c| is_separator(c, sep)) {
        out.push(sep);
    }
    out.push_str(name);
    out
}

/// `C:\` style root.
fn is_drive_root(path: &str, sep: char) -> bool {
    let b = path.as_bytes();
    sep == '\\' && b.len() == 3 && b[0].is_ascii_alphabetic() && b[1] == b':'
}
