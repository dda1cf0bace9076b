//! Separator conversions between index keys and result keys
//!
//! Index paths use forward slashes exclusively; walked paths and result
//! keys use the host separator. On Unix both are identical and these
//! helpers are pass-through.

use std::borrow::Cow;
use std::path::MAIN_SEPARATOR;

/// Rewrite a host-separator path into forward-slash form.
pub(crate) fn to_slash(path: &str) -> Cow<'_, str> {
    if MAIN_SEPARATOR == '/' {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(path.replace(MAIN_SEPARATOR, "/"))
    }
}

/// Rewrite a forward-slash index path into host-separator form.
pub(crate) fn from_slash(path: &str) -> Cow<'_, str> {
    if MAIN_SEPARATOR == '/' {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(path.replace('/', &MAIN_SEPARATOR.to_string()))
    }
}

/// The parent directory of a relative path, with the semantics the
/// untracked classifier relies on: a trailing separator names the
/// directory itself, the root is ".".
///
/// `parent_dir("my/")` is `"my"`, `parent_dir("my/folder")` is `"my"`,
/// `parent_dir("file.txt")` is `"."`.
pub(crate) fn parent_dir(path: &str) -> &str {
    if let Some(stripped) = path.strip_suffix(MAIN_SEPARATOR) {
        if stripped.is_empty() {
            // "/" stays "/"
            return path;
        }
        return stripped;
    }

    match path.rfind(MAIN_SEPARATOR) {
        Some(0) => &path[..1],
        Some(idx) => &path[..idx],
        None => ".",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("", ".")]
    #[case("/", "/")]
    #[case("my/", "my")]
    #[case("my/folder", "my")]
    #[case("my/folder/", "my/folder")]
    #[case("file.txt", ".")]
    #[case("/file.txt", "/")]
    #[cfg_attr(windows, ignore = "separator-specific cases")]
    fn parent_dir_cases(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(parent_dir(path), expected);
    }
}
