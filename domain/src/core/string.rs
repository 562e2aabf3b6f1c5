//! String utilities for the domain layer.

/// Keep at most `max_chars` characters of `s` (UTF-8 safe, no marker).
pub fn take_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Truncate a string to `max_chars` characters, appending `…` when cut.
///
/// Counts characters rather than bytes so multi-byte text is never split
/// inside a code point.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    let kept = take_chars(s, max_chars);
    if kept.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_chars_ascii() {
        assert_eq!(take_chars("hello", 10), "hello");
        assert_eq!(take_chars("hello world", 5), "hello");
        assert_eq!(take_chars("", 3), "");
    }

    #[test]
    fn test_take_chars_multibyte() {
        assert_eq!(take_chars("日本語テスト", 3), "日本語");
        assert_eq!(take_chars("👋🌍🎉", 2), "👋🌍");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("short", 400), "short");
        assert_eq!(truncate_with_ellipsis("abcdef", 4), "abcd…");
        assert_eq!(truncate_with_ellipsis("abcd", 4), "abcd");
    }
}
