//! Character-offset helpers for slicing UTF-8 text by code points.

/// Byte offsets of every character boundary in `text`, including the final `text.len()`.
///
/// `bounds[i]..bounds[j]` is the byte range of characters `i..j`.
#[must_use]
pub fn char_bounds(text: &str) -> Vec<usize> {
    let mut bounds: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
    bounds.push(text.len());
    bounds
}

/// Number of characters in `text`.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The first `n` characters of `text`, or all of it when shorter.
#[must_use]
pub fn prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// The last `n` characters of `text`, or all of it when shorter.
#[must_use]
pub fn suffix(text: &str, n: usize) -> &str {
    if n == 0 {
        return &text[text.len()..];
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

/// `text` without its last character; empty input stays empty.
#[must_use]
pub fn drop_last(text: &str) -> &str {
    match text.char_indices().next_back() {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_multibyte_text() {
        let text = "아이a";
        assert_eq!(char_bounds(text), vec![0, 3, 6, 7]);
        assert_eq!(char_len(text), 3);
    }

    #[test]
    fn prefix_and_suffix_slice_by_characters() {
        assert_eq!(prefix("아이스크림", 2), "아이");
        assert_eq!(prefix("ab", 5), "ab");
        assert_eq!(suffix("아이스크림", 2), "크림");
        assert_eq!(suffix("ab", 0), "");
        assert_eq!(suffix("ab", 9), "ab");
        assert_eq!(drop_last("크림"), "크");
        assert_eq!(drop_last(""), "");
    }
}
