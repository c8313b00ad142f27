use chrono::{DateTime, Utc};

/// Insert thousands separators into a decimal integer string.
/// Non-numeric input is returned unchanged.
/// Examples: "1234567" -> "1,234,567", "12" -> "12"
pub fn group_thousands(digits: &str) -> String {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return digits.to_string();
    }
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a unix timestamp (seconds) as "YYYY-MM-DD HH:MM:SS+00:00".
pub fn format_timestamp(secs: i64) -> String {
    match DateTime::<Utc>::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
        None => format!("@{secs}"),
    }
}

/// Shorten long hashes/addresses for list columns: "abcdef…7890".
pub fn truncate_middle(s: &str, keep: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= keep * 2 + 1 {
        return s.to_string();
    }
    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{head}…{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_digits() {
        assert_eq!(group_thousands("1234567"), "1,234,567");
        assert_eq!(group_thousands("100"), "100");
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("12ab"), "12ab");
        assert_eq!(group_thousands(""), "");
    }

    #[test]
    fn formats_unix_seconds() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00+00:00");
    }

    #[test]
    fn truncates_only_long_values() {
        assert_eq!(truncate_middle("abc", 4), "abc");
        assert_eq!(truncate_middle("0123456789abcdef", 4), "0123…cdef");
    }
}
