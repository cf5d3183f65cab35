use std::cmp::Ordering;

/// Collation weight of one character under Swedish alphabet order
/// (a-z, then å, ä, ö). Accented Latin letters fold onto their base letter.
fn swedish_weight(c: char) -> u32 {
    let lower = c.to_lowercase().next().unwrap_or(c);
    match lower {
        'å' => 'z' as u32 + 1,
        'ä' | 'æ' => 'z' as u32 + 2,
        'ö' | 'ø' => 'z' as u32 + 3,
        'á' | 'à' | 'â' => 'a' as u32,
        'é' | 'è' | 'ê' | 'ë' => 'e' as u32,
        'ü' => 'y' as u32,
        other => other as u32,
    }
}

/// Case-insensitive comparison in Swedish alphabetical order.
pub fn cmp_swedish(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(swedish_weight)
        .cmp(b.chars().map(swedish_weight))
        .then_with(|| a.cmp(b))
}

/// Whether `haystack` contains `needle_lower` ignoring case.
/// `needle_lower` should already be lowercased.
pub fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Group thousands with spaces, Swedish style: 10500 -> "10 500"
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: Option<&str>, default: &str) -> String {
    value.unwrap_or(default).to_string()
}
