use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9A-Za-z_]+").unwrap());

/// Group the integer digits of a plain number in threes: `1234567.5` -> `1,234,567.5`.
/// Text that is not a plain number is returned unchanged.
pub fn format_number(text: &str) -> String {
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    let (digits, tail) = rest.split_at(int_len);
    if digits.is_empty() || !(tail.is_empty() || tail.starts_with('.')) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + digits.len() / 3);
    out.push_str(sign);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push_str(tail);
    out
}

/// Slug for the readable part of a site URL (`/games/123/My-Game`).
pub fn format_url_name(name: &str, fallback: &str) -> String {
    let stripped = name.replace('\'', "");
    let dashed = NON_WORD_RE.replace_all(&stripped, "-");
    let trimmed = dashed.trim_matches('-');
    let slug = if trimmed.is_empty() { fallback } else { trimmed };
    urlencoding::encode(slug).into_owned()
}

pub fn format_url_name_or_default(name: &str) -> String {
    format_url_name(name, "Name")
}
