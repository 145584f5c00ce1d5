const NAMED: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{00A0}'),
];

/// Longest numeric reference body we try to decode (`#x10FFFF`, `#1114111`).
const MAX_REFERENCE_LEN: usize = 8;

/// Decode the handful of named references templates use plus well-formed,
/// semicolon-terminated numeric references. Everything else passes through
/// unchanged.
pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match decode_reference(after) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &after[consumed..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode the reference body following `&`. Returns the character and the
/// number of bytes consumed including the trailing `;`.
fn decode_reference(body: &str) -> Option<(char, usize)> {
    let semi = body.find(';')?;
    let name = &body[..semi];
    if let Some(numeric) = name.strip_prefix('#') {
        if name.len() > MAX_REFERENCE_LEN {
            return None;
        }
        let value = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
                u32::from_str_radix(hex, 16).ok()?
            }
            None if !numeric.is_empty() && numeric.bytes().all(|b| b.is_ascii_digit()) => {
                numeric.parse().ok()?
            }
            _ => return None,
        };
        return char::from_u32(value).map(|ch| (ch, semi + 1));
    }
    NAMED
        .iter()
        .find(|(entity, _)| *entity == name)
        .map(|(_, ch)| (*ch, semi + 1))
}
