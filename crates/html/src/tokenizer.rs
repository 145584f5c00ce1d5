//! Small HTML tokenizer for extension templates and test pages.
//!
//! Tag and attribute names are ASCII `[A-Za-z0-9:_-]` and are lower-cased.
//! There is no HTML5 error recovery: unknown constructs are skipped byte by
//! byte, and `<script>`/`<style>` bodies are kept as raw text up to their
//! close tag.
use crate::entities::decode_entities;
use crate::types::{Attribute, Token};
use memchr::memchr;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

pub(crate) fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

pub(crate) fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

/// Byte range of `</name\s*>` within `haystack`, matched case-insensitively.
fn find_rawtext_close_tag(haystack: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        i += memchr(b'<', &bytes[i..])?;
        if bytes.get(i + 1) == Some(&b'/')
            && starts_with_ignore_ascii_case_at(bytes, i + 2, name.as_bytes())
        {
            let mut k = i + 2 + name.len();
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if bytes.get(k) == Some(&b'>') {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    // Slices are only cut at ASCII structural bytes, so every endpoint is a char boundary.
    while i < len {
        if bytes[i] != b'<' {
            let start = i;
            i = memchr(b'<', &bytes[i..]).map_or(len, |rel| i + rel);
            let decoded = decode_entities(&input[start..i]);
            if !decoded.is_empty() {
                out.push(Token::Text(decoded));
            }
            continue;
        }

        if input[i..].starts_with(COMMENT_START) {
            let body_start = i + COMMENT_START.len();
            match input[body_start..].find(COMMENT_END) {
                Some(end) => {
                    out.push(Token::Comment(input[body_start..body_start + end].to_string()));
                    i = body_start + end + COMMENT_END.len();
                    continue;
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    break;
                }
            }
        }

        if starts_with_ignore_ascii_case_at(bytes, i, b"<!doctype") {
            let rest = &input[i + 2..];
            match rest.find('>') {
                Some(end) => {
                    out.push(Token::Doctype(rest[..end].trim().to_string()));
                    i += 2 + end + 1;
                    continue;
                }
                None => break,
            }
        }

        if bytes.get(i + 1) == Some(&b'/') {
            let start = i + 2;
            let mut j = start;
            while j < len && is_name_byte(bytes[j]) {
                j += 1;
            }
            let name = input[start..j].to_ascii_lowercase();
            j = memchr(b'>', &bytes[j..]).map_or(len, |rel| j + rel + 1);
            if !name.is_empty() {
                out.push(Token::EndTag(name));
            }
            i = j;
            continue;
        }

        let start = i + 1;
        let mut k = start;
        while k < len && is_name_byte(bytes[k]) {
            k += 1;
        }
        if k == start {
            // A lone `<` is text.
            out.push(Token::Text("<".to_string()));
            i += 1;
            continue;
        }
        let name = input[start..k].to_ascii_lowercase();
        let (attributes, self_closing, after) = scan_attributes(input, k);
        let self_closing = self_closing || is_void_element(&name);
        let rawtext = !self_closing && (name == "script" || name == "style");

        out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });
        i = after;

        if rawtext {
            match find_rawtext_close_tag(&input[i..], &name) {
                Some((body_end, close_end)) => {
                    if body_end > 0 {
                        out.push(Token::Text(input[i..i + body_end].to_string()));
                    }
                    out.push(Token::EndTag(name));
                    i += close_end;
                }
                None => {
                    if i < len {
                        out.push(Token::Text(input[i..].to_string()));
                    }
                    out.push(Token::EndTag(name));
                    break;
                }
            }
        }
    }
    out
}

/// Scan attributes starting right after a tag name. Returns the attributes,
/// whether the tag was written self-closing, and the offset after `>`.
fn scan_attributes(input: &str, mut k: usize) -> (Vec<Attribute>, bool, usize) {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut attributes = Vec::new();
    let mut self_closing = false;

    let skip_whitespace = |k: &mut usize| {
        while *k < len && bytes[*k].is_ascii_whitespace() {
            *k += 1;
        }
    };

    loop {
        skip_whitespace(&mut k);
        if k >= len {
            break;
        }
        if bytes[k] == b'>' {
            k += 1;
            break;
        }
        if bytes[k] == b'/' {
            if bytes.get(k + 1) == Some(&b'>') {
                self_closing = true;
                k += 2;
                break;
            }
            k += 1;
            continue;
        }
        let name_start = k;
        while k < len && is_name_byte(bytes[k]) {
            k += 1;
        }
        if name_start == k {
            k += 1;
            continue;
        }
        let attribute_name = input[name_start..k].to_ascii_lowercase();

        skip_whitespace(&mut k);
        let value = if k < len && bytes[k] == b'=' {
            k += 1;
            skip_whitespace(&mut k);
            if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                let quote = bytes[k];
                k += 1;
                let value_start = k;
                k = memchr(quote, &bytes[k..]).map_or(len, |rel| k + rel);
                let raw = &input[value_start..k];
                if k < len {
                    k += 1;
                }
                Some(decode_entities(raw))
            } else {
                let value_start = k;
                while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    if bytes[k] == b'/' && bytes.get(k + 1) == Some(&b'>') {
                        break;
                    }
                    k += 1;
                }
                Some(decode_entities(&input[value_start..k]))
            }
        } else {
            None
        };
        attributes.push((attribute_name, value));
    }

    (attributes, self_closing, k)
}
