use crate::Node;
use crate::types::Attribute;

pub fn get_attr<'a>(attrs: &'a [Attribute], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .and_then(|(_, v)| v.as_deref())
}

/// Set or replace an attribute, keeping its original position.
pub fn set_attr(attrs: &mut Vec<Attribute>, key: &str, value: &str) {
    match attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
        Some((_, v)) => *v = Some(value.to_string()),
        None => attrs.push((key.to_ascii_lowercase(), Some(value.to_string()))),
    }
}

pub fn remove_attr(attrs: &mut Vec<Attribute>, key: &str) -> bool {
    let before = attrs.len();
    attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
    attrs.len() != before
}

pub fn class_list(attrs: &[Attribute]) -> impl Iterator<Item = &str> {
    get_attr(attrs, "class").unwrap_or("").split_ascii_whitespace()
}

pub fn has_class(attrs: &[Attribute], class: &str) -> bool {
    class_list(attrs).any(|c| c == class)
}

/// Add or remove `class` depending on `on`. Returns whether the list changed.
pub fn toggle_class(attrs: &mut Vec<Attribute>, class: &str, on: bool) -> bool {
    let present = has_class(attrs, class);
    if present == on {
        return false;
    }
    let mut classes: Vec<String> = class_list(attrs).map(str::to_string).collect();
    if on {
        classes.push(class.to_string());
    } else {
        classes.retain(|c| c != class);
    }
    if classes.is_empty() {
        remove_attr(attrs, "class");
    } else {
        set_attr(attrs, "class", &classes.join(" "));
    }
    true
}

/// `data-foo-bar` attribute name for a `fooBar` dataset key.
pub fn dataset_attr_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 8);
    out.push_str("data-");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Indented one-line-per-node outline, capped at `cap` lines.
pub fn outline_from_dom(root: &Node, cap: usize) -> Vec<String> {
    fn walk(node: &Node, depth: usize, out: &mut Vec<String>, left: &mut usize) {
        if *left == 0 {
            return;
        }
        let indent = "  ".repeat(depth);
        match node {
            Node::Document { doctype, children } => {
                *left -= 1;
                match doctype {
                    Some(dt) => out.push(format!("{indent}<!{dt}>")),
                    None => out.push(format!("{indent}#document")),
                }
                for c in children {
                    walk(c, depth + 1, out, left);
                }
            }
            Node::Element {
                name,
                attributes,
                children,
            } => {
                *left -= 1;
                let mut line = format!("{indent}<{name}");
                for key in ["id", "class"] {
                    if let Some(value) = get_attr(attributes, key).filter(|v| !v.is_empty()) {
                        line.push_str(&format!(r#" {key}="{value}""#));
                    }
                }
                line.push('>');
                out.push(line);
                for c in children {
                    walk(c, depth + 1, out, left);
                }
            }
            Node::Text { text } => {
                let t = text.replace('\n', " ");
                let t = t.trim();
                if !t.is_empty() {
                    *left -= 1;
                    out.push(format!("{indent}\"{}\"", clip(t, 40)));
                }
            }
            Node::Comment { text } => {
                *left -= 1;
                out.push(format!("{indent}<!-- {} -->", clip(&text.replace('\n', " "), 40)));
            }
        }
    }
    let mut out = Vec::new();
    let mut left = cap;
    walk(root, 0, &mut out, &mut left);
    out
}

fn clip(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
