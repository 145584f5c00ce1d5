use crate::{CompiledSelector, NodeMatcher, SelectorError, SelectorInput, SelectorItem, normalize};
use serde_json::Value;

/// Characters that would need combinators the page-side walker cannot follow.
pub const UNSUPPORTED_COMBINATORS: [char; 4] = ['[', '>', '+', '~'];

// input: "ul.list li, #x"
// output: [{type: ul, classList: [list], next: {type: li}}, {props: {id: x}}]
/// A `.` or `#` with no name after it (`a.`, `a..b`, `#`) is rejected as invalid.
pub fn compile_str(selector: &str) -> Result<Vec<NodeMatcher>, SelectorError> {
    if let Some(combinator) = selector.chars().find(|c| UNSUPPORTED_COMBINATORS.contains(c)) {
        return Err(SelectorError::Unsupported {
            selector: selector.to_string(),
            combinator,
        });
    }

    let mut chains = Vec::new();
    for alternative in selector.split(',') {
        let segments = alternative
            .split_whitespace()
            .map(|segment| compile_segment(selector, segment))
            .collect::<Result<Vec<_>, _>>()?;
        // Ancestor first; each step becomes the parent of the one after it.
        let chain = segments.into_iter().rev().reduce(|child, mut parent| {
            parent.next = Some(Box::new(child));
            parent
        });
        chains.extend(chain);
    }
    Ok(chains)
}

/// Compile any raw selector form. Fails when nothing compiles.
pub fn compile(input: &SelectorInput) -> Result<CompiledSelector, SelectorError> {
    let mut chains = Vec::new();
    for item in input.items() {
        match item {
            SelectorItem::Text(text) => chains.extend(compile_str(text)?),
            SelectorItem::Directive(directive) => chains.extend(normalize(directive)?),
            SelectorItem::Matcher(matcher) => chains.push(matcher.clone()),
        }
    }
    if chains.is_empty() {
        return Err(SelectorError::Invalid(format!(
            "{} matches nothing",
            input.describe()
        )));
    }
    log::trace!(target: "btr.inject", "compiled {} into {} chain(s)", input.describe(), chains.len());
    Ok(CompiledSelector::new(chains))
}

fn compile_segment(selector: &str, segment: &str) -> Result<NodeMatcher, SelectorError> {
    let mut matcher = NodeMatcher::default();
    for token in split_tokens(segment) {
        if let Some(class) = token.strip_prefix('.') {
            let class = non_empty(selector, class, '.')?;
            matcher
                .class_list
                .get_or_insert_with(Vec::new)
                .push(class.to_string());
        } else if let Some(id) = token.strip_prefix('#') {
            let id = non_empty(selector, id, '#')?;
            matcher
                .props
                .get_or_insert_with(Default::default)
                .insert("id".to_string(), Value::String(id.to_string()));
        } else if token != "*" {
            matcher.node_type = Some(token.to_lowercase());
        }
    }
    Ok(matcher)
}

// Split before every `.` and `#`, keeping the marker on the token it starts.
fn split_tokens(segment: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (i, c) in segment.char_indices() {
        if i > 0 && (c == '.' || c == '#') {
            tokens.push(&segment[start..i]);
            start = i;
        }
    }
    tokens.push(&segment[start..]);
    tokens
}

fn non_empty<'a>(selector: &str, name: &'a str, marker: char) -> Result<&'a str, SelectorError> {
    if name.is_empty() {
        return Err(SelectorError::Invalid(format!(
            "empty name after {marker:?} in {selector:?}"
        )));
    }
    Ok(name)
}
