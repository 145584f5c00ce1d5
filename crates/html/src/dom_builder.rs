use crate::tokenizer::tokenize;
use crate::types::{Attribute, Node, Token};

/// Reasons an HTML template cannot stand in for a single element.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FragmentError {
    #[error("fragment contains no element")]
    Empty,
    #[error("fragment has {0} root elements, expected exactly one")]
    MultipleRoots(usize),
    #[error("fragment has text outside its root element: {0:?}")]
    StrayText(String),
    #[error("fragment starts with a doctype")]
    Doctype,
}

/// Build a document tree from tokens. Unmatched end tags are dropped and
/// elements left open at the end of input are closed implicitly.
pub fn build_dom(tokens: &[Token]) -> Node {
    let mut doctype = None;
    let mut roots: Vec<Node> = Vec::new();
    let mut open: Vec<OpenElement> = Vec::new();

    for token in tokens {
        match token {
            Token::Doctype(value) => {
                if doctype.is_none() && roots.is_empty() && open.is_empty() {
                    doctype = Some(value.clone());
                }
            }
            Token::Comment(text) => {
                attach(&mut open, &mut roots, Node::Comment { text: text.clone() });
            }
            Token::Text(text) => {
                if text.is_empty() {
                    continue;
                }
                // Adjacent text tokens merge into one node.
                let children = match open.last_mut() {
                    Some(parent) => &mut parent.children,
                    None => &mut roots,
                };
                if let Some(Node::Text { text: existing }) = children.last_mut() {
                    existing.push_str(text);
                } else {
                    children.push(Node::text(text.as_str()));
                }
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                if *self_closing {
                    let node = Node::Element {
                        name: name.clone(),
                        attributes: attributes.clone(),
                        children: Vec::new(),
                    };
                    attach(&mut open, &mut roots, node);
                } else {
                    open.push(OpenElement {
                        name: name.clone(),
                        attributes: attributes.clone(),
                        children: Vec::new(),
                    });
                }
            }
            Token::EndTag(name) => {
                let Some(pos) = open.iter().rposition(|el| el.name == *name) else {
                    log::trace!(target: "btr.html", "dropping unmatched end tag </{name}>");
                    continue;
                };
                while open.len() > pos {
                    close_top(&mut open, &mut roots);
                }
            }
        }
    }

    while !open.is_empty() {
        close_top(&mut open, &mut roots);
    }

    Node::Document {
        doctype,
        children: roots,
    }
}

struct OpenElement {
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

fn attach(open: &mut [OpenElement], roots: &mut Vec<Node>, node: Node) {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

fn close_top(open: &mut Vec<OpenElement>, roots: &mut Vec<Node>) {
    let Some(el) = open.pop() else {
        return;
    };
    let node = Node::Element {
        name: el.name,
        attributes: el.attributes,
        children: el.children,
    };
    attach(open, roots, node);
}

pub fn parse_document(input: &str) -> Node {
    build_dom(&tokenize(input))
}

/// Parse a template into its single root element.
///
/// Surrounding whitespace and comments are ignored; any other top-level
/// content makes the fragment malformed.
pub fn parse_fragment(input: &str) -> Result<Node, FragmentError> {
    let Node::Document { doctype, children } = parse_document(input) else {
        unreachable!("build_dom always returns a document node");
    };
    if doctype.is_some() {
        return Err(FragmentError::Doctype);
    }

    let mut root = None;
    let mut count = 0usize;
    for child in children {
        match child {
            Node::Element { .. } => {
                count += 1;
                root.get_or_insert(child);
            }
            Node::Text { text } if !text.trim().is_empty() => {
                return Err(FragmentError::StrayText(text.trim().to_string()));
            }
            _ => {}
        }
    }

    match (root, count) {
        (Some(root), 1) => Ok(root),
        (None, _) => Err(FragmentError::Empty),
        (Some(_), n) => Err(FragmentError::MultipleRoots(n)),
    }
}
