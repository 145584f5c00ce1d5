//! Minimal HTML layer for the content script: a fragment tokenizer, a tree
//! builder producing detached [`Node`] values, and [`LiveDom`], the mutable
//! document the page watchers observe.

pub mod dom_utils;
pub mod live;
pub mod traverse;

mod dom_builder;
mod entities;
mod tokenizer;
mod types;

pub use crate::dom_builder::{FragmentError, build_dom, parse_document, parse_fragment};
pub use crate::live::{DomError, LiveDom, NodeKey};
pub use crate::tokenizer::tokenize;
pub use crate::types::{Attribute, Node, Token};

/// True when `value` is a single HTML token name (`[A-Za-z0-9:_-]+`).
pub fn is_valid_name(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(tokenizer::is_name_byte)
}
