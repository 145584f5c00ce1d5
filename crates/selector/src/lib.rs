//! Selector descriptions shipped to the page realm.
//!
//! A small CSS-like grammar (type, `.class`, `#id`, whitespace descendant
//! steps and `,` alternation) compiles into chains of [`NodeMatcher`]s that
//! the page-side code can evaluate against its component tree. Composite
//! directives carry a nested selector plus extra fields merged onto every
//! leaf of the chains it expands to.

mod compile;
mod input;
mod matcher;
mod normalize;

pub use compile::{UNSUPPORTED_COMBINATORS, compile, compile_str};
pub use input::{CompositeSelector, SelectorInput, SelectorItem};
pub use matcher::{CompiledSelector, NodeMatcher};
pub use normalize::normalize;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("unsupported combinator {combinator:?} in selector {selector:?}")]
    Unsupported { selector: String, combinator: char },
    #[error("invalid selector: {0}")]
    Invalid(String),
}
