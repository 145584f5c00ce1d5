pub mod matching;
pub mod syntax;

// Re-exports so other crates can just use `css::...` nicely.
pub use matching::{matches, matches_any, matches_compound, query_all, query_first};
pub use syntax::{
    AttributeSelector, Combinator, ComplexSelector, CompoundSelector, CssError, SelectorList,
    parse_selector_list,
};
