//! Identifiers shared by the content-script crates.
//!
//! Placeholder identities are allocated from an injected [`Sequence`] rather
//! than a module-level counter, so every consumer can be driven in isolation.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Prefix of every placeholder element id requested across the page boundary.
pub const ELEM_ID_PREFIX: &str = "btr-react-";

/// Identity of one injection placeholder, rendered as `btr-react-<n>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElemId(u64);

impl ElemId {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    /// CSS query that matches the placeholder element carrying this id.
    pub fn css_selector(self) -> String {
        format!("#{self}")
    }

    /// Parse the `btr-react-<n>` token form.
    pub fn parse(token: &str) -> Option<Self> {
        let digits = token.strip_prefix(ELEM_ID_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Self)
    }
}

impl fmt::Display for ElemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ELEM_ID_PREFIX}{}", self.0)
    }
}

impl Serialize for ElemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ElemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ElemIdVisitor;

        impl Visitor<'_> for ElemIdVisitor {
            type Value = ElemId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a `{ELEM_ID_PREFIX}<n>` token")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<ElemId, E> {
                ElemId::parse(value).ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_str(ElemIdVisitor)
    }
}

/// Monotonic source of identifiers.
///
/// Implementations must never hand out the same value twice for the lifetime
/// of a page. All consumers run on one cooperative thread, so `&self` access
/// through interior mutability is enough.
pub trait Sequence {
    fn next_value(&self) -> u64;
}

/// Increment-only counter; the default [`Sequence`].
#[derive(Debug, Default)]
pub struct Counter {
    next: Cell<u64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: Cell::new(first),
        }
    }

    /// Value the next call to [`Sequence::next_value`] will return.
    pub fn peek(&self) -> u64 {
        self.next.get()
    }
}

impl Sequence for Counter {
    fn next_value(&self) -> u64 {
        let value = self.next.get();
        // Wrapping would reuse ids.
        self.next.set(value.checked_add(1).expect("id sequence exhausted"));
        value
    }
}

impl<S: Sequence + ?Sized> Sequence for Rc<S> {
    fn next_value(&self) -> u64 {
        (**self).next_value()
    }
}

impl<S: Sequence + ?Sized> Sequence for &S {
    fn next_value(&self) -> u64 {
        (**self).next_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elem_id_renders_prefixed_token() {
        assert_eq!(ElemId::from_raw(7).to_string(), "btr-react-7");
        assert_eq!(ElemId::from_raw(7).css_selector(), "#btr-react-7");
    }

    #[test]
    fn elem_id_parse_rejects_foreign_tokens() {
        assert_eq!(ElemId::parse("btr-react-12"), Some(ElemId::from_raw(12)));
        assert_eq!(ElemId::parse("btr-react-"), None);
        assert_eq!(ElemId::parse("btr-react-1a"), None);
        assert_eq!(ElemId::parse("react-1"), None);
    }

    #[test]
    fn elem_id_serializes_as_string() {
        let json = serde_json::to_string(&ElemId::from_raw(3)).unwrap();
        assert_eq!(json, "\"btr-react-3\"");
        let back: ElemId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ElemId::from_raw(3));
        assert!(serde_json::from_str::<ElemId>("\"nope\"").is_err());
    }

    #[test]
    fn counter_is_strictly_increasing() {
        let counter = Counter::new();
        let values: Vec<u64> = (0..4).map(|_| counter.next_value()).collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
        assert_eq!(counter.peek(), 4);
    }

    #[test]
    fn shared_counter_never_repeats() {
        let counter = Rc::new(Counter::starting_at(10));
        let a = Rc::clone(&counter);
        let b = Rc::clone(&counter);
        assert_eq!(a.next_value(), 10);
        assert_eq!(b.next_value(), 11);
        assert_eq!(a.next_value(), 12);
    }
}
