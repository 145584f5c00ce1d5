use crate::NodeMatcher;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw, uncompiled selector as callers write it: one item or an array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorInput {
    One(SelectorItem),
    Many(Vec<SelectorItem>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorItem {
    Text(String),
    /// Objects carrying a nested `selector` field.
    Directive(CompositeSelector),
    /// Any other object is taken as an already-compiled matcher.
    Matcher(NodeMatcher),
}

/// A nested selector bundled with fields to merge onto each of its leaves.
///
/// `next` is representable so that a directive which sets it can be
/// rejected instead of silently dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeSelector {
    pub selector: Box<SelectorInput>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<NodeMatcher>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SelectorInput {
    pub fn items(&self) -> &[SelectorItem] {
        match self {
            SelectorInput::One(item) => std::slice::from_ref(item),
            SelectorInput::Many(items) => items,
        }
    }

    /// JSON rendering used in diagnostics.
    pub fn describe(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

impl CompositeSelector {
    pub fn new(selector: impl Into<SelectorInput>) -> Self {
        Self {
            selector: Box::new(selector.into()),
            node_type: None,
            class_list: None,
            props: None,
            next: None,
            extra: Map::new(),
        }
    }

    pub fn with_type(mut self, tag: &str) -> Self {
        self.node_type = Some(tag.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.class_list
            .get_or_insert_with(Vec::new)
            .push(class.to_string());
        self
    }

    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

impl From<&str> for SelectorItem {
    fn from(text: &str) -> Self {
        SelectorItem::Text(text.to_string())
    }
}

impl From<String> for SelectorItem {
    fn from(text: String) -> Self {
        SelectorItem::Text(text)
    }
}

impl From<CompositeSelector> for SelectorItem {
    fn from(directive: CompositeSelector) -> Self {
        SelectorItem::Directive(directive)
    }
}

impl From<NodeMatcher> for SelectorItem {
    fn from(matcher: NodeMatcher) -> Self {
        SelectorItem::Matcher(matcher)
    }
}

macro_rules! single_item_input {
    ($($ty:ty),*) => {
        $(impl From<$ty> for SelectorInput {
            fn from(item: $ty) -> Self {
                SelectorInput::One(item.into())
            }
        })*
    };
}

single_item_input!(&str, String, CompositeSelector, NodeMatcher, SelectorItem);

impl<T: Into<SelectorItem>> FromIterator<T> for SelectorInput {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        SelectorInput::Many(iter.into_iter().map(Into::into).collect())
    }
}
