use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One ancestor or leaf step of a compiled selector.
///
/// Serialises to the page-realm shape:
/// `{"type": "ul", "classList": [..], "props": {"id": ..}, "next": {..}}`,
/// with absent fields omitted. Fields this crate does not know about are
/// kept in `extra` and written back out unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMatcher {
    /// Lowercase tag; `None` matches any tag.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    /// Required descendant; `None` marks the injection anchor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<NodeMatcher>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeMatcher {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn of_type(tag: &str) -> Self {
        Self {
            node_type: Some(tag.to_ascii_lowercase()),
            ..Self::default()
        }
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

    pub fn with_next(mut self, next: NodeMatcher) -> Self {
        self.next = Some(Box::new(next));
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.next.is_none()
    }

    /// Number of steps from this matcher down to its leaf, inclusive.
    pub fn depth(&self) -> usize {
        std::iter::successors(Some(self), |m| m.next.as_deref()).count()
    }

    pub fn leaf(&self) -> &NodeMatcher {
        let mut current = self;
        while let Some(next) = current.next.as_deref() {
            current = next;
        }
        current
    }

    pub fn leaf_mut(&mut self) -> &mut NodeMatcher {
        match self.next {
            Some(ref mut next) => next.leaf_mut(),
            None => self,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.props.as_ref()?.get("id")?.as_str()
    }
}

/// Alternative matcher chains; any chain matching is enough.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompiledSelector(Vec<NodeMatcher>);

impl CompiledSelector {
    pub fn new(chains: Vec<NodeMatcher>) -> Self {
        Self(chains)
    }

    pub fn chains(&self) -> &[NodeMatcher] {
        &self.0
    }

    pub fn into_chains(self) -> Vec<NodeMatcher> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeMatcher> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a CompiledSelector {
    type Item = &'a NodeMatcher;
    type IntoIter = std::slice::Iter<'a, NodeMatcher>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_fields_are_omitted() {
        let matcher = NodeMatcher::of_type("UL").with_next(NodeMatcher::any().with_class("x"));
        assert_eq!(
            serde_json::to_value(&matcher).unwrap(),
            json!({"type": "ul", "next": {"classList": ["x"]}})
        );
    }

    #[test]
    fn unknown_fields_survive_a_trip() {
        let raw = json!({"type": "div", "key": "ItemCard", "props": {"id": "a"}});
        let matcher: NodeMatcher = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(matcher.extra.get("key"), Some(&json!("ItemCard")));
        assert_eq!(matcher.id(), Some("a"));
        assert_eq!(serde_json::to_value(&matcher).unwrap(), raw);
    }

    #[test]
    fn leaf_walks_the_chain() {
        let mut matcher = NodeMatcher::of_type("a")
            .with_next(NodeMatcher::of_type("b").with_next(NodeMatcher::of_type("c")));
        assert_eq!(matcher.depth(), 3);
        assert_eq!(matcher.leaf().node_type.as_deref(), Some("c"));
        matcher.leaf_mut().node_type = None;
        assert!(matcher.leaf().node_type.is_none());
        assert!(!matcher.is_leaf());
    }
}
