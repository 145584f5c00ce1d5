//! Mutable page document.
//!
//! Nodes live in a keyed arena. Keys are allocated from a counter and never
//! reused, so a node that is removed and re-created by the page always comes
//! back under a new key; watchers rely on that to tell a re-render from the
//! original element.
//!
//! Invariants:
//! - The root is a document node and is never removed or replaced.
//! - A node has at most one parent and appears once in that parent's children.
//! - Operations never create cycles.
//! - Every successful mutation bumps [`LiveDom::version`].

use crate::dom_utils;
use crate::parse_document;
use crate::types::{Attribute, Node};
use std::collections::HashMap;

/// Stable identity of a node inside one [`LiveDom`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(u32);

impl NodeKey {
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0:?} is not in the document")]
    MissingKey(NodeKey),
    #[error("node {0:?} has the wrong kind for this operation")]
    WrongNodeKind(NodeKey),
    #[error("node {0:?} cannot have children")]
    InvalidParent(NodeKey),
    #[error("node {0:?} already has a parent")]
    AlreadyAttached(NodeKey),
    #[error("node {0:?} has no parent")]
    Detached(NodeKey),
    #[error("inserting {child:?} under {parent:?} would create a cycle")]
    CycleDetected { parent: NodeKey, child: NodeKey },
    #[error("index {index} is past the {len} children of {parent:?}")]
    IndexOutOfBounds {
        parent: NodeKey,
        index: usize,
        len: usize,
    },
    #[error("the document root cannot be moved, removed or replaced")]
    RootImmutable,
    #[error("a document cannot be nested inside another document")]
    NestedDocument,
    #[error("invalid attribute name {0:?}")]
    InvalidName(String),
}

enum NodeKind {
    Document { doctype: Option<String> },
    Element {
        name: String,
        attributes: Vec<Attribute>,
    },
    Text { text: String },
    Comment { text: String },
}

struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl NodeRecord {
    fn allows_children(&self) -> bool {
        matches!(self.kind, NodeKind::Document { .. } | NodeKind::Element { .. })
    }
}

pub struct LiveDom {
    nodes: HashMap<NodeKey, NodeRecord>,
    next_key: u32,
    root: NodeKey,
    version: u64,
}

impl LiveDom {
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: HashMap::new(),
            next_key: 1,
            root: NodeKey(0),
            version: 0,
        };
        dom.root = dom.insert_record(NodeKind::Document { doctype: None });
        dom
    }

    /// Build a live document from a parsed tree. A non-document node becomes
    /// the single child of a fresh document.
    pub fn from_node(node: &Node) -> Self {
        let mut dom = Self::new();
        let root = dom.root;
        match node {
            Node::Document { doctype, children } => {
                if let Some(record) = dom.nodes.get_mut(&root) {
                    record.kind = NodeKind::Document {
                        doctype: doctype.clone(),
                    };
                }
                for child in children {
                    let key = dom.build_subtree(child);
                    dom.link(root, key, None);
                }
            }
            other => {
                let key = dom.build_subtree(other);
                dom.link(root, key, None);
            }
        }
        dom.version = 0;
        dom
    }

    pub fn parse(html: &str) -> Self {
        Self::from_node(&parse_document(html))
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Mutation counter; changes whenever the tree or an attribute changes.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of nodes in the arena, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.children(self.root).is_empty()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    /// True when `key` is reachable from the document root.
    pub fn is_connected(&self, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == self.root {
                return true;
            }
            current = self.nodes.get(&k).and_then(|r| r.parent);
        }
        false
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&key).and_then(|r| r.parent)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        match self.nodes.get(&key) {
            Some(record) => &record.children,
            None => &[],
        }
    }

    pub fn element_children(&self, key: NodeKey) -> Vec<NodeKey> {
        self.children(key)
            .iter()
            .copied()
            .filter(|k| self.is_element(*k))
            .collect()
    }

    pub fn is_element(&self, key: NodeKey) -> bool {
        matches!(
            self.nodes.get(&key).map(|r| &r.kind),
            Some(NodeKind::Element { .. })
        )
    }

    pub fn element_name(&self, key: NodeKey) -> Option<&str> {
        match &self.nodes.get(&key)?.kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attributes(&self, key: NodeKey) -> Option<&[Attribute]> {
        match &self.nodes.get(&key)?.kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    pub fn attr(&self, key: NodeKey, name: &str) -> Option<&str> {
        dom_utils::get_attr(self.attributes(key)?, name)
    }

    pub fn has_class(&self, key: NodeKey, class: &str) -> bool {
        self.attributes(key)
            .is_some_and(|attrs| dom_utils::has_class(attrs, class))
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, key: NodeKey) -> String {
        let mut out = String::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            let Some(record) = self.nodes.get(&k) else {
                continue;
            };
            if let NodeKind::Text { text } = &record.kind {
                out.push_str(text);
            }
            stack.extend(record.children.iter().rev().copied());
        }
        out
    }

    /// Create a detached copy of `node` and return the key of its root.
    pub fn create(&mut self, node: &Node) -> Result<NodeKey, DomError> {
        if matches!(node, Node::Document { .. }) {
            return Err(DomError::NestedDocument);
        }
        let key = self.build_subtree(node);
        self.version += 1;
        Ok(key)
    }

    pub fn create_element(&mut self, name: &str) -> NodeKey {
        let key = self.insert_record(NodeKind::Element {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
        });
        self.version += 1;
        key
    }

    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        self.check_insertion(parent, child)?;
        self.link(parent, child, None);
        self.version += 1;
        Ok(())
    }

    /// Insert `child` so that it ends up at `index` among all children of
    /// `parent`; `index == len` appends.
    pub fn insert_child(
        &mut self,
        parent: NodeKey,
        index: usize,
        child: NodeKey,
    ) -> Result<(), DomError> {
        self.check_insertion(parent, child)?;
        let len = self.children(parent).len();
        if index > len {
            return Err(DomError::IndexOutOfBounds { parent, index, len });
        }
        self.link(parent, child, Some(index));
        self.version += 1;
        Ok(())
    }

    /// Detach `key` from its parent and drop its whole subtree.
    pub fn remove(&mut self, key: NodeKey) -> Result<(), DomError> {
        self.ensure_live(key)?;
        if key == self.root {
            return Err(DomError::RootImmutable);
        }
        self.unlink(key);
        self.drop_subtree(key);
        self.version += 1;
        Ok(())
    }

    /// Put the detached node `replacement` in the slot of `old`, then drop
    /// `old` and its subtree.
    pub fn replace_with(&mut self, old: NodeKey, replacement: NodeKey) -> Result<(), DomError> {
        self.ensure_live(old)?;
        if old == self.root {
            return Err(DomError::RootImmutable);
        }
        let parent = self.parent(old).ok_or(DomError::Detached(old))?;
        self.check_insertion(parent, replacement)?;
        let index = self
            .children(parent)
            .iter()
            .position(|k| *k == old)
            .ok_or(DomError::Detached(old))?;
        self.unlink(old);
        self.drop_subtree(old);
        self.link(parent, replacement, Some(index));
        self.version += 1;
        Ok(())
    }

    pub fn set_attr(&mut self, key: NodeKey, name: &str, value: &str) -> Result<(), DomError> {
        if !crate::is_valid_name(name) {
            return Err(DomError::InvalidName(name.to_string()));
        }
        let attrs = self.attributes_mut(key)?;
        dom_utils::set_attr(attrs, name, value);
        self.version += 1;
        Ok(())
    }

    pub fn remove_attr(&mut self, key: NodeKey, name: &str) -> Result<bool, DomError> {
        let removed = dom_utils::remove_attr(self.attributes_mut(key)?, name);
        if removed {
            self.version += 1;
        }
        Ok(removed)
    }

    /// `classList.toggle(class, on)`. Returns whether the class list changed.
    pub fn toggle_class(&mut self, key: NodeKey, class: &str, on: bool) -> Result<bool, DomError> {
        let changed = dom_utils::toggle_class(self.attributes_mut(key)?, class, on);
        if changed {
            self.version += 1;
        }
        Ok(changed)
    }

    pub fn add_class(&mut self, key: NodeKey, class: &str) -> Result<bool, DomError> {
        self.toggle_class(key, class, true)
    }

    pub fn remove_class(&mut self, key: NodeKey, class: &str) -> Result<bool, DomError> {
        self.toggle_class(key, class, false)
    }

    /// Read a `data-*` attribute by its dataset key (`btrPage`).
    pub fn data(&self, key: NodeKey, dataset_key: &str) -> Option<&str> {
        self.attr(key, &dom_utils::dataset_attr_name(dataset_key))
    }

    pub fn set_data(&mut self, key: NodeKey, dataset_key: &str, value: &str) -> Result<(), DomError> {
        self.set_attr(key, &dom_utils::dataset_attr_name(dataset_key), value)
    }

    pub fn set_text(&mut self, key: NodeKey, value: &str) -> Result<(), DomError> {
        let record = self.nodes.get_mut(&key).ok_or(DomError::MissingKey(key))?;
        match &mut record.kind {
            NodeKind::Text { text } => {
                text.clear();
                text.push_str(value);
            }
            _ => return Err(DomError::WrongNodeKind(key)),
        }
        self.version += 1;
        Ok(())
    }

    /// Copy the subtree rooted at `key` back out as a value tree.
    pub fn materialize(&self, key: NodeKey) -> Result<Node, DomError> {
        let record = self.nodes.get(&key).ok_or(DomError::MissingKey(key))?;
        let children = record
            .children
            .iter()
            .map(|child| self.materialize(*child))
            .collect::<Result<Vec<_>, _>>()?;
        let node = match &record.kind {
            NodeKind::Document { doctype } => Node::Document {
                doctype: doctype.clone(),
                children,
            },
            NodeKind::Element { name, attributes } => Node::Element {
                name: name.clone(),
                attributes: attributes.clone(),
                children,
            },
            NodeKind::Text { text } => Node::Text { text: text.clone() },
            NodeKind::Comment { text } => Node::Comment { text: text.clone() },
        };
        Ok(node)
    }

    fn insert_record(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key = self
            .next_key
            .checked_add(1)
            .expect("live dom key space exhausted");
        self.nodes.insert(
            key,
            NodeRecord {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        key
    }

    fn build_subtree(&mut self, node: &Node) -> NodeKey {
        let (kind, children) = match node {
            Node::Document { doctype, children } => (
                NodeKind::Document {
                    doctype: doctype.clone(),
                },
                children.as_slice(),
            ),
            Node::Element {
                name,
                attributes,
                children,
            } => (
                NodeKind::Element {
                    name: name.clone(),
                    attributes: attributes.clone(),
                },
                children.as_slice(),
            ),
            Node::Text { text } => (NodeKind::Text { text: text.clone() }, &[][..]),
            Node::Comment { text } => (NodeKind::Comment { text: text.clone() }, &[][..]),
        };
        let key = self.insert_record(kind);
        for child in children {
            let child_key = self.build_subtree(child);
            self.link(key, child_key, None);
        }
        key
    }

    fn attributes_mut(&mut self, key: NodeKey) -> Result<&mut Vec<Attribute>, DomError> {
        let record = self.nodes.get_mut(&key).ok_or(DomError::MissingKey(key))?;
        match &mut record.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            _ => Err(DomError::WrongNodeKind(key)),
        }
    }

    fn ensure_live(&self, key: NodeKey) -> Result<(), DomError> {
        if self.nodes.contains_key(&key) {
            Ok(())
        } else {
            Err(DomError::MissingKey(key))
        }
    }

    fn check_insertion(&self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        let parent_record = self.nodes.get(&parent).ok_or(DomError::MissingKey(parent))?;
        let child_record = self.nodes.get(&child).ok_or(DomError::MissingKey(child))?;
        if child == self.root {
            return Err(DomError::RootImmutable);
        }
        if matches!(child_record.kind, NodeKind::Document { .. }) {
            return Err(DomError::NestedDocument);
        }
        if !parent_record.allows_children() {
            return Err(DomError::InvalidParent(parent));
        }
        if child_record.parent.is_some() {
            return Err(DomError::AlreadyAttached(child));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(DomError::CycleDetected { parent, child });
        }
        Ok(())
    }

    /// True when `ancestor` is a strict ancestor of `node`.
    fn is_ancestor(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut current = self.parent(node);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.parent(k);
        }
        false
    }

    fn link(&mut self, parent: NodeKey, child: NodeKey, index: Option<usize>) {
        if let Some(record) = self.nodes.get_mut(&parent) {
            match index {
                Some(i) => record.children.insert(i, child),
                None => record.children.push(child),
            }
        }
        if let Some(record) = self.nodes.get_mut(&child) {
            record.parent = Some(parent);
        }
    }

    fn unlink(&mut self, key: NodeKey) {
        let Some(parent) = self.nodes.get_mut(&key).and_then(|r| r.parent.take()) else {
            return;
        };
        if let Some(record) = self.nodes.get_mut(&parent) {
            record.children.retain(|k| *k != key);
        }
    }

    fn drop_subtree(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(record) = self.nodes.remove(&k) {
                stack.extend(record.children);
            }
        }
    }
}

impl Default for LiveDom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_fragment, traverse};

    fn find_by_id(dom: &LiveDom, id: &str) -> NodeKey {
        traverse::descendants(dom, dom.root())
            .find(|k| dom.attr(*k, "id") == Some(id))
            .unwrap_or_else(|| panic!("no element #{id}"))
    }

    #[test]
    fn parse_builds_connected_tree() {
        let dom = LiveDom::parse(r#"<body><ul id="menu"><li>a</li></ul></body>"#);
        let menu = find_by_id(&dom, "menu");
        assert!(dom.is_connected(menu));
        assert_eq!(dom.element_name(menu), Some("ul"));
        assert_eq!(dom.element_children(menu).len(), 1);
        assert_eq!(dom.text_content(menu), "a");
        assert_eq!(dom.version(), 0);
    }

    #[test]
    fn insert_child_places_node_at_index() {
        let mut dom = LiveDom::parse(r#"<ul id="menu"><li>a</li><li>b</li></ul>"#);
        let menu = find_by_id(&dom, "menu");
        let item = dom.create_element("li");
        dom.set_attr(item, "id", "new").unwrap();
        dom.insert_child(menu, 0, item).unwrap();
        assert_eq!(dom.children(menu)[0], item);
        assert!(dom.version() > 0);

        let other = dom.create_element("li");
        let err = dom.insert_child(menu, 9, other).unwrap_err();
        assert_eq!(
            err,
            DomError::IndexOutOfBounds {
                parent: menu,
                index: 9,
                len: 3
            }
        );
    }

    #[test]
    fn replace_with_keeps_slot_and_drops_old_subtree() {
        let mut dom = LiveDom::parse(r#"<div id="a"></div><span id="p"><b>x</b></span><div id="c"></div>"#);
        let placeholder = find_by_id(&dom, "p");
        let bold = dom.children(placeholder)[0];
        let replacement = dom.create(&parse_fragment("<em>y</em>").unwrap()).unwrap();

        dom.replace_with(placeholder, replacement).unwrap();

        let root_children = dom.children(dom.root()).to_vec();
        assert_eq!(root_children[1], replacement);
        assert!(!dom.contains(placeholder));
        assert!(!dom.contains(bold));
        assert_eq!(dom.text_content(replacement), "y");
    }

    #[test]
    fn replace_with_requires_detached_replacement() {
        let mut dom = LiveDom::parse(r#"<i id="a"></i><i id="b"></i>"#);
        let a = find_by_id(&dom, "a");
        let b = find_by_id(&dom, "b");
        assert_eq!(dom.replace_with(a, b), Err(DomError::AlreadyAttached(b)));
        assert_eq!(dom.replace_with(dom.root(), b), Err(DomError::RootImmutable));
    }

    #[test]
    fn append_child_rejects_cycles() {
        let mut dom = LiveDom::new();
        let outer = dom.create_element("div");
        let inner = dom.create_element("div");
        dom.append_child(outer, inner).unwrap();
        assert_eq!(
            dom.append_child(inner, outer),
            Err(DomError::CycleDetected {
                parent: inner,
                child: outer
            })
        );
    }

    #[test]
    fn removed_keys_are_never_reused() {
        let mut dom = LiveDom::parse(r#"<p id="x"></p>"#);
        let first = find_by_id(&dom, "x");
        dom.remove(first).unwrap();
        let again = dom.create_element("p");
        assert_ne!(first, again);
        assert!(!dom.contains(first));
    }

    #[test]
    fn class_and_dataset_helpers_mutate_attributes() {
        let mut dom = LiveDom::parse("<body></body>");
        let body = dom.element_children(dom.root())[0];
        assert!(dom.toggle_class(body, "btr-hide-ads", true).unwrap());
        assert!(dom.has_class(body, "btr-hide-ads"));
        dom.set_data(body, "btrPage", "home").unwrap();
        assert_eq!(dom.attr(body, "data-btr-page"), Some("home"));
        assert_eq!(dom.data(body, "btrPage"), Some("home"));
        assert_eq!(
            dom.set_attr(body, "bad name", "x"),
            Err(DomError::InvalidName("bad name".to_string()))
        );
    }

    #[test]
    fn materialize_round_trips_subtree() {
        let node = parse_fragment(r#"<li class="a"><a href="/x">t</a></li>"#).unwrap();
        let mut dom = LiveDom::new();
        let key = dom.create(&node).unwrap();
        assert_eq!(dom.materialize(key).unwrap(), node);
        assert!(!dom.is_connected(key));
    }
}
