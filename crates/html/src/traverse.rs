use crate::{LiveDom, NodeKey};

/// Pre-order (document order) walk over the strict descendants of `scope`.
pub fn descendants(dom: &LiveDom, scope: NodeKey) -> Descendants<'_> {
    let mut stack: Vec<NodeKey> = dom.children(scope).to_vec();
    stack.reverse();
    Descendants { dom, stack }
}

/// Element descendants of `scope`, in document order.
pub fn element_descendants(dom: &LiveDom, scope: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
    descendants(dom, scope).filter(move |k| dom.is_element(*k))
}

pub struct Descendants<'a> {
    dom: &'a LiveDom,
    stack: Vec<NodeKey>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<NodeKey> {
        let key = self.stack.pop()?;
        self.stack
            .extend(self.dom.children(key).iter().rev().copied());
        Some(key)
    }
}

/// Ancestors of `key`, nearest first, including the document root.
pub fn ancestors(dom: &LiveDom, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
    std::iter::successors(dom.parent(key), move |k| dom.parent(*k))
}
