use bus::{Bus, InjectRequest, InsertIndex, PageCommand, decode_command};
use html::traverse::element_descendants;
use html::{DomError, LiveDom, NodeKey};
use selector::{CompiledSelector, NodeMatcher};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum RealmError {
    #[error("undecodable page command: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Receiving side of the boundary.
#[derive(Debug, Default)]
pub struct PageRealm {
    linkify_requests: Vec<String>,
    placeholders: Vec<NodeKey>,
}

impl PageRealm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receive(&mut self, dom: &mut LiveDom, json: &str) -> Result<Option<NodeKey>, RealmError> {
        let command = decode_command(json)?;
        Ok(self.handle(dom, &command)?)
    }

    /// Returns the inserted placeholder, if an anchor was found.
    pub fn handle(&mut self, dom: &mut LiveDom, command: &PageCommand) -> Result<Option<NodeKey>, DomError> {
        match command {
            PageCommand::ReactInject(request) => {
                let placeholder = insert_placeholder(dom, request)?;
                self.placeholders.extend(placeholder);
                Ok(placeholder)
            }
            PageCommand::Linkify(class_name) => {
                log::debug!(target: "btr.page", "linkify .{class_name}");
                self.linkify_requests.push(class_name.clone());
                Ok(None)
            }
        }
    }

    /// Handle everything queued on `bus`. Bad messages are logged and skipped.
    pub fn pump(&mut self, bus: &Bus, dom: &mut LiveDom) -> usize {
        let mut inserted = 0;
        for json in bus.drain() {
            match self.receive(dom, &json) {
                Ok(Some(_)) => inserted += 1,
                Ok(None) => {}
                Err(err) => log::warn!(target: "btr.page", "{err}"),
            }
        }
        inserted
    }

    pub fn linkify_requests(&self) -> &[String] {
        &self.linkify_requests
    }

    /// Every placeholder inserted so far, in order.
    pub fn placeholders(&self) -> &[NodeKey] {
        &self.placeholders
    }
}

fn insert_placeholder(dom: &mut LiveDom, request: &InjectRequest) -> Result<Option<NodeKey>, DomError> {
    // No anchor means the request just never completes.
    let Some(anchor) = find_anchor(dom, dom.root(), &request.selector) else {
        log::debug!(target: "btr.page", "no anchor for {}", request.elem_id);
        return Ok(None);
    };
    let position = insertion_point(dom, anchor, request.index.as_ref());
    let placeholder = dom.create_element(&request.elem_type);
    dom.set_attr(placeholder, "id", &request.elem_id.to_string())?;
    dom.insert_child(anchor, position, placeholder)?;
    Ok(Some(placeholder))
}

// Raw child offset in `anchor` for the requested element index.
fn insertion_point(dom: &LiveDom, anchor: NodeKey, index: Option<&InsertIndex>) -> usize {
    let children = dom.children(anchor);
    let elements = dom.element_children(anchor);
    let before = match index {
        None => None,
        Some(InsertIndex::Position(n)) => usize::try_from(*n)
            .ok()
            .and_then(|n| elements.get(n).copied())
            .or_else(|| (*n < 0).then(|| elements.first().copied()).flatten()),
        Some(InsertIndex::Matching(sel)) => elements
            .iter()
            .copied()
            .find(|child| sel.selector.iter().any(|chain| chain_matches_at(dom, *child, chain))),
    };
    before
        .and_then(|key| children.iter().position(|c| *c == key))
        .unwrap_or(children.len())
}

/// First element, in document order, completing any chain under `scope`.
pub fn find_anchor(dom: &LiveDom, scope: NodeKey, selector: &CompiledSelector) -> Option<NodeKey> {
    let mut found: Vec<NodeKey> = selector
        .iter()
        .filter_map(|chain| first_in(dom, scope, chain))
        .collect();
    let order: Vec<NodeKey> = element_descendants(dom, scope).collect();
    found.sort_by_key(|key| order.iter().position(|k| k == key));
    found.first().copied()
}

fn first_in(dom: &LiveDom, scope: NodeKey, matcher: &NodeMatcher) -> Option<NodeKey> {
    element_descendants(dom, scope).find_map(|key| chain_end(dom, key, matcher))
}

// `key` matches the head of the chain; the rest must be found below it.
fn chain_end(dom: &LiveDom, key: NodeKey, matcher: &NodeMatcher) -> Option<NodeKey> {
    if !matcher_matches(dom, key, matcher) {
        return None;
    }
    match matcher.next.as_deref() {
        None => Some(key),
        Some(next) => first_in(dom, key, next),
    }
}

fn chain_matches_at(dom: &LiveDom, key: NodeKey, chain: &NodeMatcher) -> bool {
    chain_end(dom, key, chain).is_some()
}

/// Tag, classes and props of one step; unknown fields are ignored.
pub fn matcher_matches(dom: &LiveDom, key: NodeKey, matcher: &NodeMatcher) -> bool {
    let Some(name) = dom.element_name(key) else {
        return false;
    };
    if matcher.node_type.as_deref().is_some_and(|t| !t.eq_ignore_ascii_case(name)) {
        return false;
    }
    if let Some(classes) = &matcher.class_list {
        if !classes.iter().all(|c| dom.has_class(key, c)) {
            return false;
        }
    }
    matcher.props.iter().flatten().all(|(prop, want)| {
        let have = dom.attr(key, prop);
        match want {
            Value::Null => have.is_none(),
            Value::String(want) => have == Some(want.as_str()),
            other => have == Some(other.to_string().as_str()),
        }
    })
}
