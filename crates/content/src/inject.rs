//! Placeholder injection into page-owned component trees.
//!
//! The content script cannot walk the page's component tree itself. Instead
//! it sends a compiled selector and a placeholder id across the boundary; the
//! page realm inserts an empty element with that id, and a local continuous
//! watch swaps it for the real markup each time it appears.

use bus::{Boundary, IndexSelector, InjectRequest, InsertIndex, PageCommand};
use core_types::{ElemId, Sequence};
use dom_watch::{Subscription, WatchError, WatchOptions, Watcher};
use html::{DomError, FragmentError, LiveDom, Node, NodeKey, parse_fragment};
use selector::{SelectorError, SelectorInput, compile};
use serde_json::{Map, Value};
use std::rc::Rc;

/// Called with the key of the freshly inserted content.
pub type InjectCallback = Box<dyn FnMut(&mut LiveDom, NodeKey)>;

#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error("malformed fragment: {0}")]
    Fragment(#[from] FragmentError),
    #[error(transparent)]
    Watch(#[from] WatchError),
}

pub enum IndexInput {
    Position(i64),
    /// Position among the anchor's children picked by a sub-selector.
    Matching {
        selector: SelectorInput,
        extra: Map<String, Value>,
    },
}

pub struct InjectDescriptor {
    pub selector: SelectorInput,
    pub index: Option<IndexInput>,
    pub html: String,
    pub callback: Option<InjectCallback>,
    /// Forwarded to the page realm as-is.
    pub extra: Map<String, Value>,
}

impl InjectDescriptor {
    pub fn new(selector: impl Into<SelectorInput>, html: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            index: None,
            html: html.into(),
            callback: None,
            extra: Map::new(),
        }
    }

    pub fn at_index(mut self, index: i64) -> Self {
        self.index = Some(IndexInput::Position(index));
        self
    }

    pub fn at_matching(mut self, selector: impl Into<SelectorInput>) -> Self {
        self.index = Some(IndexInput::Matching {
            selector: selector.into(),
            extra: Map::new(),
        });
        self
    }

    pub fn on_inject(mut self, callback: impl FnMut(&mut LiveDom, NodeKey) + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// A dispatched request. Nothing reports whether the page realm ever acts on it.
#[derive(Debug)]
pub struct PendingInjection {
    pub elem_id: ElemId,
    pub subscription: Subscription,
}

pub struct ReactInjector {
    watcher: Rc<dyn Watcher>,
    boundary: Rc<dyn Boundary>,
    ids: Rc<dyn Sequence>,
}

impl ReactInjector {
    pub fn new(watcher: Rc<dyn Watcher>, boundary: Rc<dyn Boundary>, ids: Rc<dyn Sequence>) -> Self {
        Self {
            watcher,
            boundary,
            ids,
        }
    }

    /// Ask the page realm to place a placeholder for `descriptor.html`.
    ///
    /// Selector and fragment errors are reported before an id is taken,
    /// a watch is registered or anything is sent.
    pub fn inject(&self, descriptor: InjectDescriptor) -> Result<PendingInjection, InjectError> {
        let InjectDescriptor {
            selector,
            index,
            html,
            mut callback,
            extra,
        } = descriptor;

        let selector = compile(&selector)?;
        let index = match index {
            None => None,
            Some(IndexInput::Position(position)) => Some(InsertIndex::Position(position)),
            Some(IndexInput::Matching { selector, extra }) => Some(InsertIndex::Matching(IndexSelector {
                selector: compile(&selector)?,
                extra,
            })),
        };
        let fragment = parse_fragment(&html)?;
        let elem_type = fragment
            .element_name()
            .unwrap_or_default()
            .to_ascii_lowercase();

        let elem_id = ElemId::from_raw(self.ids.next_value());
        let subscription = self.watcher.watch(
            &elem_id.css_selector(),
            WatchOptions::continuous(),
            Box::new(move |dom, placeholder| match swap_in(dom, placeholder, &fragment) {
                Ok(content) => {
                    log::trace!(target: "btr.inject", "{elem_id} replaced by {content:?}");
                    if let Some(callback) = callback.as_mut() {
                        callback(dom, content);
                    }
                }
                Err(err) => log::warn!(target: "btr.inject", "cannot replace {elem_id}: {err}"),
            }),
        )?;

        log::debug!(target: "btr.inject", "reactInject {elem_id} <{elem_type}>");
        self.boundary.send(PageCommand::ReactInject(InjectRequest {
            selector,
            index,
            elem_type,
            elem_id,
            extra,
        }));
        Ok(PendingInjection {
            elem_id,
            subscription,
        })
    }
}

// Fresh copy of the fragment every time; the placeholder may be re-rendered.
fn swap_in(dom: &mut LiveDom, placeholder: NodeKey, fragment: &Node) -> Result<NodeKey, DomError> {
    let content = dom.create(fragment)?;
    if let Err(err) = dom.replace_with(placeholder, content) {
        // Nothing refers to the copy; drop it from the arena.
        let _ = dom.remove(content);
        return Err(err);
    }
    Ok(content)
}
