//! Local element watching.
//!
//! A watch runs its callback whenever an element matching a query shows up
//! in the live document. [`DomWatcher`] is driven explicitly: the host calls
//! [`DomWatcher::flush`] after it mutates the document, the way a mutation
//! observer delivers records at the end of a task.

use css::{CssError, SelectorList, matches_any, parse_selector_list, query_all};
use html::{LiveDom, NodeKey};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

pub type WatchCallback = Box<dyn FnMut(&mut LiveDom, NodeKey)>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WatchOptions {
    /// Keep firing for every new match instead of only the first one.
    pub continuous: bool,
}

impl WatchOptions {
    pub fn once() -> Self {
        Self { continuous: false }
    }

    pub fn continuous() -> Self {
        Self { continuous: true }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error(transparent)]
    Query(#[from] CssError),
}

pub trait Watcher {
    fn watch(
        &self,
        query: &str,
        options: WatchOptions,
        callback: WatchCallback,
    ) -> Result<Subscription, WatchError>;
}

/// Handle to a registered watch. Dropping it does not cancel the watch.
#[derive(Clone, Debug)]
pub struct Subscription {
    id: u64,
    active: Rc<Cell<bool>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.active.set(false);
    }

    /// False once cancelled, or once a single-shot watch has fired.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

struct WatchEntry {
    id: u64,
    source: String,
    query: Rc<SelectorList>,
    options: WatchOptions,
    // Taken out while the callback runs so it can register further watches.
    callback: Option<WatchCallback>,
    // Matches seen by the previous round; only newcomers fire.
    seen: HashSet<NodeKey>,
    active: Rc<Cell<bool>>,
}

const MAX_ROUNDS: usize = 64;

#[derive(Default)]
pub struct DomWatcher {
    entries: RefCell<Vec<WatchEntry>>,
    next_id: Cell<u64>,
}

impl DomWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of watches still registered.
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.active.get())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver pending matches until callbacks stop producing new ones.
    /// Returns how many callbacks ran.
    pub fn flush(&self, dom: &mut LiveDom) -> usize {
        let mut fired = 0;
        let mut settled = false;
        for _ in 0..MAX_ROUNDS {
            let round = self.run_round(dom);
            fired += round;
            if round == 0 {
                settled = true;
                break;
            }
        }
        if !settled {
            log::warn!(
                target: "btr.watch",
                "watchers did not settle after {MAX_ROUNDS} rounds ({fired} callbacks)"
            );
        }
        self.entries.borrow_mut().retain(|e| e.active.get());
        fired
    }

    fn run_round(&self, dom: &mut LiveDom) -> usize {
        let ids: Vec<u64> = self
            .entries
            .borrow()
            .iter()
            .filter(|e| e.active.get())
            .map(|e| e.id)
            .collect();

        let mut fired = 0;
        for id in ids {
            let (fresh, mut callback, query, active, options, source) = {
                let mut entries = self.entries.borrow_mut();
                let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
                    continue;
                };
                if !entry.active.get() {
                    continue;
                }
                let current = query_all(dom, dom.root(), &entry.query);
                let fresh: Vec<NodeKey> = current
                    .iter()
                    .copied()
                    .filter(|k| !entry.seen.contains(k))
                    .collect();
                entry.seen = current.into_iter().collect();
                if fresh.is_empty() {
                    continue;
                }
                let Some(callback) = entry.callback.take() else {
                    continue;
                };
                (
                    fresh,
                    callback,
                    Rc::clone(&entry.query),
                    Rc::clone(&entry.active),
                    entry.options,
                    entry.source.clone(),
                )
            };

            for key in fresh {
                // An earlier callback may have moved or removed it.
                if !active.get() || !matches_any(dom, key, &query, dom.root()) {
                    continue;
                }
                log::trace!(target: "btr.watch", "watch {id} ({source}) fired on {key:?}");
                callback(dom, key);
                fired += 1;
                if !options.continuous {
                    active.set(false);
                }
            }

            if let Some(entry) = self.entries.borrow_mut().iter_mut().find(|e| e.id == id) {
                entry.callback = Some(callback);
            }
        }
        fired
    }
}

impl Watcher for DomWatcher {
    fn watch(
        &self,
        query: &str,
        options: WatchOptions,
        callback: WatchCallback,
    ) -> Result<Subscription, WatchError> {
        let parsed = parse_selector_list(query)?;
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let active = Rc::new(Cell::new(true));
        log::debug!(target: "btr.watch", "watch {id} on {query:?} (continuous: {})", options.continuous);
        self.entries.borrow_mut().push(WatchEntry {
            id,
            source: query.to_string(),
            query: Rc::new(parsed),
            options,
            callback: Some(callback),
            seen: HashSet::new(),
            active: Rc::clone(&active),
        });
        Ok(Subscription { id, active })
    }
}

impl<W: Watcher + ?Sized> Watcher for Rc<W> {
    fn watch(
        &self,
        query: &str,
        options: WatchOptions,
        callback: WatchCallback,
    ) -> Result<Subscription, WatchError> {
        (**self).watch(query, options, callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<usize>>, WatchCallback) {
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        let callback: WatchCallback = Box::new(move |_, _| seen.set(seen.get() + 1));
        (hits, callback)
    }

    #[test]
    fn single_shot_fires_on_first_match_only() {
        let mut dom = LiveDom::parse("<ul><li></li><li></li></ul>");
        let watcher = DomWatcher::new();
        let (hits, cb) = counter();
        let sub = watcher.watch("li", WatchOptions::once(), cb).unwrap();

        assert_eq!(watcher.flush(&mut dom), 1);
        assert_eq!(hits.get(), 1);
        assert!(!sub.is_active());
        assert!(watcher.is_empty());
    }

    #[test]
    fn continuous_fires_for_each_new_match() {
        let mut dom = LiveDom::parse("<ul><li></li></ul>");
        let watcher = DomWatcher::new();
        let (hits, cb) = counter();
        watcher.watch("li", WatchOptions::continuous(), cb).unwrap();
        watcher.flush(&mut dom);
        assert_eq!(hits.get(), 1);

        // Already-seen matches stay quiet.
        watcher.flush(&mut dom);
        assert_eq!(hits.get(), 1);

        let ul = dom.element_children(dom.root())[0];
        let li = dom.create_element("li");
        dom.append_child(ul, li).unwrap();
        watcher.flush(&mut dom);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn cancelled_watch_never_fires() {
        let mut dom = LiveDom::parse("<p></p>");
        let watcher = DomWatcher::new();
        let (hits, cb) = counter();
        let sub = watcher.watch("p", WatchOptions::continuous(), cb).unwrap();
        sub.cancel();
        assert_eq!(watcher.flush(&mut dom), 0);
        assert_eq!(hits.get(), 0);
        assert_eq!(watcher.len(), 0);
    }

    #[test]
    fn callbacks_can_register_watches() {
        let mut dom = LiveDom::parse("<body><div id=\"chat-container\"></div></body>");
        let watcher = Rc::new(DomWatcher::new());
        let inner_hits = Rc::new(Cell::new(0));

        let nested = Rc::clone(&watcher);
        let hits = Rc::clone(&inner_hits);
        watcher
            .watch(
                "body",
                WatchOptions::once(),
                Box::new(move |_, _| {
                    let hits = Rc::clone(&hits);
                    nested
                        .watch(
                            "#chat-container",
                            WatchOptions::once(),
                            Box::new(move |_, _| hits.set(hits.get() + 1)),
                        )
                        .unwrap();
                }),
            )
            .unwrap();

        assert_eq!(watcher.flush(&mut dom), 2);
        assert_eq!(inner_hits.get(), 1);
    }

    #[test]
    fn removed_before_delivery_is_skipped() {
        let mut dom = LiveDom::parse("<a></a><a></a>");
        let watcher = DomWatcher::new();
        let hits = Rc::new(Cell::new(0));
        let count = Rc::clone(&hits);
        watcher
            .watch(
                "a",
                WatchOptions::continuous(),
                Box::new(move |dom, key| {
                    count.set(count.get() + 1);
                    let last = *dom.element_children(dom.root()).last().unwrap();
                    if last != key {
                        dom.remove(last).unwrap();
                    }
                }),
            )
            .unwrap();
        assert_eq!(watcher.flush(&mut dom), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn bad_query_is_rejected() {
        let watcher = DomWatcher::new();
        let (_, cb) = counter();
        assert!(matches!(
            watcher.watch("a:hover", WatchOptions::once(), cb),
            Err(WatchError::Query(_))
        ));
    }

    #[test]
    fn runaway_watch_stops_after_round_limit() {
        let mut dom = LiveDom::parse("<div></div>");
        let watcher = DomWatcher::new();
        watcher
            .watch(
                "div",
                WatchOptions::continuous(),
                Box::new(|dom, key| {
                    let child = dom.create_element("div");
                    dom.append_child(key, child).unwrap();
                }),
            )
            .unwrap();
        assert_eq!(watcher.flush(&mut dom), MAX_ROUNDS);
    }
}
