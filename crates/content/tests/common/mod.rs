#![allow(dead_code)]

use bus::Bus;
use content::ReactInjector;
use core_types::Counter;
use dom_watch::DomWatcher;
use html::LiveDom;
use html::dom_utils::outline_from_dom;
use page_sim::PageRealm;
use std::rc::Rc;

/// Content script and page realm wired over an in-process bus.
pub struct Harness {
    pub bus: Bus,
    pub watcher: Rc<DomWatcher>,
    pub ids: Rc<Counter>,
    pub injector: Rc<ReactInjector>,
    pub realm: PageRealm,
    pub dom: LiveDom,
}

impl Harness {
    pub fn new(html: &str) -> Self {
        let bus = Bus::new();
        let watcher = Rc::new(DomWatcher::new());
        let ids = Rc::new(Counter::new());
        let injector = Rc::new(ReactInjector::new(
            watcher.clone(),
            Rc::new(bus.boundary()),
            ids.clone(),
        ));
        Self {
            bus,
            watcher,
            ids,
            injector,
            realm: PageRealm::new(),
            dom: LiveDom::parse(html),
        }
    }

    /// Deliver queued commands and run watches until nothing changes.
    pub fn settle(&mut self) {
        loop {
            let inserted = self.realm.pump(&self.bus, &mut self.dom);
            let fired = self.watcher.flush(&mut self.dom);
            if inserted == 0 && fired == 0 {
                break;
            }
        }
    }

    pub fn outline(&self) -> Vec<String> {
        let tree = self
            .dom
            .materialize(self.dom.root())
            .expect("root is always live");
        outline_from_dom(&tree, 200)
    }
}
