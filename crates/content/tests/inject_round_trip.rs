mod common;

use common::Harness;
use content::{InjectDescriptor, InjectError};
use html::NodeKey;
use std::cell::RefCell;
use std::rc::Rc;

const MENU: &str = r#"<div id="menu"><ul class="list"><li class="a">A</li><li class="b">B</li></ul></div>"#;

fn recorder() -> (Rc<RefCell<Vec<NodeKey>>>, impl FnMut(&mut html::LiveDom, NodeKey) + 'static) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |_: &mut html::LiveDom, key| sink.borrow_mut().push(key))
}

#[test]
fn placeholder_is_replaced_with_content() {
    let mut h = Harness::new(MENU);
    let (seen, callback) = recorder();
    let pending = h
        .injector
        .inject(
            InjectDescriptor::new("#menu ul.list", r#"<li class="mine"><span>hi</span></li>"#)
                .at_index(0)
                .on_inject(callback),
        )
        .unwrap();
    assert_eq!(pending.elem_id.to_string(), "btr-react-0");

    h.settle();

    assert_eq!(
        h.outline(),
        vec![
            "#document",
            r#"  <div id="menu">"#,
            r#"    <ul class="list">"#,
            r#"      <li class="mine">"#,
            "        <span>",
            r#"          "hi""#,
            r#"      <li class="a">"#,
            r#"        "A""#,
            r#"      <li class="b">"#,
            r#"        "B""#,
        ]
    );
    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert!(h.dom.has_class(seen[0], "mine"));
    assert!(h.dom.is_connected(seen[0]));
}

#[test]
fn rerendered_placeholder_is_filled_again() {
    let mut h = Harness::new(MENU);
    let (seen, callback) = recorder();
    let pending = h
        .injector
        .inject(InjectDescriptor::new("ul", r#"<li class="mine"></li>"#).on_inject(callback))
        .unwrap();
    h.settle();
    let first = seen.borrow()[0];

    // The page drops our content and renders a fresh placeholder.
    let list = h.dom.parent(first).unwrap();
    h.dom.remove(first).unwrap();
    let placeholder = h.dom.create_element("li");
    h.dom
        .set_attr(placeholder, "id", &pending.elem_id.to_string())
        .unwrap();
    h.dom.append_child(list, placeholder).unwrap();
    h.settle();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_ne!(seen[0], seen[1]);
    assert!(h.dom.has_class(seen[1], "mine"));
    assert!(pending.subscription.is_active());
}

#[test]
fn cancelled_injection_leaves_placeholder_alone() {
    let mut h = Harness::new(MENU);
    let (seen, callback) = recorder();
    let pending = h
        .injector
        .inject(InjectDescriptor::new("ul", "<li>x</li>").on_inject(callback))
        .unwrap();
    pending.subscription.cancel();
    h.settle();

    assert!(seen.borrow().is_empty());
    assert!(
        h.outline()
            .iter()
            .any(|line| line.trim() == r#"<li id="btr-react-0">"#)
    );
}

#[test]
fn every_request_gets_a_fresh_id() {
    let mut h = Harness::new(MENU);
    let ids: Vec<String> = ["<li>one</li>", "<li>two</li>", "<li>three</li>"]
        .into_iter()
        .map(|markup| {
            h.injector
                .inject(InjectDescriptor::new("ul.list", markup))
                .unwrap()
                .elem_id
                .to_string()
        })
        .collect();
    assert_eq!(ids, ["btr-react-0", "btr-react-1", "btr-react-2"]);

    h.settle();
    let texts: Vec<String> = h
        .outline()
        .iter()
        .skip(4)
        .map(|line| line.trim().to_string())
        .collect();
    assert_eq!(
        texts,
        [r#""A""#, r#"<li class="b">"#, r#""B""#, "<li>", r#""one""#, "<li>", r#""two""#, "<li>", r#""three""#]
    );
}

#[test]
fn index_selector_inserts_before_matching_child() {
    let mut h = Harness::new(MENU);
    h.injector
        .inject(InjectDescriptor::new("ul", r#"<li class="mine"></li>"#).at_matching("li.b"))
        .unwrap();
    h.settle();

    let list = h.dom.element_children(h.dom.element_children(h.dom.root())[0])[0];
    let classes: Vec<&str> = h
        .dom
        .element_children(list)
        .into_iter()
        .map(|key| h.dom.attr(key, "class").unwrap_or(""))
        .collect();
    assert_eq!(classes, ["a", "mine", "b"]);
}

#[test]
fn missing_anchor_stays_pending() {
    let mut h = Harness::new(MENU);
    let (seen, callback) = recorder();
    let pending = h
        .injector
        .inject(InjectDescriptor::new("#not-rendered-yet", "<div></div>").on_inject(callback))
        .unwrap();
    h.settle();

    assert!(seen.borrow().is_empty());
    assert!(h.realm.placeholders().is_empty());
    assert!(pending.subscription.is_active());
    assert_eq!(h.watcher.len(), 1);
}

#[test]
fn rejected_requests_send_nothing() {
    let h = Harness::new(MENU);

    let err = h
        .injector
        .inject(InjectDescriptor::new("ul > li", "<li></li>"))
        .unwrap_err();
    assert!(matches!(err, InjectError::Selector(_)));

    let err = h
        .injector
        .inject(InjectDescriptor::new("ul", "<li></li><li></li>"))
        .unwrap_err();
    assert!(matches!(err, InjectError::Fragment(_)));

    assert!(h.bus.drain().is_empty());
    assert_eq!(h.ids.peek(), 0);
    assert!(h.watcher.is_empty());
}
