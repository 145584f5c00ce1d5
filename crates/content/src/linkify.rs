use bus::{Boundary, PageCommand};
use core_types::Sequence;
use html::{DomError, LiveDom, NodeKey};
use std::rc::Rc;

pub const LINKIFY_CLASS_PREFIX: &str = "btr-linkify-pls-";

/// Asks the page's own linkifier to process one element.
///
/// The element is tagged with a one-off class for the duration of the send,
/// which assumes the page realm handles the request during delivery.
pub struct Linkifier {
    boundary: Rc<dyn Boundary>,
    ids: Rc<dyn Sequence>,
}

impl Linkifier {
    pub fn new(boundary: Rc<dyn Boundary>, ids: Rc<dyn Sequence>) -> Self {
        Self { boundary, ids }
    }

    /// Returns the marker class that was sent.
    pub fn linkify(&self, dom: &mut LiveDom, target: NodeKey) -> Result<String, DomError> {
        let class_name = format!("{LINKIFY_CLASS_PREFIX}{}", self.ids.next_value());
        dom.add_class(target, &class_name)?;
        self.boundary.send(PageCommand::Linkify(class_name.clone()));
        dom.remove_class(target, &class_name)?;
        Ok(class_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Counter;
    use std::cell::RefCell;

    // Records every command sent.
    struct Snooper {
        sent: RefCell<Vec<PageCommand>>,
    }

    impl Boundary for Snooper {
        fn send(&self, command: PageCommand) {
            self.sent.borrow_mut().push(command);
        }
    }

    #[test]
    fn marker_class_is_unique_and_removed() {
        let mut dom = LiveDom::parse(r#"<p class="text">see youtube.com</p>"#);
        let p = dom.element_children(dom.root())[0];
        let snooper = Rc::new(Snooper {
            sent: RefCell::new(Vec::new()),
        });
        let linkifier = Linkifier::new(snooper.clone(), Rc::new(Counter::starting_at(7)));

        assert_eq!(linkifier.linkify(&mut dom, p).unwrap(), "btr-linkify-pls-7");
        assert_eq!(linkifier.linkify(&mut dom, p).unwrap(), "btr-linkify-pls-8");
        assert_eq!(dom.attr(p, "class"), Some("text"));
        assert_eq!(
            *snooper.sent.borrow(),
            vec![
                PageCommand::Linkify("btr-linkify-pls-7".to_string()),
                PageCommand::Linkify("btr-linkify-pls-8".to_string()),
            ]
        );
    }

    #[test]
    fn text_nodes_are_rejected() {
        let mut dom = LiveDom::parse("plain");
        let text = dom.children(dom.root())[0];
        let linkifier = Linkifier::new(
            Rc::new(Snooper {
                sent: RefCell::new(Vec::new()),
            }),
            Rc::new(Counter::new()),
        );
        assert!(linkifier.linkify(&mut dom, text).is_err());
    }
}
