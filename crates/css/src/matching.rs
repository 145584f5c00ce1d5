use crate::syntax::{Combinator, ComplexSelector, CompoundSelector, SelectorList};
use html::dom_utils::{get_attr, has_class};
use html::traverse::{ancestors, element_descendants};
use html::{LiveDom, NodeKey};

// Check if an element matches one compound selector
pub fn matches_compound(dom: &LiveDom, key: NodeKey, compound: &CompoundSelector) -> bool {
    let (Some(name), Some(attributes)) = (dom.element_name(key), dom.attributes(key)) else {
        return false;
    };
    if let Some(tag) = &compound.tag {
        if !name.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(want) = &compound.id {
        if get_attr(attributes, "id") != Some(want.as_str()) {
            return false;
        }
    }
    if !compound.classes.iter().all(|c| has_class(attributes, c)) {
        return false;
    }
    compound.attributes.iter().all(|attr| {
        let present = attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(&attr.name));
        match (present, &attr.value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some((_, value)), Some(want)) => value.as_deref().unwrap_or("") == want,
        }
    })
}

/// True when `key` is an element inside `scope` that matches `selector`.
/// Ancestor constraints are only satisfied by elements strictly inside `scope`.
pub fn matches(dom: &LiveDom, key: NodeKey, selector: &ComplexSelector, scope: NodeKey) -> bool {
    if selector.compounds.is_empty() || !ancestors(dom, key).any(|a| a == scope) {
        return false;
    }
    match_at(dom, key, selector, selector.compounds.len() - 1, scope)
}

pub fn matches_any(dom: &LiveDom, key: NodeKey, list: &SelectorList, scope: NodeKey) -> bool {
    list.0.iter().any(|selector| matches(dom, key, selector, scope))
}

// Right-to-left: `key` must match compounds[index], then the combinator to
// its left decides which ancestors may match the rest.
fn match_at(
    dom: &LiveDom,
    key: NodeKey,
    selector: &ComplexSelector,
    index: usize,
    scope: NodeKey,
) -> bool {
    if !matches_compound(dom, key, &selector.compounds[index]) {
        return false;
    }
    if index == 0 {
        return true;
    }
    match selector.combinators[index - 1] {
        Combinator::Child => match dom.parent(key) {
            Some(parent) if parent != scope => match_at(dom, parent, selector, index - 1, scope),
            _ => false,
        },
        Combinator::Descendant => ancestors(dom, key)
            .take_while(|a| *a != scope)
            .any(|a| match_at(dom, a, selector, index - 1, scope)),
    }
}

/// All elements under `scope` matching any selector in `list`, in document order.
pub fn query_all(dom: &LiveDom, scope: NodeKey, list: &SelectorList) -> Vec<NodeKey> {
    element_descendants(dom, scope)
        .filter(|key| list.0.iter().any(|s| match_at_root(dom, *key, s, scope)))
        .collect()
}

pub fn query_first(dom: &LiveDom, scope: NodeKey, list: &SelectorList) -> Option<NodeKey> {
    element_descendants(dom, scope).find(|key| list.0.iter().any(|s| match_at_root(dom, *key, s, scope)))
}

// Descendant walks already guarantee `key` is inside `scope`.
fn match_at_root(dom: &LiveDom, key: NodeKey, selector: &ComplexSelector, scope: NodeKey) -> bool {
    !selector.compounds.is_empty()
        && match_at(dom, key, selector, selector.compounds.len() - 1, scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_selector_list;

    fn names(dom: &LiveDom, keys: &[NodeKey]) -> Vec<String> {
        keys.iter()
            .map(|k| {
                let name = dom.element_name(*k).unwrap_or("?");
                match dom.attr(*k, "id") {
                    Some(id) => format!("{name}#{id}"),
                    None => name.to_string(),
                }
            })
            .collect()
    }

    const PAGE: &str = r#"
        <head><meta name="user-data" data-userid="42"><meta name="other"></head>
        <body class="light">
          <ul id="settings-popover-menu"><li id="a"><a class="rbx-menu-item"></a></li><li id="b"></li></ul>
          <div id="chat-container"><ul><li id="nested"></li></ul></div>
        </body>"#;

    #[test]
    fn query_all_returns_document_order() {
        let dom = LiveDom::parse(PAGE);
        let list = parse_selector_list("li").unwrap();
        assert_eq!(
            names(&dom, &query_all(&dom, dom.root(), &list)),
            vec!["li#a", "li#b", "li#nested"]
        );
    }

    #[test]
    fn child_combinator_requires_direct_parent() {
        let dom = LiveDom::parse(PAGE);
        let list = parse_selector_list("#settings-popover-menu > li").unwrap();
        assert_eq!(names(&dom, &query_all(&dom, dom.root(), &list)), vec!["li#a", "li#b"]);
        let list = parse_selector_list("body > li").unwrap();
        assert!(query_all(&dom, dom.root(), &list).is_empty());
    }

    #[test]
    fn descendant_combinator_walks_all_ancestors() {
        let dom = LiveDom::parse(PAGE);
        let list = parse_selector_list("body.light #chat-container li").unwrap();
        assert_eq!(names(&dom, &query_all(&dom, dom.root(), &list)), vec!["li#nested"]);
    }

    #[test]
    fn attribute_selectors_compare_values() {
        let dom = LiveDom::parse(PAGE);
        let list = parse_selector_list(r#"meta[name="user-data"]"#).unwrap();
        let found = query_first(&dom, dom.root(), &list).unwrap();
        assert_eq!(dom.attr(found, "data-userid"), Some("42"));
        let list = parse_selector_list("meta[content]").unwrap();
        assert_eq!(query_first(&dom, dom.root(), &list), None);
    }

    #[test]
    fn ancestors_outside_scope_do_not_count() {
        let dom = LiveDom::parse(PAGE);
        let menu = query_first(&dom, dom.root(), &parse_selector_list("#settings-popover-menu").unwrap()).unwrap();
        let list = parse_selector_list("body li").unwrap();
        assert!(query_all(&dom, menu, &list).is_empty());
        let list = parse_selector_list("li a.rbx-menu-item").unwrap();
        let anchors = query_all(&dom, menu, &list);
        assert_eq!(anchors.len(), 1);
        assert!(matches(&dom, anchors[0], &list.0[0], menu));
        assert!(!matches(&dom, anchors[0], &list.0[0], anchors[0]));
    }
}
