use crate::{CompositeSelector, NodeMatcher, SelectorError, compile};
use serde_json::{Map, Value};

/// Expand a directive into chains and merge its extra fields onto every leaf.
///
/// Arrays append (duplicates kept), objects shallow-merge with the directive
/// winning, anything else overwrites. Ancestor steps are never touched.
pub fn normalize(directive: &CompositeSelector) -> Result<Vec<NodeMatcher>, SelectorError> {
    if directive.next.is_some() {
        return Err(SelectorError::Invalid(format!(
            "composite selector {} must not set `next`",
            directive.selector.describe()
        )));
    }
    let mut chains = compile(&directive.selector)?.into_chains();
    for chain in &mut chains {
        merge_onto_leaf(chain.leaf_mut(), directive);
    }
    Ok(chains)
}

fn merge_onto_leaf(leaf: &mut NodeMatcher, directive: &CompositeSelector) {
    debug_assert!(leaf.is_leaf());
    if let Some(tag) = &directive.node_type {
        leaf.node_type = Some(tag.clone());
    }
    if let Some(classes) = &directive.class_list {
        leaf.class_list
            .get_or_insert_with(Vec::new)
            .extend(classes.iter().cloned());
    }
    if let Some(props) = &directive.props {
        let target = leaf.props.get_or_insert_with(Map::new);
        for (key, value) in props {
            target.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in &directive.extra {
        merge_value(&mut leaf.extra, key, value);
    }
}

fn merge_value(target: &mut Map<String, Value>, key: &str, value: &Value) {
    match (target.get_mut(key), value) {
        (Some(Value::Array(existing)), Value::Array(more)) => existing.extend(more.iter().cloned()),
        (Some(Value::Object(existing)), Value::Object(more)) => {
            for (k, v) in more {
                existing.insert(k.clone(), v.clone());
            }
        }
        _ => {
            target.insert(key.to_string(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SelectorInput;
    use serde_json::json;

    fn directive(raw: Value) -> CompositeSelector {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn classes_append_to_leaf_only() {
        let chains = normalize(&directive(json!({
            "selector": "ul.list li.item",
            "classList": ["extra", "item"]
        })))
        .unwrap();
        assert_eq!(
            serde_json::to_value(&chains).unwrap(),
            json!([{
                "type": "ul",
                "classList": ["list"],
                "next": {"type": "li", "classList": ["item", "extra", "item"]}
            }])
        );
    }

    #[test]
    fn props_merge_with_directive_winning() {
        let chains = normalize(&directive(json!({
            "selector": ["#a", "b"],
            "props": {"id": "z", "role": "menu"}
        })))
        .unwrap();
        assert_eq!(
            serde_json::to_value(&chains).unwrap(),
            json!([
                {"props": {"id": "z", "role": "menu"}},
                {"type": "b", "props": {"id": "z", "role": "menu"}}
            ])
        );
    }

    #[test]
    fn scalars_overwrite_and_extras_merge_by_shape() {
        let chains = normalize(&directive(json!({
            "selector": {"type": "li", "tags": [1], "meta": {"a": 1}, "flag": "old"},
            "type": "div",
            "tags": [2],
            "meta": {"b": 2},
            "flag": null
        })))
        .unwrap();
        assert_eq!(
            serde_json::to_value(&chains).unwrap(),
            json!([{"type": "div", "tags": [1, 2], "meta": {"a": 1, "b": 2}, "flag": null}])
        );
    }

    #[test]
    fn nested_directives_merge_innermost_first() {
        let inner = CompositeSelector::new("a b").with_class("inner");
        let outer = CompositeSelector::new(SelectorInput::from(inner)).with_class("outer");
        let chains = normalize(&outer).unwrap();
        assert_eq!(
            chains[0].leaf().class_list,
            Some(vec!["inner".to_string(), "outer".to_string()])
        );
        assert!(chains[0].class_list.is_none());
    }

    #[test]
    fn directive_with_next_is_invalid() {
        let raw = directive(json!({"selector": "li", "next": {"type": "a"}}));
        assert!(matches!(normalize(&raw), Err(SelectorError::Invalid(_))));
    }

    #[test]
    fn bad_nested_selector_propagates() {
        let raw = directive(json!({"selector": "ul > li", "classList": ["x"]}));
        assert!(matches!(normalize(&raw), Err(SelectorError::Unsupported { combinator: '>', .. })));
    }
}
