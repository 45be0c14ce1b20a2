use crate::dom::dom_tree::ElementNode;
use crate::style::sheet::{Declaration, RuleKind, StyleRule};
use serde::Serialize;
use std::collections::HashSet;

/// A property whose author-intended value is replaced by a framework rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyOverride {
    pub property: String,
    /// Value the author rule declared.
    pub intended: String,
    /// Value the framework rule supplies instead.
    pub overriding: String,
    /// Selector of the framework rule.
    pub overriding_rule: String,
    /// Selector of the author rule that declared `intended`.
    pub author_rule: String,
}

/// Computes, per property, which author-intended values a later framework rule overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideResolver;

impl OverrideResolver {
    pub fn new() -> Self {
        OverrideResolver
    }

    /// Resolves overrides for `element` given its matching rules in ascending cascade order.
    ///
    /// Each property is judged once, from the earliest author candidate rule
    /// declaring it: the nearest later rule declaring the same property decides
    /// the outcome. Only when that rule is a framework rule with a different
    /// canonical value is an override reported. Irrelevant rules are skipped
    /// and never decide anything. Framework rules earlier than
    /// the author rule are already superseded and never looked at, and the
    /// cascade is not followed past its first winner.
    pub fn resolve(&self, element: &ElementNode, ordered_rules: &[&StyleRule]) -> Vec<PropertyOverride> {
        debug_assert!(
            ordered_rules.windows(2).all(|w| w[0].position < w[1].position),
            "rules must be in strictly ascending cascade order"
        );

        let mut overrides = Vec::new();
        let mut judged: HashSet<&str> = HashSet::new();
        for (i, rule) in ordered_rules.iter().enumerate() {
            if rule.kind != RuleKind::AuthorCandidate {
                continue;
            }
            let after_rules = &ordered_rules[i + 1..];
            for declaration in &rule.declarations {
                if !judged.insert(declaration.property.as_str()) {
                    continue;
                }
                if let Some(found) = resolve_property(rule, declaration, after_rules) {
                    log::trace!(
                        "{}: `{}` wants {}: {}, `{}` applies {}",
                        element.describe(),
                        rule.selector,
                        found.property,
                        found.intended,
                        found.overriding_rule,
                        found.overriding
                    );
                    overrides.push(found);
                }
            }
        }
        overrides
    }
}

fn resolve_property(
    author_rule: &StyleRule,
    intended: &Declaration,
    after_rules: &[&StyleRule],
) -> Option<PropertyOverride> {
    let (winner, applied) = after_rules
        .iter()
        .filter(|rule| rule.kind != RuleKind::Irrelevant)
        .find_map(|rule| {
            rule.declaration(&intended.property)
                .map(|declaration| (*rule, declaration))
        })?;

    if !winner.is_framework() || applied.value == intended.value {
        return None;
    }
    Some(PropertyOverride {
        property: intended.property.clone(),
        intended: intended.value.clone(),
        overriding: applied.value.clone(),
        overriding_rule: winner.selector.clone(),
        author_rule: author_rule.selector.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::dom_tree;
    use crate::scan::classifier::FrameworkConvention;
    use crate::style::sheet::CascadePosition;
    use pretty_assertions::assert_eq;

    fn rule(position: u32, selector: &str, declarations: &[(&str, &str)]) -> StyleRule {
        StyleRule {
            position: CascadePosition(position),
            selector: selector.to_string(),
            declarations: declarations
                .iter()
                .map(|(property, value)| Declaration::new(property, value))
                .collect(),
            kind: FrameworkConvention::default().classify_rule(selector),
        }
    }

    fn resolve(rules: &[StyleRule]) -> Vec<PropertyOverride> {
        let document = dom_tree::new_document();
        let node = document.create_html_element("div", &[("class", "Card Bpk_Button")]);
        let node_borrow = node.borrow();
        let ordered: Vec<&StyleRule> = rules.iter().collect();
        OverrideResolver::new().resolve(node_borrow.as_element().unwrap(), &ordered)
    }

    #[test]
    fn test_later_framework_rule_with_different_value_overrides() {
        let overrides = resolve(&[
            rule(3, ".Card", &[("color", "red")]),
            rule(7, ".Bpk_Button", &[("color", "blue")]),
        ]);
        assert_eq!(
            overrides,
            vec![PropertyOverride {
                property: "color".into(),
                intended: Declaration::new("color", "red").value,
                overriding: Declaration::new("color", "blue").value,
                overriding_rule: ".Bpk_Button".into(),
                author_rule: ".Card".into(),
            }]
        );
    }

    #[test]
    fn test_framework_rule_with_equal_value_is_not_an_override() {
        let overrides = resolve(&[
            rule(3, ".Card", &[("color", "red")]),
            rule(7, ".Bpk_Button", &[("color", "red")]),
        ]);
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_equivalent_representations_are_equal() {
        let overrides = resolve(&[
            rule(1, ".Card", &[("color", "#FF0000")]),
            rule(2, ".Bpk_Button", &[("color", "#ff0000")]),
        ]);
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_nearer_author_rule_shields_later_framework_rules() {
        let overrides = resolve(&[
            rule(2, ".Custom", &[("margin", "0")]),
            rule(3, ".Legacy", &[("margin", "4px")]),
            rule(5, ".Bpk_X", &[("margin", "8px")]),
        ]);
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_property_is_judged_from_its_first_author_rule_only() {
        let overrides = resolve(&[
            rule(1, ".Card", &[("color", "red")]),
            rule(2, ".Title", &[("color", "green"), ("padding", "1px")]),
            rule(3, ".Bpk_Button", &[("color", "blue"), ("padding", "2px")]),
        ]);
        let found: Vec<_> = overrides
            .iter()
            .map(|o| (o.author_rule.as_str(), o.property.as_str()))
            .collect();
        assert_eq!(found, vec![(".Title", "padding")]);
    }

    #[test]
    fn test_earlier_framework_rule_is_never_reported() {
        let overrides = resolve(&[
            rule(1, ".Bpk_Button", &[("color", "blue")]),
            rule(2, ".Card", &[("color", "red")]),
        ]);
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_property_without_later_declaration_is_not_overridden() {
        let overrides = resolve(&[
            rule(1, ".Card", &[("color", "red"), ("padding", "4px")]),
            rule(2, ".Bpk_Button", &[("padding", "8px")]),
        ]);
        let properties: Vec<_> = overrides.iter().map(|o| o.property.as_str()).collect();
        assert_eq!(properties, vec!["padding"]);
    }

    #[test]
    fn test_only_the_nearest_framework_rule_counts() {
        let overrides = resolve(&[
            rule(1, ".Card", &[("color", "red")]),
            rule(2, ".Bpk_Button", &[("color", "blue")]),
            rule(3, ".Bpk_ButtonPrimary", &[("color", "green")]),
        ]);
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].overriding_rule, ".Bpk_Button");
    }

    #[test]
    fn test_irrelevant_rules_are_never_reported_as_author_intent() {
        let overrides = resolve(&[
            rule(1, "div.Card", &[("color", "red")]),
            rule(2, ".Bpk_Button", &[("color", "blue")]),
        ]);
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_irrelevant_rules_do_not_shield_later_framework_rules() {
        let overrides = resolve(&[
            rule(1, ".Card", &[("margin", "0")]),
            rule(2, "div", &[("margin", "2px")]),
            rule(3, ".Bpk_Button", &[("margin", "8px")]),
        ]);
        assert_eq!(
            overrides,
            vec![PropertyOverride {
                property: "margin".into(),
                intended: Declaration::new("margin", "0").value,
                overriding: Declaration::new("margin", "8px").value,
                overriding_rule: ".Bpk_Button".into(),
                author_rule: ".Card".into(),
            }]
        );
    }

    #[test]
    fn test_order_is_rule_then_declaration() {
        let overrides = resolve(&[
            rule(1, ".Card", &[("color", "red"), ("margin", "0")]),
            rule(2, ".Title", &[("padding", "1px")]),
            rule(3, ".Bpk_Button", &[("padding", "2px"), ("margin", "3px"), ("color", "blue")]),
        ]);
        let order: Vec<_> = overrides
            .iter()
            .map(|o| (o.author_rule.as_str(), o.property.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![(".Card", "color"), (".Card", "margin"), (".Title", "padding")]
        );
    }
}
