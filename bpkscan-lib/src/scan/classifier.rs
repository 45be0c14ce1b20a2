use crate::dom::dom_tree::ElementNode;
use crate::style::sheet::RuleKind;

/// The class-name prefix that marks the style framework's own classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkConvention {
    class_prefix: String,
}

impl FrameworkConvention {
    pub fn new(class_prefix: impl Into<String>) -> Self {
        FrameworkConvention {
            class_prefix: class_prefix.into(),
        }
    }

    pub fn class_prefix(&self) -> &str {
        &self.class_prefix
    }

    pub fn is_framework_class(&self, class_name: &str) -> bool {
        class_name.starts_with(&self.class_prefix)
    }

    /// Classifies a rule by its selector text.
    ///
    /// Framework rules start with `.` and the prefix; author candidates are a
    /// bare single-class selector; everything else is irrelevant. Only the
    /// start of the selector text is checked, so a list led by a framework
    /// class (`.Bpk_X, .Card`) counts as a framework rule as a whole.
    pub fn classify_rule(&self, selector_text: &str) -> RuleKind {
        let selector = selector_text.trim();
        let Some(first_class) = selector.strip_prefix('.') else {
            return RuleKind::Irrelevant;
        };
        if self.is_framework_class(first_class) {
            RuleKind::Framework
        } else if is_class_name(first_class) {
            RuleKind::AuthorCandidate
        } else {
            RuleKind::Irrelevant
        }
    }
}

impl Default for FrameworkConvention {
    fn default() -> Self {
        FrameworkConvention::new(crate::config::DEFAULT_FRAMEWORK_PREFIX)
    }
}

fn is_class_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii())
}

/// Cheap pre-filter deciding which elements are worth resolving.
#[derive(Debug, Clone, Default)]
pub struct ElementClassifier {
    convention: FrameworkConvention,
}

impl ElementClassifier {
    pub fn new(convention: FrameworkConvention) -> Self {
        ElementClassifier { convention }
    }

    /// An element is a candidate iff it has at least one class outside the framework convention.
    pub fn is_candidate(&self, element: &ElementNode) -> bool {
        element
            .classes()
            .any(|class| !self.convention.is_framework_class(class))
    }

    pub fn convention(&self) -> &FrameworkConvention {
        &self.convention
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::dom_tree;

    fn element_with_class(class: Option<&str>) -> dom_tree::NodeRef {
        let document = dom_tree::new_document();
        match class {
            Some(class) => document.create_html_element("div", &[("class", class)]),
            None => document.create_html_element("div", &[]),
        }
    }

    fn is_candidate(class: Option<&str>) -> bool {
        let classifier = ElementClassifier::default();
        let node = element_with_class(class);
        let node_borrow = node.borrow();
        classifier.is_candidate(node_borrow.as_element().unwrap())
    }

    #[test]
    fn test_framework_only_elements_are_not_candidates() {
        assert!(!is_candidate(None));
        assert!(!is_candidate(Some("")));
        assert!(!is_candidate(Some("Bpk_Button")));
        assert!(!is_candidate(Some("Bpk_Button  BpkText_base")));
    }

    #[test]
    fn test_any_author_class_makes_a_candidate() {
        assert!(is_candidate(Some("Card")));
        assert!(is_candidate(Some("Bpk_Button Card")));
    }

    #[test]
    fn test_rule_classification() {
        let convention = FrameworkConvention::default();
        assert_eq!(convention.classify_rule(".Bpk_Button"), RuleKind::Framework);
        assert_eq!(convention.classify_rule(".Bpk_Button:hover"), RuleKind::Framework);
        assert_eq!(convention.classify_rule(".Bpk_A .Card"), RuleKind::Framework);
        assert_eq!(convention.classify_rule(".Card"), RuleKind::AuthorCandidate);
        assert_eq!(convention.classify_rule(" .card-title_x "), RuleKind::AuthorCandidate);
        assert_eq!(convention.classify_rule(".Card.Big"), RuleKind::Irrelevant);
        assert_eq!(convention.classify_rule(".Card > p"), RuleKind::Irrelevant);
        assert_eq!(convention.classify_rule(".Card, .Other"), RuleKind::Irrelevant);
        assert_eq!(convention.classify_rule("div.Card"), RuleKind::Irrelevant);
        assert_eq!(convention.classify_rule("#main"), RuleKind::Irrelevant);
        assert_eq!(convention.classify_rule("p"), RuleKind::Irrelevant);
    }

    #[test]
    fn test_selector_list_is_classified_by_its_leading_class() {
        let convention = FrameworkConvention::default();
        assert_eq!(convention.classify_rule(".Bpk_X, .Card"), RuleKind::Framework);
        assert_eq!(convention.classify_rule(".Card, .Bpk_X"), RuleKind::Irrelevant);
    }

    #[test]
    fn test_custom_prefix() {
        let convention = FrameworkConvention::new("bpk-");
        assert_eq!(convention.classify_rule(".bpk-button"), RuleKind::Framework);
        assert_eq!(convention.classify_rule(".Bpk_Button"), RuleKind::AuthorCandidate);
    }
}
