use crate::config::ScanConfig;
use crate::dom::dom_tree::{Document, ElementId, NodeRef};
use crate::scan::classifier::{ElementClassifier, FrameworkConvention};
use crate::scan::resolver::{OverrideResolver, PropertyOverride};
use crate::style::index::StyleRuleIndex;
use crate::style::loader::{NoSheetLoader, SheetLoader};
use crate::style::sheet::SheetSource;
use std::fmt;
use std::rc::Rc;

/// One flagged element with its overrides. The override list is never empty.
#[derive(Clone)]
pub struct ScanResult {
    pub element: NodeRef,
    pub element_id: ElementId,
    pub descriptor: String,
    pub overrides: Vec<PropertyOverride>,
}

impl PartialEq for ScanResult {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.element, &other.element)
            && self.element_id == other.element_id
            && self.overrides == other.overrides
    }
}

impl fmt::Debug for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanResult")
            .field("element_id", &self.element_id)
            .field("descriptor", &self.descriptor)
            .field("overrides", &self.overrides)
            .finish()
    }
}

/// Runs full-page scans: index rules, filter candidates, resolve overrides.
pub struct Scanner {
    classifier: ElementClassifier,
    resolver: OverrideResolver,
    loader: Box<dyn SheetLoader>,
    extra_sources: Vec<SheetSource>,
}

impl Scanner {
    pub fn new(config: &ScanConfig) -> Self {
        let convention = FrameworkConvention::new(config.framework_prefix.clone());
        Scanner {
            classifier: ElementClassifier::new(convention),
            resolver: OverrideResolver::new(),
            loader: Box::new(NoSheetLoader),
            extra_sources: Vec::new(),
        }
    }

    /// Fetches `<link>` sheets and linked extra sources through `loader`.
    pub fn with_loader(mut self, loader: impl SheetLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Adds a sheet that cascades after every sheet of the document.
    pub fn with_extra_source(mut self, source: SheetSource) -> Self {
        self.extra_sources.push(source);
        self
    }

    pub fn convention(&self) -> &FrameworkConvention {
        self.classifier.convention()
    }

    pub fn build_index(&self, document: &Document) -> StyleRuleIndex {
        StyleRuleIndex::build(
            document,
            self.loader.as_ref(),
            &self.extra_sources,
            self.classifier.convention(),
        )
    }

    /// Scans the whole document with a freshly built rule index.
    pub fn scan(&self, document: &Document) -> Vec<ScanResult> {
        let index = self.build_index(document);
        self.scan_with_index(document, &index)
    }

    pub fn scan_with_index(&self, document: &Document, index: &StyleRuleIndex) -> Vec<ScanResult> {
        let elements = document.elements();
        let mut candidates = 0usize;
        let mut results = Vec::new();

        for node in &elements {
            let node_borrow = node.borrow();
            let Some(elem) = node_borrow.as_element() else {
                continue;
            };
            if !self.classifier.is_candidate(elem) {
                continue;
            }
            candidates += 1;

            let matching = index.rules_matching(node);
            let overrides = self.resolver.resolve(elem, &matching);
            if overrides.is_empty() {
                continue;
            }
            results.push(ScanResult {
                element: Rc::clone(node),
                element_id: elem.id,
                descriptor: elem.describe(),
                overrides,
            });
        }

        log::debug!(
            "scan: {} elements, {} candidates, {} rules, {} sheets skipped, {} flagged",
            elements.len(),
            candidates,
            index.len(),
            index.skipped().len(),
            results.len()
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;
    use crate::style::loader::StaticSheetLoader;

    const PAGE: &str = r#"<html><head>
<style>.Card { color: red; padding: 4px; } .Plain { color: red; }</style>
<link rel="stylesheet" href="bpk.css">
</head><body>
  <div id="card" class="Card Bpk_Button">card</div>
  <div id="plain" class="Plain">plain</div>
  <div id="framework" class="Bpk_Button">framework only</div>
</body></html>"#;

    fn scanner() -> Scanner {
        Scanner::new(&ScanConfig::default())
            .with_loader(StaticSheetLoader::new().with_sheet("bpk.css", ".Bpk_Button { color: blue; padding: 4px; }"))
    }

    #[test]
    fn test_only_overridden_elements_are_reported() {
        let document = create_dom_tree(PAGE);
        let results = scanner().scan(&document);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].descriptor, "div#card.Card.Bpk_Button");
        assert_eq!(results[0].overrides.len(), 1);
        assert_eq!(results[0].overrides[0].property, "color");
    }

    #[test]
    fn test_scan_is_idempotent() {
        let document = create_dom_tree(PAGE);
        let scanner = scanner();
        assert_eq!(scanner.scan(&document), scanner.scan(&document));
    }

    #[test]
    fn test_unreadable_framework_sheet_degrades_to_no_results() {
        let document = create_dom_tree(PAGE);
        let results = Scanner::new(&ScanConfig::default()).scan(&document);
        assert!(results.is_empty());
    }
}
