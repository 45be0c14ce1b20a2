use crate::dom::dom_tree::{self, Document, NodeRef};
use crate::error::ScanError;
use crate::scan::classifier::FrameworkConvention;
use crate::style::loader::SheetLoader;
use crate::style::parse::parse_stylesheet;
use crate::style::selector::{matches_complex_selector, parse_selector, ComplexSelector};
use crate::style::sheet::{CascadePosition, SheetSource, StyleRule, Stylesheet};

/// A rule plus its pre-parsed selectors.
#[derive(Debug)]
struct IndexedRule {
    rule: StyleRule,
    /// Selectors of the list that could be parsed; the rest never match.
    selectors: Vec<ComplexSelector>,
}

/// Every readable style rule of one scan, in cascade order.
///
/// Built fresh for each scan since sheets may change between scans.
#[derive(Debug, Default)]
pub struct StyleRuleIndex {
    rules: Vec<IndexedRule>,
    skipped: Vec<ScanError>,
}

impl StyleRuleIndex {
    /// Indexes the document's `<style>`/`<link>` sheets followed by `extra` sources.
    pub fn build(
        document: &Document,
        loader: &dyn SheetLoader,
        extra: &[SheetSource],
        convention: &FrameworkConvention,
    ) -> Self {
        let mut sources = document_sheet_sources(document);
        sources.extend_from_slice(extra);

        let mut index = StyleRuleIndex::default();
        let mut sheets = Vec::with_capacity(sources.len());
        for source in &sources {
            match read_sheet(source, loader) {
                Ok(sheet) => sheets.push(sheet),
                Err(err) => {
                    log::warn!("skipping stylesheet: {}", err);
                    index.skipped.push(err);
                }
            }
        }
        index.push_sheets(sheets, convention);
        index
    }

    /// Indexes already-parsed sheets, in the order given.
    pub fn from_sheets(
        sheets: impl IntoIterator<Item = Stylesheet>,
        convention: &FrameworkConvention,
    ) -> Self {
        let mut index = StyleRuleIndex::default();
        index.push_sheets(sheets, convention);
        index
    }

    fn push_sheets(
        &mut self,
        sheets: impl IntoIterator<Item = Stylesheet>,
        convention: &FrameworkConvention,
    ) {
        // Position is assigned here, once, and is the only source of cascade order.
        let mut position = self.rules.len() as u32;
        for sheet in sheets {
            for parsed in sheet.rules {
                let mut selectors = Vec::with_capacity(parsed.selectors.len());
                for selector in &parsed.selectors {
                    match parse_selector(selector) {
                        Ok(complex) => selectors.push(complex),
                        Err(e) => log::debug!(
                            "{}",
                            ScanError::MalformedSelector {
                                selector: selector.clone(),
                                reason: e.to_string(),
                            }
                        ),
                    }
                }
                let rule = StyleRule {
                    position: CascadePosition(position),
                    kind: convention.classify_rule(&parsed.selector_text),
                    selector: parsed.selector_text,
                    declarations: parsed.declarations,
                };
                position += 1;
                self.rules.push(IndexedRule { rule, selectors });
            }
        }
    }

    /// Rules matching `element`, by ascending cascade position.
    pub fn rules_matching(&self, element: &NodeRef) -> Vec<&StyleRule> {
        self.rules
            .iter()
            .filter(|indexed| {
                indexed
                    .selectors
                    .iter()
                    .any(|selector| matches_complex_selector(element, selector))
            })
            .map(|indexed| &indexed.rule)
            .collect()
    }

    pub fn rules(&self) -> impl Iterator<Item = &StyleRule> {
        self.rules.iter().map(|indexed| &indexed.rule)
    }

    /// Sheets that contributed no rules because they could not be read.
    pub fn skipped(&self) -> &[ScanError] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn read_sheet(source: &SheetSource, loader: &dyn SheetLoader) -> Result<Stylesheet, ScanError> {
    let text = match source {
        SheetSource::Inline { text, .. } => text.clone(),
        SheetSource::Linked { href } => loader.load(href)?,
    };
    // A sheet that cannot be read as CSS is as good as an unreadable one.
    parse_stylesheet(&text).map_err(|e| ScanError::InaccessibleStylesheet {
        href: source.label().to_string(),
        reason: e.to_string(),
    })
}

/// `<style>` texts and `<link rel="stylesheet">` hrefs, in document order.
pub fn document_sheet_sources(document: &Document) -> Vec<SheetSource> {
    let mut sources = Vec::new();
    for node in document.elements() {
        let node_borrow = node.borrow();
        let Some(elem) = node_borrow.as_element() else {
            continue;
        };
        match elem.tag.as_str() {
            "style" => sources.push(SheetSource::inline(
                format!("<style> #{}", elem.id.0),
                dom_tree::text_content(&node),
            )),
            "link" => {
                let is_stylesheet = elem.attribute("rel").is_some_and(|rel| {
                    rel.split_ascii_whitespace()
                        .any(|token| token.eq_ignore_ascii_case("stylesheet"))
                });
                match elem.attribute("href") {
                    Some(href) if is_stylesheet && !href.trim().is_empty() => {
                        sources.push(SheetSource::linked(href.trim()))
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;
    use crate::style::loader::{NoSheetLoader, StaticSheetLoader};
    use crate::style::sheet::RuleKind;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<style>.Card { color: red; } p { margin: 0; }</style>
<link rel="stylesheet" href="bpk.css">
<link rel="stylesheet" href="https://cdn.example.com/remote.css">
<link rel="icon" href="favicon.ico">
</head>
<body>
  <div id="card" class="Card Bpk_Button">Hello</div>
  <p id="plain">Plain</p>
</body>
</html>"#;

    fn loader() -> StaticSheetLoader {
        StaticSheetLoader::new().with_sheet("bpk.css", ".Bpk_Button { color: blue; } .Card:hover { color: green; }")
    }

    #[test]
    fn test_sources_in_document_order() {
        let document = create_dom_tree(PAGE);
        let labels: Vec<_> = document_sheet_sources(&document)
            .iter()
            .map(|s| s.label().to_string())
            .collect();
        assert_eq!(labels.len(), 3);
        assert!(labels[0].starts_with("<style>"));
        assert_eq!(labels[1], "bpk.css");
        assert_eq!(labels[2], "https://cdn.example.com/remote.css");
    }

    #[test]
    fn test_positions_follow_sheet_then_rule_order() {
        let document = create_dom_tree(PAGE);
        let index = StyleRuleIndex::build(&document, &loader(), &[], &FrameworkConvention::default());
        let rules: Vec<_> = index
            .rules()
            .map(|r| (r.position.0, r.selector.as_str(), r.kind))
            .collect();
        assert_eq!(
            rules,
            vec![
                (0, ".Card", RuleKind::AuthorCandidate),
                (1, "p", RuleKind::Irrelevant),
                (2, ".Bpk_Button", RuleKind::Framework),
                (3, ".Card:hover", RuleKind::Irrelevant),
            ]
        );
        // The remote sheet is skipped, not fatal.
        assert_eq!(index.skipped().len(), 1);
    }

    #[test]
    fn test_rules_matching_excludes_unevaluable_selectors() {
        let document = create_dom_tree(PAGE);
        let index = StyleRuleIndex::build(&document, &loader(), &[], &FrameworkConvention::default());
        let card = document.element_by_id_attr("card").unwrap();
        let matched: Vec<_> = index.rules_matching(&card).iter().map(|r| r.selector.clone()).collect();
        assert_eq!(matched, vec![".Card".to_string(), ".Bpk_Button".to_string()]);
    }

    #[test]
    fn test_extra_sources_come_last() {
        let document = create_dom_tree(PAGE);
        let extra = [SheetSource::inline("extra", ".Bpk_Late { color: black; }")];
        let index = StyleRuleIndex::build(&document, &NoSheetLoader, &extra, &FrameworkConvention::default());
        let last = index.rules().last().unwrap();
        assert_eq!(last.selector, ".Bpk_Late");
        assert_eq!(index.skipped().len(), 2);
    }
}
