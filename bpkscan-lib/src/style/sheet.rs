// Owned style data. Nothing here borrows from lightningcss, so a
// stylesheet can outlive the CSS text it was parsed from.
use serde::Serialize;
use std::fmt;

/// Where a stylesheet came from, in cascade order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSource {
    /// Text of a `<style>` element, or CSS handed over directly.
    Inline { text: String, label: String },
    /// A `<link rel="stylesheet">` href or an extra sheet to fetch through a loader.
    Linked { href: String },
}

impl SheetSource {
    pub fn inline(label: impl Into<String>, text: impl Into<String>) -> Self {
        SheetSource::Inline {
            text: text.into(),
            label: label.into(),
        }
    }

    pub fn linked(href: impl Into<String>) -> Self {
        SheetSource::Linked { href: href.into() }
    }

    pub fn label(&self) -> &str {
        match self {
            SheetSource::Inline { label, .. } => label,
            SheetSource::Linked { href } => href,
        }
    }
}

/// A parsed stylesheet: style rules only, `@media` blocks flattened in place.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<ParsedRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRule {
    /// The whole selector list as written, e.g. `.Card` or `h1, h2`.
    pub selector_text: String,
    /// Each selector of the list, serialized separately.
    pub selectors: Vec<String>,
    /// Declarations in source order, one per property.
    pub declarations: Vec<Declaration>,
}

/// A property with its value in canonical serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

/// Position of a rule in the cascade: sheet order, then rule order within the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CascadePosition(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleKind {
    /// Selector follows the framework's class prefix convention.
    Framework,
    /// Single-class selector outside the framework convention.
    AuthorCandidate,
    Irrelevant,
}

/// A rule as seen by one scan: positioned and classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub position: CascadePosition,
    pub selector: String,
    pub declarations: Vec<Declaration>,
    pub kind: RuleKind,
}

impl ParsedRule {
    /// Adds a declaration; a repeated property keeps its first slot and takes the later value.
    pub fn push_declaration(&mut self, declaration: Declaration) {
        match self
            .declarations
            .iter_mut()
            .find(|existing| existing.property == declaration.property)
        {
            Some(existing) => existing.value = declaration.value,
            None => self.declarations.push(declaration),
        }
    }
}

impl StyleRule {
    pub fn declaration(&self, property: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|declaration| declaration.property == property)
    }

    pub fn is_framework(&self) -> bool {
        self.kind == RuleKind::Framework
    }
}

impl fmt::Display for StyleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#{} {} ({:?})", self.position.0, self.selector, self.kind)?;
        for decl in &self.declarations {
            writeln!(f, "  {}: {}", decl.property, decl.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_property_keeps_first_slot() {
        let mut rule = ParsedRule {
            selector_text: ".a".into(),
            selectors: vec![".a".into()],
            declarations: Vec::new(),
        };
        for (property, value) in [("color", "red"), ("margin", "0"), ("color", "blue")] {
            rule.push_declaration(Declaration {
                property: property.into(),
                value: value.into(),
            });
        }
        let flat: Vec<_> = rule
            .declarations
            .iter()
            .map(|d| (d.property.as_str(), d.value.as_str()))
            .collect();
        assert_eq!(flat, vec![("color", "blue"), ("margin", "0")]);
    }
}
