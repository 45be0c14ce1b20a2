use crate::error::{Result, ScanError};
use crate::style::sheet::{Declaration, ParsedRule, Stylesheet};
use lightningcss::printer::PrinterOptions;
use lightningcss::properties::{Property, PropertyId};
use lightningcss::rules::{style::StyleRule as LightningStyleRule, CssRule};
use lightningcss::stylesheet::{ParserOptions, StyleSheet as LightningStyleSheet};
use lightningcss::traits::ToCss;

/// Parse a raw CSS string (LightningCSS) and convert it to a fully-owned stylesheet.
///
/// Invalid rules are dropped by lightningcss' error recovery; only text that
/// cannot be read as a stylesheet at all is an error.
pub fn parse_stylesheet(css_text: &str) -> Result<Stylesheet> {
    let parser_opts = ParserOptions {
        error_recovery: true,
        ..ParserOptions::default()
    };

    let sheet = LightningStyleSheet::parse(css_text, parser_opts)
        .map_err(|e| ScanError::StyleParse(e.to_string()))?;

    let mut rules = Vec::new();
    collect_rules(&sheet.rules.0, &mut rules);
    Ok(Stylesheet { rules })
}

fn collect_rules(css_rules: &[CssRule<'_>], out: &mut Vec<ParsedRule>) {
    for rule in css_rules {
        match rule {
            CssRule::Style(style_rule) => {
                if let Some(owned) = convert_style_rule(style_rule) {
                    out.push(owned);
                }
            }
            // Media conditions are not evaluated; nested rules keep their place in the cascade.
            CssRule::Media(media_rule) => collect_rules(&media_rule.rules.0, out),
            _ => {}
        }
    }
}

/// Copy a single StyleRule's selectors + normal declarations into a ParsedRule.
fn convert_style_rule(style_rule: &LightningStyleRule<'_>) -> Option<ParsedRule> {
    let mut selectors = Vec::new();
    for selector in &style_rule.selectors.0 {
        match selector.to_css_string(PrinterOptions::default()) {
            Ok(sel_str) => selectors.push(sel_str),
            Err(e) => log::debug!("dropping unprintable selector: {}", e),
        }
    }
    if selectors.is_empty() {
        return None;
    }

    let mut rule = ParsedRule {
        selector_text: selectors.join(", "),
        selectors,
        declarations: Vec::new(),
    };

    // `!important` declarations live in a separate list and are left out on purpose.
    for property in &style_rule.declarations.declarations {
        let property_name = property.property_id().name().to_string();
        match property.value_to_css_string(PrinterOptions::default()) {
            Ok(value) => rule.push_declaration(Declaration {
                property: property_name,
                value,
            }),
            Err(e) => log::debug!("dropping `{}` in `{}`: {}", property_name, rule.selector_text, e),
        }
    }
    Some(rule)
}

/// Canonical serialized form of `value` for `property`.
///
/// Values lightningcss can parse are re-serialized, so `#FF0000` and
/// `#ff0000` compare equal. Anything else falls back to collapsed whitespace.
pub fn canonical_value(property: &str, value: &str) -> String {
    let property_id = PropertyId::from(property);
    match Property::parse_string(property_id, value, ParserOptions::default()) {
        Ok(parsed) => parsed
            .value_to_css_string(PrinterOptions::default())
            .unwrap_or_else(|_| collapse_whitespace(value)),
        Err(_) => collapse_whitespace(value),
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Declaration {
    /// Builds a declaration with its value canonicalized.
    pub fn new(property: &str, value: &str) -> Self {
        let property = property.trim().to_ascii_lowercase();
        let value = canonical_value(&property, value);
        Declaration { property, value }
    }
}
