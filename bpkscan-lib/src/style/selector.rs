use crate::dom::dom_tree::{ElementNode, Node, NodeRef};
use std::collections::HashSet;
use std::rc::Rc;
use thiserror::Error;

/// ------------------------------
/// 1. Selector Parsing
/// ------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unsupported syntax `{0}`")]
    Unsupported(char),
    #[error("combinator without a compound selector on both sides")]
    DanglingCombinator,
    #[error("unterminated attribute selector")]
    UnterminatedAttribute,
    #[error("empty name after `{0}`")]
    EmptyName(char),
}

/// Supported attribute selector operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeOperator {
    /// [attr="value"]
    Exact,
    /// [attr~="value"]
    Includes,
    /// [attr|="value"]
    DashMatch,
    /// [attr^="value"]
    Prefix,
    /// [attr$="value"]
    Suffix,
    /// [attr*="value"]
    Substring,
}

/// Represents one attribute condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub operator: Option<AttributeOperator>, // None means only existence check
    pub value: Option<String>,
}

/// An optional tag, id, classes and attribute conditions, all of which must hold.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: HashSet<String>,
    pub attributes: Vec<AttributeSelector>,
}

/// A complex selector composed of a key compound selector and a list of ancestor parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub key: CompoundSelector,
    /// Ancestors with their combinators, in right-to-left order.
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
}

/// Supported combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (a space).
    Descendant,
    /// Child combinator (`>`).
    Child,
    /// Adjacent sibling combinator (`+`).
    AdjacentSibling,
    /// General sibling combinator (`~`).
    GeneralSibling,
}

#[derive(Debug)]
enum Token {
    Compound(String),
    Combinator(Combinator),
}

/// Parse a complex selector string (e.g. "div.red > p#header + span.foo").
///
/// Pseudo-classes, pseudo-elements, namespaces and escapes are rejected:
/// a rule using them cannot be evaluated against an element.
pub fn parse_selector(selector: &str) -> Result<ComplexSelector, SelectorError> {
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    for token in tokenize(selector)? {
        match token {
            Token::Compound(text) => compounds.push(parse_compound_selector(&text)?),
            Token::Combinator(combinator) => combinators.push(combinator),
        }
    }
    let key = compounds.pop().ok_or(SelectorError::Empty)?;
    // compounds[i] relates to compounds[i + 1] through combinators[i].
    let ancestors = combinators.into_iter().zip(compounds).rev().collect();
    Ok(ComplexSelector { key, ancestors })
}

fn tokenize(selector: &str) -> Result<Vec<Token>, SelectorError> {
    let mut tokens = Vec::new();
    let mut buffer = String::new();
    let mut pending: Option<Combinator> = None;
    let mut in_brackets = false;
    let mut quote: Option<char> = None;

    for ch in selector.trim().chars() {
        if let Some(q) = quote {
            buffer.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        if in_brackets {
            buffer.push(ch);
            match ch {
                '"' | '\'' => quote = Some(ch),
                ']' => in_brackets = false,
                _ => {}
            }
            continue;
        }
        let explicit = match ch {
            '>' => Some(Combinator::Child),
            '+' => Some(Combinator::AdjacentSibling),
            '~' => Some(Combinator::GeneralSibling),
            _ => None,
        };
        if ch.is_whitespace() || explicit.is_some() {
            if !buffer.is_empty() {
                tokens.push(Token::Compound(std::mem::take(&mut buffer)));
                pending = Some(Combinator::Descendant);
            }
            if let Some(combinator) = explicit {
                let already_explicit =
                    matches!(pending, Some(c) if c != Combinator::Descendant);
                if tokens.is_empty() || already_explicit {
                    return Err(SelectorError::DanglingCombinator);
                }
                pending = Some(combinator);
            }
            continue;
        }
        if let Some(combinator) = pending.take() {
            tokens.push(Token::Combinator(combinator));
        }
        if ch == '[' {
            in_brackets = true;
        }
        buffer.push(ch);
    }

    if in_brackets || quote.is_some() {
        return Err(SelectorError::UnterminatedAttribute);
    }
    if buffer.is_empty() {
        return match pending {
            Some(Combinator::Descendant) => Ok(tokens),
            Some(_) => Err(SelectorError::DanglingCombinator),
            None => Err(SelectorError::Empty),
        };
    }
    tokens.push(Token::Compound(buffer));
    Ok(tokens)
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii()
}

/// Parse a compound selector string, e.g. "div.red#header[disabled][data-type~=\"main\"]"
pub fn parse_compound_selector(selector: &str) -> Result<CompoundSelector, SelectorError> {
    let mut compound = CompoundSelector::default();
    let mut chars = selector.chars().peekable();

    // A leading name or '*' is the type selector.
    if let Some(&ch) = chars.peek() {
        if ch == '*' {
            chars.next();
        } else if is_name_char(ch) {
            let mut tag = String::new();
            while let Some(&ch) = chars.peek() {
                if !is_name_char(ch) {
                    break;
                }
                tag.push(ch);
                chars.next();
            }
            compound.tag = Some(tag);
        }
    }

    while let Some(ch) = chars.next() {
        match ch {
            '#' | '.' => {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if !is_name_char(next) {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                if name.is_empty() {
                    return Err(SelectorError::EmptyName(ch));
                }
                if ch == '#' {
                    compound.id = Some(name);
                } else {
                    compound.classes.insert(name);
                }
            }
            '[' => {
                let mut body = String::new();
                let mut quote: Option<char> = None;
                let mut closed = false;
                for inner in chars.by_ref() {
                    match (quote, inner) {
                        (None, ']') => {
                            closed = true;
                            break;
                        }
                        (None, '"' | '\'') => quote = Some(inner),
                        (Some(q), c) if c == q => quote = None,
                        _ => {}
                    }
                    body.push(inner);
                }
                if !closed {
                    return Err(SelectorError::UnterminatedAttribute);
                }
                compound.attributes.push(parse_attribute_selector(&body)?);
            }
            other => return Err(SelectorError::Unsupported(other)),
        }
    }

    Ok(compound)
}

/// Parses the inside of `[...]`.
fn parse_attribute_selector(body: &str) -> Result<AttributeSelector, SelectorError> {
    let body = body.trim();
    let name_end = body
        .find(|c: char| !is_name_char(c))
        .unwrap_or(body.len());
    let name = body[..name_end].to_string();
    if name.is_empty() {
        return Err(SelectorError::EmptyName('['));
    }

    let rest = body[name_end..].trim_start();
    if rest.is_empty() {
        return Ok(AttributeSelector {
            name,
            operator: None,
            value: None,
        });
    }

    let (operator, value) = if let Some(value) = rest.strip_prefix('=') {
        (AttributeOperator::Exact, value)
    } else {
        let mut op_chars = rest.chars();
        let op = op_chars.next();
        if op_chars.next() != Some('=') {
            return Err(SelectorError::Unsupported(op.unwrap_or('[')));
        }
        let operator = match op {
            Some('~') => AttributeOperator::Includes,
            Some('|') => AttributeOperator::DashMatch,
            Some('^') => AttributeOperator::Prefix,
            Some('$') => AttributeOperator::Suffix,
            Some('*') => AttributeOperator::Substring,
            other => return Err(SelectorError::Unsupported(other.unwrap_or('['))),
        };
        (operator, &rest[2..])
    };

    let value = value.trim();
    let unquoted = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    Ok(AttributeSelector {
        name,
        operator: Some(operator),
        value: Some(unquoted.to_string()),
    })
}

/// ------------------------------
/// 2. Selector Matching
/// ------------------------------

/// Returns true if the given ElementNode matches the CompoundSelector.
/// Checks tag, id, classes, and attribute conditions.
pub fn matches_compound(elem: &ElementNode, compound: &CompoundSelector) -> bool {
    if let Some(ref tag) = compound.tag {
        if !elem.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(ref id_val) = compound.id {
        if elem.attribute("id") != Some(id_val.as_str()) {
            return false;
        }
    }
    if !compound.classes.iter().all(|class| elem.has_class(class)) {
        return false;
    }
    compound
        .attributes
        .iter()
        .all(|attr_sel| matches_attribute(elem, attr_sel))
}

fn matches_attribute(elem: &ElementNode, attr_sel: &AttributeSelector) -> bool {
    let Some(actual) = elem.attribute(&attr_sel.name) else {
        return false;
    };
    let (Some(operator), Some(expected)) = (&attr_sel.operator, &attr_sel.value) else {
        return true;
    };
    match operator {
        AttributeOperator::Exact => actual == expected,
        AttributeOperator::Includes => actual.split_whitespace().any(|word| word == expected),
        AttributeOperator::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected.as_str())
                    .is_some_and(|rest| rest.starts_with('-'))
        }
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(expected.as_str()),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(expected.as_str()),
        AttributeOperator::Substring => !expected.is_empty() && actual.contains(expected.as_str()),
    }
}

/// Matches a ComplexSelector against a candidate element.
/// The matching proceeds right-to-left, using parent pointers and the parent's child list.
pub fn matches_complex_selector(candidate: &NodeRef, complex: &ComplexSelector) -> bool {
    element_matches(candidate, &complex.key) && matches_chain(candidate, &complex.ancestors)
}

fn matches_chain(node: &NodeRef, chain: &[(Combinator, CompoundSelector)]) -> bool {
    let Some(((combinator, compound), rest)) = chain.split_first() else {
        return true;
    };
    let step = |next: &NodeRef| element_matches(next, compound) && matches_chain(next, rest);
    match combinator {
        Combinator::Child => parent_element(node).is_some_and(|parent| step(&parent)),
        Combinator::Descendant => {
            let mut ancestor = parent_element(node);
            while let Some(current) = ancestor {
                if step(&current) {
                    return true;
                }
                ancestor = parent_element(&current);
            }
            false
        }
        Combinator::AdjacentSibling => previous_element_siblings(node)
            .first()
            .is_some_and(|sibling| step(sibling)),
        Combinator::GeneralSibling => previous_element_siblings(node).iter().any(|s| step(s)),
    }
}

fn element_matches(node: &NodeRef, compound: &CompoundSelector) -> bool {
    node.borrow()
        .as_element()
        .is_some_and(|elem| matches_compound(elem, compound))
}

/// Helper: parent of a node, if that parent is an element.
fn parent_element(node: &NodeRef) -> Option<NodeRef> {
    let parent = node.borrow().as_element()?.parent()?;
    let is_element = matches!(*parent.borrow(), Node::Element(_));
    is_element.then_some(parent)
}

/// Helper: element siblings before `node`, nearest first.
fn previous_element_siblings(node: &NodeRef) -> Vec<NodeRef> {
    let Some(parent) = node.borrow().as_element().and_then(|elem| elem.parent()) else {
        return Vec::new();
    };
    let parent_borrow = parent.borrow();
    let children = parent_borrow.children();
    let Some(index) = children.iter().position(|child| Rc::ptr_eq(child, node)) else {
        return Vec::new();
    };
    let siblings: Vec<NodeRef> = children[..index]
        .iter()
        .rev()
        .filter(|child| matches!(*child.borrow(), Node::Element(_)))
        .cloned()
        .collect();
    siblings
}
