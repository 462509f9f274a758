//! Syntax tree produced by the stylesheet parser
//!
//! Everything here is immutable once built. Derived data (converted values)
//! lives in caches outside the tree, keyed by [`DeclarationId`].

use crate::lexer::{tokens_to_css, Token, TokenType};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A parsed stylesheet: rules in document order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn declaration_count(&self) -> usize {
        self.rules.iter().map(|r| r.declarations.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub selector_group: SelectorGroup,
    pub declarations: Vec<Declaration>,
    pub line: usize,
}

/// Alternatives separated by commas; matches when any member matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorGroup {
    pub selectors: Vec<Selector>,
}

impl SelectorGroup {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self { selectors }
    }
}

impl fmt::Display for SelectorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, selector) in self.selectors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", selector)?;
        }
        Ok(())
    }
}

/// How an attribute selector compares the attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeMatch {
    Exists,
    Equals,
    Includes,
    DashMatch,
    PrefixMatch,
    SuffixMatch,
    SubstringMatch,
}

impl AttributeMatch {
    pub fn from_token(token_type: &TokenType) -> Option<Self> {
        match token_type {
            TokenType::Equals => Some(Self::Equals),
            TokenType::IncludeMatch => Some(Self::Includes),
            TokenType::DashMatch => Some(Self::DashMatch),
            TokenType::PrefixMatch => Some(Self::PrefixMatch),
            TokenType::SuffixMatch => Some(Self::SuffixMatch),
            TokenType::SubstringMatch => Some(Self::SubstringMatch),
            _ => None,
        }
    }

    pub fn operator(&self) -> &'static str {
        match self {
            Self::Exists => "",
            Self::Equals => "=",
            Self::Includes => "~=",
            Self::DashMatch => "|=",
            Self::PrefixMatch => "^=",
            Self::SuffixMatch => "$=",
            Self::SubstringMatch => "*=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombinatorKind {
    /// Compound selector: both sides apply to the same element.
    And,
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

/// Selector tree.
///
/// For combinators `right` always applies to the element under test and
/// `left` to the structurally related one, so `a > b > c` is
/// `Child(Child(a, b), c)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Selector {
    Universal,
    Type {
        name: String,
    },
    Id {
        name: String,
    },
    Class {
        name: String,
    },
    PseudoClass {
        name: String,
    },
    Attribute {
        name: String,
        matching: AttributeMatch,
        value: Option<String>,
    },
    Combinator {
        combinator: CombinatorKind,
        left: Box<Selector>,
        right: Box<Selector>,
    },
}

impl Selector {
    pub fn combine(combinator: CombinatorKind, left: Selector, right: Selector) -> Self {
        Selector::Combinator {
            combinator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Universal => write!(f, "*"),
            Selector::Type { name } => write!(f, "{}", TokenType::Ident(name.clone())),
            Selector::Id { name } => write!(f, "{}", TokenType::Hash(name.clone())),
            Selector::Class { name } => write!(f, ".{}", TokenType::Ident(name.clone())),
            Selector::PseudoClass { name } => write!(f, ":{}", TokenType::Ident(name.clone())),
            Selector::Attribute {
                name,
                matching,
                value,
            } => {
                write!(f, "[{}", TokenType::Ident(name.clone()))?;
                if let Some(value) = value {
                    write!(f, "{}{}", matching.operator(), TokenType::String(value.clone()))?;
                }
                write!(f, "]")
            }
            Selector::Combinator {
                combinator,
                left,
                right,
            } => match combinator {
                CombinatorKind::And => write!(f, "{}{}", left, right),
                CombinatorKind::Descendant => write!(f, "{} {}", left, right),
                CombinatorKind::Child => write!(f, "{} > {}", left, right),
                CombinatorKind::AdjacentSibling => write!(f, "{} + {}", left, right),
                CombinatorKind::GeneralSibling => write!(f, "{} ~ {}", left, right),
            },
        }
    }
}

static NEXT_DECLARATION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one parsed declaration, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclarationId(u64);

impl DeclarationId {
    pub(crate) fn next() -> Self {
        Self(NEXT_DECLARATION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A property name with its value left as raw tokens.
#[derive(Debug, Clone, Serialize)]
pub struct Declaration {
    pub id: DeclarationId,
    pub property: String,
    pub terms: Vec<Token>,
    pub line: usize,
}

impl Declaration {
    pub fn new(property: impl Into<String>, terms: Vec<Token>, line: usize) -> Self {
        Self {
            id: DeclarationId::next(),
            property: property.into(),
            terms,
            line,
        }
    }

    pub fn is_custom_property(&self) -> bool {
        self.property.starts_with("--")
    }

    pub fn value_text(&self) -> String {
        tokens_to_css(&self.terms)
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.value_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_display() {
        let selector = Selector::combine(
            CombinatorKind::Child,
            Selector::Type {
                name: "g".to_string(),
            },
            Selector::combine(
                CombinatorKind::And,
                Selector::Type {
                    name: "rect".to_string(),
                },
                Selector::Attribute {
                    name: "data-x".to_string(),
                    matching: AttributeMatch::PrefixMatch,
                    value: Some("abc".to_string()),
                },
            ),
        );
        assert_eq!(selector.to_string(), "g > rect[data-x^=\"abc\"]");
    }

    #[test]
    fn test_declaration_ids_are_unique() {
        let a = Declaration::new("fill", Vec::new(), 1);
        let b = a.clone();
        let c = Declaration::new("fill", Vec::new(), 1);
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert!(Declaration::new("--x", Vec::new(), 1).is_custom_property());
    }
}
