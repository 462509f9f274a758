//! Typed parse/serialize boundary between raw declaration tokens and values

use crate::color::{parse_color, Color};
use crate::error::{Result, StyleError};
use crate::lexer::{format_number, Token, TokenType};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Cursor over a token slice. Converters consume as much as forms a valid
/// value and leave the cursor after it.
#[derive(Debug, Clone)]
pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.tokens.len());
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens
            .get(self.position)
            .filter(|t| t.token_type != TokenType::Eof)
    }

    pub fn next(&mut self) -> Option<&'a Token> {
        let token = self.peek()?;
        self.position += 1;
        Some(token)
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, Token::is_whitespace) {
            self.position += 1;
        }
    }

    pub fn next_non_whitespace(&mut self) -> Option<&'a Token> {
        self.skip_whitespace();
        self.next()
    }

    /// True when only whitespace (or nothing) is left.
    pub fn is_at_end(&self) -> bool {
        self.tokens[self.position..]
            .iter()
            .all(|t| t.is_whitespace() || t.token_type == TokenType::Eof)
    }

    pub fn remaining(&self) -> &'a [Token] {
        &self.tokens[self.position..]
    }
}

pub trait Converter {
    type Value;

    fn parse(&self, cursor: &mut TokenCursor<'_>) -> Result<Self::Value>;

    fn to_css(&self, value: &Self::Value) -> String;

    /// Value for contexts that must not fail.
    fn default_value(&self) -> Self::Value;

    /// Parses a complete token sequence; anything left over is an error.
    fn parse_tokens(&self, tokens: &[Token]) -> Result<Self::Value> {
        let mut cursor = TokenCursor::new(tokens);
        cursor.skip_whitespace();
        let value = self.parse(&mut cursor)?;
        if !cursor.is_at_end() {
            let rest = cursor.remaining().iter().find(|t| !t.is_whitespace());
            let found = rest.map(|t| t.to_string()).unwrap_or_default();
            return Err(StyleError::conversion("", format!("Unexpected '{}' after value", found)));
        }
        Ok(value)
    }

    fn parse_or_default(&self, tokens: &[Token]) -> Self::Value {
        self.parse_tokens(tokens)
            .unwrap_or_else(|_| self.default_value())
    }
}

/// Values the stock converters produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum StyleValue {
    Ident(String),
    String(String),
    Number(f64),
    Dimension(f64, String),
    Percentage(f64),
    Color(Color),
    Url(String),
    List(Vec<StyleValue>),
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleValue::Ident(s) => write!(f, "{}", TokenType::Ident(s.clone())),
            StyleValue::String(s) => write!(f, "{}", TokenType::String(s.clone())),
            StyleValue::Number(n) => write!(f, "{}", format_number(*n)),
            StyleValue::Dimension(n, unit) => write!(f, "{}{}", format_number(*n), unit),
            StyleValue::Percentage(n) => write!(f, "{}%", format_number(*n)),
            StyleValue::Color(color) => write!(f, "{}", color),
            StyleValue::Url(s) => write!(f, "{}", TokenType::Url(s.clone())),
            StyleValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

pub type DynConverter = Box<dyn Converter<Value = StyleValue>>;

fn expected(what: &str, token: Option<&Token>) -> StyleError {
    match token {
        Some(token) => StyleError::conversion("", format!("{} expected, found '{}'", what, token)),
        None => StyleError::conversion("", format!("{} expected", what)),
    }
}

/// Identifier, optionally restricted to a fixed set of keywords.
#[derive(Debug, Clone, Default)]
pub struct IdentConverter {
    allowed: Vec<String>,
    default: Option<String>,
}

impl IdentConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keywords(keywords: &[&str]) -> Self {
        Self {
            allowed: keywords.iter().map(|k| k.to_string()).collect(),
            default: keywords.first().map(|k| k.to_string()),
        }
    }
}

impl Converter for IdentConverter {
    type Value = StyleValue;

    fn parse(&self, cursor: &mut TokenCursor<'_>) -> Result<StyleValue> {
        let token = cursor.next_non_whitespace();
        match token.map(|t| &t.token_type) {
            Some(TokenType::Ident(name))
                if self.allowed.is_empty()
                    || self.allowed.iter().any(|k| k.eq_ignore_ascii_case(name)) =>
            {
                Ok(StyleValue::Ident(name.clone()))
            }
            _ => Err(expected("identifier", token)),
        }
    }

    fn to_css(&self, value: &StyleValue) -> String {
        value.to_string()
    }

    fn default_value(&self) -> StyleValue {
        StyleValue::Ident(self.default.clone().unwrap_or_else(|| "none".to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringConverter;

impl Converter for StringConverter {
    type Value = StyleValue;

    fn parse(&self, cursor: &mut TokenCursor<'_>) -> Result<StyleValue> {
        let token = cursor.next_non_whitespace();
        match token.map(|t| &t.token_type) {
            Some(TokenType::String(s)) => Ok(StyleValue::String(s.clone())),
            _ => Err(expected("string", token)),
        }
    }

    fn to_css(&self, value: &StyleValue) -> String {
        value.to_string()
    }

    fn default_value(&self) -> StyleValue {
        StyleValue::String(String::new())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NumberConverter;

impl Converter for NumberConverter {
    type Value = StyleValue;

    fn parse(&self, cursor: &mut TokenCursor<'_>) -> Result<StyleValue> {
        let token = cursor.next_non_whitespace();
        match token.map(|t| &t.token_type) {
            Some(TokenType::Number(n)) => Ok(StyleValue::Number(*n)),
            _ => Err(expected("number", token)),
        }
    }

    fn to_css(&self, value: &StyleValue) -> String {
        value.to_string()
    }

    fn default_value(&self) -> StyleValue {
        StyleValue::Number(0.0)
    }
}

/// Number, dimension or percentage.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthConverter;

impl Converter for LengthConverter {
    type Value = StyleValue;

    fn parse(&self, cursor: &mut TokenCursor<'_>) -> Result<StyleValue> {
        let token = cursor.next_non_whitespace();
        match token.map(|t| &t.token_type) {
            Some(TokenType::Number(n)) => Ok(StyleValue::Number(*n)),
            Some(TokenType::Dimension(n, unit)) => Ok(StyleValue::Dimension(*n, unit.clone())),
            Some(TokenType::Percentage(n)) => Ok(StyleValue::Percentage(*n)),
            _ => Err(expected("length", token)),
        }
    }

    fn to_css(&self, value: &StyleValue) -> String {
        value.to_string()
    }

    fn default_value(&self) -> StyleValue {
        StyleValue::Number(0.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ColorConverter;

impl Converter for ColorConverter {
    type Value = StyleValue;

    fn parse(&self, cursor: &mut TokenCursor<'_>) -> Result<StyleValue> {
        parse_color(cursor).map(StyleValue::Color)
    }

    fn to_css(&self, value: &StyleValue) -> String {
        value.to_string()
    }

    fn default_value(&self) -> StyleValue {
        StyleValue::Color(Color::BLACK)
    }
}

/// Whitespace-separated list of whatever `inner` parses.
pub struct ListConverter {
    inner: DynConverter,
}

impl ListConverter {
    pub fn new(inner: DynConverter) -> Self {
        Self { inner }
    }
}

impl Converter for ListConverter {
    type Value = StyleValue;

    fn parse(&self, cursor: &mut TokenCursor<'_>) -> Result<StyleValue> {
        let mut items = vec![self.inner.parse(cursor)?];
        loop {
            cursor.skip_whitespace();
            if cursor.is_at_end() {
                return Ok(StyleValue::List(items));
            }
            let position = cursor.position();
            match self.inner.parse(cursor) {
                Ok(item) => items.push(item),
                Err(_) => {
                    // stop before the first token that is not an item
                    cursor.set_position(position);
                    return Ok(StyleValue::List(items));
                }
            }
        }
    }

    fn to_css(&self, value: &StyleValue) -> String {
        value.to_string()
    }

    fn default_value(&self) -> StyleValue {
        StyleValue::List(Vec::new())
    }
}

/// Property name to converter lookup, constructed explicitly and handed to
/// the style manager.
#[derive(Default)]
pub struct ConverterRegistry {
    converters: HashMap<String, DynConverter>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, property: impl Into<String>, converter: DynConverter) {
        self.converters.insert(property.into(), converter);
    }

    pub fn with(mut self, property: impl Into<String>, converter: DynConverter) -> Self {
        self.register(property, converter);
        self
    }

    pub fn lookup(&self, property: &str) -> Option<&dyn Converter<Value = StyleValue>> {
        self.converters.get(property).map(|c| c.as_ref())
    }

    pub fn contains(&self, property: &str) -> bool {
        self.converters.contains_key(property)
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}
