use super::{trim_whitespace, CssFunction, FunctionCall, FunctionProcessor, ProcessContext};
use crate::color::parse_color;
use crate::converter::TokenCursor;
use crate::error::Result;
use crate::lexer::{Token, TokenType, Tokenizer};
use crate::selector::SelectorModel;

/// `attr(name type-or-unit?, fallback?)`
///
/// The fully comma separated spelling `attr(name, type, fallback)` is also
/// accepted.
pub struct AttrFunction;

const TYPE_KEYWORDS: &[&str] = &[
    "string",
    "ident",
    "url",
    "color",
    "integer",
    "number",
    "length",
    "percentage",
    "angle",
    "time",
    "frequency",
];

const LENGTH_UNITS: &[&str] = &[
    "px", "em", "rem", "ex", "ch", "vw", "vh", "vmin", "vmax", "cm", "mm", "q", "in", "pt", "pc",
];
const ANGLE_UNITS: &[&str] = &["deg", "grad", "rad", "turn"];
const TIME_UNITS: &[&str] = &["s", "ms"];
const FREQUENCY_UNITS: &[&str] = &["hz", "khz"];

#[derive(Debug, Clone, PartialEq)]
enum AttrType {
    Keyword(String),
    Unit(String),
}

impl AttrType {
    fn from_token(token: &Token) -> Option<AttrType> {
        match &token.token_type {
            TokenType::Ident(name) => {
                let lower = name.to_ascii_lowercase();
                if TYPE_KEYWORDS.contains(&lower.as_str()) {
                    Some(AttrType::Keyword(lower))
                } else {
                    Some(AttrType::Unit(name.clone()))
                }
            }
            TokenType::Delim('%') => Some(AttrType::Unit("%".to_string())),
            _ => None,
        }
    }
}

impl<M: SelectorModel> CssFunction<M> for AttrFunction {
    fn name(&self) -> &str {
        "attr"
    }

    fn evaluate(
        &self,
        call: &FunctionCall,
        element: &M::Element,
        processor: &FunctionProcessor<M>,
        context: &mut ProcessContext<'_, M>,
    ) -> Result<Vec<Token>> {
        let head: Vec<&Token> = call
            .argument(0)
            .unwrap_or_default()
            .iter()
            .filter(|t| !t.is_whitespace())
            .collect();

        let (name, inline_type) = match head.as_slice() {
            [name] => (attribute_name(call, name)?, None),
            [name, kind] => {
                let kind = AttrType::from_token(kind)
                    .ok_or_else(|| call.error(format!("invalid type '{}'", kind)))?;
                (attribute_name(call, name)?, Some(kind))
            }
            _ => return Err(call.error("attribute name expected")),
        };

        let (attr_type, fallback_index) = match inline_type {
            Some(kind) => (kind, 1),
            None => match separate_type(call) {
                Some(kind) => (kind, 2),
                None => (AttrType::Keyword("string".to_string()), 1),
            },
        };

        let coerced = context
            .model
            .attribute_value(element, &name)
            .and_then(|value| coerce(call, &value, &attr_type));

        if let Some(tokens) = coerced {
            return Ok(tokens);
        }

        log::trace!("attr({}) falls back for element", name);
        match call.arguments_from(fallback_index) {
            Some(fallback) => processor.process(&fallback, element, context),
            None => Ok(vec![call.token(TokenType::Ident("none".to_string()))]),
        }
    }
}

fn attribute_name(call: &FunctionCall, token: &Token) -> Result<String> {
    match &token.token_type {
        TokenType::Ident(name) => Ok(name.clone()),
        _ => Err(call.error(format!("attribute name expected, found '{}'", token))),
    }
}

/// Type given as its own argument: `attr(name, type, fallback)`, or a lone
/// type keyword in second position.
fn separate_type(call: &FunctionCall) -> Option<AttrType> {
    let [token] = call.argument(1)? else {
        return None;
    };
    let kind = AttrType::from_token(token)?;
    match kind {
        AttrType::Keyword(_) => Some(kind),
        AttrType::Unit(_) if call.arguments.len() >= 3 => Some(kind),
        AttrType::Unit(_) => None,
    }
}

fn coerce(call: &FunctionCall, value: &str, attr_type: &AttrType) -> Option<Vec<Token>> {
    let single = |token_type: TokenType| Some(vec![call.token(token_type)]);

    let keyword = match attr_type {
        AttrType::Keyword(keyword) => keyword.as_str(),
        AttrType::Unit(unit) => {
            let number = parse_number(value)?;
            return if unit == "%" {
                single(TokenType::Percentage(number))
            } else {
                single(TokenType::Dimension(number, unit.clone()))
            };
        }
    };

    match keyword {
        "string" => single(TokenType::String(value.to_string())),
        "url" => single(TokenType::Url(value.trim().to_string())),
        "ident" => match value_tokens(value)?.as_slice() {
            [token @ Token {
                token_type: TokenType::Ident(_),
                ..
            }] => Some(vec![token.clone()]),
            _ => None,
        },
        "color" => {
            let tokens = value_tokens(value)?;
            let mut cursor = TokenCursor::new(&tokens);
            parse_color(&mut cursor).ok()?;
            cursor.skip_whitespace();
            cursor.is_at_end().then_some(tokens)
        }
        "integer" => {
            let number = parse_number(value)?;
            (number.fract() == 0.0).then(|| vec![call.token(TokenType::Number(number))])
        }
        "number" => single(TokenType::Number(parse_number(value)?)),
        "percentage" => match single_token(value)? {
            TokenType::Percentage(n) => single(TokenType::Percentage(n)),
            _ => None,
        },
        "length" => match single_token(value)? {
            TokenType::Dimension(n, unit)
                if LENGTH_UNITS.contains(&unit.to_ascii_lowercase().as_str()) =>
            {
                single(TokenType::Dimension(n, unit))
            }
            TokenType::Number(n) if n == 0.0 => single(TokenType::Number(n)),
            _ => None,
        },
        "angle" => dimension_in(value, ANGLE_UNITS).and_then(single),
        "time" => dimension_in(value, TIME_UNITS).and_then(single),
        "frequency" => dimension_in(value, FREQUENCY_UNITS).and_then(single),
        _ => None,
    }
}

fn value_tokens(value: &str) -> Option<Vec<Token>> {
    let (tokens, errors) = Tokenizer::tokenize(value);
    if !errors.is_empty() {
        return None;
    }
    let tokens = trim_whitespace(
        tokens
            .into_iter()
            .filter(|t| t.token_type != TokenType::Eof)
            .collect(),
    );
    (!tokens.is_empty()).then_some(tokens)
}

fn single_token(value: &str) -> Option<TokenType> {
    match value_tokens(value)?.as_slice() {
        [token] => Some(token.token_type.clone()),
        _ => None,
    }
}

fn parse_number(value: &str) -> Option<f64> {
    match single_token(value)? {
        TokenType::Number(n) => Some(n),
        _ => None,
    }
}

fn dimension_in(value: &str, units: &[&str]) -> Option<TokenType> {
    match single_token(value)? {
        TokenType::Dimension(n, unit) if units.contains(&unit.to_ascii_lowercase().as_str()) => {
            Some(TokenType::Dimension(n, unit))
        }
        _ => None,
    }
}
