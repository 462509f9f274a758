//! Stylecore styling engine
//!
//! A CSS-like styling engine: stylesheets are tokenized and parsed into an
//! immutable AST, selectors are matched against any element tree exposed
//! through [`SelectorModel`], and declarations from four origins are merged
//! into typed values.
//!
//! # Features
//!
//! - Error-recovering tokenizer and recursive-descent parser
//! - Type, id, class, pseudo-class and attribute selectors with all four combinators
//! - Cascade over user agent, user, author and inline origins
//! - Value functions: `var()`, `attr()`, `concat()`, `replace()`, `round()`, `ladder()`
//! - Pluggable typed-value converters
//! - Per-origin property store with explicit dirty tracking
//!
//! # Basic Usage
//!
//! ```rust
//! use stylecore::parse_stylesheet;
//!
//! let (sheet, errors) = parse_stylesheet("rect > circle { fill: var(--accent, red); }");
//! assert!(errors.is_empty());
//! assert_eq!(sheet.rules[0].selector_group.to_string(), "rect > circle");
//! ```
//!
//! # Resolution Pipeline
//!
//! 1. **Tokenizer**: text to tokens, unterminated literals recovered
//! 2. **Parser**: tokens to [`Stylesheet`], errors collected per rule or declaration
//! 3. **Matcher**: selects the rules that apply to an element
//! 4. **Cascade**: last declaration wins inside an origin, higher origins win overall
//! 5. **Functions**: `var()` and friends expanded for the element
//! 6. **Converters**: raw tokens become typed [`StyleValue`]s

pub mod error;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod selector;
pub mod converter;
pub mod color;
pub mod functions;
pub mod cascade;
pub mod store;
pub mod config;

pub use error::{Result, SourcePosition, StyleError};
pub use lexer::{tokens_to_css, Token, TokenType, Tokenizer};
pub use ast::{
    AttributeMatch, CombinatorKind, Declaration, DeclarationId, Rule, Selector, SelectorGroup,
    Stylesheet,
};
pub use parser::{parse_declarations, parse_selector, parse_stylesheet, Parser};
pub use selector::{PseudoClassState, SelectorMatcher, SelectorModel};
pub use converter::{
    ColorConverter, Converter, ConverterRegistry, IdentConverter, LengthConverter, ListConverter,
    NumberConverter, StringConverter, StyleValue, TokenCursor,
};
pub use color::Color;
pub use functions::{
    custom_properties, CssFunction, CustomPropertyMap, FunctionCall, FunctionProcessor,
};
pub use cascade::{
    CascadedDeclaration, ResolvedStyle, ResolvedValue, StyleManager, StyleOrigin, StylesheetEntry,
    StylesheetSource,
};
pub use store::PropertyStore;
pub use config::EngineConfig;

use std::path::Path;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Reads and parses one stylesheet file.
///
/// Only I/O problems are returned as `Err`; syntax errors are recovered and
/// come back next to the stylesheet.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<(Stylesheet, Vec<StyleError>)> {
    let source = std::fs::read_to_string(path.as_ref())?;
    log::debug!("Parsing {} ({} bytes)", path.as_ref().display(), source.len());
    Ok(parse_stylesheet(&source))
}

/// Registry with converters for a handful of common properties.
pub fn default_converters() -> ConverterRegistry {
    let length = || -> converter::DynConverter { Box::new(LengthConverter) };
    ConverterRegistry::new()
        .with("fill", Box::new(ColorConverter))
        .with("stroke", Box::new(ColorConverter))
        .with("color", Box::new(ColorConverter))
        .with("background-color", Box::new(ColorConverter))
        .with("stroke-width", length())
        .with("width", length())
        .with("height", length())
        .with("font-size", length())
        .with("opacity", Box::new(NumberConverter))
        .with("stroke-dasharray", Box::new(ListConverter::new(length())))
        .with("content", Box::new(StringConverter))
        .with(
            "display",
            Box::new(IdentConverter::with_keywords(&["none", "block", "inline"])),
        )
        .with(
            "visibility",
            Box::new(IdentConverter::with_keywords(&["visible", "hidden", "collapse"])),
        )
}
