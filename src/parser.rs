//! Recursive descent parser for stylesheets and inline declaration lists
//!
//! Syntax errors are recovered at rule granularity for stylesheets and at
//! declaration granularity inside blocks and inline style text. Every
//! recovered error is collected and handed back alongside the result.

use crate::ast::*;
use crate::error::{Result, StyleError};
use crate::lexer::{Token, TokenType, Tokenizer};

pub struct Parser {
    tokenizer: Tokenizer,
    errors: Vec<StyleError>,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self {
            tokenizer: Tokenizer::new(source),
            errors: Vec::new(),
        }
    }

    /// Parses a full stylesheet. One bad rule never loses the rest of the sheet.
    pub fn parse_stylesheet(mut self) -> (Stylesheet, Vec<StyleError>) {
        let mut rules = Vec::new();

        loop {
            let token = self.tokenizer.next_token();
            match &token.token_type {
                TokenType::Eof => break,
                TokenType::Whitespace | TokenType::Cdo | TokenType::Cdc => continue,
                TokenType::AtKeyword(name) => self.skip_at_rule(name),
                TokenType::RightBrace => {
                    self.record(StyleError::syntax(token.position(), "Unexpected '}'"));
                }
                _ => {
                    self.tokenizer.push_back();
                    match self.parse_rule() {
                        Ok(rule) => rules.push(rule),
                        Err(error) => {
                            self.record(error);
                            self.recover_rule();
                        }
                    }
                }
            }
        }

        let errors = self.finish();
        (Stylesheet::new(rules), errors)
    }

    /// Parses the body of an inline `style=".."` attribute.
    pub fn parse_declaration_list(mut self) -> (Vec<Declaration>, Vec<StyleError>) {
        let mut declarations = Vec::new();
        self.parse_declarations(&mut declarations, true);
        let errors = self.finish();
        (declarations, errors)
    }

    /// Parses standalone selector text such as `g > rect.selected`.
    pub fn parse_selector_text(mut self) -> Result<SelectorGroup> {
        let group = self.parse_selector_group()?;
        let token = self.tokenizer.next_non_whitespace();
        if token.token_type != TokenType::Eof {
            return Err(StyleError::syntax(
                token.position(),
                format!("Unexpected '{}' after selector", token),
            ));
        }
        if let Some(error) = self.tokenizer.take_errors().into_iter().next() {
            return Err(error);
        }
        Ok(group)
    }

    fn finish(&mut self) -> Vec<StyleError> {
        let mut errors = self.tokenizer.take_errors();
        errors.append(&mut self.errors);
        errors.sort_by_key(|e| e.position().map(|p| p.start).unwrap_or(0));
        errors
    }

    fn record(&mut self, error: StyleError) {
        log::debug!("Recovered from {}", error);
        self.errors.push(error);
    }

    /// Builds an error for `token` and pushes it back, so recovery starts at
    /// the offending token.
    fn unexpected(&mut self, token: &Token, message: impl Into<String>) -> StyleError {
        self.tokenizer.push_back();
        StyleError::syntax(token.position(), message)
    }

    fn parse_rule(&mut self) -> Result<Rule> {
        let line = self.tokenizer.next_token().line;
        self.tokenizer.push_back();

        let selector_group = self.parse_selector_group()?;

        let token = self.tokenizer.next_non_whitespace();
        if token.token_type != TokenType::LeftBrace {
            let message = format!("'{{' expected after selector, found '{}'", token);
            return Err(self.unexpected(&token, message));
        }

        let mut declarations = Vec::new();
        if !self.parse_declarations(&mut declarations, false) {
            let position = self.tokenizer.position();
            self.record(StyleError::syntax(
                position,
                format!("Unexpected end of input in rule '{}', '}}' expected", selector_group),
            ));
        }

        Ok(Rule {
            selector_group,
            declarations,
            line,
        })
    }

    fn parse_selector_group(&mut self) -> Result<SelectorGroup> {
        self.tokenizer.next_non_whitespace();
        self.tokenizer.push_back();

        let mut selectors = vec![self.parse_selector()?];
        loop {
            let token = self.tokenizer.next_non_whitespace();
            if token.token_type == TokenType::Comma {
                self.tokenizer.next_non_whitespace();
                self.tokenizer.push_back();
                selectors.push(self.parse_selector()?);
            } else {
                self.tokenizer.push_back();
                return Ok(SelectorGroup::new(selectors));
            }
        }
    }

    fn parse_selector(&mut self) -> Result<Selector> {
        let mut selector = self.parse_compound()?;

        loop {
            let token = self.tokenizer.next_token();
            let combinator = match &token.token_type {
                TokenType::Whitespace => {
                    let next = self.tokenizer.next_non_whitespace();
                    match &next.token_type {
                        TokenType::Greater => CombinatorKind::Child,
                        TokenType::Plus => CombinatorKind::AdjacentSibling,
                        TokenType::Tilde => CombinatorKind::GeneralSibling,
                        TokenType::LeftBrace | TokenType::Comma | TokenType::Eof => {
                            self.tokenizer.push_back();
                            return Ok(selector);
                        }
                        _ => {
                            self.tokenizer.push_back();
                            CombinatorKind::Descendant
                        }
                    }
                }
                TokenType::Greater => CombinatorKind::Child,
                TokenType::Plus => CombinatorKind::AdjacentSibling,
                TokenType::Tilde => CombinatorKind::GeneralSibling,
                _ => {
                    self.tokenizer.push_back();
                    return Ok(selector);
                }
            };

            if combinator != CombinatorKind::Descendant {
                self.tokenizer.next_non_whitespace();
                self.tokenizer.push_back();
            }

            let right = self.parse_compound()?;
            selector = Selector::combine(combinator, selector, right);
        }
    }

    fn parse_compound(&mut self) -> Result<Selector> {
        let mut compound: Option<Selector> = None;

        loop {
            let token = self.tokenizer.next_token();
            let simple = match &token.token_type {
                TokenType::Star => Selector::Universal,
                TokenType::Ident(name) => {
                    if compound.is_some() {
                        let message = format!(
                            "Type selector '{}' must come first in a compound selector",
                            name
                        );
                        return Err(self.unexpected(&token, message));
                    }
                    Selector::Type { name: name.clone() }
                }
                TokenType::Hash(name) => Selector::Id { name: name.clone() },
                TokenType::Dot => {
                    let next = self.tokenizer.next_token();
                    match &next.token_type {
                        TokenType::Ident(name) => Selector::Class { name: name.clone() },
                        _ => return Err(self.unexpected(&next, "Class name expected after '.'")),
                    }
                }
                TokenType::Colon => {
                    let next = self.tokenizer.next_token();
                    match &next.token_type {
                        TokenType::Ident(name) => Selector::PseudoClass { name: name.clone() },
                        TokenType::Colon => {
                            return Err(self.unexpected(&next, "Pseudo-elements are not supported"))
                        }
                        TokenType::Function(name) => {
                            let message =
                                format!("Functional pseudo-class ':{}()' is not supported", name);
                            return Err(self.unexpected(&next, message));
                        }
                        _ => {
                            let message = "Pseudo-class name expected after ':'";
                            return Err(self.unexpected(&next, message));
                        }
                    }
                }
                TokenType::LeftBracket => self.parse_attribute_selector()?,
                _ => {
                    self.tokenizer.push_back();
                    return compound.ok_or_else(|| {
                        let message = format!("Selector expected, found '{}'", token);
                        StyleError::syntax(token.position(), message)
                    });
                }
            };

            compound = Some(match compound {
                None => simple,
                Some(previous) => Selector::combine(CombinatorKind::And, previous, simple),
            });
        }
    }

    fn parse_attribute_selector(&mut self) -> Result<Selector> {
        let token = self.tokenizer.next_non_whitespace();
        let name = match &token.token_type {
            TokenType::Ident(name) => name.clone(),
            _ => return Err(self.unexpected(&token, "Attribute name expected after '['")),
        };

        let token = self.tokenizer.next_non_whitespace();
        if token.token_type == TokenType::RightBracket {
            return Ok(Selector::Attribute {
                name,
                matching: AttributeMatch::Exists,
                value: None,
            });
        }

        let Some(matching) = AttributeMatch::from_token(&token.token_type) else {
            return Err(self.unexpected(&token, "Attribute match operator or ']' expected"));
        };

        let token = self.tokenizer.next_non_whitespace();
        let value = match &token.token_type {
            TokenType::Ident(value) | TokenType::String(value) => value.clone(),
            TokenType::Number(_) | TokenType::Dimension(..) | TokenType::Percentage(_) => {
                token.to_string()
            }
            _ => return Err(self.unexpected(&token, "Attribute value expected")),
        };

        let token = self.tokenizer.next_non_whitespace();
        if token.token_type != TokenType::RightBracket {
            return Err(self.unexpected(&token, "']' expected after attribute value"));
        }

        Ok(Selector::Attribute {
            name,
            matching,
            value: Some(value),
        })
    }

    /// Parses declarations up to the closing `}` (or end of input when
    /// `inline`). Returns false when a block hit end of input unterminated.
    fn parse_declarations(&mut self, declarations: &mut Vec<Declaration>, inline: bool) -> bool {
        loop {
            let token = self.tokenizer.next_non_whitespace();
            match &token.token_type {
                TokenType::Semicolon => continue,
                TokenType::Eof => return inline,
                TokenType::RightBrace if !inline => return true,
                TokenType::RightBrace => {
                    self.record(StyleError::syntax(token.position(), "Unexpected '}'"));
                }
                _ => {
                    self.tokenizer.push_back();
                    match self.parse_declaration() {
                        Ok(declaration) => declarations.push(declaration),
                        Err(error) => {
                            self.record(error);
                            self.skip_declaration();
                        }
                    }
                }
            }
        }
    }

    fn parse_declaration(&mut self) -> Result<Declaration> {
        let name_token = self.tokenizer.next_non_whitespace();
        let property = match &name_token.token_type {
            TokenType::Ident(name) => name.clone(),
            _ => {
                let message = format!("Property name expected, found '{}'", name_token);
                return Err(self.unexpected(&name_token, message));
            }
        };

        let token = self.tokenizer.next_non_whitespace();
        if token.token_type != TokenType::Colon {
            let message = format!("':' expected after property '{}'", property);
            return Err(self.unexpected(&token, message));
        }

        let mut terms = self.collect_terms()?;
        while terms.first().map_or(false, Token::is_whitespace) {
            terms.remove(0);
        }
        while terms.last().map_or(false, Token::is_whitespace) {
            terms.pop();
        }

        if terms.is_empty() && !property.starts_with("--") {
            return Err(StyleError::syntax(
                name_token.position(),
                format!("Value expected for property '{}'", property),
            ));
        }
        if let Some(bad) = terms
            .iter()
            .find(|t| matches!(t.token_type, TokenType::BadString(_) | TokenType::BadUrl(_)))
        {
            return Err(StyleError::syntax(
                bad.position(),
                format!("Malformed value for property '{}'", property),
            ));
        }

        Ok(Declaration::new(property, terms, name_token.line))
    }

    /// Collects raw value tokens up to `;`, `}` or end of input at nesting
    /// depth zero. The terminator is left unread.
    fn collect_terms(&mut self) -> Result<Vec<Token>> {
        let mut terms = Vec::new();
        let mut closers: Vec<TokenType> = Vec::new();

        loop {
            let token = self.tokenizer.next_token();
            match &token.token_type {
                TokenType::Semicolon if closers.is_empty() => {
                    self.tokenizer.push_back();
                    return Ok(terms);
                }
                TokenType::RightBrace if closers.is_empty() => {
                    self.tokenizer.push_back();
                    return Ok(terms);
                }
                // Open blocks are closed by end of input; the enclosing rule
                // reports the missing '}'.
                TokenType::Eof => {
                    self.tokenizer.push_back();
                    return Ok(terms);
                }
                TokenType::Function(_) | TokenType::LeftParen => {
                    closers.push(TokenType::RightParen)
                }
                TokenType::LeftBracket => closers.push(TokenType::RightBracket),
                TokenType::LeftBrace => closers.push(TokenType::RightBrace),
                TokenType::RightParen | TokenType::RightBracket | TokenType::RightBrace => {
                    if closers.last() == Some(&token.token_type) {
                        closers.pop();
                    } else if token.token_type == TokenType::RightBrace {
                        return Err(self.unexpected(&token, "Unclosed parenthesis in value"));
                    } else {
                        return Err(StyleError::syntax(
                            token.position(),
                            format!("Unexpected '{}' in value", token),
                        ));
                    }
                }
                _ => {}
            }
            terms.push(token);
        }
    }

    /// Skips the remainder of a broken declaration, stopping after `;` or
    /// before the `}` that closes the enclosing block.
    fn skip_declaration(&mut self) {
        let mut depth = 0usize;

        loop {
            let token = self.tokenizer.next_token();
            match token.token_type {
                TokenType::Eof => {
                    self.tokenizer.push_back();
                    return;
                }
                TokenType::Semicolon if depth == 0 => return,
                TokenType::RightBrace if depth == 0 => {
                    self.tokenizer.push_back();
                    return;
                }
                TokenType::LeftBrace
                | TokenType::LeftParen
                | TokenType::LeftBracket
                | TokenType::Function(_) => {
                    depth += 1;
                }
                TokenType::RightBrace | TokenType::RightParen | TokenType::RightBracket => {
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            }
        }
    }

    /// Skips a broken rule: everything up to and including its block.
    fn recover_rule(&mut self) {
        loop {
            match self.tokenizer.next_token().token_type {
                TokenType::Eof => return,
                TokenType::LeftBrace => {
                    self.skip_block();
                    return;
                }
                _ => {}
            }
        }
    }

    /// Skips to the `}` matching an already consumed `{`.
    fn skip_block(&mut self) {
        let mut depth = 1usize;

        while depth > 0 {
            match self.tokenizer.next_token().token_type {
                TokenType::Eof => return,
                TokenType::LeftBrace => depth += 1,
                TokenType::RightBrace => depth -= 1,
                _ => {}
            }
        }
    }

    fn skip_at_rule(&mut self, name: &str) {
        log::debug!("Skipping unsupported at-rule '@{}'", name);

        loop {
            match self.tokenizer.next_token().token_type {
                TokenType::Eof | TokenType::Semicolon => return,
                TokenType::LeftBrace => {
                    self.skip_block();
                    return;
                }
                _ => {}
            }
        }
    }
}

/// Parses stylesheet text, returning the rules that parsed cleanly together
/// with every recovered error.
pub fn parse_stylesheet(source: &str) -> (Stylesheet, Vec<StyleError>) {
    Parser::new(source).parse_stylesheet()
}

/// Parses an inline declaration list such as `fill: red; stroke: blue`.
pub fn parse_declarations(source: &str) -> (Vec<Declaration>, Vec<StyleError>) {
    Parser::new(source).parse_declaration_list()
}

pub fn parse_selector(source: &str) -> Result<SelectorGroup> {
    Parser::new(source).parse_selector_text()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokens_to_css;

    fn type_selector(name: &str) -> Selector {
        Selector::Type {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_simple_rule() {
        let (sheet, errors) = parse_stylesheet("rect { fill: red; stroke-width: 2px }");
        assert!(errors.is_empty());
        assert_eq!(sheet.rules.len(), 1);

        let rule = &sheet.rules[0];
        assert_eq!(rule.selector_group.selectors, vec![type_selector("rect")]);
        assert_eq!(rule.declarations.len(), 2);
        assert_eq!(rule.declarations[0].property, "fill");
        assert_eq!(rule.declarations[0].value_text(), "red");
        assert_eq!(rule.declarations[1].value_text(), "2px");
    }

    #[test]
    fn test_malformed_rule_is_skipped() {
        let (sheet, errors) = parse_stylesheet("rect[ { fill: red; }\ncircle { fill: blue; }");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], StyleError::Syntax { .. }));
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].selector_group.selectors, vec![type_selector("circle")]);
        assert_eq!(sheet.rules[0].line, 2);
    }

    #[test]
    fn test_bad_declaration_keeps_the_rest_of_the_rule() {
        let (sheet, errors) =
            parse_stylesheet("rect { fill red; stroke: blue; : x; opacity: 0.5 }");
        assert_eq!(errors.len(), 2);
        let properties: Vec<_> = sheet.rules[0]
            .declarations
            .iter()
            .map(|d| d.property.as_str())
            .collect();
        assert_eq!(properties, vec!["stroke", "opacity"]);
    }

    #[test]
    fn test_missing_colon_before_brace_keeps_following_rule() {
        let (sheet, errors) = parse_stylesheet("a { fill } b { fill: red }");
        assert_eq!(errors.len(), 1);
        assert_eq!(sheet.rules.len(), 2);
        assert!(sheet.rules[0].declarations.is_empty());
    }

    #[test]
    fn test_combinators_associate_to_the_left() {
        let group = parse_selector("a > b c").unwrap();
        let expected = Selector::combine(
            CombinatorKind::Descendant,
            Selector::combine(CombinatorKind::Child, type_selector("a"), type_selector("b")),
            type_selector("c"),
        );
        assert_eq!(group.selectors, vec![expected]);
    }

    #[test]
    fn test_compound_and_sibling_selectors() {
        let group = parse_selector("rect.big#r1:hover+circle ~ *, [data-x|=en]").unwrap();
        assert_eq!(group.selectors.len(), 2);
        assert_eq!(
            group.to_string(),
            "rect.big#r1:hover + circle ~ *, [data-x|=\"en\"]"
        );
    }

    #[test]
    fn test_attribute_selectors() {
        let group = parse_selector("[ data-x ^= \"abc\" ][flag]").unwrap();
        let expected = Selector::combine(
            CombinatorKind::And,
            Selector::Attribute {
                name: "data-x".to_string(),
                matching: AttributeMatch::PrefixMatch,
                value: Some("abc".to_string()),
            },
            Selector::Attribute {
                name: "flag".to_string(),
                matching: AttributeMatch::Exists,
                value: None,
            },
        );
        assert_eq!(group.selectors, vec![expected]);
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(parse_selector("rect >").is_err());
        assert!(parse_selector(".").is_err());
        assert!(parse_selector("a::before").is_err());
        assert!(parse_selector(":not(a)").is_err());
        assert!(parse_selector("[x=]").is_err());
    }

    #[test]
    fn test_terms_keep_nested_functions() {
        let (declarations, errors) =
            parse_declarations("fill: var(--brand, rgb(1, 2, 3)); --empty:;");
        assert!(errors.is_empty());
        assert_eq!(declarations.len(), 2);
        assert_eq!(tokens_to_css(&declarations[0].terms), "var(--brand, rgb(1, 2, 3))");
        assert!(declarations[1].terms.is_empty());
    }

    #[test]
    fn test_inline_declarations_recover() {
        let (declarations, errors) = parse_declarations("fill: ; } stroke: red; width: (1");
        assert_eq!(errors.len(), 3);
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].property, "stroke");
    }

    #[test]
    fn test_at_rules_and_cdo_are_skipped() {
        let source = "<!-- @import url(a.css); @media print { a { b: c } } rect { fill: red } -->";
        let (sheet, errors) = parse_stylesheet(source);
        assert!(errors.is_empty());
        assert_eq!(sheet.rules.len(), 1);
    }

    #[test]
    fn test_unterminated_rule_keeps_declarations() {
        let (sheet, errors) = parse_stylesheet("rect { fill: red");
        assert_eq!(errors.len(), 1);
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].declarations[0].value_text(), "red");
    }

    #[test]
    fn test_unterminated_function_reports_only_the_rule() {
        let (sheet, errors) = parse_stylesheet("rect { fill: rgb(1, 2");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Unexpected end of input in rule 'rect'"));
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].declarations.len(), 1);
        assert_eq!(sheet.rules[0].declarations[0].property, "fill");

        let (declarations, errors) = parse_declarations("stroke: var(--edge, [blue");
        assert!(errors.is_empty());
        assert_eq!(declarations.len(), 1);
    }

    #[test]
    fn test_bad_string_invalidates_declaration() {
        let (sheet, errors) = parse_stylesheet("text { content: \"abc\n; fill: red }");
        // lexical error plus syntax error for the declaration
        assert_eq!(errors.len(), 2);
        assert_eq!(sheet.rules[0].declarations.len(), 1);
        assert_eq!(sheet.rules[0].declarations[0].property, "fill");
    }
}
