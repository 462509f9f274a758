//! Lexical analysis for stylesheet source text

use crate::error::{SourcePosition, StyleError};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum TokenType {
    // Names and literals
    Ident(String),
    AtKeyword(String),
    Hash(String),
    String(String),
    BadString(String),
    Url(String),
    BadUrl(String),
    Function(String), // name followed by '('

    // Numeric
    Number(f64),
    Percentage(f64),
    Dimension(f64, String),

    // Punctuation
    LeftBrace,    // {
    RightBrace,   // }
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    Comma,        // ,
    Colon,        // :
    Semicolon,    // ;
    Dot,          // .
    Star,         // *
    Plus,         // +
    Greater,      // >
    Tilde,        // ~
    Equals,       // =

    // Attribute match operators
    IncludeMatch,   // ~=
    DashMatch,      // |=
    PrefixMatch,    // ^=
    SuffixMatch,    // $=
    SubstringMatch, // *=

    Delim(char),

    // Special
    Whitespace,
    Cdo, // <!--
    Cdc, // -->
    Eof,
}

impl TokenType {
    /// Numeric payload of number, percentage and dimension tokens.
    pub fn number(&self) -> Option<f64> {
        match self {
            TokenType::Number(n) | TokenType::Percentage(n) | TokenType::Dimension(n, _) => {
                Some(*n)
            }
            _ => None,
        }
    }

    /// String payload of name-like and string tokens.
    pub fn string_value(&self) -> Option<&str> {
        match self {
            TokenType::Ident(s)
            | TokenType::AtKeyword(s)
            | TokenType::Hash(s)
            | TokenType::String(s)
            | TokenType::BadString(s)
            | TokenType::Url(s)
            | TokenType::BadUrl(s)
            | TokenType::Function(s) => Some(s),
            _ => None,
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            TokenType::Dimension(_, unit) => Some(unit),
            TokenType::Percentage(_) => Some("%"),
            _ => None,
        }
    }
}

/// A token together with where it came from.
///
/// Tokens produced by function evaluation carry the position of the
/// function call that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(token_type: TokenType, position: SourcePosition) -> Self {
        Self {
            token_type,
            line: position.line,
            start: position.start,
            end: position.end,
        }
    }

    pub fn position(&self) -> SourcePosition {
        SourcePosition::new(self.line, self.start, self.end)
    }

    pub fn is_whitespace(&self) -> bool {
        self.token_type == TokenType::Whitespace
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token_type.fmt(f)
    }
}

/// Writes the token back out as CSS source text.
impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Ident(s) => write_ident(f, s),
            TokenType::AtKeyword(s) => {
                write!(f, "@")?;
                write_ident(f, s)
            }
            TokenType::Hash(s) => {
                write!(f, "#")?;
                write_name(f, s)
            }
            TokenType::String(s) => write_string(f, s),
            TokenType::BadString(s) => write!(f, "\"{}", s),
            TokenType::Url(s) | TokenType::BadUrl(s) => {
                write!(f, "url(")?;
                for ch in s.chars() {
                    if matches!(ch, ')' | '(' | '"' | '\'' | '\\') || ch.is_whitespace() {
                        write!(f, "\\")?;
                    }
                    write!(f, "{}", ch)?;
                }
                write!(f, ")")
            }
            TokenType::Function(name) => {
                write_ident(f, name)?;
                write!(f, "(")
            }
            TokenType::Number(n) => write!(f, "{}", format_number(*n)),
            TokenType::Percentage(n) => write!(f, "{}%", format_number(*n)),
            TokenType::Dimension(n, unit) => {
                write!(f, "{}", format_number(*n))?;
                write_name(f, unit)
            }
            TokenType::LeftBrace => write!(f, "{{"),
            TokenType::RightBrace => write!(f, "}}"),
            TokenType::LeftParen => write!(f, "("),
            TokenType::RightParen => write!(f, ")"),
            TokenType::LeftBracket => write!(f, "["),
            TokenType::RightBracket => write!(f, "]"),
            TokenType::Comma => write!(f, ","),
            TokenType::Colon => write!(f, ":"),
            TokenType::Semicolon => write!(f, ";"),
            TokenType::Dot => write!(f, "."),
            TokenType::Star => write!(f, "*"),
            TokenType::Plus => write!(f, "+"),
            TokenType::Greater => write!(f, ">"),
            TokenType::Tilde => write!(f, "~"),
            TokenType::Equals => write!(f, "="),
            TokenType::IncludeMatch => write!(f, "~="),
            TokenType::DashMatch => write!(f, "|="),
            TokenType::PrefixMatch => write!(f, "^="),
            TokenType::SuffixMatch => write!(f, "$="),
            TokenType::SubstringMatch => write!(f, "*="),
            TokenType::Delim(ch) => write!(f, "{}", ch),
            TokenType::Whitespace => write!(f, " "),
            TokenType::Cdo => write!(f, "<!--"),
            TokenType::Cdc => write!(f, "-->"),
            TokenType::Eof => Ok(()),
        }
    }
}

/// Formats a number the way it would be written in a stylesheet: integral
/// values lose their fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Serializes a token sequence back to CSS text.
pub fn tokens_to_css(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.to_string()).collect()
}

fn write_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    for ch in name.chars() {
        if is_name_char(ch) {
            write!(f, "{}", ch)?;
        } else {
            write!(f, "\\{}", ch)?;
        }
    }
    Ok(())
}

fn write_ident(f: &mut fmt::Formatter<'_>, ident: &str) -> fmt::Result {
    let mut chars = ident.chars();
    match (chars.next(), chars.next()) {
        (Some(first), _) if first.is_ascii_digit() => {
            write!(f, "\\{:x} ", first as u32)?;
            write_name(f, &ident[1..])
        }
        (Some('-'), Some(second)) if second.is_ascii_digit() => {
            write!(f, "-\\{:x} ", second as u32)?;
            write_name(f, &ident[2..])
        }
        _ => write_name(f, ident),
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    write!(f, "\"")?;
    for ch in value.chars() {
        match ch {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\a ")?,
            _ => write!(f, "{}", ch)?,
        }
    }
    write!(f, "\"")
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || !ch.is_ascii()
}

fn is_name_char(ch: char) -> bool {
    is_name_start(ch) || ch.is_ascii_digit() || ch == '-'
}

/// Pull tokenizer with a single token of push-back.
///
/// Lexical errors never stop tokenization: the offending construct is turned
/// into a best-effort token and the error is recorded for the caller.
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    line: usize,
    current: Token,
    pushed_back: bool,
    errors: Vec<StyleError>,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            current: Token::new(TokenType::Eof, SourcePosition::new(1, 0, 0)),
            pushed_back: false,
            errors: Vec::new(),
        }
    }

    /// Tokenizes the whole input, returning every token up to and including
    /// `Eof` plus the lexical errors encountered on the way.
    pub fn tokenize(input: &str) -> (Vec<Token>, Vec<StyleError>) {
        let mut tokenizer = Self::new(input);
        let mut tokens = Vec::new();

        loop {
            let token = tokenizer.next_token();
            let at_end = token.token_type == TokenType::Eof;
            tokens.push(token);
            if at_end {
                break;
            }
        }

        (tokens, tokenizer.take_errors())
    }

    /// Advances to the next token and returns it.
    pub fn next_token(&mut self) -> Token {
        if self.pushed_back {
            self.pushed_back = false;
        } else {
            self.current = self.lex();
        }
        self.current.clone()
    }

    /// Advances past whitespace and returns the first other token.
    pub fn next_non_whitespace(&mut self) -> Token {
        loop {
            let token = self.next_token();
            if !token.is_whitespace() {
                return token;
            }
        }
    }

    /// Un-reads the current token. Only one token of push-back is kept.
    pub fn push_back(&mut self) {
        self.pushed_back = true;
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn current_type(&self) -> &TokenType {
        &self.current.token_type
    }

    pub fn current_string(&self) -> Option<&str> {
        self.current.token_type.string_value()
    }

    pub fn current_number(&self) -> Option<f64> {
        self.current.token_type.number()
    }

    pub fn start_position(&self) -> usize {
        self.current.start
    }

    pub fn end_position(&self) -> usize {
        self.current.end
    }

    pub fn line_number(&self) -> usize {
        self.current.line
    }

    pub fn position(&self) -> SourcePosition {
        self.current.position()
    }

    pub fn take_errors(&mut self) -> Vec<StyleError> {
        std::mem::take(&mut self.errors)
    }

    fn lex(&mut self) -> Token {
        loop {
            if self.peek() == Some('/') && self.peek_at(1) == Some('*') {
                self.skip_comment();
                continue;
            }

            let start = self.position;
            let line = self.line;
            let token_type = self.lex_token_type();
            return Token {
                token_type,
                line,
                start,
                end: self.position,
            };
        }
    }

    fn lex_token_type(&mut self) -> TokenType {
        let Some(ch) = self.peek() else {
            return TokenType::Eof;
        };

        match ch {
            ch if ch.is_whitespace() => {
                while self.peek().map_or(false, |c| c.is_whitespace()) {
                    self.advance();
                }
                TokenType::Whitespace
            }
            '"' | '\'' => self.read_string(),
            '#' => {
                self.advance();
                if self.peek().map_or(false, is_name_char) || self.is_valid_escape(0) {
                    TokenType::Hash(self.read_name())
                } else {
                    TokenType::Delim('#')
                }
            }
            '(' => self.single(TokenType::LeftParen),
            ')' => self.single(TokenType::RightParen),
            '[' => self.single(TokenType::LeftBracket),
            ']' => self.single(TokenType::RightBracket),
            '{' => self.single(TokenType::LeftBrace),
            '}' => self.single(TokenType::RightBrace),
            ',' => self.single(TokenType::Comma),
            ':' => self.single(TokenType::Colon),
            ';' => self.single(TokenType::Semicolon),
            '>' => self.single(TokenType::Greater),
            '=' => self.single(TokenType::Equals),
            '+' => {
                if self.starts_number(0) {
                    self.read_numeric()
                } else {
                    self.single(TokenType::Plus)
                }
            }
            '-' => {
                if self.starts_number(0) {
                    self.read_numeric()
                } else if self.peek_at(1) == Some('-') && self.peek_at(2) == Some('>') {
                    self.advance_by(3);
                    TokenType::Cdc
                } else if self.starts_ident(0) {
                    self.read_ident_like()
                } else {
                    self.single(TokenType::Delim('-'))
                }
            }
            '.' => {
                if self.starts_number(0) {
                    self.read_numeric()
                } else {
                    self.single(TokenType::Dot)
                }
            }
            '<' => {
                if self.peek_at(1) == Some('!')
                    && self.peek_at(2) == Some('-')
                    && self.peek_at(3) == Some('-')
                {
                    self.advance_by(4);
                    TokenType::Cdo
                } else {
                    self.single(TokenType::Delim('<'))
                }
            }
            '@' => {
                self.advance();
                if self.starts_ident(0) {
                    TokenType::AtKeyword(self.read_name())
                } else {
                    TokenType::Delim('@')
                }
            }
            '\\' => {
                if self.is_valid_escape(0) {
                    self.read_ident_like()
                } else {
                    self.error_here("Invalid escape sequence");
                    self.single(TokenType::Delim('\\'))
                }
            }
            '*' => self.single_or_match(TokenType::Star, TokenType::SubstringMatch),
            '~' => self.single_or_match(TokenType::Tilde, TokenType::IncludeMatch),
            '|' => self.single_or_match(TokenType::Delim('|'), TokenType::DashMatch),
            '^' => self.single_or_match(TokenType::Delim('^'), TokenType::PrefixMatch),
            '$' => self.single_or_match(TokenType::Delim('$'), TokenType::SuffixMatch),
            ch if ch.is_ascii_digit() => self.read_numeric(),
            ch if is_name_start(ch) => self.read_ident_like(),
            other => self.single(TokenType::Delim(other)),
        }
    }

    fn single(&mut self, token_type: TokenType) -> TokenType {
        self.advance();
        token_type
    }

    fn single_or_match(&mut self, single: TokenType, with_equals: TokenType) -> TokenType {
        self.advance();
        if self.peek() == Some('=') {
            self.advance();
            with_equals
        } else {
            single
        }
    }

    fn skip_comment(&mut self) {
        let start = self.position;
        let line = self.line;
        self.advance_by(2);

        loop {
            match self.peek() {
                None => {
                    self.errors.push(StyleError::lex(
                        SourcePosition::new(line, start, self.position),
                        "Unterminated comment",
                    ));
                    return;
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance_by(2);
                    return;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn read_string(&mut self) -> TokenType {
        let start = self.position;
        let line = self.line;
        let quote = self.advance();
        let mut value = String::new();

        loop {
            match self.peek() {
                None => {
                    self.errors.push(StyleError::lex(
                        SourcePosition::new(line, start, self.position),
                        "Unterminated string literal",
                    ));
                    return TokenType::String(value);
                }
                Some('\n') => {
                    // The newline is left for the next token.
                    self.errors.push(StyleError::lex(
                        SourcePosition::new(line, start, self.position),
                        "Unterminated string literal",
                    ));
                    return TokenType::BadString(value);
                }
                Some('\\') => match self.peek_at(1) {
                    None => {
                        self.advance();
                    }
                    Some('\n') => {
                        self.advance_by(2);
                    }
                    Some(_) => {
                        self.advance();
                        value.push(self.read_escape());
                    }
                },
                Some(ch) if ch == quote => {
                    self.advance();
                    return TokenType::String(value);
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }
    }

    /// Reads the code point of an escape; the backslash is already consumed.
    fn read_escape(&mut self) -> char {
        let Some(first) = self.peek() else {
            return char::REPLACEMENT_CHARACTER;
        };

        if first.is_ascii_hexdigit() {
            let mut hex = String::new();
            while hex.len() < 6 && self.peek().map_or(false, |c| c.is_ascii_hexdigit()) {
                hex.push(self.advance());
            }
            if self.peek().map_or(false, |c| c.is_whitespace()) {
                self.advance();
            }
            u32::from_str_radix(&hex, 16)
                .ok()
                .filter(|&code| code != 0)
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER)
        } else {
            self.advance()
        }
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();

        loop {
            match self.peek() {
                Some(ch) if is_name_char(ch) => {
                    name.push(ch);
                    self.advance();
                }
                Some('\\') if self.is_valid_escape(0) => {
                    self.advance();
                    name.push(self.read_escape());
                }
                _ => return name,
            }
        }
    }

    fn read_ident_like(&mut self) -> TokenType {
        let name = self.read_name();

        if self.peek() != Some('(') {
            return TokenType::Ident(name);
        }
        self.advance();

        if name.eq_ignore_ascii_case("url") {
            let mut offset = 0;
            while self.peek_at(offset).map_or(false, |c| c.is_whitespace()) {
                offset += 1;
            }
            if !matches!(self.peek_at(offset), Some('"') | Some('\'')) {
                return self.read_url();
            }
        }

        TokenType::Function(name)
    }

    fn read_url(&mut self) -> TokenType {
        let start = self.position;
        let line = self.line;
        let mut value = String::new();
        self.skip_whitespace();

        loop {
            match self.peek() {
                None => {
                    self.errors.push(StyleError::lex(
                        SourcePosition::new(line, start, self.position),
                        "Unterminated url",
                    ));
                    return TokenType::Url(value);
                }
                Some(')') => {
                    self.advance();
                    return TokenType::Url(value);
                }
                Some(ch) if ch.is_whitespace() => {
                    self.skip_whitespace();
                    match self.peek() {
                        Some(')') => {
                            self.advance();
                            return TokenType::Url(value);
                        }
                        None => continue,
                        Some(_) => return self.read_bad_url(value, line, start),
                    }
                }
                Some('"') | Some('\'') | Some('(') => {
                    return self.read_bad_url(value, line, start);
                }
                Some('\\') => {
                    if self.is_valid_escape(0) {
                        self.advance();
                        value.push(self.read_escape());
                    } else {
                        return self.read_bad_url(value, line, start);
                    }
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn read_bad_url(&mut self, mut value: String, line: usize, start: usize) -> TokenType {
        loop {
            match self.peek() {
                None => break,
                Some(')') => {
                    self.advance();
                    break;
                }
                Some('\\') if self.is_valid_escape(0) => {
                    self.advance();
                    value.push(self.read_escape());
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        self.errors.push(StyleError::lex(
            SourcePosition::new(line, start, self.position),
            "Malformed url",
        ));
        TokenType::BadUrl(value)
    }

    fn read_numeric(&mut self) -> TokenType {
        let mut repr = String::new();

        if matches!(self.peek(), Some('+') | Some('-')) {
            repr.push(self.advance());
        }
        self.read_digits(&mut repr);

        if self.peek() == Some('.') && self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) {
            repr.push(self.advance());
            self.read_digits(&mut repr);
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let exponent_digit_at = match self.peek_at(1) {
                Some('+') | Some('-') => 2,
                _ => 1,
            };
            if self
                .peek_at(exponent_digit_at)
                .map_or(false, |c| c.is_ascii_digit())
            {
                for _ in 0..exponent_digit_at {
                    repr.push(self.advance());
                }
                self.read_digits(&mut repr);
            }
        }

        let value = repr.parse::<f64>().unwrap_or(0.0);

        if self.peek() == Some('%') {
            self.advance();
            TokenType::Percentage(value)
        } else if self.starts_ident(0) {
            TokenType::Dimension(value, self.read_name())
        } else {
            TokenType::Number(value)
        }
    }

    fn read_digits(&mut self, repr: &mut String) {
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            repr.push(self.advance());
        }
    }

    fn starts_number(&self, offset: usize) -> bool {
        let digit_at = |o: usize| self.peek_at(o).map_or(false, |c| c.is_ascii_digit());
        match self.peek_at(offset) {
            Some('+') | Some('-') => {
                digit_at(offset + 1)
                    || (self.peek_at(offset + 1) == Some('.') && digit_at(offset + 2))
            }
            Some('.') => digit_at(offset + 1),
            Some(ch) => ch.is_ascii_digit(),
            None => false,
        }
    }

    fn starts_ident(&self, offset: usize) -> bool {
        match self.peek_at(offset) {
            Some('-') => match self.peek_at(offset + 1) {
                Some('-') => true,
                Some(ch) if is_name_start(ch) => true,
                _ => self.is_valid_escape(offset + 1),
            },
            Some('\\') => self.is_valid_escape(offset),
            Some(ch) => is_name_start(ch),
            None => false,
        }
    }

    fn is_valid_escape(&self, offset: usize) -> bool {
        self.peek_at(offset) == Some('\\')
            && !matches!(self.peek_at(offset + 1), None | Some('\n'))
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn error_here(&mut self, message: &str) {
        let position = SourcePosition::new(self.line, self.position, self.position + 1);
        self.errors.push(StyleError::lex(position, message));
    }

    fn advance(&mut self) -> char {
        if let Some(&ch) = self.input.get(self.position) {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
            }
            ch
        } else {
            '\0'
        }
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }
}
