//! Recursive evaluation of value functions
//!
//! [`FunctionProcessor::process`] walks a token sequence and replaces every
//! call to a registered function with the tokens it evaluates to. Functions
//! receive the processor so they can evaluate their own arguments, which is
//! how nesting such as `var(--x, rgb(1, 2, 3))` works.

mod attr;
mod concat;
mod ladder;
mod replace;
mod round;
mod var;

pub use attr::AttrFunction;
pub use concat::ConcatFunction;
pub use ladder::LadderFunction;
pub use replace::ReplaceFunction;
pub use round::RoundFunction;
pub use var::VarFunction;

use crate::error::{Result, SourcePosition, StyleError};
use crate::lexer::{Token, TokenType, Tokenizer};
use crate::selector::SelectorModel;
use std::collections::HashMap;

/// Custom property values by name (`--name`), supplied per evaluation.
pub type CustomPropertyMap = HashMap<String, Vec<Token>>;

/// Default limit on how deeply function evaluation may nest.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default limit on the number of tokens one evaluation may produce.
pub const DEFAULT_MAX_EXPANSION: usize = 10_000;

/// Tokenizes a custom property value, dropping surrounding whitespace.
pub fn custom_property_tokens(value: &str) -> Vec<Token> {
    let (tokens, errors) = Tokenizer::tokenize(value);
    for error in errors {
        log::warn!("In custom property value '{}': {}", value, error);
    }
    trim_whitespace(
        tokens
            .into_iter()
            .filter(|t| t.token_type != TokenType::Eof)
            .collect(),
    )
}

/// Builds a [`CustomPropertyMap`] from `(name, css text)` pairs.
pub fn custom_properties<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> CustomPropertyMap {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), custom_property_tokens(value)))
        .collect()
}

pub(crate) fn trim_whitespace(mut tokens: Vec<Token>) -> Vec<Token> {
    while tokens.last().map_or(false, Token::is_whitespace) {
        tokens.pop();
    }
    let leading = tokens.iter().take_while(|t| t.is_whitespace()).count();
    tokens.drain(..leading);
    tokens
}

/// One call site: the function name, where it was written, and its
/// arguments split at top-level commas.
#[derive(Debug, Clone)]
pub struct FunctionCall {
    pub name: String,
    pub position: SourcePosition,
    pub arguments: Vec<Vec<Token>>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, position: SourcePosition, body: &[Token]) -> Self {
        Self {
            name: name.into(),
            position,
            arguments: split_arguments(body),
        }
    }

    pub fn argument(&self, index: usize) -> Option<&[Token]> {
        self.arguments.get(index).map(Vec::as_slice)
    }

    /// Arguments from `index` on, joined back together with commas.
    pub fn arguments_from(&self, index: usize) -> Option<Vec<Token>> {
        if index >= self.arguments.len() {
            return None;
        }
        let mut joined = Vec::new();
        for (i, argument) in self.arguments[index..].iter().enumerate() {
            if i > 0 {
                joined.push(Token::new(TokenType::Comma, self.position));
            }
            joined.extend(argument.iter().cloned());
        }
        Some(joined)
    }

    pub fn error(&self, message: impl Into<String>) -> StyleError {
        StyleError::function(self.position, format!("{}(): {}", self.name, message.into()))
    }

    /// Token carrying this call's position.
    pub fn token(&self, token_type: TokenType) -> Token {
        Token::new(token_type, self.position)
    }
}

fn split_arguments(body: &[Token]) -> Vec<Vec<Token>> {
    if body.iter().all(Token::is_whitespace) {
        return Vec::new();
    }

    let mut arguments = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0usize;

    for token in body {
        match token.token_type {
            TokenType::Comma if depth == 0 => {
                arguments.push(trim_whitespace(std::mem::take(&mut current)));
                continue;
            }
            TokenType::Function(_)
            | TokenType::LeftParen
            | TokenType::LeftBracket
            | TokenType::LeftBrace => {
                depth += 1;
            }
            TokenType::RightParen | TokenType::RightBracket | TokenType::RightBrace => {
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
        current.push(token.clone());
    }
    arguments.push(trim_whitespace(current));
    arguments
}

/// Index of the token closing the function whose body starts at `start`,
/// or `tokens.len()` when it is never closed.
fn find_closing_paren(tokens: &[Token], start: usize) -> usize {
    let mut depth = 0usize;
    for (offset, token) in tokens[start..].iter().enumerate() {
        match token.token_type {
            TokenType::Function(_) | TokenType::LeftParen => depth += 1,
            TokenType::RightParen if depth == 0 => return start + offset,
            TokenType::RightParen => depth -= 1,
            _ => {}
        }
    }
    tokens.len()
}

/// State for one `process` call tree. Never shared between evaluations.
pub struct ProcessContext<'a, M: SelectorModel> {
    pub model: &'a M,
    pub custom_properties: &'a CustomPropertyMap,
    recursion_stack: Vec<String>,
    depth: usize,
    max_depth: usize,
    max_expansion: usize,
}

impl<'a, M: SelectorModel> ProcessContext<'a, M> {
    pub fn new(model: &'a M, custom_properties: &'a CustomPropertyMap, max_depth: usize) -> Self {
        Self {
            model,
            custom_properties,
            recursion_stack: Vec::new(),
            depth: 0,
            max_depth,
            max_expansion: DEFAULT_MAX_EXPANSION,
        }
    }

    /// Caps the token count of every intermediate and final result.
    pub fn with_max_expansion(mut self, max_expansion: usize) -> Self {
        self.max_expansion = max_expansion;
        self
    }

    /// Marks `name` as being expanded. Fails if it already is.
    pub fn push_custom_property(&mut self, name: &str, position: SourcePosition) -> Result<()> {
        if self.recursion_stack.iter().any(|n| n == name) {
            let chain = self.recursion_stack.join(" -> ");
            return Err(StyleError::recursion(
                position,
                format!("Recursion not allowed: {} -> {}", chain, name),
            ));
        }
        self.recursion_stack.push(name.to_string());
        Ok(())
    }

    pub fn pop_custom_property(&mut self) {
        self.recursion_stack.pop();
    }

    pub fn recursion_stack(&self) -> &[String] {
        &self.recursion_stack
    }
}

pub trait CssFunction<M: SelectorModel> {
    fn name(&self) -> &str;

    fn evaluate(
        &self,
        call: &FunctionCall,
        element: &M::Element,
        processor: &FunctionProcessor<M>,
        context: &mut ProcessContext<'_, M>,
    ) -> Result<Vec<Token>>;
}

/// Registry of value functions plus the token walker that applies them.
pub struct FunctionProcessor<M: SelectorModel> {
    functions: Vec<Box<dyn CssFunction<M>>>,
    max_depth: usize,
    max_expansion: usize,
}

impl<M: SelectorModel> FunctionProcessor<M> {
    /// Processor with `var`, `attr`, `concat`, `replace`, `round` and `ladder`.
    pub fn new() -> Self {
        let mut processor = Self::empty();
        processor.register(Box::new(VarFunction));
        processor.register(Box::new(AttrFunction));
        processor.register(Box::new(ConcatFunction));
        processor.register(Box::new(ReplaceFunction));
        processor.register(Box::new(RoundFunction));
        processor.register(Box::new(LadderFunction));
        processor
    }

    pub fn empty() -> Self {
        Self {
            functions: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_expansion: DEFAULT_MAX_EXPANSION,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn with_max_expansion(mut self, max_expansion: usize) -> Self {
        self.max_expansion = max_expansion;
        self
    }

    pub fn max_expansion(&self) -> usize {
        self.max_expansion
    }

    /// Adds a function, replacing any registered under the same name.
    pub fn register(&mut self, function: Box<dyn CssFunction<M>>) {
        self.functions.retain(|f| !f.name().eq_ignore_ascii_case(function.name()));
        self.functions.push(function);
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn CssFunction<M>> {
        self.functions
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
            .map(|f| f.as_ref())
    }

    /// True when `tokens` call any registered function, at any depth.
    pub fn contains_function(&self, tokens: &[Token]) -> bool {
        tokens.iter().any(|t| match &t.token_type {
            TokenType::Function(name) => self.lookup(name).is_some(),
            _ => false,
        })
    }

    /// Evaluates `tokens` for `element` with a fresh recursion stack.
    pub fn evaluate(
        &self,
        model: &M,
        tokens: &[Token],
        element: &M::Element,
        custom_properties: &CustomPropertyMap,
    ) -> Result<Vec<Token>> {
        let mut context = ProcessContext::new(model, custom_properties, self.max_depth)
            .with_max_expansion(self.max_expansion);
        self.process(tokens, element, &mut context)
    }

    pub fn process(
        &self,
        tokens: &[Token],
        element: &M::Element,
        context: &mut ProcessContext<'_, M>,
    ) -> Result<Vec<Token>> {
        if context.depth >= context.max_depth {
            let position = tokens.first().map(Token::position).unwrap_or_default();
            return Err(StyleError::recursion(
                position,
                format!("Function nesting exceeds the limit of {}", context.max_depth),
            ));
        }

        context.depth += 1;
        let result = self.process_tokens(tokens, element, context);
        context.depth -= 1;
        result
    }

    fn process_tokens(
        &self,
        tokens: &[Token],
        element: &M::Element,
        context: &mut ProcessContext<'_, M>,
    ) -> Result<Vec<Token>> {
        let mut output = Vec::with_capacity(tokens.len());
        let mut index = 0;

        while index < tokens.len() {
            let token = &tokens[index];
            let TokenType::Function(name) = &token.token_type else {
                output.push(token.clone());
                index += 1;
                continue;
            };

            let end = find_closing_paren(tokens, index + 1);
            let body = &tokens[index + 1..end];

            match self.lookup(name) {
                Some(function) => {
                    let call = FunctionCall::new(name.clone(), token.position(), body);
                    output.extend(function.evaluate(&call, element, self, context)?);
                }
                None => {
                    log::trace!("Passing through unregistered function '{}'", name);
                    output.push(token.clone());
                    output.extend(self.process(body, element, context)?);
                    if let Some(close) = tokens.get(end) {
                        output.push(close.clone());
                    }
                }
            }
            if output.len() > context.max_expansion {
                return Err(StyleError::recursion(
                    token.position(),
                    format!("Expansion exceeds the limit of {} tokens", context.max_expansion),
                ));
            }
            index = end + 1;
        }

        Ok(output)
    }
}

impl<M: SelectorModel> Default for FunctionProcessor<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluates an argument and returns its non-whitespace tokens.
pub(crate) fn evaluate_argument<M: SelectorModel>(
    argument: &[Token],
    element: &M::Element,
    processor: &FunctionProcessor<M>,
    context: &mut ProcessContext<'_, M>,
) -> Result<Vec<Token>> {
    let tokens = processor.process(argument, element, context)?;
    Ok(tokens.into_iter().filter(|t| !t.is_whitespace()).collect())
}

/// Evaluates an argument that must produce exactly one string.
pub(crate) fn evaluate_string<M: SelectorModel>(
    call: &FunctionCall,
    argument: &[Token],
    element: &M::Element,
    processor: &FunctionProcessor<M>,
    context: &mut ProcessContext<'_, M>,
) -> Result<String> {
    let tokens = evaluate_argument(argument, element, processor, context)?;
    match tokens.as_slice() {
        [Token {
            token_type: TokenType::String(value),
            ..
        }] => Ok(value.clone()),
        _ => Err(call.error(format!(
            "string expected, found '{}'",
            crate::lexer::tokens_to_css(&tokens)
        ))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::lexer::tokens_to_css;
    use crate::selector::tests::TestTree;

    pub(crate) fn eval_with(
        tree: &TestTree,
        element: usize,
        text: &str,
        custom: &CustomPropertyMap,
    ) -> Result<String> {
        let processor = FunctionProcessor::new();
        let tokens = custom_property_tokens(text);
        processor
            .evaluate(tree, &tokens, &element, custom)
            .map(|t| tokens_to_css(&t))
    }

    pub(crate) fn eval(text: &str) -> Result<String> {
        let mut tree = TestTree::default();
        tree.add(None, "rect");
        eval_with(&tree, 0, text, &CustomPropertyMap::new())
    }

    #[test]
    fn test_argument_splitting() {
        let tokens = custom_property_tokens("a , rgb(1, 2) b,, c");
        let call = FunctionCall::new("f", SourcePosition::default(), &tokens);
        let texts: Vec<_> = call.arguments.iter().map(|a| tokens_to_css(a)).collect();
        assert_eq!(texts, vec!["a", "rgb(1, 2) b", "", "c"]);
        assert_eq!(tokens_to_css(&call.arguments_from(1).unwrap()), "rgb(1, 2) b,,c");
        assert!(FunctionCall::new("f", SourcePosition::default(), &[]).arguments.is_empty());
    }

    #[test]
    fn test_unregistered_functions_pass_through() {
        assert_eq!(eval("rgb(round(1.6), 2, 3) solid").unwrap(), "rgb(2, 2, 3) solid");
    }

    #[test]
    fn test_nested_evaluation() {
        let custom = custom_properties([("--n", "2.5px"), ("--greeting", "\"hi\"")]);
        let mut tree = TestTree::default();
        tree.add(None, "rect");
        let text = "concat(var(--greeting), \" \", round(var(--n)))";
        assert_eq!(eval_with(&tree, 0, text, &custom).unwrap(), "\"hi 3px\"");
    }

    #[test]
    fn test_depth_limit() {
        let processor: FunctionProcessor<TestTree> = FunctionProcessor::new().with_max_depth(3);
        assert_eq!(processor.max_depth(), 3);
        let mut tree = TestTree::default();
        tree.add(None, "rect");
        let tokens = custom_property_tokens("round(round(round(round(1.2))))");
        let result = processor.evaluate(&tree, &tokens, &0, &CustomPropertyMap::new());
        assert!(matches!(result, Err(StyleError::Recursion { .. })));
    }

    #[test]
    fn test_custom_function_registration() {
        struct Upper;
        impl<M: SelectorModel> CssFunction<M> for Upper {
            fn name(&self) -> &str {
                "upper"
            }

            fn evaluate(
                &self,
                call: &FunctionCall,
                element: &M::Element,
                processor: &FunctionProcessor<M>,
                context: &mut ProcessContext<'_, M>,
            ) -> Result<Vec<Token>> {
                let argument = call.argument(0).unwrap_or_default();
                let value = evaluate_string(call, argument, element, processor, context)?;
                Ok(vec![call.token(TokenType::String(value.to_uppercase()))])
            }
        }

        let mut processor: FunctionProcessor<TestTree> = FunctionProcessor::new();
        processor.register(Box::new(Upper));
        let mut tree = TestTree::default();
        tree.add(None, "rect");
        let tokens = custom_property_tokens("UPPER(\"abc\")");
        let result = processor.evaluate(&tree, &tokens, &0, &CustomPropertyMap::new()).unwrap();
        assert_eq!(tokens_to_css(&result), "\"ABC\"");
        assert!(processor.contains_function(&tokens));
    }
}
