use super::{evaluate_string, CssFunction, FunctionCall, FunctionProcessor, ProcessContext};
use crate::error::{Result, StyleError};
use crate::lexer::{Token, TokenType};
use crate::selector::SelectorModel;
use regex::Regex;

/// `replace(string, pattern, replacement)`: global regex substitution.
pub struct ReplaceFunction;

impl<M: SelectorModel> CssFunction<M> for ReplaceFunction {
    fn name(&self) -> &str {
        "replace"
    }

    fn evaluate(
        &self,
        call: &FunctionCall,
        element: &M::Element,
        processor: &FunctionProcessor<M>,
        context: &mut ProcessContext<'_, M>,
    ) -> Result<Vec<Token>> {
        let [input, pattern, replacement] = call.arguments.as_slice() else {
            let message = format!("three arguments expected, found {}", call.arguments.len());
            return Err(call.error(message));
        };

        let input = evaluate_string(call, input, element, processor, context)?;
        let pattern = evaluate_string(call, pattern, element, processor, context)?;
        let replacement = evaluate_string(call, replacement, element, processor, context)?;

        let regex = Regex::new(&pattern).map_err(|source| StyleError::Regex {
            position: call.position,
            source,
        })?;
        let replaced = regex.replace_all(&input, replacement.as_str());
        Ok(vec![call.token(TokenType::String(replaced.into_owned()))])
    }
}
