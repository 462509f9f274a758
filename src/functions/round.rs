use super::{evaluate_argument, CssFunction, FunctionCall, FunctionProcessor, ProcessContext};
use crate::error::Result;
use crate::lexer::{Token, TokenType};
use crate::selector::SelectorModel;

/// `round(value)`: nearest integer, halves away from zero, unit kept.
pub struct RoundFunction;

impl<M: SelectorModel> CssFunction<M> for RoundFunction {
    fn name(&self) -> &str {
        "round"
    }

    fn evaluate(
        &self,
        call: &FunctionCall,
        element: &M::Element,
        processor: &FunctionProcessor<M>,
        context: &mut ProcessContext<'_, M>,
    ) -> Result<Vec<Token>> {
        if call.arguments.len() != 1 {
            let message = format!("one argument expected, found {}", call.arguments.len());
            return Err(call.error(message));
        }

        let tokens = evaluate_argument(&call.arguments[0], element, processor, context)?;
        let rounded = match tokens.as_slice() {
            [token] => match &token.token_type {
                TokenType::Number(n) => TokenType::Number(n.round()),
                TokenType::Percentage(n) => TokenType::Percentage(n.round()),
                TokenType::Dimension(n, unit) => TokenType::Dimension(n.round(), unit.clone()),
                _ => return Err(call.error(format!("number expected, found '{}'", token))),
            },
            _ => return Err(call.error("a single numeric value expected")),
        };
        Ok(vec![call.token(rounded)])
    }
}

#[cfg(test)]
mod tests {
    use crate::functions::tests::eval;

    #[test]
    fn test_round_keeps_kind_and_unit() {
        assert_eq!(eval("round(3.7px)").unwrap(), "4px");
        assert_eq!(eval("round(2.5)").unwrap(), "3");
        assert_eq!(eval("round(-2.5%)").unwrap(), "-3%");
        assert_eq!(eval("round(1.2em) solid").unwrap(), "1em solid");
    }

    #[test]
    fn test_round_rejects_non_numbers() {
        assert!(eval("round(red)").is_err());
        assert!(eval("round(1px, 2px)").is_err());
        assert!(eval("round()").is_err());
    }
}
