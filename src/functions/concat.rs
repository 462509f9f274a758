use super::{evaluate_argument, CssFunction, FunctionCall, FunctionProcessor, ProcessContext};
use crate::error::Result;
use crate::lexer::{format_number, Token, TokenType};
use crate::selector::SelectorModel;

/// `concat(value, ...)`: joins strings, urls and numbers into one string.
pub struct ConcatFunction;

impl<M: SelectorModel> CssFunction<M> for ConcatFunction {
    fn name(&self) -> &str {
        "concat"
    }

    fn evaluate(
        &self,
        call: &FunctionCall,
        element: &M::Element,
        processor: &FunctionProcessor<M>,
        context: &mut ProcessContext<'_, M>,
    ) -> Result<Vec<Token>> {
        let mut result = String::new();
        let mut pieces = 0;

        for argument in &call.arguments {
            for token in evaluate_argument(argument, element, processor, context)? {
                match &token.token_type {
                    TokenType::String(s) | TokenType::Url(s) => result.push_str(s),
                    TokenType::Number(n) => result.push_str(&format_number(*n)),
                    TokenType::Percentage(_) | TokenType::Dimension(..) => {
                        result.push_str(&token.to_string())
                    }
                    _ => return Err(call.error(format!("cannot concatenate '{}'", token))),
                }
                pieces += 1;
            }
        }

        if pieces == 0 {
            return Err(call.error("at least one value expected"));
        }
        Ok(vec![call.token(TokenType::String(result))])
    }
}

#[cfg(test)]
mod tests {
    use crate::error::StyleError;
    use crate::functions::tests::eval;

    #[test]
    fn test_concat() {
        assert_eq!(eval("concat(\"a\", \"b\")").unwrap(), "\"ab\"");
        assert_eq!(
            eval("concat(\"w=\" 12px, \"; \", 50%, url(x.png))").unwrap(),
            "\"w=12px; 50%x.png\""
        );
    }

    #[test]
    fn test_concat_errors() {
        assert!(matches!(eval("concat()"), Err(StyleError::Function { .. })));
        assert!(matches!(eval("concat(\"a\", red)"), Err(StyleError::Function { .. })));
    }
}
