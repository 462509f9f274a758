use super::{CssFunction, FunctionCall, FunctionProcessor, ProcessContext};
use crate::error::Result;
use crate::lexer::{Token, TokenType};
use crate::selector::SelectorModel;

/// `var(--name, fallback?)`
pub struct VarFunction;

impl<M: SelectorModel> CssFunction<M> for VarFunction {
    fn name(&self) -> &str {
        "var"
    }

    fn evaluate(
        &self,
        call: &FunctionCall,
        element: &M::Element,
        processor: &FunctionProcessor<M>,
        context: &mut ProcessContext<'_, M>,
    ) -> Result<Vec<Token>> {
        let name = match call.argument(0) {
            Some(
                [Token {
                    token_type: TokenType::Ident(name),
                    ..
                }],
            ) if name.starts_with("--") => name.clone(),
            _ => return Err(call.error("custom property name starting with '--' expected")),
        };

        if let Some(value) = context.custom_properties.get(&name) {
            context.push_custom_property(&name, call.position)?;
            let result = processor.process(value, element, context);
            context.pop_custom_property();
            return result;
        }

        match call.arguments_from(1) {
            Some(fallback) => processor.process(&fallback, element, context),
            None => Err(call.error(format!("Custom property '{}' not found", name))),
        }
    }
}
