use super::{evaluate_argument, CssFunction, FunctionCall, FunctionProcessor, ProcessContext};
use crate::color::{parse_color, Color};
use crate::converter::TokenCursor;
use crate::error::Result;
use crate::lexer::{Token, TokenType};
use crate::selector::SelectorModel;

/// `ladder(primary, color stop, ...)`: picks a color by the brightness of
/// `primary`.
///
/// The result is the color of the greatest stop not above the brightness,
/// or of the lowest stop when the brightness is below all of them.
pub struct LadderFunction;

struct Step {
    stop: f64,
    color: Vec<Token>,
}

impl<M: SelectorModel> CssFunction<M> for LadderFunction {
    fn name(&self) -> &str {
        "ladder"
    }

    fn evaluate(
        &self,
        call: &FunctionCall,
        element: &M::Element,
        processor: &FunctionProcessor<M>,
        context: &mut ProcessContext<'_, M>,
    ) -> Result<Vec<Token>> {
        let Some((primary, steps)) = call.arguments.split_first() else {
            return Err(call.error("primary color expected"));
        };
        if steps.is_empty() {
            return Err(call.error("at least one color stop expected"));
        }

        let primary = evaluate_argument(primary, element, processor, context)?;
        let brightness = color_of(call, &primary)?.brightness();

        let mut ladder: Vec<Step> = Vec::with_capacity(steps.len());
        for argument in steps {
            let mut tokens = evaluate_argument(argument, element, processor, context)?;
            let stop = match tokens.pop().map(|t| t.token_type) {
                Some(TokenType::Percentage(p)) => p / 100.0,
                Some(TokenType::Number(n)) => n,
                _ => return Err(call.error("color stop must end with a percentage or number")),
            };
            color_of(call, &tokens)?;

            // A repeated stop keeps the last color given for it.
            ladder.retain(|step| step.stop != stop);
            ladder.push(Step { stop, color: tokens });
        }
        ladder.sort_by(|a, b| a.stop.total_cmp(&b.stop));

        let chosen = ladder
            .iter()
            .rev()
            .find(|step| step.stop <= brightness)
            .or_else(|| ladder.first());
        log::trace!("ladder(): brightness {:.3} selects {:?}", brightness, chosen.map(|s| s.stop));

        match chosen {
            Some(step) => Ok(step.color.clone()),
            None => Err(call.error("at least one color stop expected")),
        }
    }
}

fn color_of(call: &FunctionCall, tokens: &[Token]) -> Result<Color> {
    let mut cursor = TokenCursor::new(tokens);
    let color = parse_color(&mut cursor).map_err(|e| call.error(e.to_string()))?;
    cursor.skip_whitespace();
    if !cursor.is_at_end() {
        return Err(call.error(format!(
            "unexpected '{}' after color",
            crate::lexer::tokens_to_css(cursor.remaining())
        )));
    }
    Ok(color)
}
