pub mod config;
pub mod context;
pub mod error;
pub mod eval;
pub mod expr;
pub mod layout;
pub mod lexer;
pub mod operator;
pub mod parser;
pub mod pattern;
pub mod span;

use std::{panic, thread};

use log::debug;

pub use config::Config;
pub use parser::parse_whole_expr;

use crate::{
    context::{Context, ExprId},
    eval::Interpreter,
};

/// Evaluates a parsed expression in an empty environment and renders the
/// result.
///
/// Evaluation recurses on the host stack, so it runs on a thread sized by
/// [`Config::eval_stack_size`].
pub fn evaluate(ctx: &Context, expr: ExprId, config: &Config) -> eval::Result<String> {
    let config = *config;
    let stack_size = config.eval_stack_size();
    thread::scope(|scope| {
        let worker = thread::Builder::new()
            .name("eval".into())
            .stack_size(stack_size)
            .spawn_scoped(scope, move || evaluate_here(ctx, expr, config))
            .map_err(|_| eval::Error::StackUnavailable(stack_size))?;
        worker
            .join()
            .unwrap_or_else(|payload| panic::resume_unwind(payload))
    })
}

fn evaluate_here(ctx: &Context, expr: ExprId, config: Config) -> eval::Result<String> {
    let mut interpreter = Interpreter::new(ctx, config);
    let value = interpreter.evaluate(expr)?;
    let rendered = interpreter.render(&value)?;
    debug!("{:?}", interpreter.stats());
    Ok(rendered)
}

/// Parses and evaluates a whole program.
pub fn run(input: &str, config: &Config) -> error::Result<String> {
    let mut ctx = Context::new();
    let expr = parse_whole_expr(&mut ctx, input)?;
    Ok(evaluate(&ctx, expr, config)?)
}
