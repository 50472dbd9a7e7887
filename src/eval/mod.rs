//! Call-by-need evaluation.
//!
//! Every argument, `let` value, `case` subject and data constructor field is
//! wrapped in a [`Thunk`] and only evaluated when a primitive operation or a
//! pattern demands it. A thunk is evaluated at most once.

mod env;
mod matcher;
mod value;

use std::result;

use log::{debug, trace};

pub use env::{Bindings, EnvId, Environments};
pub use matcher::MatchOutcome;
pub use value::{Thunk, ThunkState, Value};

use crate::{
    config::Config,
    context::{Context, ExprId},
    expr::{Expr, InfixOp},
    span::Span,
};
use value::Claim;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("unbound variable '{0}'")]
    UnboundVariable(String, Span),

    #[error("cannot apply a value of type {0}")]
    NotAFunction(&'static str, Span),

    #[error("expected {expected} but found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
        span: Span,
    },

    #[error("non-exhaustive patterns in case")]
    NonExhaustive(Span),

    #[error("pattern match failed in {0}")]
    PatternMismatch(&'static str, Span),

    #[error("name '{0}' is bound more than once in a pattern")]
    DuplicateBinding(String, Span),

    #[error("integer overflow")]
    Overflow(Span),

    #[error("negative exponent")]
    NegativeExponent(Span),

    #[error("infinite loop")]
    InfiniteLoop(Span),

    #[error("recursion limit of {0} exceeded")]
    RecursionLimit(usize, Span),

    #[error("cannot reserve {0} bytes of stack for evaluation")]
    StackUnavailable(usize),
}

impl Error {
    pub fn span(&self) -> Span {
        match self {
            Error::UnboundVariable(_, span)
            | Error::NotAFunction(_, span)
            | Error::NonExhaustive(span)
            | Error::PatternMismatch(_, span)
            | Error::DuplicateBinding(_, span)
            | Error::Overflow(span)
            | Error::NegativeExponent(span)
            | Error::InfiniteLoop(span)
            | Error::RecursionLimit(_, span)
            | Error::TypeMismatch { span, .. } => *span,
            Error::StackUnavailable(_) => Span::default(),
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Counters describing the work done by an [`Interpreter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub thunks_created: usize,
    /// Thunks whose expression was evaluated to completion.
    pub thunks_evaluated: usize,
    /// Demands answered from a thunk's memo.
    pub memo_hits: usize,
    pub environments: usize,
}

pub struct Interpreter<'a> {
    context: &'a Context,
    config: Config,
    envs: Environments,
    depth: usize,
    stats: Stats,
}

impl<'a> Interpreter<'a> {
    pub fn new(context: &'a Context, config: Config) -> Self {
        Self {
            context,
            config,
            envs: Environments::new(),
            depth: 0,
            stats: Stats::default(),
        }
    }

    /// The initial environment, empty unless filled through [`Self::define`].
    pub fn root(&self) -> EnvId {
        self.envs.root()
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.envs.define(name, Thunk::evaluated(value));
    }

    pub fn stats(&self) -> Stats {
        Stats {
            environments: self.envs.len(),
            ..self.stats
        }
    }

    /// Evaluates `expr` in the root environment to weak head normal form.
    pub fn evaluate(&mut self, expr: ExprId) -> Result<Value> {
        let value = self.eval(expr, self.root())?;
        debug!("evaluated {} to a {}", expr.display(self.context), value.type_name());
        Ok(value)
    }

    pub fn eval(&mut self, expr: ExprId, env: EnvId) -> Result<Value> {
        let span = self.context.get_span(expr);
        self.nested(span, |this| this.eval_expr(expr, env))
    }

    /// Demands the value of `thunk`, evaluating it on first use.
    pub fn force(&mut self, thunk: &Thunk) -> Result<Value> {
        match thunk.claim() {
            Claim::Ready(value) => {
                self.stats.memo_hits += 1;
                Ok(value)
            }
            Claim::Busy(expr) => Err(Error::InfiniteLoop(self.context.get_span(expr))),
            Claim::Run(expr, env) => {
                trace!("forcing {}", expr.display(self.context));
                match self.eval(expr, env) {
                    Ok(value) => {
                        self.stats.thunks_evaluated += 1;
                        thunk.fill(value.clone());
                        Ok(value)
                    }
                    Err(err) => {
                        thunk.release();
                        Err(err)
                    }
                }
            }
        }
    }

    /// Forces `value` completely and prints it. Lists and tuples longer than
    /// the configured limit are cut short with `...`.
    pub fn render(&mut self, value: &Value) -> Result<String> {
        let mut out = String::new();
        self.render_into(value, &mut out)?;
        Ok(out)
    }

    fn thunk(&mut self, expr: ExprId, env: EnvId) -> Thunk {
        self.stats.thunks_created += 1;
        Thunk::new(expr, env)
    }

    /// Runs `f` one level deeper, failing once the configured depth is used up.
    fn nested<T, F>(&mut self, span: Span, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        if self.depth >= self.config.max_depth {
            return Err(Error::RecursionLimit(self.config.max_depth, span));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn eval_expr(&mut self, expr: ExprId, env: EnvId) -> Result<Value> {
        let context = self.context;
        match context.get_expr(expr) {
            Expr::Integer(n) => Ok(Value::Integer(*n)),

            Expr::Boolean(b) => Ok(Value::Boolean(*b)),

            Expr::Identifier(name) => {
                let thunk = self
                    .envs
                    .lookup(env, name)
                    .cloned()
                    .ok_or_else(|| Error::UnboundVariable(name.clone(), context.get_span(expr)))?;
                self.force(&thunk)
            }

            Expr::Condition { cond, then, alt } => match self.eval(*cond, env)? {
                Value::Boolean(true) => self.eval(*then, env),
                Value::Boolean(false) => self.eval(*alt, env),
                other => Err(Error::TypeMismatch {
                    expected: "boolean",
                    found: other.type_name(),
                    span: context.get_span(*cond),
                }),
            },

            Expr::Infix { lhs, op, rhs } => self.eval_infix(expr, *lhs, *op, *rhs, env),

            Expr::Lambda { param, body } => Ok(Value::Closure {
                param: *param,
                body: *body,
                env,
            }),

            Expr::Application { func, arg } => {
                let (param, body, closure_env) = match self.eval(*func, env)? {
                    Value::Closure { param, body, env } => (param, body, env),
                    other => {
                        return Err(Error::NotAFunction(
                            other.type_name(),
                            context.get_span(*func),
                        ));
                    }
                };
                let arg = self.thunk(*arg, env);
                let mut bindings = Bindings::default();
                if self.bind_match(param, arg, &mut bindings)? == MatchOutcome::Failed {
                    return Err(Error::PatternMismatch(
                        "function argument",
                        context.get_span(expr),
                    ));
                }
                let inner = self.envs.push(closure_env, bindings);
                self.eval(body, inner)
            }

            Expr::Let {
                pattern,
                value,
                body,
            } => {
                let inner = match context.get_pattern(*pattern).as_bind() {
                    // a plain name may refer to itself
                    Some(name) => {
                        self.stats.thunks_created += 1;
                        self.envs.push_with(env, |id| {
                            let mut bindings = Bindings::default();
                            bindings.insert(name.to_string(), Thunk::new(*value, id));
                            bindings
                        })
                    }
                    None => {
                        let subject = self.thunk(*value, env);
                        let mut bindings = Bindings::default();
                        if self.bind_match(*pattern, subject, &mut bindings)?
                            == MatchOutcome::Failed
                        {
                            return Err(Error::PatternMismatch("let", context.get_span(expr)));
                        }
                        self.envs.push(env, bindings)
                    }
                };
                self.eval(*body, inner)
            }

            Expr::Case { subject, options } => {
                let subject = self.thunk(*subject, env);
                for (index, option) in options.iter().enumerate() {
                    let mut bindings = Bindings::default();
                    if self.bind_match(option.pattern, subject.clone(), &mut bindings)?
                        == MatchOutcome::Matched
                    {
                        trace!("case option {index} matched");
                        let inner = self.envs.push(env, bindings);
                        return self.eval(option.body, inner);
                    }
                }
                Err(Error::NonExhaustive(context.get_span(expr)))
            }

            Expr::Tuple(elems) => Ok(Value::Tuple(
                elems.iter().map(|elem| self.thunk(*elem, env)).collect(),
            )),

            Expr::Cons { head, tail } => Ok(Value::Cons(
                self.thunk(*head, env),
                self.thunk(*tail, env),
            )),

            Expr::Nil => Ok(Value::Nil),
        }
    }

    fn eval_infix(
        &mut self,
        expr: ExprId,
        lhs: ExprId,
        op: InfixOp,
        rhs: ExprId,
        env: EnvId,
    ) -> Result<Value> {
        let span = self.context.get_span(expr);

        if op == InfixOp::Eq {
            let lhs = self.eval(lhs, env)?;
            let rhs = self.eval(rhs, env)?;
            return self.values_equal(lhs, rhs, span).map(Value::Boolean);
        }

        let a = self.eval_integer(lhs, env)?;
        let b = self.eval_integer(rhs, env)?;
        match op {
            InfixOp::Add => a.checked_add(b).map(Value::Integer).ok_or(Error::Overflow(span)),
            InfixOp::Sub => a.checked_sub(b).map(Value::Integer).ok_or(Error::Overflow(span)),
            InfixOp::Mul => a.checked_mul(b).map(Value::Integer).ok_or(Error::Overflow(span)),
            InfixOp::Pow => power(a, b, span).map(Value::Integer),
            InfixOp::Lt => Ok(Value::Boolean(a < b)),
            InfixOp::Eq => unreachable!(),
        }
    }

    fn eval_integer(&mut self, expr: ExprId, env: EnvId) -> Result<i64> {
        match self.eval(expr, env)? {
            Value::Integer(n) => Ok(n),
            other => Err(Error::TypeMismatch {
                expected: "integer",
                found: other.type_name(),
                span: self.context.get_span(expr),
            }),
        }
    }

    /// Structural equality. Walks list spines iteratively and only recurses
    /// into elements.
    fn values_equal(&mut self, lhs: Value, rhs: Value, span: Span) -> Result<bool> {
        let (mut lhs, mut rhs) = (lhs, rhs);
        loop {
            match (lhs, rhs) {
                (Value::Closure { .. }, _) | (_, Value::Closure { .. }) => {
                    return Err(Error::TypeMismatch {
                        expected: "comparable value",
                        found: "function",
                        span,
                    });
                }
                (Value::Integer(a), Value::Integer(b)) => return Ok(a == b),
                (Value::Boolean(a), Value::Boolean(b)) => return Ok(a == b),
                (Value::Nil, Value::Nil) => return Ok(true),
                (Value::Nil, Value::Cons(..)) | (Value::Cons(..), Value::Nil) => return Ok(false),
                (Value::Tuple(xs), Value::Tuple(ys)) => {
                    if xs.len() != ys.len() {
                        return Ok(false);
                    }
                    for (x, y) in xs.iter().zip(ys.iter()) {
                        if !self.elements_equal(x, y, span)? {
                            return Ok(false);
                        }
                    }
                    return Ok(true);
                }
                (Value::Cons(h1, t1), Value::Cons(h2, t2)) => {
                    if !self.elements_equal(&h1, &h2, span)? {
                        return Ok(false);
                    }
                    lhs = self.force(&t1)?;
                    rhs = self.force(&t2)?;
                }
                (a, b) => {
                    return Err(Error::TypeMismatch {
                        expected: a.type_name(),
                        found: b.type_name(),
                        span,
                    });
                }
            }
        }
    }

    fn elements_equal(&mut self, x: &Thunk, y: &Thunk, span: Span) -> Result<bool> {
        let x = self.force(x)?;
        let y = self.force(y)?;
        self.nested(span, |this| this.values_equal(x, y, span))
    }

    fn render_into(&mut self, value: &Value, out: &mut String) -> Result<()> {
        match value {
            Value::Integer(n) => out.push_str(&n.to_string()),
            Value::Boolean(b) => out.push_str(&b.to_string()),
            Value::Closure { .. } => out.push_str("<function>"),
            Value::Nil => out.push_str("[]"),

            Value::Tuple(elems) => {
                out.push('(');
                for (index, elem) in elems.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    if index == self.config.render_limit {
                        out.push_str("...");
                        break;
                    }
                    self.render_thunk(elem, out)?;
                }
                out.push(')');
            }

            Value::Cons(head, tail) => {
                let mut items = vec![head.clone()];
                let mut rest = self.force(tail)?;
                let mut truncated = false;
                while let Value::Cons(head, tail) = &rest {
                    if items.len() == self.config.render_limit {
                        truncated = true;
                        break;
                    }
                    items.push(head.clone());
                    let tail = tail.clone();
                    rest = self.force(&tail)?;
                }

                match rest {
                    Value::Nil | Value::Cons(..) => {
                        out.push('[');
                        for (index, item) in items.iter().enumerate() {
                            if index > 0 {
                                out.push_str(", ");
                            }
                            self.render_thunk(item, out)?;
                        }
                        if truncated {
                            out.push_str(", ...");
                        }
                        out.push(']');
                    }
                    improper => {
                        for item in &items {
                            self.render_thunk(item, out)?;
                            out.push_str(" : ");
                        }
                        self.render_thunk(&Thunk::evaluated(improper), out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn render_thunk(&mut self, thunk: &Thunk, out: &mut String) -> Result<()> {
        let value = self.force(thunk)?;
        self.nested(Span::default(), |this| this.render_into(&value, out))
    }
}

/// `base ^ exp` for a non-negative exponent.
fn power(base: i64, exp: i64, span: Span) -> Result<i64> {
    if exp < 0 {
        return Err(Error::NegativeExponent(span));
    }
    match u32::try_from(exp) {
        Ok(exp) => base.checked_pow(exp).ok_or(Error::Overflow(span)),
        Err(_) => match base {
            0 | 1 => Ok(base),
            -1 => Ok(if exp % 2 == 0 { 1 } else { -1 }),
            _ => Err(Error::Overflow(span)),
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::parse_whole_expr;

    fn run_with(input: &str, config: Config) -> Result<String> {
        let mut ctx = Context::new();
        let expr = parse_whole_expr(&mut ctx, input).unwrap();
        let mut interpreter = Interpreter::new(&ctx, config);
        let value = interpreter.evaluate(expr)?;
        interpreter.render(&value)
    }

    fn run(input: &str) -> Result<String> {
        run_with(input, Config::default())
    }

    fn eval_ok(input: &str) -> String {
        run(input).unwrap()
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval_ok("1 + 2 * 3"), "7");
        assert_eq!(eval_ok("2 ^ 3 ^ 2"), "512");
        assert_eq!(eval_ok("10 - 4 - 3"), "3");
        assert_eq!(eval_ok("2 ^ 0"), "1");
    }

    #[test]
    fn arithmetic_errors() {
        assert!(matches!(run("9223372036854775807 + 1"), Err(Error::Overflow(_))));
        assert!(matches!(run("2 ^ 64"), Err(Error::Overflow(_))));
        assert!(matches!(run("2 ^ (0 - 1)"), Err(Error::NegativeExponent(_))));
        assert_eq!(
            run("1 + true").unwrap_err().to_string(),
            "expected integer but found boolean"
        );
    }

    #[test]
    fn comparisons() {
        assert_eq!(eval_ok("1 < 2"), "true");
        assert_eq!(eval_ok("2 < 1"), "false");
        assert_eq!(eval_ok("(1, [2, 3]) == (1, 2 : 3 : [])"), "true");
        assert_eq!(eval_ok("[1, 2] == [1]"), "false");
        assert_eq!(eval_ok("true == false"), "false");
        assert!(matches!(
            run("(\\x -> x) == (\\x -> x)"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(run("1 == true"), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn functions_and_application() {
        assert_eq!(eval_ok("(\\x -> x + 1) 41"), "42");
        assert_eq!(eval_ok("(\\(a, b) -> a * b) (6, 7)"), "42");
        assert_eq!(eval_ok("let add = \\x -> \\y -> x + y in add 1 2"), "3");
        assert_eq!(eval_ok("\\x -> x"), "<function>");
        assert_eq!(
            run("1 2").unwrap_err().to_string(),
            "cannot apply a value of type integer"
        );
        assert!(matches!(
            run("(\\[] -> 0) [1]"),
            Err(Error::PatternMismatch("function argument", _))
        ));
    }

    #[test]
    fn closures_capture_their_environment() {
        assert_eq!(
            eval_ok("let x = 1 in let f = \\y -> x + y in let x = 100 in f 1"),
            "2"
        );
    }

    #[test]
    fn let_bindings() {
        assert_eq!(eval_ok("let (a, b) = (1, 2) in a + b"), "3");
        assert_eq!(eval_ok("let [a, b] = [3, 4] in b"), "4");
        assert!(matches!(
            run("let (a, b) = (1, 2, 3) in a"),
            Err(Error::PatternMismatch("let", _))
        ));
        assert!(matches!(
            run("let (x, x) = (1, 2) in x"),
            Err(Error::DuplicateBinding(..))
        ));
    }

    #[test]
    fn recursive_let() {
        let input = "let fact = \\n -> if n < 1 then 1 else n * fact (n - 1) in fact 10";
        assert_eq!(eval_ok(input), "3628800");

        let input = "let ones = 1 : ones in case ones of a : b : _ -> a + b";
        assert_eq!(eval_ok(input), "2");
    }

    #[test]
    fn conditionals() {
        assert_eq!(eval_ok("if 1 < 2 then 10 else undefined"), "10");
        assert_eq!(
            run("if 1 then 2 else 3").unwrap_err().to_string(),
            "expected boolean but found integer"
        );
    }

    #[test]
    fn case_expressions() {
        assert_eq!(eval_ok("case 1 of 1 -> 10 | 1 -> 20"), "10");
        assert_eq!(eval_ok("case [1, 2] of [] -> 0 | h : t -> h"), "1");
        assert_eq!(eval_ok("case (1, true) of (_, false) -> 0 | (n, _) -> n"), "1");
        assert!(matches!(run("case 3 of 1 -> 10"), Err(Error::NonExhaustive(_))));
    }

    #[test]
    fn unbound_variables() {
        let err = run("x + 1").unwrap_err();
        assert_eq!(err.to_string(), "unbound variable 'x'");
        assert_eq!(err.span().start.column, 1);
    }

    #[test]
    fn unreferenced_bindings_are_never_forced() {
        assert_eq!(eval_ok("let boom = undefined in 1"), "1");
        assert_eq!(eval_ok("let boom = 1 < true in 2"), "2");
        assert_eq!(eval_ok("(\\x -> 3) (1 + false)"), "3");
        assert_eq!(eval_ok("case (undefined, 4) of (_, n) -> n"), "4");
    }

    #[test]
    fn shared_thunks_evaluate_once() {
        let mut ctx = Context::new();
        let expr = parse_whole_expr(&mut ctx, "let x = 2 * 3 in x + x").unwrap();
        let mut interpreter = Interpreter::new(&ctx, Config::default());
        let value = interpreter.evaluate(expr).unwrap();
        assert!(matches!(value, Value::Integer(12)));

        let stats = interpreter.stats();
        assert_eq!(stats.thunks_created, 1);
        assert_eq!(stats.thunks_evaluated, 1);
        assert_eq!(stats.memo_hits, 1);
    }

    #[test]
    fn case_subject_is_evaluated_once_across_options() {
        let mut ctx = Context::new();
        let expr = parse_whole_expr(&mut ctx, "case 2 * 3 of 1 -> 0 | 2 -> 0 | 6 -> 1").unwrap();
        let mut interpreter = Interpreter::new(&ctx, Config::default());
        let value = interpreter.evaluate(expr).unwrap();
        assert!(matches!(value, Value::Integer(1)));

        let stats = interpreter.stats();
        assert_eq!(stats.thunks_created, 1);
        assert_eq!(stats.thunks_evaluated, 1);
        assert_eq!(stats.memo_hits, 2);
    }

    #[test]
    fn failed_options_bind_nothing() {
        let err = run("case (1, 2) of (x, 3) -> 0 | (_, y) -> x").unwrap_err();
        assert!(matches!(err, Error::UnboundVariable(ref name, _) if name == "x"));
    }

    #[test]
    fn self_dependent_bindings_are_infinite_loops() {
        assert!(matches!(run("let x = x in x"), Err(Error::InfiniteLoop(_))));
        assert!(matches!(run("let x = x + 1 in x"), Err(Error::InfiniteLoop(_))));
    }

    #[test]
    fn deep_recursion_is_limited() {
        let input = "let loop = \\n -> loop (n + 1) in loop 0";
        let err = run_with(input, Config::default().with_max_depth(64)).unwrap_err();
        assert!(matches!(err, Error::RecursionLimit(64, _)));
    }

    #[test]
    fn defined_names_are_visible() {
        let mut ctx = Context::new();
        let expr = parse_whole_expr(&mut ctx, "answer + 1").unwrap();
        let mut interpreter = Interpreter::new(&ctx, Config::default());
        interpreter.define("answer", Value::Integer(41));
        assert!(matches!(interpreter.evaluate(expr), Ok(Value::Integer(42))));
    }

    #[test]
    fn rendering() {
        assert_eq!(eval_ok("(1, true, ())"), "(1, true, ())");
        assert_eq!(eval_ok("[[1], []]"), "[[1], []]");
        assert_eq!(eval_ok("1 : 2 : 3"), "1 : 2 : 3");
        assert_eq!(eval_ok("[]"), "[]");

        let config = Config::default().with_render_limit(3);
        let input = "let ones = 1 : ones in ones";
        assert_eq!(run_with(input, config).unwrap(), "[1, 1, 1, ...]");
    }

    #[test]
    fn long_lists_are_cut_at_the_render_limit() {
        let config = Config::default().with_render_limit(2);
        assert_eq!(run_with("[1, 2, 3, 4, 5]", config).unwrap(), "[1, 2, ...]");
        assert_eq!(run_with("[1, 2]", config).unwrap(), "[1, 2]");
        assert_eq!(run_with("1 : 2 : 3", config).unwrap(), "1 : 2 : 3");
    }
}
