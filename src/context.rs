use core::fmt;
use std::fmt::Formatter;

use itertools::Itertools;

use crate::{
    expr::{CaseOption, Expr},
    pattern::Pattern,
    span::Span,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternId(usize);

impl ExprId {
    pub fn display<'a>(&self, context: &'a Context) -> Display<'a> {
        Display::new(*self, context)
    }
}

impl PatternId {
    pub fn display<'a>(&self, context: &'a Context) -> PatternDisplay<'a> {
        PatternDisplay::new(*self, context)
    }
}

/// Prints an expression in a fully bracketed form that parses back to the
/// same tree.
pub struct Display<'a> {
    id: ExprId,
    context: &'a Context,
}

impl<'a> Display<'a> {
    pub fn new(id: ExprId, context: &'a Context) -> Self {
        Self { id, context }
    }
}

impl<'a> fmt::Display for Display<'a> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let ctx = self.context;
        match ctx.get_expr(self.id) {
            Expr::Boolean(val) => write!(f, "{val}"),
            Expr::Integer(val) => write!(f, "{val}"),
            Expr::Identifier(id) => write!(f, "{id}"),
            Expr::Condition { cond, then, alt } => write!(
                f,
                "(if {} then {} else {})",
                cond.display(ctx),
                then.display(ctx),
                alt.display(ctx)
            ),
            Expr::Infix { lhs, op, rhs } => {
                write!(f, "({} {} {})", lhs.display(ctx), op, rhs.display(ctx))
            }
            Expr::Lambda { param, body } => {
                write!(f, "(\\{} -> {})", param.display(ctx), body.display(ctx))
            }
            Expr::Application { func, arg } => {
                write!(f, "({} {})", func.display(ctx), arg.display(ctx))
            }
            Expr::Let {
                pattern,
                value,
                body,
            } => write!(
                f,
                "(let {} = {} in {})",
                pattern.display(ctx),
                value.display(ctx),
                body.display(ctx)
            ),
            Expr::Case { subject, options } => {
                write!(f, "(case {} of", subject.display(ctx))?;
                if !options.is_empty() {
                    let options = options.iter().map(|option| {
                        format!(
                            "{} -> {}",
                            option.pattern.display(ctx),
                            option.body.display(ctx)
                        )
                    });
                    write!(f, " {}", options.format(" | "))?;
                }
                write!(f, ")")
            }
            Expr::Tuple(elems) => write!(
                f,
                "({})",
                elems.iter().map(|elem| elem.display(ctx)).format(", ")
            ),
            Expr::Cons { head, tail } => {
                write!(f, "({} : {})", head.display(ctx), tail.display(ctx))
            }
            Expr::Nil => write!(f, "[]"),
        }
    }
}

pub struct PatternDisplay<'a> {
    id: PatternId,
    context: &'a Context,
}

impl<'a> PatternDisplay<'a> {
    pub fn new(id: PatternId, context: &'a Context) -> Self {
        Self { id, context }
    }
}

impl<'a> fmt::Display for PatternDisplay<'a> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let ctx = self.context;
        match ctx.get_pattern(self.id) {
            Pattern::Bind(name) => write!(f, "{name}"),
            Pattern::Wildcard => write!(f, "_"),
            Pattern::Integer(val) => write!(f, "{val}"),
            Pattern::Boolean(val) => write!(f, "{val}"),
            Pattern::Tuple(elems) => write!(
                f,
                "({})",
                elems.iter().map(|elem| elem.display(ctx)).format(", ")
            ),
            Pattern::Cons { head, tail } => {
                write!(f, "({} : {})", head.display(ctx), tail.display(ctx))
            }
            Pattern::Nil => write!(f, "[]"),
        }
    }
}

/// Owns every node produced by the parser. Nodes refer to each other by id
/// and are never mutated once added.
#[derive(Debug, Default)]
pub struct Context {
    exprs: Vec<Expr>,
    expr_spans: Vec<Span>,
    patterns: Vec<Pattern>,
    pattern_spans: Vec<Span>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.exprs.len());
        self.exprs.push(expr);
        self.expr_spans.push(Span::default());
        id
    }

    pub fn add_pattern(&mut self, pattern: Pattern) -> PatternId {
        let id = PatternId(self.patterns.len());
        self.patterns.push(pattern);
        self.pattern_spans.push(Span::default());
        id
    }

    pub fn set_span(&mut self, id: ExprId, span: Span) {
        self.expr_spans[id.0] = span;
    }

    pub fn set_pattern_span(&mut self, id: PatternId, span: Span) {
        self.pattern_spans[id.0] = span;
    }

    pub fn get_expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0]
    }

    pub fn get_pattern(&self, id: PatternId) -> &Pattern {
        &self.patterns[id.0]
    }

    pub fn get_span(&self, id: ExprId) -> Span {
        self.expr_spans[id.0]
    }

    pub fn get_pattern_span(&self, id: PatternId) -> Span {
        self.pattern_spans[id.0]
    }

    /// Compares two trees by shape and contents, ignoring ids and spans.
    pub fn same_expr(&self, a: ExprId, other: &Context, b: ExprId) -> bool {
        match (self.get_expr(a), other.get_expr(b)) {
            (Expr::Boolean(x), Expr::Boolean(y)) => x == y,
            (Expr::Integer(x), Expr::Integer(y)) => x == y,
            (Expr::Identifier(x), Expr::Identifier(y)) => x == y,
            (
                Expr::Condition { cond, then, alt },
                Expr::Condition {
                    cond: cond2,
                    then: then2,
                    alt: alt2,
                },
            ) => {
                self.same_expr(*cond, other, *cond2)
                    && self.same_expr(*then, other, *then2)
                    && self.same_expr(*alt, other, *alt2)
            }
            (
                Expr::Infix { lhs, op, rhs },
                Expr::Infix {
                    lhs: lhs2,
                    op: op2,
                    rhs: rhs2,
                },
            ) => {
                op == op2
                    && self.same_expr(*lhs, other, *lhs2)
                    && self.same_expr(*rhs, other, *rhs2)
            }
            (
                Expr::Lambda { param, body },
                Expr::Lambda {
                    param: param2,
                    body: body2,
                },
            ) => self.same_pattern(*param, other, *param2) && self.same_expr(*body, other, *body2),
            (
                Expr::Application { func, arg },
                Expr::Application {
                    func: func2,
                    arg: arg2,
                },
            ) => self.same_expr(*func, other, *func2) && self.same_expr(*arg, other, *arg2),
            (
                Expr::Let {
                    pattern,
                    value,
                    body,
                },
                Expr::Let {
                    pattern: pattern2,
                    value: value2,
                    body: body2,
                },
            ) => {
                self.same_pattern(*pattern, other, *pattern2)
                    && self.same_expr(*value, other, *value2)
                    && self.same_expr(*body, other, *body2)
            }
            (
                Expr::Case { subject, options },
                Expr::Case {
                    subject: subject2,
                    options: options2,
                },
            ) => {
                self.same_expr(*subject, other, *subject2)
                    && options.len() == options2.len()
                    && options.iter().zip(options2).all(
                        |(CaseOption { pattern, body }, option2)| {
                            self.same_pattern(*pattern, other, option2.pattern)
                                && self.same_expr(*body, other, option2.body)
                        },
                    )
            }
            (Expr::Tuple(elems), Expr::Tuple(elems2)) => {
                elems.len() == elems2.len()
                    && elems
                        .iter()
                        .zip(elems2)
                        .all(|(x, y)| self.same_expr(*x, other, *y))
            }
            (
                Expr::Cons { head, tail },
                Expr::Cons {
                    head: head2,
                    tail: tail2,
                },
            ) => self.same_expr(*head, other, *head2) && self.same_expr(*tail, other, *tail2),
            (Expr::Nil, Expr::Nil) => true,
            _ => false,
        }
    }

    pub fn same_pattern(&self, a: PatternId, other: &Context, b: PatternId) -> bool {
        match (self.get_pattern(a), other.get_pattern(b)) {
            (Pattern::Bind(x), Pattern::Bind(y)) => x == y,
            (Pattern::Wildcard, Pattern::Wildcard) | (Pattern::Nil, Pattern::Nil) => true,
            (Pattern::Integer(x), Pattern::Integer(y)) => x == y,
            (Pattern::Boolean(x), Pattern::Boolean(y)) => x == y,
            (Pattern::Tuple(elems), Pattern::Tuple(elems2)) => {
                elems.len() == elems2.len()
                    && elems
                        .iter()
                        .zip(elems2)
                        .all(|(x, y)| self.same_pattern(*x, other, *y))
            }
            (
                Pattern::Cons { head, tail },
                Pattern::Cons {
                    head: head2,
                    tail: tail2,
                },
            ) => {
                self.same_pattern(*head, other, *head2) && self.same_pattern(*tail, other, *tail2)
            }
            _ => false,
        }
    }
}
