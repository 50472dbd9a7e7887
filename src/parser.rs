use std::borrow::Cow;

use log::debug;

use crate::{
    context::{Context, ExprId, PatternId},
    expr::{CaseOption, Expr},
    layout::Layout,
    lexer::{self, Token},
    operator::{Associativity, Operator, OperatorTable},
    pattern::Pattern,
    span::{Span, Spanned},
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Lexer(#[from] lexer::Error),

    #[error("expected {expected} but got '{found}'")]
    UnexpectedToken {
        expected: String,
        found: Token,
        span: Span,
    },

    #[error("unknown operator '{0}'")]
    UnknownOperator(String, Span),

    #[error("unexpected operator '{0}' in pattern")]
    OperatorInPattern(String, Span),

    #[error(
        "cannot mix operators '{left}' ({left_assoc} {precedence}) and '{right}' ({right_assoc} {precedence})"
    )]
    MixedAssociativity {
        left: String,
        left_assoc: Associativity,
        right: String,
        right_assoc: Associativity,
        precedence: u8,
        span: Span,
    },

    #[error("cannot mix non-associative operators '{left}' and '{right}'")]
    NonAssociative {
        left: String,
        right: String,
        span: Span,
    },
}

impl Error {
    fn unexpected(expected: &str, token: Spanned<Token>) -> Self {
        Error::UnexpectedToken {
            expected: expected.to_string(),
            found: token.value,
            span: token.span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Error::Lexer(err) => err.span(),
            Error::UnexpectedToken { span, .. }
            | Error::MixedAssociativity { span, .. }
            | Error::NonAssociative { span, .. } => *span,
            Error::UnknownOperator(_, span) | Error::OperatorInPattern(_, span) => *span,
        }
    }

    /// True when the input ended before the expression did, so more input
    /// could still make it valid.
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            Error::UnexpectedToken {
                found: Token::Eof,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// An operator waiting on the operator stack for its right operand.
#[derive(Debug)]
struct PendingOperator {
    symbol: String,
    operator: Operator,
    span: Span,
}

#[derive(Debug)]
pub struct Parser<'a> {
    context: &'a mut Context,
    operators: Cow<'a, OperatorTable>,
    tokens: Layout,
    lookahead: Option<Spanned<Token>>,
}

impl<'a> Parser<'a> {
    pub fn new(context: &'a mut Context, input: &str) -> Self {
        Self::build(context, input, Cow::Owned(OperatorTable::standard()))
    }

    pub fn with_operators(
        context: &'a mut Context,
        input: &str,
        operators: &'a OperatorTable,
    ) -> Self {
        Self::build(context, input, Cow::Borrowed(operators))
    }

    fn build(context: &'a mut Context, input: &str, operators: Cow<'a, OperatorTable>) -> Self {
        Parser {
            context,
            operators,
            tokens: Layout::new(input),
            lookahead: None,
        }
    }

    /// Parses a single expression that must span the whole input.
    pub fn parse(mut self) -> Result<ExprId> {
        let expr = self.parse_expr()?;
        self.expect(Token::Eof)?;
        debug!("parsed {}", expr.display(self.context));
        Ok(expr)
    }

    fn parse_expr(&mut self) -> Result<ExprId> {
        let token = self.peek()?;
        match token.value {
            Token::Let => self.parse_let_expr(),
            Token::If => self.parse_cond_expr(),
            Token::Backslash => self.parse_lambda_expr(),
            Token::Case => self.parse_case_expr(),
            ref value if begins_base_expr(value) => self.parse_operator_sequence(),
            _ => Err(Error::unexpected("expression", token)),
        }
    }

    fn parse_let_expr(&mut self) -> Result<ExprId> {
        let start_span = self.expect(Token::Let)?.span;
        let pattern = self.parse_base_pattern()?;
        self.expect(Token::Equal)?;
        let value = self.parse_expr()?;
        self.expect(Token::In)?;
        let body = self.parse_expr()?;
        let end_span = self.context.get_span(body);
        let expr = self.context.add_expr(Expr::Let {
            pattern,
            value,
            body,
        });
        self.context.set_span(expr, start_span.merge(end_span));
        Ok(expr)
    }

    fn parse_cond_expr(&mut self) -> Result<ExprId> {
        let start_span = self.expect(Token::If)?.span;
        let cond = self.parse_expr()?;
        self.expect(Token::Then)?;
        let then = self.parse_expr()?;
        self.expect(Token::Else)?;
        let alt = self.parse_expr()?;
        let end_span = self.context.get_span(alt);
        let expr = self.context.add_expr(Expr::Condition { cond, then, alt });
        self.context.set_span(expr, start_span.merge(end_span));
        Ok(expr)
    }

    fn parse_lambda_expr(&mut self) -> Result<ExprId> {
        let start_span = self.expect(Token::Backslash)?.span;
        let param = self.parse_base_pattern()?;
        self.expect(Token::HyphenGreaterThan)?;
        let body = self.parse_expr()?;
        let end_span = self.context.get_span(body);
        let expr = self.context.add_expr(Expr::Lambda { param, body });
        self.context.set_span(expr, start_span.merge(end_span));
        Ok(expr)
    }

    fn parse_case_expr(&mut self) -> Result<ExprId> {
        let start_span = self.expect(Token::Case)?.span;
        let subject = self.parse_expr()?;
        let of_span = self.expect(Token::Of)?.span;
        let options = self.parse_block(begins_pattern, Self::parse_case_option)?;
        let end_span = options
            .last()
            .map_or(of_span, |option| self.context.get_span(option.body));
        let expr = self.context.add_expr(Expr::Case { subject, options });
        self.context.set_span(expr, start_span.merge(end_span));
        Ok(expr)
    }

    fn parse_case_option(&mut self) -> Result<CaseOption> {
        let pattern = self.parse_open_pattern()?;
        self.expect(Token::HyphenGreaterThan)?;
        let body = self.parse_expr()?;
        Ok(CaseOption { pattern, body })
    }

    /// Items between the synthetic block tokens of the layout engine. A token
    /// that can neither continue nor delimit the block closes it implicitly.
    fn parse_block<T, F>(
        &mut self,
        begins_item: fn(&Token) -> bool,
        mut parse_item: F,
    ) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        self.expect(Token::BlockBegin)?;
        let mut items = Vec::new();
        loop {
            let token = self.peek()?;
            match token.value {
                Token::BlockEnd => {
                    self.advance()?;
                    break;
                }
                Token::BlockDelim if !items.is_empty() => {
                    self.advance()?;
                }
                ref value if items.is_empty() && begins_item(value) => {}
                _ => {
                    if self.tokens.close_implicit() {
                        break;
                    }
                    return Err(Error::unexpected("end of block", token));
                }
            }
            items.push(parse_item(self)?);
        }
        Ok(items)
    }

    /// `app (OPERATOR app)*` reduced with an operand stack and an operator
    /// stack.
    fn parse_operator_sequence(&mut self) -> Result<ExprId> {
        let mut operators: Vec<PendingOperator> = Vec::new();
        let mut operands = vec![self.parse_application()?];

        loop {
            let token = self.peek()?;
            let Token::Operator(symbol) = token.value else {
                break;
            };
            let Some(operator) = self.operators.get(&symbol).copied() else {
                return Err(Error::UnknownOperator(symbol, token.span));
            };
            self.advance()?;

            while should_reduce(&operators, &symbol, &operator)? {
                self.reduce(&mut operators, &mut operands);
            }
            operators.push(PendingOperator {
                symbol,
                operator,
                span: token.span,
            });

            if begins_base_expr(&self.peek()?.value) {
                operands.push(self.parse_application()?);
            } else {
                // `1 + if c then 2 else 3`: the trailing expression ends the sequence
                operands.push(self.parse_expr()?);
                break;
            }
        }

        while !operators.is_empty() {
            self.reduce(&mut operators, &mut operands);
        }

        let (Some(expr), true) = (operands.pop(), operands.is_empty()) else {
            unreachable!("operator sequence did not reduce to one operand");
        };
        Ok(expr)
    }

    fn reduce(&mut self, operators: &mut Vec<PendingOperator>, operands: &mut Vec<ExprId>) {
        let (Some(pending), Some(rhs), Some(lhs)) =
            (operators.pop(), operands.pop(), operands.pop())
        else {
            unreachable!("operator stack out of step with operand stack");
        };
        let span = self.context.get_span(lhs).merge(self.context.get_span(rhs));
        let expr = self.context.add_expr((pending.operator.combine)(lhs, rhs));
        self.context.set_span(expr, span);
        operands.push(expr);
    }

    fn parse_application(&mut self) -> Result<ExprId> {
        let mut func = self.parse_base_expr()?;
        while begins_base_expr(&self.peek()?.value) {
            let arg = self.parse_base_expr()?;
            let span = self.context.get_span(func).merge(self.context.get_span(arg));
            func = self.context.add_expr(Expr::Application { func, arg });
            self.context.set_span(func, span);
        }
        Ok(func)
    }

    fn parse_base_expr(&mut self) -> Result<ExprId> {
        let token = self.peek()?;
        match token.value {
            Token::Integer(val) => self.parse_leaf(Expr::Integer(val)),
            Token::Boolean(val) => self.parse_leaf(Expr::Boolean(val)),
            Token::Identifier(id) => self.parse_leaf(Expr::Identifier(id)),
            Token::ParenLeft => self.parse_bracketed_expr(),
            Token::BracketLeft => self.parse_list_lit(),
            _ => Err(Error::unexpected("expression", token)),
        }
    }

    fn parse_leaf(&mut self, expr: Expr) -> Result<ExprId> {
        let span = self.advance()?.span;
        let expr = self.context.add_expr(expr);
        self.context.set_span(expr, span);
        Ok(expr)
    }

    fn parse_bracketed_expr(&mut self) -> Result<ExprId> {
        let (mut exprs, span) = self.parse_delimited(
            Token::ParenLeft,
            Token::Comma,
            Token::ParenRight,
            Self::parse_expr,
        )?;

        let expr = match (exprs.pop(), exprs.is_empty()) {
            (Some(expr), true) => expr,
            (last, _) => {
                exprs.extend(last);
                self.context.add_expr(Expr::Tuple(exprs))
            }
        };
        self.context.set_span(expr, span);
        Ok(expr)
    }

    fn parse_list_lit(&mut self) -> Result<ExprId> {
        let (elems, span) = self.parse_delimited(
            Token::BracketLeft,
            Token::Comma,
            Token::BracketRight,
            Self::parse_expr,
        )?;

        let mut list = self.context.add_expr(Expr::Nil);
        self.context.set_span(list, span);
        for head in elems.into_iter().rev() {
            let head_span = self.context.get_span(head);
            list = self.context.add_expr(Expr::Cons { head, tail: list });
            self.context.set_span(list, Span::new(head_span.start, span.end));
        }
        Ok(list)
    }

    fn parse_base_pattern(&mut self) -> Result<PatternId> {
        let token = self.peek()?;
        match token.value {
            Token::Identifier(name) => self.parse_leaf_pattern(Pattern::Bind(name)),
            Token::Underscore => self.parse_leaf_pattern(Pattern::Wildcard),
            Token::Integer(val) => self.parse_leaf_pattern(Pattern::Integer(val)),
            Token::Boolean(val) => self.parse_leaf_pattern(Pattern::Boolean(val)),
            Token::ParenLeft => self.parse_bracketed_pattern(),
            Token::BracketLeft => self.parse_list_pattern(),
            _ => Err(Error::unexpected("pattern", token)),
        }
    }

    /// `base (: base)*`, folded to the right so the last pattern is the tail.
    fn parse_open_pattern(&mut self) -> Result<PatternId> {
        let mut patterns = vec![self.parse_base_pattern()?];

        while let Spanned {
            value: Token::Operator(symbol),
            span,
        } = self.peek()?
        {
            if symbol != ":" {
                return Err(Error::OperatorInPattern(symbol, span));
            }
            self.advance()?;
            patterns.push(self.parse_base_pattern()?);
        }

        let Some(mut pattern) = patterns.pop() else {
            unreachable!("open pattern without a base pattern");
        };
        let end_span = self.context.get_pattern_span(pattern);
        for head in patterns.into_iter().rev() {
            let head_span = self.context.get_pattern_span(head);
            pattern = self.context.add_pattern(Pattern::Cons {
                head,
                tail: pattern,
            });
            self.context
                .set_pattern_span(pattern, Span::new(head_span.start, end_span.end));
        }
        Ok(pattern)
    }

    fn parse_leaf_pattern(&mut self, pattern: Pattern) -> Result<PatternId> {
        let span = self.advance()?.span;
        let pattern = self.context.add_pattern(pattern);
        self.context.set_pattern_span(pattern, span);
        Ok(pattern)
    }

    fn parse_bracketed_pattern(&mut self) -> Result<PatternId> {
        let (mut patterns, span) = self.parse_delimited(
            Token::ParenLeft,
            Token::Comma,
            Token::ParenRight,
            Self::parse_open_pattern,
        )?;

        let pattern = match (patterns.pop(), patterns.is_empty()) {
            (Some(pattern), true) => pattern,
            (last, _) => {
                patterns.extend(last);
                self.context.add_pattern(Pattern::Tuple(patterns))
            }
        };
        self.context.set_pattern_span(pattern, span);
        Ok(pattern)
    }

    fn parse_list_pattern(&mut self) -> Result<PatternId> {
        let (elems, span) = self.parse_delimited(
            Token::BracketLeft,
            Token::Comma,
            Token::BracketRight,
            Self::parse_open_pattern,
        )?;

        let mut list = self.context.add_pattern(Pattern::Nil);
        self.context.set_pattern_span(list, span);
        for head in elems.into_iter().rev() {
            let head_span = self.context.get_pattern_span(head);
            list = self.context.add_pattern(Pattern::Cons { head, tail: list });
            self.context
                .set_pattern_span(list, Span::new(head_span.start, span.end));
        }
        Ok(list)
    }

    /// `start (item (delim item)*)? end`, returning the items and the span
    /// from `start` to `end`.
    fn parse_delimited<T, F>(
        &mut self,
        start: Token,
        delim: Token,
        end: Token,
        mut parse_item: F,
    ) -> Result<(Vec<T>, Span)>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let start_span = self.expect(start)?.span;
        let mut items = Vec::new();
        while self.peek()?.value != end {
            if !items.is_empty() {
                self.expect(delim.clone())?;
            }
            items.push(parse_item(self)?);
        }
        let end_span = self.expect(end)?.span;
        Ok((items, start_span.merge(end_span)))
    }

    fn peek(&mut self) -> Result<Spanned<Token>> {
        match &self.lookahead {
            Some(token) => Ok(token.clone()),
            None => {
                let token = self.tokens.next_token()?;
                self.lookahead = Some(token.clone());
                Ok(token)
            }
        }
    }

    fn advance(&mut self) -> Result<Spanned<Token>> {
        match self.lookahead.take() {
            Some(token) => Ok(token),
            None => Ok(self.tokens.next_token()?),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<Spanned<Token>> {
        let token = self.advance()?;
        if token.value == expected {
            Ok(token)
        } else {
            Err(Error::unexpected(&format!("'{expected}'"), token))
        }
    }
}

/// Decides whether the operator on top of the stack takes its operands
/// before `incoming` is pushed.
fn should_reduce(stack: &[PendingOperator], incoming: &str, operator: &Operator) -> Result<bool> {
    let Some(top) = stack.last() else {
        return Ok(false);
    };
    let (prev, next) = (&top.operator, operator);

    if prev.precedence != next.precedence {
        return Ok(prev.precedence > next.precedence);
    }
    if prev.associativity != next.associativity {
        return Err(Error::MixedAssociativity {
            left: top.symbol.clone(),
            left_assoc: prev.associativity,
            right: incoming.to_string(),
            right_assoc: next.associativity,
            precedence: prev.precedence,
            span: top.span,
        });
    }
    match prev.associativity {
        Associativity::Left => Ok(true),
        Associativity::Right => Ok(false),
        Associativity::None => Err(Error::NonAssociative {
            left: top.symbol.clone(),
            right: incoming.to_string(),
            span: top.span,
        }),
    }
}

fn begins_base_expr(token: &Token) -> bool {
    matches!(
        token,
        Token::Integer(_)
            | Token::Boolean(_)
            | Token::Identifier(_)
            | Token::ParenLeft
            | Token::BracketLeft
    )
}

fn begins_pattern(token: &Token) -> bool {
    begins_base_expr(token) || *token == Token::Underscore
}

pub fn parse_whole_expr(ctx: &mut Context, input: &str) -> Result<ExprId> {
    Parser::new(ctx, input).parse()
}

pub fn parse_whole_expr_with(
    ctx: &mut Context,
    input: &str,
    operators: &OperatorTable,
) -> Result<ExprId> {
    Parser::with_operators(ctx, input, operators).parse()
}
