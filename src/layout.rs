//! Off-side rule.
//!
//! [`Layout`] filters the raw token stream of a [`Lexer`] and replaces
//! indentation after a block keyword (`of`) with explicit
//! [`Token::BlockBegin`], [`Token::BlockDelim`] and [`Token::BlockEnd`]
//! tokens. Newlines never leave this module.

use std::collections::VecDeque;

use log::trace;

use crate::{
    lexer::{Lexer, Result, Token},
    span::{Span, Spanned},
};

#[derive(Debug)]
pub struct Layout {
    lexer: Lexer,
    /// Reference column of every open block, innermost last.
    contexts: Vec<usize>,
    pending: VecDeque<Spanned<Token>>,
    expecting_block: bool,
    at_line_start: bool,
}

impl Layout {
    pub fn new(input: &str) -> Self {
        Self {
            lexer: Lexer::new(input),
            contexts: Vec::new(),
            pending: VecDeque::new(),
            expecting_block: false,
            at_line_start: true,
        }
    }

    pub fn next_token(&mut self) -> Result<Spanned<Token>> {
        while self.pending.is_empty() {
            let token = self.lexer.next_token()?;
            match token.value {
                Token::Newline => self.at_line_start = true,
                Token::Eof => self.finish(token),
                _ => self.place(token),
            }
        }
        Ok(self
            .pending
            .pop_front()
            .unwrap_or_else(|| Spanned::new(Token::Eof, Span::default())))
    }

    /// Closes the innermost block because the parser met a token that cannot
    /// continue it, e.g. the `)` in `(case x of 1 -> 2)`.
    pub fn close_implicit(&mut self) -> bool {
        let closed = self.contexts.pop();
        if let Some(column) = closed {
            trace!("implicitly closing block at column {column}");
        }
        closed.is_some()
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.contexts.len()
    }

    fn place(&mut self, token: Spanned<Token>) {
        let column = token.span.start.column;

        if self.expecting_block {
            self.expecting_block = false;
            let enclosing = self.contexts.last().copied().unwrap_or(0);
            if self.at_line_start && column <= enclosing {
                trace!("empty block before column {column}");
                self.emit(Token::BlockBegin, token.span);
                self.emit(Token::BlockEnd, token.span);
            } else {
                trace!("opening block at column {column}");
                self.contexts.push(column);
                self.emit(Token::BlockBegin, token.span);
                self.emit_item(token);
                return;
            }
        }

        if self.at_line_start {
            while let Some(&reference) = self.contexts.last() {
                if column < reference {
                    trace!("closing block at column {reference}");
                    self.contexts.pop();
                    self.emit(Token::BlockEnd, token.span);
                } else {
                    if column == reference {
                        self.emit(Token::BlockDelim, token.span);
                    }
                    break;
                }
            }
        }

        if token.value == Token::Pipe && !self.contexts.is_empty() {
            let delimited = matches!(
                self.pending.back(),
                Some(Spanned {
                    value: Token::BlockDelim,
                    ..
                })
            );
            if !delimited {
                self.emit(Token::BlockDelim, token.span);
            }
            self.at_line_start = false;
            return;
        }

        self.emit_item(token);
    }

    fn emit_item(&mut self, token: Spanned<Token>) {
        self.at_line_start = false;
        self.expecting_block = token.value.opens_block();
        self.pending.push_back(token);
    }

    fn emit(&mut self, token: Token, span: Span) {
        self.pending.push_back(Spanned::new(token, span));
    }

    fn finish(&mut self, eof: Spanned<Token>) {
        if self.expecting_block {
            self.expecting_block = false;
            self.emit(Token::BlockBegin, eof.span);
            self.emit(Token::BlockEnd, eof.span);
        }
        while self.contexts.pop().is_some() {
            self.emit(Token::BlockEnd, eof.span);
        }
        self.pending.push_back(eof);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(input: &str) -> Vec<Token> {
        let mut layout = Layout::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = layout.next_token().unwrap().value;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn int(n: i64) -> Token {
        Token::Integer(n)
    }

    fn ident(name: &str) -> Token {
        Token::Identifier(name.into())
    }

    #[test]
    fn aligned_items_are_delimited() {
        let tokens = layout("case x of\n  1 -> 2\n  3 -> 4\n");
        assert_eq!(
            tokens,
            vec![
                Token::Case,
                ident("x"),
                Token::Of,
                Token::BlockBegin,
                int(1),
                Token::HyphenGreaterThan,
                int(2),
                Token::BlockDelim,
                int(3),
                Token::HyphenGreaterThan,
                int(4),
                Token::BlockEnd,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn deeper_lines_continue_the_item() {
        let tokens = layout("case x of 1 ->\n             2");
        assert_eq!(
            tokens,
            vec![
                Token::Case,
                ident("x"),
                Token::Of,
                Token::BlockBegin,
                int(1),
                Token::HyphenGreaterThan,
                int(2),
                Token::BlockEnd,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn dedent_closes_several_blocks() {
        let input = "case a of\n  1 -> case b of\n         2 -> 3\nz";
        let tokens = layout(input);
        assert_eq!(
            &tokens[tokens.len() - 4..],
            &[Token::BlockEnd, Token::BlockEnd, ident("z"), Token::Eof]
        );
    }

    #[test]
    fn dedent_to_outer_item_closes_inner_and_delimits_outer() {
        let input = "case a of\n  1 -> case b of\n         2 -> 3\n  4 -> 5";
        let tokens = layout(input);
        let tail: Vec<Token> = tokens[tokens.len() - 7..].to_vec();
        assert_eq!(
            tail,
            vec![
                Token::BlockEnd,
                Token::BlockDelim,
                int(4),
                Token::HyphenGreaterThan,
                int(5),
                Token::BlockEnd,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn pipe_delimits_items_on_one_line() {
        let tokens = layout("case 1 of 1 -> 10 | 1 -> 20");
        assert_eq!(
            tokens,
            vec![
                Token::Case,
                int(1),
                Token::Of,
                Token::BlockBegin,
                int(1),
                Token::HyphenGreaterThan,
                int(10),
                Token::BlockDelim,
                int(1),
                Token::HyphenGreaterThan,
                int(20),
                Token::BlockEnd,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn leading_pipe_on_aligned_line_delimits_once() {
        let tokens = layout("case x of\n  1 -> 2\n  | 3 -> 4");
        let delims = tokens.iter().filter(|t| **t == Token::BlockDelim).count();
        assert_eq!(delims, 1);
    }

    #[test]
    fn pipe_outside_blocks_is_passed_through() {
        assert_eq!(
            layout("a | b"),
            vec![ident("a"), Token::Pipe, ident("b"), Token::Eof]
        );
    }

    #[test]
    fn missing_block_at_end_of_input_is_empty() {
        assert_eq!(
            layout("case x of"),
            vec![
                Token::Case,
                ident("x"),
                Token::Of,
                Token::BlockBegin,
                Token::BlockEnd,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn newlines_outside_blocks_are_elided() {
        assert_eq!(
            layout("f\nx\n\n  y"),
            vec![ident("f"), ident("x"), ident("y"), Token::Eof]
        );
    }

    #[test]
    fn implicit_close_pops_innermost_context() {
        let mut layout = Layout::new("case x of 1 -> 2");
        for _ in 0..4 {
            layout.next_token().unwrap();
        }
        assert_eq!(layout.depth(), 1);
        assert!(layout.close_implicit());
        assert_eq!(layout.depth(), 0);
        assert!(!layout.close_implicit());
    }
}
