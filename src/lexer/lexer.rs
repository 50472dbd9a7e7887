use crate::{
    lexer::{
        error::{Error, Result},
        token::{KEYWORDS, SYMBOLS, Token},
    },
    span::{Position, Span, Spanned},
};

#[derive(Debug)]
pub struct Lexer {
    buffer: String,
    position: Position,
    finished: bool,
}

impl Lexer {
    pub fn new(buffer: &str) -> Self {
        Self {
            buffer: buffer.to_string(),
            position: Position::start(),
            finished: false,
        }
    }

    pub fn next_token(&mut self) -> Result<Spanned<Token>> {
        loop {
            self.advance(
                self.slice_buffer_while(|c| c.is_whitespace() && c != '\n')
                    .len(),
            );

            let Some(current_char) = self.current_char() else {
                return Ok(Spanned::new(Token::Eof, Span::at(self.position)));
            };

            if current_char == '\n' {
                let span = Span::at(self.position);
                self.advance(1);
                return Ok(Spanned::new(Token::Newline, span));
            }

            if is_operator_char(current_char) {
                let slice = self.slice_buffer_while(is_operator_char);

                if slice.len() >= 2 && slice.chars().all(|c| c == '-') {
                    self.advance(self.slice_buffer_while(|c| c != '\n').len());
                    continue;
                }

                if !SYMBOLS.iter().any(|(sym, _)| slice == *sym) {
                    let op = slice.to_string();
                    let span = self.advance_with_span(op.len());
                    return Ok(Spanned::new(Token::Operator(op), span));
                }
            }

            for (symbol, token) in SYMBOLS {
                if self.remaining_buffer().starts_with(symbol) {
                    let span = self.advance_with_span(symbol.len());
                    return Ok(Spanned::new(token.clone(), span));
                }
            }

            if current_char.is_ascii_digit() {
                let slice = self.slice_buffer_while(|c| c.is_ascii_digit()).to_string();
                let span = self.advance_with_span(slice.len());
                return match slice.parse::<i64>() {
                    Ok(value) => Ok(Spanned::new(Token::Integer(value), span)),
                    Err(_) => Err(Error::InvalidInteger(slice, span)),
                };
            }

            if current_char.is_alphabetic() || current_char == '_' {
                let slice = self
                    .slice_buffer_while(|c| c.is_alphanumeric() || c == '_' || c == '\'')
                    .to_string();
                let span = self.advance_with_span(slice.len());

                if slice == "_" {
                    return Ok(Spanned::new(Token::Underscore, span));
                }

                let token = KEYWORDS
                    .iter()
                    .find(|(keyword, _)| *keyword == slice)
                    .map(|(_, token)| token.clone())
                    .unwrap_or(Token::Identifier(slice));
                return Ok(Spanned::new(token, span));
            }

            return Err(Error::InvalidToken(current_char, Span::at(self.position)));
        }
    }

    fn current_char(&self) -> Option<char> {
        self.remaining_buffer().chars().next()
    }

    fn remaining_buffer(&self) -> &str {
        &self.buffer[self.position.index..]
    }

    fn slice_buffer_while<P: Fn(char) -> bool>(&self, predicate: P) -> &str {
        let buffer = self.remaining_buffer();
        if let Some(pos) = buffer.find(|c| !predicate(c)) {
            &buffer[..pos]
        } else {
            buffer
        }
    }

    /// Moves forward by `len` bytes, tracking lines and columns in characters.
    fn advance(&mut self, len: usize) {
        let end = self.position.index + len;
        while self.position.index < end {
            let Some(c) = self.current_char() else {
                break;
            };
            if c == '\n' {
                self.position.line += 1;
                self.position.column = 1;
            } else {
                self.position.column += 1;
            }
            self.position.index += c.len_utf8();
        }
    }

    fn advance_with_span(&mut self, len: usize) -> Span {
        let start = self.position;
        self.advance(len);
        let mut end = self.position;
        end.column -= 1;
        Span::new(start, end)
    }
}

impl Iterator for Lexer {
    type Item = Result<Spanned<Token>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        self.finished = matches!(token, Ok(Spanned { value: Token::Eof, .. }) | Err(_));
        Some(token)
    }
}

/// Lexes the whole input, ending with a single [`Token::Eof`].
pub fn tokenize(input: &str) -> Result<Vec<Spanned<Token>>> {
    Lexer::new(input).collect()
}

fn is_operator_char(ch: char) -> bool {
    matches!(
        ch,
        '!' | '#'
            | '$'
            | '%'
            | '&'
            | '*'
            | '+'
            | '-'
            | '.'
            | '/'
            | ':'
            | '<'
            | '='
            | '>'
            | '?'
            | '@'
            | '^'
            | '|'
            | '~'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|token| token.value)
            .collect()
    }

    #[test]
    fn keywords_identifiers_and_literals() {
        assert_eq!(
            kinds("let x' = true in case x' of _ -> 42"),
            vec![
                Token::Let,
                Token::Identifier("x'".into()),
                Token::Equal,
                Token::Boolean(true),
                Token::In,
                Token::Case,
                Token::Identifier("x'".into()),
                Token::Of,
                Token::Underscore,
                Token::HyphenGreaterThan,
                Token::Integer(42),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn keyword_prefixes_are_identifiers() {
        assert_eq!(
            kinds("letter often _tail"),
            vec![
                Token::Identifier("letter".into()),
                Token::Identifier("often".into()),
                Token::Identifier("_tail".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn operators_are_maximal_munch() {
        assert_eq!(
            kinds("a==b:c->\\d|+++"),
            vec![
                Token::Identifier("a".into()),
                Token::Operator("==".into()),
                Token::Identifier("b".into()),
                Token::Operator(":".into()),
                Token::Identifier("c".into()),
                Token::HyphenGreaterThan,
                Token::Backslash,
                Token::Identifier("d".into()),
                Token::Operator("|+++".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn newlines_are_kept_and_comments_skipped() {
        assert_eq!(
            kinds("1 -- one\n  2"),
            vec![
                Token::Integer(1),
                Token::Newline,
                Token::Integer(2),
                Token::Eof
            ]
        );
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let tokens = tokenize("f\n  (x)").unwrap();
        let paren = &tokens[2];
        assert_eq!(paren.value, Token::ParenLeft);
        assert_eq!(paren.span.start.line, 2);
        assert_eq!(paren.span.start.column, 3);

        let indices: Vec<usize> = tokens.iter().map(|t| t.span.start.index).collect();
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn rejects_unknown_characters() {
        let err = tokenize("1 + ;").unwrap_err();
        assert_eq!(err.to_string(), "unexpected character ';'");
        assert_eq!(err.span().start.column, 5);
    }

    #[test]
    fn rejects_oversized_integers() {
        let err = tokenize("99999999999999999999").unwrap_err();
        assert!(matches!(err, Error::InvalidInteger(_, _)));
    }

    #[test]
    fn empty_input_is_just_eof() {
        assert_eq!(kinds(""), vec![Token::Eof]);
        assert_eq!(kinds("   "), vec![Token::Eof]);
    }
}
