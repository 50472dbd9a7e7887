use core::fmt;

use crate::{eval, parser, span::Span};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parser(#[from] parser::Error),

    #[error(transparent)]
    Eval(#[from] eval::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Parse,
    Eval,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Lex => write!(f, "lex error"),
            ErrorKind::Parse => write!(f, "parse error"),
            ErrorKind::Eval => write!(f, "evaluation error"),
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parser(parser::Error::Lexer(_)) => ErrorKind::Lex,
            Error::Parser(_) => ErrorKind::Parse,
            Error::Eval(_) => ErrorKind::Eval,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Error::Parser(err) => err.span(),
            Error::Eval(err) => err.span(),
        }
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, Error::Parser(err) if err.is_incomplete())
    }

    /// Renders the error against the source it came from, e.g.
    ///
    /// ```text
    /// main.fun:1:5: parse error: unknown operator '+++'
    ///      |
    ///    1 | 1 +++ 2
    ///      |   ^^^
    /// ```
    pub fn report<'a>(&'a self, name: &'a str, source: &'a str) -> Report<'a> {
        Report {
            error: self,
            name,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub struct Report<'a> {
    error: &'a Error,
    name: &'a str,
    source: &'a str,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let span = self.error.span();
        let message = format!("{}: {}", self.error.kind(), self.error);
        write_message(f, self.name, span, &message)?;
        if span.start.line > 0 && !self.error.is_incomplete() {
            write_lines(f, self.source, span)?;
        }
        Ok(())
    }
}

fn write_message(f: &mut fmt::Formatter, name: &str, span: Span, message: &str) -> fmt::Result {
    if span.start.line == 0 {
        return writeln!(f, "{name}: {message}");
    }
    writeln!(
        f,
        "{}:{}:{}: {}",
        name, span.start.line, span.start.column, message
    )
}

fn write_lines(f: &mut fmt::Formatter, source: &str, span: Span) -> fmt::Result {
    let lines = source
        .lines()
        .skip(span.start.line - 1)
        .take(span.end.line.saturating_sub(span.start.line) + 1)
        .collect::<Vec<&str>>();

    let Some(first) = lines.first() else {
        return Ok(());
    };

    writeln!(f, "     | ")?;
    if lines.len() > 1 {
        for (i, line) in lines.iter().enumerate() {
            let line_num = i + span.start.line;
            writeln!(f, "{line_num:4} | {line}")?;
            if span.start.line == line_num {
                writeln!(
                    f,
                    "     | {}{}",
                    " ".repeat(span.start.column.saturating_sub(1)),
                    "^".repeat(line.chars().count().saturating_sub(span.start.column) + 1)
                )?;
            } else if span.end.line == line_num {
                writeln!(f, "     | {}", "^".repeat(span.end.column))?;
            } else {
                writeln!(f, "     | {}", "^".repeat(line.chars().count()))?;
            }
        }
    } else {
        writeln!(f, "{:4} | {}", span.start.line, first)?;
        writeln!(
            f,
            "     | {}{}",
            " ".repeat(span.start.column.saturating_sub(1)),
            "^".repeat(span.end.column.saturating_sub(span.start.column) + 1)
        )?;
    }

    Ok(())
}
