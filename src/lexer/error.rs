use crate::span::Span;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("unexpected character '{0}'")]
    InvalidToken(char, Span),

    #[error("integer literal '{0}' is out of range")]
    InvalidInteger(String, Span),
}

impl Error {
    pub fn span(&self) -> Span {
        match self {
            Error::InvalidToken(_, span) | Error::InvalidInteger(_, span) => *span,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
