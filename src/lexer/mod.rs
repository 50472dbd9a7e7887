pub use error::{Error, Result};
pub use lexer::{Lexer, tokenize};
pub use token::Token;

mod error;
mod lexer;
mod token;
