use std::fmt::Display;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Token {
    BracketLeft,
    BracketRight,
    Comma,
    Equal,
    ParenLeft,
    ParenRight,
    HyphenGreaterThan,
    Backslash,
    Underscore,
    Pipe,

    Boolean(bool),
    Integer(i64),
    Identifier(String),
    Operator(String),

    Let,
    In,
    If,
    Then,
    Else,
    Case,
    Of,

    Newline,
    BlockBegin,
    BlockDelim,
    BlockEnd,

    Eof,
}

impl Token {
    /// Keywords after which the layout engine opens an indentation block.
    pub fn opens_block(&self) -> bool {
        matches!(self, Token::Of)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Token::BracketLeft => write!(f, "["),
            Token::BracketRight => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Equal => write!(f, "="),
            Token::HyphenGreaterThan => write!(f, "->"),
            Token::ParenLeft => write!(f, "("),
            Token::ParenRight => write!(f, ")"),
            Token::Backslash => write!(f, "\\"),
            Token::Underscore => write!(f, "_"),
            Token::Pipe => write!(f, "|"),
            Token::Boolean(val) => write!(f, "{val}"),
            Token::Integer(val) => write!(f, "{val}"),
            Token::Identifier(val) => write!(f, "{val}"),
            Token::Operator(op) => write!(f, "({op})"),
            Token::Let => write!(f, "let"),
            Token::In => write!(f, "in"),
            Token::If => write!(f, "if"),
            Token::Then => write!(f, "then"),
            Token::Else => write!(f, "else"),
            Token::Case => write!(f, "case"),
            Token::Of => write!(f, "of"),
            Token::Newline => write!(f, "newline"),
            Token::BlockBegin => write!(f, "start of block"),
            Token::BlockDelim => write!(f, "next block item"),
            Token::BlockEnd => write!(f, "end of block"),
            Token::Eof => write!(f, "EOF"),
        }
    }
}

pub const SYMBOLS: &[(&str, Token)] = &[
    ("->", Token::HyphenGreaterThan),
    ("(", Token::ParenLeft),
    (")", Token::ParenRight),
    (",", Token::Comma),
    ("=", Token::Equal),
    ("[", Token::BracketLeft),
    ("]", Token::BracketRight),
    ("\\", Token::Backslash),
    ("|", Token::Pipe),
];

pub const KEYWORDS: &[(&str, Token)] = &[
    ("let", Token::Let),
    ("in", Token::In),
    ("if", Token::If),
    ("then", Token::Then),
    ("else", Token::Else),
    ("case", Token::Case),
    ("of", Token::Of),
    ("true", Token::Boolean(true)),
    ("false", Token::Boolean(false)),
];
