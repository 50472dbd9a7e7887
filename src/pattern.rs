use crate::context::PatternId;

/// Left-hand sides of `let`, lambda parameters and `case` options.
#[derive(Debug, Clone)]
pub enum Pattern {
    Bind(String),
    Wildcard,
    Integer(i64),
    Boolean(bool),
    Tuple(Vec<PatternId>),
    Cons { head: PatternId, tail: PatternId },
    Nil,
}

impl Pattern {
    /// The bound name if this pattern is a plain variable, the only shape a
    /// `let` may use to refer to itself.
    pub fn as_bind(&self) -> Option<&str> {
        match self {
            Pattern::Bind(name) => Some(name),
            _ => None,
        }
    }
}
