use core::fmt;

use crate::context::{ExprId, PatternId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Pow,
    Mul,
    Add,
    Sub,
    Lt,
    Eq,
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InfixOp::Pow => write!(f, "^"),
            InfixOp::Mul => write!(f, "*"),
            InfixOp::Add => write!(f, "+"),
            InfixOp::Sub => write!(f, "-"),
            InfixOp::Lt => write!(f, "<"),
            InfixOp::Eq => write!(f, "=="),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CaseOption {
    pub pattern: PatternId,
    pub body: ExprId,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Boolean(bool),
    Integer(i64),
    Identifier(String),
    Condition {
        cond: ExprId,
        then: ExprId,
        alt: ExprId,
    },
    Infix {
        lhs: ExprId,
        op: InfixOp,
        rhs: ExprId,
    },
    Lambda {
        param: PatternId,
        body: ExprId,
    },
    Application {
        func: ExprId,
        arg: ExprId,
    },
    Let {
        pattern: PatternId,
        value: ExprId,
        body: ExprId,
    },
    Case {
        subject: ExprId,
        options: Vec<CaseOption>,
    },
    Tuple(Vec<ExprId>),
    Cons {
        head: ExprId,
        tail: ExprId,
    },
    Nil,
}
