use core::fmt;

use fxhash::FxHashMap;

use crate::{
    context::ExprId,
    expr::{Expr, InfixOp},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
    None,
}

impl fmt::Display for Associativity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Associativity::Left => write!(f, "infixl"),
            Associativity::Right => write!(f, "infixr"),
            Associativity::None => write!(f, "infix"),
        }
    }
}

/// Builds the node for `lhs <op> rhs` once both operands are parsed.
pub type Combinator = fn(ExprId, ExprId) -> Expr;

#[derive(Debug, Clone, Copy)]
pub struct Operator {
    pub precedence: u8,
    pub associativity: Associativity,
    pub combine: Combinator,
}

impl Operator {
    pub fn new(precedence: u8, associativity: Associativity, combine: Combinator) -> Self {
        Self {
            precedence,
            associativity,
            combine,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.associativity, self.precedence)
    }
}

#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    operators: FxHashMap<String, Operator>,
}

impl OperatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in operators of the language.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.insert(
            "^",
            Operator::new(8, Associativity::Right, |lhs, rhs| Expr::Infix {
                lhs,
                op: InfixOp::Pow,
                rhs,
            }),
        );
        table.insert(
            "*",
            Operator::new(7, Associativity::Left, |lhs, rhs| Expr::Infix {
                lhs,
                op: InfixOp::Mul,
                rhs,
            }),
        );
        table.insert(
            "+",
            Operator::new(6, Associativity::Left, |lhs, rhs| Expr::Infix {
                lhs,
                op: InfixOp::Add,
                rhs,
            }),
        );
        table.insert(
            "-",
            Operator::new(6, Associativity::Left, |lhs, rhs| Expr::Infix {
                lhs,
                op: InfixOp::Sub,
                rhs,
            }),
        );
        table.insert(
            ":",
            Operator::new(5, Associativity::Right, |head, tail| Expr::Cons { head, tail }),
        );
        table.insert(
            "<",
            Operator::new(4, Associativity::None, |lhs, rhs| Expr::Infix {
                lhs,
                op: InfixOp::Lt,
                rhs,
            }),
        );
        table.insert(
            "==",
            Operator::new(4, Associativity::None, |lhs, rhs| Expr::Infix {
                lhs,
                op: InfixOp::Eq,
                rhs,
            }),
        );
        table
    }

    pub fn insert(&mut self, symbol: &str, operator: Operator) {
        self.operators.insert(symbol.to_string(), operator);
    }

    pub fn get(&self, symbol: &str) -> Option<&Operator> {
        self.operators.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}
