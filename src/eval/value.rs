use std::{cell::RefCell, rc::Rc};

use crate::{
    context::{ExprId, PatternId},
    eval::env::EnvId,
};

#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Closure {
        param: PatternId,
        body: ExprId,
        env: EnvId,
    },
    Tuple(Rc<[Thunk]>),
    Cons(Thunk, Thunk),
    Nil,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::Closure { .. } => "function",
            Value::Tuple(_) => "tuple",
            Value::Cons(..) | Value::Nil => "list",
        }
    }
}

#[derive(Debug)]
pub enum ThunkState {
    Pending { expr: ExprId, env: EnvId },
    /// Being evaluated further up the stack; demanding it again cannot finish.
    Forcing { expr: ExprId, env: EnvId },
    Evaluated(Value),
}

/// What a caller has to do after claiming a thunk for forcing.
#[derive(Debug)]
pub(crate) enum Claim {
    Ready(Value),
    Busy(ExprId),
    Run(ExprId, EnvId),
}

/// A shared, memoizing suspension of an expression in an environment.
#[derive(Debug, Clone)]
pub struct Thunk(Rc<RefCell<ThunkState>>);

impl Thunk {
    pub fn new(expr: ExprId, env: EnvId) -> Self {
        Self(Rc::new(RefCell::new(ThunkState::Pending { expr, env })))
    }

    pub fn evaluated(value: Value) -> Self {
        Self(Rc::new(RefCell::new(ThunkState::Evaluated(value))))
    }

    #[cfg(test)]
    pub fn is_evaluated(&self) -> bool {
        matches!(*self.0.borrow(), ThunkState::Evaluated(_))
    }

    #[cfg(test)]
    pub fn ptr_eq(&self, other: &Thunk) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Marks a pending thunk as being forced and hands out its expression.
    pub(crate) fn claim(&self) -> Claim {
        let mut state = self.0.borrow_mut();
        match &*state {
            ThunkState::Evaluated(value) => Claim::Ready(value.clone()),
            ThunkState::Forcing { expr, .. } => Claim::Busy(*expr),
            ThunkState::Pending { expr, env } => {
                let (expr, env) = (*expr, *env);
                *state = ThunkState::Forcing { expr, env };
                Claim::Run(expr, env)
            }
        }
    }

    pub(crate) fn fill(&self, value: Value) {
        *self.0.borrow_mut() = ThunkState::Evaluated(value);
    }

    /// Returns a thunk whose evaluation failed to the pending state.
    pub(crate) fn release(&self) {
        let mut state = self.0.borrow_mut();
        if let ThunkState::Forcing { expr, env } = *state {
            *state = ThunkState::Pending { expr, env };
        }
    }
}
