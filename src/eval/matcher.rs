use log::trace;

use crate::{
    context::PatternId,
    eval::{
        Error, Interpreter, Result,
        env::Bindings,
        value::{Thunk, Value},
    },
    pattern::Pattern,
};

/// Result of matching a value against a pattern. A failed match is not an
/// error; only the caller decides whether it is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched,
    Failed,
}

impl MatchOutcome {
    fn from_bool(matched: bool) -> Self {
        if matched {
            MatchOutcome::Matched
        } else {
            MatchOutcome::Failed
        }
    }
}

impl Interpreter<'_> {
    /// Matches `subject` against `pattern`, adding every bound name to
    /// `bindings`. Names are bound to the unforced subject; only literal and
    /// structural patterns force it.
    pub fn bind_match(
        &mut self,
        pattern: PatternId,
        subject: Thunk,
        bindings: &mut Bindings,
    ) -> Result<MatchOutcome> {
        let context = self.context;
        match context.get_pattern(pattern) {
            Pattern::Bind(name) => {
                if bindings.contains_key(name) {
                    return Err(Error::DuplicateBinding(
                        name.clone(),
                        context.get_pattern_span(pattern),
                    ));
                }
                bindings.insert(name.clone(), subject);
                Ok(MatchOutcome::Matched)
            }

            Pattern::Wildcard => Ok(MatchOutcome::Matched),

            Pattern::Integer(expected) => match self.force(&subject)? {
                Value::Integer(n) => Ok(MatchOutcome::from_bool(n == *expected)),
                _ => Ok(MatchOutcome::Failed),
            },

            Pattern::Boolean(expected) => match self.force(&subject)? {
                Value::Boolean(b) => Ok(MatchOutcome::from_bool(b == *expected)),
                _ => Ok(MatchOutcome::Failed),
            },

            Pattern::Tuple(patterns) => {
                let Value::Tuple(elems) = self.force(&subject)? else {
                    return Ok(MatchOutcome::Failed);
                };
                if elems.len() != patterns.len() {
                    trace!(
                        "tuple arity {} does not match pattern arity {}",
                        elems.len(),
                        patterns.len()
                    );
                    return Ok(MatchOutcome::Failed);
                }
                for (pattern, elem) in patterns.iter().zip(elems.iter()) {
                    if self.bind_match(*pattern, elem.clone(), bindings)? == MatchOutcome::Failed {
                        return Ok(MatchOutcome::Failed);
                    }
                }
                Ok(MatchOutcome::Matched)
            }

            Pattern::Cons { head, tail } => {
                let Value::Cons(head_thunk, tail_thunk) = self.force(&subject)? else {
                    return Ok(MatchOutcome::Failed);
                };
                if self.bind_match(*head, head_thunk, bindings)? == MatchOutcome::Failed {
                    return Ok(MatchOutcome::Failed);
                }
                self.bind_match(*tail, tail_thunk, bindings)
            }

            Pattern::Nil => Ok(MatchOutcome::from_bool(matches!(
                self.force(&subject)?,
                Value::Nil
            ))),
        }
    }
}
