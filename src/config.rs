/// Limits applied while evaluating and printing a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Deepest nesting of evaluations before giving up.
    pub max_depth: usize,
    /// Most list or tuple elements printed before eliding the rest.
    pub render_limit: usize,
    /// Bytes of stack for the evaluation thread. Sized from `max_depth` when
    /// unset.
    pub stack_size: Option<usize>,
}

impl Config {
    pub const DEFAULT_MAX_DEPTH: usize = 2000;
    pub const DEFAULT_RENDER_LIMIT: usize = 1000;

    /// Stack reserved per level of `max_depth`; covers a debug build.
    const STACK_PER_LEVEL: usize = 32 * 1024;
    const MIN_STACK_SIZE: usize = 2 * 1024 * 1024;

    pub fn with_max_depth(self, max_depth: usize) -> Self {
        Self { max_depth, ..self }
    }

    pub fn with_render_limit(self, render_limit: usize) -> Self {
        Self {
            render_limit,
            ..self
        }
    }

    pub fn with_stack_size(self, stack_size: usize) -> Self {
        Self {
            stack_size: Some(stack_size),
            ..self
        }
    }

    /// Stack size of the thread `evaluate` runs on, large enough that
    /// `max_depth` trips before the host stack runs out.
    pub fn eval_stack_size(&self) -> usize {
        self.stack_size.unwrap_or_else(|| {
            self.max_depth
                .saturating_mul(Self::STACK_PER_LEVEL)
                .max(Self::MIN_STACK_SIZE)
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            render_limit: Self::DEFAULT_RENDER_LIMIT,
            stack_size: None,
        }
    }
}
