use fxhash::FxHashMap;

use crate::eval::value::Thunk;

/// Names bound by one pattern match, not yet attached to an environment.
pub type Bindings = FxHashMap<String, Thunk>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvId(usize);

#[derive(Debug)]
struct Frame {
    parent: Option<EnvId>,
    bindings: Bindings,
}

/// Arena of environment frames. Frames are immutable once pushed, except
/// for the root which holds predefined names.
#[derive(Debug)]
pub struct Environments {
    frames: Vec<Frame>,
}

impl Environments {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame {
                parent: None,
                bindings: Bindings::default(),
            }],
        }
    }

    pub fn root(&self) -> EnvId {
        EnvId(0)
    }

    pub fn push(&mut self, parent: EnvId, bindings: Bindings) -> EnvId {
        self.push_with(parent, |_| bindings)
    }

    /// Pushes a frame whose bindings may refer to the frame itself.
    pub fn push_with<F>(&mut self, parent: EnvId, bindings: F) -> EnvId
    where
        F: FnOnce(EnvId) -> Bindings,
    {
        let id = EnvId(self.frames.len());
        let bindings = bindings(id);
        self.frames.push(Frame {
            parent: Some(parent),
            bindings,
        });
        id
    }

    pub fn define(&mut self, name: &str, thunk: Thunk) {
        self.frames[0].bindings.insert(name.to_string(), thunk);
    }

    pub fn lookup(&self, env: EnvId, name: &str) -> Option<&Thunk> {
        let mut current = Some(env);
        while let Some(EnvId(index)) = current {
            let frame = &self.frames[index];
            if let Some(thunk) = frame.bindings.get(name) {
                return Some(thunk);
            }
            current = frame.parent;
        }
        None
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Default for Environments {
    fn default() -> Self {
        Self::new()
    }
}
