use std::fmt;
use std::time::{Duration, Instant};

use crate::core::Result;
use crate::wire::Format;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    To,
    From,
}

impl Direction {
    pub fn is_to(self) -> bool {
        matches!(self, Self::To)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::To => write!(f, "to"),
            Self::From => write!(f, "from"),
        }
    }
}

/// One step of the traversal path: a field/dictionary key or a list index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(v: &str) -> Self {
        Self::Key(v.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(v: String) -> Self {
        Self::Key(v)
    }
}

impl From<usize> for PathSegment {
    fn from(v: usize) -> Self {
        Self::Index(v)
    }
}

/// Per-call traversal state, handed to every transform.
///
/// Owned by exactly one top-level mapping call. `level()` is the depth of
/// the path stack: 0 while the root entity is being mapped.
#[derive(Debug)]
pub struct Context {
    prefix: String,
    path: Vec<PathSegment>,
    format: Format,
    direction: Direction,
    started: Instant,
}

impl Context {
    pub fn new(direction: Direction, format: Format, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            path: Vec::new(),
            format,
            direction,
            started: Instant::now(),
        }
    }

    /// Context for mapping into `target`.
    pub fn to(target: Format, prefix: impl Into<String>) -> Self {
        Self::new(Direction::To, target, prefix)
    }

    /// Context for mapping out of `source`.
    pub fn from(source: Format, prefix: impl Into<String>) -> Self {
        Self::new(Direction::From, source, prefix)
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn level(&self) -> usize {
        self.path.len()
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.path
    }

    pub fn enter(&mut self, step: impl Into<PathSegment>) -> &mut Self {
        self.path.push(step.into());
        self
    }

    pub fn leave(&mut self) {
        self.path.pop();
    }

    /// Runs `f` one level deeper.
    ///
    /// The segment is popped only when `f` succeeds. On failure it stays, so
    /// the orchestrator reports the path of the field that failed.
    pub fn scoped<T>(
        &mut self,
        step: impl Into<PathSegment>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.enter(step);
        let out = f(self)?;
        self.leave();
        Ok(out)
    }

    /// `prefix.seg1.seg2`
    pub fn path(&self) -> String {
        let mut out = self.prefix.clone();
        for segment in &self.path {
            out.push('.');
            out.push_str(&segment.to_string());
        }
        out
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
