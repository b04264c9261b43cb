//! Source location types for tracking positions in source files.

use serde::{Deserialize, Serialize};

use crate::refs::PathRef;

/// A span of source code, represented as byte offsets.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A location in source code, combining file and span information.
///
/// Copy-able; the path is an interned reference into the context's
/// [`PathInterner`](crate::types::PathInterner).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub path: PathRef,
    pub span: Span,
}

impl Location {
    pub const fn new(path: PathRef, span: Span) -> Self {
        Self { path, span }
    }
}
