//! PassContext: the mutation and notification broker between a
//! transformation pass and the IR.
//!
//! One `PassContext` wraps the context for the duration of one pass run
//! (construction is the Idle → Running transition, drop is Running →
//! Idle). Erasure goes through [`PassContext::erase_instruction`];
//! insertion goes through [`crate::builder::Builder`] on the wrapped
//! context. Each structural edit takes effect immediately; there is no
//! multi-edit rollback.
//!
//! Change notifications are a coarse three-flag dirty set, not a precise
//! diff: cached analyses (dominance, call graph, CFG-derived data) are
//! invalidated lazily by the enclosing pipeline based on which flags a
//! pass raised.

use tracing::debug;

use crate::context::IrContext;
use crate::refs::InstRef;

/// Category of structural edit a pass declares after making it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// Instruction structure changed (created, erased, operands rewritten).
    Instructions,
    /// Call-graph shape changed (calls added, removed, or retargeted).
    Calls,
    /// Branch structure changed (CFG edges added or removed).
    Branches,
}

/// Accumulated dirty flags for one pass run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    instructions: bool,
    calls: bool,
    branches: bool,
}

impl ChangeSet {
    pub fn set(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::Instructions => self.instructions = true,
            ChangeKind::Calls => self.calls = true,
            ChangeKind::Branches => self.branches = true,
        }
    }

    pub fn contains(&self, kind: ChangeKind) -> bool {
        match kind {
            ChangeKind::Instructions => self.instructions,
            ChangeKind::Calls => self.calls,
            ChangeKind::Branches => self.branches,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.instructions || self.calls || self.branches)
    }

    pub fn merge(&mut self, other: ChangeSet) {
        self.instructions |= other.instructions;
        self.calls |= other.calls;
        self.branches |= other.branches;
    }
}

/// Mediates all structural mutation requested by one transformation pass.
pub struct PassContext<'a> {
    ctx: &'a mut IrContext,
    changes: ChangeSet,
    /// Maximum number of subpass runs the enclosing pipeline allows, if
    /// bounded.
    subpass_limit: Option<usize>,
    subpasses_run: usize,
    resume_at: Option<InstRef>,
}

impl<'a> PassContext<'a> {
    pub fn new(ctx: &'a mut IrContext) -> Self {
        Self {
            ctx,
            changes: ChangeSet::default(),
            subpass_limit: None,
            subpasses_run: 0,
            resume_at: None,
        }
    }

    /// Like `new`, but bounds the number of subpass runs; used by
    /// pipelines that bisect miscompiles by stopping after N subpasses.
    pub fn with_subpass_limit(ctx: &'a mut IrContext, limit: usize) -> Self {
        Self {
            subpass_limit: Some(limit),
            ..Self::new(ctx)
        }
    }

    /// Read-only access to the IR.
    pub fn ir(&self) -> &IrContext {
        self.ctx
    }

    /// Mutable access to the IR, for use with
    /// [`Builder::before`](crate::builder::Builder::before) and
    /// [`IrContext::replace_all_uses`].
    pub fn ir_mut(&mut self) -> &mut IrContext {
        self.ctx
    }

    /// Erase an instruction, unlinking it from its block, its operands
    /// from their use-lists, and its successor edges from predecessor
    /// lists. Raises the `Instructions` dirty flag.
    ///
    /// Erase does not rewrite uses of the instruction's results; redirect
    /// them first.
    ///
    /// # Panics
    ///
    /// Panics if any result of the instruction still has uses.
    pub fn erase_instruction(&mut self, inst: InstRef) {
        self.ctx.erase_inst(inst);
        self.changes.set(ChangeKind::Instructions);
    }

    /// Declare a category of edit just made, so that cached analyses can
    /// be invalidated lazily.
    pub fn notify_changes(&mut self, kind: ChangeKind) {
        debug!(?kind, "pass notified change");
        self.changes.set(kind);
    }

    /// Dirty flags accumulated so far.
    pub fn changes(&self) -> ChangeSet {
        self.changes
    }

    /// Take and reset the accumulated dirty flags.
    pub fn take_changes(&mut self) -> ChangeSet {
        std::mem::take(&mut self.changes)
    }

    /// Cooperative yield point between fine-grained subpasses.
    ///
    /// `inst` is the cursor to resume iteration at; passing the
    /// instruction *after* the one a subpass just erased lets the
    /// pipeline continue safely. Returns `false` once the configured
    /// subpass limit is exhausted, signalling the pass to stop.
    pub fn continue_with_next_subpass_run(&mut self, inst: Option<InstRef>) -> bool {
        if let Some(limit) = self.subpass_limit {
            if self.subpasses_run >= limit {
                return false;
            }
        }
        self.subpasses_run += 1;
        self.resume_at = inst;
        true
    }

    /// Cursor recorded by the last subpass yield, if any.
    pub fn resume_cursor(&self) -> Option<InstRef> {
        self.resume_at
    }

    /// Number of subpass runs performed so far.
    pub fn subpasses_run(&self) -> usize {
        self.subpasses_run
    }
}
