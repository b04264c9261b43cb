//! Entity references for the arena-based IR.
//!
//! Each ref type is a thin `u32` wrapper providing type-safe indexing
//! into `PrimaryMap` storage in `IrContext`. Refs are `Copy` and carry
//! no ownership; holding one does not keep the node alive in any sense
//! beyond the arena itself.

use cranelift_entity::entity_impl;
use std::fmt;

/// Reference to a function in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncRef(u32);
entity_impl!(FuncRef, "f");

/// Reference to a global variable in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalRef(u32);
entity_impl!(GlobalRef, "g");

/// Reference to a basic block in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockRef(u32);
entity_impl!(BlockRef, "bb");

/// Reference to an instruction in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstRef(u32);
entity_impl!(InstRef, "inst");

/// Reference to an SSA value in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueRef(u32);
entity_impl!(ValueRef, "v");

/// Reference to an operand edge (a use of a value by an instruction).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UseRef(u32);
entity_impl!(UseRef, "use");

/// Reference to a CFG successor edge owned by a terminator instruction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuccRef(u32);
entity_impl!(SuccRef, "succ");

/// Reference to an interned type descriptor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(u32);
entity_impl!(TypeRef, "ty");

/// Reference to an interned path string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathRef(u32);
entity_impl!(PathRef, "path");

/// Where a value is defined: either an instruction result or a block argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueDef {
    /// Result of an instruction at the given index.
    InstResult(InstRef, u32),
    /// Block argument at the given index.
    BlockArg(BlockRef, u32),
}

impl fmt::Display for ValueDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueDef::InstResult(inst, idx) => write!(f, "{}#{}", inst, idx),
            ValueDef::BlockArg(block, idx) => write!(f, "{}#{}", block, idx),
        }
    }
}
