//! Graft IR: the mutable mid-level IR of the compiler.
//!
//! This crate provides the arena-based in-memory representation that
//! optimization passes inspect and rewrite: functions, basic blocks,
//! instructions, SSA values with use-chains, and CFG successor edges,
//! plus the [`builder::Builder`] / [`pass::PassContext`] mutation
//! protocol that keeps all of it mutually consistent under edits.
//!
//! Front-end lowering, type checking, and code generation live in other
//! crates; types cross into this one only as opaque interned handles.

// === IR storage and mutation ===
pub mod context;

// === IR infrastructure ===
pub mod builder;
pub mod inst;
pub mod location;
pub mod opcode;
pub mod pass;
pub mod printer;
pub mod refs;
pub mod registry;
pub mod symbol;
pub mod types;
pub mod verify;

pub use builder::Builder;
pub use context::{
    BlockArgData, BlockData, FunctionData, GlobalData, InstBuilder, InstData, IrContext, SuccData,
    UseData, ValueData,
};
pub use inst::InstView;
pub use location::{Location, Span};
pub use opcode::{BuiltinId, MemoryBehavior, Opcode};
pub use pass::{ChangeKind, ChangeSet, PassContext};
pub use refs::{
    BlockRef, FuncRef, GlobalRef, InstRef, PathRef, SuccRef, TypeRef, UseRef, ValueDef, ValueRef,
};
pub use registry::{
    EFFECTS_FLAG_DERIVED, EFFECTS_FLAG_ESCAPE, FunctionHooks, HookRegistry, ParseError,
};
pub use symbol::Symbol;
pub use types::{Attribute, TypeData, TypeDataBuilder, TypeInterner, TypeKind};

/// Small vector for operand and successor collections.
pub type RefVec<T> = smallvec::SmallVec<[T; 4]>;
