//! The closed opcode tag set and per-opcode structural classification.
//!
//! Opcodes carry structural shape only (terminator-ness, memory behavior,
//! refcounting-ness); instruction-specific *semantics* belong to external
//! collaborators. Memory behavior is computed here and nowhere else.

/// Tag identifying the kind of an instruction.
///
/// This is a closed set: narrow accessor views in [`crate::inst`] are
/// kind-checked against it, and the verifier rejects structural shapes an
/// opcode does not allow (e.g. successors on a non-terminator).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Literals and references
    IntegerLiteral,
    StringLiteral,
    FunctionRef,
    GlobalAddr,
    BuiltinCall,

    // Aggregate construction
    StructInit,
    TupleInit,
    EnumInit,

    // Aggregate projection
    TupleExtract,
    TupleElementAddr,
    StructExtract,
    StructElementAddr,
    RefElementAddr,
    ProjectBox,
    UncheckedEnumData,
    InitEnumDataAddr,
    UncheckedTakeEnumDataAddr,
    InjectEnumAddr,

    // Memory
    Load,
    Store,
    CopyAddr,
    AllocStack,
    AllocRef,
    DeallocStackRef,

    // Ownership and casts
    StrongRetain,
    StrongRelease,
    SetDeallocating,
    UncheckedRefCast,

    // Application
    Apply,
    BeginApply,
    PartialApply,

    // Checks
    CondFail,

    // Terminators
    Branch,
    CondBranch,
    SwitchEnum,
    TryApply,
    Return,
    Unreachable,
}

/// Declared memory behavior of an instruction, derived from its opcode.
///
/// This is the single authoritative classification; nothing else in the
/// crate re-derives or duplicates it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemoryBehavior {
    None,
    MayRead,
    MayWrite,
    MayReadWrite,
    MayHaveSideEffects,
}

impl Opcode {
    /// Printable mnemonic, used by the printer and debug descriptions.
    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            IntegerLiteral => "integer_literal",
            StringLiteral => "string_literal",
            FunctionRef => "function_ref",
            GlobalAddr => "global_addr",
            BuiltinCall => "builtin",
            StructInit => "struct",
            TupleInit => "tuple",
            EnumInit => "enum",
            TupleExtract => "tuple_extract",
            TupleElementAddr => "tuple_element_addr",
            StructExtract => "struct_extract",
            StructElementAddr => "struct_element_addr",
            RefElementAddr => "ref_element_addr",
            ProjectBox => "project_box",
            UncheckedEnumData => "unchecked_enum_data",
            InitEnumDataAddr => "init_enum_data_addr",
            UncheckedTakeEnumDataAddr => "unchecked_take_enum_data_addr",
            InjectEnumAddr => "inject_enum_addr",
            Load => "load",
            Store => "store",
            CopyAddr => "copy_addr",
            AllocStack => "alloc_stack",
            AllocRef => "alloc_ref",
            DeallocStackRef => "dealloc_stack_ref",
            StrongRetain => "strong_retain",
            StrongRelease => "strong_release",
            SetDeallocating => "set_deallocating",
            UncheckedRefCast => "unchecked_ref_cast",
            Apply => "apply",
            BeginApply => "begin_apply",
            PartialApply => "partial_apply",
            CondFail => "cond_fail",
            Branch => "br",
            CondBranch => "cond_br",
            SwitchEnum => "switch_enum",
            TryApply => "try_apply",
            Return => "return",
            Unreachable => "unreachable",
        }
    }

    /// Whether instructions of this opcode terminate their block and own
    /// successor edges.
    pub fn is_terminator(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            Branch | CondBranch | SwitchEnum | TryApply | Return | Unreachable
        )
    }

    /// Whether this is a reference-counting instruction carrying an
    /// atomicity flag.
    pub fn is_ref_counting(self) -> bool {
        use Opcode::*;
        matches!(self, StrongRetain | StrongRelease | SetDeallocating)
    }

    /// Declared memory behavior. Pure projections and literals are
    /// `None`; loads read, stores write, calls and runtime operations are
    /// conservatively side-effecting.
    pub fn memory_behavior(self) -> MemoryBehavior {
        use MemoryBehavior as MB;
        use Opcode::*;
        match self {
            IntegerLiteral | StringLiteral | FunctionRef | GlobalAddr => MB::None,
            StructInit | TupleInit | EnumInit => MB::None,
            TupleExtract | StructExtract | UncheckedEnumData => MB::None,
            TupleElementAddr | StructElementAddr | RefElementAddr | ProjectBox => MB::None,
            UncheckedRefCast => MB::None,
            AllocStack => MB::None,
            Load => MB::MayRead,
            UncheckedTakeEnumDataAddr => MB::MayRead,
            Store | InitEnumDataAddr | InjectEnumAddr => MB::MayWrite,
            CopyAddr => MB::MayReadWrite,
            BuiltinCall => MB::MayHaveSideEffects,
            AllocRef | DeallocStackRef => MB::MayHaveSideEffects,
            StrongRetain | StrongRelease | SetDeallocating => MB::MayHaveSideEffects,
            Apply | BeginApply | PartialApply | TryApply => MB::MayHaveSideEffects,
            CondFail => MB::MayHaveSideEffects,
            Branch | CondBranch | SwitchEnum | Return | Unreachable => MB::None,
        }
    }

    /// Whether executing this instruction may release a reference (and
    /// thereby run a deinitializer).
    pub fn may_release(self) -> bool {
        use Opcode::*;
        matches!(self, StrongRelease | Apply | BeginApply | TryApply)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

// ============================================================================
// Builtin identifiers
// ============================================================================

/// Declares the builtin identifier set in one place: enum variants, the
/// `name()` table, and `from_u32` stay in sync by construction.
macro_rules! builtin_ids {
    ($($id:ident = $discr:literal => $name:literal),* $(,)?) => {
        /// Identifier of a builtin operation referenced by a `builtin`
        /// instruction.
        ///
        /// The universe of identifiers is defined by the front-end's
        /// builtin catalog; this enum mirrors it. `Unknown` is reserved
        /// for identifiers this crate does not model.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum BuiltinId {
            $($id = $discr),*
        }

        impl BuiltinId {
            /// Catalog name of the builtin.
            pub fn name(self) -> &'static str {
                match self {
                    $(BuiltinId::$id => $name),*
                }
            }

            /// Decode a stored identifier; unknown discriminants map to
            /// `Unknown` rather than failing, since the catalog may grow.
            pub fn from_u32(raw: u32) -> Self {
                match raw {
                    $($discr => BuiltinId::$id,)*
                    _ => BuiltinId::Unknown,
                }
            }
        }
    };
}

builtin_ids! {
    Unknown = 0 => "unknown",
    Add = 1 => "add",
    Sub = 2 => "sub",
    Mul = 3 => "mul",
    SDiv = 4 => "sdiv",
    UDiv = 5 => "udiv",
    SRem = 6 => "srem",
    URem = 7 => "urem",
    And = 8 => "and",
    Or = 9 => "or",
    Xor = 10 => "xor",
    Shl = 11 => "shl",
    LShr = 12 => "lshr",
    AShr = 13 => "ashr",
    ICmpEq = 14 => "icmp_eq",
    ICmpNe = 15 => "icmp_ne",
    ICmpSlt = 16 => "icmp_slt",
    ICmpSle = 17 => "icmp_sle",
    ICmpSgt = 18 => "icmp_sgt",
    ICmpSge = 19 => "icmp_sge",
    SAddOver = 20 => "sadd_with_overflow",
    SSubOver = 21 => "ssub_with_overflow",
    SMulOver = 22 => "smul_with_overflow",
}
