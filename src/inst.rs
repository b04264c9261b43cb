//! Narrow, kind-checked accessor views over instructions.
//!
//! Each view is a thin wrapper over an `InstRef` of one specific opcode
//! (or opcode family), interpreting the instruction's generic
//! operand/attribute storage. `from_inst` is the checked downcast and
//! returns `None` on a kind mismatch; the raw attribute helpers panic,
//! since reading an attribute that an opcode does not carry is a pass
//! bug.

use crate::context::IrContext;
use crate::opcode::{BuiltinId, Opcode};
use crate::refs::{BlockRef, FuncRef, GlobalRef, InstRef, UseRef, ValueRef};
use crate::symbol::Symbol;
use crate::types::Attribute;

crate::symbols! {
    ATTR_VALUE => "value",
    ATTR_MESSAGE => "message",
    ATTR_BUILTIN_ID => "builtin_id",
    ATTR_GLOBAL => "global",
    ATTR_FUNCTION => "function",
    ATTR_FIELD_INDEX => "field_index",
    ATTR_CASE_INDEX => "case_index",
    ATTR_CASES => "cases",
    ATTR_ON_STACK => "on_stack",
    ATTR_FIRST_APPLIED_ARG => "first_applied_arg_index",
    ATTR_ATOMIC => "atomic",
    ATTR_OWNERSHIP => "ownership",
    ATTR_TAKE_OF_SRC => "take_of_src",
    ATTR_INIT_OF_DEST => "init_of_dest",
    ATTR_FOREIGN => "foreign",
    ATTR_CAN_ALLOC_ON_STACK => "can_alloc_on_stack",
    ATTR_TRUE_ARG_COUNT => "true_arg_count",
}

/// Checked downcast from a generic instruction to an opcode-specific view.
pub trait InstView: Sized + Copy {
    const OPCODE: Opcode;

    /// Downcast; `None` if the instruction has a different opcode.
    fn from_inst(ctx: &IrContext, inst: InstRef) -> Option<Self>;

    /// The wrapped instruction.
    fn inst(self) -> InstRef;

    fn matches(ctx: &IrContext, inst: InstRef) -> bool {
        ctx.inst_opcode(inst) == Self::OPCODE
    }
}

// ============================================================================
// Attribute helpers
// ============================================================================

fn attr<'a>(ctx: &'a IrContext, inst: InstRef, key: Symbol) -> &'a Attribute {
    ctx.inst(inst).attributes.get(&key).unwrap_or_else(|| {
        panic!(
            "{}: missing attribute `{key}` on {inst}",
            ctx.inst_opcode(inst),
        )
    })
}

fn int_attr(ctx: &IrContext, inst: InstRef, key: Symbol) -> u64 {
    match attr(ctx, inst, key) {
        Attribute::IntBits(v) => *v,
        other => panic!(
            "{}: attribute `{key}` on {inst} is not an integer: {other:?}",
            ctx.inst_opcode(inst),
        ),
    }
}

fn bool_attr(ctx: &IrContext, inst: InstRef, key: Symbol) -> bool {
    match attr(ctx, inst, key) {
        Attribute::Bool(v) => *v,
        other => panic!(
            "{}: attribute `{key}` on {inst} is not a bool: {other:?}",
            ctx.inst_opcode(inst),
        ),
    }
}

fn string_attr(ctx: &IrContext, inst: InstRef, key: Symbol) -> String {
    match attr(ctx, inst, key) {
        Attribute::String(v) => v.clone(),
        other => panic!(
            "{}: attribute `{key}` on {inst} is not a string: {other:?}",
            ctx.inst_opcode(inst),
        ),
    }
}

/// Number of real (non-type-dependent) applied arguments of an apply
/// family instruction; the callee occupies operand slot 0.
fn applied_argument_count(ctx: &IrContext, inst: InstRef) -> usize {
    let real = ctx
        .inst_operands(inst)
        .iter()
        .filter(|&&u| !ctx.use_is_type_dependent(u))
        .count();
    real - 1
}

fn operand_value(ctx: &IrContext, inst: InstRef, index: usize) -> ValueRef {
    ctx.use_value(ctx.inst_operand(inst, index))
}

// ============================================================================
// View declarations
// ============================================================================

/// Declares one wrapper struct per opcode and wires up the checked
/// downcast.
macro_rules! inst_views {
    ($($(#[$m:meta])* $name:ident => $opcode:ident),* $(,)?) => {$(
        $(#[$m])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name(InstRef);

        impl InstView for $name {
            const OPCODE: Opcode = Opcode::$opcode;

            fn from_inst(ctx: &IrContext, inst: InstRef) -> Option<Self> {
                Self::matches(ctx, inst).then_some(Self(inst))
            }

            fn inst(self) -> InstRef {
                self.0
            }
        }
    )*};
}

inst_views! {
    /// Integer literal; carries the value as an attribute.
    IntegerLiteral => IntegerLiteral,
    /// String literal.
    StringLiteral => StringLiteral,
    /// Reference to a function in the same module.
    FunctionRefInst => FunctionRef,
    /// Address of a global variable.
    GlobalAddr => GlobalAddr,
    /// Call of a builtin operation.
    BuiltinCall => BuiltinCall,
    /// Struct construction from field values.
    StructInit => StructInit,
    /// Enum construction with a case tag and optional payload.
    EnumInit => EnumInit,
    /// Value projection out of a tuple.
    TupleExtract => TupleExtract,
    /// Address projection into a tuple.
    TupleElementAddr => TupleElementAddr,
    /// Value projection out of a struct.
    StructExtract => StructExtract,
    /// Address projection into a struct.
    StructElementAddr => StructElementAddr,
    /// Address projection into a class instance field.
    RefElementAddr => RefElementAddr,
    /// Address projection into a box.
    ProjectBox => ProjectBox,
    /// Payload extraction from an enum value.
    UncheckedEnumData => UncheckedEnumData,
    /// Address of an enum payload being initialized.
    InitEnumDataAddr => InitEnumDataAddr,
    /// Payload take from an enum address.
    UncheckedTakeEnumDataAddr => UncheckedTakeEnumDataAddr,
    /// Writes a case tag into an enum address.
    InjectEnumAddr => InjectEnumAddr,
    /// Heap allocation of a class instance.
    AllocRef => AllocRef,
    /// Function application.
    Apply => Apply,
    /// Coroutine application; multi-result (token plus yields).
    BeginApply => BeginApply,
    /// Partial application; captures trailing callee arguments.
    PartialApply => PartialApply,
    /// Runtime trap with a message when the condition is true.
    CondFail => CondFail,
    /// Memory load.
    Load => Load,
    /// Memory store.
    Store => Store,
    /// Address-to-address copy.
    CopyAddr => CopyAddr,
    /// Unconditional branch.
    Branch => Branch,
    /// Two-way conditional branch.
    CondBranch => CondBranch,
    /// Multi-way branch over enum cases.
    SwitchEnum => SwitchEnum,
    /// Application with normal and error successors.
    TryApply => TryApply,
}

/// Generates the shared `field_index` accessor for field-projection views.
macro_rules! field_index_accessor {
    ($($name:ident),* $(,)?) => {$(
        impl $name {
            /// Index of the projected field.
            pub fn field_index(self, ctx: &IrContext) -> usize {
                int_attr(ctx, self.0, ATTR_FIELD_INDEX()) as usize
            }
        }
    )*};
}

field_index_accessor!(
    TupleExtract,
    TupleElementAddr,
    StructExtract,
    StructElementAddr,
    RefElementAddr,
    ProjectBox,
);

/// Generates the shared `case_index` accessor for enum-case views.
macro_rules! case_index_accessor {
    ($($name:ident),* $(,)?) => {$(
        impl $name {
            /// Index of the enum case this instruction addresses.
            pub fn case_index(self, ctx: &IrContext) -> usize {
                int_attr(ctx, self.0, ATTR_CASE_INDEX()) as usize
            }
        }
    )*};
}

case_index_accessor!(
    EnumInit,
    UncheckedEnumData,
    InitEnumDataAddr,
    UncheckedTakeEnumDataAddr,
    InjectEnumAddr,
);

// ============================================================================
// Per-view accessors
// ============================================================================

impl IntegerLiteral {
    pub fn value(self, ctx: &IrContext) -> i64 {
        i64::from_ne_bytes(int_attr(ctx, self.0, ATTR_VALUE()).to_ne_bytes())
    }
}

impl StringLiteral {
    pub fn value(self, ctx: &IrContext) -> String {
        string_attr(ctx, self.0, ATTR_VALUE())
    }
}

impl FunctionRefInst {
    pub fn referenced_function(self, ctx: &IrContext) -> FuncRef {
        match attr(ctx, self.0, ATTR_FUNCTION()) {
            Attribute::Function(f) => *f,
            other => panic!("function_ref: bad function attribute: {other:?}"),
        }
    }
}

impl GlobalAddr {
    pub fn global(self, ctx: &IrContext) -> GlobalRef {
        match attr(ctx, self.0, ATTR_GLOBAL()) {
            Attribute::Global(g) => *g,
            other => panic!("global_addr: bad global attribute: {other:?}"),
        }
    }
}

impl BuiltinCall {
    pub fn builtin_id(self, ctx: &IrContext) -> BuiltinId {
        BuiltinId::from_u32(int_attr(ctx, self.0, ATTR_BUILTIN_ID()) as u32)
    }
}

impl StructInit {
    /// The single operand whose type is non-trivial, if there is exactly
    /// one. Ownership passes use this to treat the struct as a wrapper
    /// around that field.
    pub fn unique_non_trivial_field_value(self, ctx: &IrContext) -> Option<ValueRef> {
        let mut found = None;
        for &u in ctx.inst_operands(self.0) {
            let v = ctx.use_value(u);
            if !ctx.types.is_trivial(ctx.value_ty(v)) {
                if found.is_some() {
                    return None;
                }
                found = Some(v);
            }
        }
        found
    }
}

impl CondFail {
    pub fn condition(self, ctx: &IrContext) -> ValueRef {
        operand_value(ctx, self.0, 0)
    }

    /// Trap message; owned, like all diagnostic strings in this crate.
    pub fn message(self, ctx: &IrContext) -> String {
        string_attr(ctx, self.0, ATTR_MESSAGE())
    }
}

impl Apply {
    pub fn callee(self, ctx: &IrContext) -> ValueRef {
        operand_value(ctx, self.0, 0)
    }

    pub fn num_arguments(self, ctx: &IrContext) -> usize {
        applied_argument_count(ctx, self.0)
    }
}

impl BeginApply {
    pub fn callee(self, ctx: &IrContext) -> ValueRef {
        operand_value(ctx, self.0, 0)
    }

    pub fn num_arguments(self, ctx: &IrContext) -> usize {
        applied_argument_count(ctx, self.0)
    }
}

impl TryApply {
    pub fn callee(self, ctx: &IrContext) -> ValueRef {
        operand_value(ctx, self.0, 0)
    }

    pub fn num_arguments(self, ctx: &IrContext) -> usize {
        applied_argument_count(ctx, self.0)
    }

    pub fn normal_block(self, ctx: &IrContext) -> BlockRef {
        ctx.succ_target(ctx.inst_successors(self.0)[0])
    }

    pub fn error_block(self, ctx: &IrContext) -> BlockRef {
        ctx.succ_target(ctx.inst_successors(self.0)[1])
    }
}

impl PartialApply {
    pub fn callee(self, ctx: &IrContext) -> ValueRef {
        operand_value(ctx, self.0, 0)
    }

    pub fn num_arguments(self, ctx: &IrContext) -> usize {
        applied_argument_count(ctx, self.0)
    }

    pub fn is_on_stack(self, ctx: &IrContext) -> bool {
        bool_attr(ctx, self.0, ATTR_ON_STACK())
    }

    /// Callee argument index the first applied argument binds to; the
    /// applied arguments occupy the callee's trailing parameter slots.
    pub fn callee_arg_index_of_first_applied_arg(self, ctx: &IrContext) -> usize {
        int_attr(ctx, self.0, ATTR_FIRST_APPLIED_ARG()) as usize
    }
}

impl AllocRef {
    /// Whether the instance is allocated through the foreign runtime.
    pub fn is_foreign(self, ctx: &IrContext) -> bool {
        bool_attr(ctx, self.0, ATTR_FOREIGN())
    }

    pub fn can_alloc_on_stack(self, ctx: &IrContext) -> bool {
        bool_attr(ctx, self.0, ATTR_CAN_ALLOC_ON_STACK())
    }
}

impl Branch {
    pub fn target_block(self, ctx: &IrContext) -> BlockRef {
        ctx.succ_target(ctx.inst_successors(self.0)[0])
    }
}

impl CondBranch {
    pub fn condition(self, ctx: &IrContext) -> ValueRef {
        operand_value(ctx, self.0, 0)
    }

    pub fn true_block(self, ctx: &IrContext) -> BlockRef {
        ctx.succ_target(ctx.inst_successors(self.0)[0])
    }

    pub fn false_block(self, ctx: &IrContext) -> BlockRef {
        ctx.succ_target(ctx.inst_successors(self.0)[1])
    }

    /// Number of operands forwarded to the true successor's block
    /// arguments; the remainder (after the condition) goes to the false
    /// successor.
    pub fn num_true_args(self, ctx: &IrContext) -> usize {
        int_attr(ctx, self.0, ATTR_TRUE_ARG_COUNT()) as usize
    }
}

impl SwitchEnum {
    pub fn enum_operand(self, ctx: &IrContext) -> ValueRef {
        operand_value(ctx, self.0, 0)
    }

    /// Number of dispatched cases (successors carrying a case tag).
    pub fn num_cases(self, ctx: &IrContext) -> usize {
        match attr(ctx, self.0, ATTR_CASES()) {
            Attribute::List(cases) => cases.len(),
            other => panic!("switch_enum: bad cases attribute: {other:?}"),
        }
    }

    /// Case tag dispatched to successor `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn case_index(self, ctx: &IrContext, index: usize) -> usize {
        match attr(ctx, self.0, ATTR_CASES()) {
            Attribute::List(cases) => match cases.get(index) {
                Some(Attribute::IntBits(tag)) => *tag as usize,
                Some(other) => panic!("switch_enum: bad case entry #{index}: {other:?}"),
                None => panic!(
                    "switch_enum: {} case(s), no #{index}",
                    cases.len(),
                ),
            },
            other => panic!("switch_enum: bad cases attribute: {other:?}"),
        }
    }
}

/// Ownership qualifier of a `store`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StoreOwnership {
    Unqualified = 0,
    Initialize = 1,
    Assign = 2,
    Trivial = 3,
}

impl StoreOwnership {
    fn from_u64(raw: u64) -> Self {
        match raw {
            0 => StoreOwnership::Unqualified,
            1 => StoreOwnership::Initialize,
            2 => StoreOwnership::Assign,
            3 => StoreOwnership::Trivial,
            _ => panic!("store: invalid ownership qualifier {raw}"),
        }
    }
}

impl Store {
    pub fn source(self, ctx: &IrContext) -> ValueRef {
        operand_value(ctx, self.0, 0)
    }

    pub fn dest(self, ctx: &IrContext) -> ValueRef {
        operand_value(ctx, self.0, 1)
    }

    pub fn ownership(self, ctx: &IrContext) -> StoreOwnership {
        StoreOwnership::from_u64(int_attr(ctx, self.0, ATTR_OWNERSHIP()))
    }
}

impl Load {
    pub fn address(self, ctx: &IrContext) -> ValueRef {
        operand_value(ctx, self.0, 0)
    }
}

impl CopyAddr {
    pub fn source(self, ctx: &IrContext) -> ValueRef {
        operand_value(ctx, self.0, 0)
    }

    pub fn dest(self, ctx: &IrContext) -> ValueRef {
        operand_value(ctx, self.0, 1)
    }

    pub fn is_take_of_src(self, ctx: &IrContext) -> bool {
        bool_attr(ctx, self.0, ATTR_TAKE_OF_SRC())
    }

    pub fn is_initialization_of_dest(self, ctx: &IrContext) -> bool {
        bool_attr(ctx, self.0, ATTR_INIT_OF_DEST())
    }
}

// ============================================================================
// Reference counting (opcode family view)
// ============================================================================

/// View over any reference-counting instruction (`strong_retain`,
/// `strong_release`, `set_deallocating`). These carry an atomicity flag
/// that optimization passes may clear when the object is thread-local.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefCounting(InstRef);

impl RefCounting {
    /// Downcast; `None` if the opcode is not a reference-counting one.
    pub fn from_inst(ctx: &IrContext, inst: InstRef) -> Option<Self> {
        ctx.inst_opcode(inst).is_ref_counting().then_some(Self(inst))
    }

    pub fn inst(self) -> InstRef {
        self.0
    }

    pub fn operand(self, ctx: &IrContext) -> ValueRef {
        operand_value(ctx, self.0, 0)
    }

    pub fn is_atomic(self, ctx: &IrContext) -> bool {
        bool_attr(ctx, self.0, ATTR_ATOMIC())
    }

    pub fn set_is_atomic(self, ctx: &mut IrContext, atomic: bool) {
        ctx.inst_mut(self.0)
            .attributes
            .insert(ATTR_ATOMIC(), Attribute::Bool(atomic));
    }
}

/// Operands a dataflow pass should consider: skips type-dependent edges.
pub fn dataflow_operands<'a>(
    ctx: &'a IrContext,
    inst: InstRef,
) -> impl Iterator<Item = UseRef> + 'a {
    ctx.inst_operands(inst)
        .iter()
        .copied()
        .filter(move |&u| !ctx.use_is_type_dependent(u))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{InstBuilder, IrContext};
    use crate::location::{Location, Span};
    use crate::refs::TypeRef;
    use crate::types::{TypeDataBuilder, TypeKind};

    fn test_location(ctx: &mut IrContext) -> Location {
        let path = ctx.paths.intern("file:///test.gr".to_owned());
        Location::new(path, Span::new(0, 0))
    }

    fn i64_type(ctx: &mut IrContext) -> TypeRef {
        ctx.types
            .intern(TypeDataBuilder::new(Symbol::new("i64"), TypeKind::Primitive).build())
    }

    fn literal(ctx: &mut IrContext, loc: Location, ty: TypeRef, value: i64) -> ValueRef {
        let inst = InstBuilder::new(Opcode::IntegerLiteral, loc)
            .result(ty)
            .attr(ATTR_VALUE(), value)
            .build(ctx);
        ctx.result(inst, 0)
    }

    #[test]
    fn integer_literal_view() {
        let mut ctx = IrContext::new();
        let loc = test_location(&mut ctx);
        let i64_ty = i64_type(&mut ctx);

        let inst = InstBuilder::new(Opcode::IntegerLiteral, loc)
            .result(i64_ty)
            .attr(ATTR_VALUE(), -7i64)
            .build(&mut ctx);

        let lit = IntegerLiteral::from_inst(&ctx, inst).unwrap();
        assert_eq!(lit.value(&ctx), -7);
        // wrong-kind downcast is a recoverable absence
        assert!(CondFail::from_inst(&ctx, inst).is_none());
    }

    #[test]
    #[should_panic(expected = "missing attribute")]
    fn missing_attribute_is_fatal() {
        let mut ctx = IrContext::new();
        let loc = test_location(&mut ctx);
        let i64_ty = i64_type(&mut ctx);

        let inst = InstBuilder::new(Opcode::IntegerLiteral, loc)
            .result(i64_ty)
            .build(&mut ctx);
        let lit = IntegerLiteral::from_inst(&ctx, inst).unwrap();
        lit.value(&ctx);
    }

    #[test]
    fn field_and_case_projections() {
        let mut ctx = IrContext::new();
        let loc = test_location(&mut ctx);
        let i64_ty = i64_type(&mut ctx);
        let v = literal(&mut ctx, loc, i64_ty, 0);

        let extract = InstBuilder::new(Opcode::StructExtract, loc)
            .operand(v)
            .result(i64_ty)
            .attr(ATTR_FIELD_INDEX(), 3u64)
            .build(&mut ctx);
        let view = StructExtract::from_inst(&ctx, extract).unwrap();
        assert_eq!(view.field_index(&ctx), 3);

        let inject = InstBuilder::new(Opcode::InjectEnumAddr, loc)
            .operand(v)
            .attr(ATTR_CASE_INDEX(), 1u64)
            .build(&mut ctx);
        let view = InjectEnumAddr::from_inst(&ctx, inject).unwrap();
        assert_eq!(view.case_index(&ctx), 1);
    }

    #[test]
    fn switch_enum_case_round_trip() {
        let mut ctx = IrContext::new();
        let loc = test_location(&mut ctx);
        let i64_ty = i64_type(&mut ctx);
        let v = literal(&mut ctx, loc, i64_ty, 0);

        let b0 = ctx.create_block(loc, vec![]);
        let b1 = ctx.create_block(loc, vec![]);
        let b2 = ctx.create_block(loc, vec![]);

        // case tags deliberately out of successor order
        let sw = InstBuilder::new(Opcode::SwitchEnum, loc)
            .operand(v)
            .successor(b0)
            .successor(b1)
            .successor(b2)
            .attr(
                ATTR_CASES(),
                vec![
                    Attribute::IntBits(2),
                    Attribute::IntBits(0),
                    Attribute::IntBits(1),
                ],
            )
            .build(&mut ctx);

        let view = SwitchEnum::from_inst(&ctx, sw).unwrap();
        assert_eq!(view.num_cases(&ctx), 3);
        let tags: Vec<usize> = (0..3).map(|i| view.case_index(&ctx, i)).collect();
        assert_eq!(tags, vec![2, 0, 1]);
        // indices map to distinct previously-specified tags
        let mut sorted = tags.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);
        assert_eq!(view.enum_operand(&ctx), v);
    }

    #[test]
    #[should_panic(expected = "no #5")]
    fn switch_enum_case_out_of_range_panics() {
        let mut ctx = IrContext::new();
        let loc = test_location(&mut ctx);
        let i64_ty = i64_type(&mut ctx);
        let v = literal(&mut ctx, loc, i64_ty, 0);
        let b0 = ctx.create_block(loc, vec![]);

        let sw = InstBuilder::new(Opcode::SwitchEnum, loc)
            .operand(v)
            .successor(b0)
            .attr(ATTR_CASES(), vec![Attribute::IntBits(0)])
            .build(&mut ctx);
        SwitchEnum::from_inst(&ctx, sw).unwrap().case_index(&ctx, 5);
    }

    #[test]
    fn apply_argument_bookkeeping() {
        let mut ctx = IrContext::new();
        let loc = test_location(&mut ctx);
        let i64_ty = i64_type(&mut ctx);

        let callee = literal(&mut ctx, loc, i64_ty, 0);
        let a = literal(&mut ctx, loc, i64_ty, 1);
        let b = literal(&mut ctx, loc, i64_ty, 2);

        let apply = InstBuilder::new(Opcode::Apply, loc)
            .operand(callee)
            .operand(a)
            .operand(b)
            .type_dependent_operand(a)
            .result(i64_ty)
            .build(&mut ctx);

        let view = Apply::from_inst(&ctx, apply).unwrap();
        assert_eq!(view.callee(&ctx), callee);
        // type-dependent operand does not count as an argument
        assert_eq!(view.num_arguments(&ctx), 2);
        assert_eq!(dataflow_operands(&ctx, apply).count(), 3);
    }

    #[test]
    fn partial_apply_bookkeeping() {
        let mut ctx = IrContext::new();
        let loc = test_location(&mut ctx);
        let i64_ty = i64_type(&mut ctx);

        let callee = literal(&mut ctx, loc, i64_ty, 0);
        let captured = literal(&mut ctx, loc, i64_ty, 9);

        let pa = InstBuilder::new(Opcode::PartialApply, loc)
            .operand(callee)
            .operand(captured)
            .result(i64_ty)
            .attr(ATTR_ON_STACK(), true)
            .attr(ATTR_FIRST_APPLIED_ARG(), 2u64)
            .build(&mut ctx);

        let view = PartialApply::from_inst(&ctx, pa).unwrap();
        assert_eq!(view.num_arguments(&ctx), 1);
        assert!(view.is_on_stack(&ctx));
        assert_eq!(view.callee_arg_index_of_first_applied_arg(&ctx), 2);
    }

    #[test]
    fn ref_counting_atomicity() {
        let mut ctx = IrContext::new();
        let loc = test_location(&mut ctx);
        let i64_ty = i64_type(&mut ctx);
        let v = literal(&mut ctx, loc, i64_ty, 0);

        let retain = InstBuilder::new(Opcode::StrongRetain, loc)
            .operand(v)
            .attr(ATTR_ATOMIC(), true)
            .build(&mut ctx);

        let rc = RefCounting::from_inst(&ctx, retain).unwrap();
        assert!(rc.is_atomic(&ctx));
        rc.set_is_atomic(&mut ctx, false);
        assert!(!rc.is_atomic(&ctx));

        // load is not a refcounting instruction
        let load = InstBuilder::new(Opcode::Load, loc)
            .operand(v)
            .result(i64_ty)
            .build(&mut ctx);
        assert!(RefCounting::from_inst(&ctx, load).is_none());
    }

    #[test]
    fn struct_unique_non_trivial_field() {
        let mut ctx = IrContext::new();
        let loc = test_location(&mut ctx);
        let i64_ty = i64_type(&mut ctx);
        let boxed = ctx.types.intern(
            TypeDataBuilder::new(Symbol::new("Box"), TypeKind::Class)
                .reference_counted()
                .build(),
        );

        let trivial = literal(&mut ctx, loc, i64_ty, 1);
        let managed_inst = InstBuilder::new(Opcode::AllocRef, loc)
            .result(boxed)
            .attr(ATTR_FOREIGN(), false)
            .attr(ATTR_CAN_ALLOC_ON_STACK(), false)
            .build(&mut ctx);
        let managed = ctx.result(managed_inst, 0);

        let one = InstBuilder::new(Opcode::StructInit, loc)
            .operand(trivial)
            .operand(managed)
            .result(i64_ty)
            .build(&mut ctx);
        let view = StructInit::from_inst(&ctx, one).unwrap();
        assert_eq!(view.unique_non_trivial_field_value(&ctx), Some(managed));

        let two = InstBuilder::new(Opcode::StructInit, loc)
            .operand(managed)
            .operand(managed)
            .result(i64_ty)
            .build(&mut ctx);
        let view = StructInit::from_inst(&ctx, two).unwrap();
        assert_eq!(view.unique_non_trivial_field_value(&ctx), None);

        let none = InstBuilder::new(Opcode::StructInit, loc)
            .operand(trivial)
            .result(i64_ty)
            .build(&mut ctx);
        let view = StructInit::from_inst(&ctx, none).unwrap();
        assert_eq!(view.unique_non_trivial_field_value(&ctx), None);
    }

    #[test]
    fn cond_branch_views() {
        let mut ctx = IrContext::new();
        let loc = test_location(&mut ctx);
        let i64_ty = i64_type(&mut ctx);
        let cond = literal(&mut ctx, loc, i64_ty, 1);
        let arg = literal(&mut ctx, loc, i64_ty, 5);

        let t = ctx.create_block(loc, vec![]);
        let f = ctx.create_block(loc, vec![]);

        let cbr = InstBuilder::new(Opcode::CondBranch, loc)
            .operand(cond)
            .operand(arg)
            .successor(t)
            .successor(f)
            .attr(ATTR_TRUE_ARG_COUNT(), 1u64)
            .build(&mut ctx);

        let view = CondBranch::from_inst(&ctx, cbr).unwrap();
        assert_eq!(view.condition(&ctx), cond);
        assert_eq!(view.true_block(&ctx), t);
        assert_eq!(view.false_block(&ctx), f);
        assert_eq!(view.num_true_args(&ctx), 1);
    }

    #[test]
    fn store_and_copy_addr_flags() {
        let mut ctx = IrContext::new();
        let loc = test_location(&mut ctx);
        let i64_ty = i64_type(&mut ctx);
        let addr_ty = ctx.types.address_of(i64_ty);

        let v = literal(&mut ctx, loc, i64_ty, 1);
        let slot_inst = InstBuilder::new(Opcode::AllocStack, loc)
            .result(addr_ty)
            .build(&mut ctx);
        let slot = ctx.result(slot_inst, 0);

        let store = InstBuilder::new(Opcode::Store, loc)
            .operand(v)
            .operand(slot)
            .attr(ATTR_OWNERSHIP(), StoreOwnership::Initialize as u64)
            .build(&mut ctx);
        let view = Store::from_inst(&ctx, store).unwrap();
        assert_eq!(view.source(&ctx), v);
        assert_eq!(view.dest(&ctx), slot);
        assert_eq!(view.ownership(&ctx), StoreOwnership::Initialize);

        let copy = InstBuilder::new(Opcode::CopyAddr, loc)
            .operand(slot)
            .operand(slot)
            .attr(ATTR_TAKE_OF_SRC(), true)
            .attr(ATTR_INIT_OF_DEST(), false)
            .build(&mut ctx);
        let view = CopyAddr::from_inst(&ctx, copy).unwrap();
        assert!(view.is_take_of_src(&ctx));
        assert!(!view.is_initialization_of_dest(&ctx));
    }
}
