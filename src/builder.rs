//! Cursor-based instruction construction.
//!
//! A [`Builder`] captures an insertion point; every `create_*` call
//! allocates a new instruction, links its operand edges into the used
//! values' use-lists, and inserts it immediately before the insertion
//! point in that instruction's block. Consecutive creates therefore
//! appear in call order.
//!
//! The builder guarantees structural consistency only. It does not check
//! opcode-level semantic correctness (type agreement, argument counts
//! against a callee signature); that is the caller's responsibility.

use crate::context::{InstBuilder, IrContext};
use crate::inst::{
    ATTR_ATOMIC, ATTR_BUILTIN_ID, ATTR_FUNCTION, ATTR_MESSAGE, ATTR_VALUE,
};
use crate::location::Location;
use crate::opcode::{BuiltinId, Opcode};
use crate::refs::{BlockRef, FuncRef, InstRef, TypeRef, ValueRef};
use crate::types::Attribute;

/// Inserts newly created instructions before a fixed cursor instruction.
pub struct Builder<'a> {
    ctx: &'a mut IrContext,
    before: InstRef,
}

impl<'a> Builder<'a> {
    /// Create a builder inserting before `insertion_point`.
    ///
    /// # Panics
    ///
    /// Panics if the insertion point is not attached to a block.
    pub fn before(ctx: &'a mut IrContext, insertion_point: InstRef) -> Self {
        assert!(
            ctx.inst_parent(insertion_point).is_some(),
            "Builder::before: insertion point {insertion_point} is detached",
        );
        Self {
            ctx,
            before: insertion_point,
        }
    }

    /// The context being built into.
    pub fn ctx(&mut self) -> &mut IrContext {
        self.ctx
    }

    fn insert(&mut self, b: InstBuilder) -> InstRef {
        let inst = self.ctx.create_inst(b);
        self.ctx.insert_inst_before(self.before, inst);
        inst
    }

    pub fn create_integer_literal(
        &mut self,
        loc: Location,
        ty: TypeRef,
        value: i64,
    ) -> InstRef {
        self.insert(
            InstBuilder::new(Opcode::IntegerLiteral, loc)
                .result(ty)
                .attr(ATTR_VALUE(), value),
        )
    }

    pub fn create_string_literal(&mut self, loc: Location, ty: TypeRef, value: &str) -> InstRef {
        self.insert(
            InstBuilder::new(Opcode::StringLiteral, loc)
                .result(ty)
                .attr(ATTR_VALUE(), value),
        )
    }

    pub fn create_cond_fail(
        &mut self,
        loc: Location,
        condition: ValueRef,
        message: &str,
    ) -> InstRef {
        self.insert(
            InstBuilder::new(Opcode::CondFail, loc)
                .operand(condition)
                .attr(ATTR_MESSAGE(), message),
        )
    }

    pub fn create_builtin_binary(
        &mut self,
        loc: Location,
        id: BuiltinId,
        result_ty: TypeRef,
        lhs: ValueRef,
        rhs: ValueRef,
    ) -> InstRef {
        self.insert(
            InstBuilder::new(Opcode::BuiltinCall, loc)
                .operand(lhs)
                .operand(rhs)
                .result(result_ty)
                .attr(ATTR_BUILTIN_ID(), id as u32 as u64),
        )
    }

    pub fn create_function_ref(&mut self, loc: Location, func: FuncRef, ty: TypeRef) -> InstRef {
        self.insert(
            InstBuilder::new(Opcode::FunctionRef, loc)
                .result(ty)
                .attr(ATTR_FUNCTION(), Attribute::Function(func)),
        )
    }

    pub fn create_apply(
        &mut self,
        loc: Location,
        callee: ValueRef,
        args: &[ValueRef],
        result_ty: TypeRef,
    ) -> InstRef {
        self.insert(
            InstBuilder::new(Opcode::Apply, loc)
                .operand(callee)
                .operands(args.iter().copied())
                .result(result_ty),
        )
    }

    pub fn create_dealloc_stack_ref(&mut self, loc: Location, operand: ValueRef) -> InstRef {
        self.insert(InstBuilder::new(Opcode::DeallocStackRef, loc).operand(operand))
    }

    pub fn create_unchecked_ref_cast(
        &mut self,
        loc: Location,
        operand: ValueRef,
        ty: TypeRef,
    ) -> InstRef {
        self.insert(
            InstBuilder::new(Opcode::UncheckedRefCast, loc)
                .operand(operand)
                .result(ty),
        )
    }

    pub fn create_set_deallocating(
        &mut self,
        loc: Location,
        operand: ValueRef,
        is_atomic: bool,
    ) -> InstRef {
        self.insert(
            InstBuilder::new(Opcode::SetDeallocating, loc)
                .operand(operand)
                .attr(ATTR_ATOMIC(), is_atomic),
        )
    }

    pub fn create_branch(
        &mut self,
        loc: Location,
        target: BlockRef,
        args: &[ValueRef],
    ) -> InstRef {
        self.insert(
            InstBuilder::new(Opcode::Branch, loc)
                .operands(args.iter().copied())
                .successor(target),
        )
    }
}
