//! IrContext: arena-based mutable IR storage.
//!
//! All IR entities (functions, globals, blocks, instructions, values,
//! operand edges, successor edges) are stored in `PrimaryMap`s owned by
//! `IrContext`, which doubles as the module/program container. Ordered
//! structures (blocks in a function, instructions in a block, use-lists,
//! predecessor lists) are intrusive doubly-linked lists whose link fields
//! are private; callers navigate through `Option`-returning accessors and
//! iterators, never through raw links.
//!
//! Every mutation keeps the use-chains and CFG edges consistent with the
//! edit itself; there is no deferred fixup step.

use std::any::Any;
use std::collections::BTreeMap;

use cranelift_entity::PrimaryMap;
use smallvec::SmallVec;
use tracing::trace;

use crate::location::Location;
use crate::opcode::{MemoryBehavior, Opcode};
use crate::refs::*;
use crate::symbol::Symbol;
use crate::types::{Attribute, PathInterner, TypeInterner};

// ============================================================================
// Entity data types
// ============================================================================

/// Data for a single function.
///
/// Block insertion goes through [`IrContext::append_block`]; the list
/// links are not exposed.
pub struct FunctionData {
    pub name: Symbol,
    pub location: Location,
    pub arg_types: SmallVec<[TypeRef; 4]>,
    pub result_type: TypeRef,
    /// How many leading arguments are indirect-result slots under the
    /// calling convention.
    pub num_indirect_result_arguments: u32,
    /// Index of the self argument, if the convention has one.
    pub self_argument_index: Option<u32>,
    /// Whether the v2 runtime feature gate is satisfied for this function.
    pub runtime_v2_available: bool,
    pub(crate) first_block: Option<BlockRef>,
    pub(crate) last_block: Option<BlockRef>,
    /// Opaque per-function extension slot, managed by registered hooks.
    pub(crate) ext: Option<Box<dyn Any + Send>>,
}

impl FunctionData {
    pub fn new(
        name: Symbol,
        location: Location,
        arg_types: impl IntoIterator<Item = TypeRef>,
        result_type: TypeRef,
    ) -> Self {
        Self {
            name,
            location,
            arg_types: SmallVec::from_iter(arg_types),
            result_type,
            num_indirect_result_arguments: 0,
            self_argument_index: None,
            runtime_v2_available: false,
            first_block: None,
            last_block: None,
            ext: None,
        }
    }
}

/// Data for a global variable.
pub struct GlobalData {
    pub name: Symbol,
    pub ty: TypeRef,
}

/// Declared shape of one block argument.
#[derive(Clone, Copy, Debug)]
pub struct BlockArgData {
    pub ty: TypeRef,
    /// Calling-convention classification: exclusively referenced
    /// indirect parameter.
    pub exclusive_indirect: bool,
}

impl BlockArgData {
    pub fn new(ty: TypeRef) -> Self {
        Self {
            ty,
            exclusive_indirect: false,
        }
    }
}

/// Data for a basic block.
pub struct BlockData {
    pub location: Location,
    pub(crate) parent_func: Option<FuncRef>,
    pub(crate) prev: Option<BlockRef>,
    pub(crate) next: Option<BlockRef>,
    pub(crate) first_inst: Option<InstRef>,
    pub(crate) last_inst: Option<InstRef>,
    pub(crate) args: SmallVec<[ValueRef; 4]>,
    /// Head of the predecessor list: a linked list of successor edges
    /// owned by other blocks' terminators.
    pub(crate) first_pred: Option<SuccRef>,
}

/// Data for a single instruction.
pub struct InstData {
    pub opcode: Opcode,
    pub location: Location,
    /// Generic attribute storage; interpreted by the narrow views in
    /// [`crate::inst`].
    pub attributes: BTreeMap<Symbol, Attribute>,
    pub(crate) operands: SmallVec<[UseRef; 4]>,
    pub(crate) results: SmallVec<[ValueRef; 2]>,
    pub(crate) successors: SmallVec<[SuccRef; 2]>,
    pub(crate) parent_block: Option<BlockRef>,
    pub(crate) prev: Option<InstRef>,
    pub(crate) next: Option<InstRef>,
    pub(crate) dead: bool,
}

/// Data for a single SSA value.
pub struct ValueData {
    pub(crate) def: ValueDef,
    pub(crate) ty: TypeRef,
    pub(crate) first_use: Option<UseRef>,
    pub(crate) exclusive_indirect: bool,
}

/// Data for one operand edge: (user, slot, value), threaded into the
/// value's use-list.
#[derive(Clone, Copy, Debug)]
pub struct UseData {
    pub(crate) user: InstRef,
    pub(crate) index: u32,
    pub(crate) value: ValueRef,
    pub(crate) prev_use: Option<UseRef>,
    pub(crate) next_use: Option<UseRef>,
    pub(crate) type_dependent: bool,
}

/// Data for one CFG successor edge, threaded into the target block's
/// predecessor list.
#[derive(Clone, Copy, Debug)]
pub struct SuccData {
    pub(crate) owner: InstRef,
    pub(crate) index: u32,
    pub(crate) target: BlockRef,
    pub(crate) prev_pred: Option<SuccRef>,
    pub(crate) next_pred: Option<SuccRef>,
}

// ============================================================================
// InstBuilder
// ============================================================================

/// Collects the pieces of an instruction before it is allocated.
///
/// `build` allocates the instruction, its operand edges (linked into the
/// used values' use-lists), its result values, and its successor edges
/// (linked into the targets' predecessor lists). The new instruction is
/// detached; attach it with [`IrContext::push_inst`] or
/// [`IrContext::insert_inst_before`].
pub struct InstBuilder {
    opcode: Opcode,
    location: Location,
    operands: Vec<(ValueRef, bool)>,
    result_types: Vec<TypeRef>,
    successors: Vec<BlockRef>,
    attributes: BTreeMap<Symbol, Attribute>,
}

impl InstBuilder {
    pub fn new(opcode: Opcode, location: Location) -> Self {
        Self {
            opcode,
            location,
            operands: Vec::new(),
            result_types: Vec::new(),
            successors: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn operand(mut self, v: ValueRef) -> Self {
        self.operands.push((v, false));
        self
    }

    pub fn operands(mut self, vs: impl IntoIterator<Item = ValueRef>) -> Self {
        self.operands.extend(vs.into_iter().map(|v| (v, false)));
        self
    }

    /// Add an operand that exists only to keep a type dependency alive.
    /// Dataflow passes skip such operands.
    pub fn type_dependent_operand(mut self, v: ValueRef) -> Self {
        self.operands.push((v, true));
        self
    }

    pub fn result(mut self, ty: TypeRef) -> Self {
        self.result_types.push(ty);
        self
    }

    pub fn results(mut self, tys: impl IntoIterator<Item = TypeRef>) -> Self {
        self.result_types.extend(tys);
        self
    }

    pub fn successor(mut self, target: BlockRef) -> Self {
        self.successors.push(target);
        self
    }

    pub fn attr(mut self, key: impl Into<Symbol>, val: impl Into<Attribute>) -> Self {
        self.attributes.insert(key.into(), val.into());
        self
    }

    pub fn build(self, ctx: &mut IrContext) -> InstRef {
        ctx.create_inst(self)
    }
}

// ============================================================================
// IrContext
// ============================================================================

/// Arena-based mutable IR context; owns every node of the program.
///
/// Passes hold only `Copy` entity refs into this context. A ref stays
/// index-valid forever (arena storage is never freed), but a node's
/// *liveness* ends at [`IrContext::erase_inst`]; accessors panic on
/// erased instructions.
pub struct IrContext {
    funcs: PrimaryMap<FuncRef, FunctionData>,
    globals: PrimaryMap<GlobalRef, GlobalData>,
    blocks: PrimaryMap<BlockRef, BlockData>,
    insts: PrimaryMap<InstRef, InstData>,
    values: PrimaryMap<ValueRef, ValueData>,
    uses: PrimaryMap<UseRef, UseData>,
    succs: PrimaryMap<SuccRef, SuccData>,

    /// Type and path interners.
    pub types: TypeInterner,
    pub paths: PathInterner,
}

impl IrContext {
    /// Create a new empty IR context.
    pub fn new() -> Self {
        Self {
            funcs: PrimaryMap::new(),
            globals: PrimaryMap::new(),
            blocks: PrimaryMap::new(),
            insts: PrimaryMap::new(),
            values: PrimaryMap::new(),
            uses: PrimaryMap::new(),
            succs: PrimaryMap::new(),
            types: TypeInterner::new(),
            paths: PathInterner::new(),
        }
    }

    // ========================================================================
    // Function
    // ========================================================================

    /// Add a function to the module.
    ///
    /// # Panics
    ///
    /// Panics if `data` already carries blocks; blocks are attached via
    /// [`IrContext::append_block`].
    pub fn create_function(&mut self, data: FunctionData) -> FuncRef {
        assert!(
            data.first_block.is_none(),
            "create_function: blocks are attached via append_block",
        );
        self.funcs.push(data)
    }

    pub fn func(&self, f: FuncRef) -> &FunctionData {
        &self.funcs[f]
    }

    pub fn func_mut(&mut self, f: FuncRef) -> &mut FunctionData {
        &mut self.funcs[f]
    }

    pub fn func_name(&self, f: FuncRef) -> Symbol {
        self.funcs[f].name
    }

    pub fn first_block(&self, f: FuncRef) -> Option<BlockRef> {
        self.funcs[f].first_block
    }

    pub fn last_block(&self, f: FuncRef) -> Option<BlockRef> {
        self.funcs[f].last_block
    }

    pub fn num_func_args(&self, f: FuncRef) -> usize {
        self.funcs[f].arg_types.len()
    }

    /// Type of the i-th function argument.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range; an out-of-range argument index
    /// is a pass bug, not a data error.
    pub fn func_arg_type(&self, f: FuncRef, index: usize) -> TypeRef {
        let data = &self.funcs[f];
        *data.arg_types.get(index).unwrap_or_else(|| {
            panic!(
                "func_arg_type: function @{} has {} argument(s), no #{index}",
                data.name,
                data.arg_types.len(),
            )
        })
    }

    pub fn func_result_type(&self, f: FuncRef) -> TypeRef {
        self.funcs[f].result_type
    }

    pub fn num_indirect_result_arguments(&self, f: FuncRef) -> u32 {
        self.funcs[f].num_indirect_result_arguments
    }

    pub fn self_argument_index(&self, f: FuncRef) -> Option<u32> {
        self.funcs[f].self_argument_index
    }

    pub fn is_runtime_v2_available(&self, f: FuncRef) -> bool {
        self.funcs[f].runtime_v2_available
    }

    /// Install the opaque extension blob for a function, returning the
    /// previous blob if one was present.
    pub fn install_func_ext(
        &mut self,
        f: FuncRef,
        ext: Box<dyn Any + Send>,
    ) -> Option<Box<dyn Any + Send>> {
        self.funcs[f].ext.replace(ext)
    }

    /// Take the opaque extension blob of a function, leaving the slot empty.
    pub fn take_func_ext(&mut self, f: FuncRef) -> Option<Box<dyn Any + Send>> {
        self.funcs[f].ext.take()
    }

    pub fn func_ext(&self, f: FuncRef) -> Option<&(dyn Any + Send)> {
        self.funcs[f].ext.as_deref()
    }

    /// Iterate over all functions in the module.
    pub fn funcs(&self) -> impl Iterator<Item = FuncRef> + '_ {
        self.funcs.keys()
    }

    // ========================================================================
    // Global
    // ========================================================================

    pub fn create_global(&mut self, name: Symbol, ty: TypeRef) -> GlobalRef {
        self.globals.push(GlobalData { name, ty })
    }

    pub fn global(&self, g: GlobalRef) -> &GlobalData {
        &self.globals[g]
    }

    pub fn global_name(&self, g: GlobalRef) -> Symbol {
        self.globals[g].name
    }

    pub fn globals(&self) -> impl Iterator<Item = GlobalRef> + '_ {
        self.globals.keys()
    }

    // ========================================================================
    // Block
    // ========================================================================

    /// Create a new detached block and allocate its argument values.
    pub fn create_block(&mut self, location: Location, args: Vec<BlockArgData>) -> BlockRef {
        let block = self.blocks.push(BlockData {
            location,
            parent_func: None,
            prev: None,
            next: None,
            first_inst: None,
            last_inst: None,
            args: SmallVec::new(),
            first_pred: None,
        });
        for (idx, arg) in args.into_iter().enumerate() {
            let v = self.values.push(ValueData {
                def: ValueDef::BlockArg(block, idx as u32),
                ty: arg.ty,
                first_use: None,
                exclusive_indirect: arg.exclusive_indirect,
            });
            self.blocks[block].args.push(v);
        }
        block
    }

    /// Append a block to the end of a function's block list.
    ///
    /// # Panics
    ///
    /// Panics if the block already belongs to a function; a block belongs
    /// to exactly one function for its lifetime.
    pub fn append_block(&mut self, f: FuncRef, block: BlockRef) {
        assert!(
            self.blocks[block].parent_func.is_none(),
            "append_block: {block} already belongs to function @{}",
            self.funcs[self.blocks[block].parent_func.unwrap()].name,
        );
        self.blocks[block].parent_func = Some(f);
        self.blocks[block].prev = self.funcs[f].last_block;
        match self.funcs[f].last_block {
            Some(last) => self.blocks[last].next = Some(block),
            None => self.funcs[f].first_block = Some(block),
        }
        self.funcs[f].last_block = Some(block);
    }

    pub fn block(&self, b: BlockRef) -> &BlockData {
        &self.blocks[b]
    }

    pub fn block_parent(&self, b: BlockRef) -> Option<FuncRef> {
        self.blocks[b].parent_func
    }

    pub fn block_next(&self, b: BlockRef) -> Option<BlockRef> {
        self.blocks[b].next
    }

    pub fn block_prev(&self, b: BlockRef) -> Option<BlockRef> {
        self.blocks[b].prev
    }

    pub fn first_inst(&self, b: BlockRef) -> Option<InstRef> {
        self.blocks[b].first_inst
    }

    pub fn last_inst(&self, b: BlockRef) -> Option<InstRef> {
        self.blocks[b].last_inst
    }

    pub fn num_block_args(&self, b: BlockRef) -> usize {
        self.blocks[b].args.len()
    }

    /// The i-th block argument value.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn block_arg(&self, b: BlockRef, index: usize) -> ValueRef {
        *self.blocks[b].args.get(index).unwrap_or_else(|| {
            panic!(
                "block_arg: {b} has {} argument(s), no #{index}",
                self.blocks[b].args.len(),
            )
        })
    }

    pub fn block_args(&self, b: BlockRef) -> &[ValueRef] {
        &self.blocks[b].args
    }

    /// Head of the predecessor list: the first successor edge targeting
    /// this block. Chain with [`IrContext::next_pred`].
    pub fn first_pred(&self, b: BlockRef) -> Option<SuccRef> {
        self.blocks[b].first_pred
    }

    /// Iterate over the predecessor edges of a block.
    pub fn preds(&self, b: BlockRef) -> Preds<'_> {
        Preds {
            ctx: self,
            cur: self.blocks[b].first_pred,
        }
    }

    /// Iterate over the instructions of a block in order.
    pub fn insts(&self, b: BlockRef) -> Insts<'_> {
        Insts {
            ctx: self,
            cur: self.blocks[b].first_inst,
        }
    }

    /// Iterate over the blocks of a function in order.
    pub fn blocks(&self, f: FuncRef) -> Blocks<'_> {
        Blocks {
            ctx: self,
            cur: self.funcs[f].first_block,
        }
    }

    // ========================================================================
    // Instruction
    // ========================================================================

    /// Allocate a new detached instruction from a builder.
    ///
    /// Operand edges are linked into the used values' use-lists and
    /// successor edges into the targets' predecessor lists as part of
    /// this call.
    ///
    /// # Panics
    ///
    /// Panics if successors are given for a non-terminator opcode.
    pub fn create_inst(&mut self, b: InstBuilder) -> InstRef {
        let InstBuilder {
            opcode,
            location,
            operands,
            result_types,
            successors,
            attributes,
        } = b;
        assert!(
            successors.is_empty() || opcode.is_terminator(),
            "create_inst: {opcode} is not a terminator and cannot own successor edges",
        );

        let inst = self.insts.push(InstData {
            opcode,
            location,
            attributes,
            operands: SmallVec::new(),
            results: SmallVec::new(),
            successors: SmallVec::new(),
            parent_block: None,
            prev: None,
            next: None,
            dead: false,
        });

        for (idx, (value, type_dependent)) in operands.into_iter().enumerate() {
            let u = self.uses.push(UseData {
                user: inst,
                index: idx as u32,
                value,
                prev_use: None,
                next_use: None,
                type_dependent,
            });
            self.link_use(u);
            self.insts[inst].operands.push(u);
        }

        for (idx, ty) in result_types.into_iter().enumerate() {
            let v = self.values.push(ValueData {
                def: ValueDef::InstResult(inst, idx as u32),
                ty,
                first_use: None,
                exclusive_indirect: false,
            });
            self.insts[inst].results.push(v);
        }

        for (idx, target) in successors.into_iter().enumerate() {
            let s = self.succs.push(SuccData {
                owner: inst,
                index: idx as u32,
                target,
                prev_pred: None,
                next_pred: None,
            });
            self.link_pred(s);
            self.insts[inst].successors.push(s);
        }

        inst
    }

    /// Get instruction data.
    ///
    /// # Panics
    ///
    /// Panics if the instruction has been erased; holding a ref across
    /// the erase of its node is a pass bug.
    pub fn inst(&self, inst: InstRef) -> &InstData {
        let data = &self.insts[inst];
        assert!(!data.dead, "instruction {inst} has been erased");
        data
    }

    /// Get mutable instruction data (attributes, location).
    ///
    /// Operand, result, and successor storage is crate-private; mutate
    /// through [`IrContext::set_operand`] and erase/rebuild.
    pub fn inst_mut(&mut self, inst: InstRef) -> &mut InstData {
        let data = &mut self.insts[inst];
        assert!(!data.dead, "instruction {inst} has been erased");
        data
    }

    pub fn inst_opcode(&self, inst: InstRef) -> Opcode {
        self.inst(inst).opcode
    }

    pub fn inst_location(&self, inst: InstRef) -> Location {
        self.inst(inst).location
    }

    pub fn inst_parent(&self, inst: InstRef) -> Option<BlockRef> {
        self.inst(inst).parent_block
    }

    pub fn inst_next(&self, inst: InstRef) -> Option<InstRef> {
        self.inst(inst).next
    }

    pub fn inst_prev(&self, inst: InstRef) -> Option<InstRef> {
        self.inst(inst).prev
    }

    /// Read-only view of the operand edge array.
    pub fn inst_operands(&self, inst: InstRef) -> &[UseRef] {
        &self.inst(inst).operands
    }

    /// The i-th operand edge.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn inst_operand(&self, inst: InstRef, index: usize) -> UseRef {
        *self.inst(inst).operands.get(index).unwrap_or_else(|| {
            panic!(
                "inst_operand: {inst} has {} operand(s), no #{index}",
                self.insts[inst].operands.len(),
            )
        })
    }

    /// Read-only view of the successor edge array (empty for
    /// non-terminators).
    pub fn inst_successors(&self, inst: InstRef) -> &[SuccRef] {
        &self.inst(inst).successors
    }

    pub fn num_results(&self, inst: InstRef) -> usize {
        self.inst(inst).results.len()
    }

    /// The i-th result value.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn result(&self, inst: InstRef, index: usize) -> ValueRef {
        *self.inst(inst).results.get(index).unwrap_or_else(|| {
            panic!(
                "result: {inst} has {} result(s), no #{index}",
                self.insts[inst].results.len(),
            )
        })
    }

    pub fn results(&self, inst: InstRef) -> &[ValueRef] {
        &self.inst(inst).results
    }

    /// Declared memory behavior; derived from the opcode, see
    /// [`Opcode::memory_behavior`].
    pub fn memory_behavior(&self, inst: InstRef) -> MemoryBehavior {
        self.inst(inst).opcode.memory_behavior()
    }

    pub fn may_release(&self, inst: InstRef) -> bool {
        self.inst(inst).opcode.may_release()
    }

    /// Replace the operand at `index` with `new_value`.
    ///
    /// The old edge is unlinked from the old value's use-list and the
    /// same edge is relinked into `new_value`'s use-list in one step; the
    /// (user, slot) pair is unchanged.
    pub fn set_operand(&mut self, inst: InstRef, index: usize, new_value: ValueRef) {
        let u = self.inst_operand(inst, index);
        if self.uses[u].value == new_value {
            return;
        }
        self.unlink_use(u);
        self.uses[u].value = new_value;
        self.link_use(u);
    }

    /// Append an instruction to the end of a block.
    ///
    /// # Panics
    ///
    /// Panics if the instruction already belongs to a block.
    pub fn push_inst(&mut self, block: BlockRef, inst: InstRef) {
        assert!(
            self.inst(inst).parent_block.is_none(),
            "push_inst: {inst} already belongs to block {}; remove it from the old block first",
            self.insts[inst].parent_block.unwrap(),
        );
        self.insts[inst].parent_block = Some(block);
        self.insts[inst].prev = self.blocks[block].last_inst;
        match self.blocks[block].last_inst {
            Some(last) => self.insts[last].next = Some(inst),
            None => self.blocks[block].first_inst = Some(inst),
        }
        self.blocks[block].last_inst = Some(inst);
    }

    /// Insert an instruction immediately before `before`, in `before`'s
    /// block.
    ///
    /// # Panics
    ///
    /// Panics if `before` is detached, or if `inst` already belongs to a
    /// block.
    pub fn insert_inst_before(&mut self, before: InstRef, inst: InstRef) {
        let block = self
            .inst(before)
            .parent_block
            .unwrap_or_else(|| panic!("insert_inst_before: insertion point {before} is detached"));
        assert!(
            self.inst(inst).parent_block.is_none(),
            "insert_inst_before: {inst} already belongs to block {}; remove it from the old block first",
            self.insts[inst].parent_block.unwrap(),
        );
        let prev = self.insts[before].prev;
        self.insts[inst].prev = prev;
        self.insts[inst].next = Some(before);
        self.insts[before].prev = Some(inst);
        match prev {
            Some(p) => self.insts[p].next = Some(inst),
            None => self.blocks[block].first_inst = Some(inst),
        }
        self.insts[inst].parent_block = Some(block);
    }

    /// Unlink an instruction from its block without destroying it.
    pub fn remove_inst_from_block(&mut self, inst: InstRef) {
        let Some(block) = self.inst(inst).parent_block else {
            return;
        };
        let (prev, next) = (self.insts[inst].prev, self.insts[inst].next);
        match prev {
            Some(p) => self.insts[p].next = next,
            None => self.blocks[block].first_inst = next,
        }
        match next {
            Some(n) => self.insts[n].prev = prev,
            None => self.blocks[block].last_inst = prev,
        }
        self.insts[inst].prev = None;
        self.insts[inst].next = None;
        self.insts[inst].parent_block = None;
    }

    /// Erase an instruction: unlink it from its block, unlink every
    /// operand edge from its value's use-list, unlink every successor
    /// edge from its target's predecessor list, and mark it dead.
    ///
    /// Erase does not rewrite uses of the instruction's results; callers
    /// redirect them first (see [`IrContext::replace_all_uses`]).
    ///
    /// # Panics
    ///
    /// Panics if any result value still has uses, or if the instruction
    /// was already erased.
    pub fn erase_inst(&mut self, inst: InstRef) {
        assert!(
            !self.insts[inst].dead,
            "erase_inst: {inst} was already erased",
        );
        let results: SmallVec<[ValueRef; 2]> = self.insts[inst].results.clone();
        for &v in &results {
            assert!(
                self.values[v].first_use.is_none(),
                "erase_inst: result {v} of {inst} still has use(s); \
                 rewrite all uses before erasing",
            );
        }

        trace!(inst = %inst, opcode = %self.insts[inst].opcode, "erasing instruction");

        if self.insts[inst].parent_block.is_some() {
            self.remove_inst_from_block(inst);
        }
        let operands: SmallVec<[UseRef; 4]> = self.insts[inst].operands.clone();
        for u in operands {
            self.unlink_use(u);
        }
        let successors: SmallVec<[SuccRef; 2]> = self.insts[inst].successors.clone();
        for s in successors {
            self.unlink_pred(s);
        }
        self.insts[inst].dead = true;
    }

    // ========================================================================
    // Value
    // ========================================================================

    pub fn value_ty(&self, v: ValueRef) -> TypeRef {
        self.values[v].ty
    }

    pub fn value_def(&self, v: ValueRef) -> ValueDef {
        self.values[v].def
    }

    /// Head of the value's use-list. Traversal order is unspecified and
    /// not stable across mutations; it does not reflect program order.
    pub fn first_use(&self, v: ValueRef) -> Option<UseRef> {
        self.values[v].first_use
    }

    pub fn has_uses(&self, v: ValueRef) -> bool {
        self.values[v].first_use.is_some()
    }

    /// Iterate over all uses of a value.
    pub fn uses(&self, v: ValueRef) -> Uses<'_> {
        Uses {
            ctx: self,
            cur: self.values[v].first_use,
        }
    }

    /// Owning instruction of an instruction-result value.
    ///
    /// # Panics
    ///
    /// Panics if the value is a block argument.
    pub fn result_parent(&self, v: ValueRef) -> InstRef {
        match self.values[v].def {
            ValueDef::InstResult(inst, _) => inst,
            ValueDef::BlockArg(..) => {
                panic!("result_parent: {v} is a block argument, not an instruction result")
            }
        }
    }

    /// Result index of an instruction-result value.
    ///
    /// # Panics
    ///
    /// Panics if the value is a block argument.
    pub fn result_index(&self, v: ValueRef) -> u32 {
        match self.values[v].def {
            ValueDef::InstResult(_, idx) => idx,
            ValueDef::BlockArg(..) => {
                panic!("result_index: {v} is a block argument, not an instruction result")
            }
        }
    }

    /// Owning block of a block-argument value.
    ///
    /// # Panics
    ///
    /// Panics if the value is an instruction result.
    pub fn arg_parent(&self, v: ValueRef) -> BlockRef {
        match self.values[v].def {
            ValueDef::BlockArg(block, _) => block,
            ValueDef::InstResult(..) => {
                panic!("arg_parent: {v} is an instruction result, not a block argument")
            }
        }
    }

    /// Argument index of a block-argument value.
    ///
    /// # Panics
    ///
    /// Panics if the value is an instruction result.
    pub fn arg_index(&self, v: ValueRef) -> u32 {
        match self.values[v].def {
            ValueDef::BlockArg(_, idx) => idx,
            ValueDef::InstResult(..) => {
                panic!("arg_index: {v} is an instruction result, not a block argument")
            }
        }
    }

    pub fn arg_is_exclusive_indirect(&self, v: ValueRef) -> bool {
        match self.values[v].def {
            ValueDef::BlockArg(..) => self.values[v].exclusive_indirect,
            ValueDef::InstResult(..) => false,
        }
    }

    /// Function containing the definition of a value, if it is attached.
    pub fn value_function(&self, v: ValueRef) -> Option<FuncRef> {
        match self.values[v].def {
            ValueDef::InstResult(inst, _) => {
                self.insts[inst].parent_block.and_then(|b| self.blocks[b].parent_func)
            }
            ValueDef::BlockArg(block, _) => self.blocks[block].parent_func,
        }
    }

    // ========================================================================
    // Operand edges
    // ========================================================================

    pub fn use_value(&self, u: UseRef) -> ValueRef {
        self.uses[u].value
    }

    pub fn use_user(&self, u: UseRef) -> InstRef {
        self.uses[u].user
    }

    pub fn use_operand_index(&self, u: UseRef) -> u32 {
        self.uses[u].index
    }

    pub fn use_is_type_dependent(&self, u: UseRef) -> bool {
        self.uses[u].type_dependent
    }

    /// Next edge in the same value's use-list.
    pub fn next_use(&self, u: UseRef) -> Option<UseRef> {
        self.uses[u].next_use
    }

    // ========================================================================
    // Successor edges
    // ========================================================================

    pub fn succ_target(&self, s: SuccRef) -> BlockRef {
        self.succs[s].target
    }

    pub fn succ_owner(&self, s: SuccRef) -> InstRef {
        self.succs[s].owner
    }

    pub fn succ_index(&self, s: SuccRef) -> u32 {
        self.succs[s].index
    }

    /// Next edge in the same target block's predecessor list.
    pub fn next_pred(&self, s: SuccRef) -> Option<SuccRef> {
        self.succs[s].next_pred
    }

    // ========================================================================
    // RAUW (Replace All Uses With)
    // ========================================================================

    /// Replace all uses of `old` with `new`.
    ///
    /// Every edge in `old`'s use-list is retargeted to `new`, preserving
    /// its (user, slot) pair. Afterwards `old` has no uses.
    pub fn replace_all_uses(&mut self, old: ValueRef, new: ValueRef) {
        if old == new {
            return;
        }
        let mut edges: SmallVec<[UseRef; 8]> = SmallVec::new();
        let mut cur = self.values[old].first_use;
        while let Some(u) = cur {
            edges.push(u);
            cur = self.uses[u].next_use;
        }
        for u in edges {
            self.unlink_use(u);
            self.uses[u].value = new;
            self.link_use(u);
        }
    }

    // ========================================================================
    // Link/unlink primitives
    // ========================================================================

    fn link_use(&mut self, u: UseRef) {
        let value = self.uses[u].value;
        let head = self.values[value].first_use;
        self.uses[u].prev_use = None;
        self.uses[u].next_use = head;
        if let Some(head) = head {
            self.uses[head].prev_use = Some(u);
        }
        self.values[value].first_use = Some(u);
    }

    fn unlink_use(&mut self, u: UseRef) {
        let UseData {
            value,
            prev_use,
            next_use,
            ..
        } = self.uses[u];
        match prev_use {
            Some(p) => self.uses[p].next_use = next_use,
            None => self.values[value].first_use = next_use,
        }
        if let Some(n) = next_use {
            self.uses[n].prev_use = prev_use;
        }
        self.uses[u].prev_use = None;
        self.uses[u].next_use = None;
    }

    fn link_pred(&mut self, s: SuccRef) {
        let target = self.succs[s].target;
        let head = self.blocks[target].first_pred;
        self.succs[s].prev_pred = None;
        self.succs[s].next_pred = head;
        if let Some(head) = head {
            self.succs[head].prev_pred = Some(s);
        }
        self.blocks[target].first_pred = Some(s);
    }

    fn unlink_pred(&mut self, s: SuccRef) {
        let SuccData {
            target,
            prev_pred,
            next_pred,
            ..
        } = self.succs[s];
        match prev_pred {
            Some(p) => self.succs[p].next_pred = next_pred,
            None => self.blocks[target].first_pred = next_pred,
        }
        if let Some(n) = next_pred {
            self.succs[n].prev_pred = prev_pred;
        }
        self.succs[s].prev_pred = None;
        self.succs[s].next_pred = None;
    }
}

impl Default for IrContext {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// Iterator over the uses of a value.
pub struct Uses<'a> {
    ctx: &'a IrContext,
    cur: Option<UseRef>,
}

impl Iterator for Uses<'_> {
    type Item = UseRef;

    fn next(&mut self) -> Option<UseRef> {
        let u = self.cur?;
        self.cur = self.ctx.uses[u].next_use;
        Some(u)
    }
}

/// Iterator over the predecessor edges of a block.
pub struct Preds<'a> {
    ctx: &'a IrContext,
    cur: Option<SuccRef>,
}

impl Iterator for Preds<'_> {
    type Item = SuccRef;

    fn next(&mut self) -> Option<SuccRef> {
        let s = self.cur?;
        self.cur = self.ctx.succs[s].next_pred;
        Some(s)
    }
}

/// Iterator over the instructions of a block in order.
pub struct Insts<'a> {
    ctx: &'a IrContext,
    cur: Option<InstRef>,
}

impl Iterator for Insts<'_> {
    type Item = InstRef;

    fn next(&mut self) -> Option<InstRef> {
        let i = self.cur?;
        self.cur = self.ctx.insts[i].next;
        Some(i)
    }
}

/// Iterator over the blocks of a function in order.
pub struct Blocks<'a> {
    ctx: &'a IrContext,
    cur: Option<BlockRef>,
}

impl Iterator for Blocks<'_> {
    type Item = BlockRef;

    fn next(&mut self) -> Option<BlockRef> {
        let b = self.cur?;
        self.cur = self.ctx.blocks[b].next;
        Some(b)
    }
}

// ============================================================================
// Tests
// ============================================================================
