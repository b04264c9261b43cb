//! Structural validation for the arena IR.
//!
//! Three kinds of checks, all per function:
//!
//! 1. **Use-chain consistency**: the use-lists stored on values exactly
//!    match the operand arrays of the instructions, in both directions.
//! 2. **List integrity**: block and instruction links form a proper
//!    doubly-linked list (forward walk, backward walk, parent pointers,
//!    first/last agreement), and terminators sit last in their block.
//! 3. **Scope integrity**: every operand references a value defined
//!    within the same function (block args + instruction results).
//!
//! `debug_assert_valid` panics on any error and is intended as a
//! checkpoint after IR transformation passes.

use std::collections::HashSet;
use std::fmt;

use crate::context::IrContext;
use crate::refs::{FuncRef, InstRef, UseRef, ValueRef};

/// Describes a use-chain inconsistency.
pub struct UseChainError {
    pub message: String,
}

impl fmt::Display for UseChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Describes a broken block/instruction list or CFG edge.
pub struct CfgError {
    pub message: String,
}

impl fmt::Display for CfgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Describes a stale operand reference found during validation.
pub struct StaleValueError {
    /// Name of the function containing the stale reference.
    pub function_name: String,
    /// Mnemonic of the consuming instruction.
    pub consumer_op: String,
    /// Index of the stale operand within the consuming instruction.
    pub operand_index: usize,
    /// Human-readable description of the stale value.
    pub stale_value_description: String,
}

impl fmt::Display for StaleValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stale value in @{}: operand #{} of {} references {}",
            self.function_name, self.operand_index, self.consumer_op, self.stale_value_description,
        )
    }
}

/// Result of validating one function (or a whole module).
pub struct ValidationResult {
    pub stale_errors: Vec<StaleValueError>,
    pub use_chain_errors: Vec<UseChainError>,
    pub cfg_errors: Vec<CfgError>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.stale_errors.is_empty()
            && self.use_chain_errors.is_empty()
            && self.cfg_errors.is_empty()
    }

    fn merge(&mut self, other: ValidationResult) {
        self.stale_errors.extend(other.stale_errors);
        self.use_chain_errors.extend(other.use_chain_errors);
        self.cfg_errors.extend(other.cfg_errors);
    }

    fn empty() -> Self {
        Self {
            stale_errors: Vec::new(),
            use_chain_errors: Vec::new(),
            cfg_errors: Vec::new(),
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return write!(f, "validation passed");
        }
        if !self.stale_errors.is_empty() {
            writeln!(f, "{} stale value(s) found:", self.stale_errors.len())?;
            for err in &self.stale_errors {
                writeln!(f, "  - {}", err)?;
            }
        }
        if !self.use_chain_errors.is_empty() {
            writeln!(f, "{} use-chain error(s) found:", self.use_chain_errors.len())?;
            for err in &self.use_chain_errors {
                writeln!(f, "  - {}", err)?;
            }
        }
        if !self.cfg_errors.is_empty() {
            writeln!(f, "{} CFG error(s) found:", self.cfg_errors.len())?;
            for err in &self.cfg_errors {
                writeln!(f, "  - {}", err)?;
            }
        }
        Ok(())
    }
}

/// Validate a single function.
pub fn verify_function(ctx: &IrContext, f: FuncRef) -> ValidationResult {
    let mut result = ValidationResult::empty();
    let function_name = ctx.func_name(f).to_string();

    // Collect the function's instructions and defined values.
    let mut insts: Vec<InstRef> = Vec::new();
    let mut defined: HashSet<ValueRef> = HashSet::new();
    for block in ctx.blocks(f) {
        for &arg in ctx.block_args(block) {
            defined.insert(arg);
        }
        for inst in ctx.insts(block) {
            insts.push(inst);
            for &r in ctx.results(inst) {
                defined.insert(r);
            }
        }
    }

    check_lists(ctx, f, &mut result);
    check_use_chains(ctx, &insts, &defined, &mut result);
    check_scope(ctx, &insts, &defined, &function_name, &mut result);
    check_cfg(ctx, f, &insts, &mut result);

    result
}

/// Validate every function in the module.
pub fn verify_all(ctx: &IrContext) -> ValidationResult {
    let mut result = ValidationResult::empty();
    for f in ctx.funcs() {
        result.merge(verify_function(ctx, f));
    }
    result
}

/// Debug-only validation that panics on any error.
///
/// Only runs under `cfg!(debug_assertions)`. Useful as a checkpoint
/// after IR transformation passes.
pub fn debug_assert_valid(ctx: &IrContext, f: FuncRef, pass_name: &str) {
    if !cfg!(debug_assertions) {
        return;
    }
    let result = verify_function(ctx, f);
    if !result.is_ok() {
        panic!("IR validation failed after `{}`:\n{}", pass_name, result);
    }
}

fn check_lists(ctx: &IrContext, f: FuncRef, result: &mut ValidationResult) {
    // Block list: forward walk, parent pointers, first/last agreement.
    let blocks: Vec<_> = ctx.blocks(f).collect();
    if let Some(&first) = blocks.first() {
        if ctx.first_block(f) != Some(first) {
            result.cfg_errors.push(CfgError {
                message: format!("function @{}: first_block disagrees with walk", ctx.func_name(f)),
            });
        }
    }
    if ctx.last_block(f) != blocks.last().copied() {
        result.cfg_errors.push(CfgError {
            message: format!("function @{}: last_block disagrees with walk", ctx.func_name(f)),
        });
    }

    for &block in &blocks {
        if ctx.block_parent(block) != Some(f) {
            result.cfg_errors.push(CfgError {
                message: format!("{block}: parent function link is broken"),
            });
        }

        // Instruction list: forward and backward walks must agree.
        let forward: Vec<InstRef> = ctx.insts(block).collect();
        let mut backward: Vec<InstRef> = Vec::new();
        let mut cur = ctx.last_inst(block);
        while let Some(i) = cur {
            backward.push(i);
            cur = ctx.inst_prev(i);
        }
        backward.reverse();
        if forward != backward {
            result.cfg_errors.push(CfgError {
                message: format!("{block}: forward and backward instruction walks disagree"),
            });
        }
        if ctx.first_inst(block) != forward.first().copied() {
            result.cfg_errors.push(CfgError {
                message: format!("{block}: first_inst disagrees with walk"),
            });
        }

        for (pos, &inst) in forward.iter().enumerate() {
            if ctx.inst_parent(inst) != Some(block) {
                result.cfg_errors.push(CfgError {
                    message: format!("{inst}: parent block link is broken"),
                });
            }
            // A terminator must be the last instruction of its block.
            if ctx.inst_opcode(inst).is_terminator() && pos + 1 != forward.len() {
                result.cfg_errors.push(CfgError {
                    message: format!(
                        "{block}: terminator {inst} is followed by other instructions",
                    ),
                });
            }
        }
    }
}

fn check_use_chains(
    ctx: &IrContext,
    insts: &[InstRef],
    defined: &HashSet<ValueRef>,
    result: &mut ValidationResult,
) {
    // Direction 1: every operand edge must sit in its value's use-list
    // and record its own slot.
    let mut actual: HashSet<UseRef> = HashSet::new();
    for &inst in insts {
        for (slot, &u) in ctx.inst_operands(inst).iter().enumerate() {
            actual.insert(u);
            if ctx.use_user(u) != inst || ctx.use_operand_index(u) as usize != slot {
                result.use_chain_errors.push(UseChainError {
                    message: format!(
                        "operand #{slot} of {inst} records (user {}, slot {})",
                        ctx.use_user(u),
                        ctx.use_operand_index(u),
                    ),
                });
            }
            let value = ctx.use_value(u);
            if !ctx.uses(value).any(|e| e == u) {
                result.use_chain_errors.push(UseChainError {
                    message: format!(
                        "operand #{slot} of {inst} uses {value} but is missing from its use-list",
                    ),
                });
            }
        }
    }

    // Direction 2: every use-list entry must be an actual operand edge.
    for &v in defined {
        for u in ctx.uses(v) {
            if !actual.contains(&u) {
                result.use_chain_errors.push(UseChainError {
                    message: format!(
                        "use-list of {v} claims use by {} operand #{}, but no such operand exists",
                        ctx.use_user(u),
                        ctx.use_operand_index(u),
                    ),
                });
            }
        }
    }
}

fn describe_value(ctx: &IrContext, v: ValueRef) -> String {
    match ctx.value_def(v) {
        crate::refs::ValueDef::InstResult(inst, idx) => {
            format!("result #{idx} of {}", ctx.inst_opcode(inst).mnemonic())
        }
        crate::refs::ValueDef::BlockArg(block, idx) => {
            format!("block arg #{idx} of {block}")
        }
    }
}

fn check_scope(
    ctx: &IrContext,
    insts: &[InstRef],
    defined: &HashSet<ValueRef>,
    function_name: &str,
    result: &mut ValidationResult,
) {
    for &inst in insts {
        for (slot, &u) in ctx.inst_operands(inst).iter().enumerate() {
            let value = ctx.use_value(u);
            if !defined.contains(&value) {
                result.stale_errors.push(StaleValueError {
                    function_name: function_name.to_string(),
                    consumer_op: ctx.inst_opcode(inst).mnemonic().to_string(),
                    operand_index: slot,
                    stale_value_description: describe_value(ctx, value),
                });
            }
        }
    }
}

fn check_cfg(ctx: &IrContext, f: FuncRef, insts: &[InstRef], result: &mut ValidationResult) {
    for &inst in insts {
        for (idx, &s) in ctx.inst_successors(inst).iter().enumerate() {
            if ctx.succ_owner(s) != inst || ctx.succ_index(s) as usize != idx {
                result.cfg_errors.push(CfgError {
                    message: format!(
                        "successor #{idx} of {inst} records (owner {}, index {})",
                        ctx.succ_owner(s),
                        ctx.succ_index(s),
                    ),
                });
            }
            let target = ctx.succ_target(s);
            let occurrences = ctx.preds(target).filter(|&p| p == s).count();
            if occurrences != 1 {
                result.cfg_errors.push(CfgError {
                    message: format!(
                        "successor #{idx} of {inst} appears {occurrences} time(s) \
                         in the predecessor list of {target}",
                    ),
                });
            }
        }
    }

    // Every pred-list entry must actually target the block it is listed on.
    for block in ctx.blocks(f) {
        for s in ctx.preds(block) {
            if ctx.succ_target(s) != block {
                result.cfg_errors.push(CfgError {
                    message: format!(
                        "predecessor list of {block} contains an edge targeting {}",
                        ctx.succ_target(s),
                    ),
                });
            }
        }
    }
}
