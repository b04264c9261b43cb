//! End-to-end exercise of the pass mutation protocol: a tiny
//! constant-folding pass built only from the public API.

use graft_ir::inst::{ATTR_BUILTIN_ID, ATTR_VALUE, InstView, IntegerLiteral};
use graft_ir::verify::verify_function;
use graft_ir::{
    Builder, BuiltinId, ChangeKind, FunctionData, InstBuilder, InstRef, IrContext, Location,
    Opcode, PassContext, Span, Symbol, TypeDataBuilder, TypeKind, TypeRef,
};

fn i64_type(ctx: &mut IrContext) -> TypeRef {
    ctx.types
        .intern(TypeDataBuilder::new(Symbol::new("i64"), TypeKind::Primitive).build())
}

/// fn @main() -> i64 { v = 40 + 2; return v }
fn build_input(ctx: &mut IrContext) -> graft_ir::FuncRef {
    let path = ctx.paths.intern("file:///fold.gr".to_owned());
    let loc = Location::new(path, Span::new(0, 0));
    let i64_ty = i64_type(ctx);

    let f = ctx.create_function(FunctionData::new(Symbol::new("main"), loc, [], i64_ty));
    let entry = ctx.create_block(loc, vec![]);
    ctx.append_block(f, entry);

    let c0 = InstBuilder::new(Opcode::IntegerLiteral, loc)
        .result(i64_ty)
        .attr(ATTR_VALUE(), 40i64)
        .build(ctx);
    ctx.push_inst(entry, c0);
    let c1 = InstBuilder::new(Opcode::IntegerLiteral, loc)
        .result(i64_ty)
        .attr(ATTR_VALUE(), 2i64)
        .build(ctx);
    ctx.push_inst(entry, c1);

    let add = InstBuilder::new(Opcode::BuiltinCall, loc)
        .operand(ctx.result(c0, 0))
        .operand(ctx.result(c1, 0))
        .result(i64_ty)
        .attr(ATTR_BUILTIN_ID(), BuiltinId::Add as u32 as u64)
        .build(ctx);
    ctx.push_inst(entry, add);

    let ret = InstBuilder::new(Opcode::Return, loc)
        .operand(ctx.result(add, 0))
        .build(ctx);
    ctx.push_inst(entry, ret);

    f
}

/// Fold `builtin add(lit, lit)` into a fresh literal, then sweep the
/// now-unused inputs.
fn fold_constants(pass: &mut PassContext<'_>, f: graft_ir::FuncRef) {
    let mut worklist: Vec<InstRef> = Vec::new();
    {
        let ctx = pass.ir();
        for block in ctx.blocks(f) {
            for inst in ctx.insts(block) {
                if ctx.inst_opcode(inst) == Opcode::BuiltinCall {
                    worklist.push(inst);
                }
            }
        }
    }

    for inst in worklist {
        let (lhs, rhs, ty, loc) = {
            let ctx = pass.ir();
            let ops = ctx.inst_operands(inst);
            let lhs = ctx.use_value(ops[0]);
            let rhs = ctx.use_value(ops[1]);
            (lhs, rhs, ctx.value_ty(ctx.result(inst, 0)), ctx.inst_location(inst))
        };

        let folded = {
            let ctx = pass.ir();
            let lhs_lit = IntegerLiteral::from_inst(ctx, ctx.result_parent(lhs));
            let rhs_lit = IntegerLiteral::from_inst(ctx, ctx.result_parent(rhs));
            match (lhs_lit, rhs_lit) {
                (Some(a), Some(b)) => Some(a.value(ctx) + b.value(ctx)),
                _ => None,
            }
        };
        let Some(value) = folded else { continue };

        // insert the folded literal before the fold site
        let lit = Builder::before(pass.ir_mut(), inst).create_integer_literal(loc, ty, value);
        let lit_v = pass.ir().result(lit, 0);
        let old_v = pass.ir().result(inst, 0);
        pass.ir_mut().replace_all_uses(old_v, lit_v);
        pass.erase_instruction(inst);
        pass.notify_changes(ChangeKind::Instructions);

        // sweep the operands if the fold left them unused
        for v in [lhs, rhs] {
            let def = pass.ir().result_parent(v);
            if !pass.ir().has_uses(v) {
                pass.erase_instruction(def);
            }
        }
    }
}

#[test]
fn constant_fold_end_to_end() {
    let mut ctx = IrContext::new();
    let f = build_input(&mut ctx);
    assert!(verify_function(&ctx, f).is_ok());

    let mut pass = PassContext::new(&mut ctx);
    fold_constants(&mut pass, f);
    assert!(pass.changes().contains(ChangeKind::Instructions));
    assert!(!pass.changes().contains(ChangeKind::Branches));

    // the function is structurally sound after the rewrite
    let result = verify_function(&ctx, f);
    assert!(result.is_ok(), "{result}");

    // exactly two instructions remain: the folded literal and the return
    let entry = ctx.first_block(f).unwrap();
    let insts: Vec<InstRef> = ctx.insts(entry).collect();
    assert_eq!(insts.len(), 2);

    let lit = IntegerLiteral::from_inst(&ctx, insts[0]).expect("folded literal");
    assert_eq!(lit.value(&ctx), 42);
    assert_eq!(ctx.inst_opcode(insts[1]), Opcode::Return);

    // the return now consumes the folded literal
    let ret_operand = ctx.use_value(ctx.inst_operand(insts[1], 0));
    assert_eq!(ret_operand, ctx.result(insts[0], 0));
}

#[test]
fn subpass_interleaving_over_a_function() {
    let mut ctx = IrContext::new();
    let f = build_input(&mut ctx);
    let entry = ctx.first_block(f).unwrap();

    // walk the block as a sequence of subpasses, erasing as we go
    let mut pass = PassContext::with_subpass_limit(&mut ctx, 8);
    let mut cursor = pass.ir().first_inst(entry);
    let mut visited = 0;
    while let Some(inst) = cursor {
        let next = pass.ir().inst_next(inst);
        visited += 1;
        if !pass.continue_with_next_subpass_run(next) {
            break;
        }
        cursor = pass.resume_cursor();
    }
    assert_eq!(visited, 4);
}
