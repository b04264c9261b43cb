//! Debug descriptions and textual function dumps.
//!
//! Every accessor here returns an owned `String`; diagnostic strings
//! never borrow the context. The dump format is for humans and tests,
//! not a round-trip format — the textual round-trip boundary is the
//! registered `parse`/`write` hook pair in [`crate::registry`].

use std::fmt::Write;

use crate::context::IrContext;
use crate::refs::{BlockRef, FuncRef, GlobalRef, InstRef, ValueRef};
use crate::types::Attribute;

fn fmt_attr(ctx: &IrContext, attr: &Attribute, out: &mut String) {
    match attr {
        Attribute::Unit => out.push_str("unit"),
        Attribute::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Attribute::IntBits(v) => {
            let _ = write!(out, "{}", i64::from_ne_bytes(v.to_ne_bytes()));
        }
        Attribute::FloatBits(bits) => {
            let _ = write!(out, "{}", f64::from_bits(*bits));
        }
        Attribute::String(s) => {
            let _ = write!(out, "{s:?}");
        }
        Attribute::Symbol(s) => {
            let _ = write!(out, "{s}");
        }
        Attribute::Type(t) => {
            let _ = write!(out, "{}", ctx.types.get(*t).name);
        }
        Attribute::Function(f) => {
            let _ = write!(out, "@{}", ctx.func_name(*f));
        }
        Attribute::Global(g) => {
            let _ = write!(out, "@{}", ctx.global_name(*g));
        }
        Attribute::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                fmt_attr(ctx, item, out);
            }
            out.push(']');
        }
    }
}

/// One-line description of an instruction.
pub fn inst_debug_description(ctx: &IrContext, inst: InstRef) -> String {
    let mut out = String::new();
    let data = ctx.inst(inst);

    let results = ctx.results(inst);
    for (i, &r) in results.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{r}");
    }
    if !results.is_empty() {
        out.push_str(" = ");
    }

    out.push_str(data.opcode.mnemonic());

    let operands = ctx.inst_operands(inst);
    if !operands.is_empty() {
        out.push('(');
        for (i, &u) in operands.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}", ctx.use_value(u));
            if ctx.use_is_type_dependent(u) {
                out.push_str(" [type-dep]");
            }
        }
        out.push(')');
    }

    if !data.attributes.is_empty() {
        out.push_str(" {");
        for (i, (key, attr)) in data.attributes.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{key} = ");
            fmt_attr(ctx, attr, &mut out);
        }
        out.push('}');
    }

    let succs = ctx.inst_successors(inst);
    if !succs.is_empty() {
        out.push_str(" [");
        for (i, &s) in succs.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}", ctx.succ_target(s));
        }
        out.push(']');
    }

    if !results.is_empty() {
        out.push_str(" : ");
        for (i, &r) in results.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}", ctx.types.get(ctx.value_ty(r)).name);
        }
    }

    out
}

/// One-line description of a value and its definition.
pub fn value_debug_description(ctx: &IrContext, v: ValueRef) -> String {
    match ctx.value_def(v) {
        crate::refs::ValueDef::InstResult(inst, idx) => {
            format!(
                "{v} = result #{idx} of {}",
                ctx.inst_opcode(inst).mnemonic(),
            )
        }
        crate::refs::ValueDef::BlockArg(block, idx) => {
            format!("{v} = argument #{idx} of {block}")
        }
    }
}

/// Header line of a block: label, arguments, predecessor list.
pub fn block_debug_description(ctx: &IrContext, block: BlockRef) -> String {
    let mut out = String::new();
    let _ = write!(out, "{block}");

    let args = ctx.block_args(block);
    if !args.is_empty() {
        out.push('(');
        for (i, &a) in args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{a}: {}", ctx.types.get(ctx.value_ty(a)).name);
        }
        out.push(')');
    }
    out.push(':');

    let preds: Vec<String> = ctx
        .preds(block)
        .map(|s| match ctx.inst_parent(ctx.succ_owner(s)) {
            Some(b) => b.to_string(),
            None => "?".to_owned(),
        })
        .collect();
    if !preds.is_empty() {
        let _ = write!(out, "  // preds: {}", preds.join(", "));
    }

    out
}

/// One-line description of a global variable.
pub fn global_debug_description(ctx: &IrContext, g: GlobalRef) -> String {
    let data = ctx.global(g);
    format!("@{} : {}", data.name, ctx.types.get(data.ty).name)
}

/// Full textual dump of a function.
pub fn func_debug_description(ctx: &IrContext, f: FuncRef) -> String {
    let mut out = String::new();
    let data = ctx.func(f);

    let _ = write!(out, "fn @{}(", data.name);
    for (i, &ty) in data.arg_types.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{}", ctx.types.get(ty).name);
    }
    let _ = write!(out, ") -> {} {{", ctx.types.get(data.result_type).name);
    out.push('\n');

    for block in ctx.blocks(f) {
        out.push_str(&block_debug_description(ctx, block));
        out.push('\n');
        for inst in ctx.insts(block) {
            out.push_str("  ");
            out.push_str(&inst_debug_description(ctx, inst));
            out.push('\n');
        }
    }

    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BlockArgData, FunctionData, InstBuilder, IrContext};
    use crate::inst::{ATTR_BUILTIN_ID, ATTR_VALUE};
    use crate::location::{Location, Span};
    use crate::opcode::{BuiltinId, Opcode};
    use crate::refs::TypeRef;
    use crate::symbol::Symbol;
    use crate::types::{TypeDataBuilder, TypeKind};

    fn test_location(ctx: &mut IrContext) -> Location {
        let path = ctx.paths.intern("file:///test.gr".to_owned());
        Location::new(path, Span::new(0, 0))
    }

    fn i64_type(ctx: &mut IrContext) -> TypeRef {
        ctx.types
            .intern(TypeDataBuilder::new(Symbol::new("i64"), TypeKind::Primitive).build())
    }

    /// fn @add(i64) { bb0(v0): v1 = 40; v2 = add(v0, v1); br bb1(v2); bb1(v3): return(v3) }
    fn build_sample(ctx: &mut IrContext) -> FuncRef {
        let loc = test_location(ctx);
        let i64_ty = i64_type(ctx);

        let f = ctx.create_function(FunctionData::new(
            Symbol::new("add"),
            loc,
            [i64_ty],
            i64_ty,
        ));
        let entry = ctx.create_block(loc, vec![BlockArgData::new(i64_ty)]);
        ctx.append_block(f, entry);

        let arg = ctx.block_arg(entry, 0);
        let c = InstBuilder::new(Opcode::IntegerLiteral, loc)
            .result(i64_ty)
            .attr(ATTR_VALUE(), 40i64)
            .build(ctx);
        ctx.push_inst(entry, c);
        let cv = ctx.result(c, 0);

        let add = InstBuilder::new(Opcode::BuiltinCall, loc)
            .operand(arg)
            .operand(cv)
            .result(i64_ty)
            .attr(ATTR_BUILTIN_ID(), BuiltinId::Add as u32 as u64)
            .build(ctx);
        ctx.push_inst(entry, add);
        let sum = ctx.result(add, 0);

        let exit = ctx.create_block(loc, vec![BlockArgData::new(i64_ty)]);
        ctx.append_block(f, exit);

        let br = InstBuilder::new(Opcode::Branch, loc)
            .operand(sum)
            .successor(exit)
            .build(ctx);
        ctx.push_inst(entry, br);

        let ret_arg = ctx.block_arg(exit, 0);
        let ret = InstBuilder::new(Opcode::Return, loc)
            .operand(ret_arg)
            .build(ctx);
        ctx.push_inst(exit, ret);

        f
    }

    #[test]
    fn inst_description_shape() {
        let mut ctx = IrContext::new();
        let loc = test_location(&mut ctx);
        let i64_ty = i64_type(&mut ctx);

        let c = InstBuilder::new(Opcode::IntegerLiteral, loc)
            .result(i64_ty)
            .attr(ATTR_VALUE(), 42i64)
            .build(&mut ctx);

        let text = inst_debug_description(&ctx, c);
        assert_eq!(text, "v0 = integer_literal {value = 42} : i64");
    }

    #[test]
    fn value_descriptions() {
        let mut ctx = IrContext::new();
        let loc = test_location(&mut ctx);
        let i64_ty = i64_type(&mut ctx);

        let block = ctx.create_block(loc, vec![BlockArgData::new(i64_ty)]);
        let arg = ctx.block_arg(block, 0);
        assert_eq!(
            value_debug_description(&ctx, arg),
            format!("{arg} = argument #0 of {block}"),
        );

        let c = InstBuilder::new(Opcode::IntegerLiteral, loc)
            .result(i64_ty)
            .attr(ATTR_VALUE(), 1i64)
            .build(&mut ctx);
        let v = ctx.result(c, 0);
        assert_eq!(
            value_debug_description(&ctx, v),
            format!("{v} = result #0 of integer_literal"),
        );
    }

    #[test]
    fn global_description() {
        let mut ctx = IrContext::new();
        let i64_ty = i64_type(&mut ctx);
        let g = ctx.create_global(Symbol::new("counter"), i64_ty);
        assert_eq!(global_debug_description(&ctx, g), "@counter : i64");
    }

    #[test]
    fn function_dump() {
        let mut ctx = IrContext::new();
        let f = build_sample(&mut ctx);
        let text = func_debug_description(&ctx, f);
        insta::assert_snapshot!(text, @r"
        fn @add(i64) -> i64 {
        bb0(v0: i64):
          v1 = integer_literal {value = 40} : i64
          v2 = builtin(v0, v1) {builtin_id = 1} : i64
          br(v2) [bb1]
        bb1(v3: i64):  // preds: bb0
          return(v3)
        }
        ");
    }
}
