//! Callback registration for external pass-authoring runtimes.
//!
//! Foreign code extends function-level behavior (debug printing, textual
//! round-trip parsing, effect-summary copying) without the core knowing
//! about its implementation: it registers a [`FunctionHooks`] table under
//! a runtime tag once at startup, and the core dispatches through the
//! table. The per-function state those hooks manage lives in the opaque
//! extension slot on `FunctionData`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use derive_more::{Display, Error};

use crate::context::IrContext;
use crate::refs::FuncRef;
use crate::symbol::Symbol;

/// Effect-summary flag: the argument escapes.
pub const EFFECTS_FLAG_ESCAPE: u32 = 0x1;
/// Effect-summary flag: the effect was derived, not declared.
pub const EFFECTS_FLAG_DERIVED: u32 = 0x2;

/// Recoverable failure at the textual round-trip boundary.
///
/// Malformed input text is an expected, user-triggerable condition, so it
/// is reported rather than aborting. Success is `Ok(())`.
#[derive(Clone, Debug, Display, Error)]
#[display("parse error at offset {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

/// Builds the opaque per-function extension blob.
pub type InitFn = Box<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;
/// Tears down the extension blob.
pub type DestroyFn = Box<dyn Fn(Box<dyn Any + Send>) + Send + Sync>;
/// Writes the function's registered textual form.
pub type WriteFn = Box<dyn Fn(&IrContext, FuncRef, &mut dyn fmt::Write) -> fmt::Result + Send + Sync>;
/// Parses registered textual data back onto the function.
pub type ParseFn =
    Box<dyn Fn(&mut IrContext, FuncRef, &str) -> Result<(), ParseError> + Send + Sync>;
/// Copies effect summaries from one function to another; returns how many
/// were copied.
pub type CopyEffectsFn = Box<dyn Fn(&mut IrContext, FuncRef, FuncRef) -> usize + Send + Sync>;
/// Returns the effect flags of one argument.
pub type GetEffectFlagsFn = Box<dyn Fn(&IrContext, FuncRef, usize) -> u32 + Send + Sync>;

/// Callback table registered by an external runtime.
///
/// All slots are optional; an absent slot means the runtime does not
/// extend that behavior.
#[derive(Default)]
pub struct FunctionHooks {
    pub init: Option<InitFn>,
    pub destroy: Option<DestroyFn>,
    pub write: Option<WriteFn>,
    pub parse: Option<ParseFn>,
    pub copy_effects: Option<CopyEffectsFn>,
    pub get_effect_flags: Option<GetEffectFlagsFn>,
}

/// Registry of hook tables, keyed by the external runtime's type tag.
///
/// Populated once at startup; registering the same tag twice is a wiring
/// bug and panics.
#[derive(Default)]
pub struct HookRegistry {
    table: HashMap<Symbol, FunctionHooks>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook table for a runtime tag.
    ///
    /// # Panics
    ///
    /// Panics if the tag was already registered.
    pub fn register(&mut self, tag: Symbol, hooks: FunctionHooks) {
        let prev = self.table.insert(tag, hooks);
        assert!(
            prev.is_none(),
            "HookRegistry::register: tag `{tag}` was already registered",
        );
    }

    pub fn get(&self, tag: Symbol) -> Option<&FunctionHooks> {
        self.table.get(&tag)
    }

    /// Initialize the extension slot of a function with the registered
    /// `init` hook, if the tag has one.
    pub fn init_function(&self, ctx: &mut IrContext, tag: Symbol, f: FuncRef) {
        if let Some(init) = self.get(tag).and_then(|h| h.init.as_ref()) {
            ctx.install_func_ext(f, init());
        }
    }

    /// Tear down the extension slot of a function with the registered
    /// `destroy` hook, if the tag has one. The blob is dropped either way.
    pub fn destroy_function(&self, ctx: &mut IrContext, tag: Symbol, f: FuncRef) {
        let Some(ext) = ctx.take_func_ext(f) else {
            return;
        };
        if let Some(destroy) = self.get(tag).and_then(|h| h.destroy.as_ref()) {
            destroy(ext);
        }
    }

    /// Write the registered textual form of a function.
    ///
    /// Returns `false` if the tag registers no `write` hook.
    pub fn write_function(
        &self,
        ctx: &IrContext,
        tag: Symbol,
        f: FuncRef,
        out: &mut dyn fmt::Write,
    ) -> Result<bool, fmt::Error> {
        match self.get(tag).and_then(|h| h.write.as_ref()) {
            Some(write) => {
                write(ctx, f, out)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Parse registered textual data onto a function.
    ///
    /// Returns `Ok(())` if the tag registers no `parse` hook; only a hook
    /// can fail.
    pub fn parse_function(
        &self,
        ctx: &mut IrContext,
        tag: Symbol,
        f: FuncRef,
        text: &str,
    ) -> Result<(), ParseError> {
        match self.get(tag).and_then(|h| h.parse.as_ref()) {
            Some(parse) => parse(ctx, f, text),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FunctionData;
    use crate::location::{Location, Span};
    use crate::types::{TypeDataBuilder, TypeKind};

    fn test_func(ctx: &mut IrContext) -> FuncRef {
        let path = ctx.paths.intern("file:///test.gr".to_owned());
        let loc = Location::new(path, Span::new(0, 0));
        let i64_ty = ctx
            .types
            .intern(TypeDataBuilder::new(Symbol::new("i64"), TypeKind::Primitive).build());
        ctx.create_function(FunctionData::new(Symbol::new("f"), loc, [], i64_ty))
    }

    #[test]
    fn init_and_destroy_round_trip() {
        let mut ctx = IrContext::new();
        let f = test_func(&mut ctx);
        let tag = Symbol::new("optimizer-runtime");

        let mut registry = HookRegistry::new();
        registry.register(
            tag,
            FunctionHooks {
                init: Some(Box::new(|| Box::new(vec![1u32, 2, 3]))),
                destroy: Some(Box::new(|blob| {
                    let v = blob.downcast::<Vec<u32>>().expect("blob type");
                    assert_eq!(*v, vec![1, 2, 3]);
                })),
                ..Default::default()
            },
        );

        registry.init_function(&mut ctx, tag, f);
        assert!(ctx.func_ext(f).is_some());
        registry.destroy_function(&mut ctx, tag, f);
        assert!(ctx.func_ext(f).is_none());
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn double_registration_panics() {
        let mut registry = HookRegistry::new();
        let tag = Symbol::new("tag");
        registry.register(tag, FunctionHooks::default());
        registry.register(tag, FunctionHooks::default());
    }

    #[test]
    fn parse_reports_position() {
        let mut ctx = IrContext::new();
        let f = test_func(&mut ctx);
        let tag = Symbol::new("parser");

        let mut registry = HookRegistry::new();
        registry.register(
            tag,
            FunctionHooks {
                parse: Some(Box::new(|_ctx, _f, text| {
                    match text.find('!') {
                        Some(pos) => Err(ParseError {
                            message: "unexpected `!`".to_owned(),
                            position: pos,
                        }),
                        None => Ok(()),
                    }
                })),
                ..Default::default()
            },
        );

        assert!(registry.parse_function(&mut ctx, tag, f, "fine").is_ok());
        let err = registry
            .parse_function(&mut ctx, tag, f, "bad ! input")
            .unwrap_err();
        assert_eq!(err.position, 4);
        assert_eq!(err.to_string(), "parse error at offset 4: unexpected `!`");
    }

    #[test]
    fn write_hook_dispatch() {
        let mut ctx = IrContext::new();
        let f = test_func(&mut ctx);
        let tag = Symbol::new("writer");

        let mut registry = HookRegistry::new();
        registry.register(
            tag,
            FunctionHooks {
                write: Some(Box::new(|ctx, f, out| {
                    write!(out, "@{}", ctx.func_name(f))
                })),
                ..Default::default()
            },
        );

        let mut out = String::new();
        assert!(registry.write_function(&ctx, tag, f, &mut out).unwrap());
        assert_eq!(out, "@f");

        // unknown tag: no hook, nothing written
        let mut out2 = String::new();
        assert!(
            !registry
                .write_function(&ctx, Symbol::new("other"), f, &mut out2)
                .unwrap()
        );
        assert!(out2.is_empty());
    }

    #[test]
    fn effect_flags_dispatch() {
        let mut ctx = IrContext::new();
        let f = test_func(&mut ctx);
        let tag = Symbol::new("effects");

        let mut registry = HookRegistry::new();
        registry.register(
            tag,
            FunctionHooks {
                get_effect_flags: Some(Box::new(|_ctx, _f, arg| {
                    if arg == 0 {
                        EFFECTS_FLAG_ESCAPE | EFFECTS_FLAG_DERIVED
                    } else {
                        0
                    }
                })),
                ..Default::default()
            },
        );

        let hooks = registry.get(tag).unwrap();
        let flags = hooks.get_effect_flags.as_ref().unwrap()(&ctx, f, 0);
        assert_eq!(flags & EFFECTS_FLAG_ESCAPE, EFFECTS_FLAG_ESCAPE);
        assert_eq!(flags & EFFECTS_FLAG_DERIVED, EFFECTS_FLAG_DERIVED);
    }
}
