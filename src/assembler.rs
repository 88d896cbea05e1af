//! Assembles source code written in a small, fixed instruction-set
//! assembly language into base64-encoded machine words, in the classic
//! macro-expand / two-pass / emit pipeline.
//!
//! Comments start with a semicolon (`;`) and run to the end of the line.
//! Labels, instructions and directives may be indented freely. A label is
//! declared with a trailing colon:
//!
//! ```ignore
//! LOOP:   dec @r1
//!         bne LOOP
//!         stop
//! ```
//!
//! The instruction set is fixed at sixteen mnemonics (`mov`, `cmp`, `add`,
//! `sub`, `not`, `clr`, `lea`, `inc`, `dec`, `jmp`, `bne`, `red`, `prn`,
//! `jsr`, `rts`, `stop`), each with its own arity and accepted addressing
//! modes — see [`instructions`] for the table.
//!
//! Four directives are supported:
//! - `.data n1, n2, ...`: store a sequence of integers
//! - `.string "text"`: store a NUL-terminated string
//! - `.entry NAME`: export a symbol for other files to link against
//! - `.extern NAME`: declare a symbol defined in another file
//!
//! Operands are classified by their prefix: `@r0`..`@r7` is a register, a
//! signed integer literal is immediate, anything else is a symbolic
//! (direct) reference.
//!
//! A `mcro NAME` / `endmcro` block defines a parameterless macro; every
//! later occurrence of `NAME` on a line by itself is replaced with the
//! macro's body before either pass runs.

use crate::context::AssemblyContext;
use crate::error::AssemblerError;
use crate::{emitter, macros, passes};
use std::fs;

/// The three output bodies produced by a successful assembly.
pub struct AssembledOutput {
    pub object: String,
    pub entries: Option<String>,
    pub externs: Option<String>,
}

/// Expand macros in `source`, then run both passes over the result.
///
/// Returns the assembled output on success, or every diagnostic collected
/// along the way on failure. A macro-stage error is returned alone (the
/// rest of the pipeline never runs); an error raised during the passes is
/// returned together with any others found on the same pass.
pub fn assemble_source(source: &str) -> Result<AssembledOutput, Vec<AssemblerError>> {
    let expanded = macros::expand(source)?;

    let mut ctx = AssemblyContext::new();
    passes::first_pass(&mut ctx, &expanded);
    passes::second_pass(&mut ctx, &expanded);

    if ctx.had_error() {
        return Err(ctx.errors);
    }

    Ok(AssembledOutput {
        object: emitter::emit_object(&ctx),
        entries: emitter::emit_entries(&ctx),
        externs: emitter::emit_externs(&ctx),
    })
}

/// Read `path`, assemble it, and write the resulting `.am`/`.ob`/`.ent`/
/// `.ext` files alongside it. `stem` is the source file's name without its
/// `.as` extension; `<stem>.as` is read.
///
/// Returns `Ok(())` on a clean assembly (all applicable outputs written),
/// `Err(errors)` otherwise — in which case the caller is expected to
/// report them and move on to the next file, per the multi-file CLI's
/// skip-and-continue behavior.
pub fn assemble_file(stem: &str) -> Result<(), Vec<AssemblerError>> {
    let source_path = format!("{}.as", stem);
    let source = fs::read_to_string(&source_path).map_err(|_| {
        vec![AssemblerError::FileOpen {
            path: source_path.clone(),
        }]
    })?;

    let expanded = macros::expand(&source)?;

    fs::write(format!("{}.am", stem), &expanded).map_err(|_| {
        vec![AssemblerError::FileOpen {
            path: format!("{}.am", stem),
        }]
    })?;

    let mut ctx = AssemblyContext::new();
    passes::first_pass(&mut ctx, &expanded);
    passes::second_pass(&mut ctx, &expanded);

    if ctx.had_error() {
        return Err(std::mem::take(&mut ctx.errors));
    }

    let object = emitter::emit_object(&ctx);
    fs::write(format!("{}.ob", stem), object).map_err(|_| {
        vec![AssemblerError::FileOpen {
            path: format!("{}.ob", stem),
        }]
    })?;

    if let Some(entries) = emitter::emit_entries(&ctx) {
        fs::write(format!("{}.ent", stem), entries).map_err(|_| {
            vec![AssemblerError::FileOpen {
                path: format!("{}.ent", stem),
            }]
        })?;
    }
    if let Some(externs) = emitter::emit_externs(&ctx) {
        fs::write(format!("{}.ext", stem), externs).map_err(|_| {
            vec![AssemblerError::FileOpen {
                path: format!("{}.ext", stem),
            }]
        })?;
    }

    Ok(())
}
