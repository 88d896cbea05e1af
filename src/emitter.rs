//! Renders an assembled file's code image, entry table and extern log into
//! the three output file bodies (`.ob`, `.ent`, `.ext`).

use crate::context::AssemblyContext;
use crate::encoder;

/// Render the object file body: one base64-encoded word per line, in
/// address order. Always produced, even when the image is empty.
pub fn emit_object(ctx: &AssemblyContext) -> String {
    let mut out = String::new();
    for (_, word) in ctx.image.iter() {
        let chars = encoder::encode_word(word);
        out.push(chars[0] as char);
        out.push(chars[1] as char);
        out.push('\n');
    }
    out
}

/// Render the entries file body: `name address`, one per line, in the
/// order `.entry` directives named them. `None` if no symbol was marked
/// `.entry`.
pub fn emit_entries(ctx: &AssemblyContext) -> Option<String> {
    let mut out = String::new();
    let mut any = false;
    for name in ctx.symbols.names_in_order() {
        if let Some(sym) = ctx.symbols.lookup(name) {
            if sym.is_entry {
                any = true;
                out.push_str(&format!("{} {}\n", name, sym.value));
            }
        }
    }
    any.then_some(out)
}

/// Render the externals file body: `name address`, one per use site, in
/// the order they were encountered. `None` if no external symbol was
/// referenced.
pub fn emit_externs(ctx: &AssemblyContext) -> Option<String> {
    if ctx.externs.is_empty() {
        return None;
    }
    let mut out = String::new();
    for ext in ctx.externs.iter() {
        out.push_str(&format!("{} {}\n", ext.name, ext.address));
    }
    Some(out)
}
