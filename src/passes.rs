//! The two-pass driver: walks the macro-expanded source twice, building
//! the symbol table and code image on the first walk and resolving
//! symbolic operand words and extern references on the second.

use crate::context::AssemblyContext;
use crate::encoder::{self, ARE_EXTERNAL, ARE_RELOCATABLE};
use crate::error::AssemblerError;
use crate::instructions::{self, DIRECT, IMMEDIATE, REGISTER};
use crate::lexer::{self, LineStart, OperandKind};

enum Role {
    Source,
    Destination,
}

/// Run the first pass over `source`: builds the symbol table and the code
/// image (with placeholder values for as-yet-unresolved forward
/// references).
pub fn first_pass(ctx: &mut AssemblyContext, source: &str) {
    for (i, line) in source.lines().enumerate() {
        ctx.line_number = i + 1;
        process_line(ctx, line);
    }
}

/// Run the second pass over the same macro-expanded `source`: re-walks
/// every line with the now-complete symbol table, overwriting forward
/// references and logging external uses.
pub fn second_pass(ctx: &mut AssemblyContext, source: &str) {
    ctx.begin_second_pass();
    for (i, line) in source.lines().enumerate() {
        ctx.line_number = i + 1;
        process_line(ctx, line);
    }

    let entries: Vec<String> = ctx
        .symbols
        .names_in_order()
        .filter(|name| ctx.symbols.lookup(name).map(|s| s.is_entry).unwrap_or(false))
        .map(|name| name.to_string())
        .collect();
    for name in entries {
        let defined = ctx
            .symbols
            .lookup(&name)
            .map(|s| s.value != 0 && !s.is_extern)
            .unwrap_or(false);
        if !defined {
            ctx.report_unconditional(AssemblerError::UndefinedEntry { name });
        }
    }
}

fn process_line(ctx: &mut AssemblyContext, raw_line: &str) {
    if raw_line.len() > lexer::MAX_LINE_LENGTH {
        ctx.report(AssemblerError::OverflowLine {
            line_number: ctx.line_number,
            line: raw_line.to_string(),
        });
        return;
    }

    match lexer::classify_start(raw_line) {
        LineStart::Comment | LineStart::Blank => {}
        LineStart::Label => process_labeled_line(ctx, raw_line),
        LineStart::Directive => {
            let tokens = lexer::tokenize(raw_line);
            process_directive(ctx, &tokens, 0, raw_line);
        }
        LineStart::Instruction => {
            let tokens = lexer::tokenize(raw_line);
            process_instruction(ctx, &tokens, 0, raw_line);
        }
    }
}

fn process_labeled_line(ctx: &mut AssemblyContext, raw_line: &str) {
    let tokens = lexer::tokenize(raw_line);
    let label_token = tokens[0].text;
    let label = &label_token[..label_token.len() - 1];

    if !lexer::is_valid_label(label) {
        if label.len() > lexer::MAX_LABEL_LENGTH {
            ctx.report(AssemblerError::OverflowLabel {
                line_number: ctx.line_number,
                line: raw_line.to_string(),
            });
        } else {
            ctx.report(AssemblerError::InvalidOperand {
                operand: label.to_string(),
                operand_span: tokens[0].span,
                line_number: ctx.line_number,
                line: raw_line.to_string(),
            });
        }
        return;
    }
    if let Err(err) = ctx.symbols.define(label, ctx.address as i64, ctx.line_number) {
        ctx.report(err);
    }

    match tokens.get(1) {
        None => ctx.report(AssemblerError::MissingOperand {
            mnemonic: label.to_string(),
            line_number: ctx.line_number,
            line: raw_line.to_string(),
        }),
        Some(next) if next.text.starts_with('.') => process_directive(ctx, &tokens, 1, raw_line),
        Some(_) => process_instruction(ctx, &tokens, 1, raw_line),
    }
}

fn process_directive(ctx: &mut AssemblyContext, tokens: &[lexer::Token], at: usize, raw_line: &str) {
    let name = tokens[at].text;
    let operands = &tokens[at + 1..];

    match name {
        ".data" => process_data(ctx, operands, raw_line),
        ".string" => process_string(ctx, operands, raw_line),
        ".entry" => process_entry(ctx, operands, raw_line),
        ".extern" => process_extern(ctx, operands, raw_line),
        _ => ctx.report(AssemblerError::UnknownDirective {
            name: name.to_string(),
            span: tokens[at].span,
            line_number: ctx.line_number,
            line: raw_line.to_string(),
        }),
    }
}

fn process_data(ctx: &mut AssemblyContext, operands: &[lexer::Token], raw_line: &str) {
    if operands.is_empty() {
        ctx.report(AssemblerError::MissingOperand {
            mnemonic: ".data".to_string(),
            line_number: ctx.line_number,
            line: raw_line.to_string(),
        });
        return;
    }

    let Some(after) = raw_line.find(".data").map(|i| &raw_line[i + 5..]) else {
        return;
    };
    if after.trim_start().starts_with(',') {
        ctx.report(AssemblerError::CommaAtStart {
            line_number: ctx.line_number,
            line: raw_line.to_string(),
        });
        return;
    }
    if after.trim_end().ends_with(',') {
        ctx.report(AssemblerError::CommaAtEnd {
            line_number: ctx.line_number,
            line: raw_line.to_string(),
        });
        return;
    }
    if after.contains(",,") {
        ctx.report(AssemblerError::ConsecutiveCommas {
            line_number: ctx.line_number,
            line: raw_line.to_string(),
        });
        return;
    }

    for tok in operands {
        match tok.text.parse::<i32>() {
            Ok(value) => {
                if let Err(err) = ctx.emit(encoder::data_word(value)) {
                    ctx.report(err);
                }
            }
            Err(_) => ctx.report(AssemblerError::InvalidOperand {
                operand: tok.text.to_string(),
                operand_span: tok.span,
                line_number: ctx.line_number,
                line: raw_line.to_string(),
            }),
        }
    }
}

fn process_string(ctx: &mut AssemblyContext, operands: &[lexer::Token], raw_line: &str) {
    let tok = match operands.first() {
        None => {
            ctx.report(AssemblerError::MissingOperand {
                mnemonic: ".string".to_string(),
                line_number: ctx.line_number,
                line: raw_line.to_string(),
            });
            return;
        }
        Some(t) => t,
    };
    if operands.len() > 1 {
        ctx.report(AssemblerError::TooManyOperands {
            mnemonic: ".string".to_string(),
            line_number: ctx.line_number,
            line: raw_line.to_string(),
            extra_spans: operands[1..].iter().map(|t| t.span).collect(),
        });
        return;
    }

    let text = tok.text;
    if !text.starts_with('"') {
        ctx.report(AssemblerError::MissingOpeningQuote {
            line_number: ctx.line_number,
            line: raw_line.to_string(),
        });
        return;
    }
    if text.len() < 2 || !text.ends_with('"') {
        ctx.report(AssemblerError::MissingClosingQuote {
            line_number: ctx.line_number,
            line: raw_line.to_string(),
        });
        return;
    }

    let body = &text[1..text.len() - 1];
    for ch in body.chars() {
        if !ch.is_ascii() {
            ctx.report(AssemblerError::InvalidOperand {
                operand: ch.to_string(),
                operand_span: tok.span,
                line_number: ctx.line_number,
                line: raw_line.to_string(),
            });
            return;
        }
        if let Err(err) = ctx.emit(encoder::string_char_word(ch as u8)) {
            ctx.report(err);
            return;
        }
    }
    if let Err(err) = ctx.emit(encoder::string_char_word(0)) {
        ctx.report(err);
    }
}

fn process_entry(ctx: &mut AssemblyContext, operands: &[lexer::Token], raw_line: &str) {
    if operands.is_empty() {
        ctx.report(AssemblerError::MissingOperand {
            mnemonic: ".entry".to_string(),
            line_number: ctx.line_number,
            line: raw_line.to_string(),
        });
        return;
    }
    for tok in operands {
        if let Err(err) = ctx.symbols.mark_entry(tok.text, ctx.line_number) {
            ctx.report(err);
        }
    }
}

fn process_extern(ctx: &mut AssemblyContext, operands: &[lexer::Token], raw_line: &str) {
    if operands.is_empty() {
        ctx.report(AssemblerError::MissingOperand {
            mnemonic: ".extern".to_string(),
            line_number: ctx.line_number,
            line: raw_line.to_string(),
        });
        return;
    }
    for tok in operands {
        if let Err(err) = ctx.symbols.mark_extern(tok.text, ctx.line_number) {
            ctx.report(err);
        }
    }
}

fn process_instruction(ctx: &mut AssemblyContext, tokens: &[lexer::Token], at: usize, raw_line: &str) {
    let name = tokens[at].text.to_ascii_lowercase();
    let def = match instructions::lookup(&name) {
        Some(d) => d,
        None => {
            ctx.report(AssemblerError::UnknownInstruction {
                name: name.clone(),
                span: tokens[at].span,
                line_number: ctx.line_number,
                line: raw_line.to_string(),
            });
            return;
        }
    };

    let operands = &tokens[at + 1..];
    if operands.len() < def.arity as usize {
        ctx.report(AssemblerError::MissingOperand {
            mnemonic: name,
            line_number: ctx.line_number,
            line: raw_line.to_string(),
        });
        return;
    }
    if operands.len() > def.arity as usize {
        ctx.report(AssemblerError::TooManyOperands {
            mnemonic: name,
            line_number: ctx.line_number,
            line: raw_line.to_string(),
            extra_spans: operands[def.arity as usize..].iter().map(|t| t.span).collect(),
        });
        return;
    }

    let (src_tok, dst_tok) = match def.arity {
        0 => (None, None),
        1 => (None, Some(&operands[0])),
        _ => (Some(&operands[0]), Some(&operands[1])),
    };

    for tok in [src_tok, dst_tok].into_iter().flatten() {
        if tok.text.starts_with("@r") && lexer::parse_register(tok.text).is_none() {
            ctx.report(AssemblerError::UnknownRegister {
                name: tok.text.to_string(),
                span: tok.span,
                line_number: ctx.line_number,
                line: raw_line.to_string(),
            });
            return;
        }
    }

    let src_kind = src_tok.map(|t| lexer::classify_operand(t.text));
    let dst_kind = dst_tok.map(|t| lexer::classify_operand(t.text));

    let src_mode = src_kind.as_ref().map(operand_mode);
    let dst_mode = dst_kind.as_ref().map(operand_mode);

    if let (Some(mode), Some(tok)) = (src_mode, src_tok) {
        if !instructions::accepts_source(def, mode) {
            ctx.report(AssemblerError::InvalidOperand {
                operand: tok.text.to_string(),
                operand_span: tok.span,
                line_number: ctx.line_number,
                line: raw_line.to_string(),
            });
            return;
        }
    }
    if let (Some(mode), Some(tok)) = (dst_mode, dst_tok) {
        if !instructions::accepts_destination(def, mode) {
            ctx.report(AssemblerError::InvalidOperand {
                operand: tok.text.to_string(),
                operand_span: tok.span,
                line_number: ctx.line_number,
                line: raw_line.to_string(),
            });
            return;
        }
    }

    if let Err(err) = ctx.emit(encoder::instruction_word(def.opcode, src_mode, dst_mode)) {
        ctx.report(err);
        return;
    }

    if let Err(err) = emit_operands(ctx, src_kind.as_ref(), dst_kind.as_ref(), raw_line) {
        ctx.report(err);
    }
}

fn operand_mode(kind: &OperandKind) -> u8 {
    match kind {
        OperandKind::Immediate(_) => IMMEDIATE,
        OperandKind::Direct(_) => DIRECT,
        OperandKind::Register(_) => REGISTER,
    }
}

fn emit_operands(
    ctx: &mut AssemblyContext,
    src: Option<&OperandKind>,
    dst: Option<&OperandKind>,
    _raw_line: &str,
) -> Result<(), AssemblerError> {
    if let (Some(OperandKind::Register(s)), Some(OperandKind::Register(d))) = (src, dst) {
        ctx.emit(encoder::register_word(Some(*d), Some(*s)))?;
        return Ok(());
    }

    if let Some(kind) = src {
        emit_single_operand(ctx, kind, Role::Source)?;
    }
    if let Some(kind) = dst {
        emit_single_operand(ctx, kind, Role::Destination)?;
    }
    Ok(())
}

fn emit_single_operand(ctx: &mut AssemblyContext, kind: &OperandKind, role: Role) -> Result<(), AssemblerError> {
    let word = match kind {
        OperandKind::Immediate(v) => encoder::immediate_word(*v),
        OperandKind::Register(r) => match role {
            Role::Source => encoder::register_word(None, Some(*r)),
            Role::Destination => encoder::register_word(Some(*r), None),
        },
        OperandKind::Direct(name) => {
            let symbol = ctx.symbols.lookup(name);
            let (value, is_extern) = match symbol {
                Some(sym) => (sym.value as u16, sym.is_extern),
                None => (0, false),
            };
            let are = if is_extern { ARE_EXTERNAL } else { ARE_RELOCATABLE };
            let word = encoder::direct_word(value, are);
            let address = ctx.emit(word)?;
            if ctx.end_first_pass && is_extern {
                ctx.externs.push(name, address);
            }
            return Ok(());
        }
    };
    ctx.emit(word)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> AssemblyContext {
        let mut ctx = AssemblyContext::new();
        first_pass(&mut ctx, source);
        second_pass(&mut ctx, source);
        ctx
    }

    #[test]
    fn assembles_a_simple_instruction() {
        let ctx = run("mov @r1, @r2\nstop\n");
        assert!(!ctx.had_error());
        assert_eq!(ctx.image.len(), 3);
    }

    #[test]
    fn resolves_a_forward_label_reference() {
        let ctx = run("jmp LOOP\nLOOP: stop\n");
        assert!(!ctx.had_error());
        assert_eq!(ctx.symbols.lookup("LOOP").unwrap().value, 102);
    }

    #[test]
    fn reports_unknown_instruction() {
        let ctx = run("frobnicate @r1\n");
        assert!(ctx.had_error());
        assert!(matches!(
            ctx.errors[0],
            AssemblerError::UnknownInstruction { .. }
        ));
    }

    #[test]
    fn rejects_immediate_destination_for_mov() {
        let ctx = run("mov @r1, 5\n");
        assert!(ctx.had_error());
    }

    #[test]
    fn undefined_entry_is_reported() {
        let ctx = run(".entry NOPE\nstop\n");
        assert!(ctx.had_error());
        assert!(ctx
            .errors
            .iter()
            .any(|e| matches!(e, AssemblerError::UndefinedEntry { .. })));
    }

    #[test]
    fn extern_reference_is_logged_once_per_use() {
        let ctx = run(".extern X\njmp X\njmp X\n");
        assert_eq!(ctx.externs.iter().count(), 2);
    }

    #[test]
    fn rejects_a_label_longer_than_the_maximum_length() {
        let label = "A".repeat(lexer::MAX_LABEL_LENGTH + 1);
        let ctx = run(&format!("{}: stop\n", label));
        assert!(ctx.had_error());
        assert!(matches!(
            ctx.errors[0],
            AssemblerError::OverflowLabel { .. }
        ));
    }

    #[test]
    fn rejects_a_register_outside_zero_to_seven() {
        let ctx = run("mov @r9, @r1\n");
        assert!(ctx.had_error());
        assert!(matches!(
            ctx.errors[0],
            AssemblerError::UnknownRegister { .. }
        ));
    }

    #[test]
    fn rejects_leading_comma_in_data_directive() {
        let ctx = run(".data ,1,2\n");
        assert!(matches!(
            ctx.errors[0],
            AssemblerError::CommaAtStart { .. }
        ));
    }

    #[test]
    fn rejects_trailing_comma_in_data_directive() {
        let ctx = run(".data 1,2,\n");
        assert!(matches!(ctx.errors[0], AssemblerError::CommaAtEnd { .. }));
    }

    #[test]
    fn rejects_consecutive_commas_in_data_directive() {
        let ctx = run(".data 1,,2\n");
        assert!(matches!(
            ctx.errors[0],
            AssemblerError::ConsecutiveCommas { .. }
        ));
    }
}
